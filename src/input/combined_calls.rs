use std::collections::BTreeMap;

use camino::Utf8Path;
use log::{info, warn};

use super::read_text_file;
use crate::call::{CallerMetrics, CallerTool, CnvCall, SampleCallSet};
use crate::genome_region::GenomeRegion;

/// Read a combined cohort call table for frequency annotation
///
/// Expected format is one header line, then
/// `sample<TAB>chrom<TAB>start<TAB>end<TAB>probe count<TAB>call(+/-/0)<TAB>segment mean` rows,
/// the layout produced by combining GATK4 CallCopyRatioSegments output over a cohort. No
/// pseudonymization is applied here; the table is expected to already carry pseudonym sample
/// names.
///
pub fn read_combined_call_table(filename: &Utf8Path) -> Vec<SampleCallSet> {
    info!("Reading combined cohort calls from file '{filename}'");

    let content = read_text_file(filename, "combined cohort calls");

    let mut samples: BTreeMap<String, SampleCallSet> = BTreeMap::new();
    let mut call_count = 0;
    for line in content.split('\n').skip(1) {
        if line.is_empty() {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 7,
            "Unexpected combined call line format in file '{filename}': '{line}'"
        );

        let sample_id = words[0];
        let start = words[2].parse::<i64>().unwrap();
        let end = words[3].parse::<i64>().unwrap();
        let num_points = words[4].parse::<u32>().unwrap();
        let direction = match CallerTool::Gatk4.translate_direction(words[5]) {
            Some(x) => x,
            None => {
                warn!(
                    "Skipping combined call {}:{start}-{end} with call symbol '{}' outside the segment vocabulary",
                    words[1], words[5]
                );
                continue;
            }
        };
        let segment_mean = words[6].parse::<f64>().unwrap();

        samples
            .entry(sample_id.to_string())
            .or_insert_with(|| SampleCallSet::new(sample_id))
            .calls
            .push(CnvCall::new(
                sample_id,
                sample_id,
                GenomeRegion::new(words[1], start, end),
                direction,
                CallerMetrics::Gatk4 {
                    num_points_copy_ratio: num_points,
                    mean_log2_copy_ratio: segment_mean,
                },
            ));
        call_count += 1;
    }

    info!(
        "Read {} combined calls for {} samples",
        call_count,
        samples.len()
    );
    samples.into_values().collect()
}
