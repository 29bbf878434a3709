use std::collections::HashMap;

use camino::Utf8Path;
use log::{info, warn};

use super::read_text_file;
use crate::annotation::{AnnotationIndex, Exon};
use crate::call::{ArrayCall, CallDirection};
use crate::genome_region::parse_region_string;

/// Read the array CNV call table, keyed by pseudonym sample name
///
/// Expected format is one header line, then per line:
/// `sample<TAB>region<TAB>call<TAB>size<TAB>probe count<TAB>gene count<TAB>class`,
/// where region is `chrom:start-end` (commas allowed in the coordinates) and call uses the
/// array vocabulary (`CN Gain` / `CN Loss`). Rows with an unparseable region or a call outside
/// the gain/loss vocabulary are skipped with a warning.
///
/// Each array call is annotated with its overlapping capture exons at load time.
///
pub fn read_array_call_table(
    filename: &Utf8Path,
    exons: &AnnotationIndex<Exon>,
) -> HashMap<String, Vec<ArrayCall>> {
    info!("Reading array CNV calls from file '{filename}'");

    let content = read_text_file(filename, "array CNV");

    let mut array_calls: HashMap<String, Vec<ArrayCall>> = HashMap::new();
    let mut call_count = 0;
    for line in content.split('\n').skip(1) {
        if line.is_empty() {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 7,
            "Unexpected array CNV line format in file '{filename}': '{line}'"
        );

        let region = match parse_region_string(words[1]) {
            Some(x) => x,
            None => {
                warn!(
                    "Skipping array CNV with unparseable region '{}' for sample {}",
                    words[1], words[0]
                );
                continue;
            }
        };
        let direction = match CallDirection::from_array_label(words[2]) {
            Some(x) => x,
            None => {
                warn!(
                    "Skipping array CNV {region} with call type '{}' outside the gain/loss vocabulary",
                    words[2]
                );
                continue;
            }
        };
        let probe_count = words[4].parse::<u32>().unwrap();
        let gene_count = words[5].parse::<u32>().unwrap();

        let mut array_call = ArrayCall::new(region, direction, probe_count, gene_count, words[6]);
        array_call.exons = exons
            .overlapping(&array_call.region)
            .into_iter()
            .cloned()
            .collect();

        array_calls
            .entry(words[0].to_string())
            .or_default()
            .push(array_call);
        call_count += 1;
    }

    info!(
        "Read {} array CNV calls for {} samples",
        call_count,
        array_calls.len()
    );
    array_calls
}
