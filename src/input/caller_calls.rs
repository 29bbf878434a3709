use std::collections::{BTreeMap, HashMap};

use camino::Utf8Path;
use log::{info, warn};
use unwrap::unwrap;

use super::{normalize_chrom, read_text_file};
use crate::annotation::{AnnotationIndex, Exon, Probe};
use crate::call::{CallerMetrics, CallerTool, CnvCall, SampleCallSet};
use crate::genome_region::GenomeRegion;

/// Read one caller's CNV calls for the whole cohort
///
/// `input_path` is a combined calls file for Conifer and ExomeDepth, or a directory of GATK4
/// CallCopyRatioSegments `.called.seg` files. Calls are grouped per pseudonym sample and
/// annotated with their overlapping probes and exons at load time. Calls for samples missing
/// from the pseudonymization table are skipped with a warning.
///
pub fn read_caller_calls(
    tool: CallerTool,
    input_path: &Utf8Path,
    sample_table: &HashMap<String, String>,
    probes: &AnnotationIndex<Probe>,
    exons: &AnnotationIndex<Exon>,
) -> Vec<SampleCallSet> {
    let mut builder = CohortBuilder::new(sample_table, probes, exons);
    match tool {
        CallerTool::Gatk4 => read_gatk4_seg_dir(input_path, &mut builder),
        CallerTool::Conifer => read_conifer_table(input_path, &mut builder),
        CallerTool::ExomeDepth => read_exomedepth_table(input_path, &mut builder),
    }
    let samples = builder.finish();
    info!(
        "Read {} {} calls for {} samples",
        samples.iter().map(|x| x.calls.len()).sum::<usize>(),
        tool.label(),
        samples.len()
    );
    samples
}

/// Accumulates annotated calls into per-sample call sets, in deterministic sample order
struct CohortBuilder<'a> {
    sample_table: &'a HashMap<String, String>,
    probes: &'a AnnotationIndex<Probe>,
    exons: &'a AnnotationIndex<Exon>,
    samples: BTreeMap<String, SampleCallSet>,
    skipped_samples: usize,
}

impl<'a> CohortBuilder<'a> {
    fn new(
        sample_table: &'a HashMap<String, String>,
        probes: &'a AnnotationIndex<Probe>,
        exons: &'a AnnotationIndex<Exon>,
    ) -> Self {
        Self {
            sample_table,
            probes,
            exons,
            samples: BTreeMap::new(),
            skipped_samples: 0,
        }
    }

    fn pseudonym(&mut self, sample_id: &str) -> Option<String> {
        match self.sample_table.get(sample_id) {
            Some(x) => Some(x.clone()),
            None => {
                warn!("Sample {sample_id} is missing from the sample table, skipping its calls");
                self.skipped_samples += 1;
                None
            }
        }
    }

    fn add_call(&mut self, mut call: CnvCall) {
        call.probes = self
            .probes
            .overlapping(&call.region)
            .into_iter()
            .cloned()
            .collect();
        call.exons = self
            .exons
            .overlapping(&call.region)
            .into_iter()
            .cloned()
            .collect();
        self.samples
            .entry(call.pseudonym_id.clone())
            .or_insert_with(|| SampleCallSet::new(&call.pseudonym_id))
            .calls
            .push(call);
    }

    fn finish(self) -> Vec<SampleCallSet> {
        if self.skipped_samples > 0 {
            warn!(
                "Skipped calls from {} samples missing from the sample table",
                self.skipped_samples
            );
        }
        self.samples.into_values().collect()
    }
}

/// Extract the sample name from a seg file `@RG` header line
///
/// The sample is carried in the last `key:value` field of the line.
///
fn parse_read_group_sample(line: &str) -> Option<&str> {
    line.split('\t').next_back()?.split(':').nth(1)
}

/// Read every GATK4 CallCopyRatioSegments `.called.seg` file in a directory
///
/// Each file holds SAM-style `@` header lines (the `@RG` line carries the sample name), a
/// `CONTIG` column header, then
/// `chrom<TAB>start<TAB>end<TAB>num points<TAB>mean log2 ratio<TAB>call(+/-/0)` rows.
///
fn read_gatk4_seg_dir(input_dir: &Utf8Path, builder: &mut CohortBuilder) {
    info!("Combining GATK4 .called.seg files from directory '{input_dir}'");

    let entries = unwrap!(
        std::fs::read_dir(input_dir),
        "Unable to read GATK4 segment file directory: '{input_dir}'"
    );
    let mut seg_files = entries
        .filter_map(|entry| entry.ok().map(|x| x.path()))
        .filter(|path| path.to_string_lossy().ends_with(".called.seg"))
        .collect::<Vec<_>>();
    seg_files.sort();

    info!("Found {} .called.seg files", seg_files.len());

    for seg_file in seg_files {
        let seg_file = Utf8Path::from_path(&seg_file).unwrap_or_else(|| {
            panic!("Non UTF-8 path in GATK4 segment file directory: '{input_dir}'")
        });
        read_gatk4_seg_file(seg_file, builder);
    }
}

fn read_gatk4_seg_file(filename: &Utf8Path, builder: &mut CohortBuilder) {
    let content = read_text_file(filename, "GATK4 segment");

    let mut sample_id = String::new();
    let mut pseudonym_id: Option<String> = None;
    for line in content.split('\n') {
        if line.is_empty() || line.starts_with("@HD") || line.starts_with("@SG") {
            continue;
        }
        if line.starts_with("@RG") {
            sample_id = unwrap!(
                parse_read_group_sample(line),
                "Unexpected @RG line format in GATK4 segment file '{filename}': '{line}'"
            )
            .to_string();
            pseudonym_id = builder.pseudonym(&sample_id);
            continue;
        }
        if line.starts_with("CONTIG") {
            continue;
        }
        let pseudonym_id = match &pseudonym_id {
            Some(x) => x,
            None => {
                continue;
            }
        };

        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 6,
            "Unexpected segment line format in GATK4 segment file '{filename}': '{line}'"
        );
        let chrom = normalize_chrom(words[0]);
        let start = words[1].parse::<i64>().unwrap();
        let end = words[2].parse::<i64>().unwrap();
        let num_points = words[3].parse::<u32>().unwrap();
        let mean_log2 = words[4].parse::<f64>().unwrap();
        let direction = match CallerTool::Gatk4.translate_direction(words[5]) {
            Some(x) => x,
            None => {
                warn!(
                    "Skipping GATK4 segment {chrom}:{start}-{end} with call symbol '{}' outside the tool vocabulary",
                    words[5]
                );
                continue;
            }
        };

        builder.add_call(CnvCall::new(
            &sample_id,
            pseudonym_id,
            GenomeRegion::new(&chrom, start, end),
            direction,
            CallerMetrics::Gatk4 {
                num_points_copy_ratio: num_points,
                mean_log2_copy_ratio: mean_log2,
            },
        ));
    }
}

/// Read a combined Conifer calls table
///
/// Expected format is one header line, then
/// `sample file<TAB>chrom<TAB>start<TAB>end<TAB>state(dup/del)` rows. The sample name is the
/// file stem of the first column.
///
fn read_conifer_table(filename: &Utf8Path, builder: &mut CohortBuilder) {
    info!("Reading Conifer calls from file '{filename}'");

    let content = read_text_file(filename, "Conifer calls");

    for line in content.split('\n').skip(1) {
        if line.is_empty() {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 5,
            "Unexpected Conifer line format in file '{filename}': '{line}'"
        );

        let sample_id = words[0].split('.').next().unwrap();
        let pseudonym_id = match builder.pseudonym(sample_id) {
            Some(x) => x,
            None => {
                continue;
            }
        };
        let chrom = normalize_chrom(words[1]);
        let start = words[2].parse::<i64>().unwrap();
        let end = words[3].parse::<i64>().unwrap();
        let direction = match CallerTool::Conifer.translate_direction(words[4]) {
            Some(x) => x,
            None => {
                warn!(
                    "Skipping Conifer call {chrom}:{start}-{end} with state '{}' outside the tool vocabulary",
                    words[4]
                );
                continue;
            }
        };

        builder.add_call(CnvCall::new(
            sample_id,
            &pseudonym_id,
            GenomeRegion::new(&chrom, start, end),
            direction,
            CallerMetrics::Conifer,
        ));
    }
}

/// Read a combined ExomeDepth results table
///
/// Expected format is one header line, then
/// `sample<TAB>start.p<TAB>end.p<TAB>type<TAB>nexons<TAB>start<TAB>end<TAB>chrom<TAB>id<TAB>BF
/// <TAB>reads.expected<TAB>reads.observed<TAB>reads.ratio` rows.
///
fn read_exomedepth_table(filename: &Utf8Path, builder: &mut CohortBuilder) {
    info!("Reading ExomeDepth calls from file '{filename}'");

    let content = read_text_file(filename, "ExomeDepth calls");

    for line in content.split('\n').skip(1) {
        if line.is_empty() {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 13,
            "Unexpected ExomeDepth line format in file '{filename}': '{line}'"
        );

        let sample_id = words[0];
        let pseudonym_id = match builder.pseudonym(sample_id) {
            Some(x) => x,
            None => {
                continue;
            }
        };
        let chrom = normalize_chrom(words[7]);
        let start = words[5].parse::<i64>().unwrap();
        let end = words[6].parse::<i64>().unwrap();
        let direction = match CallerTool::ExomeDepth.translate_direction(words[3]) {
            Some(x) => x,
            None => {
                warn!(
                    "Skipping ExomeDepth call {chrom}:{start}-{end} with type '{}' outside the tool vocabulary",
                    words[3]
                );
                continue;
            }
        };

        builder.add_call(CnvCall::new(
            sample_id,
            &pseudonym_id,
            GenomeRegion::new(&chrom, start, end),
            direction,
            CallerMetrics::ExomeDepth {
                bayes_factor: words[9].parse::<f64>().unwrap(),
                reads_expected: words[10].parse::<u32>().unwrap(),
                reads_observed: words[11].parse::<u32>().unwrap(),
                reads_ratio: words[12].parse::<f64>().unwrap(),
                exon_count: words[4].parse::<u32>().unwrap(),
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_group_sample() {
        assert_eq!(
            parse_read_group_sample("@RG\tID:GATKCopyNumber\tSM:sample42"),
            Some("sample42")
        );
        assert_eq!(parse_read_group_sample("@RG\tbare"), None);
    }
}
