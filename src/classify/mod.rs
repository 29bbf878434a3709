//! Concordance classification of caller CNVs against array gold-standard CNVs
//!

mod concordance;
mod output;

pub use concordance::{ClassifyThresholds, classify_sample};

use std::collections::HashMap;

use log::info;
use rayon::prelude::*;
use simple_error::SimpleResult;
use strum::EnumCount;
use thousands::Separable;

use self::output::{write_classification_table, write_false_negative_table};
use crate::call::{ArrayCall, CallerTool, Classification, ConcordanceResult, SampleCallSet};
use crate::cli;
use crate::input::{
    read_array_call_table, read_caller_calls, read_exon_file, read_probe_file, read_sample_table,
};
use crate::run_stats::{
    ClassificationCounts, ClassifyRunStats, ConcordanceCounts, write_classify_run_stats,
};

pub const CLASSIFICATION_TABLE_FILENAME: &str = "classification.tsv";
pub const FALSE_NEGATIVE_TABLE_FILENAME: &str = "array.false.negatives.tsv";

/// Merge the per-sample array calls into the cohort call sets
///
/// Samples carrying array calls but no caller calls still get a call set, so the leftover pass
/// can flag their array calls false negative.
///
fn merge_array_calls(
    samples: &mut Vec<SampleCallSet>,
    mut array_calls: HashMap<String, Vec<ArrayCall>>,
) {
    for sample in samples.iter_mut() {
        if let Some(calls) = array_calls.remove(&sample.pseudonym_id) {
            sample.array_calls = calls;
        }
    }

    let mut array_only = array_calls.into_iter().collect::<Vec<_>>();
    array_only.sort_by(|a, b| a.0.cmp(&b.0));
    for (pseudonym_id, calls) in array_only {
        let mut sample = SampleCallSet::new(&pseudonym_id);
        sample.array_calls = calls;
        samples.push(sample);
    }
}

/// Classify every sample's caller calls against its array calls
///
/// Fails fast on an invalid threshold configuration before any classification starts. Samples
/// are processed in parallel; each worker owns one sample's calls and array calls so no state
/// is shared between workers.
///
pub fn classify_cohort(
    samples: &mut [SampleCallSet],
    thresholds: &ClassifyThresholds,
    thread_count: usize,
) -> SimpleResult<()> {
    thresholds.validate()?;

    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .unwrap();
    worker_pool.install(|| {
        samples
            .par_iter_mut()
            .for_each(|sample| classify_sample(sample, thresholds));
    });
    Ok(())
}

fn get_classify_run_stats(tool: CallerTool, samples: &[SampleCallSet]) -> ClassifyRunStats {
    let mut label_counts = vec![0usize; Classification::COUNT];
    let mut concordance_counts = vec![0usize; ConcordanceResult::COUNT];
    let mut false_negative_count = 0;
    let mut caller_call_count = 0;
    let mut array_call_count = 0;

    for sample in samples.iter() {
        caller_call_count += sample.calls.len();
        array_call_count += sample.array_calls.len();
        for call in sample.calls.iter() {
            label_counts[call.classification as usize] += 1;
            if let Some(concordance) = call.concordance {
                concordance_counts[concordance as usize] += 1;
            }
        }
        false_negative_count += sample
            .array_calls
            .iter()
            .filter(|x| x.false_negative)
            .count();
    }

    ClassifyRunStats {
        tool: tool.label().to_string(),
        sample_count: samples.len(),
        caller_call_count,
        array_call_count,
        classification_counts: ClassificationCounts {
            true_positive: label_counts[Classification::TruePositive as usize],
            false_positive: label_counts[Classification::FalsePositive as usize],
            array_non_informative: label_counts[Classification::ArrayNonInformative as usize],
            wes_non_informative: label_counts[Classification::WesNonInformative as usize],
            array_and_wes_non_informative: label_counts
                [Classification::ArrayAndWesNonInformative as usize],
        },
        concordance_counts: ConcordanceCounts {
            concordant: concordance_counts[ConcordanceResult::Concordant as usize],
            conflicting: concordance_counts[ConcordanceResult::Conflicting as usize],
            discordant: concordance_counts[ConcordanceResult::Discordant as usize],
            no_array: concordance_counts[ConcordanceResult::NoArray as usize],
        },
        false_negative_count,
    }
}

/// Run the full classify command: load inputs, classify the cohort, write reports and stats
pub fn run_classify(
    shared_settings: &cli::SharedSettings,
    settings: &cli::ClassifySettings,
) -> SimpleResult<()> {
    cli::write_classify_settings(&settings.output_dir, settings);

    let sample_table = read_sample_table(&settings.samples);
    let probes = read_probe_file(&settings.probes);
    let exons = read_exon_file(&settings.exons);
    let array_calls = read_array_call_table(&settings.array, &exons);

    let mut samples = read_caller_calls(
        settings.tool,
        &settings.input,
        &sample_table,
        &probes,
        &exons,
    );
    merge_array_calls(&mut samples, array_calls);

    let thresholds = ClassifyThresholds {
        min_exons: settings.min_exons,
        min_probes: settings.min_probes,
        min_overlap_percent: settings.min_overlap,
    };

    info!(
        "Classifying {} calls across {} samples",
        samples
            .iter()
            .map(|x| x.calls.len())
            .sum::<usize>()
            .separate_with_commas(),
        samples.len()
    );
    classify_cohort(&mut samples, &thresholds, shared_settings.thread_count)?;

    write_classification_table(settings, &samples);
    write_false_negative_table(&settings.output_dir, &samples);

    let run_stats = get_classify_run_stats(settings.tool, &samples);
    info!(
        "Classified {} calls: {} true positive, {} false positive, {} array false negative",
        run_stats.caller_call_count.separate_with_commas(),
        run_stats.classification_counts.true_positive.separate_with_commas(),
        run_stats.classification_counts.false_positive.separate_with_commas(),
        run_stats.false_negative_count.separate_with_commas()
    );
    write_classify_run_stats(&settings.output_dir, &run_stats);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{CallDirection, CallerMetrics, CnvCall};
    use crate::genome_region::GenomeRegion;

    #[test]
    fn test_merge_array_calls_keeps_array_only_samples() {
        let mut samples = vec![{
            let mut sample = SampleCallSet::new("p1");
            sample.calls.push(CnvCall::new(
                "s1",
                "p1",
                GenomeRegion::new("chr1", 100, 200),
                CallDirection::Gain,
                CallerMetrics::Conifer,
            ));
            sample
        }];

        let mut array_calls = HashMap::new();
        array_calls.insert(
            "p1".to_string(),
            vec![ArrayCall::new(
                GenomeRegion::new("chr1", 100, 200),
                CallDirection::Gain,
                15,
                1,
                "Benign",
            )],
        );
        array_calls.insert(
            "p2".to_string(),
            vec![ArrayCall::new(
                GenomeRegion::new("chr2", 100, 200),
                CallDirection::Loss,
                20,
                2,
                "Pathogenic",
            )],
        );

        merge_array_calls(&mut samples, array_calls);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].array_calls.len(), 1);
        assert_eq!(samples[1].pseudonym_id, "p2");
        assert!(samples[1].calls.is_empty());
        assert_eq!(samples[1].array_calls.len(), 1);
    }

    #[test]
    fn test_classify_cohort_rejects_invalid_thresholds() {
        let mut samples = Vec::new();
        let thresholds = ClassifyThresholds {
            min_exons: 3,
            min_probes: 10,
            min_overlap_percent: 150.0,
        };
        assert!(classify_cohort(&mut samples, &thresholds, 1).is_err());
    }
}
