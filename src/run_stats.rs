//! Track stats for the whole cnvbench run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

pub const RUN_STATS_FILENAME: &str = "run.stats.json";

#[derive(Default, Deserialize, Serialize)]
pub struct ClassificationCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub array_non_informative: usize,
    pub wes_non_informative: usize,
    pub array_and_wes_non_informative: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct ConcordanceCounts {
    pub concordant: usize,
    pub conflicting: usize,
    pub discordant: usize,

    /// Calls classified without any matching array call
    pub no_array: usize,
}

#[derive(Deserialize, Serialize)]
pub struct ClassifyRunStats {
    pub tool: String,
    pub sample_count: usize,
    pub caller_call_count: usize,
    pub array_call_count: usize,
    pub classification_counts: ClassificationCounts,
    pub concordance_counts: ConcordanceCounts,
    pub false_negative_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct DirectionGroupStats {
    pub group_count: usize,
    pub common_group_count: usize,

    /// Calls outside every proper group, each annotated as its own singleton group
    pub singleton_group_count: usize,
}

#[derive(Deserialize, Serialize)]
pub struct FrequencyRunStats {
    pub sample_count: usize,
    pub call_count: usize,
    pub cohort_size: u32,
    pub gain: DirectionGroupStats,
    pub loss: DirectionGroupStats,
}

fn write_run_stats<T: Serialize>(output_dir: &Utf8Path, run_stats: &T) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, run_stats).unwrap();
}

/// Write classify run_stats structure out in json format
pub fn write_classify_run_stats(output_dir: &Utf8Path, run_stats: &ClassifyRunStats) {
    write_run_stats(output_dir, run_stats);
}

/// Write frequency run_stats structure out in json format
pub fn write_frequency_run_stats(output_dir: &Utf8Path, run_stats: &FrequencyRunStats) {
    write_run_stats(output_dir, run_stats);
}
