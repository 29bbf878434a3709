//! Cohort-wide frequency annotation of CNV calls, independent of the array gold standard
//!

mod grouping;
mod output;

pub use grouping::{
    CallGroup, CallHandle, DirectionGrouping, FrequencyThresholds, annotate_direction_frequency,
};

use std::collections::HashSet;

use log::info;
use simple_error::SimpleResult;
use thousands::Separable;

use self::output::{write_annotated_call_table, write_group_tables};
use crate::call::CallDirection;
use crate::cli;
use crate::input::read_combined_call_table;
use crate::run_stats::{DirectionGroupStats, FrequencyRunStats, write_frequency_run_stats};

pub const ANNOTATED_CALLS_FILENAME: &str = "annotated.calls.tsv";

fn get_direction_group_stats(grouping: &DirectionGrouping) -> DirectionGroupStats {
    DirectionGroupStats {
        group_count: grouping.groups.len(),
        common_group_count: grouping.groups.iter().filter(|x| x.is_common).count(),
        singleton_group_count: grouping.singleton_group_count,
    }
}

/// Run the full frequency command: load the cohort table, group both call directions, write the
/// annotated table, the group membership tables and the run stats
pub fn run_frequency(
    shared_settings: &cli::SharedSettings,
    settings: &cli::FrequencySettings,
) -> SimpleResult<()> {
    cli::write_frequency_settings(&settings.output_dir, settings);

    let mut samples = read_combined_call_table(&settings.input);

    let mut thresholds = FrequencyThresholds::new(settings.cohort_size);
    thresholds.min_group_overlap_percent = settings.min_group_overlap;
    thresholds.min_calls = settings.min_calls;
    thresholds.min_sample_percent = settings.min_sample_percent;
    thresholds.max_group_call_size = settings.max_size;
    thresholds.validate()?;

    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(shared_settings.thread_count)
        .build()
        .unwrap();
    let (gain_grouping, loss_grouping) = worker_pool.install(|| {
        let gain = annotate_direction_frequency(&mut samples, CallDirection::Gain, &thresholds);
        let loss = annotate_direction_frequency(&mut samples, CallDirection::Loss, &thresholds);
        (gain, loss)
    });

    info!(
        "Formed {} gain and {} loss frequency groups over {} calls",
        gain_grouping.groups.len(),
        loss_grouping.groups.len(),
        samples
            .iter()
            .map(|x| x.calls.len())
            .sum::<usize>()
            .separate_with_commas()
    );

    let common_groups: HashSet<String> = gain_grouping
        .groups
        .iter()
        .chain(loss_grouping.groups.iter())
        .filter(|x| x.is_common)
        .map(|x| x.name.clone())
        .collect();
    if settings.filter_common {
        info!(
            "Filtering calls belonging to {} common frequency groups from the annotated table",
            common_groups.len()
        );
    }

    write_annotated_call_table(settings, &samples, &common_groups);
    write_group_tables(&settings.output_dir, &samples, "gain", &gain_grouping);
    write_group_tables(&settings.output_dir, &samples, "loss", &loss_grouping);

    let run_stats = FrequencyRunStats {
        sample_count: samples.len(),
        call_count: samples.iter().map(|x| x.calls.len()).sum(),
        cohort_size: settings.cohort_size,
        gain: get_direction_group_stats(&gain_grouping),
        loss: get_direction_group_stats(&loss_grouping),
    };
    write_frequency_run_stats(&settings.output_dir, &run_stats);

    Ok(())
}
