use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::info;
use unwrap::unwrap;

use super::ANNOTATED_CALLS_FILENAME;
use super::grouping::DirectionGrouping;
use crate::call::{CallerMetrics, SampleCallSet};
use crate::cli::FrequencySettings;

/// Write the cohort call table with its frequency annotation columns
///
/// Calls whose best group is in the common set are dropped when the common filter is enabled.
/// Calls outside the grouped directions (copy-neutral segments) carry NA frequency columns.
///
pub(super) fn write_annotated_call_table(
    settings: &FrequencySettings,
    samples: &[SampleCallSet],
    common_groups: &HashSet<String>,
) {
    let filename = settings.output_dir.join(ANNOTATED_CALLS_FILENAME);

    info!("Writing frequency annotated calls to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create annotated calls file: '{filename}'"
    );
    let mut f = BufWriter::new(f);

    writeln!(
        f,
        "Sample\tChromosome\tStart\tEnd\tNum_Probes\tCall\tSegment_Mean\t\
         Call_Occurrence\tCall_Frequency\tCall_Group\tGroup_Occurrence\tGroup_Frequency"
    )
    .unwrap();

    for sample in samples.iter() {
        for call in sample.calls.iter() {
            if settings.filter_common
                && let Some(frequency) = &call.frequency
                && common_groups.contains(&frequency.group_name)
            {
                continue;
            }

            let (num_points, segment_mean) = match &call.metrics {
                CallerMetrics::Gatk4 {
                    num_points_copy_ratio,
                    mean_log2_copy_ratio,
                } => (
                    num_points_copy_ratio.to_string(),
                    mean_log2_copy_ratio.to_string(),
                ),
                _ => ("NA".to_string(), "NA".to_string()),
            };

            let frequency_columns = match &call.frequency {
                Some(frequency) => format!(
                    "{}\t{}\t{}\t{}\t{}",
                    frequency.occurrence,
                    frequency.frequency_percent,
                    frequency.group_name,
                    frequency.group_occurrence,
                    frequency.group_frequency_percent
                ),
                None => "NA\tNA\tNA\tNA\tNA".to_string(),
            };

            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{num_points}\t{}\t{segment_mean}\t{frequency_columns}",
                sample.pseudonym_id,
                call.region.chrom,
                call.region.range.start,
                call.region.range.end,
                call.direction.segment_symbol(),
            )
            .unwrap();
        }
    }
}

/// Write the membership tables of one direction's frequency groups
///
/// Start-seeded and end-seeded groups go to separate files, one member call per row.
pub(super) fn write_group_tables(
    output_dir: &Utf8Path,
    samples: &[SampleCallSet],
    direction_label: &str,
    grouping: &DirectionGrouping,
) {
    for (name_prefix, boundary_label) in [("s", "start"), ("e", "end")] {
        let filename = output_dir.join(format!("{direction_label}.{boundary_label}.groups.tsv"));

        info!("Writing {direction_label} {boundary_label} group table to file: '{filename}'");

        let f = unwrap!(
            File::create(&filename),
            "Unable to create group table file: '{filename}'"
        );
        let mut f = BufWriter::new(f);

        writeln!(
            f,
            "Group\tRepresentative\tSample\tCall\tGroup_Occurrence\tGroup_Frequency"
        )
        .unwrap();
        for group in grouping
            .groups
            .iter()
            .filter(|x| x.name.starts_with(name_prefix))
        {
            let representative = &samples[group.representative.sample_index].calls
                [group.representative.call_index]
                .region;
            for member in group.members.iter() {
                let sample = &samples[member.sample_index];
                let call = &sample.calls[member.call_index];
                writeln!(
                    f,
                    "{}\t{representative}\t{}\t{}\t{}\t{}",
                    group.name,
                    sample.pseudonym_id,
                    call.region,
                    group.occurrence,
                    group.frequency_percent
                )
                .unwrap();
            }
        }
    }
}
