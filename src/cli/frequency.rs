use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use super::check_required_filename;

pub const SETTINGS_FILENAME: &str = "frequency.settings.json";

#[derive(Args, Deserialize, Serialize)]
pub struct FrequencySettings {
    /// Combined cohort call table
    #[arg(long)]
    pub input: Utf8PathBuf,

    /// Total number of sequenced samples in the cohort
    #[arg(long)]
    pub cohort_size: u32,

    /// Directory for all frequency annotation output
    #[arg(long)]
    pub output_dir: Utf8PathBuf,

    /// Minimum percent of a call covered by a group representative to join the group
    #[arg(long, default_value_t = 80.0)]
    pub min_group_overlap: f64,

    /// Minimum group occurrence for a group to be considered common
    #[arg(long, default_value_t = 3)]
    pub min_calls: u32,

    /// Minimum group frequency percent for a group to be considered common
    #[arg(long, default_value_t = 5.0)]
    pub min_sample_percent: f64,

    /// Calls at or above this size are excluded from positional seed groups
    #[arg(long, default_value_t = 5_000_000)]
    pub max_size: i64,

    /// Drop calls belonging to a common frequency group from the annotated table
    #[arg(long)]
    pub filter_common: bool,
}

pub fn validate_and_fix_frequency_settings(
    settings: FrequencySettings,
) -> SimpleResult<FrequencySettings> {
    check_required_filename(&settings.input, "combined cohort call")?;

    if settings.cohort_size == 0 {
        bail!("--cohort-size must be greater than 0");
    }
    if !(0.0..=100.0).contains(&settings.min_group_overlap) {
        bail!(
            "--min-group-overlap must be in [0,100], got {}",
            settings.min_group_overlap
        );
    }
    if !(0.0..=100.0).contains(&settings.min_sample_percent) {
        bail!(
            "--min-sample-percent must be in [0,100], got {}",
            settings.min_sample_percent
        );
    }
    if settings.max_size <= 0 {
        bail!("--max-size must be greater than 0, got {}", settings.max_size);
    }

    Ok(settings)
}

/// Write frequency settings out in json format
pub fn write_frequency_settings(output_dir: &Utf8Path, settings: &FrequencySettings) {
    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing frequency settings to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create frequency settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}
