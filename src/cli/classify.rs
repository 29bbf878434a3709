use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use super::check_required_filename;
use crate::call::CallerTool;

pub const SETTINGS_FILENAME: &str = "classify.settings.json";

#[derive(Args, Deserialize, Serialize)]
pub struct ClassifySettings {
    /// CNV caller that produced the input calls
    #[arg(long, value_enum)]
    pub tool: CallerTool,

    /// Combined calls file, or a directory of GATK4 .called.seg files for the gatk4 tool
    #[arg(long)]
    pub input: Utf8PathBuf,

    /// Array CNV call table
    #[arg(long)]
    pub array: Utf8PathBuf,

    /// Array design probe regions
    #[arg(long)]
    pub probes: Utf8PathBuf,

    /// Exome capture exon regions with gene names
    #[arg(long)]
    pub exons: Utf8PathBuf,

    /// Sample pseudonymization table
    #[arg(long)]
    pub samples: Utf8PathBuf,

    /// Directory for all classification output
    #[arg(long)]
    pub output_dir: Utf8PathBuf,

    /// Minimum overlapping exon count for a call region to be exome-informative
    #[arg(long, default_value_t = 3)]
    pub min_exons: usize,

    /// Minimum overlapping probe count for a call region to be array-informative
    #[arg(long, default_value_t = 10)]
    pub min_probes: usize,

    /// Minimum percent of a caller call covered by an array call to accept the match
    #[arg(long, default_value_t = 50.0)]
    pub min_overlap: f64,

    /// Drop copy-neutral calls from the classification report
    #[arg(long)]
    pub filter_neutral: bool,

    /// Drop calls smaller than this size from the classification report
    #[arg(long)]
    pub min_size: Option<i64>,
}

pub fn validate_and_fix_classify_settings(
    settings: ClassifySettings,
) -> SimpleResult<ClassifySettings> {
    match settings.tool {
        CallerTool::Gatk4 => {
            if !settings.input.is_dir() {
                bail!(
                    "The gatk4 tool requires --input to be a directory of .called.seg files, got: \"{}\"",
                    settings.input
                );
            }
        }
        _ => {
            check_required_filename(&settings.input, "caller calls")?;
        }
    }
    check_required_filename(&settings.array, "array CNV call")?;
    check_required_filename(&settings.probes, "probe region")?;
    check_required_filename(&settings.exons, "exon region")?;
    check_required_filename(&settings.samples, "sample table")?;

    if !(0.0..=100.0).contains(&settings.min_overlap) {
        bail!(
            "--min-overlap must be in [0,100], got {}",
            settings.min_overlap
        );
    }
    if let Some(min_size) = settings.min_size
        && min_size <= 0
    {
        bail!("--min-size must be greater than 0, got {min_size}");
    }

    Ok(settings)
}

/// Write classify settings out in json format
pub fn write_classify_settings(output_dir: &Utf8Path, settings: &ClassifySettings) {
    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing classify settings to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create classify settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}
