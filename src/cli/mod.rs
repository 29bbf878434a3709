mod classify;
mod frequency;
mod shared;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

use self::classify::validate_and_fix_classify_settings;
pub use self::classify::{ClassifySettings, write_classify_settings};
use self::frequency::validate_and_fix_frequency_settings;
pub use self::frequency::{FrequencySettings, write_frequency_settings};
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one caller's CNV calls against the array gold-standard calls per sample
    Classify(ClassifySettings),

    /// Annotate cohort-wide call frequency on a combined cohort call table
    Frequency(FrequencySettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        match &self.command {
            Commands::Classify(x) => &x.output_dir,
            Commands::Frequency(x) => &x.output_dir,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{} already exists: \"{}\"", label, dirname);
    }
    Ok(())
}

/// Check that a required input file exists
///
fn check_required_filename(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if !filename.is_file() {
        bail!("Can't find specified {} file: \"{}\"", label, filename);
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Classify(x) => {
            let x = validate_and_fix_classify_settings(x)?;
            Commands::Classify(x)
        }
        Commands::Frequency(x) => {
            let x = validate_and_fix_frequency_settings(x)?;
            Commands::Frequency(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
