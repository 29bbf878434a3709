//! Readers for the tab-separated input formats consumed by cnvbench
//!

mod annotation_files;
mod array_calls;
mod caller_calls;
mod combined_calls;
mod sample_table;

pub use annotation_files::{read_exon_file, read_probe_file};
pub use array_calls::read_array_call_table;
pub use caller_calls::read_caller_calls;
pub use combined_calls::read_combined_call_table;
pub use sample_table::read_sample_table;

use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use unwrap::unwrap;

/// Read the full text content of a plain or gzip-compressed input file
///
/// # Arguments
/// * `label` - Used in error messages to describe what type of input file this is
///
pub(crate) fn read_text_file(filename: &Utf8Path, label: &str) -> String {
    let file = unwrap!(
        File::open(filename),
        "Unable to open {label} file: '{filename}'"
    );
    let mut content = String::new();
    if filename.as_str().ends_with(".gz") {
        let mut reader = flate2::read::MultiGzDecoder::new(file);
        unwrap!(
            reader.read_to_string(&mut content),
            "Can't parse text from {label} file: '{filename}'"
        );
    } else {
        let mut reader = std::io::BufReader::new(file);
        unwrap!(
            reader.read_to_string(&mut content),
            "Can't parse text from {label} file: '{filename}'"
        );
    }
    content
}

/// Ensure a chromosome name carries the 'chr' prefix
///
/// The GATK4 and ExomeDepth tables name chromosomes without the prefix while the probe, exon and
/// array tables carry it; everything is normalized to the prefixed form.
///
pub(crate) fn normalize_chrom(chrom: &str) -> String {
    if chrom.starts_with("chr") {
        chrom.to_string()
    } else {
        format!("chr{chrom}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_chrom() {
        assert_eq!(normalize_chrom("1"), "chr1");
        assert_eq!(normalize_chrom("chr1"), "chr1");
        assert_eq!(normalize_chrom("X"), "chrX");
    }
}
