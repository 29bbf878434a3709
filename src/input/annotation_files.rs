use camino::Utf8Path;
use log::info;

use super::read_text_file;
use crate::annotation::{AnnotationIndex, Exon, Probe};

fn is_header_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

/// Read array probe regions into an annotation index
///
/// Expected format is `chrom<TAB>start<TAB>end` per line; bed-style header lines are skipped.
///
pub fn read_probe_file(filename: &Utf8Path) -> AnnotationIndex<Probe> {
    info!("Reading probe regions from file '{filename}'");

    let content = read_text_file(filename, "probe regions");

    let mut index = AnnotationIndex::new();
    for line in content.split('\n') {
        if line.is_empty() || is_header_line(line) {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 3,
            "Unexpected probe line format in file '{filename}': '{line}'"
        );
        let start = words[1].parse::<i64>().unwrap();
        let end = words[2].parse::<i64>().unwrap();
        index.insert(Probe::new(words[0], start, end));
    }

    info!("Read {} probe regions", index.record_count());
    index
}

/// Read exome capture exon regions into an annotation index
///
/// Expected format is `chrom<TAB>start<TAB>end<TAB>gene[:gene...]` per line; bed-style header
/// lines are skipped.
///
pub fn read_exon_file(filename: &Utf8Path) -> AnnotationIndex<Exon> {
    info!("Reading exon regions from file '{filename}'");

    let content = read_text_file(filename, "exon regions");

    let mut index = AnnotationIndex::new();
    for line in content.split('\n') {
        if line.is_empty() || is_header_line(line) {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 4,
            "Unexpected exon line format in file '{filename}': '{line}'"
        );
        let start = words[1].parse::<i64>().unwrap();
        let end = words[2].parse::<i64>().unwrap();
        index.insert(Exon::new(words[0], start, end, words[3]));
    }

    info!("Read {} exon regions", index.record_count());
    index
}
