use std::collections::HashMap;

use camino::Utf8Path;
use log::info;

use super::read_text_file;

/// Read the sample pseudonymization table, mapping sequencing sample names to the pseudonym
/// sample names used by the array call table
///
/// Expected format is one header line, then `sample<TAB>pseudonym` per line.
///
pub fn read_sample_table(filename: &Utf8Path) -> HashMap<String, String> {
    info!("Reading sample table from file '{filename}'");

    let content = read_text_file(filename, "sample table");

    let mut sample_table = HashMap::new();
    for line in content.split('\n').skip(1) {
        if line.is_empty() {
            continue;
        }
        let words = line.split('\t').collect::<Vec<_>>();
        assert!(
            words.len() >= 2,
            "Unexpected sample table line format in file '{filename}': '{line}'"
        );
        sample_table.insert(words[0].to_string(), words[1].to_string());
    }

    info!("Read {} sample table entries", sample_table.len());
    sample_table
}
