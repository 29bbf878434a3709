use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::info;
use unwrap::unwrap;

use super::{CLASSIFICATION_TABLE_FILENAME, FALSE_NEGATIVE_TABLE_FILENAME};
use crate::call::{CallDirection, SampleCallSet};
use crate::cli::ClassifySettings;

/// Gene names in `genes` that do not appear in `other`
fn unique_gene_names(genes: &[String], other: &[String]) -> Vec<String> {
    genes
        .iter()
        .filter(|x| !other.contains(x))
        .cloned()
        .collect()
}

fn join_gene_names(genes: &[String]) -> String {
    if genes.is_empty() {
        "NA".to_string()
    } else {
        genes.join(":")
    }
}

/// Write the per-call classification table
///
/// One row per caller call with its matched array call (if any), hangovers, concordance verdict,
/// classification label, annotation counts and gene name columns. Copy-neutral calls and calls
/// below the minimum size are dropped when the matching filters are enabled.
///
pub(super) fn write_classification_table(settings: &ClassifySettings, samples: &[SampleCallSet]) {
    let filename = settings.output_dir.join(CLASSIFICATION_TABLE_FILENAME);

    info!("Writing classification table to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create classification table file: '{filename}'"
    );
    let mut f = BufWriter::new(f);

    let tool = settings.tool.label();
    writeln!(
        f,
        "Sample\t{tool}_CNV\t{tool}_Call\t{tool}_Size\tArray_CNV\tArray_Call\tArray_Size\t\
         Hangover_L\tHangover_R\tCall_Result\tClassification\t#_Exons\t#_Probes\t\
         {tool}_Genes\tArray_Genes\t{tool}_UGenes\tArray_UGenes"
    )
    .unwrap();

    for sample in samples.iter() {
        for call in sample.calls.iter() {
            if settings.filter_neutral && call.direction == CallDirection::Neutral {
                continue;
            }
            if let Some(min_size) = settings.min_size
                && call.length() < min_size
            {
                continue;
            }

            let call_genes = call.gene_names();

            let mut array_region = "NA".to_string();
            let mut array_direction = "NA".to_string();
            let mut array_size = "NA".to_string();
            let mut left_hangover = "NA".to_string();
            let mut right_hangover = "NA".to_string();
            let mut array_gene_column = "NA".to_string();
            let mut call_unique_gene_column = join_gene_names(&call_genes);
            let mut array_unique_gene_column = "NA".to_string();

            if let Some(array_index) = call.matched_array_index {
                let array_call = &sample.array_calls[array_index];
                let array_genes = array_call.gene_names();
                array_region = array_call.region.to_string();
                array_direction = array_call.direction.to_string();
                array_size = array_call.length().to_string();
                left_hangover = call.left_hangover.unwrap_or(0).to_string();
                right_hangover = call.right_hangover.unwrap_or(0).to_string();
                array_gene_column = join_gene_names(&array_genes);
                call_unique_gene_column =
                    join_gene_names(&unique_gene_names(&call_genes, &array_genes));
                array_unique_gene_column =
                    join_gene_names(&unique_gene_names(&array_genes, &call_genes));
            }

            let concordance = call
                .concordance
                .map_or("NA".to_string(), |x| x.to_string());

            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{array_region}\t{array_direction}\t{array_size}\t\
                 {left_hangover}\t{right_hangover}\t{concordance}\t{}\t{}\t{}\t{}\t\
                 {array_gene_column}\t{call_unique_gene_column}\t{array_unique_gene_column}",
                sample.pseudonym_id,
                call.region,
                call.direction,
                call.length(),
                call.classification,
                call.exons.len(),
                call.probes.len(),
                join_gene_names(&call_genes),
            )
            .unwrap();
        }
    }
}

/// Write the array calls never matched by any caller call
pub(super) fn write_false_negative_table(output_dir: &Utf8Path, samples: &[SampleCallSet]) {
    let filename = output_dir.join(FALSE_NEGATIVE_TABLE_FILENAME);

    info!("Writing array false negative table to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create array false negative table file: '{filename}'"
    );
    let mut f = BufWriter::new(f);

    writeln!(f, "Sample\tArray_CNV\tArray_Call\tClassification").unwrap();
    for sample in samples.iter() {
        for array_call in sample.array_calls.iter().filter(|x| x.false_negative) {
            writeln!(
                f,
                "{}\t{}\t{}\tFALSE NEGATIVE",
                sample.pseudonym_id, array_call.region, array_call.direction
            )
            .unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_gene_names() {
        let call_genes = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let array_genes = vec!["B".to_string(), "D".to_string()];

        assert_eq!(unique_gene_names(&call_genes, &array_genes), vec!["A", "C"]);
        assert_eq!(unique_gene_names(&array_genes, &call_genes), vec!["D"]);
        assert!(unique_gene_names(&[], &array_genes).is_empty());
    }

    #[test]
    fn test_join_gene_names() {
        assert_eq!(join_gene_names(&[]), "NA");
        assert_eq!(
            join_gene_names(&["A".to_string(), "B".to_string()]),
            "A:B"
        );
    }
}
