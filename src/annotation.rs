use std::collections::HashMap;

use bio::data_structures::interval_tree::IntervalTree;

use crate::genome_region::GenomeRegion;

/// One probe region from the array design
#[derive(Clone, Debug)]
pub struct Probe {
    pub region: GenomeRegion,
}

impl Probe {
    pub fn new(chrom: &str, start: i64, end: i64) -> Self {
        Self {
            region: GenomeRegion::new(chrom, start, end),
        }
    }
}

/// One exon region from the exome capture design
///
/// A single exon annotation line may encode several gene names joined by ':', these are split out
/// at construction.
///
#[derive(Clone, Debug)]
pub struct Exon {
    pub region: GenomeRegion,
    pub gene_names: Vec<String>,
}

impl Exon {
    pub fn new(chrom: &str, start: i64, end: i64, gene_field: &str) -> Self {
        let gene_names = gene_field
            .split(':')
            .filter(|x| !x.is_empty())
            .map(|x| x.to_string())
            .collect();
        Self {
            region: GenomeRegion::new(chrom, start, end),
            gene_names,
        }
    }
}

/// Reference feature records that can be stored in an [`AnnotationIndex`]
pub trait AnnotationRecord {
    fn region(&self) -> &GenomeRegion;
}

impl AnnotationRecord for Probe {
    fn region(&self) -> &GenomeRegion {
        &self.region
    }
}

impl AnnotationRecord for Exon {
    fn region(&self) -> &GenomeRegion {
        &self.region
    }
}

struct ChromAnnotations<T> {
    records: Vec<T>,
    tree: IntervalTree<i64, usize>,
}

impl<T> ChromAnnotations<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            tree: IntervalTree::new(),
        }
    }
}

/// A per-chromosome set of reference feature records which can be efficiently queried by region
///
/// The index is read-only after construction and can be shared across worker threads. Closed
/// record coordinates are mapped into the interval tree's half-open space on insert and query, so
/// boundary-contact overlap is preserved.
///
pub struct AnnotationIndex<T> {
    chroms: HashMap<String, ChromAnnotations<T>>,
    record_count: usize,
}

impl<T: AnnotationRecord> AnnotationIndex<T> {
    pub fn new() -> Self {
        Self {
            chroms: HashMap::new(),
            record_count: 0,
        }
    }

    pub fn insert(&mut self, record: T) {
        let region = record.region();
        let chrom_annotations = self
            .chroms
            .entry(region.chrom.clone())
            .or_insert_with(ChromAnnotations::new);
        let record_index = chrom_annotations.records.len();
        chrom_annotations
            .tree
            .insert(region.range.start..(region.range.end + 1), record_index);
        chrom_annotations.records.push(record);
        self.record_count += 1;
    }

    /// Return every record on the query region's chromosome whose region overlaps it
    ///
    /// A chromosome with no annotation entry yields an empty result; this is a valid
    /// "no annotation available" state rather than an error.
    ///
    pub fn overlapping(&self, region: &GenomeRegion) -> Vec<&T> {
        let chrom_annotations = match self.chroms.get(&region.chrom) {
            Some(x) => x,
            None => {
                return Vec::new();
            }
        };
        chrom_annotations
            .tree
            .find(region.range.start..(region.range.end + 1))
            .map(|entry| &chrom_annotations.records[*entry.data()])
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

impl<T: AnnotationRecord> Default for AnnotationIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_index() -> AnnotationIndex<Probe> {
        let mut index = AnnotationIndex::new();
        index.insert(Probe::new("chr1", 100, 200));
        index.insert(Probe::new("chr1", 300, 400));
        index.insert(Probe::new("chr2", 100, 200));
        index
    }

    #[test]
    fn test_overlapping() {
        let index = probe_index();

        let hits = index.overlapping(&GenomeRegion::new("chr1", 150, 350));
        assert_eq!(hits.len(), 2);

        let hits = index.overlapping(&GenomeRegion::new("chr1", 201, 299));
        assert!(hits.is_empty());

        // Same positions on another chromosome only hit that chromosome's records
        let hits = index.overlapping(&GenomeRegion::new("chr2", 150, 350));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_overlapping_boundary_contact() {
        let index = probe_index();

        let hits = index.overlapping(&GenomeRegion::new("chr1", 200, 250));
        assert_eq!(hits.len(), 1);

        let hits = index.overlapping(&GenomeRegion::new("chr1", 50, 100));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_missing_chromosome() {
        let index = probe_index();
        assert!(index.overlapping(&GenomeRegion::new("chrX", 0, 1000)).is_empty());
    }

    #[test]
    fn test_exon_gene_names() {
        let exon = Exon::new("chr1", 100, 200, "BRCA1:BRCA1-AS1");
        assert_eq!(exon.gene_names, vec!["BRCA1", "BRCA1-AS1"]);

        let exon = Exon::new("chr1", 100, 200, "TP53");
        assert_eq!(exon.gene_names, vec!["TP53"]);
    }
}
