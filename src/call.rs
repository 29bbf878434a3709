use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumCount;

use crate::annotation::{Exon, Probe};
use crate::genome_region::{GenomeRegion, round_decimals};

/// Copy number direction of a call, shared across all callers and the array
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallDirection {
    Gain,
    Loss,
    Neutral,
}

impl CallDirection {
    /// Parse the call vocabulary used by the array CNV tables
    pub fn from_array_label(label: &str) -> Option<Self> {
        match label {
            "CN Gain" => Some(CallDirection::Gain),
            "CN Loss" => Some(CallDirection::Loss),
            _ => None,
        }
    }

    /// The segment-file call symbol for this direction
    pub fn segment_symbol(&self) -> &'static str {
        match self {
            CallDirection::Gain => "+",
            CallDirection::Loss => "-",
            CallDirection::Neutral => "0",
        }
    }
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            CallDirection::Gain => "CN Gain",
            CallDirection::Loss => "CN Loss",
            CallDirection::Neutral => "Neutral",
        };
        write!(f, "{label}")
    }
}

/// The CNV caller a call set originates from
///
/// Each tool encodes call direction with its own symbols, so each carries its own translation
/// table into [`CallDirection`].
///
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum, Deserialize, Serialize)]
pub enum CallerTool {
    Gatk4,
    Conifer,
    ExomeDepth,
}

impl CallerTool {
    pub fn label(&self) -> &'static str {
        match self {
            CallerTool::Gatk4 => "GATK4",
            CallerTool::Conifer => "Conifer",
            CallerTool::ExomeDepth => "ExomeDepth",
        }
    }

    /// Translate a tool-native call symbol into a shared call direction
    ///
    /// Returns None for symbols outside the tool's call vocabulary.
    ///
    pub fn translate_direction(&self, symbol: &str) -> Option<CallDirection> {
        match self {
            CallerTool::Gatk4 => match symbol {
                "+" => Some(CallDirection::Gain),
                "-" => Some(CallDirection::Loss),
                "0" => Some(CallDirection::Neutral),
                _ => None,
            },
            CallerTool::Conifer => match symbol {
                "dup" => Some(CallDirection::Gain),
                "del" => Some(CallDirection::Loss),
                _ => None,
            },
            CallerTool::ExomeDepth => match symbol {
                "duplication" => Some(CallDirection::Gain),
                "deletion" => Some(CallDirection::Loss),
                _ => None,
            },
        }
    }
}

/// Caller-specific measurements carried on a call
///
/// These are opaque to classification and frequency grouping and are carried through for
/// reporting only.
///
#[derive(Clone, Debug)]
pub enum CallerMetrics {
    Gatk4 {
        num_points_copy_ratio: u32,
        mean_log2_copy_ratio: f64,
    },
    Conifer,
    ExomeDepth {
        bayes_factor: f64,
        reads_expected: u32,
        reads_observed: u32,
        reads_ratio: f64,
        exon_count: u32,
    },
}

/// Classification state of a caller call after comparison against the sample's array calls
#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumCount)]
pub enum Classification {
    Unclassified,
    TruePositive,
    ArrayNonInformative,
    WesNonInformative,
    ArrayAndWesNonInformative,
    FalsePositive,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Unclassified => "UNCLASSIFIED",
            Classification::TruePositive => "TRUE POSITIVE",
            Classification::ArrayNonInformative => "ARRAY NON-INFORMATIVE",
            Classification::WesNonInformative => "WES NON-INFORMATIVE",
            Classification::ArrayAndWesNonInformative => "ARRAY & WES NON-INFORMATIVE",
            Classification::FalsePositive => "FALSE POSITIVE",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Direction agreement between a matched caller call and its array call
#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumCount)]
pub enum ConcordanceResult {
    Concordant,
    Conflicting,
    Discordant,
    NoArray,
}

impl fmt::Display for ConcordanceResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ConcordanceResult::Concordant => "Concordant",
            ConcordanceResult::Conflicting => "Conflicting",
            ConcordanceResult::Discordant => "Discordant",
            ConcordanceResult::NoArray => "No array",
        };
        write!(f, "{label}")
    }
}

/// Occurrence of a call or call group over the cohort, displayed as "k/n"
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Occurrence {
    pub count: u32,
    pub total: u32,
}

impl Occurrence {
    pub fn frequency_percent(&self) -> f64 {
        round_decimals((self.count as f64 / self.total as f64) * 100.0, 2)
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.count, self.total)
    }
}

/// Cohort frequency annotation produced by the frequency grouping engine
#[derive(Clone, Debug)]
pub struct FrequencyAnnotation {
    /// How many cohort samples carry this exact call region
    pub occurrence: Occurrence,
    pub frequency_percent: f64,

    /// Best frequency group the call belongs to
    pub group_name: String,
    pub group_occurrence: Occurrence,
    pub group_frequency_percent: f64,
}

/// One CNV call produced by an exome-sequencing caller
///
/// Calls are created once at load time and mutated in place by the classifier and the frequency
/// grouping engine.
///
#[derive(Clone, Debug)]
pub struct CnvCall {
    pub sample_id: String,
    pub pseudonym_id: String,
    pub region: GenomeRegion,
    pub direction: CallDirection,
    pub metrics: CallerMetrics,

    /// Probes from the array design overlapping the call region
    pub probes: Vec<Probe>,
    /// Exons from the capture design overlapping the call region
    pub exons: Vec<Exon>,

    pub classification: Classification,
    pub concordance: Option<ConcordanceResult>,
    /// Index of the matched array call in the owning sample's array call list
    pub matched_array_index: Option<usize>,
    pub left_hangover: Option<i64>,
    pub right_hangover: Option<i64>,

    pub frequency: Option<FrequencyAnnotation>,
}

impl CnvCall {
    pub fn new(
        sample_id: &str,
        pseudonym_id: &str,
        region: GenomeRegion,
        direction: CallDirection,
        metrics: CallerMetrics,
    ) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            pseudonym_id: pseudonym_id.to_string(),
            region,
            direction,
            metrics,
            probes: Vec::new(),
            exons: Vec::new(),
            classification: Classification::Unclassified,
            concordance: None,
            matched_array_index: None,
            left_hangover: None,
            right_hangover: None,
            frequency: None,
        }
    }

    pub fn length(&self) -> i64 {
        self.region.length()
    }

    /// Names of all genes touched by the call's overlapping exons, sorted and deduplicated
    pub fn gene_names(&self) -> Vec<String> {
        unique_gene_names(&self.exons)
    }

    /// Clear all classification state so the call can be classified again from scratch
    pub fn reset_classification(&mut self) {
        self.classification = Classification::Unclassified;
        self.concordance = None;
        self.matched_array_index = None;
        self.left_hangover = None;
        self.right_hangover = None;
    }
}

/// One CNV call from the array-based gold standard assay
#[derive(Clone, Debug)]
pub struct ArrayCall {
    pub region: GenomeRegion,
    pub direction: CallDirection,

    /// Probe count reported by the array vendor for this call
    pub probe_count: u32,
    /// Gene count reported by the array vendor for this call
    pub gene_count: u32,
    /// Vendor classification tag
    pub cnv_class: String,

    pub exons: Vec<Exon>,

    /// Indices of matching caller calls in the owning sample's call list
    ///
    /// Append-only, written by the classifier.
    ///
    pub matched_call_indices: Vec<usize>,

    /// Set by the leftover resolver when no caller call matched this array call
    pub false_negative: bool,
}

impl ArrayCall {
    pub fn new(
        region: GenomeRegion,
        direction: CallDirection,
        probe_count: u32,
        gene_count: u32,
        cnv_class: &str,
    ) -> Self {
        Self {
            region,
            direction,
            probe_count,
            gene_count,
            cnv_class: cnv_class.to_string(),
            exons: Vec::new(),
            matched_call_indices: Vec::new(),
            false_negative: false,
        }
    }

    pub fn length(&self) -> i64 {
        self.region.length()
    }

    pub fn gene_names(&self) -> Vec<String> {
        unique_gene_names(&self.exons)
    }
}

fn unique_gene_names(exons: &[Exon]) -> Vec<String> {
    let names: BTreeSet<&String> = exons.iter().flat_map(|x| x.gene_names.iter()).collect();
    names.into_iter().cloned().collect()
}

/// All caller and array calls belonging to one cohort sample
#[derive(Clone, Debug, Default)]
pub struct SampleCallSet {
    pub pseudonym_id: String,
    pub calls: Vec<CnvCall>,
    pub array_calls: Vec<ArrayCall>,
}

impl SampleCallSet {
    pub fn new(pseudonym_id: &str) -> Self {
        Self {
            pseudonym_id: pseudonym_id.to_string(),
            calls: Vec::new(),
            array_calls: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_translations() {
        assert_eq!(
            CallerTool::Gatk4.translate_direction("+"),
            Some(CallDirection::Gain)
        );
        assert_eq!(
            CallerTool::Gatk4.translate_direction("0"),
            Some(CallDirection::Neutral)
        );
        assert_eq!(
            CallerTool::Conifer.translate_direction("del"),
            Some(CallDirection::Loss)
        );
        assert_eq!(
            CallerTool::ExomeDepth.translate_direction("duplication"),
            Some(CallDirection::Gain)
        );
        assert_eq!(CallerTool::Conifer.translate_direction("0"), None);
        assert_eq!(
            CallDirection::from_array_label("CN Loss"),
            Some(CallDirection::Loss)
        );
        assert_eq!(CallDirection::from_array_label("LOH"), None);
    }

    #[test]
    fn test_occurrence() {
        let occurrence = Occurrence {
            count: 5,
            total: 40,
        };
        assert_eq!(occurrence.to_string(), "5/40");
        approx::assert_ulps_eq!(occurrence.frequency_percent(), 12.5, max_ulps = 4);
    }

    #[test]
    fn test_gene_names_deduplicated() {
        let exons = vec![
            Exon::new("chr1", 100, 200, "PKD1:PKD1-AS"),
            Exon::new("chr1", 300, 400, "PKD1"),
            Exon::new("chr1", 500, 600, "ABC1"),
        ];
        let mut call = CnvCall::new(
            "s1",
            "p1",
            GenomeRegion::new("chr1", 1, 1000),
            CallDirection::Gain,
            CallerMetrics::Conifer,
        );
        call.exons = exons;
        assert_eq!(call.gene_names(), vec!["ABC1", "PKD1", "PKD1-AS"]);
    }
}
