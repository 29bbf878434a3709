use simple_error::{SimpleResult, bail};

use crate::call::{CallDirection, Classification, ConcordanceResult, SampleCallSet};
use crate::genome_region::{hangover, percent_overlap};

/// Thresholds controlling array match acceptance and informativeness branching
#[derive(Clone, Debug)]
pub struct ClassifyThresholds {
    /// Minimum overlapping exon count for a call region to be exome-informative
    pub min_exons: usize,

    /// Minimum overlapping probe count for a call region to be array-informative
    pub min_probes: usize,

    /// Minimum percent of the caller call covered by an array call to accept the match
    pub min_overlap_percent: f64,
}

impl Default for ClassifyThresholds {
    fn default() -> Self {
        Self {
            min_exons: 3,
            min_probes: 10,
            min_overlap_percent: 50.0,
        }
    }
}

impl ClassifyThresholds {
    /// Check the threshold domain before any classification starts
    pub fn validate(&self) -> SimpleResult<()> {
        if !(0.0..=100.0).contains(&self.min_overlap_percent) {
            bail!(
                "Minimum overlap percent must be in [0,100], got {}",
                self.min_overlap_percent
            );
        }
        Ok(())
    }
}

/// Find the array call best matching one caller call
///
/// Candidates are the sample's array calls on the call's chromosome overlapping it with at least
/// `min_overlap_percent` percent of the caller call covered. Among candidates the winner is the
/// one with the highest percent overlap; ties are broken by smaller array region length, then
/// smaller start position, then lower list index. This replaces an iteration-order dependent
/// last-match-wins rule in the pipeline this tool descends from.
///
fn find_best_match(
    sample: &SampleCallSet,
    call_index: usize,
    min_overlap_percent: f64,
) -> Option<usize> {
    let call = &sample.calls[call_index];
    let mut best: Option<(usize, f64)> = None;
    for (array_index, array_call) in sample.array_calls.iter().enumerate() {
        if !call.region.intersect(&array_call.region) {
            continue;
        }
        let overlap = percent_overlap(&array_call.region, &call.region);
        if overlap < min_overlap_percent {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_index, best_overlap)) => {
                let best_call = &sample.array_calls[best_index];
                if overlap != best_overlap {
                    overlap > best_overlap
                } else if array_call.length() != best_call.length() {
                    array_call.length() < best_call.length()
                } else {
                    array_call.region.range.start < best_call.region.range.start
                }
            }
        };
        if better {
            best = Some((array_index, overlap));
        }
    }
    best.map(|(array_index, _)| array_index)
}

fn determine_concordance(
    call_direction: CallDirection,
    array_direction: CallDirection,
) -> ConcordanceResult {
    if call_direction == CallDirection::Neutral {
        ConcordanceResult::Discordant
    } else if call_direction == array_direction {
        ConcordanceResult::Concordant
    } else {
        ConcordanceResult::Conflicting
    }
}

/// Classify every caller call of one sample against the sample's array calls
///
/// Matched calls are labeled true positive, linked to their array call in both directions and
/// given a concordance verdict from the direction comparison. Unmatched calls are labeled by the
/// annotation density of their own region. Afterwards every array call that no caller call
/// matched is flagged false negative.
///
/// All prior classification state is cleared first, so repeated runs on the same inputs produce
/// identical results.
///
pub fn classify_sample(sample: &mut SampleCallSet, thresholds: &ClassifyThresholds) {
    for call in sample.calls.iter_mut() {
        call.reset_classification();
    }
    for array_call in sample.array_calls.iter_mut() {
        array_call.matched_call_indices.clear();
        array_call.false_negative = false;
    }

    for call_index in 0..sample.calls.len() {
        match find_best_match(sample, call_index, thresholds.min_overlap_percent) {
            Some(array_index) => {
                let array_direction = sample.array_calls[array_index].direction;
                let (left, right) = hangover(
                    &sample.calls[call_index].region.range,
                    &sample.array_calls[array_index].region.range,
                );

                let call = &mut sample.calls[call_index];
                call.classification = Classification::TruePositive;
                call.concordance = Some(determine_concordance(call.direction, array_direction));
                call.matched_array_index = Some(array_index);
                call.left_hangover = Some(left);
                call.right_hangover = Some(right);
                sample.array_calls[array_index]
                    .matched_call_indices
                    .push(call_index);
            }
            None => {
                let call = &mut sample.calls[call_index];
                let exome_informative = call.exons.len() >= thresholds.min_exons;
                let array_informative = call.probes.len() >= thresholds.min_probes;
                call.classification = match (exome_informative, array_informative) {
                    (true, true) => Classification::FalsePositive,
                    (true, false) => Classification::ArrayNonInformative,
                    (false, true) => Classification::WesNonInformative,
                    (false, false) => Classification::ArrayAndWesNonInformative,
                };
                call.concordance = Some(ConcordanceResult::NoArray);
            }
        }
    }

    mark_unmatched_array_calls(sample);
}

/// Flag every array call that ended the classification pass without a matching caller call
fn mark_unmatched_array_calls(sample: &mut SampleCallSet) {
    for array_call in sample.array_calls.iter_mut() {
        if array_call.matched_call_indices.is_empty() {
            array_call.false_negative = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::EnumCount;

    use super::*;
    use crate::annotation::{Exon, Probe};
    use crate::call::{ArrayCall, CallerMetrics, CnvCall};
    use crate::genome_region::GenomeRegion;

    fn make_call(
        chrom: &str,
        start: i64,
        end: i64,
        direction: CallDirection,
        exon_count: usize,
        probe_count: usize,
    ) -> CnvCall {
        let mut call = CnvCall::new(
            "sample1",
            "pseudo1",
            GenomeRegion::new(chrom, start, end),
            direction,
            CallerMetrics::Conifer,
        );
        call.exons = (0..exon_count)
            .map(|i| Exon::new(chrom, start + i as i64, start + i as i64 + 1, "GENE"))
            .collect();
        call.probes = (0..probe_count)
            .map(|i| Probe::new(chrom, start + i as i64, start + i as i64 + 1))
            .collect();
        call
    }

    fn make_array_call(
        chrom: &str,
        start: i64,
        end: i64,
        direction: CallDirection,
        probe_count: u32,
    ) -> ArrayCall {
        ArrayCall::new(
            GenomeRegion::new(chrom, start, end),
            direction,
            probe_count,
            1,
            "Pathogenic",
        )
    }

    #[test]
    fn test_true_positive_concordant() {
        let mut sample = SampleCallSet::new("pseudo1");
        sample
            .calls
            .push(make_call("chr1", 1000, 2000, CallDirection::Gain, 4, 12));
        sample
            .array_calls
            .push(make_array_call("chr1", 1000, 2000, CallDirection::Gain, 15));

        classify_sample(&mut sample, &ClassifyThresholds::default());

        let call = &sample.calls[0];
        assert_eq!(call.classification, Classification::TruePositive);
        assert_eq!(call.concordance, Some(ConcordanceResult::Concordant));
        assert_eq!(call.matched_array_index, Some(0));
        assert_eq!(call.left_hangover, Some(0));
        assert_eq!(call.right_hangover, Some(0));
        assert_eq!(sample.array_calls[0].matched_call_indices, vec![0]);
        assert!(!sample.array_calls[0].false_negative);
    }

    #[test]
    fn test_conflicting_and_discordant() {
        let mut sample = SampleCallSet::new("pseudo1");
        sample
            .calls
            .push(make_call("chr1", 1000, 2000, CallDirection::Loss, 4, 12));
        sample
            .calls
            .push(make_call("chr2", 1000, 2000, CallDirection::Neutral, 4, 12));
        sample
            .array_calls
            .push(make_array_call("chr1", 1000, 2000, CallDirection::Gain, 15));
        sample
            .array_calls
            .push(make_array_call("chr2", 1000, 2000, CallDirection::Gain, 15));

        classify_sample(&mut sample, &ClassifyThresholds::default());

        assert_eq!(
            sample.calls[0].concordance,
            Some(ConcordanceResult::Conflicting)
        );
        assert_eq!(
            sample.calls[1].concordance,
            Some(ConcordanceResult::Discordant)
        );
    }

    #[test]
    fn test_unmatched_informativeness_branches() {
        let mut sample = SampleCallSet::new("pseudo1");
        // No array calls at all: every call classifies by its own annotation density
        sample
            .calls
            .push(make_call("chr2", 500, 600, CallDirection::Loss, 1, 2));
        sample
            .calls
            .push(make_call("chr2", 1000, 2000, CallDirection::Loss, 4, 2));
        sample
            .calls
            .push(make_call("chr2", 3000, 4000, CallDirection::Loss, 1, 12));
        sample
            .calls
            .push(make_call("chr2", 5000, 6000, CallDirection::Loss, 4, 12));

        classify_sample(&mut sample, &ClassifyThresholds::default());

        let labels = sample
            .calls
            .iter()
            .map(|x| x.classification)
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                Classification::ArrayAndWesNonInformative,
                Classification::ArrayNonInformative,
                Classification::WesNonInformative,
                Classification::FalsePositive,
            ]
        );
        for call in sample.calls.iter() {
            assert_eq!(call.concordance, Some(ConcordanceResult::NoArray));
            assert!(call.matched_array_index.is_none());
        }
    }

    #[test]
    fn test_below_threshold_overlap_is_not_a_match() {
        let mut sample = SampleCallSet::new("pseudo1");
        // 1000 of the call's 2500 length is covered, 40% < 50%
        sample
            .calls
            .push(make_call("chr1", 1000, 3500, CallDirection::Gain, 4, 12));
        sample
            .array_calls
            .push(make_array_call("chr1", 1, 2000, CallDirection::Gain, 15));

        classify_sample(&mut sample, &ClassifyThresholds::default());

        assert_eq!(sample.calls[0].classification, Classification::FalsePositive);
        assert!(sample.array_calls[0].false_negative);
    }

    #[test]
    fn test_false_negative_marking() {
        let mut sample = SampleCallSet::new("pseudo1");
        sample
            .calls
            .push(make_call("chr1", 1000, 2000, CallDirection::Gain, 4, 12));
        sample
            .array_calls
            .push(make_array_call("chr1", 1000, 2000, CallDirection::Gain, 15));
        sample
            .array_calls
            .push(make_array_call("chr3", 10000, 20000, CallDirection::Loss, 20));

        classify_sample(&mut sample, &ClassifyThresholds::default());

        // Every array call either holds matches or is flagged false negative, never both
        for array_call in sample.array_calls.iter() {
            assert_ne!(
                array_call.matched_call_indices.is_empty(),
                !array_call.false_negative
            );
        }
        assert!(sample.array_calls[1].false_negative);
    }

    #[test]
    fn test_match_tie_break() {
        let mut sample = SampleCallSet::new("pseudo1");
        sample
            .calls
            .push(make_call("chr1", 1000, 2000, CallDirection::Gain, 4, 12));
        // Both array calls fully contain the caller call (100% each); the smaller one wins
        sample
            .array_calls
            .push(make_array_call("chr1", 1, 50000, CallDirection::Gain, 30));
        sample
            .array_calls
            .push(make_array_call("chr1", 900, 2100, CallDirection::Gain, 15));

        classify_sample(&mut sample, &ClassifyThresholds::default());
        assert_eq!(sample.calls[0].matched_array_index, Some(1));

        // With distinct overlap percentages the higher percentage wins regardless of order
        let mut sample = SampleCallSet::new("pseudo1");
        sample
            .calls
            .push(make_call("chr1", 1000, 3000, CallDirection::Gain, 4, 12));
        sample
            .array_calls
            .push(make_array_call("chr1", 1000, 2200, CallDirection::Gain, 30));
        sample
            .array_calls
            .push(make_array_call("chr1", 1000, 2600, CallDirection::Gain, 15));

        classify_sample(&mut sample, &ClassifyThresholds::default());
        assert_eq!(sample.calls[0].matched_array_index, Some(1));
    }

    #[test]
    fn test_classification_totals_and_idempotence() {
        let mut sample = SampleCallSet::new("pseudo1");
        sample
            .calls
            .push(make_call("chr1", 1000, 2000, CallDirection::Gain, 4, 12));
        sample
            .calls
            .push(make_call("chr1", 5000, 9000, CallDirection::Loss, 1, 2));
        sample
            .calls
            .push(make_call("chr2", 500, 600, CallDirection::Loss, 4, 12));
        sample
            .array_calls
            .push(make_array_call("chr1", 1000, 2000, CallDirection::Gain, 15));

        classify_sample(&mut sample, &ClassifyThresholds::default());

        let mut label_counts = vec![0usize; Classification::COUNT];
        for call in sample.calls.iter() {
            assert_ne!(call.classification, Classification::Unclassified);
            label_counts[call.classification as usize] += 1;
        }
        assert_eq!(label_counts.iter().sum::<usize>(), sample.calls.len());

        let first_pass = sample.clone();
        classify_sample(&mut sample, &ClassifyThresholds::default());
        for (first, second) in first_pass.calls.iter().zip(sample.calls.iter()) {
            assert_eq!(first.classification, second.classification);
            assert_eq!(first.concordance, second.concordance);
            assert_eq!(first.matched_array_index, second.matched_array_index);
            assert_eq!(first.left_hangover, second.left_hangover);
        }
        for (first, second) in first_pass.array_calls.iter().zip(sample.array_calls.iter()) {
            assert_eq!(first.matched_call_indices, second.matched_call_indices);
            assert_eq!(first.false_negative, second.false_negative);
        }
    }

    #[test]
    fn test_threshold_validation() {
        let mut thresholds = ClassifyThresholds::default();
        assert!(thresholds.validate().is_ok());

        thresholds.min_overlap_percent = 101.0;
        assert!(thresholds.validate().is_err());

        thresholds.min_overlap_percent = -1.0;
        assert!(thresholds.validate().is_err());
    }
}
