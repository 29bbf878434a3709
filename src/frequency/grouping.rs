use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;
use rayon::prelude::*;
use simple_error::{SimpleResult, bail};

use crate::call::{CallDirection, FrequencyAnnotation, Occurrence, SampleCallSet};
use crate::genome_region::percent_overlap;

/// Thresholds controlling frequency group formation and the common/rare verdict
#[derive(Clone, Debug)]
pub struct FrequencyThresholds {
    /// Total number of sequenced cohort samples
    ///
    /// May exceed the number of samples carrying calls, so it can't be derived from the call set.
    ///
    pub cohort_size: u32,

    /// Minimum percent of a call covered by a group representative to join the group
    pub min_group_overlap_percent: f64,

    /// Minimum group occurrence for the group to be considered common
    pub min_calls: u32,

    /// Minimum group frequency percent for the group to be considered common
    pub min_sample_percent: f64,

    /// Calls at or above this size are excluded from positional seed groups
    pub max_group_call_size: i64,
}

impl FrequencyThresholds {
    pub fn new(cohort_size: u32) -> Self {
        Self {
            cohort_size,
            min_group_overlap_percent: 80.0,
            min_calls: 3,
            min_sample_percent: 5.0,
            max_group_call_size: 5_000_000,
        }
    }

    /// Check the threshold domain before any grouping starts
    pub fn validate(&self) -> SimpleResult<()> {
        if self.cohort_size == 0 {
            bail!("Cohort size must be greater than 0");
        }
        if !(0.0..=100.0).contains(&self.min_group_overlap_percent) {
            bail!(
                "Minimum group overlap percent must be in [0,100], got {}",
                self.min_group_overlap_percent
            );
        }
        if !(0.0..=100.0).contains(&self.min_sample_percent) {
            bail!(
                "Minimum sample percent must be in [0,100], got {}",
                self.min_sample_percent
            );
        }
        if self.max_group_call_size <= 0 {
            bail!(
                "Maximum group call size must be greater than 0, got {}",
                self.max_group_call_size
            );
        }
        Ok(())
    }
}

/// Address of one call within a cohort call set
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CallHandle {
    pub sample_index: usize,
    pub call_index: usize,
}

/// One formed frequency group: all calls of one direction overlapping a representative call
/// by at least the configured percentage
#[derive(Clone, Debug)]
pub struct CallGroup {
    pub name: String,
    pub representative: CallHandle,
    pub members: Vec<CallHandle>,
    pub occurrence: Occurrence,
    pub frequency_percent: f64,
    pub is_common: bool,
}

/// Grouping results for one call direction over the whole cohort
pub struct DirectionGrouping {
    pub groups: Vec<CallGroup>,
    pub singleton_group_count: usize,
}

type RegionKey = (String, i64, i64);

fn region_key(samples: &[SampleCallSet], handle: CallHandle) -> RegionKey {
    let region = &samples[handle.sample_index].calls[handle.call_index].region;
    (region.chrom.clone(), region.range.start, region.range.end)
}

/// Iterate the handles of every call with the requested direction, in cohort order
fn direction_handles(samples: &[SampleCallSet], direction: CallDirection) -> Vec<CallHandle> {
    let mut handles = Vec::new();
    for (sample_index, sample) in samples.iter().enumerate() {
        for (call_index, call) in sample.calls.iter().enumerate() {
            if call.direction == direction {
                handles.push(CallHandle {
                    sample_index,
                    call_index,
                });
            }
        }
    }
    handles
}

/// Count the distinct cohort samples carrying each exact call region
fn raw_occurrences(samples: &[SampleCallSet], handles: &[CallHandle]) -> HashMap<RegionKey, u32> {
    let mut region_samples: HashMap<RegionKey, BTreeSet<usize>> = HashMap::new();
    for &handle in handles {
        region_samples
            .entry(region_key(samples, handle))
            .or_default()
            .insert(handle.sample_index);
    }
    region_samples
        .into_iter()
        .map(|(key, sample_set)| (key, sample_set.len() as u32))
        .collect()
}

/// Which call boundary seeds a positional group
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SeedBoundary {
    Start,
    End,
}

impl SeedBoundary {
    fn prefix(&self) -> &'static str {
        match self {
            SeedBoundary::Start => "s",
            SeedBoundary::End => "e",
        }
    }
}

fn direction_prefix(direction: CallDirection) -> &'static str {
    match direction {
        CallDirection::Loss => "d",
        _ => "i",
    }
}

/// Group calls by the exact position of one boundary, per chromosome
///
/// Calls at or above the size cap are excluded. BTreeMap keys give a deterministic chromosome and
/// position order for downstream group naming.
///
fn positional_groups(
    samples: &[SampleCallSet],
    handles: &[CallHandle],
    boundary: SeedBoundary,
    max_group_call_size: i64,
) -> BTreeMap<String, BTreeMap<i64, Vec<CallHandle>>> {
    let mut groups: BTreeMap<String, BTreeMap<i64, Vec<CallHandle>>> = BTreeMap::new();
    for &handle in handles {
        let call = &samples[handle.sample_index].calls[handle.call_index];
        if call.length() >= max_group_call_size {
            continue;
        }
        let pos = match boundary {
            SeedBoundary::Start => call.region.range.start,
            SeedBoundary::End => call.region.range.end,
        };
        groups
            .entry(call.region.chrom.clone())
            .or_default()
            .entry(pos)
            .or_default()
            .push(handle);
    }
    groups
}

/// Pick the representative of each positional group holding more than one member
///
/// Members are ordered by length ascending and the call at index count/2 - 1 is taken. This
/// deliberately biased median-ish rule is preserved from the historical frequency annotation tool
/// rather than corrected to a true median, since downstream reports depend on the exact behavior.
///
fn group_representatives(
    samples: &[SampleCallSet],
    groups: &BTreeMap<String, BTreeMap<i64, Vec<CallHandle>>>,
) -> Vec<CallHandle> {
    let mut representatives = Vec::new();
    for position_groups in groups.values() {
        for members in position_groups.values() {
            if members.len() < 2 {
                continue;
            }
            let ordered = members
                .iter()
                .copied()
                .sorted_by_key(|&handle| {
                    let call = &samples[handle.sample_index].calls[handle.call_index];
                    (
                        call.length(),
                        call.region.range.start,
                        call.region.range.end,
                        handle,
                    )
                })
                .collect::<Vec<_>>();
            representatives.push(ordered[members.len() / 2 - 1]);
        }
    }
    representatives
}

/// Form one proper group: every call of the direction on the representative's chromosome covered
/// by the representative for at least `min_group_overlap_percent` percent of its own length
fn form_group(
    samples: &[SampleCallSet],
    handles: &[CallHandle],
    representative: CallHandle,
    min_group_overlap_percent: f64,
) -> Vec<CallHandle> {
    let rep_region = &samples[representative.sample_index].calls[representative.call_index].region;
    handles
        .iter()
        .copied()
        .filter(|&handle| {
            let call = &samples[handle.sample_index].calls[handle.call_index];
            call.region.chrom == rep_region.chrom
                && percent_overlap(rep_region, &call.region) >= min_group_overlap_percent
        })
        .collect()
}

/// Sum the raw occurrence of each distinct region appearing in a group
///
/// A region seen in multiple samples appears as multiple member calls but is counted once.
fn group_occurrence(
    samples: &[SampleCallSet],
    members: &[CallHandle],
    occurrences: &HashMap<RegionKey, u32>,
) -> u32 {
    members
        .iter()
        .map(|&handle| region_key(samples, handle))
        .unique()
        .map(|key| occurrences.get(&key).copied().unwrap_or(0))
        .sum()
}

/// Run the full frequency grouping pass for one call direction across the cohort
///
/// Every call of the direction ends the pass carrying a [`FrequencyAnnotation`]: its raw cohort
/// occurrence plus the containing group with the highest frequency, falling back to a singleton
/// group holding just the call's own raw occurrence. The formed proper groups are returned for
/// group-level reporting and common-call filtering.
///
pub fn annotate_direction_frequency(
    samples: &mut [SampleCallSet],
    direction: CallDirection,
    thresholds: &FrequencyThresholds,
) -> DirectionGrouping {
    let samples_view: &[SampleCallSet] = samples;
    let handles = direction_handles(samples_view, direction);
    let occurrences = raw_occurrences(samples_view, &handles);

    // Form the proper groups from start-seeded then end-seeded representatives, with a running
    // name counter per seed boundary
    let mut groups: Vec<CallGroup> = Vec::new();
    for boundary in [SeedBoundary::Start, SeedBoundary::End] {
        let seeds =
            positional_groups(samples_view, &handles, boundary, thresholds.max_group_call_size);
        let representatives = group_representatives(samples_view, &seeds);

        let members_per_group: Vec<Vec<CallHandle>> = representatives
            .par_iter()
            .map(|&representative| {
                form_group(
                    samples_view,
                    &handles,
                    representative,
                    thresholds.min_group_overlap_percent,
                )
            })
            .collect();

        for (group_number, (representative, members)) in representatives
            .into_iter()
            .zip(members_per_group.into_iter())
            .enumerate()
        {
            let occurrence = Occurrence {
                count: group_occurrence(samples_view, &members, &occurrences),
                total: thresholds.cohort_size,
            };
            let frequency_percent = occurrence.frequency_percent();
            let is_common = occurrence.count >= thresholds.min_calls
                && frequency_percent >= thresholds.min_sample_percent;
            groups.push(CallGroup {
                name: format!(
                    "{}{}{}",
                    boundary.prefix(),
                    direction_prefix(direction),
                    group_number + 1
                ),
                representative,
                members,
                occurrence,
                frequency_percent,
                is_common,
            });
        }
    }

    // For every call pick the containing group with the highest frequency; the first formed
    // group wins ties
    let mut best_group: HashMap<CallHandle, usize> = HashMap::new();
    for (group_index, group) in groups.iter().enumerate() {
        for &handle in group.members.iter() {
            let better = match best_group.get(&handle) {
                None => true,
                Some(&current) => group.frequency_percent > groups[current].frequency_percent,
            };
            if better {
                best_group.insert(handle, group_index);
            }
        }
    }

    // Annotate every call of the direction; calls outside all proper groups fall back to a
    // singleton group holding their own raw occurrence
    let singleton_prefix = match direction {
        CallDirection::Loss => "xd",
        _ => "xi",
    };
    let mut singleton_group_count = 0;
    for &handle in handles.iter() {
        let occurrence = Occurrence {
            count: occurrences[&region_key(samples, handle)],
            total: thresholds.cohort_size,
        };
        let (group_name, group_occurrence, group_frequency_percent) =
            match best_group.get(&handle) {
                Some(&group_index) => {
                    let group = &groups[group_index];
                    (
                        group.name.clone(),
                        group.occurrence,
                        group.frequency_percent,
                    )
                }
                None => {
                    singleton_group_count += 1;
                    (
                        format!("{singleton_prefix}{singleton_group_count}"),
                        occurrence,
                        occurrence.frequency_percent(),
                    )
                }
            };
        samples[handle.sample_index].calls[handle.call_index].frequency =
            Some(FrequencyAnnotation {
                occurrence,
                frequency_percent: occurrence.frequency_percent(),
                group_name,
                group_occurrence,
                group_frequency_percent,
            });
    }

    DirectionGrouping {
        groups,
        singleton_group_count,
    }
}
