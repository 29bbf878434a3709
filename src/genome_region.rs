use std::fmt;

/// A simple type for integer position ranges
///
/// All ranges follow the coordinate convention of the array CNV tables and GATK4 segment files this
/// tool consumes: 1-indexed, fully-closed, [start,end]
///
/// This struct is used instead of the native rust Range type just to focus on the specific goals of
/// primarily genomic region intervals.
///
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct PosRange {
    pub start: i64,
    pub end: i64,
}

impl PosRange {
    pub fn from_pair(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Span of the closed range, following the length convention of the source call tables
    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    /// Return true if the ranges intersect (boundary contact counts)
    ///
    pub fn intersect_range(&self, other: &PosRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Debug for PosRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}-{}]", self.start, self.end)
    }
}

/// The structure represents a contiguous region of the genome on a single chromosome
///
/// Chromosomes are tracked by name. The input tables for the supported callers don't share a common
/// sequence dictionary, so there is no natural chromosome index space to map them all into.
///
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct GenomeRegion {
    pub chrom: String,
    pub range: PosRange,
}

impl GenomeRegion {
    pub fn new(chrom: &str, start: i64, end: i64) -> Self {
        Self {
            chrom: chrom.to_string(),
            range: PosRange::from_pair(start, end),
        }
    }

    pub fn length(&self) -> i64 {
        self.range.length()
    }

    pub fn intersect(&self, other: &Self) -> bool {
        self.chrom == other.chrom && self.range.intersect_range(&other.range)
    }
}

impl fmt::Display for GenomeRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.range.start, self.range.end)
    }
}

impl fmt::Debug for GenomeRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Region: {}:{:?}", self.chrom, self.range)
    }
}

/// Round to a fixed number of decimal places
pub fn round_decimals(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Percent of `other` covered by its intersection with `reference`, in [0,100]
///
/// The denominator is always the length of `other` (the call under evaluation), so a small call
/// fully inside a large reference region still scores 100. Evaluation order:
/// (1) containment in either direction, including an exact boundary match, scores 100;
/// (2) otherwise the intersection size is clamped to >= 0 and divided by `other`'s length.
///
/// The result is rounded to 3 decimal places. A zero-length `other` that is not contained by
/// `reference` scores 0.
///
pub fn percent_range_overlap(reference: &PosRange, other: &PosRange) -> f64 {
    if (reference.start <= other.start && reference.end >= other.end)
        || (other.start <= reference.start && other.end >= reference.end)
    {
        return 100.0;
    }
    if other.length() == 0 {
        return 0.0;
    }
    let overlap_size = std::cmp::max(
        0,
        std::cmp::min(reference.end, other.end) - std::cmp::max(reference.start, other.start),
    );
    round_decimals((overlap_size as f64 / other.length() as f64) * 100.0, 3)
}

/// Region-level wrapper over [`percent_range_overlap`], scoring 0 across chromosomes
pub fn percent_overlap(reference: &GenomeRegion, other: &GenomeRegion) -> f64 {
    if reference.chrom != other.chrom {
        return 0.0;
    }
    percent_range_overlap(&reference.range, &other.range)
}

/// Get the signed distances between the boundaries of a call and its reference region
///
/// Returns (left, right) where left = call.start - reference.start and
/// right = call.end - reference.end. Positive values mean the call boundary extends beyond the
/// reference boundary, negative values mean it falls short. Used for reporting only.
///
pub fn hangover(call: &PosRange, reference: &PosRange) -> (i64, i64) {
    (call.start - reference.start, call.end - reference.end)
}

/// Convert from a region string (e.g. chr20:100-200) to a GenomeRegion
///
/// Commas will be stripped out of the coordinates if present, matching the number formatting used
/// in some array CNV exports.
///
pub fn parse_region_string(region_str: &str) -> Option<GenomeRegion> {
    let (chrom, pos_str) = region_str.rsplit_once(':')?;
    let (start_str, end_str) = pos_str.split_once('-')?;
    let strip = |s: &str| {
        let mut s = String::from(s);
        s.retain(|c| c != ',');
        s
    };
    let start = strip(start_str).parse::<i64>().ok()?;
    let end = strip(end_str).parse::<i64>().ok()?;
    if chrom.is_empty() || start > end {
        return None;
    }
    Some(GenomeRegion::new(chrom, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_range() {
        let r1 = PosRange::from_pair(100, 200);
        let r2 = PosRange::from_pair(200, 300);
        let r3 = PosRange::from_pair(301, 400);

        // Boundary contact counts as overlap
        assert!(r1.intersect_range(&r2));
        assert!(r2.intersect_range(&r1));
        assert!(!r1.intersect_range(&r3));
        assert!(r2.intersect_range(&r3));
    }

    #[test]
    fn test_intersect_symmetry() {
        let cases = [
            (PosRange::from_pair(1, 10), PosRange::from_pair(5, 20)),
            (PosRange::from_pair(1, 10), PosRange::from_pair(10, 20)),
            (PosRange::from_pair(1, 10), PosRange::from_pair(11, 20)),
            (PosRange::from_pair(5, 6), PosRange::from_pair(1, 20)),
        ];
        for (a, b) in cases {
            assert_eq!(a.intersect_range(&b), b.intersect_range(&a));
        }
    }

    #[test]
    fn test_percent_overlap_containment() {
        // Call fully inside the reference scores 100
        let reference = PosRange::from_pair(1000, 20000);
        let call = PosRange::from_pair(5000, 6000);
        assert_eq!(percent_range_overlap(&reference, &call), 100.0);

        // Reference fully inside the call also scores 100
        assert_eq!(percent_range_overlap(&call, &reference), 100.0);

        // Exact boundary match scores 100
        let exact = PosRange::from_pair(1000, 20000);
        assert_eq!(percent_range_overlap(&reference, &exact), 100.0);
    }

    #[test]
    fn test_percent_overlap_partial() {
        let reference = PosRange::from_pair(1000, 2000);
        let call = PosRange::from_pair(1500, 2500);
        assert_eq!(percent_range_overlap(&reference, &call), 50.0);

        // Disjoint ranges clamp to 0
        let far = PosRange::from_pair(3000, 4000);
        assert_eq!(percent_range_overlap(&reference, &far), 0.0);
    }

    #[test]
    fn test_percent_overlap_bounds() {
        let cases = [
            (PosRange::from_pair(1, 10), PosRange::from_pair(5, 20)),
            (PosRange::from_pair(1, 10), PosRange::from_pair(100, 200)),
            (PosRange::from_pair(50, 60), PosRange::from_pair(1, 1000)),
            (PosRange::from_pair(1, 1000), PosRange::from_pair(999, 1001)),
        ];
        for (reference, call) in cases {
            let pct = percent_range_overlap(&reference, &call);
            assert!((0.0..=100.0).contains(&pct));
        }
    }

    #[test]
    fn test_percent_overlap_zero_length_call() {
        let reference = PosRange::from_pair(1000, 2000);
        let contained = PosRange::from_pair(1500, 1500);
        assert_eq!(percent_range_overlap(&reference, &contained), 100.0);

        let outside = PosRange::from_pair(3000, 3000);
        assert_eq!(percent_range_overlap(&reference, &outside), 0.0);
    }

    #[test]
    fn test_percent_overlap_cross_chromosome() {
        let r1 = GenomeRegion::new("chr1", 100, 200);
        let r2 = GenomeRegion::new("chr2", 100, 200);
        assert_eq!(percent_overlap(&r1, &r2), 0.0);
    }

    #[test]
    fn test_hangover() {
        let call = PosRange::from_pair(900, 2100);
        let reference = PosRange::from_pair(1000, 2000);
        assert_eq!(hangover(&call, &reference), (-100, 100));

        let exact = PosRange::from_pair(1000, 2000);
        assert_eq!(hangover(&exact, &reference), (0, 0));
    }

    #[test]
    fn test_parse_region_string() {
        let region = parse_region_string("chr2:1,000-2,000").unwrap();
        assert_eq!(region.chrom, "chr2");
        assert_eq!(region.range.start, 1000);
        assert_eq!(region.range.end, 2000);

        assert!(parse_region_string("chr2").is_none());
        assert!(parse_region_string("chr2:2000-1000").is_none());
        assert!(parse_region_string("chr2:a-b").is_none());
    }

    #[test]
    fn test_round_decimals() {
        approx::assert_ulps_eq!(round_decimals(33.333333, 3), 33.333, max_ulps = 4);
        approx::assert_ulps_eq!(round_decimals(12.5, 2), 12.5, max_ulps = 4);
        approx::assert_ulps_eq!(round_decimals(2.0 / 40.0 * 100.0, 2), 5.0, max_ulps = 4);
    }
}
