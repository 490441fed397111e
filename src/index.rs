//! Interval indexing for fast overlap queries.

use crate::interval::Interval;
use std::collections::HashMap;

/// Per-chromosome entries sorted by start, with a parallel running
/// maximum of interval ends. Ends alone are not monotone over a
/// start-sorted list (a long interval can precede shorter ones), so the
/// binary search runs over the prefix maximum instead.
struct ChromIntervals {
    entries: Vec<(Interval, usize)>,
    max_end: Vec<u64>,
}

/// An indexed collection of intervals organized by chromosome.
/// Uses a sorted list with binary search for efficient queries.
pub struct IntervalIndex {
    intervals_by_chrom: HashMap<String, ChromIntervals>,
    intervals: Vec<Interval>,
}

impl IntervalIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            intervals_by_chrom: HashMap::new(),
            intervals: Vec::new(),
        }
    }

    /// Build an index from a collection of intervals.
    ///
    /// Index positions match the order of the input vector, so callers can
    /// use them as stable identities (e.g. the reference-loop index in the
    /// paired anchor overlap).
    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        let mut by_chrom: HashMap<String, Vec<(Interval, usize)>> = HashMap::new();

        for (idx, interval) in intervals.iter().enumerate() {
            by_chrom
                .entry(interval.chrom.clone())
                .or_default()
                .push((interval.clone(), idx));
        }

        let intervals_by_chrom = by_chrom
            .into_iter()
            .map(|(chrom, mut entries)| {
                // Sort each chromosome's intervals by start position
                entries.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(a.0.end.cmp(&b.0.end)));

                let mut max_end = Vec::with_capacity(entries.len());
                let mut running = 0;
                for (interval, _) in &entries {
                    running = running.max(interval.end);
                    max_end.push(running);
                }

                (chrom, ChromIntervals { entries, max_end })
            })
            .collect();

        Self {
            intervals_by_chrom,
            intervals,
        }
    }

    /// First entry whose prefix-maximum end exceeds `query.start`; all
    /// earlier entries end at or before it and cannot overlap.
    fn scan_start(chrom_intervals: &ChromIntervals, query: &Interval) -> usize {
        chrom_intervals.max_end.partition_point(|&end| end <= query.start)
    }

    /// Find all intervals overlapping a query, returning their indices.
    pub fn find_overlap_indices(&self, query: &Interval) -> Vec<usize> {
        let mut results = Vec::new();

        if let Some(chrom_intervals) = self.intervals_by_chrom.get(&query.chrom) {
            let start_idx = Self::scan_start(chrom_intervals, query);
            for (interval, idx) in chrom_intervals.entries.iter().skip(start_idx) {
                if interval.start >= query.end {
                    break;
                }
                if query.overlaps(interval) {
                    results.push(*idx);
                }
            }
        }

        results
    }

    /// Find all intervals overlapping a query interval.
    pub fn find_overlaps(&self, query: &Interval) -> Vec<&Interval> {
        self.find_overlap_indices(query)
            .into_iter()
            .map(|idx| &self.intervals[idx])
            .collect()
    }

    /// Count overlapping intervals.
    pub fn count_overlaps(&self, query: &Interval) -> usize {
        self.find_overlap_indices(query).len()
    }

    /// Overlap count together with the clipped intersection segments,
    /// computed in one pass so the two can never disagree.
    pub fn overlap_segments(&self, query: &Interval) -> (usize, Vec<Interval>) {
        let indices = self.find_overlap_indices(query);
        let segments = indices
            .iter()
            .filter_map(|&idx| query.intersect(&self.intervals[idx]))
            .collect();
        (indices.len(), segments)
    }

    /// Check if any interval overlaps the query.
    pub fn has_overlap(&self, query: &Interval) -> bool {
        if let Some(chrom_intervals) = self.intervals_by_chrom.get(&query.chrom) {
            let start_idx = Self::scan_start(chrom_intervals, query);
            for (interval, _) in chrom_intervals.entries.iter().skip(start_idx) {
                if interval.start >= query.end {
                    break;
                }
                if query.overlaps(interval) {
                    return true;
                }
            }
        }
        false
    }

    /// Get all chromosomes in the index.
    pub fn chromosomes(&self) -> impl Iterator<Item = &String> {
        self.intervals_by_chrom.keys()
    }

    /// Get all intervals.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Get an interval by index.
    pub fn get(&self, index: usize) -> Option<&Interval> {
        self.intervals.get(index)
    }

    /// Get the total number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl Default for IntervalIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_intervals() -> Vec<Interval> {
        vec![
            Interval::new("chr1", 100, 200),
            Interval::new("chr1", 150, 250),
            Interval::new("chr1", 300, 400),
            Interval::new("chr2", 100, 200),
        ]
    }

    #[test]
    fn test_build_index() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_find_overlaps() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr1", 175, 225);
        let overlaps = index.find_overlaps(&query);

        assert_eq!(overlaps.len(), 2);
    }

    #[test]
    fn test_count_overlaps() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr1", 175, 225);
        assert_eq!(index.count_overlaps(&query), 2);
    }

    #[test]
    fn test_overlap_segments_consistent_with_count() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr1", 175, 225);
        let (count, segments) = index.overlap_segments(&query);

        assert_eq!(count, 2);
        assert_eq!(segments.len(), count);
        assert_eq!(segments[0], Interval::new("chr1", 175, 200));
        assert_eq!(segments[1], Interval::new("chr1", 175, 225));
    }

    #[test]
    fn test_no_overlap() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr1", 500, 600);
        assert_eq!(index.count_overlaps(&query), 0);
        assert!(!index.has_overlap(&query));

        let (count, segments) = index.overlap_segments(&query);
        assert_eq!(count, 0);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_different_chrom() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr3", 100, 200);
        assert_eq!(index.count_overlaps(&query), 0);
    }

    #[test]
    fn test_long_interval_preceding_short_ones_is_found() {
        // The long interval sorts first by start; its end must not be
        // hidden behind the shorter intervals that follow it.
        let intervals = vec![
            Interval::new("chr1", 100, 10_000),
            Interval::new("chr1", 200, 300),
            Interval::new("chr1", 400, 500),
        ];
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr1", 5000, 6000);
        assert_eq!(index.find_overlap_indices(&query), vec![0]);
        assert_eq!(index.count_overlaps(&query), 1);
        assert!(index.has_overlap(&query));

        let (count, segments) = index.overlap_segments(&query);
        assert_eq!(count, 1);
        assert_eq!(segments, vec![Interval::new("chr1", 5000, 6000)]);
    }

    #[test]
    fn test_indices_are_input_order() {
        let intervals = sample_intervals();
        let index = IntervalIndex::from_intervals(intervals);

        let query = Interval::new("chr2", 150, 160);
        assert_eq!(index.find_overlap_indices(&query), vec![3]);
    }
}
