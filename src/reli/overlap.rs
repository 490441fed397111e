//! Paired anchor overlap counting.
//!
//! A query loop hits a reference loop only when its left anchor overlaps
//! the reference's left anchor *and* its right anchor overlaps the same
//! reference loop's right anchor. The reference loop's input position is
//! the shared identity between the two indexes.

use super::loops::Loop;
use crate::index::IntervalIndex;
use rustc_hash::FxHashSet;

/// Left and right anchor indexes over one reference loop set.
pub struct PairedOverlap {
    left: IntervalIndex,
    right: IntervalIndex,
}

impl PairedOverlap {
    pub fn from_reference(reference: &[Loop]) -> Self {
        let left = reference.iter().map(Loop::left_anchor).collect();
        let right = reference.iter().map(Loop::right_anchor).collect();
        Self {
            left: IntervalIndex::from_intervals(left),
            right: IntervalIndex::from_intervals(right),
        }
    }

    /// Number of (query, reference) pairs overlapping on both anchors.
    pub fn count(&self, queries: &[Loop]) -> u64 {
        let mut total = 0u64;
        for query in queries {
            let left_hits: FxHashSet<usize> = self
                .left
                .find_overlap_indices(&query.left_anchor())
                .into_iter()
                .collect();
            if left_hits.is_empty() {
                continue;
            }
            total += self
                .right
                .find_overlap_indices(&query.right_anchor())
                .iter()
                .filter(|idx| left_hits.contains(idx))
                .count() as u64;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_loop(chrom: &str, ls: u64, le: u64, rs: u64, re: u64) -> Loop {
        Loop {
            chrom: chrom.to_string(),
            left_start: ls,
            left_end: le,
            right_start: rs,
            right_end: re,
        }
    }

    #[test]
    fn test_both_anchors_must_hit_same_reference() {
        let reference = vec![
            make_loop("chr1", 1000, 2000, 8000, 9000),
            make_loop("chr1", 50_000, 51_000, 90_000, 91_000),
        ];
        let overlap = PairedOverlap::from_reference(&reference);

        // Hits both anchors of reference 0
        assert_eq!(overlap.count(&[make_loop("chr1", 1500, 1600, 8100, 8200)]), 1);
        // Left anchor hits reference 0, right anchor hits reference 1
        assert_eq!(
            overlap.count(&[make_loop("chr1", 1500, 1600, 90_100, 90_200)]),
            0
        );
        // Left-only hit
        assert_eq!(overlap.count(&[make_loop("chr1", 1500, 1600, 30_000, 30_100)]), 0);
    }

    #[test]
    fn test_count_sums_pairs_across_queries() {
        let reference = vec![
            make_loop("chr1", 1000, 2000, 8000, 9000),
            make_loop("chr1", 1500, 2500, 8500, 9500),
        ];
        let overlap = PairedOverlap::from_reference(&reference);

        // One query spanning both reference loops counts twice.
        let queries = vec![
            make_loop("chr1", 1600, 1700, 8600, 8700),
            make_loop("chr2", 1600, 1700, 8600, 8700),
        ];
        assert_eq!(overlap.count(&queries), 2);
    }

    #[test]
    fn test_empty_reference_counts_zero() {
        let overlap = PairedOverlap::from_reference(&[]);
        assert_eq!(overlap.count(&[make_loop("chr1", 0, 10, 20, 30)]), 0);
    }
}
