//! Feature aggregation: per-PIR overlap counts against external feature
//! interval sets, mapped back onto interactions by OE interval ID.
//!
//! Counts and intersected segments come out of a single index pass per
//! PIR, so the two artifacts can never disagree.

use super::table::InteractionTable;
use crate::index::IntervalIndex;
use crate::interval::{Anchor, Interval};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Minimum number of PIRs before fanning the overlap pass out over
/// threads.
const PARALLEL_THRESHOLD: usize = 10_000;

/// A feature file paired with the tag naming its count column.
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    pub path: PathBuf,
    pub tag: String,
}

impl FeatureSpec {
    /// Parse a `path=tag` CLI argument.
    pub fn from_arg(arg: &str) -> Option<Self> {
        let (path, tag) = arg.split_once('=')?;
        if path.is_empty() || tag.is_empty() {
            return None;
        }
        Some(Self {
            path: PathBuf::from(path),
            tag: tag.to_string(),
        })
    }
}

/// Result of one feature's overlap pass across the PIR set.
#[derive(Debug, Clone)]
pub struct FeatureOverlaps {
    /// PIR interval ID to overlap count. Every PIR appears, zero included.
    pub counts: FxHashMap<String, u64>,
    /// Clipped intersection segments, sorted by genomic position.
    pub segments: Vec<Interval>,
}

/// Count overlaps and collect intersection segments for every PIR against
/// one feature interval set.
pub fn count_feature_overlaps(pirs: &[Anchor], features: Vec<Interval>) -> FeatureOverlaps {
    let index = IntervalIndex::from_intervals(features);

    let per_pir: Vec<(usize, Vec<Interval>)> = if pirs.len() >= PARALLEL_THRESHOLD {
        pirs.par_iter()
            .map(|anchor| index.overlap_segments(&anchor.interval))
            .collect()
    } else {
        pirs.iter()
            .map(|anchor| index.overlap_segments(&anchor.interval))
            .collect()
    };

    let mut counts = FxHashMap::default();
    let mut segments = Vec::new();
    for (anchor, (count, segs)) in pirs.iter().zip(per_pir) {
        counts.insert(anchor.id.clone(), count as u64);
        segments.extend(segs);
    }
    segments.sort();

    FeatureOverlaps { counts, segments }
}

/// Map per-PIR counts onto every interaction sharing the PIR's interval
/// ID, adding (or replacing) the tag's column. PIRs absent from the map
/// contribute a count of 0, never a missing value.
pub fn apply_feature_counts(table: &mut InteractionTable, tag: &str, overlaps: &FeatureOverlaps) {
    let column: Vec<u64> = table
        .records()
        .iter()
        .map(|r| overlaps.counts.get(&r.oe_interval_id).copied().unwrap_or(0))
        .collect();
    table.set_feature_column(tag, column);
}
