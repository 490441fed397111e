//! The configurable filter chain over interaction records.
//!
//! Each predicate is an independently togglable boolean mask applied in a
//! fixed order. The missing/zero-distance check runs before the
//! trans-chromosome check so sentinel distances never leak through.

use super::table::{resolve_score_column, InteractionTable, NON_PROMOTER, OFF_TARGET};
use super::Result;

/// How promoter-to-promoter interactions are recognized. Upstream
/// variants disagree on the definition, so the strategy is configuration
/// rather than a hard-coded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum P2pStrategy {
    /// Keep only rows whose OE name is the non-promoter sentinel `"."`.
    NameSentinel,
    /// Drop rows whose OE interval ID appears among the (unfiltered)
    /// bait interval IDs.
    IntervalMembership,
    /// Apply both rules.
    Both,
}

impl P2pStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name-sentinel" | "name_sentinel" => Some(Self::NameSentinel),
            "interval-membership" | "interval_membership" => Some(Self::IntervalMembership),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Keep rows whose named score column meets a minimum value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreThreshold {
    pub column: String,
    pub min: f64,
}

impl ScoreThreshold {
    /// The conventional CHiCAGO significance cutoff.
    pub const DEFAULT_MIN: f64 = 5.0;
}

/// Ordered conjunction of row predicates.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub drop_off_target_bait: bool,
    pub drop_off_target_oe: bool,
    /// Compatibility switch reproducing upstream variants where the
    /// off-target masks were computed but never applied. When set, the
    /// masks are evaluated and reported to stderr, and the rows kept.
    pub legacy_inert_off_target: bool,
    pub drop_missing_dist: bool,
    pub drop_trans_chrom: bool,
    pub p2p: Option<P2pStrategy>,
    pub score: Option<ScoreThreshold>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            drop_off_target_bait: true,
            drop_off_target_oe: true,
            legacy_inert_off_target: false,
            drop_missing_dist: true,
            drop_trans_chrom: true,
            p2p: Some(P2pStrategy::IntervalMembership),
            score: None,
        }
    }
}

impl FilterConfig {
    /// Apply the predicate chain, returning the filtered table. An empty
    /// result is valid. Applying the same config twice is a no-op on the
    /// second pass.
    pub fn apply(&self, table: &InteractionTable) -> Result<InteractionTable> {
        let score_idx = match &self.score {
            Some(threshold) => Some(resolve_score_column(table, &threshold.column)?),
            None => None,
        };

        let mut keep = vec![true; table.len()];

        if self.drop_off_target_bait {
            let removed = mask(&mut keep, table, self.legacy_inert_off_target, |r| {
                r.bait_name != OFF_TARGET
            });
            report("off-target bait", removed, self.legacy_inert_off_target);
        }

        if self.drop_off_target_oe {
            let removed = mask(&mut keep, table, self.legacy_inert_off_target, |r| {
                r.oe_name != OFF_TARGET
            });
            report("off-target OE", removed, self.legacy_inert_off_target);
        }

        if self.drop_missing_dist {
            let removed = mask(&mut keep, table, false, |r| {
                matches!(r.dist, Some(d) if d != 0.0)
            });
            report("missing/zero dist", removed, false);
        }

        if self.drop_trans_chrom {
            let removed = mask(&mut keep, table, false, |r| r.bait.chrom == r.oe.chrom);
            report("trans-chromosomal", removed, false);
        }

        if let Some(strategy) = self.p2p {
            let bait_ids = &table.unique_ids().bait_interval_ids;
            let removed = mask(&mut keep, table, false, |r| match strategy {
                P2pStrategy::NameSentinel => r.oe_name == NON_PROMOTER,
                P2pStrategy::IntervalMembership => !bait_ids.contains(&r.oe_interval_id),
                P2pStrategy::Both => {
                    r.oe_name == NON_PROMOTER && !bait_ids.contains(&r.oe_interval_id)
                }
            });
            report("promoter-to-promoter", removed, false);
        }

        if let (Some(threshold), Some(idx)) = (&self.score, score_idx) {
            let removed = mask(&mut keep, table, false, |r| r.scores[idx] >= threshold.min);
            report("score threshold", removed, false);
        }

        Ok(table.retain_mask(&keep))
    }
}

/// Intersect `keep` with a predicate, returning how many still-kept rows
/// the predicate rejected. In inert mode the mask is only counted.
fn mask<F>(keep: &mut [bool], table: &InteractionTable, inert: bool, predicate: F) -> usize
where
    F: Fn(&super::table::Interaction) -> bool,
{
    let mut removed = 0;
    for (k, record) in keep.iter_mut().zip(table.records()) {
        if *k && !predicate(record) {
            removed += 1;
            if !inert {
                *k = false;
            }
        }
    }
    removed
}

fn report(name: &str, removed: usize, inert: bool) {
    if inert {
        eprintln!("filter '{}' matched {} rows (legacy inert mode, rows kept)", name, removed);
    } else if removed > 0 {
        eprintln!("filter '{}' removed {} rows", name, removed);
    }
}
