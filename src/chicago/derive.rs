//! Derivation of deduplicated anchor interval sets from a filtered
//! interaction table.

use super::table::InteractionTable;
use crate::interval::{Anchor, AnchorKind, Interval};
use rustc_hash::FxHashSet;

/// Deduplicated PIR (other-end) intervals, first occurrence wins.
pub fn pir_set(table: &InteractionTable) -> Vec<Anchor> {
    dedup_anchors(
        table.records().iter().map(|r| &r.oe),
        AnchorKind::OtherEnd,
    )
}

/// Deduplicated bait intervals, first occurrence wins.
pub fn bait_set(table: &InteractionTable) -> Vec<Anchor> {
    dedup_anchors(table.records().iter().map(|r| &r.bait), AnchorKind::Bait)
}

/// Union of the PIR and bait sets with uniform fields. PIRs come first,
/// matching the layout downstream consumers expect; provenance stays on
/// the structural tag.
pub fn combined_set(table: &InteractionTable) -> Vec<Anchor> {
    let mut combined = pir_set(table);
    combined.extend(bait_set(table));
    combined
}

fn dedup_anchors<'a, I>(intervals: I, kind: AnchorKind) -> Vec<Anchor>
where
    I: Iterator<Item = &'a Interval>,
{
    let mut seen: FxHashSet<(String, u64, u64)> = FxHashSet::default();
    let mut anchors = Vec::new();
    for interval in intervals {
        let key = (interval.chrom.clone(), interval.start, interval.end);
        if seen.insert(key) {
            anchors.push(Anchor::new(interval.clone(), kind));
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chicago::table::InteractionTable;
    use rustc_hash::FxHashSet;

    const HEADER: &str =
        "baitChr\tbaitStart\tbaitEnd\tbaitID\tbaitName\toeChr\toeStart\toeEnd\toeID\toeName\tdist\tscore";

    fn sample_table() -> InteractionTable {
        let content = format!(
            "{HEADER}\n\
             1\t100\t200\tb1\tGeneA\t1\t1000\t2000\to1\t.\t900\t7.5\n\
             1\t100\t200\tb1\tGeneA\t1\t5000\t6000\to2\t.\t4900\t6.0\n\
             1\t300\t400\tb2\tGeneB\t1\t1000\t2000\to1\t.\t700\t8.0\n"
        );
        InteractionTable::from_str_for_tests(&content).unwrap()
    }

    #[test]
    fn test_pir_set_dedup() {
        let table = sample_table();
        let pirs = pir_set(&table);

        // Shared OE interval collapses; PIR set never exceeds interactions
        assert_eq!(pirs.len(), 2);
        assert!(pirs.len() <= table.len());
        assert_eq!(pirs[0].id, "chr1:1000-2000");
        assert_eq!(pirs[1].id, "chr1:5000-6000");
        assert!(pirs.iter().all(|a| a.kind == AnchorKind::OtherEnd));

        // Every PIR ID unique
        let ids: FxHashSet<&str> = pirs.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), pirs.len());
    }

    #[test]
    fn test_bait_set_dedup() {
        let table = sample_table();
        let baits = bait_set(&table);

        assert_eq!(baits.len(), 2);
        assert!(baits.iter().all(|a| a.kind == AnchorKind::Bait));
    }

    #[test]
    fn test_combined_set_order_and_provenance() {
        let table = sample_table();
        let combined = combined_set(&table);

        assert_eq!(combined.len(), 4);
        // PIRs first, then baits
        assert_eq!(combined[0].kind, AnchorKind::OtherEnd);
        assert_eq!(combined[3].kind, AnchorKind::Bait);
    }
}
