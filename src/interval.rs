//! Core interval types for genomic region representation.

use std::cmp::Ordering;
use std::fmt;

/// A genomic interval with chromosome, start, and end positions.
/// Uses 0-based, half-open coordinates (BED format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the interval has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this interval overlaps with another.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }

    /// Compute the overlap length with another interval.
    #[inline]
    pub fn overlap_length(&self, other: &Interval) -> u64 {
        if !self.overlaps(other) {
            return 0;
        }
        let overlap_start = self.start.max(other.start);
        let overlap_end = self.end.min(other.end);
        overlap_end - overlap_start
    }

    /// Return the intersected coordinate range with another interval,
    /// or None when the intervals do not overlap.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Interval {
            chrom: self.chrom.clone(),
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Canonical string identity, `"<chrom>:<start>-<end>"`.
    ///
    /// Two intervals with identical coordinates always render the same
    /// byte sequence; this is the sole deduplication and join key across
    /// the interaction pipeline.
    pub fn id(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chrom
            .cmp(&other.chrom)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Which side of a chromatin interaction an anchor interval came from.
///
/// Carried as a structural tag so consumers never have to re-derive
/// provenance from the shape of an ID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    /// Captured promoter-anchored interval.
    Bait,
    /// Other end / promoter-interacting region.
    OtherEnd,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorKind::Bait => write!(f, "bait"),
            AnchorKind::OtherEnd => write!(f, "oe"),
        }
    }
}

/// A deduplicated anchor interval with its string ID and provenance tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub interval: Interval,
    pub id: String,
    pub kind: AnchorKind,
}

impl Anchor {
    pub fn new(interval: Interval, kind: AnchorKind) -> Self {
        let id = interval.id();
        Self { interval, id, kind }
    }
}

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}
