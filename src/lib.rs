//! Promoter-capture Hi-C analysis toolkit.
//!
//! Two subsystems share the interval machinery:
//!
//! - [`chicago`]: loads CHiCAGO interaction calls, filters them, derives
//!   bait/PIR interval sets, aggregates regulatory feature overlaps, joins
//!   a gene expression matrix, and reports feature-density/expression
//!   correlations.
//! - [`reli`]: measures whether a query loop set overlaps a reference
//!   loop set on both anchors more often than TSS-anchored randomized
//!   copies would.

pub mod bed;
pub mod chicago;
pub mod genome;
pub mod index;
pub mod interval;
pub mod liftover;
pub mod reli;
pub mod stats;

pub use bed::{BedError, BedReader, BedRecord};
pub use genome::Genome;
pub use index::IntervalIndex;
pub use interval::{Anchor, AnchorKind, Interval, Strand};

/// Crate version, from the build manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used types for library consumers.
pub mod prelude {
    pub use crate::chicago::{ChicagoConfig, ChicagoPipeline, FilterConfig};
    pub use crate::genome::Genome;
    pub use crate::interval::{Anchor, AnchorKind, Interval, Strand};
    pub use crate::reli::{permutation_test, Loop, PermutationConfig};
}
