//! Loop-anchor permutation significance testing.
//!
//! Given a set of query loops and a reference loop set, measures how many
//! query loops overlap the reference on *both* anchors, then compares that
//! count against a null distribution built from TSS-anchored randomized
//! copies of the query loops.

pub mod loops;
pub mod overlap;
pub mod randomize;
pub mod tss;

pub use loops::{loops_from_anchor_beds, read_loops, write_anchor_beds, Loop};
pub use overlap::PairedOverlap;
pub use randomize::{randomize_loop, RandomizeConfig};
pub use test::{permutation_test, PermutationConfig, PermutationSummary};
pub use tss::{Tss, TssRegistry};

use crate::bed::BedError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the permutation-test pipeline.
#[derive(Error, Debug)]
pub enum ReliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("BED input: {0}")]
    Bed(#[from] BedError),

    #[error("parse error in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("chromosome '{chrom}' not present in the genome table")]
    MissingChromosome { chrom: String },

    #[error("no TSS entries for chromosome '{chrom}'")]
    NoTss { chrom: String },

    #[error("could not place a randomized loop on '{chrom}' within {attempts} attempts")]
    RandomizationExhausted { chrom: String, attempts: usize },

    #[error("null distribution has zero variance after {iterations} iterations")]
    ZeroVariance { iterations: usize },

    #[error("anchor files disagree: {left} left anchors vs {right} right anchors")]
    AnchorCountMismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, ReliError>;
