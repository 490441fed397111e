//! CHiCAGO interaction pipeline: load and filter interaction calls,
//! derive bait/PIR interval sets, aggregate feature overlaps, join onto a
//! gene expression matrix, and compute feature-density/expression
//! correlation statistics.

pub mod correlation;
pub mod derive;
pub mod expression;
pub mod features;
pub mod filter;
pub mod pipeline;
pub mod table;

pub use correlation::{bin_by_feature_count, correlate, BinnedRow, CorrelationRow};
pub use derive::{bait_set, combined_set, pir_set};
pub use expression::{ExpressionMatrix, GeneRecord, MissingFeaturePolicy};
pub use features::{apply_feature_counts, count_feature_overlaps, FeatureOverlaps, FeatureSpec};
pub use filter::{FilterConfig, P2pStrategy, ScoreThreshold};
pub use pipeline::{ChicagoConfig, ChicagoPipeline, ChicagoSummary};
pub use table::{Interaction, InteractionTable};

use crate::bed::BedError;
use crate::liftover::LiftoverError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the interaction pipeline.
#[derive(Error, Debug)]
pub enum ChicagoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("input file not found: {0}")]
    MissingFile(PathBuf),

    #[error("required column '{column}' missing from {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("parse error at line {line}, column '{column}': {message}")]
    Parse {
        line: usize,
        column: String,
        message: String,
    },

    #[error("score column '{0}' not present in the interaction table")]
    UnknownScoreColumn(String),

    #[error("feature file for tag '{tag}': {source}")]
    FeatureFile { tag: String, source: BedError },

    #[error("liftover failed for tag '{tag}': {source}")]
    Liftover { tag: String, source: LiftoverError },
}

pub type Result<T> = std::result::Result<T, ChicagoError>;
