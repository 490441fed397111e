//! Coordinate re-projection between genome assemblies.
//!
//! The heavy lifting is delegated to the external `liftOver` utility; this
//! module owns the call contract: write source intervals to a temp file,
//! invoke the tool with a chain file, read back the mapped intervals, and
//! count the unmapped ones. Per-interval mapping failures are dropped,
//! never fatal; a failed tool invocation is.

use crate::bed;
use crate::interval::Interval;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiftoverError {
    #[error("chain file not found: {0}")]
    MissingChainFile(PathBuf),

    #[error("failed to invoke '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("I/O error during liftover: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse liftover output: {0}")]
    Output(#[from] bed::BedError),
}

/// Result of re-projecting a set of intervals.
#[derive(Debug, Clone)]
pub struct LiftoverOutcome {
    /// Intervals in the target assembly, in tool output order.
    pub mapped: Vec<Interval>,
    /// Number of source intervals that failed to map and were dropped.
    pub unmapped: usize,
}

/// Re-projects intervals into a target assembly.
///
/// A trait seam so the pipeline can be exercised in tests without the
/// external binary installed.
pub trait Liftover {
    fn lift(&self, intervals: &[Interval]) -> Result<LiftoverOutcome, LiftoverError>;
}

/// The external UCSC `liftOver` binary driven through a chain file.
#[derive(Debug)]
pub struct LiftOverTool {
    binary: PathBuf,
    chain_file: PathBuf,
}

impl LiftOverTool {
    /// Configure the tool. Fails fast when the chain file does not exist;
    /// a missing binary surfaces on the first invocation.
    pub fn new(binary: impl Into<PathBuf>, chain_file: impl Into<PathBuf>) -> Result<Self, LiftoverError> {
        let chain_file = chain_file.into();
        if !chain_file.exists() {
            return Err(LiftoverError::MissingChainFile(chain_file));
        }
        Ok(Self {
            binary: binary.into(),
            chain_file,
        })
    }

    /// Default binary name, resolved through PATH.
    pub fn with_chain(chain_file: impl Into<PathBuf>) -> Result<Self, LiftoverError> {
        Self::new("liftOver", chain_file)
    }
}

impl Liftover for LiftOverTool {
    fn lift(&self, intervals: &[Interval]) -> Result<LiftoverOutcome, LiftoverError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.bed");
        let mapped = workdir.path().join("mapped.bed");
        let unmapped = workdir.path().join("unmapped.bed");

        bed::write_intervals_to_path(&input, intervals)?;

        let command = format!(
            "{} {} {} {} {}",
            self.binary.display(),
            input.display(),
            self.chain_file.display(),
            mapped.display(),
            unmapped.display()
        );

        let output = Command::new(&self.binary)
            .arg(&input)
            .arg(&self.chain_file)
            .arg(&mapped)
            .arg(&unmapped)
            .output()
            .map_err(|source| LiftoverError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LiftoverError::NonZeroExit {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let mapped_intervals = bed::read_intervals(&mapped)?;
        let unmapped_count = count_unmapped(&unmapped)?;

        Ok(LiftoverOutcome {
            mapped: mapped_intervals,
            unmapped: unmapped_count,
        })
    }
}

/// Count data lines in the tool's unmapped output. liftOver writes one
/// comment line per dropped interval above the record itself.
fn count_unmapped(path: &Path) -> Result<usize, LiftoverError> {
    if !path.exists() {
        return Ok(0);
    }
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_chain_file_fails_fast() {
        let err = LiftOverTool::with_chain("/no/such/chain.over.gz").unwrap_err();
        assert!(matches!(err, LiftoverError::MissingChainFile(_)));
    }

    #[test]
    fn missing_binary_is_execution_error() {
        let chain = tempfile::NamedTempFile::new().unwrap();
        let tool = LiftOverTool::new("/no/such/liftOver", chain.path()).unwrap();
        let err = tool.lift(&[Interval::new("chr1", 100, 200)]).unwrap_err();
        assert!(matches!(err, LiftoverError::Spawn { .. }));
    }
}
