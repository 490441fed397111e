//! TSS-anchored loop randomization.
//!
//! A randomized copy of a loop keeps the original chromosome, anchor
//! widths, and inner distance, but is re-anchored at a uniformly chosen
//! TSS on that chromosome. The TSS strand decides which anchor it pins:
//! on the plus strand the TSS becomes the left anchor's end, otherwise
//! the right anchor's start. Placements falling outside the chromosome
//! are retried with a fresh TSS, up to a bounded number of attempts.

use super::loops::Loop;
use super::tss::TssRegistry;
use super::{ReliError, Result};
use crate::genome::Genome;
use crate::interval::Strand;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct RandomizeConfig {
    /// TSS draws per loop before giving up.
    pub max_attempts: usize,
}

impl Default for RandomizeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10_000,
        }
    }
}

/// Produce one randomized copy of `original`, preserving its geometry.
pub fn randomize_loop<R: Rng>(
    original: &Loop,
    tss: &TssRegistry,
    genome: &Genome,
    rng: &mut R,
    config: &RandomizeConfig,
) -> Result<Loop> {
    let chrom_len = genome
        .chrom_size(&original.chrom)
        .ok_or_else(|| ReliError::MissingChromosome {
            chrom: original.chrom.clone(),
        })? as i64;
    if !tss.has_chrom(&original.chrom) {
        return Err(ReliError::NoTss {
            chrom: original.chrom.clone(),
        });
    }

    let left_width = original.left_width() as i64;
    let right_width = original.right_width() as i64;
    let distance = original.distance();

    for _ in 0..config.max_attempts {
        let site = match tss.pick(&original.chrom, rng) {
            Some(site) => site,
            None => break,
        };
        let pos = site.position as i64;

        let (left_start, left_end, right_start, right_end) = match site.strand {
            Strand::Plus => {
                let left_end = pos;
                let right_start = pos + distance;
                (
                    left_end - left_width,
                    left_end,
                    right_start,
                    right_start + right_width,
                )
            }
            _ => {
                let right_start = pos;
                let left_end = pos - distance;
                (
                    left_end - left_width,
                    left_end,
                    right_start,
                    right_start + right_width,
                )
            }
        };

        let coords = [left_start, left_end, right_start, right_end];
        if coords.iter().all(|&c| c >= 0 && c <= chrom_len) {
            return Ok(Loop {
                chrom: original.chrom.clone(),
                left_start: left_start as u64,
                left_end: left_end as u64,
                right_start: right_start as u64,
                right_end: right_end as u64,
            });
        }
    }

    Err(ReliError::RandomizationExhausted {
        chrom: original.chrom.clone(),
        attempts: config.max_attempts,
    })
}

/// Randomize every loop in a set with one shared RNG.
pub fn randomize_loops<R: Rng>(
    loops: &[Loop],
    tss: &TssRegistry,
    genome: &Genome,
    rng: &mut R,
    config: &RandomizeConfig,
) -> Result<Vec<Loop>> {
    loops
        .iter()
        .map(|l| randomize_loop(l, tss, genome, rng, config))
        .collect()
}
