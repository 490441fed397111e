//! Genome file parser for chromosome sizes.
//!
//! Parses .genome files (tab-delimited: chrom\tsize) and carries the
//! built-in hg19 length table used as the default reference build for
//! loop randomization.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::bed::BedError;

/// hg19 chromosome lengths, in the reference build's conventional order.
const HG19_SIZES: &[(&str, u64)] = &[
    ("chr1", 249_213_345),
    ("chr2", 243_102_476),
    ("chr3", 197_949_384),
    ("chr4", 190_989_019),
    ("chr5", 180_795_226),
    ("chr6", 170_893_780),
    ("chr7", 158_937_649),
    ("chr8", 146_281_416),
    ("chr9", 141_093_903),
    ("chr10", 135_440_299),
    ("chr11", 134_856_693),
    ("chr12", 133_812_422),
    ("chr13", 115_099_423),
    ("chr14", 107_259_214),
    ("chr15", 102_519_301),
    ("chr16", 90_244_014),
    ("chr17", 81_188_573),
    ("chr18", 78_005_397),
    ("chr19", 59_095_762),
    ("chr20", 62_934_707),
    ("chr21", 48_085_036),
    ("chr22", 51_238_065),
    ("chrX", 155_257_848),
    ("chrY", 59_360_854),
    ("chrM", 3_230),
];

/// Genome information containing chromosome sizes.
/// Preserves chromosome order from input.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    /// Map of chromosome name to size
    sizes: HashMap<String, u64>,
    /// Chromosome order (preserves input order)
    order: Vec<String>,
}

impl Genome {
    /// Create an empty genome.
    pub fn new() -> Self {
        Self {
            sizes: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The built-in hg19 length table.
    pub fn hg19() -> Self {
        let mut genome = Self::new();
        for &(chrom, size) in HG19_SIZES {
            genome.insert(chrom.to_string(), size);
        }
        genome
    }

    /// Load genome from a file.
    /// Format: tab-delimited with chrom\tsize per line
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BedError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut genome = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(BedError::Parse {
                    line: line_num + 1,
                    message: "Genome file requires two columns: chrom and size".to_string(),
                });
            }

            let size: u64 = fields[1].parse().map_err(|_| BedError::Parse {
                line: line_num + 1,
                message: format!("Invalid chromosome size: {}", fields[1]),
            })?;

            genome.insert(fields[0].to_string(), size);
        }

        Ok(genome)
    }

    /// Get the size of a chromosome.
    #[inline]
    pub fn chrom_size(&self, chrom: &str) -> Option<u64> {
        self.sizes.get(chrom).copied()
    }

    /// Check if a chromosome exists.
    #[inline]
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.sizes.contains_key(chrom)
    }

    /// Get all chromosome names in order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Get number of chromosomes.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Insert a chromosome size (appends to order if new).
    pub fn insert(&mut self, chrom: String, size: u64) {
        if !self.sizes.contains_key(&chrom) {
            self.order.push(chrom.clone());
        }
        self.sizes.insert(chrom, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_genome_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t1000000").unwrap();
        writeln!(file, "chr2\t500000").unwrap();
        writeln!(file, "# comment line").unwrap();
        writeln!(file, "chr3\t250000").unwrap();

        let genome = Genome::from_file(file.path()).unwrap();

        assert_eq!(genome.chrom_size("chr1"), Some(1000000));
        assert_eq!(genome.chrom_size("chr2"), Some(500000));
        assert_eq!(genome.chrom_size("chr3"), Some(250000));
        assert_eq!(genome.chrom_size("chr4"), None);
        assert_eq!(genome.len(), 3);
    }

    #[test]
    fn test_hg19_table() {
        let genome = Genome::hg19();
        assert_eq!(genome.chrom_size("chr1"), Some(249_213_345));
        assert_eq!(genome.chrom_size("chrM"), Some(3_230));
        assert_eq!(genome.len(), 25);
        assert_eq!(genome.chromosomes().next().map(String::as_str), Some("chr1"));
    }

    #[test]
    fn test_genome_bounds() {
        let mut genome = Genome::new();
        genome.insert("chr1".to_string(), 1000);

        assert!(genome.has_chrom("chr1"));
        assert!(!genome.has_chrom("chr2"));
    }
}
