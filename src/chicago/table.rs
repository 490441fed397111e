//! Loader and in-memory representation of a CHiCAGO interaction table.
//!
//! The input is tab-delimited with a fixed header prefix
//! (`baitChr..dist`); every column after `dist` is treated as a score
//! column and kept by name. Chromosome names are normalized with a `chr`
//! prefix at load time (idempotently), and the derived interval and
//! interaction IDs are computed once and stored on each record.

use crate::interval::Interval;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ChicagoError, Result};

/// Header columns every CHiCAGO table must carry, in order of appearance.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "baitChr", "baitStart", "baitEnd", "baitID", "baitName", "oeChr", "oeStart", "oeEnd", "oeID",
    "oeName", "dist",
];

/// Bait name sentinel marking a capture probe with no annotated promoter.
pub const OFF_TARGET: &str = "off_target";

/// OE name sentinel marking a non-promoter other end.
pub const NON_PROMOTER: &str = ".";

/// One bait-PIR interaction call.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub bait: Interval,
    pub bait_frag_id: String,
    pub bait_name: String,
    pub oe: Interval,
    pub oe_frag_id: String,
    pub oe_name: String,
    /// Genomic distance between anchors; None when the caller reported a
    /// missing-value sentinel.
    pub dist: Option<f64>,
    /// Score values, parallel to the table's score column names.
    pub scores: Vec<f64>,
    pub bait_interval_id: String,
    pub oe_interval_id: String,
    pub interaction_id: String,
}

impl Interaction {
    fn derive_ids(&mut self) {
        self.bait_interval_id = self.bait.id();
        self.oe_interval_id = self.oe.id();
        self.interaction_id = format!("{}_{}", self.bait_interval_id, self.oe_interval_id);
    }
}

/// Unique-ID sets captured when the table is formatted, before any
/// filtering. The promoter-to-promoter filter consults the bait interval
/// IDs of the *unfiltered* table.
#[derive(Debug, Clone, Default)]
pub struct UniqueIds {
    pub bait_frag_ids: FxHashSet<String>,
    pub oe_frag_ids: FxHashSet<String>,
    pub bait_interval_ids: FxHashSet<String>,
    pub oe_interval_ids: FxHashSet<String>,
}

/// A parsed, formatted interaction table plus any feature-count columns
/// added by the aggregator.
#[derive(Debug, Clone)]
pub struct InteractionTable {
    score_columns: Vec<String>,
    records: Vec<Interaction>,
    /// Per-tag feature counts, each vector parallel to `records`.
    feature_counts: Vec<(String, Vec<u64>)>,
    unique_ids: UniqueIds,
}

impl InteractionTable {
    /// Load and format an interaction table. Fails fast on a missing file,
    /// a missing required column, or an unparseable cell.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChicagoError::MissingFile(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader, path)
    }

    fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(ChicagoError::MissingFile(path.to_path_buf())),
        };
        let columns: Vec<String> = header.trim_end().split('\t').map(str::to_string).collect();

        let mut required_idx = [0usize; REQUIRED_COLUMNS.len()];
        for (i, name) in REQUIRED_COLUMNS.iter().enumerate() {
            required_idx[i] = columns.iter().position(|c| c == name).ok_or_else(|| {
                ChicagoError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_path_buf(),
                }
            })?;
        }
        let score_columns: Vec<String> = columns
            .iter()
            .filter(|c| !REQUIRED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        let score_idx: Vec<usize> = score_columns
            .iter()
            .map(|c| columns.iter().position(|h| h == c).unwrap_or(0))
            .collect();

        let mut records = Vec::new();
        for (line_no, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.trim_end().split('\t').collect();
            // Header is line 1.
            let line_no = line_no + 2;

            let get = |i: usize, column: &str| -> Result<&str> {
                fields.get(i).copied().ok_or_else(|| ChicagoError::Parse {
                    line: line_no,
                    column: column.to_string(),
                    message: "row has fewer fields than the header".to_string(),
                })
            };

            let bait_chrom = format_chrom(get(required_idx[0], "baitChr")?);
            let bait_start = parse_u64(get(required_idx[1], "baitStart")?, line_no, "baitStart")?;
            let bait_end = parse_u64(get(required_idx[2], "baitEnd")?, line_no, "baitEnd")?;
            let bait_frag_id = get(required_idx[3], "baitID")?.to_string();
            let bait_name = get(required_idx[4], "baitName")?.to_string();
            let oe_chrom = format_chrom(get(required_idx[5], "oeChr")?);
            let oe_start = parse_u64(get(required_idx[6], "oeStart")?, line_no, "oeStart")?;
            let oe_end = parse_u64(get(required_idx[7], "oeEnd")?, line_no, "oeEnd")?;
            let oe_frag_id = get(required_idx[8], "oeID")?.to_string();
            let oe_name = get(required_idx[9], "oeName")?.to_string();
            let dist = parse_optional_f64(get(required_idx[10], "dist")?, line_no, "dist")?;

            let mut scores = Vec::with_capacity(score_idx.len());
            for (i, col) in score_idx.iter().zip(score_columns.iter()) {
                let raw = get(*i, col)?;
                scores.push(parse_optional_f64(raw, line_no, col)?.unwrap_or(f64::NAN));
            }

            let mut record = Interaction {
                bait: Interval::new(bait_chrom, bait_start, bait_end),
                bait_frag_id,
                bait_name,
                oe: Interval::new(oe_chrom, oe_start, oe_end),
                oe_frag_id,
                oe_name,
                dist,
                scores,
                bait_interval_id: String::new(),
                oe_interval_id: String::new(),
                interaction_id: String::new(),
            };
            record.derive_ids();
            records.push(record);
        }

        let mut unique_ids = UniqueIds::default();
        for r in &records {
            unique_ids.bait_frag_ids.insert(r.bait_frag_id.clone());
            unique_ids.oe_frag_ids.insert(r.oe_frag_id.clone());
            unique_ids
                .bait_interval_ids
                .insert(r.bait_interval_id.clone());
            unique_ids.oe_interval_ids.insert(r.oe_interval_id.clone());
        }

        Ok(Self {
            score_columns,
            records,
            feature_counts: Vec::new(),
            unique_ids,
        })
    }

    pub fn records(&self) -> &[Interaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn score_columns(&self) -> &[String] {
        &self.score_columns
    }

    pub fn score_column_index(&self, name: &str) -> Option<usize> {
        self.score_columns.iter().position(|c| c == name)
    }

    pub fn unique_ids(&self) -> &UniqueIds {
        &self.unique_ids
    }

    /// Feature tags in the order their columns were added.
    pub fn feature_tags(&self) -> Vec<&str> {
        self.feature_counts.iter().map(|(t, _)| t.as_str()).collect()
    }

    /// Per-record counts for a feature tag.
    pub fn feature_column(&self, tag: &str) -> Option<&[u64]> {
        self.feature_counts
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, counts)| counts.as_slice())
    }

    /// Add or replace a feature-count column. Replacing makes repeat
    /// aggregation of the same tag idempotent.
    pub fn set_feature_column(&mut self, tag: &str, counts: Vec<u64>) {
        debug_assert_eq!(counts.len(), self.records.len());
        if let Some(entry) = self.feature_counts.iter_mut().find(|(t, _)| t == tag) {
            entry.1 = counts;
        } else {
            self.feature_counts.push((tag.to_string(), counts));
        }
    }

    /// Retain only the records selected by `keep`, carrying the unique-ID
    /// sets of the unfiltered table forward unchanged.
    pub fn retain_mask(&self, keep: &[bool]) -> Self {
        debug_assert_eq!(keep.len(), self.records.len());
        let records: Vec<Interaction> = self
            .records
            .iter()
            .zip(keep.iter())
            .filter(|(_, &k)| k)
            .map(|(r, _)| r.clone())
            .collect();
        let feature_counts = self
            .feature_counts
            .iter()
            .map(|(tag, counts)| {
                let kept: Vec<u64> = counts
                    .iter()
                    .zip(keep.iter())
                    .filter(|(_, &k)| k)
                    .map(|(c, _)| *c)
                    .collect();
                (tag.clone(), kept)
            })
            .collect();
        Self {
            score_columns: self.score_columns.clone(),
            records,
            feature_counts,
            unique_ids: self.unique_ids.clone(),
        }
    }

    /// Write the table (base columns, score columns, derived IDs, feature
    /// counts) as a TSV with header.
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        for col in &self.score_columns {
            header.push(col);
        }
        header.extend(["bait_interval_ID", "oe_interval_ID", "interaction_ID"]);
        for (tag, _) in &self.feature_counts {
            header.push(tag);
        }
        writeln!(w, "{}", header.join("\t"))?;

        let mut ibuf = itoa::Buffer::new();
        let mut fbuf = ryu::Buffer::new();
        for (row, r) in self.records.iter().enumerate() {
            w.write_all(r.bait.chrom.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(ibuf.format(r.bait.start).as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(ibuf.format(r.bait.end).as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.bait_frag_id.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.bait_name.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.oe.chrom.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(ibuf.format(r.oe.start).as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(ibuf.format(r.oe.end).as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.oe_frag_id.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.oe_name.as_bytes())?;
            w.write_all(b"\t")?;
            match r.dist {
                Some(d) => w.write_all(fbuf.format(d).as_bytes())?,
                None => w.write_all(b"NA")?,
            }
            for s in &r.scores {
                w.write_all(b"\t")?;
                if s.is_nan() {
                    w.write_all(b"NA")?;
                } else {
                    w.write_all(fbuf.format(*s).as_bytes())?;
                }
            }
            w.write_all(b"\t")?;
            w.write_all(r.bait_interval_id.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.oe_interval_id.as_bytes())?;
            w.write_all(b"\t")?;
            w.write_all(r.interaction_id.as_bytes())?;
            for (_, counts) in &self.feature_counts {
                w.write_all(b"\t")?;
                w.write_all(ibuf.format(counts[row]).as_bytes())?;
            }
            w.write_all(b"\n")?;
        }
        w.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_str_for_tests(content: &str) -> Result<Self> {
        Self::from_reader(content.as_bytes(), Path::new("<test>"))
    }
}

/// Idempotently prefix a chromosome name with `chr`.
pub fn format_chrom(raw: &str) -> String {
    if raw.starts_with("chr") {
        raw.to_string()
    } else {
        format!("chr{}", raw)
    }
}

fn parse_u64(raw: &str, line: usize, column: &str) -> Result<u64> {
    raw.parse().map_err(|_| ChicagoError::Parse {
        line,
        column: column.to_string(),
        message: format!("invalid integer '{}'", raw),
    })
}

fn parse_optional_f64(raw: &str, line: usize, column: &str) -> Result<Option<f64>> {
    match raw {
        "" | "NA" | "NaN" | "nan" | "." => Ok(None),
        _ => raw
            .parse()
            .map(Some)
            .map_err(|_| ChicagoError::Parse {
                line,
                column: column.to_string(),
                message: format!("invalid number '{}'", raw),
            }),
    }
}

/// Resolve a score column reference against the table, for fail-fast
/// configuration validation.
pub fn resolve_score_column(table: &InteractionTable, name: &str) -> Result<usize> {
    table
        .score_column_index(name)
        .ok_or_else(|| ChicagoError::UnknownScoreColumn(name.to_string()))
}
