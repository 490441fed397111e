//! Feature-count binning and correlation statistics.
//!
//! Binning is presentational: genes grouped by integer feature count and
//! exploded back to long form for plotting elsewhere. Correlations are
//! computed on the row-level (non-bucketed) data.

use super::expression::ExpressionMatrix;
use super::Result;
use crate::stats::{self, Correlation};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One exploded row of the binned table.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedRow {
    pub feature_count: u64,
    pub gene: String,
    pub expression: f64,
}

/// Correlation statistics for one feature tag.
#[derive(Debug, Clone)]
pub struct CorrelationRow {
    pub tag: String,
    pub spearman: Correlation,
    pub pearson: Correlation,
}

/// Group genes by a tag's integer feature count, collecting the composite
/// `"<gene> <expression>"` keys per bucket, then explode each bucket back
/// into one row per pair. Buckets ascend; rows within a bucket keep the
/// matrix's order. Genes missing the tag's count are skipped.
pub fn bin_by_feature_count(matrix: &ExpressionMatrix, tag: &str) -> Vec<BinnedRow> {
    let tag_idx = match matrix.tags().iter().position(|t| t == tag) {
        Some(idx) => idx,
        None => return Vec::new(),
    };

    let mut buckets: BTreeMap<u64, Vec<String>> = BTreeMap::new();
    for gene in matrix.genes() {
        if let Some(count) = gene.feature_counts[tag_idx] {
            buckets.entry(count).or_default().push(gene.composite_key());
        }
    }

    let mut rows = Vec::new();
    for (count, keys) in buckets {
        for key in keys {
            // Composite key splits back into its two parts on the first
            // space; the expression half always parses because the key
            // was rendered from a float.
            if let Some((gene, expr)) = key.split_once(' ') {
                if let Ok(expression) = expr.parse() {
                    rows.push(BinnedRow {
                        feature_count: count,
                        gene: gene.to_string(),
                        expression,
                    });
                }
            }
        }
    }
    rows
}

/// Spearman and Pearson correlation (with p-values) between a tag's
/// feature counts and expression, across all genes carrying both values.
pub fn correlate(matrix: &ExpressionMatrix, tag: &str) -> CorrelationRow {
    let tag_idx = matrix.tags().iter().position(|t| t == tag);

    let mut counts = Vec::new();
    let mut expressions = Vec::new();
    if let Some(idx) = tag_idx {
        for gene in matrix.genes() {
            if let Some(count) = gene.feature_counts[idx] {
                if !gene.expression.is_nan() {
                    counts.push(count as f64);
                    expressions.push(gene.expression);
                }
            }
        }
    }

    CorrelationRow {
        tag: tag.to_string(),
        spearman: stats::spearman(&counts, &expressions),
        pearson: stats::pearson(&counts, &expressions),
    }
}

/// Write one tag's binned long-form table.
pub fn write_binned<P: AsRef<Path>>(path: P, tag: &str, rows: &[BinnedRow]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "{}_count\tGene_Name\tMean_Gene_Expression", tag)?;
    let mut ibuf = itoa::Buffer::new();
    let mut fbuf = ryu::Buffer::new();
    for row in rows {
        w.write_all(ibuf.format(row.feature_count).as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(row.gene.as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(fbuf.format(row.expression).as_bytes())?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(())
}

/// Write the accumulated per-tag correlation statistics.
pub fn write_correlation_stats<P: AsRef<Path>>(path: P, rows: &[CorrelationRow]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(
        w,
        "Spearman_corr\tSpearman_pval\tPearson_corr\tPearson_pval\tFeature"
    )?;
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            row.spearman.coefficient,
            row.spearman.p_value,
            row.pearson.coefficient,
            row.pearson.p_value,
            row.tag
        )?;
    }
    w.flush()?;
    Ok(())
}
