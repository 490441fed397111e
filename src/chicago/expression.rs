//! Gene expression matrix: loading, joining per-gene interaction
//! aggregates, and expression-based filtering.

use super::table::InteractionTable;
use super::{ChicagoError, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// What a gene with no matching interactions receives for its aggregate
/// columns. Upstream call sites disagreed, so the policy is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFeaturePolicy {
    /// Missing value; removed later by the missing-value row drop.
    Drop,
    /// Explicit zero; the gene survives the missing-value drop.
    ZeroFill,
}

impl MissingFeaturePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "drop" => Some(Self::Drop),
            "zero-fill" | "zero_fill" | "zerofill" => Some(Self::ZeroFill),
            _ => None,
        }
    }
}

/// One gene row of the expression matrix, with joined aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneRecord {
    pub gene: String,
    pub expression: f64,
    /// Number of interactions whose bait name equals this gene.
    pub enhancer_count: Option<u64>,
    /// Per-tag feature-count sums, parallel to the matrix's tag list.
    pub feature_counts: Vec<Option<u64>>,
}

impl GeneRecord {
    /// Stable `"<gene> <expression>"` pair key used by the binning step.
    pub fn composite_key(&self) -> String {
        let mut fbuf = ryu::Buffer::new();
        format!("{} {}", self.gene, fbuf.format(self.expression))
    }
}

/// A gene expression table joined with interaction aggregates.
#[derive(Debug, Clone, Default)]
pub struct ExpressionMatrix {
    tags: Vec<String>,
    genes: Vec<GeneRecord>,
}

impl ExpressionMatrix {
    /// Load a two-column (gene, expression) TSV. The first row is a
    /// header and is skipped; canonical names are assigned internally.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChicagoError::MissingFile(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader)
    }

    pub(crate) fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut genes = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line_no == 0 || line.trim().is_empty() {
                continue;
            }
            let mut fields = line.trim_end().split('\t');
            let gene = fields.next().unwrap_or("").to_string();
            let raw_expr = fields.next().ok_or_else(|| ChicagoError::Parse {
                line: line_no + 1,
                column: "Expression".to_string(),
                message: "expected two tab-separated columns".to_string(),
            })?;
            let expression = match raw_expr {
                "" | "NA" | "NaN" | "nan" => f64::NAN,
                _ => raw_expr.parse().map_err(|_| ChicagoError::Parse {
                    line: line_no + 1,
                    column: "Expression".to_string(),
                    message: format!("invalid expression value '{}'", raw_expr),
                })?,
            };
            genes.push(GeneRecord {
                gene,
                expression,
                enhancer_count: None,
                feature_counts: Vec::new(),
            });
        }
        Ok(Self {
            tags: Vec::new(),
            genes,
        })
    }

    pub fn genes(&self) -> &[GeneRecord] {
        &self.genes
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Join per-gene interaction aggregates: `enhancer_count` is the
    /// number of interactions baited by the gene, and each feature tag
    /// contributes the *sum* of its per-interaction counts (a gene
    /// touching many PIRs accumulates additively).
    pub fn join_interactions(&mut self, table: &InteractionTable, policy: MissingFeaturePolicy) {
        let tags: Vec<String> = table.feature_tags().iter().map(|t| t.to_string()).collect();
        let columns: Vec<&[u64]> = tags
            .iter()
            .map(|t| table.feature_column(t).unwrap_or(&[]))
            .collect();

        // gene -> (interaction count, per-tag sums)
        let mut aggregates: FxHashMap<&str, (u64, Vec<u64>)> = FxHashMap::default();
        for (row, record) in table.records().iter().enumerate() {
            let entry = aggregates
                .entry(record.bait_name.as_str())
                .or_insert_with(|| (0, vec![0; tags.len()]));
            entry.0 += 1;
            for (tag_idx, column) in columns.iter().enumerate() {
                entry.1[tag_idx] += column[row];
            }
        }

        let missing = match policy {
            MissingFeaturePolicy::Drop => None,
            MissingFeaturePolicy::ZeroFill => Some(0),
        };

        for gene in &mut self.genes {
            match aggregates.get(gene.gene.as_str()) {
                Some((count, sums)) => {
                    gene.enhancer_count = Some(*count);
                    gene.feature_counts = sums.iter().map(|s| Some(*s)).collect();
                }
                None => {
                    gene.enhancer_count = missing;
                    gene.feature_counts = vec![missing; tags.len()];
                }
            }
        }
        self.tags = tags;
    }

    /// Drop rows with expression <= 0 (NaN expression also fails).
    pub fn filter_nonzero_expression(&mut self) {
        self.genes.retain(|g| g.expression > 0.0);
    }

    /// Drop rows with any missing aggregate or a missing expression value.
    pub fn drop_missing(&mut self) {
        self.genes.retain(|g| {
            !g.expression.is_nan()
                && g.enhancer_count.is_some()
                && g.feature_counts.iter().all(Option::is_some)
        });
    }

    /// Write the matrix as a TSV. `with_composite` appends the
    /// `GeneName_MeanExpression` pair-key column used downstream.
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P, with_composite: bool) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        let mut header = vec!["GeneName".to_string(), "Expression".to_string()];
        header.push("enhancer_count".to_string());
        for tag in &self.tags {
            header.push(format!("{}_count", tag));
        }
        if with_composite {
            header.push("GeneName_MeanExpression".to_string());
        }
        writeln!(w, "{}", header.join("\t"))?;

        let mut ibuf = itoa::Buffer::new();
        let mut fbuf = ryu::Buffer::new();
        for gene in &self.genes {
            w.write_all(gene.gene.as_bytes())?;
            w.write_all(b"\t")?;
            if gene.expression.is_nan() {
                w.write_all(b"NA")?;
            } else {
                w.write_all(fbuf.format(gene.expression).as_bytes())?;
            }
            w.write_all(b"\t")?;
            match gene.enhancer_count {
                Some(c) => w.write_all(ibuf.format(c).as_bytes())?,
                None => w.write_all(b"NA")?,
            }
            for count in &gene.feature_counts {
                w.write_all(b"\t")?;
                match count {
                    Some(c) => w.write_all(ibuf.format(*c).as_bytes())?,
                    None => w.write_all(b"NA")?,
                }
            }
            if with_composite {
                w.write_all(b"\t")?;
                w.write_all(gene.composite_key().as_bytes())?;
            }
            w.write_all(b"\n")?;
        }
        w.flush()?;
        Ok(())
    }
}

/// Convenience for constructing output paths under the matrix directory.
pub fn matrix_paths(output_dir: &Path, basename: &str) -> (PathBuf, PathBuf) {
    let dir = output_dir.join("expression_matrix");
    (
        dir.join(format!("{}_unfiltered_expression_matrix.tsv", basename)),
        dir.join(format!("{}_filtered_expression_matrix.tsv", basename)),
    )
}
