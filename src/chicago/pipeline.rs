//! End-to-end interaction pipeline: load, filter, aggregate features,
//! join expression, correlate, and write every artifact under the output
//! directory.

use super::correlation::{self, CorrelationRow};
use super::derive::pir_set;
use super::expression::{matrix_paths, ExpressionMatrix, MissingFeaturePolicy};
use super::features::{apply_feature_counts, count_feature_overlaps, FeatureSpec};
use super::filter::FilterConfig;
use super::table::InteractionTable;
use super::{ChicagoError, Result};
use crate::bed;
use crate::liftover::{LiftOverTool, Liftover};
use std::path::PathBuf;

/// Everything the pipeline needs to run once.
#[derive(Debug, Clone)]
pub struct ChicagoConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Prefix stamped on every output file name.
    pub basename: String,
    pub features: Vec<FeatureSpec>,
    pub gene_expression: Option<PathBuf>,
    /// When set, PIR intersection segments are additionally re-projected
    /// through this chain file.
    pub chain_file: Option<PathBuf>,
    pub filter: FilterConfig,
    pub missing_feature_policy: MissingFeaturePolicy,
    /// Drop genes with expression <= 0 before the filtered matrix.
    pub nonzero_expression: bool,
    /// Drop genes with any missing aggregate before the filtered matrix.
    pub dropna_expression: bool,
}

impl ChicagoConfig {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            basename: "pchic".to_string(),
            features: Vec::new(),
            gene_expression: None,
            chain_file: None,
            filter: FilterConfig::default(),
            missing_feature_policy: MissingFeaturePolicy::Drop,
            nonzero_expression: true,
            dropna_expression: true,
        }
    }
}

/// Counts reported after a run.
#[derive(Debug, Clone, Default)]
pub struct ChicagoSummary {
    pub interactions_loaded: usize,
    pub interactions_kept: usize,
    pub pir_count: usize,
    pub features_processed: usize,
    pub genes_unfiltered: usize,
    pub genes_filtered: usize,
    pub correlations: Vec<CorrelationRow>,
}

pub struct ChicagoPipeline {
    config: ChicagoConfig,
}

impl ChicagoPipeline {
    pub fn new(config: ChicagoConfig) -> Self {
        Self { config }
    }

    /// Run with the external liftOver tool when a chain file is
    /// configured.
    pub fn run(&self) -> Result<ChicagoSummary> {
        match &self.config.chain_file {
            Some(chain) => {
                let tool = LiftOverTool::with_chain(chain).map_err(|source| {
                    ChicagoError::Liftover {
                        tag: "chain".to_string(),
                        source,
                    }
                })?;
                self.run_with_liftover(Some(&tool))
            }
            None => self.run_with_liftover(None),
        }
    }

    /// Run with an injected re-projection implementation, or none.
    pub fn run_with_liftover(&self, lift: Option<&dyn Liftover>) -> Result<ChicagoSummary> {
        let cfg = &self.config;
        let mut summary = ChicagoSummary::default();

        let table = InteractionTable::from_path(&cfg.input)?;
        summary.interactions_loaded = table.len();
        eprintln!("loaded {} interactions from {}", table.len(), cfg.input.display());

        let mut table = cfg.filter.apply(&table)?;
        summary.interactions_kept = table.len();
        eprintln!("{} interactions kept after filtering", table.len());

        let pirs = pir_set(&table);
        summary.pir_count = pirs.len();

        for spec in &cfg.features {
            let features =
                bed::read_intervals(&spec.path).map_err(|source| ChicagoError::FeatureFile {
                    tag: spec.tag.clone(),
                    source,
                })?;
            let overlaps = count_feature_overlaps(&pirs, features);
            apply_feature_counts(&mut table, &spec.tag, &overlaps);

            let segments_path = self.intersection_path(&spec.tag);
            bed::write_intervals_to_path(&segments_path, &overlaps.segments)
                .map_err(|source| ChicagoError::FeatureFile {
                    tag: spec.tag.clone(),
                    source,
                })?;

            if let Some(lift) = lift {
                let outcome = lift.lift(&overlaps.segments).map_err(|source| {
                    ChicagoError::Liftover {
                        tag: spec.tag.clone(),
                        source,
                    }
                })?;
                if outcome.unmapped > 0 {
                    eprintln!(
                        "liftover dropped {} segments for '{}'",
                        outcome.unmapped, spec.tag
                    );
                }
                let lifted_path = self.lifted_intersection_path(&spec.tag);
                bed::write_intervals_to_path(&lifted_path, &outcome.mapped).map_err(
                    |source| ChicagoError::FeatureFile {
                        tag: spec.tag.clone(),
                        source,
                    },
                )?;
            }
            summary.features_processed += 1;
        }

        if let Some(expression_path) = &cfg.gene_expression {
            let mut matrix = ExpressionMatrix::from_path(expression_path)?;
            matrix.join_interactions(&table, cfg.missing_feature_policy);

            let (unfiltered_path, filtered_path) =
                matrix_paths(&cfg.output_dir, &cfg.basename);
            matrix.write_tsv(&unfiltered_path, false)?;
            summary.genes_unfiltered = matrix.len();

            if cfg.nonzero_expression {
                matrix.filter_nonzero_expression();
            }
            if cfg.dropna_expression {
                matrix.drop_missing();
            }
            matrix.write_tsv(&filtered_path, true)?;
            summary.genes_filtered = matrix.len();
            eprintln!(
                "expression matrix: {} genes, {} after filtering",
                summary.genes_unfiltered, summary.genes_filtered
            );

            for spec in &cfg.features {
                let rows = correlation::bin_by_feature_count(&matrix, &spec.tag);
                correlation::write_binned(self.binned_path(&spec.tag), &spec.tag, &rows)?;
                summary.correlations.push(correlation::correlate(&matrix, &spec.tag));
            }
            correlation::write_correlation_stats(
                self.correlation_stats_path(),
                &summary.correlations,
            )?;
        }

        table.write_tsv(self.modified_table_path())?;
        Ok(summary)
    }

    fn modified_table_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join("modified_chicago")
            .join(format!("{}_modified.tsv", self.config.basename))
    }

    fn intersection_path(&self, tag: &str) -> PathBuf {
        self.config
            .output_dir
            .join("PIR_intersection")
            .join(format!("{}_PIR_intersect_{}.bed", self.config.basename, tag))
    }

    fn lifted_intersection_path(&self, tag: &str) -> PathBuf {
        self.config
            .output_dir
            .join("PIR_intersection_liftover")
            .join(format!(
                "{}_PIR_intersect_{}_hg19.bed",
                self.config.basename, tag
            ))
    }

    fn binned_path(&self, tag: &str) -> PathBuf {
        self.config
            .output_dir
            .join("expression_analysis")
            .join(format!("{}_{}.tsv", self.config.basename, tag))
    }

    fn correlation_stats_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join("correlation_analysis")
            .join(format!("{}_correlation_stats.tsv", self.config.basename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::liftover::{LiftoverError, LiftoverOutcome};
    use std::fs;
    use std::io::Write as _;
    use std::path::Path;

    const HEADER: &str =
        "baitChr\tbaitStart\tbaitEnd\tbaitID\tbaitName\toeChr\toeStart\toeEnd\toeID\toeName\tdist\tscore";

    struct IdentityLift;

    impl Liftover for IdentityLift {
        fn lift(
            &self,
            intervals: &[Interval],
        ) -> std::result::Result<LiftoverOutcome, LiftoverError> {
            Ok(LiftoverOutcome {
                mapped: intervals.to_vec(),
                unmapped: 0,
            })
        }
    }

    fn write_file(path: &Path, content: &str) {
        let mut f = fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn workspace() -> (tempfile::TempDir, ChicagoConfig) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("chicago.tsv");
        write_file(
            &input,
            &format!(
                "{HEADER}\n\
                 1\t100\t200\tb1\tGeneA\t1\t1000\t2000\to1\t.\t900\t7.5\n\
                 1\t100\t200\tb1\tGeneA\t1\t5000\t6000\to2\t.\t4900\t6.0\n\
                 1\t300\t400\tb2\tGeneB\t1\t1000\t2000\to1\t.\t700\t8.0\n\
                 1\t300\t400\tb2\toff_target\t1\t8000\t9000\to3\t.\t7700\t9.0\n"
            ),
        );

        let atac = dir.path().join("atac.bed");
        write_file(&atac, "chr1\t1100\t1200\nchr1\t5500\t5600\n");

        let expr = dir.path().join("expression.tsv");
        write_file(&expr, "GeneName\tExpression\nGeneA\t10.0\nGeneB\t5.0\n");

        let output = dir.path().join("out");
        let mut config = ChicagoConfig::new(&input, &output);
        config.basename = "test".to_string();
        config.features = vec![FeatureSpec {
            path: atac,
            tag: "atac".to_string(),
        }];
        config.gene_expression = Some(expr);
        (dir, config)
    }

    #[test]
    fn test_full_run_writes_all_artifacts() {
        let (_dir, config) = workspace();
        let output = config.output_dir.clone();
        let summary = ChicagoPipeline::new(config)
            .run_with_liftover(Some(&IdentityLift))
            .unwrap();

        assert_eq!(summary.interactions_loaded, 4);
        assert_eq!(summary.interactions_kept, 3);
        assert_eq!(summary.pir_count, 2);
        assert_eq!(summary.features_processed, 1);
        assert_eq!(summary.genes_unfiltered, 2);
        assert_eq!(summary.genes_filtered, 2);
        assert_eq!(summary.correlations.len(), 1);

        for relative in [
            "modified_chicago/test_modified.tsv",
            "PIR_intersection/test_PIR_intersect_atac.bed",
            "PIR_intersection_liftover/test_PIR_intersect_atac_hg19.bed",
            "expression_matrix/test_unfiltered_expression_matrix.tsv",
            "expression_matrix/test_filtered_expression_matrix.tsv",
            "expression_analysis/test_atac.tsv",
            "correlation_analysis/test_correlation_stats.tsv",
        ] {
            assert!(output.join(relative).exists(), "missing {relative}");
        }
    }

    #[test]
    fn test_run_without_liftover_skips_lifted_artifacts() {
        let (_dir, config) = workspace();
        let output = config.output_dir.clone();
        ChicagoPipeline::new(config)
            .run_with_liftover(None)
            .unwrap();

        assert!(output
            .join("PIR_intersection/test_PIR_intersect_atac.bed")
            .exists());
        assert!(!output.join("PIR_intersection_liftover").exists());
    }

    #[test]
    fn test_missing_feature_file_names_tag() {
        let (_dir, mut config) = workspace();
        config.features[0].path = PathBuf::from("/no/such/file.bed");
        let err = ChicagoPipeline::new(config)
            .run_with_liftover(None)
            .unwrap_err();
        match err {
            ChicagoError::FeatureFile { tag, .. } => assert_eq!(tag, "atac"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_input_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChicagoConfig::new("/no/such/input.tsv", dir.path().join("out"));
        let err = ChicagoPipeline::new(config)
            .run_with_liftover(None)
            .unwrap_err();
        assert!(matches!(err, ChicagoError::MissingFile(_)));
    }

    #[test]
    fn test_modified_table_carries_feature_columns() {
        let (_dir, config) = workspace();
        let output = config.output_dir.clone();
        ChicagoPipeline::new(config)
            .run_with_liftover(None)
            .unwrap();

        let content =
            fs::read_to_string(output.join("modified_chicago/test_modified.tsv")).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.ends_with("bait_interval_ID\toe_interval_ID\tinteraction_ID\tatac"));
        // Three kept rows
        assert_eq!(content.lines().count(), 4);
    }
}
