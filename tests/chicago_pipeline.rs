//! End-to-end tests for the interaction pipeline.
//!
//! Tests verify:
//! 1. Every artifact lands under its output subdirectory
//! 2. The modified table carries derived IDs and feature counts
//! 3. Filtering, aggregation, and the expression join compose correctly
//! 4. The correlation stats table has one row per feature tag

use pchic_tools::chicago::{ChicagoConfig, ChicagoPipeline, FeatureSpec, FilterConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: &str =
    "baitChr\tbaitStart\tbaitEnd\tbaitID\tbaitName\toeChr\toeStart\toeEnd\toeID\toeName\tdist\tscore";

fn write_file(path: &Path, content: &str) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}

struct Workspace {
    _dir: tempfile::TempDir,
    output: PathBuf,
    config: ChicagoConfig,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();

    let input = dir.path().join("chicago.tsv");
    write_file(
        &input,
        &format!(
            "{HEADER}\n\
             1\t100\t200\tb1\tGeneA\t1\t1000\t2000\to1\t.\t900\t7.5\n\
             1\t100\t200\tb1\tGeneA\t1\t5000\t6000\to2\t.\t4900\t6.0\n\
             1\t300\t400\tb2\tGeneB\t1\t1000\t2000\to1\t.\t700\t8.0\n\
             1\t300\t400\tb2\toff_target\t1\t8000\t9000\to3\t.\t7700\t9.0\n\
             1\t500\t600\tb3\tGeneC\t2\t1000\t2000\to4\t.\t400\t7.0\n"
        ),
    );

    let atac = dir.path().join("atac.bed");
    write_file(&atac, "chr1\t1100\t1200\nchr1\t1300\t1400\nchr1\t5500\t5600\n");

    let ctcf = dir.path().join("ctcf.bed");
    write_file(&ctcf, "chr1\t900\t1100\n");

    let expr = dir.path().join("expression.tsv");
    write_file(
        &expr,
        "GeneName\tExpression\nGeneA\t10.0\nGeneB\t5.0\nGeneD\t2.0\n",
    );

    let output = dir.path().join("out");
    let mut config = ChicagoConfig::new(&input, &output);
    config.basename = "run".to_string();
    config.features = vec![
        FeatureSpec {
            path: atac,
            tag: "atac".to_string(),
        },
        FeatureSpec {
            path: ctcf,
            tag: "ctcf".to_string(),
        },
    ];
    config.gene_expression = Some(expr);
    config.filter = FilterConfig::default();

    Workspace {
        _dir: dir,
        output,
        config,
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn pipeline_writes_expected_artifact_tree() {
    let ws = workspace();
    let summary = ChicagoPipeline::new(ws.config)
        .run_with_liftover(None)
        .unwrap();

    // Off-target and trans rows removed
    assert_eq!(summary.interactions_loaded, 5);
    assert_eq!(summary.interactions_kept, 3);
    assert_eq!(summary.features_processed, 2);

    for relative in [
        "modified_chicago/run_modified.tsv",
        "PIR_intersection/run_PIR_intersect_atac.bed",
        "PIR_intersection/run_PIR_intersect_ctcf.bed",
        "expression_matrix/run_unfiltered_expression_matrix.tsv",
        "expression_matrix/run_filtered_expression_matrix.tsv",
        "expression_analysis/run_atac.tsv",
        "expression_analysis/run_ctcf.tsv",
        "correlation_analysis/run_correlation_stats.tsv",
    ] {
        assert!(ws.output.join(relative).exists(), "missing {relative}");
    }
}

#[test]
fn modified_table_counts_match_intersection_segments() {
    let ws = workspace();
    ChicagoPipeline::new(ws.config)
        .run_with_liftover(None)
        .unwrap();

    let table = read_lines(&ws.output.join("modified_chicago/run_modified.tsv"));
    let header: Vec<&str> = table[0].split('\t').collect();
    let atac_col = header.iter().position(|c| *c == "atac").unwrap();

    // Per-row atac counts summed across interactions sharing a PIR
    let total: u64 = table[1..]
        .iter()
        .map(|line| {
            line.split('\t')
                .nth(atac_col)
                .unwrap()
                .parse::<u64>()
                .unwrap()
        })
        .sum();

    // PIR chr1:1000-2000 has 2 atac hits and appears on 2 kept rows,
    // PIR chr1:5000-6000 has 1 hit on 1 row
    assert_eq!(total, 5);

    // The segments file holds one clipped interval per unique PIR hit
    let segments =
        read_lines(&ws.output.join("PIR_intersection/run_PIR_intersect_atac.bed"));
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0], "chr1\t1100\t1200");
}

#[test]
fn expression_matrix_joins_and_filters() {
    let ws = workspace();
    ChicagoPipeline::new(ws.config)
        .run_with_liftover(None)
        .unwrap();

    let unfiltered = read_lines(
        &ws.output
            .join("expression_matrix/run_unfiltered_expression_matrix.tsv"),
    );
    assert_eq!(
        unfiltered[0],
        "GeneName\tExpression\tenhancer_count\tatac_count\tctcf_count"
    );
    // GeneA: 2 interactions, atac 2+1, ctcf 1+0
    assert_eq!(unfiltered[1], "GeneA\t10.0\t2\t3\t1");
    // GeneD never joins; Drop policy leaves NA
    assert_eq!(unfiltered[3], "GeneD\t2.0\tNA\tNA\tNA");

    let filtered = read_lines(
        &ws.output
            .join("expression_matrix/run_filtered_expression_matrix.tsv"),
    );
    // GeneD dropped, composite key column appended
    assert_eq!(filtered.len(), 3);
    assert!(filtered[0].ends_with("GeneName_MeanExpression"));
    assert!(filtered[1].ends_with("GeneA 10.0"));
}

#[test]
fn correlation_stats_have_one_row_per_tag() {
    let ws = workspace();
    let summary = ChicagoPipeline::new(ws.config)
        .run_with_liftover(None)
        .unwrap();

    let stats = read_lines(&ws.output.join("correlation_analysis/run_correlation_stats.tsv"));
    assert_eq!(
        stats[0],
        "Spearman_corr\tSpearman_pval\tPearson_corr\tPearson_pval\tFeature"
    );
    assert_eq!(stats.len(), 3);
    assert!(stats[1].ends_with("\tatac"));
    assert!(stats[2].ends_with("\tctcf"));
    assert_eq!(summary.correlations.len(), 2);
}
