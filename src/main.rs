//! pchic: promoter-capture Hi-C analysis toolkit
//!
//! Usage: pchic <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process;

use pchic_tools::chicago::{
    ChicagoConfig, ChicagoPipeline, FeatureSpec, FilterConfig, MissingFeaturePolicy, P2pStrategy,
    ScoreThreshold,
};
use pchic_tools::genome::Genome;
use pchic_tools::reli::{
    loops_from_anchor_beds, permutation_test, read_loops, write_anchor_beds, PermutationConfig,
    RandomizeConfig, TssRegistry,
};

#[derive(Parser)]
#[command(name = "pchic")]
#[command(version)]
#[command(about = "Promoter-capture Hi-C analysis toolkit", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter CHiCAGO interactions, aggregate feature overlaps, and
    /// correlate feature density with gene expression
    Chicago {
        /// CHiCAGO interaction table (TSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for all artifacts
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Prefix stamped on output file names
        #[arg(short, long, default_value = "pchic")]
        basename: String,

        /// Feature BED file with its tag, as path=tag (repeatable)
        #[arg(short, long = "feature")]
        features: Vec<String>,

        /// Two-column gene expression table (gene, expression)
        #[arg(short, long)]
        expression: Option<PathBuf>,

        /// liftOver chain file for re-projecting intersection segments
        #[arg(long)]
        chain_file: Option<PathBuf>,

        /// Score column to threshold on
        #[arg(long)]
        score_col: Option<String>,

        /// Minimum score (used with --score-col)
        #[arg(long, default_value_t = ScoreThreshold::DEFAULT_MIN)]
        score_min: f64,

        /// Promoter-to-promoter filter: name-sentinel, interval-membership, or both
        #[arg(long, default_value = "interval-membership")]
        p2p: String,

        /// Disable the promoter-to-promoter filter
        #[arg(long)]
        no_p2p: bool,

        /// Evaluate the off-target filters without dropping rows
        #[arg(long)]
        legacy_inert_off_target: bool,

        /// Unjoined genes: drop or zero-fill
        #[arg(long, default_value = "drop")]
        missing_feature_policy: String,

        /// Keep genes with zero or negative expression
        #[arg(long)]
        include_zero_expression: bool,

        /// Keep genes with missing aggregates in the filtered matrix
        #[arg(long)]
        keep_na_expression: bool,
    },

    /// Test whether query loops overlap a reference loop set on both
    /// anchors more often than randomized loops do
    Reli {
        /// Query loops, six columns per row
        #[arg(short, long)]
        input: PathBuf,

        /// Reference loops, six columns per row
        #[arg(short = 'r', long)]
        control_reference: Option<PathBuf>,

        /// Reference left anchors as BED (paired with --right-reference)
        #[arg(long)]
        left_reference: Option<PathBuf>,

        /// Reference right anchors as BED (paired with --left-reference)
        #[arg(long)]
        right_reference: Option<PathBuf>,

        /// TSS table: chrom, position, strand
        #[arg(long)]
        tss: PathBuf,

        /// Chromosome sizes file (default: built-in hg19)
        #[arg(short = 'g', long)]
        genome: Option<PathBuf>,

        /// Number of randomization iterations
        #[arg(short = 'n', long, default_value_t = 1000)]
        iterations: usize,

        /// RNG seed
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// TSS draws per loop before giving up on placement
        #[arg(long, default_value_t = 10_000)]
        max_attempts: usize,

        /// Directory to persist the reference anchor BED files
        #[arg(long)]
        anchor_dir: Option<PathBuf>,
    },
}

#[allow(clippy::too_many_arguments)]
fn run_chicago(
    input: PathBuf,
    output_dir: PathBuf,
    basename: String,
    features: Vec<String>,
    expression: Option<PathBuf>,
    chain_file: Option<PathBuf>,
    score_col: Option<String>,
    score_min: f64,
    p2p: String,
    no_p2p: bool,
    legacy_inert_off_target: bool,
    missing_feature_policy: String,
    include_zero_expression: bool,
    keep_na_expression: bool,
) -> Result<(), Box<dyn Error>> {
    let features = features
        .iter()
        .map(|arg| {
            FeatureSpec::from_arg(arg)
                .ok_or_else(|| format!("invalid --feature '{}', expected path=tag", arg))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let p2p = if no_p2p {
        None
    } else {
        Some(
            P2pStrategy::from_str(&p2p)
                .ok_or_else(|| format!("unknown --p2p strategy '{}'", p2p))?,
        )
    };
    let policy = MissingFeaturePolicy::from_str(&missing_feature_policy).ok_or_else(|| {
        format!(
            "unknown --missing-feature-policy '{}'",
            missing_feature_policy
        )
    })?;

    let filter = FilterConfig {
        legacy_inert_off_target,
        p2p,
        score: score_col.map(|column| ScoreThreshold {
            column,
            min: score_min,
        }),
        ..FilterConfig::default()
    };

    let mut config = ChicagoConfig::new(input, output_dir);
    config.basename = basename;
    config.features = features;
    config.gene_expression = expression;
    config.chain_file = chain_file;
    config.filter = filter;
    config.missing_feature_policy = policy;
    config.nonzero_expression = !include_zero_expression;
    config.dropna_expression = !keep_na_expression;

    let summary = ChicagoPipeline::new(config).run()?;
    println!(
        "{} of {} interactions kept, {} PIRs, {} features processed",
        summary.interactions_kept,
        summary.interactions_loaded,
        summary.pir_count,
        summary.features_processed
    );
    for row in &summary.correlations {
        println!(
            "{}: spearman {:.4} (p={:.4e}), pearson {:.4} (p={:.4e})",
            row.tag,
            row.spearman.coefficient,
            row.spearman.p_value,
            row.pearson.coefficient,
            row.pearson.p_value
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_reli(
    input: PathBuf,
    control_reference: Option<PathBuf>,
    left_reference: Option<PathBuf>,
    right_reference: Option<PathBuf>,
    tss: PathBuf,
    genome: Option<PathBuf>,
    iterations: usize,
    seed: u64,
    max_attempts: usize,
    anchor_dir: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let queries = read_loops(&input)?;
    let reference = match (control_reference, left_reference, right_reference) {
        (Some(path), _, _) => read_loops(&path)?,
        (None, Some(left), Some(right)) => loops_from_anchor_beds(&left, &right)?,
        _ => {
            return Err(
                "provide --control-reference, or both --left-reference and --right-reference"
                    .into(),
            )
        }
    };

    if let Some(dir) = anchor_dir {
        write_anchor_beds(dir.join("left_ref.bed"), dir.join("right_ref.bed"), &reference)?;
    }

    let genome = match genome {
        Some(path) => Genome::from_file(path)?,
        None => Genome::hg19(),
    };
    let tss = TssRegistry::from_file(&tss)?;

    let config = PermutationConfig {
        iterations,
        seed,
        randomize: RandomizeConfig { max_attempts },
    };
    let summary = permutation_test(&queries, &reference, &tss, &genome, &config)?;

    println!("actual_overlap\t{}", summary.actual);
    println!("null_mean\t{:.6}", summary.mean);
    println!("null_stdev\t{:.6}", summary.stdev);
    println!("z_score\t{:.6}", summary.z_score);
    println!("p_value\t{:.6e}", summary.p_value);
    println!("fold_enrichment\t{:.6}", summary.fold_enrichment);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Chicago {
            input,
            output_dir,
            basename,
            features,
            expression,
            chain_file,
            score_col,
            score_min,
            p2p,
            no_p2p,
            legacy_inert_off_target,
            missing_feature_policy,
            include_zero_expression,
            keep_na_expression,
        } => run_chicago(
            input,
            output_dir,
            basename,
            features,
            expression,
            chain_file,
            score_col,
            score_min,
            p2p,
            no_p2p,
            legacy_inert_off_target,
            missing_feature_policy,
            include_zero_expression,
            keep_na_expression,
        ),

        Commands::Reli {
            input,
            control_reference,
            left_reference,
            right_reference,
            tss,
            genome,
            iterations,
            seed,
            max_attempts,
            anchor_dir,
        } => run_reli(
            input,
            control_reference,
            left_reference,
            right_reference,
            tss,
            genome,
            iterations,
            seed,
            max_attempts,
            anchor_dir,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
