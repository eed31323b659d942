use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    aggregate::{DepthConfig, DepthSummary, summarize_depth},
    classify::{Mode, Thresholds},
    filter::{FilterConfig, FilterSummary, filter_positions},
    report::RunReport,
    windows::{ChromAlias, DEFAULT_ALIAS},
};

#[derive(Debug, Parser)]
#[command(
    name = "maps-part2",
    author,
    version,
    about = "Filter MAPS part 1 position tables into mutation or genotype calls",
    long_about = None
)]
struct Part2Cli {
    /// Position table produced by MAPS part 1 (optionally gzipped)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: PathBuf,

    /// Output table
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    /// Minimum position coverage after removing unused libraries
    #[arg(short = 'v', long = "minCov", default_value_t = 1)]
    min_cov: u32,

    /// Minimum reads supporting the minor (or mutant) allele of a heterozygous call
    #[arg(short = 'd', long = "hetMinCov", default_value_t = 5)]
    het_min_cov: u32,

    /// Minimum percentage of the minor allele in a heterozygous call
    #[arg(short = 'p', long = "hetMinPer", default_value_t = 20.0)]
    het_min_per: f64,

    /// Minimum library coverage before a heterozygous call is considered (genotyping only)
    #[arg(short = 'D', long = "hetMinLibCov", default_value_t = 5)]
    het_min_lib_cov: u32,

    /// Minimum library coverage for a homozygous call
    #[arg(short = 's', long = "homMinCov", default_value_t = 2)]
    hom_min_cov: u32,

    /// Minimum number of libraries with a usable call
    #[arg(short = 'l', long = "MinLibs", default_value_t = 3)]
    min_libs: usize,

    /// Run mode: m (mutation detection) or g (genotyping)
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = Mode::Mutation)]
    mode: Mode,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Part2Cli {
    fn config(&self) -> FilterConfig {
        FilterConfig {
            input: self.file.clone(),
            output: self.out.clone(),
            mode: self.mode,
            thresholds: Thresholds {
                min_coverage: self.min_cov,
                het_min_coverage: self.het_min_cov,
                het_min_pct: self.het_min_per,
                het_min_library_coverage: self.het_min_lib_cov,
                hom_min_coverage: self.hom_min_cov,
                min_libraries: self.min_libs,
            },
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "window-depth",
    author,
    version,
    about = "Summarize per-base depth over genomic windows",
    long_about = None
)]
struct WindowDepthCli {
    /// Window file: chrom, start, end, extra columns kept
    #[arg(short = 'w', long = "windows", value_name = "FILE")]
    windows: PathBuf,

    /// Per-base depth file: chrom, 0-based position, depth
    #[arg(short = 'b', long = "bed", value_name = "FILE")]
    bed: PathBuf,

    /// Window output with mean and median appended
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    /// Global mean and median output
    #[arg(short = 'g', long = "global-out", value_name = "FILE")]
    global_out: PathBuf,

    /// Chromosome rename applied to window names, FROM=TO (repeatable)
    #[arg(long = "alias", value_name = "FROM=TO", default_value = DEFAULT_ALIAS)]
    aliases: Vec<ChromAlias>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl WindowDepthCli {
    fn config(&self) -> DepthConfig {
        DepthConfig {
            depth: self.bed.clone(),
            windows: self.windows.clone(),
            output: self.out.clone(),
            global_output: self.global_out.clone(),
            aliases: self.aliases.clone(),
        }
    }
}

pub fn run_part2() -> Result<()> {
    let cli = Part2Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.config();
    let summary = filter_positions(&config)?;
    if let Some(path) = &cli.report {
        RunReport::for_filter(&config, &summary).write(path)?;
    }
    print_filter_summary(&summary);

    Ok(())
}

pub fn run_window_depth() -> Result<()> {
    let cli = WindowDepthCli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.config();
    let summary = summarize_depth(&config)?;
    if let Some(path) = &cli.report {
        RunReport::for_depth(&config, &summary).write(path)?;
    }
    print_depth_summary(&summary);

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
    Ok(())
}

fn print_filter_summary(summary: &FilterSummary) {
    println!(
        "Processed {total} positions; emitted {emitted}, rejected {rejected} ({non_assay} with too few libraries).",
        total = summary.total_records,
        emitted = summary.emitted_records,
        rejected = summary.rejected_records(),
        non_assay = summary.non_assay_records,
    );

    if summary.low_coverage > 0 || summary.monomorphic > 0 || summary.wrong_allele_count > 0 {
        println!(
            "Filtered: {low} below minimum coverage, {mono} without variation, {count} with an unusable allele count.",
            low = summary.low_coverage,
            mono = summary.monomorphic,
            count = summary.wrong_allele_count,
        );
    }

    let ambiguous = summary.ambiguous_consensus + summary.ambiguous_assignment;
    let inconsistent = summary.heterozygous_wild_type + summary.mutant_lacks_wild_type;
    if ambiguous > 0 || inconsistent > 0 {
        println!(
            "Ambiguous: {ambiguous} without a clear wild type or mutant library, {inconsistent} with inconsistent wild type calls.",
        );
    }

    if summary.parse_errors > 0 {
        println!(
            "Ignored {count} malformed input lines.",
            count = summary.parse_errors
        );
    }
}

fn print_depth_summary(summary: &DepthSummary) {
    println!(
        "Loaded {positions} depth positions on {chromosomes} chromosomes; wrote {written} windows.",
        positions = summary.positions,
        chromosomes = summary.chromosomes,
        written = summary.windows.windows_written,
    );

    if summary.windows.windows_without_data > 0 {
        println!(
            "{count} windows had no covered positions.",
            count = summary.windows.windows_without_data
        );
    }

    if summary.windows.windows_skipped > 0 {
        println!(
            "Skipped {count} windows on chromosomes without depth data.",
            count = summary.windows.windows_skipped
        );
    }
}
