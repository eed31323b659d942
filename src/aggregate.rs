use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::{
    depth::parse_depth,
    stats::DepthStats,
    windows::{ChromAlias, WindowSummary, parse_windows},
};

/// Inputs and outputs for one window depth run.
#[derive(Debug, Clone)]
pub struct DepthConfig {
    pub depth: PathBuf,
    pub windows: PathBuf,
    pub output: PathBuf,
    pub global_output: PathBuf,
    pub aliases: Vec<ChromAlias>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DepthSummary {
    pub positions: usize,
    pub chromosomes: usize,
    pub global_mean: Option<f64>,
    pub global_median: Option<f64>,
    #[serde(flatten)]
    pub windows: WindowSummary,
}

/// Loads the depth file, writes global statistics, then summarizes every
/// window.
pub fn summarize_depth(config: &DepthConfig) -> Result<DepthSummary> {
    tracing::info!(
        depth = %config.depth.display(),
        windows = %config.windows.display(),
        output = %config.output.display(),
        global_output = %config.global_output.display(),
        aliases = config.aliases.len(),
        "starting window depth summary",
    );

    let (depths, DepthStats { mean, median }) =
        parse_depth(&config.depth, &config.global_output)?;
    let windows = parse_windows(&depths, &config.windows, &config.output, &config.aliases)?;

    Ok(DepthSummary {
        positions: depths.len(),
        chromosomes: depths.chromosome_count(),
        global_mean: mean,
        global_median: median,
        windows,
    })
}
