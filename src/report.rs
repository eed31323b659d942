//! Structured run report for downstream tool consumption.
//!
//! Written as JSON when `--report` is given; records the inputs, outputs,
//! parameters and counts of a filtering or window depth run.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    aggregate::{DepthConfig, DepthSummary},
    classify::{Mode, Thresholds},
    filter::{FilterConfig, FilterSummary},
};

/// Complete report of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<P, S> {
    /// Binary that produced the report
    pub tool: &'static str,
    /// Tool version
    pub version: String,
    /// Timestamp of run (RFC 3339)
    pub timestamp: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub parameters: P,
    pub statistics: S,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterParameters {
    pub mode: Mode,
    #[serde(flatten)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepthParameters {
    pub aliases: Vec<String>,
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

impl<P, S> RunReport<P, S> {
    fn new(
        tool: &'static str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        parameters: P,
        statistics: S,
    ) -> Self {
        Self {
            tool,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: timestamp(),
            inputs,
            outputs,
            parameters,
            statistics,
        }
    }
}

impl RunReport<FilterParameters, FilterSummary> {
    pub fn for_filter(config: &FilterConfig, summary: &FilterSummary) -> Self {
        Self::new(
            "maps-part2",
            vec![display(&config.input)],
            vec![display(&config.output), display(&config.non_assay_path())],
            FilterParameters {
                mode: config.mode,
                thresholds: config.thresholds,
            },
            summary.clone(),
        )
    }
}

impl RunReport<DepthParameters, DepthSummary> {
    pub fn for_depth(config: &DepthConfig, summary: &DepthSummary) -> Self {
        Self::new(
            "window-depth",
            vec![display(&config.depth), display(&config.windows)],
            vec![display(&config.output), display(&config.global_output)],
            DepthParameters {
                aliases: config
                    .aliases
                    .iter()
                    .map(|alias| format!("{}={}", alias.from, alias.to))
                    .collect(),
            },
            summary.clone(),
        )
    }
}

impl<P: Serialize, S: Serialize> RunReport<P, S> {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write run report {}", path.display()))?;
        tracing::info!("Wrote run report to {}", path.display());
        Ok(())
    }
}
