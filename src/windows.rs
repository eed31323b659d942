//! Window summaries over a [`DepthMap`].

use std::{
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    num::ParseIntError,
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

use crate::{
    depth::{DepthMap, data_lines},
    smart_reader::open_input,
    stats::{DepthStats, Stat},
};

/// Chromosome rename applied to window names before lookup in the depth map.
pub const DEFAULT_ALIAS: &str = "ST4.03ch=chr";

/// Substring substitution on chromosome names, written `FROM=TO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromAlias {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid chromosome alias '{0}', expected FROM=TO")]
pub struct AliasError(String);

impl ChromAlias {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn apply(&self, name: &str) -> String {
        name.replace(&self.from, &self.to)
    }
}

impl FromStr for ChromAlias {
    type Err = AliasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((from, to)) if !from.is_empty() => Ok(Self::new(from, to)),
            _ => Err(AliasError(s.to_string())),
        }
    }
}

impl Default for ChromAlias {
    fn default() -> Self {
        Self::new("ST4.03ch", "chr")
    }
}

pub fn apply_aliases(name: &str, aliases: &[ChromAlias]) -> String {
    aliases
        .iter()
        .fold(name.to_string(), |name, alias| alias.apply(&name))
}

/// Half-open interval `[start, end)` on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

impl Window {
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.chromosome, self.start, self.end)
    }

    pub fn stats(&self, depths: &DepthMap) -> Option<DepthStats> {
        depths
            .depths_in(&self.chromosome, self.start, self.end)
            .map(|values| DepthStats::from_depths(&values))
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct WindowSummary {
    pub windows_written: usize,
    pub windows_without_data: usize,
    /// Windows on chromosomes with no depth records; these are not written.
    pub windows_skipped: usize,
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: expected at least 3 tab-delimited fields, found {found}")]
    FieldCount { line: u64, found: usize },
    #[error("line {line}: invalid coordinate '{value}': {source}")]
    InvalidCoordinate {
        line: u64,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

fn parse_window(line: u64, text: &str, aliases: &[ChromAlias]) -> Result<Window, WindowError> {
    let fields: Vec<&str> = text.trim_end().split('\t').collect();
    if fields.len() < 3 {
        return Err(WindowError::FieldCount {
            line,
            found: fields.len(),
        });
    }
    let coordinate = |value: &str| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|source| WindowError::InvalidCoordinate {
                line,
                value: value.to_string(),
                source,
            })
    };

    Ok(Window {
        chromosome: apply_aliases(fields[0], aliases),
        start: coordinate(fields[1])?,
        end: coordinate(fields[2])?,
    })
}

/// Appends mean and median depth to every window line whose chromosome has
/// depth records.
pub fn summarize_windows<R, W>(
    depths: &DepthMap,
    windows: R,
    out: &mut W,
    aliases: &[ChromAlias],
) -> Result<WindowSummary, WindowError>
where
    R: BufRead,
    W: Write,
{
    let mut summary = WindowSummary::default();
    for line in data_lines(windows) {
        let (line, text) = line?;
        let window = parse_window(line, &text, aliases)?;

        let Some(stats) = window.stats(depths) else {
            tracing::debug!(window = %window.key(), "no depth records for chromosome, skipping");
            summary.windows_skipped += 1;
            continue;
        };
        if stats.is_empty() {
            summary.windows_without_data += 1;
        }

        writeln!(out, "{}\t{}\t{}", text, Stat(stats.mean), Stat(stats.median))?;
        summary.windows_written += 1;
    }
    Ok(summary)
}

/// Summarizes every window in `windows_path` into `output`.
pub fn parse_windows(
    depths: &DepthMap,
    windows_path: &Path,
    output: &Path,
    aliases: &[ChromAlias],
) -> Result<WindowSummary> {
    let reader = open_input(windows_path)
        .with_context(|| format!("failed to open window file {}", windows_path.display()))?;
    let file = File::create(output)
        .with_context(|| format!("failed to create output {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let summary = summarize_windows(depths, reader, &mut writer, aliases)
        .with_context(|| format!("failed to summarize windows from {}", windows_path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write output {}", output.display()))?;

    tracing::info!(
        written = summary.windows_written,
        without_data = summary.windows_without_data,
        skipped = summary.windows_skipped,
        "summarized windows",
    );
    Ok(summary)
}
