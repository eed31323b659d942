use std::{
    collections::{BTreeMap, HashMap, btree_map::Entry},
    fs,
    io::{self, BufRead},
    num::ParseIntError,
    path::Path,
};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::{
    smart_reader::open_input,
    stats::{DepthStats, Stat},
};

/// Per-base depth keyed by chromosome, then 0-based position.
#[derive(Debug, Default, Clone)]
pub struct DepthMap {
    chromosomes: HashMap<String, BTreeMap<u64, u32>>,
    len: usize,
}

impl DepthMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a depth; returns `false` and keeps the old value if the
    /// position was already present.
    pub fn insert(&mut self, chromosome: &str, position: u64, depth: u32) -> bool {
        if !self.chromosomes.contains_key(chromosome) {
            self.chromosomes
                .insert(chromosome.to_string(), BTreeMap::new());
        }
        let inserted = self
            .chromosomes
            .get_mut(chromosome)
            .is_some_and(|positions| match positions.entry(position) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(depth);
                    true
                }
            });
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn contains_chromosome(&self, chromosome: &str) -> bool {
        self.chromosomes.contains_key(chromosome)
    }

    pub fn depth(&self, chromosome: &str, position: u64) -> Option<u32> {
        self.chromosomes.get(chromosome)?.get(&position).copied()
    }

    /// Depths of covered positions in `[start, end)`, or `None` when the
    /// chromosome has no depth records at all.
    pub fn depths_in(&self, chromosome: &str, start: u64, end: u64) -> Option<Vec<u32>> {
        let positions = self.chromosomes.get(chromosome)?;
        if start >= end {
            return Some(Vec::new());
        }
        Some(positions.range(start..end).map(|(_, &depth)| depth).collect())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chromosome_count(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn stats(&self) -> DepthStats {
        let depths: Vec<u32> = self
            .chromosomes
            .values()
            .flat_map(|positions| positions.values().copied())
            .collect();
        DepthStats::from_depths(&depths)
    }
}

#[derive(Debug, Error)]
pub enum DepthError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: expected at least 3 tab-delimited fields, found {found}")]
    FieldCount { line: u64, found: usize },
    #[error("line {line}: invalid position '{value}': {source}")]
    InvalidPosition {
        line: u64,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("line {line}: invalid depth '{value}': {source}")]
    InvalidDepth {
        line: u64,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("line {line}: duplicate position {chromosome}:{position}")]
    DuplicatePosition {
        line: u64,
        chromosome: String,
        position: u64,
    },
}

/// Lines that carry data: comments (`#`) and blank lines are dropped.
/// Yields 1-based line numbers alongside the text.
pub(crate) fn data_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<(u64, String)>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(text) if text.starts_with('#') || text.trim().is_empty() => None,
            Ok(text) => Some(Ok((index as u64 + 1, text))),
            Err(e) => Some(Err(e)),
        })
}

/// Reads `chrom<TAB>pos<TAB>depth` rows. A repeated (chrom, pos) pair is an
/// error.
pub fn read_depths<R: BufRead>(reader: R) -> Result<DepthMap, DepthError> {
    let mut depths = DepthMap::new();
    for line in data_lines(reader) {
        let (line, text) = line?;
        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() < 3 {
            return Err(DepthError::FieldCount {
                line,
                found: fields.len(),
            });
        }

        let chromosome = fields[0];
        let position = fields[1]
            .trim()
            .parse::<u64>()
            .map_err(|source| DepthError::InvalidPosition {
                line,
                value: fields[1].to_string(),
                source,
            })?;
        let depth = fields[2]
            .trim()
            .parse::<u32>()
            .map_err(|source| DepthError::InvalidDepth {
                line,
                value: fields[2].to_string(),
                source,
            })?;

        if !depths.insert(chromosome, position, depth) {
            return Err(DepthError::DuplicatePosition {
                line,
                chromosome: chromosome.to_string(),
                position,
            });
        }
    }
    Ok(depths)
}

/// Loads the per-base depth file and writes the global mean and median to
/// `global_output`. Returns the depths together with those statistics.
pub fn parse_depth(path: &Path, global_output: &Path) -> Result<(DepthMap, DepthStats)> {
    let reader =
        open_input(path).with_context(|| format!("failed to open depth file {}", path.display()))?;
    let depths = read_depths(reader)
        .with_context(|| format!("failed to read depth file {}", path.display()))?;

    let stats = depths.stats();
    tracing::info!(
        positions = depths.len(),
        chromosomes = depths.chromosome_count(),
        mean = %Stat(stats.mean),
        median = %Stat(stats.median),
        "loaded per-base depths",
    );
    if depths.is_empty() {
        tracing::warn!(input = %path.display(), "depth file has no records");
    }

    write_global_stats(global_output, &stats)?;
    Ok((depths, stats))
}

pub fn write_global_stats(path: &Path, stats: &DepthStats) -> Result<()> {
    let contents = format!(
        "Mean: {}\nMedian: {}\n",
        Stat(stats.mean),
        Stat(stats.median)
    );
    fs::write(path, contents)
        .with_context(|| format!("failed to write global statistics {}", path.display()))
}
