//! Mean and median over depth values.

use std::fmt;

/// Marker written when a statistic has no data.
pub const MISSING: &str = "NA";

/// Mean and median of a set of depths; `None` when the set was empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl DepthStats {
    pub fn from_depths(depths: &[u32]) -> Self {
        Self {
            mean: mean(depths),
            median: median(depths),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_none()
    }
}

pub fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    Some(sum as f64 / values.len() as f64)
}

pub fn median(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0)
    } else {
        Some(f64::from(sorted[mid]))
    }
}

/// Formats a statistic for the text outputs: shortest round-trip decimal,
/// or `NA`.
pub struct Stat(pub Option<f64>);

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str(MISSING),
        }
    }
}
