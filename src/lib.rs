#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod allele;
pub mod call;
pub mod classify;
pub mod cli;
pub mod depth;
pub mod filter;
pub mod position;
pub mod report;
pub mod smart_reader;
pub mod stats;
pub mod windows;

pub use aggregate::{DepthConfig, DepthSummary, summarize_depth};
pub use classify::{Classifier, Mode, Outcome, Rejection, Thresholds};
pub use filter::{FilterConfig, FilterSummary, filter_positions};
