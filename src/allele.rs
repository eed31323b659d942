use std::{borrow::Cow, fmt, str::FromStr};

use thiserror::Error;

/// An allele token as written by MAPS part 1.
///
/// Variant order is the genotyping priority: SNP bases first in `A, C, G, T`
/// order, then insertions, then deletions. Sorting a pair of alleles with
/// `Ord` gives the order used for heterozygous genotype calls.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Allele {
    A,
    C,
    G,
    T,
    /// Insertion, keeping the raw token (e.g. `+2AT`).
    Insertion(String),
    Deletion,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid allele token '{0}'")]
pub struct AlleleError(pub String);

impl Allele {
    pub fn is_indel(&self) -> bool {
        matches!(self, Self::Insertion(_) | Self::Deletion)
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, Self::Insertion(_))
    }

    /// Label used in the combined mutation type column, where every
    /// insertion collapses to `+`.
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Self::Insertion(_) => Cow::Borrowed("+"),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Insertion token with the inserted bases removed, e.g. `+2AT` -> `+2`.
    pub fn insertion_length(&self) -> Option<String> {
        match self {
            Self::Insertion(token) => Some(
                token
                    .chars()
                    .filter(|c| !matches!(c, 'A' | 'C' | 'G' | 'T'))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl FromStr for Allele {
    type Err = AlleleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token {
            "A" | "a" => Ok(Self::A),
            "C" | "c" => Ok(Self::C),
            "G" | "g" => Ok(Self::G),
            "T" | "t" => Ok(Self::T),
            "*" => Ok(Self::Deletion),
            t if t.len() > 1 && t.starts_with('+') => Ok(Self::Insertion(t.to_ascii_uppercase())),
            other => Err(AlleleError(other.to_string())),
        }
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::C => f.write_str("C"),
            Self::G => f.write_str("G"),
            Self::T => f.write_str("T"),
            Self::Insertion(token) => f.write_str(token),
            Self::Deletion => f.write_str("*"),
        }
    }
}
