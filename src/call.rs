//! Per-library base calls.
//!
//! MAPS part 1 writes each library's call as `.`, `BASE_PCT` or
//! `BASE1_PCT1-BASE2_PCT2`. Those strings are decoded once into
//! [`LibraryCall`]; everything downstream works on the tagged form and
//! produces a resolved [`Genotype`].

use std::{fmt, num::ParseFloatError};

use thiserror::Error;

use crate::allele::{Allele, AlleleError};

/// A library call as reported by part 1, before any thresholds apply.
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryCall {
    NoCall,
    Homozygous {
        allele: Allele,
        pct: f64,
    },
    Heterozygous {
        first: Allele,
        first_pct: f64,
        second: Allele,
        second_pct: f64,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CallError {
    #[error("empty call")]
    Empty,
    #[error("expected ALLELE_PCT, found '{0}'")]
    MissingPercentage(String),
    #[error("invalid percentage '{token}': {source}")]
    InvalidPercentage {
        token: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("percentage {0} is outside 0-100")]
    PercentageOutOfRange(f64),
    #[error(transparent)]
    Allele(#[from] AlleleError),
}

impl LibraryCall {
    pub fn parse(raw: &str) -> Result<Self, CallError> {
        let raw = raw.trim();
        match raw {
            "" => Err(CallError::Empty),
            "." => Ok(Self::NoCall),
            _ => match raw.split_once('-') {
                Some((first, second)) => {
                    let (first, first_pct) = parse_allele_pct(first)?;
                    let (second, second_pct) = parse_allele_pct(second)?;
                    Ok(Self::Heterozygous {
                        first,
                        first_pct,
                        second,
                        second_pct,
                    })
                }
                None => {
                    let (allele, pct) = parse_allele_pct(raw)?;
                    Ok(Self::Homozygous { allele, pct })
                }
            },
        }
    }

    pub fn is_called(&self) -> bool {
        !matches!(self, Self::NoCall)
    }

    /// The call with percentages dropped, in the order part 1 wrote it.
    pub fn token(&self) -> Genotype {
        match self {
            Self::NoCall => Genotype::NoCall,
            Self::Homozygous { allele, .. } => Genotype::Hom(allele.clone()),
            Self::Heterozygous { first, second, .. } => Genotype::Het(first.clone(), second.clone()),
        }
    }
}

fn parse_allele_pct(token: &str) -> Result<(Allele, f64), CallError> {
    let (allele, pct) = token
        .split_once('_')
        .ok_or_else(|| CallError::MissingPercentage(token.to_string()))?;
    let pct = pct
        .trim()
        .parse::<f64>()
        .map_err(|source| CallError::InvalidPercentage {
            token: pct.to_string(),
            source,
        })?;
    if !(0.0..=100.0).contains(&pct) {
        return Err(CallError::PercentageOutOfRange(pct));
    }
    Ok((allele.parse()?, pct))
}

impl fmt::Display for LibraryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCall => f.write_str("."),
            Self::Homozygous { allele, pct } => write!(f, "{allele}_{pct}"),
            Self::Heterozygous {
                first,
                first_pct,
                second,
                second_pct,
            } => write!(f, "{first}_{first_pct}-{second}_{second_pct}"),
        }
    }
}

/// A library call paired with that library's coverage at the position.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryObservation {
    pub call: LibraryCall,
    pub coverage: u32,
}

impl LibraryObservation {
    pub fn new(call: LibraryCall, coverage: u32) -> Self {
        Self { call, coverage }
    }

    /// Reads supporting an allele seen at `pct` percent of this library.
    pub fn allele_coverage(&self, pct: f64) -> u32 {
        (pct / 100.0 * f64::from(self.coverage)).round() as u32
    }
}

/// A library call after thresholds have been applied.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Genotype {
    NoCall,
    Hom(Allele),
    Het(Allele, Allele),
}

impl Genotype {
    pub fn is_called(&self) -> bool {
        !matches!(self, Self::NoCall)
    }

    pub fn is_het(&self) -> bool {
        matches!(self, Self::Het(..))
    }

    pub fn contains(&self, allele: &Allele) -> bool {
        match self {
            Self::NoCall => false,
            Self::Hom(a) => a == allele,
            Self::Het(a, b) => a == allele || b == allele,
        }
    }

    /// Heterozygous pairs in allele order, so `T-C` and `C-T` compare equal.
    pub fn normalized(self) -> Self {
        match self {
            Self::Het(a, b) if b < a => Self::Het(b, a),
            other => other,
        }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCall => f.write_str("."),
            Self::Hom(allele) => write!(f, "{allele}"),
            Self::Het(a, b) => write!(f, "{a}-{b}"),
        }
    }
}
