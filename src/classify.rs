//! Per-position classification for mutation detection and genotyping.
//!
//! A [`Classifier`] turns one [`PositionRecord`] into an [`Outcome`]. All
//! counters are local to the record; the only cross-library step is the
//! mutation-mode consensus, which looks at every library of the same
//! position.

use std::{cmp::Ordering, fmt};

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

use crate::{
    allele::Allele,
    call::{Genotype, LibraryCall, LibraryObservation},
    position::PositionRecord,
};

/// Output mode of the classifier.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Mutation detection: one library carries an allele absent from the rest.
    #[value(name = "m")]
    Mutation,
    /// Genotyping: every library is called independently.
    #[value(name = "g")]
    Genotyping,
}

/// Coverage and percentage cutoffs applied to each position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Minimum total position coverage after downgraded libraries are removed.
    pub min_coverage: u32,
    /// Minimum reads for the minor (or mutant) allele of a heterozygous call.
    pub het_min_coverage: u32,
    /// Minimum percentage for the minor (or mutant) allele of a heterozygous call.
    pub het_min_pct: f64,
    /// Minimum library coverage before a heterozygous call is considered.
    /// Genotyping mode only.
    pub het_min_library_coverage: u32,
    /// Minimum library coverage for a homozygous call.
    pub hom_min_coverage: u32,
    /// Minimum number of libraries left with a call.
    pub min_libraries: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_coverage: 1,
            het_min_coverage: 5,
            het_min_pct: 20.0,
            het_min_library_coverage: 5,
            hom_min_coverage: 2,
            min_libraries: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Zygosity {
    Hom,
    Het,
}

impl fmt::Display for Zygosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hom => f.write_str("hom"),
            Self::Het => f.write_str("het"),
        }
    }
}

/// A candidate mutation: one library carries `mutant`, the others `wild_type`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MutationRow {
    pub chromosome: String,
    pub position: String,
    pub reference: String,
    pub coverage: u32,
    pub wild_type: Allele,
    pub mutant: Allele,
    pub library: String,
    pub zygosity: Zygosity,
    pub wild_type_coverage: u32,
    pub mutant_coverage: u32,
    pub valid_libraries: usize,
}

impl MutationRow {
    /// Combined allele label such as `GA`, with insertions shown as `+`.
    pub fn label(&self) -> String {
        format!("{}{}", self.wild_type.label(), self.mutant.label())
    }

    pub fn combined_coverage(&self) -> u32 {
        self.wild_type_coverage.saturating_add(self.mutant_coverage)
    }

    /// Insertion length tag (`+2`), or `.` when neither allele is an insertion.
    pub fn insertion_annotation(&self) -> String {
        self.wild_type
            .insertion_length()
            .or_else(|| self.mutant.insertion_length())
            .unwrap_or_else(|| String::from("."))
    }
}

impl fmt::Display for MutationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chromosome,
            self.position,
            self.reference,
            self.coverage,
            self.wild_type,
            self.mutant,
            self.library,
            self.zygosity,
            self.wild_type_coverage,
            self.mutant_coverage,
            self.label(),
            self.combined_coverage(),
            self.valid_libraries,
            self.insertion_annotation(),
        )
    }
}

/// A polymorphic position with one resolved call per library.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GenotypeRow {
    pub chromosome: String,
    pub position: String,
    pub reference: String,
    pub coverage: u32,
    pub valid_libraries: usize,
    pub calls: Vec<Genotype>,
}

impl fmt::Display for GenotypeRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.chromosome, self.position, self.reference, self.coverage, self.valid_libraries
        )?;
        for call in &self.calls {
            write!(f, "\t{call}")?;
        }
        Ok(())
    }
}

/// Why a position was filtered out. Not an error.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Rejection {
    /// No unambiguous homozygous consensus allele across libraries.
    AmbiguousConsensus,
    TooFewLibraries { valid: usize },
    LowCoverage { coverage: u32 },
    /// Every called library agrees.
    Monomorphic,
    /// Mutation mode needs exactly two distinct calls.
    AlleleCount(usize),
    /// Neither allele is carried by exactly one library.
    AmbiguousAssignment,
    HeterozygousWildType,
    MutantLacksWildType,
}

impl Rejection {
    /// Rejections recorded in the non-assay table.
    pub fn is_non_assay(&self) -> bool {
        matches!(self, Self::TooFewLibraries { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Mutation(MutationRow),
    Genotype(GenotypeRow),
    Rejected(Rejection),
}

/// Fatal classification errors; these abort the run.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(
        "{chromosome}:{position}: call '{call}' in library {library} matches neither wild type {wild_type} nor mutant {mutant}"
    )]
    AlleleMismatch {
        chromosome: String,
        position: String,
        library: String,
        call: String,
        wild_type: Allele,
        mutant: Allele,
    },
}

#[derive(Debug, Clone)]
pub struct Classifier {
    mode: Mode,
    thresholds: Thresholds,
    libraries: Vec<String>,
}

impl Classifier {
    pub fn new(mode: Mode, thresholds: Thresholds, libraries: Vec<String>) -> Self {
        Self {
            mode,
            thresholds,
            libraries,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn classify(&self, record: &PositionRecord) -> Result<Outcome, ClassifyError> {
        match self.mode {
            Mode::Mutation => self.classify_mutation(record),
            Mode::Genotyping => Ok(self.classify_genotype(record)),
        }
    }

    fn classify_mutation(&self, record: &PositionRecord) -> Result<Outcome, ClassifyError> {
        let common = match consensus(&record.libraries) {
            Some(Genotype::Hom(allele)) => Some(allele),
            Some(_) => None,
            None => return Ok(Outcome::Rejected(Rejection::AmbiguousConsensus)),
        };

        let (calls, coverage) =
            resolve_calls(record, |lib| self.resolve_mutation_call(lib, common.as_ref()));

        let valid = calls.iter().filter(|c| c.is_called()).count();
        if valid < self.thresholds.min_libraries {
            return Ok(Outcome::Rejected(Rejection::TooFewLibraries { valid }));
        }

        let mut distinct: Vec<&Genotype> = Vec::new();
        for call in calls.iter().filter(|c| c.is_called()) {
            if !distinct.contains(&call) {
                distinct.push(call);
            }
        }
        let &[first, second] = distinct.as_slice() else {
            return Ok(Outcome::Rejected(Rejection::AlleleCount(distinct.len())));
        };
        if coverage < self.thresholds.min_coverage {
            return Ok(Outcome::Rejected(Rejection::LowCoverage { coverage }));
        }

        let count = |genotype: &Genotype| calls.iter().filter(|c| *c == genotype).count();
        let (first_n, second_n) = (count(first), count(second));
        let (wild_type, mutant) = if first_n > second_n && second_n == 1 {
            (first, second)
        } else if second_n > first_n && first_n == 1 {
            (second, first)
        } else {
            return Ok(Outcome::Rejected(Rejection::AmbiguousAssignment));
        };

        let Genotype::Hom(wild_type) = wild_type else {
            return Ok(Outcome::Rejected(Rejection::HeterozygousWildType));
        };
        if mutant.is_het() && !mutant.contains(wild_type) {
            return Ok(Outcome::Rejected(Rejection::MutantLacksWildType));
        }

        let Some(index) = calls.iter().position(|c| c == mutant) else {
            return Ok(Outcome::Rejected(Rejection::AmbiguousAssignment));
        };
        let observation = &record.libraries[index];
        let library = self.library_name(index);

        let (zygosity, mutant_allele, wild_type_coverage, mutant_coverage) = match mutant {
            Genotype::Hom(allele) => (Zygosity::Hom, allele.clone(), 0, observation.coverage),
            Genotype::Het(a, b) => {
                let mutant_allele = if a == wild_type { b } else { a };
                let (wt_cov, ma_cov) = het_allele_coverages(observation, wild_type, mutant_allele)
                    .ok_or_else(|| ClassifyError::AlleleMismatch {
                        chromosome: record.chromosome.clone(),
                        position: record.position.clone(),
                        library: library.clone(),
                        call: observation.call.to_string(),
                        wild_type: wild_type.clone(),
                        mutant: mutant_allele.clone(),
                    })?;
                (Zygosity::Het, mutant_allele.clone(), wt_cov, ma_cov)
            }
            Genotype::NoCall => unreachable!("no-calls are excluded from the allele set"),
        };

        Ok(Outcome::Mutation(MutationRow {
            chromosome: record.chromosome.clone(),
            position: record.position.clone(),
            reference: record.reference.clone(),
            coverage,
            wild_type: wild_type.clone(),
            mutant: mutant_allele,
            library,
            zygosity,
            wild_type_coverage,
            mutant_coverage,
            valid_libraries: valid,
        }))
    }

    /// `common` is `None` when no-calls won the consensus vote; no
    /// heterozygous call can then carry the consensus allele.
    fn resolve_mutation_call(&self, lib: &LibraryObservation, common: Option<&Allele>) -> Genotype {
        match &lib.call {
            LibraryCall::NoCall => Genotype::NoCall,
            LibraryCall::Homozygous { allele, .. } => self.resolve_homozygous(lib, allele),
            LibraryCall::Heterozygous {
                first,
                first_pct,
                second,
                second_pct,
            } => {
                let Some(common) = common else {
                    return Genotype::NoCall;
                };
                let (other, other_pct) = if first == common {
                    (second, *second_pct)
                } else if second == common {
                    (first, *first_pct)
                } else {
                    return Genotype::NoCall;
                };
                if self.minor_allele_passes(lib, other_pct) {
                    Genotype::Het(common.clone(), other.clone())
                } else {
                    Genotype::NoCall
                }
            }
        }
    }

    fn classify_genotype(&self, record: &PositionRecord) -> Outcome {
        let (calls, coverage) = resolve_calls(record, |lib| self.resolve_genotype_call(lib));

        let valid = calls.iter().filter(|c| c.is_called()).count();
        if valid < self.thresholds.min_libraries {
            return Outcome::Rejected(Rejection::TooFewLibraries { valid });
        }

        let mut distinct: Vec<Genotype> = calls
            .iter()
            .filter(|c| c.is_called())
            .cloned()
            .map(Genotype::normalized)
            .collect();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < 2 {
            return Outcome::Rejected(Rejection::Monomorphic);
        }
        if coverage < self.thresholds.min_coverage {
            return Outcome::Rejected(Rejection::LowCoverage { coverage });
        }

        Outcome::Genotype(GenotypeRow {
            chromosome: record.chromosome.clone(),
            position: record.position.clone(),
            reference: record.reference.clone(),
            coverage,
            valid_libraries: valid,
            calls,
        })
    }

    fn resolve_genotype_call(&self, lib: &LibraryObservation) -> Genotype {
        match &lib.call {
            LibraryCall::NoCall => Genotype::NoCall,
            LibraryCall::Homozygous { allele, .. } => self.resolve_homozygous(lib, allele),
            LibraryCall::Heterozygous {
                first,
                first_pct,
                second,
                second_pct,
            } => {
                if lib.coverage < self.thresholds.het_min_library_coverage {
                    return Genotype::NoCall;
                }
                let first_cov = lib.allele_coverage(*first_pct);
                let second_cov = lib.allele_coverage(*second_pct);
                let passes = match first_cov.cmp(&second_cov) {
                    Ordering::Greater => self.minor_allele_passes(lib, *second_pct),
                    Ordering::Less => self.minor_allele_passes(lib, *first_pct),
                    Ordering::Equal => {
                        first_cov >= self.thresholds.het_min_coverage
                            && second_cov >= self.thresholds.het_min_coverage
                    }
                };
                if passes {
                    Genotype::Het(first.clone(), second.clone()).normalized()
                } else {
                    Genotype::NoCall
                }
            }
        }
    }

    fn resolve_homozygous(&self, lib: &LibraryObservation, allele: &Allele) -> Genotype {
        if lib.coverage >= self.thresholds.hom_min_coverage {
            Genotype::Hom(allele.clone())
        } else {
            Genotype::NoCall
        }
    }

    fn minor_allele_passes(&self, lib: &LibraryObservation, pct: f64) -> bool {
        lib.allele_coverage(pct) >= self.thresholds.het_min_coverage
            && pct >= self.thresholds.het_min_pct
    }

    fn library_name(&self, index: usize) -> String {
        self.libraries
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("lib{}", index + 1))
    }
}

/// Resolves every library and returns the calls together with the total
/// coverage minus the coverage of libraries that were downgraded to no-call.
fn resolve_calls<F>(record: &PositionRecord, mut resolve: F) -> (Vec<Genotype>, u32)
where
    F: FnMut(&LibraryObservation) -> Genotype,
{
    let mut coverage = record.total_coverage;
    let calls = record
        .libraries
        .iter()
        .map(|lib| {
            let call = resolve(lib);
            if lib.call.is_called() && !call.is_called() {
                coverage = coverage.saturating_sub(lib.coverage);
            }
            call
        })
        .collect();
    (calls, coverage)
}

/// Most common call token across libraries, counted per library and
/// ignoring percentages. A library without data votes `.`, so the result is
/// either a homozygous allele or [`Genotype::NoCall`].
///
/// Returns `None` when the consensus is ambiguous: fewer than two distinct
/// tokens, a tie for first place, a heterozygous winner, or a heterozygous
/// runner-up that does not carry the winning allele.
pub fn consensus(libraries: &[LibraryObservation]) -> Option<Genotype> {
    let mut counts: Vec<(Genotype, usize)> = Vec::new();
    for token in libraries.iter().map(|lib| lib.call.token()) {
        match counts.iter_mut().find(|(seen, _)| *seen == token) {
            Some((_, n)) => *n += 1,
            None => counts.push((token, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let [(top, top_n), (runner_up, runner_up_n), ..] = counts.as_slice() else {
        return None;
    };
    if top_n == runner_up_n || top.is_het() {
        return None;
    }
    let carries_top = match top {
        Genotype::Hom(common) => runner_up.contains(common),
        _ => false,
    };
    if runner_up.is_het() && !carries_top {
        return None;
    }
    Some(top.clone())
}

fn het_allele_coverages(
    observation: &LibraryObservation,
    wild_type: &Allele,
    mutant: &Allele,
) -> Option<(u32, u32)> {
    match &observation.call {
        LibraryCall::Heterozygous {
            first,
            first_pct,
            second,
            second_pct,
        } => {
            let first_cov = observation.allele_coverage(*first_pct);
            let second_cov = observation.allele_coverage(*second_pct);
            if first == wild_type && second == mutant {
                Some((first_cov, second_cov))
            } else if second == wild_type && first == mutant {
                Some((second_cov, first_cov))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::BaseCoverage;

    fn obs(call: &str, coverage: u32) -> LibraryObservation {
        LibraryObservation::new(LibraryCall::parse(call).unwrap(), coverage)
    }

    fn record(total: u32, libraries: Vec<LibraryObservation>) -> PositionRecord {
        PositionRecord {
            chromosome: String::from("chr1"),
            position: String::from("100"),
            reference: String::from("A"),
            total_coverage: total,
            base_coverage: BaseCoverage::default(),
            raw_library_coverages: libraries.iter().map(|lib| lib.coverage.to_string()).collect(),
            libraries,
        }
    }

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("lib{i}")).collect()
    }

    fn mutation(thresholds: Thresholds, n: usize) -> Classifier {
        Classifier::new(Mode::Mutation, thresholds, names(n))
    }

    fn genotyping(thresholds: Thresholds, n: usize) -> Classifier {
        Classifier::new(Mode::Genotyping, thresholds, names(n))
    }

    #[test]
    fn homozygous_mutant_in_one_library() {
        let rec = record(
            38,
            vec![
                obs("A_100", 10),
                obs("A_100", 10),
                obs("A_100", 10),
                obs("T_100", 8),
            ],
        );
        let outcome = mutation(Thresholds::default(), 4).classify(&rec).unwrap();
        let Outcome::Mutation(row) = outcome else {
            panic!("expected a mutation, got {outcome:?}");
        };
        assert_eq!(row.wild_type, Allele::A);
        assert_eq!(row.mutant, Allele::T);
        assert_eq!(row.library, "lib4");
        assert_eq!(row.zygosity, Zygosity::Hom);
        assert_eq!(row.wild_type_coverage, 0);
        assert_eq!(row.mutant_coverage, 8);
        assert_eq!(row.valid_libraries, 4);
        assert_eq!(
            row.to_string(),
            "chr1\t100\tA\t38\tA\tT\tlib4\thom\t0\t8\tAT\t8\t4\t."
        );
    }

    #[test]
    fn heterozygous_mutant_reports_allele_coverages() {
        let rec = record(
            50,
            vec![
                obs("G_100", 10),
                obs("G_100", 10),
                obs("G_100", 10),
                obs("A_40-G_60", 20),
            ],
        );
        let outcome = mutation(Thresholds::default(), 4).classify(&rec).unwrap();
        let Outcome::Mutation(row) = outcome else {
            panic!("expected a mutation, got {outcome:?}");
        };
        assert_eq!(row.wild_type, Allele::G);
        assert_eq!(row.mutant, Allele::A);
        assert_eq!(row.library, "lib4");
        assert_eq!(row.zygosity, Zygosity::Het);
        assert_eq!(row.wild_type_coverage, 12);
        assert_eq!(row.mutant_coverage, 8);
        assert_eq!(row.label(), "GA");
        assert_eq!(row.combined_coverage(), 20);
    }

    #[test]
    fn weak_heterozygous_mutant_is_downgraded() {
        let rec = record(
            40,
            vec![
                obs("G_100", 10),
                obs("G_100", 10),
                obs("G_100", 10),
                obs("A_10-G_90", 10),
            ],
        );
        let outcome = mutation(Thresholds::default(), 4).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::AlleleCount(1)));
    }

    #[test]
    fn insertion_mutant_is_annotated() {
        let rec = record(
            30,
            vec![
                obs("C_100", 10),
                obs("C_100", 10),
                obs("+2AT_100", 10),
            ],
        );
        let outcome = mutation(Thresholds::default(), 3).classify(&rec).unwrap();
        let Outcome::Mutation(row) = outcome else {
            panic!("expected a mutation, got {outcome:?}");
        };
        assert_eq!(row.label(), "C+");
        assert_eq!(row.insertion_annotation(), "+2");
        assert!(row.to_string().ends_with("\tC\t+2AT\tlib3\thom\t0\t10\tC+\t10\t3\t+2"));
    }

    #[test]
    fn insertion_wild_type_keeps_its_token() {
        let rec = record(
            30,
            vec![
                obs("+2AT_100", 10),
                obs("+2AT_100", 10),
                obs("C_100", 10),
            ],
        );
        let outcome = mutation(Thresholds::default(), 3).classify(&rec).unwrap();
        let Outcome::Mutation(row) = outcome else {
            panic!("expected a mutation, got {outcome:?}");
        };
        assert_eq!(
            row.to_string(),
            "chr1\t100\tA\t30\t+2AT\tC\tlib3\thom\t0\t10\t+C\t10\t3\t+2"
        );
    }

    #[test]
    fn heterozygous_wild_type_is_rejected() {
        let rec = record(
            73,
            vec![
                obs("A_100", 10),
                obs("A_100", 1),
                obs("A_100", 1),
                obs("A_100", 1),
                obs("A_50-T_50", 20),
                obs("A_50-T_50", 20),
                obs("A_50-T_50", 20),
            ],
        );
        let outcome = mutation(Thresholds::default(), 7).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::HeterozygousWildType));
    }

    #[test]
    fn heterozygous_mutant_without_wild_type_is_rejected() {
        let rec = record(
            43,
            vec![
                obs("A_100", 1),
                obs("A_100", 1),
                obs("A_100", 1),
                obs("T_100", 10),
                obs("T_100", 10),
                obs("A_50-G_50", 20),
            ],
        );
        let outcome = mutation(Thresholds::default(), 6).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::MutantLacksWildType));
    }

    #[test]
    fn combined_coverage_saturates() {
        let row = MutationRow {
            chromosome: String::from("chr1"),
            position: String::from("1"),
            reference: String::from("A"),
            coverage: 1,
            wild_type: Allele::A,
            mutant: Allele::G,
            library: String::from("lib1"),
            zygosity: Zygosity::Het,
            wild_type_coverage: u32::MAX,
            mutant_coverage: u32::MAX,
            valid_libraries: 3,
        };
        assert_eq!(row.combined_coverage(), u32::MAX);
    }

    #[test]
    fn tied_consensus_is_rejected() {
        let rec = record(
            40,
            vec![
                obs("A_100", 10),
                obs("A_100", 10),
                obs("T_100", 10),
                obs("T_100", 10),
            ],
        );
        let outcome = mutation(Thresholds::default(), 4).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::AmbiguousConsensus));
    }

    #[test]
    fn heterozygous_consensus_is_rejected() {
        let libs = vec![
            obs("A_50-T_50", 10),
            obs("A_50-T_50", 10),
            obs("A_100", 10),
        ];
        assert_eq!(consensus(&libs), None);
    }

    #[test]
    fn unanimous_libraries_have_no_consensus_pair() {
        let libs = vec![obs("A_100", 10), obs("A_100", 10), obs("A_100", 10)];
        assert_eq!(consensus(&libs), None);
        assert_eq!(consensus(&[obs(".", 0), obs(".", 0)]), None);
    }

    #[test]
    fn no_calls_vote_in_the_consensus() {
        let libs = vec![obs("A_100", 10), obs("A_100", 10), obs(".", 0)];
        assert_eq!(consensus(&libs), Some(Genotype::Hom(Allele::A)));

        let libs = vec![obs("A_100", 10), obs(".", 0), obs(".", 0), obs(".", 0)];
        assert_eq!(consensus(&libs), Some(Genotype::NoCall));

        let libs = vec![obs(".", 0), obs(".", 0), obs("A_50-T_50", 10)];
        assert_eq!(consensus(&libs), None);
    }

    #[test]
    fn positions_with_missing_libraries_fall_below_min_libraries() {
        let rec = record(20, vec![obs("A_100", 10), obs("A_100", 10), obs(".", 0)]);
        let outcome = mutation(Thresholds::default(), 3).classify(&rec).unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected(Rejection::TooFewLibraries { valid: 2 })
        );
    }

    #[test]
    fn no_call_consensus_drops_heterozygous_calls() {
        let thresholds = Thresholds {
            min_libraries: 1,
            ..Thresholds::default()
        };
        let rec = record(
            30,
            vec![
                obs("G_100", 10),
                obs(".", 0),
                obs(".", 0),
                obs(".", 0),
                obs("A_50-T_50", 20),
            ],
        );
        let outcome = mutation(thresholds, 5).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::AlleleCount(1)));
    }

    #[test]
    fn two_mutant_libraries_are_ambiguous() {
        let rec = record(
            50,
            vec![
                obs("A_100", 10),
                obs("A_100", 10),
                obs("A_100", 10),
                obs("T_100", 10),
                obs("T_100", 10),
            ],
        );
        let outcome = mutation(Thresholds::default(), 5).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::AmbiguousAssignment));
    }

    #[test]
    fn low_coverage_homozygous_calls_count_against_min_libraries() {
        let rec = record(
            13,
            vec![
                obs("A_100", 10),
                obs("A_100", 1),
                obs("T_100", 2),
            ],
        );
        let outcome = mutation(Thresholds::default(), 3).classify(&rec).unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected(Rejection::TooFewLibraries { valid: 2 })
        );
        assert!(Rejection::TooFewLibraries { valid: 2 }.is_non_assay());
    }

    #[test]
    fn adjusted_coverage_must_reach_min_coverage() {
        let thresholds = Thresholds {
            min_coverage: 31,
            min_libraries: 3,
            ..Thresholds::default()
        };
        let rec = record(
            31,
            vec![
                obs("A_100", 10),
                obs("A_100", 10),
                obs("A_100", 1),
                obs("A_100", 5),
                obs("T_100", 5),
            ],
        );
        let outcome = mutation(thresholds, 5).classify(&rec).unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected(Rejection::LowCoverage { coverage: 30 })
        );
    }

    #[test]
    fn allele_coverages_follow_the_raw_call() {
        let het = obs("A_40-G_60", 20);
        assert_eq!(het_allele_coverages(&het, &Allele::G, &Allele::A), Some((12, 8)));
        assert_eq!(het_allele_coverages(&het, &Allele::A, &Allele::G), Some((8, 12)));
        assert_eq!(het_allele_coverages(&het, &Allele::G, &Allele::T), None);
        assert_eq!(het_allele_coverages(&obs("A_100", 20), &Allele::A, &Allele::G), None);
    }

    #[test]
    fn genotyping_orders_heterozygous_pair_by_priority() {
        let thresholds = Thresholds {
            het_min_coverage: 3,
            het_min_pct: 20.0,
            min_libraries: 2,
            ..Thresholds::default()
        };
        let rec = record(
            20,
            vec![obs("T_40-C_60", 10), obs("C_100", 10)],
        );
        let outcome = genotyping(thresholds, 2).classify(&rec).unwrap();
        let Outcome::Genotype(row) = outcome else {
            panic!("expected a genotype row, got {outcome:?}");
        };
        assert_eq!(row.calls[0].to_string(), "C-T");
        assert_eq!(row.to_string(), "chr1\t100\tA\t20\t2\tC-T\tC");
    }

    #[test]
    fn genotyping_puts_indels_last() {
        let thresholds = Thresholds {
            min_libraries: 2,
            ..Thresholds::default()
        };
        let rec = record(
            20,
            vec![obs("*_50-G_50", 10), obs("G_100", 10)],
        );
        let Outcome::Genotype(row) = genotyping(thresholds, 2).classify(&rec).unwrap() else {
            panic!("expected a genotype row");
        };
        assert_eq!(row.calls[0].to_string(), "G-*");
    }

    #[test]
    fn genotyping_rejects_monomorphic_positions() {
        let rec = record(
            30,
            vec![obs("A_100", 10), obs("A_100", 10), obs("A_100", 10)],
        );
        let outcome = genotyping(Thresholds::default(), 3).classify(&rec).unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::Monomorphic));
    }

    #[test]
    fn genotyping_requires_library_coverage_for_heterozygous_calls() {
        let rec = record(
            24,
            vec![
                obs("A_50-T_50", 4),
                obs("A_100", 10),
                obs("T_100", 10),
            ],
        );
        let outcome = genotyping(Thresholds::default(), 3).classify(&rec).unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected(Rejection::TooFewLibraries { valid: 2 })
        );
    }

    #[test]
    fn genotyping_subtracts_downgraded_coverage() {
        let thresholds = Thresholds {
            min_libraries: 2,
            ..Thresholds::default()
        };
        let rec = record(
            21,
            vec![obs("A_100", 10), obs("T_100", 10), obs("G_100", 1)],
        );
        let Outcome::Genotype(row) = genotyping(thresholds, 3).classify(&rec).unwrap() else {
            panic!("expected a genotype row");
        };
        assert_eq!(row.coverage, 20);
        assert_eq!(row.valid_libraries, 2);
        assert_eq!(row.calls[2], Genotype::NoCall);
    }
}
