use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    classify::{Classifier, Mode, Outcome, Rejection, Thresholds},
    position::{Header, PositionRecord, Reader},
    smart_reader::open_input,
};

/// Configuration required to drive one filtering run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    pub thresholds: Thresholds,
}

impl FilterConfig {
    /// `non-assay-<input name>`, next to the input.
    pub fn non_assay_path(&self) -> PathBuf {
        non_assay_path(&self.input)
    }
}

pub fn non_assay_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("non-assay-{name}"))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterSummary {
    pub total_records: usize,
    pub emitted_records: usize,
    pub non_assay_records: usize,
    pub ambiguous_consensus: usize,
    pub low_coverage: usize,
    pub monomorphic: usize,
    pub wrong_allele_count: usize,
    pub ambiguous_assignment: usize,
    pub heterozygous_wild_type: usize,
    pub mutant_lacks_wild_type: usize,
    pub parse_errors: usize,
}

impl FilterSummary {
    pub fn record_rejection(&mut self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::AmbiguousConsensus => &mut self.ambiguous_consensus,
            Rejection::TooFewLibraries { .. } => &mut self.non_assay_records,
            Rejection::LowCoverage { .. } => &mut self.low_coverage,
            Rejection::Monomorphic => &mut self.monomorphic,
            Rejection::AlleleCount(_) => &mut self.wrong_allele_count,
            Rejection::AmbiguousAssignment => &mut self.ambiguous_assignment,
            Rejection::HeterozygousWildType => &mut self.heterozygous_wild_type,
            Rejection::MutantLacksWildType => &mut self.mutant_lacks_wild_type,
        };
        *counter += 1;
    }

    pub fn rejected_records(&self) -> usize {
        self.non_assay_records
            + self.ambiguous_consensus
            + self.low_coverage
            + self.monomorphic
            + self.wrong_allele_count
            + self.ambiguous_assignment
            + self.heterozygous_wild_type
            + self.mutant_lacks_wild_type
    }
}

/// Column names following the four leading columns in mutation mode.
const MUTATION_COLUMNS: [&str; 10] = [
    "WT", "MA", "Lib", "Ho/He", "WTCov", "MACov", "Type", "LCov", "#libs", "InsertType",
];

fn output_header(header: &Header, mode: Mode) -> String {
    let mut columns: Vec<&str> = header.leading.iter().map(String::as_str).collect();
    match mode {
        Mode::Mutation => columns.extend(MUTATION_COLUMNS),
        Mode::Genotyping => {
            columns.push("#Libs");
            columns.extend(header.libraries.iter().map(String::as_str));
        }
    }
    columns.join("\t")
}

fn write_non_assay<W: Write>(writer: &mut W, record: &PositionRecord) -> std::io::Result<()> {
    let coverages: Vec<&str> = record.library_coverages().collect();
    writeln!(writer, "{}", coverages.join("\t"))
}

/// Filter a MAPS part 1 position table into a mutation or genotyping table.
pub fn filter_positions(config: &FilterConfig) -> Result<FilterSummary> {
    let non_assay = config.non_assay_path();
    tracing::info!(
        mode = ?config.mode,
        input = %config.input.display(),
        output = %config.output.display(),
        non_assay = %non_assay.display(),
        thresholds = ?config.thresholds,
        "starting position filtering",
    );

    let input = open_input(&config.input)
        .with_context(|| format!("failed to open input {}", config.input.display()))?;
    let mut reader = Reader::new(input);
    let header = reader
        .read_header()
        .with_context(|| format!("failed to read header of {}", config.input.display()))?;
    tracing::debug!(libraries = ?header.libraries, "read position table header");

    let mut output = File::create(&config.output)
        .map(BufWriter::new)
        .with_context(|| format!("failed to create output {}", config.output.display()))?;
    let mut rejects = File::create(&non_assay)
        .map(BufWriter::new)
        .with_context(|| format!("failed to create non-assay table {}", non_assay.display()))?;

    writeln!(output, "{}", output_header(&header, config.mode))
        .context("failed to write output header")?;
    writeln!(rejects, "{}", header.libraries.join("\t"))
        .context("failed to write non-assay header")?;

    let classifier = Classifier::new(config.mode, config.thresholds, header.libraries);
    let mut summary = FilterSummary::default();

    for result in reader {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                summary.parse_errors += 1;
                tracing::warn!(error = %e, "skipping malformed input line");
                continue;
            }
        };
        summary.total_records += 1;

        let outcome = classifier.classify(&record).with_context(|| {
            format!(
                "inconsistent wild type/mutant assignment in {}",
                config.input.display()
            )
        })?;

        match outcome {
            Outcome::Mutation(row) => {
                writeln!(output, "{row}").context("failed to write mutation row")?;
                summary.emitted_records += 1;
            }
            Outcome::Genotype(row) => {
                writeln!(output, "{row}").context("failed to write genotype row")?;
                summary.emitted_records += 1;
            }
            Outcome::Rejected(rejection) => {
                tracing::trace!(
                    chromosome = %record.chromosome,
                    position = %record.position,
                    ?rejection,
                    "position rejected",
                );
                if rejection.is_non_assay() {
                    write_non_assay(&mut rejects, &record)
                        .context("failed to write non-assay row")?;
                }
                summary.record_rejection(rejection);
            }
        }
    }

    output
        .flush()
        .with_context(|| format!("failed to write output {}", config.output.display()))?;
    rejects
        .flush()
        .with_context(|| format!("failed to write non-assay table {}", non_assay.display()))?;

    tracing::info!(
        total = summary.total_records,
        emitted = summary.emitted_records,
        rejected = summary.rejected_records(),
        non_assay = summary.non_assay_records,
        parse_errors = summary.parse_errors,
        "finished position filtering",
    );
    Ok(summary)
}
