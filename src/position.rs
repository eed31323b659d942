use std::{
    io::{self, BufRead},
    num::ParseIntError,
};

use thiserror::Error;

use crate::call::{CallError, LibraryCall, LibraryObservation};

/// Column holding the first library call; everything before it is fixed.
pub const FIRST_LIBRARY_COLUMN: usize = 16;

/// Header of a MAPS part 1 position table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    /// Names of the chrom, pos, ref and coverage columns, reused in outputs.
    pub leading: Vec<String>,
    pub libraries: Vec<String>,
}

impl Header {
    pub fn parse(line: &str) -> Result<Self, ParseErrorKind> {
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() < 4 {
            return Err(ParseErrorKind::FieldCount {
                expected: 4,
                found: fields.len(),
            });
        }

        let libraries = fields
            .iter()
            .skip(FIRST_LIBRARY_COLUMN)
            .step_by(2)
            .map(|column| library_name(column))
            .collect();

        Ok(Self {
            leading: fields[..4].iter().map(|s| s.to_string()).collect(),
            libraries,
        })
    }
}

/// Library name from a call column header: the prefix up to the first `-`
/// is dropped and the remaining pieces are joined (`Call-lib-1` -> `lib1`).
pub fn library_name(column: &str) -> String {
    match column.split_once('-') {
        Some((_, rest)) => rest.split('-').collect(),
        None => column.to_string(),
    }
}

/// Aggregate coverage per base category from columns 4-15.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BaseCoverage {
    pub a: u32,
    pub t: u32,
    pub c: u32,
    pub g: u32,
    pub deletion: u32,
    pub insertion: u32,
}

impl BaseCoverage {
    pub fn total(&self) -> u32 {
        self.a + self.t + self.c + self.g + self.deletion + self.insertion
    }
}

/// One candidate position from MAPS part 1.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionRecord {
    pub chromosome: String,
    /// Position text as written in the input.
    pub position: String,
    pub reference: String,
    pub total_coverage: u32,
    pub base_coverage: BaseCoverage,
    pub libraries: Vec<LibraryObservation>,
    /// Library coverage columns exactly as they appeared in the input.
    pub raw_library_coverages: Vec<String>,
}

impl PositionRecord {
    /// Library coverage columns, as written to the non-assay table.
    pub fn library_coverages(&self) -> impl Iterator<Item = &str> + '_ {
        self.raw_library_coverages.iter().map(String::as_str)
    }
}

/// Iterator over the data rows of a position table.
///
/// The header must be consumed with [`Reader::read_header`] first; once it
/// is, every row is checked against the header's library count.
pub struct Reader<R> {
    inner: R,
    line: u64,
    buf: String,
    libraries: Option<usize>,
}

impl<R> Reader<R>
where
    R: BufRead,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: String::new(),
            libraries: None,
        }
    }

    pub fn read_header(&mut self) -> Result<Header, ParseError> {
        self.buf.clear();
        let read = self.inner.read_line(&mut self.buf).map_err(|e| ParseError {
            line: self.line + 1,
            raw: String::new(),
            kind: ParseErrorKind::Io(e),
        })?;
        self.line += 1;
        if read == 0 {
            return Err(ParseError {
                line: self.line,
                raw: String::new(),
                kind: ParseErrorKind::MissingHeader,
            });
        }

        let header = Header::parse(&self.buf).map_err(|kind| ParseError {
            line: self.line,
            raw: self.buf.trim_end().to_string(),
            kind,
        })?;
        self.libraries = Some(header.libraries.len());
        Ok(header)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Iterator for Reader<R>
where
    R: BufRead,
{
    type Item = Result<PositionRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let trimmed = self.buf.trim_end_matches(['\n', '\r']);
                    if trimmed.trim().is_empty() {
                        continue;
                    }

                    return Some(parse_record(trimmed, self.libraries).map_err(|kind| {
                        ParseError {
                            line: self.line,
                            raw: trimmed.to_string(),
                            kind,
                        }
                    }));
                }
                Err(e) => {
                    return Some(Err(ParseError {
                        line: self.line,
                        raw: String::new(),
                        kind: ParseErrorKind::Io(e),
                    }));
                }
            }
        }
    }
}

/// Errors that can arise while parsing a position table row.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: u64,
    pub raw: String,
    #[source]
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("input is empty, expected a header line")]
    MissingHeader,
    #[error("expected at least {expected} tab-delimited fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("library columns are not paired ({0} trailing fields)")]
    UnpairedLibraryColumns(usize),
    #[error("expected {expected} libraries from the header, found {found}")]
    LibraryCount { expected: usize, found: usize },
    #[error("invalid position: {0}")]
    InvalidPosition(ParseIntError),
    #[error("invalid coverage in column {column}: {source}")]
    InvalidCoverage {
        column: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid call in column {column}: {source}")]
    InvalidCall {
        column: usize,
        #[source]
        source: CallError,
    },
}

fn parse_record(line: &str, libraries: Option<usize>) -> Result<PositionRecord, ParseErrorKind> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < FIRST_LIBRARY_COLUMN {
        return Err(ParseErrorKind::FieldCount {
            expected: FIRST_LIBRARY_COLUMN,
            found: fields.len(),
        });
    }

    let library_fields = &fields[FIRST_LIBRARY_COLUMN..];
    if library_fields.len() % 2 != 0 {
        return Err(ParseErrorKind::UnpairedLibraryColumns(library_fields.len()));
    }
    if let Some(expected) = libraries
        && expected != library_fields.len() / 2
    {
        return Err(ParseErrorKind::LibraryCount {
            expected,
            found: library_fields.len() / 2,
        });
    }

    fields[1]
        .trim()
        .parse::<u64>()
        .map_err(ParseErrorKind::InvalidPosition)?;
    let total_coverage = parse_coverage(&fields, 3)?;

    let base_coverage = BaseCoverage {
        a: parse_coverage(&fields, 5)?,
        t: parse_coverage(&fields, 7)?,
        c: parse_coverage(&fields, 9)?,
        g: parse_coverage(&fields, 11)?,
        deletion: parse_coverage(&fields, 13)?,
        insertion: parse_coverage(&fields, 15)?,
    };

    let libraries = (FIRST_LIBRARY_COLUMN..fields.len())
        .step_by(2)
        .map(|column| {
            let call = LibraryCall::parse(fields[column])
                .map_err(|source| ParseErrorKind::InvalidCall { column, source })?;
            let coverage = parse_coverage(&fields, column + 1)?;
            Ok(LibraryObservation::new(call, coverage))
        })
        .collect::<Result<Vec<_>, ParseErrorKind>>()?;

    let raw_library_coverages = library_fields
        .iter()
        .skip(1)
        .step_by(2)
        .map(|s| s.to_string())
        .collect();

    Ok(PositionRecord {
        chromosome: fields[0].to_string(),
        position: fields[1].to_string(),
        reference: fields[2].to_string(),
        total_coverage,
        base_coverage,
        libraries,
        raw_library_coverages,
    })
}

fn parse_coverage(fields: &[&str], column: usize) -> Result<u32, ParseErrorKind> {
    fields[column]
        .trim()
        .parse::<u32>()
        .map_err(|source| ParseErrorKind::InvalidCoverage { column, source })
}
