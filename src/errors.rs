use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{FieldName, LineNumber};

/// Position of a line within an input file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// File the line was read from.
    pub path: PathBuf,
    /// One-based line number.
    pub line: LineNumber,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: LineNumber) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Error type for file access, decoding, and record extraction failures.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("cannot access '{}': {source}", path.display())]
    FileAccess { path: PathBuf, source: io::Error },
    #[error("malformed record at {at}: {reason}")]
    Parse { at: Location, reason: String },
    #[error("record at {at} is missing required field '{field}'")]
    MissingField { at: Location, field: FieldName },
    #[error("compressed stream '{}' is corrupt near line {line}: {source}", path.display())]
    Decode {
        path: PathBuf,
        line: LineNumber,
        source: io::Error,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Field lookup failure raised without knowledge of where the record came from.
///
/// Readers attach a [`Location`] via [`FieldError::at`] before surfacing it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("missing field '{0}'")]
    Missing(FieldName),
    #[error("field '{field}' is not {expected}")]
    Type {
        field: FieldName,
        expected: &'static str,
    },
}

impl FieldError {
    /// Promote into a [`ReaderError`] pinned to `at`.
    pub fn at(self, at: Location) -> ReaderError {
        match self {
            FieldError::Missing(field) => ReaderError::MissingField { at, field },
            other @ FieldError::Type { .. } => ReaderError::Parse {
                at,
                reason: other.to_string(),
            },
        }
    }
}
