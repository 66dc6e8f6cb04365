//! CSV import/export of routines and tasks.
//!
//! # Responsibility
//! - Serialize routine snapshots into the 9-column interchange layout.
//! - Rebuild routines and tasks from interchange text through the repository.
//! - Read/write interchange files for callers that own a file path.
//!
//! # Invariants
//! - Fields are written verbatim: no quoting, no escaping.
//! - Parsing anomalies (short rows, bad numbers, unknown tokens) never abort
//!   an import; persistence failures always do.
//! - The codec never rolls back; that belongs to the repository owner.

use crate::repo::routine_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;

pub mod csv_codec;
pub mod file;

pub type CsvResult<T> = Result<T, CsvError>;

/// Error for CSV interchange operations.
#[derive(Debug)]
pub enum CsvError {
    /// Persisting imported entities failed. Entities written before the
    /// failure stay uncommitted in the repository.
    ImportFailed(RepoError),
    /// CSV reader/writer failure.
    Csv(csv::Error),
    /// File read/write failure.
    Io(std::io::Error),
    /// Produced or loaded bytes are not UTF-8.
    Utf8(FromUtf8Error),
}

impl Display for CsvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImportFailed(err) => write!(f, "csv import failed: {err}"),
            Self::Csv(err) => write!(f, "csv error: {err}"),
            Self::Io(err) => write!(f, "csv file error: {err}"),
            Self::Utf8(err) => write!(f, "csv text is not valid UTF-8: {err}"),
        }
    }
}

impl Error for CsvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ImportFailed(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Utf8(err) => Some(err),
        }
    }
}

impl From<csv::Error> for CsvError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for CsvError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<FromUtf8Error> for CsvError {
    fn from(value: FromUtf8Error) -> Self {
        Self::Utf8(value)
    }
}
