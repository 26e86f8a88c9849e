//! Errors that occur during writing

use crate::validate::ValidationReport;

/// An error occured while building or writing a table
#[derive(Debug)]
pub enum Error {
    /// The builder was given data it can't represent.
    InvalidInput(&'static str),
    /// A table failed validation.
    ValidationFailed(ValidationReport),
}

impl From<ValidationReport> for Error {
    fn from(report: ValidationReport) -> Self {
        Error::ValidationFailed(report)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Error::ValidationFailed(report) => report.fmt(f),
        }
    }
}

impl std::error::Error for Error {}
