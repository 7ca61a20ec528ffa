//! Error types.
//!
//! - `PipelineError`: typed failures of the load/filter/aggregate pipeline.
//!   These are recoverable: the TUI turns them into a status message and keeps
//!   the previous table and selections.
//! - `AppError`: process-level error carrying the exit code used by `main`.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{IdentifierField, MeasurementFamily};

/// Failures of the data pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The input file is missing, unreadable, or does not parse as a table.
    #[error("Failed to read '{}': {message}", path.display())]
    FileRead { path: PathBuf, message: String },

    /// One or more required identifier columns are absent (canonical order).
    #[error("Missing required columns: {}", format_list(missing))]
    MissingColumns { missing: Vec<String> },

    /// No `*_sales` or no `*_restocks` columns were found.
    #[error("No `*_{family}` columns found in the header.")]
    MissingMeasurementFamily { family: MeasurementFamily },

    /// The current filters eliminated every row.
    #[error("No matching data. Adjust the filters or the date range.")]
    EmptyResult,

    /// Filter values given up front that never occur in the loaded table.
    #[error("Unknown {field} value(s): {}. Not present in the loaded file.", format_list(values))]
    UnknownValues {
        field: IdentifierField,
        values: Vec<String>,
    },

    /// The requested date range is inverted or outside the data's bounds.
    #[error("Invalid date range {start}..{end}: {reason}")]
    DateRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    /// Writing an export file failed.
    #[error("Failed to write '{}': {message}", path.display())]
    Export { path: PathBuf, message: String },
}

impl PipelineError {
    /// Exit code used when this error reaches the process boundary.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::EmptyResult => 3,
            _ => 2,
        }
    }
}

fn format_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("`{s}`")).collect();
    quoted.join(", ")
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
