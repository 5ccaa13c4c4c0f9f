//! Error types for ingestion, reporting and the CLI.
//!
//! The allocation engine itself never fails; only the collaborators around it
//! return these.

use thiserror::Error;

/// Result type alias for fallible operations
pub type Result<T> = std::result::Result<T, WaterfallError>;

#[derive(Error, Debug)]
pub enum WaterfallError {
    /// Failed to open or read an input sheet
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV structure
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open or decode the workbook
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Failed to write the result document
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A sheet is missing a column the engine cannot run without
    #[error("Configuration error in {sheet} sheet: {message}")]
    Configuration { sheet: &'static str, message: String },

    /// Missing input file arguments
    #[error(
        "Missing input file argument. Usage: repayment-waterfall [--route-unreferenced] <workbook.xlsx> | <repayments.csv> <batches.csv>"
    )]
    MissingArgument,

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Unknown flag: {0}")]
    UnknownFlag(String),
}
