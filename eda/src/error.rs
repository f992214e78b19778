//! Error types for the vehicle-ads cleaning and analysis pipeline.
//!
//! Each stage has its own error enum:
//!
//! - [`CsvError`] - loading and schema errors
//! - [`ImputeError`] - group-wise imputation errors
//! - [`DeriveError`] - condition lookup and date parsing errors
//! - [`OutlierError`] - quantile / band computation errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use thiserror::Error;

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors while loading the listings file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content as {encoding}")]
    EncodingError { encoding: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// An expected column is absent from the header row.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A data row could not be read into a listing.
    #[error("Line {line}: {message}")]
    ParseError { line: u64, message: String },
}

// =============================================================================
// Imputation Errors
// =============================================================================

/// Errors during group-wise imputation.
#[derive(Debug, Error, PartialEq)]
pub enum ImputeError {
    /// A group has missing values but nothing to impute them from.
    #[error("Cannot impute '{target}': group {group_key}='{group}' has no non-missing value")]
    EmptyGroup {
        group_key: String,
        group: String,
        target: String,
    },

    /// The grouping column itself is missing on a row.
    #[error("Line {line}: cannot impute '{target}', grouping column '{group_key}' is missing")]
    MissingGroupKey {
        line: u64,
        group_key: String,
        target: String,
    },

    /// A value is still missing after its imputation step ran.
    #[error("Line {line}: '{target}' is still missing after imputation")]
    Unfilled { line: u64, target: String },

    /// A filled value could not be coerced to an integer column.
    #[error("Line {line}: value {value} of '{target}' is not an integer")]
    NonIntegral {
        line: u64,
        target: String,
        value: f64,
    },
}

// =============================================================================
// Derivation Errors
// =============================================================================

/// Errors while computing derived columns.
#[derive(Debug, Error, PartialEq)]
pub enum DeriveError {
    /// Condition label outside the fixed desirability scale.
    #[error("Line {line}: unknown condition '{value}'")]
    UnknownCondition { line: u64, value: String },

    /// `date_posted` missing or not in `YYYY-MM-DD` form.
    #[error("Line {line}: invalid date_posted '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { line: u64, value: String },
}

// =============================================================================
// Outlier Errors
// =============================================================================

/// Errors while bounding outliers.
#[derive(Debug, Error, PartialEq)]
pub enum OutlierError {
    /// No values to compute quartiles on.
    #[error("Column '{0}' has no values")]
    EmptyColumn(String),

    /// Quantile outside [0, 1].
    #[error("Quantile {0} is outside [0, 1]")]
    InvalidQuantile(f64),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::analyze_csv`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV loading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Imputation error.
    #[error("Imputation error: {0}")]
    Impute(#[from] ImputeError),

    /// Derivation error.
    #[error("Derivation error: {0}")]
    Derive(#[from] DeriveError),

    /// Outlier error.
    #[error("Outlier error: {0}")]
    Outlier(#[from] OutlierError),

    /// Invalid analysis options.
    #[error("Invalid options: {0}")]
    Options(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error outside of CSV loading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No listings to analyze.
    #[error("No listings to analyze")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for imputation.
pub type ImputeResult<T> = Result<T, ImputeError>;

/// Result type for derivations.
pub type DeriveResult<T> = Result<T, DeriveError>;

/// Result type for outlier bounding.
pub type OutlierResult<T> = Result<T, OutlierError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
