//! # vehicle-ads - cleaning and exploratory analysis of used-vehicle ads
//!
//! Loads a CSV of vehicle sales ads, fills missing values from group-wise
//! statistics, derives analysis columns, bounds outliers with the IQR rule
//! and summarizes what remains.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│    Clean    │────▶│  Outliers   │────▶│   Report    │
//! │  (ISO/UTF8) │     │  (schema)   │     │(impute+der.)│     │ (IQR bands) │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vehicle_ads::{analyze_csv, AnalysisOptions};
//!
//! fn main() {
//!     let report = analyze_csv("vehicles_us.csv".as_ref(), &AnalysisOptions::default()).unwrap();
//!     println!("Kept {} listings", report.filter.rows_kept);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`logs`] - Pipeline log entries
//! - [`models`] - Listing, RawListing, Condition
//! - [`parser`] - CSV loading with auto-detection
//! - [`clean`] - Imputation and derived columns
//! - [`outliers`] - Quantiles and IQR bands
//! - [`stats`] - Descriptive statistics and grouped breakdowns
//! - [`pipeline`] - End-to-end analysis

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Loading
pub mod parser;

// Cleaning
pub mod clean;

// Analysis
pub mod outliers;
pub mod stats;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, DeriveError, ImputeError, OutlierError, PipelineError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Condition, DateParts, Listing, RawListing, MISSING_TOKENS, REQUIRED_COLUMNS, UNKNOWN_PAINT_COLOR,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes,
    parse_file,
    parse_listings,
    ParseResult,
};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use clean::{
    avg_mileage,
    clean_listings,
    decompose_date,
    fill_paint_color,
    impute,
    missing_counts,
    rank_condition,
    vehicle_age,
    Aggregator,
    GroupKey,
    ImputeTarget,
    MissingCount,
};

// =============================================================================
// Re-exports - Outliers & statistics
// =============================================================================

pub use outliers::{
    filter_columns,
    filter_outliers,
    quantile,
    BandSettings,
    Column,
    ColumnBand,
    FilterMode,
    FilterOutcome,
    IqrBand,
    QuantileMethod,
};

pub use stats::{describe, histogram, Describe, HistogramBin};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    analyze_bytes,
    analyze_csv,
    analyze_listings,
    load_clean,
    AnalysisOptions,
    AnalysisReport,
    CsvInfo,
};
