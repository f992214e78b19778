//! High-level pipeline API: load, clean, bound outliers, summarize.
//!
//! # Example
//!
//! ```rust,ignore
//! use vehicle_ads::pipeline::{analyze_csv, AnalysisOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = analyze_csv(Path::new("vehicles_us.csv"), &AnalysisOptions::default())?;
//!     println!("{} of {} listings kept", report.filter.rows_kept, report.cleaned_rows);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clean::{clean_listings, missing_counts, MissingCount};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::models::{Listing, RawListing};
use crate::outliers::{
    filter_columns, filter_outliers, BandSettings, Column, ColumnBand, FilterMode, QuantileMethod, DEFAULT_IQR_MULTIPLIER,
};
use crate::parser::{parse_bytes, parse_file, ParseResult};
use crate::stats::breakdown::{
    ad_lifetime, popular_types, price_factors, type_summary, AdLifetime, FactorSettings, PriceFactors,
    TypeSummary,
};
use crate::stats::{describe, histogram, Describe, HistogramBin};

/// Options for an analysis run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisOptions {
    /// CSV delimiter (auto-detected when `None`)
    pub delimiter: Option<char>,

    /// Columns bounded for outliers, in order
    pub columns: Vec<Column>,

    /// How the column bands combine
    pub filter_mode: FilterMode,

    /// Quartile method for bands and summaries
    pub quantile_method: QuantileMethod,

    /// k in `[Q1 - k·IQR, Q3 + k·IQR]`
    pub iqr_multiplier: f64,

    /// Bins per histogram
    pub histogram_bins: usize,

    /// days_listed at or above which an ad counts as long-listed
    pub long_listing_days: u32,

    /// Number of most advertised types studied for price factors
    pub top_types: usize,

    /// Minimum ads for a category to appear in a price breakdown
    pub min_category_ads: usize,

    /// Paint colors left out of the price-factor study
    pub excluded_colors: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            columns: Column::DEFAULT_CLEANING.to_vec(),
            filter_mode: FilterMode::default(),
            quantile_method: QuantileMethod::default(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            histogram_bins: 10,
            long_listing_days: 104,
            top_types: 2,
            min_category_ads: 50,
            excluded_colors: vec!["orange".to_string(), "purple".to_string()],
        }
    }
}

impl AnalysisOptions {
    /// Load options from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.columns.is_empty() {
            return Err(PipelineError::Options("no columns to bound".to_string()));
        }
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(PipelineError::Options(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            )));
        }
        if self.histogram_bins == 0 {
            return Err(PipelineError::Options("histogram_bins must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn band_settings(&self) -> BandSettings {
        BandSettings {
            method: self.quantile_method,
            multiplier: self.iqr_multiplier,
        }
    }

    fn factor_settings(&self) -> FactorSettings {
        FactorSettings {
            min_category_ads: self.min_category_ads,
            excluded_colors: self.excluded_colors.clone(),
            band: self.band_settings(),
        }
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Outlier filtering outcome, without the rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSummary {
    pub mode: FilterMode,
    pub settings: BandSettings,
    pub bands: Vec<ColumnBand>,
    pub rows_kept: usize,
}

/// One column before and after dropping its own outliers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReport {
    pub column: Column,
    pub before: Describe,
    pub after: Option<Describe>,
    pub histogram_before: Vec<HistogramBin>,
    pub histogram_after: Vec<HistogramBin>,
}

/// Full analysis output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub csv_info: CsvInfo,
    pub missing_before: Vec<MissingCount>,
    pub cleaned_rows: usize,
    pub filter: FilterSummary,
    pub columns: Vec<ColumnReport>,
    pub ad_lifetime: Option<AdLifetime>,
    pub types: Vec<TypeSummary>,
    pub price_factors: Vec<PriceFactors>,
}

/// Load a listings file and run the full analysis.
pub fn analyze_csv(path: &Path, options: &AnalysisOptions) -> PipelineResult<AnalysisReport> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file(path, options.delimiter)?;
    analyze_parsed(parsed, options)
}

/// Same as [`analyze_csv`] on in-memory bytes.
pub fn analyze_bytes(bytes: &[u8], options: &AnalysisOptions) -> PipelineResult<AnalysisReport> {
    let parsed = parse_bytes(bytes, options.delimiter)?;
    analyze_parsed(parsed, options)
}

/// Load and clean a listings file.
pub fn load_clean(path: &Path, delimiter: Option<char>) -> PipelineResult<(ParseResult, Vec<Listing>)> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file(path, delimiter)?;
    log_parsed(&parsed);
    if parsed.listings.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let listings = clean_logged(&parsed.listings)?;
    Ok((parsed, listings))
}

fn log_parsed(parsed: &ParseResult) {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.listings.len()));
}

fn clean_logged(rows: &[RawListing]) -> PipelineResult<Vec<Listing>> {
    clean_listings(rows).map_err(|e| {
        log_error(format!("Cleaning stopped: {}", e));
        e
    })
}

fn analyze_parsed(parsed: ParseResult, options: &AnalysisOptions) -> PipelineResult<AnalysisReport> {
    options.validate()?;
    log_parsed(&parsed);

    if parsed.listings.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let missing_before = missing_counts(&parsed.listings);
    for m in missing_before.iter().filter(|m| m.missing > 0) {
        log_info_indent(format!("{}: {} missing", m.column, m.missing), 1);
    }

    let listings = clean_logged(&parsed.listings)?;

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.headers,
        row_count: parsed.listings.len(),
    };

    analyze_listings(csv_info, missing_before, &listings, options)
}

/// Bound outliers and summarize already-cleaned listings.
pub fn analyze_listings(
    csv_info: CsvInfo,
    missing_before: Vec<MissingCount>,
    listings: &[Listing],
    options: &AnalysisOptions,
) -> PipelineResult<AnalysisReport> {
    if listings.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let settings = options.band_settings();

    log_info(format!(
        "✂️  Bounding outliers ({:?}) on {} columns...",
        options.filter_mode,
        options.columns.len()
    ));
    let outcome = filter_columns(listings, &options.columns, options.filter_mode, settings)?;
    for b in &outcome.bands {
        log_info_indent(
            format!(
                "{}: band [{}, {}], {} removed",
                b.column, b.band.lower, b.band.upper, b.removed
            ),
            1,
        );
    }
    log_success(format!("{} of {} listings kept", outcome.rows.len(), listings.len()));

    let filtered = &outcome.rows;
    if filtered.is_empty() {
        log_warning("Every listing was filtered out; summaries use the unfiltered table only");
    }

    // each column's "after" view drops only that column's own outliers
    let mut columns = Vec::with_capacity(options.columns.len());
    for &column in &options.columns {
        let before_values = column.values(listings);
        let (own_kept, _) = filter_outliers(listings, column, settings)?;
        let after_values = column.values(&own_kept);
        columns.push(ColumnReport {
            column,
            before: describe(column.name(), &before_values, settings.method)?,
            after: if after_values.is_empty() {
                None
            } else {
                Some(describe(column.name(), &after_values, settings.method)?)
            },
            histogram_before: histogram(&before_values, options.histogram_bins),
            histogram_after: histogram(&after_values, options.histogram_bins),
        });
    }

    let lifetime = if filtered.is_empty() {
        None
    } else {
        Some(ad_lifetime(filtered, options.long_listing_days, settings)?)
    };

    let types = type_summary(filtered);
    let factor_settings = options.factor_settings();
    let mut factors = Vec::new();
    for vehicle_type in popular_types(filtered, options.top_types) {
        log_info(format!("🔎 Price factors for {}", vehicle_type));
        factors.push(price_factors(filtered, &vehicle_type, &factor_settings)?);
    }

    log_success("Analysis complete");

    Ok(AnalysisReport {
        csv_info,
        missing_before,
        cleaned_rows: listings.len(),
        filter: FilterSummary {
            mode: options.filter_mode,
            settings,
            bands: outcome.bands,
            rows_kept: outcome.rows.len(),
        },
        columns,
        ad_lifetime: lifetime,
        types,
        price_factors: factors,
    })
}

pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
