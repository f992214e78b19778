//! Domain models for the vehicle-ads pipeline.
//!
//! - [`RawListing`] - one CSV row as loaded, with optional fields still missing
//! - [`Listing`] - a cleaned row: imputed fields filled, derived columns added
//! - [`Condition`] - the closed desirability scale of a vehicle
//! - [`DateParts`] - calendar parts of the posting date

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Header names every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "price",
    "model_year",
    "model",
    "condition",
    "cylinders",
    "fuel",
    "odometer",
    "transmission",
    "type",
    "paint_color",
    "is_4wd",
    "date_posted",
    "days_listed",
];

/// Paint color used when the ad did not state one.
pub const UNKNOWN_PAINT_COLOR: &str = "unknown";

// =============================================================================
// Condition
// =============================================================================

/// Condition of a vehicle, ordered from least to most desirable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    #[serde(rename = "salvage")]
    Salvage,
    #[serde(rename = "fair")]
    Fair,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "like new")]
    LikeNew,
    #[serde(rename = "new")]
    New,
}

impl Condition {
    /// All conditions, least desirable first.
    pub const ALL: [Condition; 6] = [
        Self::Salvage,
        Self::Fair,
        Self::Good,
        Self::Excellent,
        Self::LikeNew,
        Self::New,
    ];

    /// Parse the exact label used in the ads. No trimming or case folding.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "salvage" => Some(Self::Salvage),
            "fair" => Some(Self::Fair),
            "good" => Some(Self::Good),
            "excellent" => Some(Self::Excellent),
            "like new" => Some(Self::LikeNew),
            "new" => Some(Self::New),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Salvage => "salvage",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
            Self::LikeNew => "like new",
            Self::New => "new",
        }
    }

    /// Rank on the desirability scale: salvage = 0 ... new = 5.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Salvage => 0,
            Self::Fair => 1,
            Self::Good => 2,
            Self::Excellent => 3,
            Self::LikeNew => 4,
            Self::New => 5,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Raw Listing
// =============================================================================

/// One ad as read from the CSV file.
///
/// Fields that may be blank in the source are `Option`s. `model_year` and
/// `cylinders` are read as floats because exports write them as `2011.0`.
/// Blank cells, [`MISSING_TOKENS`] and non-finite numbers all load as `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    /// 1-based line number in the source file (header is line 1).
    #[serde(skip)]
    pub line: u64,
    pub price: u64,
    #[serde(deserialize_with = "deserialize_number")]
    pub model_year: Option<f64>,
    pub model: String,
    pub condition: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub cylinders: Option<f64>,
    pub fuel: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub odometer: Option<f64>,
    pub transmission: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub paint_color: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_4wd: Option<bool>,
    pub date_posted: String,
    pub days_listed: u32,
}

/// Cell values that mean "no value", as spreadsheet and dataframe exports
/// write them.
pub const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.contains(&cell)
}

/// Raw cell, trimmed, or `None` when it holds no value.
fn present_cell<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !is_missing(cell)))
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(cell) = present_cell(deserializer)? else {
        return Ok(None);
    };
    let value: f64 = cell
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid number '{}'", cell)))?;
    Ok(value.is_finite().then_some(value))
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    present_cell(deserializer)
}

/// Accepts `1`, `1.0`, `true` / `0`, `0.0`, `false`; blank is missing.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match present_cell(deserializer)?.as_deref() {
        None => Ok(None),
        Some("1") | Some("1.0") | Some("true") | Some("True") => Ok(Some(true)),
        Some("0") | Some("0.0") | Some("false") | Some("False") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid is_4wd flag '{}'",
            other
        ))),
    }
}

// =============================================================================
// Derived values
// =============================================================================

/// Calendar parts of `date_posted`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateParts {
    pub date: NaiveDate,
    /// 0 = Monday ... 6 = Sunday
    pub weekday: u32,
    pub day_of_month: u32,
    /// 1-based ordinal day
    pub day_of_year: u32,
    pub year: i32,
}

/// A cleaned listing: no missing values in the imputed fields, plus
/// derived columns. Flat so it can be written back out as CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub price: u64,
    pub model_year: i32,
    pub model: String,
    pub condition: Condition,
    pub condition_id: u8,
    pub cylinders: i32,
    pub fuel: String,
    pub odometer: f64,
    pub transmission: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub paint_color: String,
    pub is_4wd: Option<bool>,
    pub date_posted: NaiveDate,
    pub days_listed: u32,
    pub weekday: u32,
    pub day_of_month: u32,
    pub day_of_year: u32,
    pub year: i32,
    pub age_of_the_vehicle: i32,
    pub avg_mileage: f64,
}
