//! Interquartile-range outlier bounding.
//!
//! A column's inlier band is `[Q1 - k·IQR, Q3 + k·IQR]` with `k = 1.5` by
//! default. Bounds are inclusive. Filtering never mutates its input: every
//! operation returns a new `Vec<Listing>`.
//!
//! # Multi-column filtering
//!
//! ```text
//! Independent: bands for every column computed on the input table,
//!              a row is kept when it sits inside all of them.
//! Sequential:  column N's band is computed on the rows column N-1 kept,
//!              so filters compound.
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{OutlierError, OutlierResult};
use crate::models::Listing;

/// Default IQR multiplier for the inlier band.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

// =============================================================================
// Quantiles
// =============================================================================

/// How a quantile falling between two data points is resolved.
///
/// The position of quantile `q` in the sorted data is `(n - 1) · q`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuantileMethod {
    /// Value at the floor of the position.
    #[default]
    Lower,
    /// Value at the ceiling of the position.
    Higher,
    /// Linear interpolation between the two neighbours.
    Linear,
    /// Closest neighbour; exact halves go to the even index.
    Nearest,
    /// Mean of the two neighbours.
    Midpoint,
}

impl FromStr for QuantileMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lower" => Ok(Self::Lower),
            "higher" => Ok(Self::Higher),
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            "midpoint" => Ok(Self::Midpoint),
            other => Err(format!(
                "unknown quantile method '{}' (expected lower, higher, linear, nearest or midpoint)",
                other
            )),
        }
    }
}

/// Quantile `q` (in `[0, 1]`) of `values`.
pub fn quantile(values: &[f64], q: f64, method: QuantileMethod) -> OutlierResult<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(OutlierError::InvalidQuantile(q));
    }
    if values.is_empty() {
        return Err(OutlierError::EmptyColumn(String::new()));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    let value = match method {
        QuantileMethod::Lower => sorted[lo],
        QuantileMethod::Higher => sorted[hi],
        QuantileMethod::Linear => sorted[lo] + (sorted[hi] - sorted[lo]) * frac,
        QuantileMethod::Midpoint => (sorted[lo] + sorted[hi]) / 2.0,
        QuantileMethod::Nearest => {
            let idx = if frac < 0.5 {
                lo
            } else if frac > 0.5 {
                hi
            } else if lo % 2 == 0 {
                lo
            } else {
                hi
            };
            sorted[idx]
        }
    };

    Ok(value)
}

// =============================================================================
// Columns
// =============================================================================

/// Numeric columns of a cleaned listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Price,
    ModelYear,
    Cylinders,
    Odometer,
    DaysListed,
    ConditionId,
    AgeOfTheVehicle,
    AvgMileage,
    Weekday,
    DayOfMonth,
    DayOfYear,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Self::Price,
        Self::ModelYear,
        Self::Cylinders,
        Self::Odometer,
        Self::DaysListed,
        Self::ConditionId,
        Self::AgeOfTheVehicle,
        Self::AvgMileage,
        Self::Weekday,
        Self::DayOfMonth,
        Self::DayOfYear,
    ];

    /// Columns cleaned of outliers by default, in filtering order.
    pub const DEFAULT_CLEANING: [Column; 6] = [
        Self::AgeOfTheVehicle,
        Self::Price,
        Self::ConditionId,
        Self::Odometer,
        Self::Cylinders,
        Self::DaysListed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::ModelYear => "model_year",
            Self::Cylinders => "cylinders",
            Self::Odometer => "odometer",
            Self::DaysListed => "days_listed",
            Self::ConditionId => "condition_id",
            Self::AgeOfTheVehicle => "age_of_the_vehicle",
            Self::AvgMileage => "avg_mileage",
            Self::Weekday => "weekday",
            Self::DayOfMonth => "day_of_month",
            Self::DayOfYear => "day_of_year",
        }
    }

    pub fn value(&self, listing: &Listing) -> f64 {
        match self {
            Self::Price => listing.price as f64,
            Self::ModelYear => listing.model_year as f64,
            Self::Cylinders => listing.cylinders as f64,
            Self::Odometer => listing.odometer,
            Self::DaysListed => listing.days_listed as f64,
            Self::ConditionId => listing.condition_id as f64,
            Self::AgeOfTheVehicle => listing.age_of_the_vehicle as f64,
            Self::AvgMileage => listing.avg_mileage,
            Self::Weekday => listing.weekday as f64,
            Self::DayOfMonth => listing.day_of_month as f64,
            Self::DayOfYear => listing.day_of_year as f64,
        }
    }

    /// The column's values over `rows`, in row order.
    pub fn values(&self, rows: &[Listing]) -> Vec<f64> {
        rows.iter().map(|l| self.value(l)).collect()
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the notebook-era names of the imputed columns too
        let name = s.trim().trim_end_matches("_noempty");
        Column::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| format!("unknown numeric column '{}'", s))
    }
}

// =============================================================================
// Bands
// =============================================================================

/// Settings shared by every band computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BandSettings {
    pub method: QuantileMethod,
    pub multiplier: f64,
}

impl Default for BandSettings {
    fn default() -> Self {
        Self {
            method: QuantileMethod::default(),
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

/// Inlier band of one column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IqrBand {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBand {
    pub fn from_values(values: &[f64], settings: BandSettings) -> OutlierResult<Self> {
        let q1 = quantile(values, 0.25, settings.method)?;
        let q3 = quantile(values, 0.75, settings.method)?;
        let iqr = q3 - q1;
        Ok(Self {
            q1,
            q3,
            iqr,
            lower: q1 - settings.multiplier * iqr,
            upper: q3 + settings.multiplier * iqr,
        })
    }

    /// Band of `column` over `rows`.
    pub fn for_column(rows: &[Listing], column: Column, settings: BandSettings) -> OutlierResult<Self> {
        Self::from_values(&column.values(rows), settings).map_err(|e| match e {
            OutlierError::EmptyColumn(_) => OutlierError::EmptyColumn(column.name().to_string()),
            other => other,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Band of one column and how many rows it rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnBand {
    pub column: Column,
    pub band: IqrBand,
    /// Rows the band was computed on
    pub rows_in: usize,
    /// Rows of `rows_in` outside the band
    pub removed: usize,
}

/// Result of filtering a table on one or more columns.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub rows: Vec<Listing>,
    pub bands: Vec<ColumnBand>,
}

/// How several columns are combined.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Independent,
    Sequential,
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!(
                "unknown filter mode '{}' (expected independent or sequential)",
                other
            )),
        }
    }
}

/// Keep the rows whose `column` value lies inside the column's band.
pub fn filter_outliers(
    rows: &[Listing],
    column: Column,
    settings: BandSettings,
) -> OutlierResult<(Vec<Listing>, IqrBand)> {
    let band = IqrBand::for_column(rows, column, settings)?;
    let kept = rows
        .iter()
        .filter(|l| band.contains(column.value(l)))
        .cloned()
        .collect();
    Ok((kept, band))
}

/// Filter on several columns.
pub fn filter_columns(
    rows: &[Listing],
    columns: &[Column],
    mode: FilterMode,
    settings: BandSettings,
) -> OutlierResult<FilterOutcome> {
    match mode {
        FilterMode::Independent => {
            let mut bands = Vec::with_capacity(columns.len());
            for &column in columns {
                let band = IqrBand::for_column(rows, column, settings)?;
                let removed = rows.iter().filter(|l| !band.contains(column.value(l))).count();
                bands.push(ColumnBand { column, band, rows_in: rows.len(), removed });
            }

            let kept = rows
                .iter()
                .filter(|l| bands.iter().all(|b| b.band.contains(b.column.value(l))))
                .cloned()
                .collect();

            Ok(FilterOutcome { rows: kept, bands })
        }
        FilterMode::Sequential => {
            let mut current = rows.to_vec();
            let mut bands = Vec::with_capacity(columns.len());
            for &column in columns {
                let rows_in = current.len();
                let (kept, band) = filter_outliers(&current, column, settings)?;
                bands.push(ColumnBand {
                    column,
                    band,
                    rows_in,
                    removed: rows_in - kept.len(),
                });
                current = kept;
            }
            Ok(FilterOutcome { rows: current, bands })
        }
    }
}
