//! Group-wise imputation.
//!
//! [`impute`] fills the missing values of one target column from a statistic
//! of the same column over rows sharing a grouping key:
//!
//! ```text
//! model      model_year          model      model_year
//! ford f150  2015                ford f150  2015
//! ford f150  -          mode →   ford f150  2015
//! ford f150  2015                ford f150  2015
//! bmw x5     2011                bmw x5     2011
//! ```
//!
//! Group statistics are computed once from the input and applied to a copy;
//! the input slice is never modified.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ImputeError, ImputeResult};
use crate::models::{RawListing, UNKNOWN_PAINT_COLOR};
use crate::stats;

/// Statistic used to fill a group's missing values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    /// Most frequent value; ties resolve to the smallest
    Mode,
    /// Arithmetic mean
    Mean,
}

impl Aggregator {
    fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Mode => stats::mode(values),
            Self::Mean => stats::mean(values),
        }
    }
}

/// Column rows are grouped by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Model,
    ModelYear,
}

impl GroupKey {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::ModelYear => "model_year",
        }
    }

    fn key_of(&self, row: &RawListing) -> Option<String> {
        match self {
            Self::Model => Some(row.model.clone()),
            // 2011.0 formats as "2011"
            Self::ModelYear => row.model_year.map(|y| format!("{}", y)),
        }
    }
}

/// Numeric column being filled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImputeTarget {
    ModelYear,
    Odometer,
    Cylinders,
}

impl ImputeTarget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModelYear => "model_year",
            Self::Odometer => "odometer",
            Self::Cylinders => "cylinders",
        }
    }

    pub fn get(&self, row: &RawListing) -> Option<f64> {
        match self {
            Self::ModelYear => row.model_year,
            Self::Odometer => row.odometer,
            Self::Cylinders => row.cylinders,
        }
    }

    fn set(&self, row: &mut RawListing, value: f64) {
        match self {
            Self::ModelYear => row.model_year = Some(value),
            Self::Odometer => row.odometer = Some(value),
            Self::Cylinders => row.cylinders = Some(value),
        }
    }
}

/// Fill missing `target` values from `aggregator` over each `group_key` group.
///
/// Fails when a row needing a value has no grouping key, or when its group
/// holds no non-missing value to compute the statistic from.
pub fn impute(
    rows: &[RawListing],
    group_key: GroupKey,
    target: ImputeTarget,
    aggregator: Aggregator,
) -> ImputeResult<Vec<RawListing>> {
    let mut present: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let (Some(key), Some(value)) = (group_key.key_of(row), target.get(row)) {
            present.entry(key).or_default().push(value);
        }
    }

    let fills: BTreeMap<String, f64> = present
        .into_iter()
        .filter_map(|(key, values)| aggregator.apply(&values).map(|v| (key, v)))
        .collect();

    let mut out = rows.to_vec();
    for row in out.iter_mut().filter(|r| target.get(r).is_none()) {
        let key = group_key.key_of(row).ok_or_else(|| ImputeError::MissingGroupKey {
            line: row.line,
            group_key: group_key.name().to_string(),
            target: target.name().to_string(),
        })?;

        let value = *fills.get(&key).ok_or_else(|| ImputeError::EmptyGroup {
            group_key: group_key.name().to_string(),
            group: key.clone(),
            target: target.name().to_string(),
        })?;

        target.set(row, value);
    }

    Ok(out)
}

/// Fill missing paint colors with [`UNKNOWN_PAINT_COLOR`].
pub fn fill_paint_color(rows: &[RawListing]) -> Vec<RawListing> {
    rows.iter()
        .cloned()
        .map(|mut row| {
            if row.paint_color.as_deref().map_or(true, str::is_empty) {
                row.paint_color = Some(UNKNOWN_PAINT_COLOR.to_string());
            }
            row
        })
        .collect()
}

/// Number of rows missing `target`.
pub fn count_missing(rows: &[RawListing], target: ImputeTarget) -> usize {
    rows.iter().filter(|r| target.get(r).is_none()).count()
}
