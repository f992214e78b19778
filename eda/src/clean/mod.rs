//! Cleaning and derivation pipeline.
//!
//! Turns loaded [`RawListing`] rows into analysis-ready [`Listing`]s:
//!
//! ```text
//! raw rows ─▶ model_year  (mode by model)
//!          ─▶ odometer    (mean by imputed model_year)
//!          ─▶ paint_color ("unknown")
//!          ─▶ cylinders   (mode by model)
//!          ─▶ condition rank, date parts, age, avg mileage ─▶ listings
//! ```

pub mod derive;
pub mod impute;

use serde::{Deserialize, Serialize};

use crate::error::{ImputeError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::{Listing, RawListing};

pub use derive::{avg_mileage, decompose_date, rank_condition, vehicle_age};
pub use impute::{count_missing, fill_paint_color, impute, Aggregator, GroupKey, ImputeTarget};

/// Missing-value count of one input column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Missing values per optional input column, before cleaning.
pub fn missing_counts(rows: &[RawListing]) -> Vec<MissingCount> {
    let count = |f: fn(&RawListing) -> bool| rows.iter().filter(|r| f(r)).count();

    vec![
        MissingCount { column: "model_year".into(), missing: count(|r| r.model_year.is_none()) },
        MissingCount { column: "cylinders".into(), missing: count(|r| r.cylinders.is_none()) },
        MissingCount { column: "odometer".into(), missing: count(|r| r.odometer.is_none()) },
        MissingCount {
            column: "paint_color".into(),
            missing: count(|r| r.paint_color.as_deref().map_or(true, str::is_empty)),
        },
        MissingCount { column: "is_4wd".into(), missing: count(|r| r.is_4wd.is_none()) },
    ]
}

/// Impute missing values and compute derived columns.
///
/// Fails on the first empty imputation group, unknown condition or
/// malformed date.
pub fn clean_listings(rows: &[RawListing]) -> PipelineResult<Vec<Listing>> {
    log_info("🧹 Filling missing values...");

    let steps = [
        (GroupKey::Model, ImputeTarget::ModelYear, Aggregator::Mode),
        (GroupKey::ModelYear, ImputeTarget::Odometer, Aggregator::Mean),
    ];
    let mut filled = rows.to_vec();
    for (key, target, aggregator) in steps {
        filled = impute_step(&filled, key, target, aggregator)?;
    }

    let blank_colors = filled
        .iter()
        .filter(|r| r.paint_color.as_deref().map_or(true, str::is_empty))
        .count();
    filled = fill_paint_color(&filled);
    log_info_indent(format!("paint_color: {} filled with \"unknown\"", blank_colors), 1);

    filled = impute_step(&filled, GroupKey::Model, ImputeTarget::Cylinders, Aggregator::Mode)?;

    log_info("📐 Deriving columns...");
    let listings = filled
        .into_iter()
        .map(to_listing)
        .collect::<PipelineResult<Vec<_>>>()?;

    log_success(format!("Cleaned {} listings", listings.len()));
    Ok(listings)
}

fn impute_step(
    rows: &[RawListing],
    key: GroupKey,
    target: ImputeTarget,
    aggregator: Aggregator,
) -> PipelineResult<Vec<RawListing>> {
    let missing = count_missing(rows, target);
    let out = impute(rows, key, target, aggregator)?;
    log_info_indent(
        format!(
            "{}: {} filled with {:?} by {}",
            target.name(),
            missing,
            aggregator,
            key.name()
        ),
        1,
    );
    Ok(out)
}

/// Build a cleaned listing from a fully imputed row.
fn to_listing(row: RawListing) -> PipelineResult<Listing> {
    let line = row.line;
    let model_year = to_integer(line, ImputeTarget::ModelYear, row.model_year)?;
    let cylinders = to_integer(line, ImputeTarget::Cylinders, row.cylinders)?;
    let odometer = row.odometer.ok_or_else(|| unfilled(line, ImputeTarget::Odometer))?;

    let condition = rank_condition(line, &row.condition)?;
    let date = decompose_date(line, &row.date_posted)?;
    let age = vehicle_age(date.year, model_year);

    Ok(Listing {
        price: row.price,
        model_year,
        model: row.model,
        condition,
        condition_id: condition.rank(),
        cylinders,
        fuel: row.fuel,
        odometer,
        transmission: row.transmission,
        vehicle_type: row.vehicle_type,
        paint_color: row.paint_color.unwrap_or_default(),
        is_4wd: row.is_4wd,
        date_posted: date.date,
        days_listed: row.days_listed,
        weekday: date.weekday,
        day_of_month: date.day_of_month,
        day_of_year: date.day_of_year,
        year: date.year,
        age_of_the_vehicle: age,
        avg_mileage: avg_mileage(odometer, age),
    })
}

fn to_integer(line: u64, target: ImputeTarget, value: Option<f64>) -> Result<i32, ImputeError> {
    let value = value.ok_or_else(|| unfilled(line, target))?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(ImputeError::NonIntegral {
            line,
            target: target.name().to_string(),
            value,
        });
    }
    Ok(value as i32)
}

fn unfilled(line: u64, target: ImputeTarget) -> ImputeError {
    ImputeError::Unfilled {
        line,
        target: target.name().to_string(),
    }
}
