//! Derived columns: condition rank, posting-date parts, vehicle age and
//! yearly mileage.

use chrono::{Datelike, NaiveDate};

use crate::error::{DeriveError, DeriveResult};
use crate::models::{Condition, DateParts};

/// Map a condition label to its place on the desirability scale.
pub fn rank_condition(line: u64, label: &str) -> DeriveResult<Condition> {
    Condition::from_label(label).ok_or_else(|| DeriveError::UnknownCondition {
        line,
        value: label.to_string(),
    })
}

/// Split a `YYYY-MM-DD` date into weekday, day of month, day of year and year.
///
/// Only the exact zero-padded form is accepted.
pub fn decompose_date(line: u64, value: &str) -> DeriveResult<DateParts> {
    let invalid = || DeriveError::InvalidDate {
        line,
        value: value.to_string(),
    };

    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;

    Ok(DateParts {
        date,
        weekday: date.weekday().num_days_from_monday(),
        day_of_month: date.day(),
        day_of_year: date.ordinal(),
        year: date.year(),
    })
}

/// Years between model year and posting year, floored at 1.
///
/// Same-year ads would otherwise divide mileage by zero.
pub fn vehicle_age(posting_year: i32, model_year: i32) -> i32 {
    posting_year.saturating_sub(model_year).max(1)
}

/// Mileage per year of age.
pub fn avg_mileage(odometer: f64, age: i32) -> f64 {
    odometer / age as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_ranks() {
        assert_eq!(rank_condition(2, "new").unwrap().rank(), 5);
        assert_eq!(rank_condition(2, "excellent").unwrap().rank(), 3);
        assert_eq!(rank_condition(2, "salvage").unwrap().rank(), 0);
    }

    #[test]
    fn test_unknown_condition_fails() {
        let err = rank_condition(9, "mint").unwrap_err();
        assert_eq!(err, DeriveError::UnknownCondition { line: 9, value: "mint".into() });
    }

    #[test]
    fn test_decompose_date() {
        let parts = decompose_date(2, "2019-05-03").unwrap();
        assert_eq!(parts.year, 2019);
        assert_eq!(parts.day_of_year, 123);
        assert_eq!(parts.day_of_month, 3);
        // 2019-05-03 was a Friday
        assert_eq!(parts.weekday, 4);
    }

    #[test]
    fn test_decompose_leap_year() {
        let parts = decompose_date(2, "2020-12-31").unwrap();
        assert_eq!(parts.day_of_year, 366);
    }

    #[test]
    fn test_malformed_dates_fail() {
        for bad in ["", "2019-5-3", "03/05/2019", "2019-02-30", "2019-05-03T00:00", "+019-05-03"] {
            assert!(
                matches!(decompose_date(4, bad), Err(DeriveError::InvalidDate { line: 4, .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_vehicle_age_floor() {
        assert_eq!(vehicle_age(2019, 2011), 8);
        assert_eq!(vehicle_age(2019, 2019), 1);
        assert_eq!(vehicle_age(2018, 2019), 1);
    }

    #[test]
    fn test_avg_mileage() {
        assert_eq!(avg_mileage(145000.0, 8), 18125.0);
        assert_eq!(avg_mileage(12000.0, 1), 12000.0);
    }

    #[test]
    fn test_vehicle_age_extreme_model_years() {
        assert_eq!(vehicle_age(2019, i32::MIN), i32::MAX);
        assert_eq!(vehicle_age(2019, i32::MAX), 1);
    }
}
