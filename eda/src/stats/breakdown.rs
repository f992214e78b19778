//! Grouped analyses over cleaned listings.
//!
//! - [`ad_lifetime`] - how long ads stay up, quick removals, long listings
//! - [`type_summary`] - ad count and mean price per vehicle type
//! - [`price_factors`] - for one type, price against age, mileage and
//!   condition, and price spread per paint color and transmission

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{describe, mean, median, pearson, Describe};
use crate::error::OutlierResult;
use crate::models::Listing;
use crate::outliers::{BandSettings, Column, IqrBand};

// =============================================================================
// Ad lifetime
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdLifetime {
    /// days_listed over every row
    pub all: Describe,
    /// Ads removed the day they were posted
    pub quick_removals: usize,
    /// Ads listed at least `long_threshold` days
    pub long_listings: usize,
    pub long_threshold: u32,
    /// days_listed over `0 < days_listed < long_threshold`
    pub typical: Option<Describe>,
}

pub fn ad_lifetime(rows: &[Listing], long_threshold: u32, settings: BandSettings) -> OutlierResult<AdLifetime> {
    let days = Column::DaysListed.values(rows);
    let all = describe(Column::DaysListed.name(), &days, settings.method)?;

    let quick_removals = rows.iter().filter(|l| l.days_listed == 0).count();
    let long_listings = rows.iter().filter(|l| l.days_listed >= long_threshold).count();

    let typical_days: Vec<f64> = rows
        .iter()
        .filter(|l| l.days_listed > 0 && l.days_listed < long_threshold)
        .map(|l| l.days_listed as f64)
        .collect();
    let typical = if typical_days.is_empty() {
        None
    } else {
        Some(describe(Column::DaysListed.name(), &typical_days, settings.method)?)
    };

    Ok(AdLifetime {
        all,
        quick_removals,
        long_listings,
        long_threshold,
        typical,
    })
}

// =============================================================================
// Vehicle types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeSummary {
    pub vehicle_type: String,
    pub ads: usize,
    pub mean_price: f64,
}

/// Per-type counts and mean price, most advertised first (ties by name).
pub fn type_summary(rows: &[Listing]) -> Vec<TypeSummary> {
    let mut prices: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for l in rows {
        prices.entry(l.vehicle_type.as_str()).or_default().push(l.price as f64);
    }

    let mut summary: Vec<TypeSummary> = prices
        .into_iter()
        .map(|(t, p)| TypeSummary {
            vehicle_type: t.to_string(),
            ads: p.len(),
            mean_price: mean(&p).unwrap_or_default(),
        })
        .collect();

    // BTreeMap order already breaks ties by name; the sort is stable
    summary.sort_by(|a, b| b.ads.cmp(&a.ads));
    summary
}

/// The `n` most advertised vehicle types.
pub fn popular_types(rows: &[Listing], n: usize) -> Vec<String> {
    type_summary(rows)
        .into_iter()
        .take(n)
        .map(|t| t.vehicle_type)
        .collect()
}

// =============================================================================
// Price factors
// =============================================================================

/// Settings for [`price_factors`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorSettings {
    /// Categories with fewer ads are left out of the breakdowns
    pub min_category_ads: usize,
    /// Paint colors dropped before any factor is computed
    pub excluded_colors: Vec<String>,
    pub band: BandSettings,
}

impl Default for FactorSettings {
    fn default() -> Self {
        Self {
            min_category_ads: 50,
            excluded_colors: vec!["orange".to_string(), "purple".to_string()],
            band: BandSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Correlation {
    pub column: Column,
    /// `None` when a series is constant
    pub r: Option<f64>,
}

/// Box-plot numbers of price within one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryPrice {
    pub category: String,
    pub ads: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest price inside the IQR band
    pub lower_whisker: f64,
    /// Highest price inside the IQR band
    pub upper_whisker: f64,
    /// Prices outside the band
    pub outliers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceFactors {
    pub vehicle_type: String,
    pub ads: usize,
    pub correlations: Vec<Correlation>,
    pub by_paint_color: Vec<CategoryPrice>,
    pub by_transmission: Vec<CategoryPrice>,
}

const PRICE_DRIVERS: [Column; 3] = [Column::AgeOfTheVehicle, Column::Odometer, Column::ConditionId];

/// Price against its likely drivers for one vehicle type.
pub fn price_factors(rows: &[Listing], vehicle_type: &str, settings: &FactorSettings) -> OutlierResult<PriceFactors> {
    let subset: Vec<Listing> = rows
        .iter()
        .filter(|l| l.vehicle_type == vehicle_type)
        .filter(|l| !settings.excluded_colors.iter().any(|c| c == &l.paint_color))
        .cloned()
        .collect();

    let prices = Column::Price.values(&subset);
    let correlations = PRICE_DRIVERS
        .iter()
        .map(|&column| Correlation {
            column,
            r: pearson(&column.values(&subset), &prices),
        })
        .collect();

    Ok(PriceFactors {
        vehicle_type: vehicle_type.to_string(),
        ads: subset.len(),
        correlations,
        by_paint_color: category_prices(&subset, |l| &l.paint_color, settings)?,
        by_transmission: category_prices(&subset, |l| &l.transmission, settings)?,
    })
}

fn category_prices<F>(rows: &[Listing], category: F, settings: &FactorSettings) -> OutlierResult<Vec<CategoryPrice>>
where
    F: Fn(&Listing) -> &String,
{
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for l in rows {
        groups.entry(category(l).as_str()).or_default().push(l.price as f64);
    }

    let mut out = Vec::new();
    for (name, prices) in groups {
        if prices.len() < settings.min_category_ads || prices.is_empty() {
            continue;
        }
        let band = IqrBand::from_values(&prices, settings.band)?;
        let inside: Vec<f64> = prices.iter().copied().filter(|&p| band.contains(p)).collect();

        out.push(CategoryPrice {
            category: name.to_string(),
            ads: prices.len(),
            q1: band.q1,
            median: median(&prices).unwrap_or_default(),
            q3: band.q3,
            lower_whisker: inside.iter().copied().fold(f64::INFINITY, f64::min),
            upper_whisker: inside.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            outliers: prices.len() - inside.len(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;
    use chrono::NaiveDate;

    fn listing(vehicle_type: &str, price: u64, color: &str, days_listed: u32) -> Listing {
        Listing {
            price,
            model_year: 2012,
            model: "chevrolet silverado".into(),
            condition: Condition::Good,
            condition_id: 2,
            cylinders: 8,
            fuel: "gas".into(),
            odometer: 120000.0,
            transmission: "automatic".into(),
            vehicle_type: vehicle_type.into(),
            paint_color: color.into(),
            is_4wd: Some(true),
            date_posted: NaiveDate::from_ymd_opt(2018, 7, 1).unwrap(),
            days_listed,
            weekday: 6,
            day_of_month: 1,
            day_of_year: 182,
            year: 2018,
            age_of_the_vehicle: 6,
            avg_mileage: 20000.0,
        }
    }

    #[test]
    fn test_ad_lifetime() {
        let rows: Vec<Listing> = [0, 0, 5, 20, 40, 104, 150]
            .into_iter()
            .map(|d| listing("SUV", 9000, "white", d))
            .collect();
        let life = ad_lifetime(&rows, 104, BandSettings::default()).unwrap();

        assert_eq!(life.all.count, 7);
        assert_eq!(life.quick_removals, 2);
        assert_eq!(life.long_listings, 2);
        let typical = life.typical.unwrap();
        assert_eq!(typical.count, 3);
        assert_eq!(typical.median, 20.0);
    }

    #[test]
    fn test_type_summary_order() {
        let rows = vec![
            listing("sedan", 5000, "white", 1),
            listing("truck", 20000, "white", 1),
            listing("SUV", 10000, "white", 1),
            listing("truck", 30000, "white", 1),
            listing("SUV", 12000, "white", 1),
        ];
        let summary = type_summary(&rows);

        assert_eq!(summary[0].vehicle_type, "SUV");
        assert_eq!(summary[0].ads, 2);
        assert_eq!(summary[0].mean_price, 11000.0);
        assert_eq!(summary[1].vehicle_type, "truck");
        assert_eq!(summary[2].vehicle_type, "sedan");
        assert_eq!(popular_types(&rows, 2), vec!["SUV".to_string(), "truck".to_string()]);
    }

    #[test]
    fn test_price_factors_thresholds_and_exclusions() {
        let mut rows = Vec::new();
        for i in 0..60 {
            let mut l = listing("truck", 10000 + i * 100, "black", 10);
            l.age_of_the_vehicle = 20 - (i as i32 / 4);
            rows.push(l);
        }
        for i in 0..10 {
            rows.push(listing("truck", 8000 + i * 100, "red", 10));
        }
        for _ in 0..70 {
            rows.push(listing("truck", 99999, "orange", 10));
        }
        rows.push(listing("SUV", 1, "black", 10));

        let settings = FactorSettings::default();
        let factors = price_factors(&rows, "truck", &settings).unwrap();

        assert_eq!(factors.ads, 70);
        // red has only 10 ads
        assert_eq!(factors.by_paint_color.len(), 1);
        assert_eq!(factors.by_paint_color[0].category, "black");
        assert_eq!(factors.by_paint_color[0].ads, 60);
        assert_eq!(factors.by_transmission[0].ads, 70);

        let age = &factors.correlations[0];
        assert_eq!(age.column, Column::AgeOfTheVehicle);
        assert!(age.r.unwrap() < 0.0);
        // odometer is constant in this table
        assert_eq!(factors.correlations[1].r, None);
    }

    #[test]
    fn test_category_whiskers_within_band() {
        let mut rows: Vec<Listing> = (0..50).map(|i| listing("SUV", 10000 + i * 10, "white", 1)).collect();
        rows.push(listing("SUV", 1_000_000, "white", 1));
        let factors = price_factors(&rows, "SUV", &FactorSettings::default()).unwrap();
        let white = &factors.by_paint_color[0];

        assert_eq!(white.outliers, 1);
        assert!(white.upper_whisker < 1_000_000.0);
        assert_eq!(white.lower_whisker, 10000.0);
    }
}
