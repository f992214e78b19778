//! Descriptive statistics over numeric columns.
//!
//! The building blocks (mean, median, modes, standard deviation, histogram
//! bins, Pearson correlation) plus [`describe`], the per-column summary that
//! the report prints before and after outlier filtering. Grouped analyses
//! built on top of these live in [`breakdown`].

pub mod breakdown;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{OutlierError, OutlierResult};
use crate::outliers::{quantile, QuantileMethod};

/// Summary of one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Describe {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Every most-frequent value, ascending
    pub modes: Vec<f64>,
    /// Sample standard deviation; `None` below two values
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub q3: f64,
    pub max: f64,
}

/// One equal-width histogram bin. The last bin includes its upper edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let n = sorted.len();
    Some(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// All values sharing the highest frequency, ascending.
pub fn modes(values: &[f64]) -> Vec<f64> {
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for &v in values {
        // -0.0 and 0.0 are the same value
        let v = if v == 0.0 { 0.0 } else { v };
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }

    let best = counts.values().map(|&(_, c)| c).max().unwrap_or(0);
    let mut tied: Vec<f64> = counts
        .into_values()
        .filter(|&(_, c)| c == best)
        .map(|(v, _)| v)
        .collect();
    tied.sort_by(f64::total_cmp);
    tied
}

/// Most frequent value; ties resolve to the smallest.
pub fn mode(values: &[f64]) -> Option<f64> {
    modes(values).first().copied()
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Pearson correlation; `None` when undefined (fewer than two pairs or a
/// constant series).
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx) * (x - mx);
        vy += (y - my) * (y - my);
    }

    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Equal-width bins between min and max.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin { lower: min, upper: max, count: values.len() }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Summarize a column. Quartiles use `method`, like the outlier bands do.
pub fn describe(column: &str, values: &[f64], method: QuantileMethod) -> OutlierResult<Describe> {
    let (Some(avg), Some(mid)) = (mean(values), median(values)) else {
        return Err(OutlierError::EmptyColumn(column.to_string()));
    };
    let q1 = quantile(values, 0.25, method)?;
    let q3 = quantile(values, 0.75, method)?;
    let sorted = sorted(values);

    Ok(Describe {
        column: column.to_string(),
        count: values.len(),
        mean: avg,
        median: mid,
        modes: modes(values),
        std: std_dev(values),
        min: sorted[0],
        q1,
        q3,
        max: sorted[sorted.len() - 1],
    })
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}
