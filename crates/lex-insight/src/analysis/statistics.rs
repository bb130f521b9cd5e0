//! Statistical building blocks for the quantitative analyzer.
//!
//! Every estimator that needs a minimum sample size returns `None` below it,
//! so callers can omit the figure instead of reporting a misleading zero.

use crate::ingest::Column;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Non-missing values of one numeric column, kept sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSample {
    sorted: Vec<f64>,
    sum: f64,
}

impl NumericSample {
    /// Build a sample from arbitrary values. Non-finite values are ignored.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        let sum = sorted.iter().sum();
        Self { sorted, sum }
    }

    /// Build a sample from a polars series, dropping nulls.
    pub fn from_series(series: &Series) -> PolarsResult<Self> {
        let non_null = series.drop_nulls().cast(&DataType::Float64)?;
        let sorted = non_null.sort(SortOptions::default())?;
        Ok(Self::from_values(sorted.f64()?.into_iter().flatten()))
    }

    /// Sample of a numeric column, `None` for other column types or when
    /// the column has no numeric values.
    pub fn from_column(column: &Column) -> Option<Self> {
        column.numeric_values()?;
        let sample = Self::from_series(&column.to_series().ok()?).ok()?;
        (!sample.is_empty()).then_some(sample)
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.sorted.last().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.sum / self.len() as f64)
    }

    pub fn median(&self) -> Option<f64> {
        self.quantile(0.5)
    }

    /// Quantile with linear interpolation between closest ranks.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.is_empty() || !(0.0..=1.0).contains(&q) {
            return None;
        }
        let position = q * (self.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = position - lower as f64;
        Some(self.sorted[lower] + (self.sorted[upper] - self.sorted[lower]) * fraction)
    }

    /// Sum of `(x - mean)^power` over the sample.
    fn central_moment_sum(&self, power: i32) -> f64 {
        let mean = self.mean().unwrap_or(0.0);
        self.sorted.iter().map(|v| (v - mean).powi(power)).sum()
    }

    /// Sample standard deviation (n - 1 denominator). Needs 2 values.
    pub fn std(&self) -> Option<f64> {
        let n = self.len();
        (n >= 2).then(|| (self.central_moment_sum(2) / (n - 1) as f64).sqrt())
    }

    /// Adjusted Fisher-Pearson skewness (G1). Needs 3 values; a constant
    /// sample has zero skew.
    pub fn skewness(&self) -> Option<f64> {
        let n = self.len();
        if n < 3 {
            return None;
        }
        let nf = n as f64;
        let m2 = self.central_moment_sum(2) / nf;
        if m2 == 0.0 {
            return Some(0.0);
        }
        let m3 = self.central_moment_sum(3) / nf;
        let g1 = m3 / m2.powf(1.5);
        Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
    }

    /// Bias-corrected excess kurtosis (G2). Needs 4 values; a constant
    /// sample has zero kurtosis.
    pub fn kurtosis(&self) -> Option<f64> {
        let n = self.len();
        if n < 4 {
            return None;
        }
        let nf = n as f64;
        let m2 = self.central_moment_sum(2);
        if m2 == 0.0 {
            return Some(0.0);
        }
        let m4 = self.central_moment_sum(4);
        let numerator = nf * (nf + 1.0) * (nf - 1.0) * m4;
        let denominator = (nf - 2.0) * (nf - 3.0) * m2 * m2;
        let adjustment = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
        Some(numerator / denominator - adjustment)
    }

    /// Tukey fences `(Q1 - k*IQR, Q3 + k*IQR)`.
    pub fn iqr_bounds(&self, multiplier: f64) -> Option<(f64, f64)> {
        let q1 = self.quantile(0.25)?;
        let q3 = self.quantile(0.75)?;
        let iqr = q3 - q1;
        Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
    }

    /// Descriptive summary for display.
    pub fn summary(&self, column: &str) -> NumericSummary {
        NumericSummary {
            column: column.to_string(),
            count: self.len(),
            mean: self.mean().unwrap_or_default(),
            std: self.std(),
            min: self.min().unwrap_or_default(),
            q25: self.quantile(0.25).unwrap_or_default(),
            median: self.median().unwrap_or_default(),
            q75: self.quantile(0.75).unwrap_or_default(),
            max: self.max().unwrap_or_default(),
        }
    }
}

/// Describe-style summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Pearson correlation over rows where both values are present.
///
/// Returns `None` with fewer than 2 complete pairs or when either side is
/// constant over those pairs.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

/// Least-squares slope of `values` against their index (0, 1, 2, ...).
/// Needs 2 values.
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    Some(num / den)
}

/// Occurrences of each distinct value, most frequent first. Ties keep
/// first-seen order.
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
