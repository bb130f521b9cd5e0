//! Result types produced by the quantitative analyzer.
//!
//! Everything here is derived from a [`Dataset`](crate::ingest::Dataset) and
//! never mutated afterwards. Optional figures are `None` when their minimum
//! sample size was not met.

use serde::{Deserialize, Serialize};

/// Analysis of every table plus dataset-wide KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tables: Vec<TableAnalysis>,
    pub global: GlobalKpis,
}

impl AnalysisResult {
    /// Analysis of one sheet by name.
    pub fn table(&self, sheet: &str) -> Option<&TableAnalysis> {
        self.tables.iter().find(|t| t.sheet == sheet)
    }
}

/// Dataset-wide counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalKpis {
    pub total_sheets: usize,
    pub total_records: usize,
    pub total_columns: usize,
    pub avg_records_per_sheet: f64,
}

/// Everything computed for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAnalysis {
    pub sheet: String,
    pub kpis: TableKpis,
    pub categorical: Vec<CategoricalSummary>,
    pub breakdowns: Vec<CategoryBreakdown>,
    pub aggregations: Vec<Aggregation>,
    pub distributions: Vec<Distribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlations: Option<CorrelationAnalysis>,
    pub trends: Vec<Trend>,
    pub anomalies: Vec<Anomaly>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_kpis: Vec<DomainKpi>,
}

impl TableAnalysis {
    /// Pairs with |r| above the strong threshold, empty when correlations
    /// were not computed.
    pub fn strong_correlations(&self) -> &[CorrelationPair] {
        self.correlations
            .as_ref()
            .map(|c| c.strong.as_slice())
            .unwrap_or(&[])
    }
}

/// Table-level KPIs plus per-numeric-column statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableKpis {
    pub total_records: usize,
    /// Share of cells holding a value, 0-100.
    pub completeness_rate: f64,
    pub missing_values_total: usize,
    pub numeric: Vec<NumericKpi>,
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericKpi {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

/// Cardinality facts of one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub unique_values: usize,
    pub most_common: String,
    pub most_common_count: usize,
    /// Unique values per row, 0-100.
    pub diversity_score: f64,
}

/// Value counts of one low-cardinality categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub column: String,
    /// Non-missing values counted.
    pub total: usize,
    /// Ordered by count descending, ties in first-seen order.
    pub values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

/// A numeric column aggregated by the values of a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub group_column: String,
    pub value_column: String,
    /// One entry per category, ordered by key.
    pub groups: Vec<GroupStats>,
}

impl Aggregation {
    pub fn group(&self, key: &str) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    /// `None` when no numeric value fell in this group.
    pub mean: Option<f64>,
    pub sum: f64,
    pub count: usize,
}

/// Shape of one numeric column's distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub column: String,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    /// Needs 3 values.
    pub skewness: Option<f64>,
    /// Needs 4 values.
    pub kurtosis: Option<f64>,
}

/// Pearson matrix over a table's numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub columns: Vec<String>,
    /// Symmetric; `None` where a correlation is undefined (constant data).
    pub matrix: Vec<Vec<Option<f64>>>,
    /// Ordered by column index pair `(i, j)` with `i < j`.
    pub strong: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub var1: String,
    pub var2: String,
    pub correlation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Flat,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Self::Increasing
        } else if slope < 0.0 {
            Self::Decreasing
        } else {
            Self::Flat
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Flat => "flat",
        }
    }
}

/// Linear trend of a numeric column ordered by a datetime column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub date_column: String,
    pub value_column: String,
    pub direction: TrendDirection,
    pub slope: f64,
}

/// Tukey outliers of one numeric column. Present for every column with
/// enough values, including those with no outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub column: String,
    pub count: usize,
    /// Share of non-missing values outside the bounds, 0-100.
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// A KPI produced by an optional enrichment layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainKpi {
    /// Enrichment group, e.g. "sales".
    pub group: String,
    pub column: String,
    pub metrics: Vec<KpiMetric>,
    /// Value counts, when the group reports a distribution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiMetric {
    pub name: String,
    pub value: f64,
}

impl KpiMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_direction_from_slope() {
        assert_eq!(TrendDirection::from_slope(0.5), TrendDirection::Increasing);
        assert_eq!(TrendDirection::from_slope(-0.1), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::from_slope(0.0), TrendDirection::Flat);
    }

    #[test]
    fn test_trend_direction_serialization() {
        let json = serde_json::to_string(&TrendDirection::Increasing).unwrap();
        assert_eq!(json, "\"increasing\"");
    }
}
