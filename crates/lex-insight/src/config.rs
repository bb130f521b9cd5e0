//! Configuration types for the insight pipeline.
//!
//! This module provides the thresholds used by ingestion, quality scoring,
//! analysis and chart synthesis, using the builder pattern for ergonomic setup.

use serde::{Deserialize, Serialize};

/// Smallest raster size a chart can be drawn at and still fit axes and labels.
pub const MIN_CHART_WIDTH: u32 = 200;
pub const MIN_CHART_HEIGHT: u32 = 150;

/// Configuration for the insight pipeline.
///
/// Use [`InsightConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::config::InsightConfig;
///
/// let config = InsightConfig::builder()
///     .max_chart_categories(12)
///     .enable_domain_kpis(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Name given to the single table produced from delimited text.
    /// Default: "Sheet1"
    pub csv_sheet_name: String,

    /// Share of non-missing values that must parse as numbers before a
    /// column is promoted to numeric (strictly greater than). At 0.0 a
    /// single parsed value promotes the column.
    /// Default: 0.0
    pub numeric_promotion_ratio: f64,

    /// Share of non-missing values that must parse as day-first dates before
    /// a text column is promoted to datetime (strictly greater than).
    /// Default: 0.5
    pub datetime_promotion_ratio: f64,

    /// Categorical columns with more distinct values than this are not used
    /// as grouping keys for cross-tabulation.
    /// Default: 50
    pub max_aggregation_categories: usize,

    /// Categorical columns with more distinct values than this are left out
    /// of the value breakdowns in the markdown report.
    /// Default: 30
    pub max_report_categories: usize,

    /// Correlations with an absolute value strictly above this are "strong".
    /// Default: 0.5
    pub strong_correlation_threshold: f64,

    /// Tukey fence factor for IQR outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Maximum number of categories drawn in one chart, and the cardinality
    /// ceiling for suggested bar charts.
    /// Default: 20
    pub max_chart_categories: usize,

    /// Pie slices kept before the remainder is folded into "Other".
    /// Default: 8
    pub max_pie_slices: usize,

    /// Numeric columns included in a correlation heatmap.
    /// Default: 15
    pub max_heatmap_columns: usize,

    /// Categorical columns per sheet proposed as bar charts.
    /// Default: 3
    pub max_suggested_bar_charts: usize,

    /// Numeric columns per sheet proposed as histograms.
    /// Default: 2
    pub max_suggested_histograms: usize,

    /// Raster width in pixels.
    /// Default: 1000
    pub chart_width: u32,

    /// Raster height in pixels.
    /// Default: 600
    pub chart_height: u32,

    /// Whether to run the keyword-based domain KPI enrichment.
    /// Default: false
    pub enable_domain_kpis: bool,

    /// Whether chart batches are rendered on the rayon thread pool.
    /// Default: true
    pub parallel_rendering: bool,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            csv_sheet_name: "Sheet1".to_string(),
            numeric_promotion_ratio: 0.0,
            datetime_promotion_ratio: 0.5,
            max_aggregation_categories: 50,
            max_report_categories: 30,
            strong_correlation_threshold: 0.5,
            iqr_multiplier: 1.5,
            max_chart_categories: 20,
            max_pie_slices: 8,
            max_heatmap_columns: 15,
            max_suggested_bar_charts: 3,
            max_suggested_histograms: 2,
            chart_width: 1000,
            chart_height: 600,
            enable_domain_kpis: false,
            parallel_rendering: true,
        }
    }
}

impl InsightConfig {
    /// Create a new configuration builder.
    pub fn builder() -> InsightConfigBuilder {
        InsightConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let ratios = [
            ("numeric_promotion_ratio", self.numeric_promotion_ratio),
            ("datetime_promotion_ratio", self.datetime_promotion_ratio),
            ("strong_correlation_threshold", self.strong_correlation_threshold),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        let counts = [
            ("max_aggregation_categories", self.max_aggregation_categories),
            ("max_report_categories", self.max_report_categories),
            ("max_chart_categories", self.max_chart_categories),
            ("max_pie_slices", self.max_pie_slices),
            ("max_heatmap_columns", self.max_heatmap_columns),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigValidationError::InvalidCount {
                    field: field.to_string(),
                });
            }
        }

        if self.chart_width < MIN_CHART_WIDTH || self.chart_height < MIN_CHART_HEIGHT {
            return Err(ConfigValidationError::ChartTooSmall {
                width: self.chart_width,
                height: self.chart_height,
            });
        }

        if self.csv_sheet_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptySheetName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid IQR multiplier: {0} (must be a positive number)")]
    InvalidMultiplier(f64),

    #[error("Invalid value for '{field}': must be at least 1")]
    InvalidCount { field: String },

    #[error(
        "Chart size {width}x{height} is too small (minimum {}x{})",
        MIN_CHART_WIDTH,
        MIN_CHART_HEIGHT
    )]
    ChartTooSmall { width: u32, height: u32 },

    #[error("CSV sheet name must not be blank")]
    EmptySheetName,
}

/// Builder for [`InsightConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct InsightConfigBuilder {
    csv_sheet_name: Option<String>,
    numeric_promotion_ratio: Option<f64>,
    datetime_promotion_ratio: Option<f64>,
    max_aggregation_categories: Option<usize>,
    max_report_categories: Option<usize>,
    strong_correlation_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    max_chart_categories: Option<usize>,
    max_pie_slices: Option<usize>,
    max_heatmap_columns: Option<usize>,
    max_suggested_bar_charts: Option<usize>,
    max_suggested_histograms: Option<usize>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
    enable_domain_kpis: Option<bool>,
    parallel_rendering: Option<bool>,
}

impl InsightConfigBuilder {
    /// Set the name of the table produced from CSV input.
    pub fn csv_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.csv_sheet_name = Some(name.into());
        self
    }

    /// Set the share of values that must parse as numbers.
    ///
    /// # Arguments
    /// * `ratio` - Value between 0.0 and 1.0 (e.g., 0.5 = more than half, 0.0 = any)
    pub fn numeric_promotion_ratio(mut self, ratio: f64) -> Self {
        self.numeric_promotion_ratio = Some(ratio);
        self
    }

    /// Set the share of text values that must parse as dates.
    pub fn datetime_promotion_ratio(mut self, ratio: f64) -> Self {
        self.datetime_promotion_ratio = Some(ratio);
        self
    }

    /// Set the cardinality ceiling for cross-tabulation keys.
    pub fn max_aggregation_categories(mut self, max: usize) -> Self {
        self.max_aggregation_categories = Some(max);
        self
    }

    /// Set the cardinality ceiling for report value breakdowns.
    pub fn max_report_categories(mut self, max: usize) -> Self {
        self.max_report_categories = Some(max);
        self
    }

    /// Set the absolute correlation above which a pair is reported as strong.
    pub fn strong_correlation_threshold(mut self, threshold: f64) -> Self {
        self.strong_correlation_threshold = Some(threshold);
        self
    }

    /// Set the Tukey fence factor.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the maximum categories drawn per chart.
    pub fn max_chart_categories(mut self, max: usize) -> Self {
        self.max_chart_categories = Some(max);
        self
    }

    /// Set the number of pie slices kept before folding into "Other".
    pub fn max_pie_slices(mut self, max: usize) -> Self {
        self.max_pie_slices = Some(max);
        self
    }

    /// Set the number of numeric columns shown in a heatmap.
    pub fn max_heatmap_columns(mut self, max: usize) -> Self {
        self.max_heatmap_columns = Some(max);
        self
    }

    /// Set how many categorical columns per sheet are proposed as bar charts.
    pub fn max_suggested_bar_charts(mut self, max: usize) -> Self {
        self.max_suggested_bar_charts = Some(max);
        self
    }

    /// Set how many numeric columns per sheet are proposed as histograms.
    pub fn max_suggested_histograms(mut self, max: usize) -> Self {
        self.max_suggested_histograms = Some(max);
        self
    }

    /// Set the raster size of rendered charts.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Enable or disable keyword-based domain KPIs.
    pub fn enable_domain_kpis(mut self, enable: bool) -> Self {
        self.enable_domain_kpis = Some(enable);
        self
    }

    /// Enable or disable parallel chart rendering.
    pub fn parallel_rendering(mut self, enable: bool) -> Self {
        self.parallel_rendering = Some(enable);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `InsightConfig` or an error if validation fails.
    pub fn build(self) -> Result<InsightConfig, ConfigValidationError> {
        let defaults = InsightConfig::default();
        let config = InsightConfig {
            csv_sheet_name: self.csv_sheet_name.unwrap_or(defaults.csv_sheet_name),
            numeric_promotion_ratio: self
                .numeric_promotion_ratio
                .unwrap_or(defaults.numeric_promotion_ratio),
            datetime_promotion_ratio: self
                .datetime_promotion_ratio
                .unwrap_or(defaults.datetime_promotion_ratio),
            max_aggregation_categories: self
                .max_aggregation_categories
                .unwrap_or(defaults.max_aggregation_categories),
            max_report_categories: self
                .max_report_categories
                .unwrap_or(defaults.max_report_categories),
            strong_correlation_threshold: self
                .strong_correlation_threshold
                .unwrap_or(defaults.strong_correlation_threshold),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            max_chart_categories: self
                .max_chart_categories
                .unwrap_or(defaults.max_chart_categories),
            max_pie_slices: self.max_pie_slices.unwrap_or(defaults.max_pie_slices),
            max_heatmap_columns: self
                .max_heatmap_columns
                .unwrap_or(defaults.max_heatmap_columns),
            max_suggested_bar_charts: self
                .max_suggested_bar_charts
                .unwrap_or(defaults.max_suggested_bar_charts),
            max_suggested_histograms: self
                .max_suggested_histograms
                .unwrap_or(defaults.max_suggested_histograms),
            chart_width: self.chart_width.unwrap_or(defaults.chart_width),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
            enable_domain_kpis: self
                .enable_domain_kpis
                .unwrap_or(defaults.enable_domain_kpis),
            parallel_rendering: self
                .parallel_rendering
                .unwrap_or(defaults.parallel_rendering),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InsightConfig::default();
        assert_eq!(config.csv_sheet_name, "Sheet1");
        assert_eq!(config.max_aggregation_categories, 50);
        assert_eq!(config.max_report_categories, 30);
        assert_eq!(config.strong_correlation_threshold, 0.5);
        assert_eq!(config.max_chart_categories, 20);
        assert_eq!(config.max_heatmap_columns, 15);
        assert!(!config.enable_domain_kpis);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_defaults() {
        let config = InsightConfig::builder().build().unwrap();
        assert_eq!(config, InsightConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = InsightConfig::builder()
            .csv_sheet_name("Data")
            .max_chart_categories(12)
            .chart_size(800, 400)
            .enable_domain_kpis(true)
            .parallel_rendering(false)
            .build()
            .unwrap();

        assert_eq!(config.csv_sheet_name, "Data");
        assert_eq!(config.max_chart_categories, 12);
        assert_eq!((config.chart_width, config.chart_height), (800, 400));
        assert!(config.enable_domain_kpis);
        assert!(!config.parallel_rendering);
    }

    #[test]
    fn test_validation_invalid_ratio() {
        let result = InsightConfig::builder().numeric_promotion_ratio(1.5).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_zero_count() {
        let result = InsightConfig::builder().max_pie_slices(0).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCount { field } if field == "max_pie_slices"
        ));
    }

    #[test]
    fn test_validation_chart_too_small() {
        let result = InsightConfig::builder().chart_size(100, 100).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ChartTooSmall { width: 100, height: 100 }
        ));
    }

    #[test]
    fn test_validation_negative_multiplier() {
        let result = InsightConfig::builder().iqr_multiplier(-1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidMultiplier(_)
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = InsightConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: InsightConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "max_chart_categories": 10,
            "enable_domain_kpis": true
        }"#;

        let config: InsightConfig =
            serde_json::from_str(json).expect("Should deserialize partial JSON");

        assert_eq!(config.max_chart_categories, 10);
        assert!(config.enable_domain_kpis);
        assert_eq!(config.max_pie_slices, 8);
    }
}
