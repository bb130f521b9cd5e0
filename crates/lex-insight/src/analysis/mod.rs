//! Quantitative analysis of an ingested dataset.
//!
//! - [`statistics`]: estimators (quantiles, moments, Pearson, slope)
//! - [`QuantitativeAnalyzer`]: per-table and global analysis
//! - [`enrichment`]: optional domain KPIs behind the [`KpiEnricher`] trait

mod analyzer;
pub mod enrichment;
mod result;
pub mod statistics;

pub use analyzer::QuantitativeAnalyzer;
pub use enrichment::{KeywordGroup, KeywordKpiEnricher, KpiEnricher, KpiKind};
pub use result::{
    Aggregation, AnalysisResult, Anomaly, CategoricalSummary, CategoryBreakdown,
    CorrelationAnalysis, CorrelationPair, Distribution, DomainKpi, GlobalKpis, GroupStats,
    KpiMetric, NumericKpi, TableAnalysis, TableKpis, Trend, TrendDirection, ValueCount,
};
pub use statistics::{NumericSample, NumericSummary};
