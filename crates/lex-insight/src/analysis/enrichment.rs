//! Optional domain KPI enrichment.
//!
//! The core analyzer only computes general statistics. Domain guesses, such
//! as "a column named `ventas` holds revenue", live behind the
//! [`KpiEnricher`] trait so they can be swapped out or left off entirely.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::analysis::{KeywordKpiEnricher, QuantitativeAnalyzer};
//!
//! let analyzer = QuantitativeAnalyzer::default()
//!     .with_enricher(Box::new(KeywordKpiEnricher::default()));
//! let result = analyzer.analyze(&dataset);
//! ```

use crate::analysis::result::{DomainKpi, KpiMetric, ValueCount};
use crate::analysis::statistics::NumericSample;
use crate::ingest::Table;
use crate::utils::{format_value, percentage, round_to};

/// Produces domain KPIs for a table.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so an analyzer can be shared by a
/// pipeline running on any thread.
pub trait KpiEnricher: Send + Sync {
    /// KPIs for the columns this enricher recognises. An empty vector means
    /// nothing matched.
    fn enrich(&self, table: &Table) -> Vec<DomainKpi>;

    /// Enricher name for logging.
    fn name(&self) -> &str;
}

/// What a keyword group computes for each matching column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiKind {
    /// Average score, distribution and share at or above the median.
    Satisfaction,
    /// Total, average, median and 90th percentile.
    Sales,
    /// Average, best and worst rate.
    Conversion,
}

/// Columns whose lowercase name contains any keyword get the group's KPIs.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordGroup {
    pub name: String,
    pub keywords: Vec<String>,
    pub kind: KpiKind,
}

impl KeywordGroup {
    pub fn new(name: impl Into<String>, keywords: &[&str], kind: KpiKind) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            kind,
        }
    }

    pub fn matches(&self, column_name: &str) -> bool {
        let lower = column_name.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Substring-matching enricher over numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordKpiEnricher {
    groups: Vec<KeywordGroup>,
}

impl Default for KeywordKpiEnricher {
    fn default() -> Self {
        Self {
            groups: vec![
                KeywordGroup::new(
                    "satisfaction",
                    &["satisf", "nps", "score", "rating", "calificacion"],
                    KpiKind::Satisfaction,
                ),
                KeywordGroup::new(
                    "sales",
                    &["venta", "sales", "revenue", "ingreso", "precio", "price", "amount"],
                    KpiKind::Sales,
                ),
                KeywordGroup::new(
                    "conversion",
                    &["tasa", "rate", "conversion", "%", "porcentaje", "percentage"],
                    KpiKind::Conversion,
                ),
            ],
        }
    }
}

impl KeywordKpiEnricher {
    /// Enricher with no groups; add them with [`with_group`](Self::with_group).
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn with_group(mut self, group: KeywordGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[KeywordGroup] {
        &self.groups
    }
}

impl KpiEnricher for KeywordKpiEnricher {
    fn enrich(&self, table: &Table) -> Vec<DomainKpi> {
        let mut kpis = Vec::new();
        for group in &self.groups {
            for column in table.numeric_columns() {
                if !group.matches(column.name()) {
                    continue;
                }
                let Some(sample) = NumericSample::from_column(column) else {
                    continue;
                };
                kpis.push(group_kpi(group, column.name(), &sample));
            }
        }
        kpis
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

fn group_kpi(group: &KeywordGroup, column: &str, sample: &NumericSample) -> DomainKpi {
    // Samples reaching here are non-empty, so the Option statistics are Some.
    let mean = sample.mean().unwrap_or_default();
    let median = sample.median().unwrap_or_default();

    let (metrics, distribution) = match group.kind {
        KpiKind::Satisfaction => {
            let at_or_above = sample.sorted().iter().filter(|v| **v >= median).count();
            (
                vec![
                    KpiMetric::new("average_score", round_to(mean, 2)),
                    KpiMetric::new(
                        "positive_rate",
                        round_to(percentage(at_or_above, sample.len()), 2),
                    ),
                ],
                score_distribution(sample),
            )
        }
        KpiKind::Sales => (
            vec![
                KpiMetric::new("total", round_to(sample.sum(), 2)),
                KpiMetric::new("average", round_to(mean, 2)),
                KpiMetric::new("median", round_to(median, 2)),
                KpiMetric::new(
                    "top_10_percent_threshold",
                    round_to(sample.quantile(0.9).unwrap_or_default(), 2),
                ),
            ],
            Vec::new(),
        ),
        KpiKind::Conversion => (
            vec![
                KpiMetric::new("average_rate", round_to(mean, 2)),
                KpiMetric::new("best_rate", round_to(sample.max().unwrap_or_default(), 2)),
                KpiMetric::new("worst_rate", round_to(sample.min().unwrap_or_default(), 2)),
            ],
            Vec::new(),
        ),
    };

    DomainKpi {
        group: group.name.clone(),
        column: column.to_string(),
        metrics,
        distribution,
    }
}

/// Counts per distinct score, ascending by score.
fn score_distribution(sample: &NumericSample) -> Vec<ValueCount> {
    let mut distribution: Vec<ValueCount> = Vec::new();
    for &value in sample.sorted() {
        let label = format_value(value);
        match distribution.last_mut() {
            Some(last) if last.value == label => last.count += 1,
            _ => distribution.push(ValueCount {
                value: label,
                count: 1,
                percentage: 0.0,
            }),
        }
    }
    for entry in &mut distribution {
        entry.percentage = round_to(percentage(entry.count, sample.len()), 2);
    }
    distribution
}
