//! Domain-agnostic quantitative analysis of a dataset.

use crate::analysis::enrichment::{KeywordKpiEnricher, KpiEnricher};
use crate::analysis::result::*;
use crate::analysis::statistics::{NumericSample, linear_slope, pearson, value_counts};
use crate::config::InsightConfig;
use crate::ingest::{Column, Dataset, Table};
use crate::utils::{percentage, round_to};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Computes KPIs, cross-tabs, distributions, correlations, trends and
/// anomalies for every table of a dataset.
///
/// The analyzer is a pure function of its input: analyzing the same dataset
/// twice yields equal results.
pub struct QuantitativeAnalyzer {
    max_aggregation_categories: usize,
    max_report_categories: usize,
    strong_correlation_threshold: f64,
    iqr_multiplier: f64,
    enricher: Option<Box<dyn KpiEnricher>>,
}

impl Default for QuantitativeAnalyzer {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl QuantitativeAnalyzer {
    pub fn new(config: &InsightConfig) -> Self {
        let enricher: Option<Box<dyn KpiEnricher>> = if config.enable_domain_kpis {
            Some(Box::new(KeywordKpiEnricher::default()))
        } else {
            None
        };

        Self {
            max_aggregation_categories: config.max_aggregation_categories,
            max_report_categories: config.max_report_categories,
            strong_correlation_threshold: config.strong_correlation_threshold,
            iqr_multiplier: config.iqr_multiplier,
            enricher,
        }
    }

    /// Replace the domain KPI enricher.
    pub fn with_enricher(mut self, enricher: Box<dyn KpiEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Analyze every table, in dataset order.
    pub fn analyze(&self, dataset: &Dataset) -> AnalysisResult {
        info!("Analyzing {} tables of '{}'", dataset.len(), dataset.filename());
        let tables = dataset
            .tables()
            .iter()
            .map(|table| self.analyze_table(table))
            .collect();

        AnalysisResult {
            tables,
            global: Self::global_kpis(dataset),
        }
    }

    /// Dataset-wide counts.
    pub fn global_kpis(dataset: &Dataset) -> GlobalKpis {
        let total_sheets = dataset.len();
        let total_records = dataset.total_rows();
        GlobalKpis {
            total_sheets,
            total_records,
            total_columns: dataset.total_columns(),
            avg_records_per_sheet: if total_sheets == 0 {
                0.0
            } else {
                round_to(total_records as f64 / total_sheets as f64, 2)
            },
        }
    }

    /// Analyze a single table.
    pub fn analyze_table(&self, table: &Table) -> TableAnalysis {
        debug!(
            "Analyzing sheet '{}' ({} rows x {} columns)",
            table.name(),
            table.height(),
            table.width()
        );

        let samples: Vec<(&Column, NumericSample)> = table
            .numeric_columns()
            .into_iter()
            .filter_map(|column| NumericSample::from_column(column).map(|s| (column, s)))
            .collect();

        let domain_kpis = match &self.enricher {
            Some(enricher) => {
                let kpis = enricher.enrich(table);
                debug!("Enricher '{}' produced {} KPIs", enricher.name(), kpis.len());
                kpis
            }
            None => Vec::new(),
        };

        TableAnalysis {
            sheet: table.name().to_string(),
            kpis: table_kpis(table, &samples),
            categorical: categorical_summaries(table),
            breakdowns: self.breakdowns(table),
            aggregations: self.aggregations(table),
            distributions: distributions(&samples),
            correlations: self.correlations(table),
            trends: trends(table),
            anomalies: self.anomalies(&samples),
            domain_kpis,
        }
    }

    fn breakdowns(&self, table: &Table) -> Vec<CategoryBreakdown> {
        table
            .categorical_columns()
            .into_iter()
            .filter_map(|column| {
                let counts = value_counts(column.present_text());
                if counts.is_empty() || counts.len() > self.max_report_categories {
                    return None;
                }
                let total: usize = counts.iter().map(|(_, n)| n).sum();
                Some(CategoryBreakdown {
                    column: column.name().to_string(),
                    total,
                    values: counts
                        .into_iter()
                        .map(|(value, count)| ValueCount {
                            value,
                            count,
                            percentage: round_to(percentage(count, total), 1),
                        })
                        .collect(),
                })
            })
            .collect()
    }

    fn aggregations(&self, table: &Table) -> Vec<Aggregation> {
        let numeric = table.numeric_columns();
        if numeric.is_empty() {
            return Vec::new();
        }

        let mut aggregations = Vec::new();
        for group_column in table.categorical_columns() {
            let distinct = value_counts(group_column.present_text()).len();
            if distinct == 0 || distinct > self.max_aggregation_categories {
                debug!(
                    "Skipping cross-tab on '{}' ({} distinct values)",
                    group_column.name(),
                    distinct
                );
                continue;
            }
            for value_column in &numeric {
                aggregations.push(aggregate(group_column, value_column));
            }
        }
        aggregations
    }

    fn correlations(&self, table: &Table) -> Option<CorrelationAnalysis> {
        let columns = table.numeric_columns();
        if columns.len() < 2 {
            return None;
        }
        let views: Vec<&[Option<f64>]> = columns
            .iter()
            .filter_map(|c| c.numeric_values())
            .collect();

        let n = views.len();
        let mut matrix = vec![vec![None; n]; n];
        for i in 0..n {
            matrix[i][i] = pearson(views[i], views[i]).map(|_| 1.0);
            for j in (i + 1)..n {
                let r = pearson(views[i], views[j]);
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }

        let mut strong = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(r) = matrix[i][j]
                    && r.abs() > self.strong_correlation_threshold
                {
                    strong.push(CorrelationPair {
                        var1: columns[i].name().to_string(),
                        var2: columns[j].name().to_string(),
                        correlation: r,
                    });
                }
            }
        }

        Some(CorrelationAnalysis {
            columns: columns.iter().map(|c| c.name().to_string()).collect(),
            matrix,
            strong,
        })
    }

    fn anomalies(&self, samples: &[(&Column, NumericSample)]) -> Vec<Anomaly> {
        samples
            .iter()
            .filter(|(_, sample)| sample.len() >= 5)
            .filter_map(|(column, sample)| {
                let (lower, upper) = sample.iqr_bounds(self.iqr_multiplier)?;
                let count = sample
                    .sorted()
                    .iter()
                    .filter(|v| **v < lower || **v > upper)
                    .count();
                Some(Anomaly {
                    column: column.name().to_string(),
                    count,
                    percentage: round_to(percentage(count, sample.len()), 2),
                    lower_bound: lower,
                    upper_bound: upper,
                })
            })
            .collect()
    }
}

fn table_kpis(table: &Table, samples: &[(&Column, NumericSample)]) -> TableKpis {
    let size = table.size();
    let missing = table.missing_cells();
    TableKpis {
        total_records: table.height(),
        completeness_rate: round_to(percentage(size - missing, size), 2),
        missing_values_total: missing,
        numeric: samples
            .iter()
            .map(|(column, sample)| NumericKpi {
                column: column.name().to_string(),
                count: sample.len(),
                mean: sample.mean().unwrap_or_default(),
                median: sample.median().unwrap_or_default(),
                std: sample.std(),
                min: sample.min().unwrap_or_default(),
                max: sample.max().unwrap_or_default(),
                sum: sample.sum(),
            })
            .collect(),
    }
}

fn categorical_summaries(table: &Table) -> Vec<CategoricalSummary> {
    table
        .categorical_columns()
        .into_iter()
        .filter_map(|column| {
            let counts = value_counts(column.present_text());
            let (most_common, most_common_count) = counts.first().cloned()?;
            Some(CategoricalSummary {
                column: column.name().to_string(),
                unique_values: counts.len(),
                most_common,
                most_common_count,
                diversity_score: round_to(percentage(counts.len(), table.height()), 2),
            })
        })
        .collect()
}

/// Mean, sum and count of `value_column` per category of `group_column`.
/// Rows without a category are left out.
fn aggregate(group_column: &Column, value_column: &Column) -> Aggregation {
    let values = value_column.numeric_values().unwrap_or(&[]);
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for (row, key) in group_column.raw().iter().enumerate() {
        let Some(key) = key.as_deref() else {
            continue;
        };
        let entry = groups.entry(key).or_insert((0.0, 0));
        if let Some(value) = values.get(row).copied().flatten() {
            entry.0 += value;
            entry.1 += 1;
        }
    }

    Aggregation {
        group_column: group_column.name().to_string(),
        value_column: value_column.name().to_string(),
        groups: groups
            .into_iter()
            .map(|(key, (sum, count))| GroupStats {
                key: key.to_string(),
                mean: (count > 0).then(|| sum / count as f64),
                sum,
                count,
            })
            .collect(),
    }
}

fn distributions(samples: &[(&Column, NumericSample)]) -> Vec<Distribution> {
    samples
        .iter()
        .filter_map(|(column, sample)| {
            Some(Distribution {
                column: column.name().to_string(),
                q1: sample.quantile(0.25)?,
                q2: sample.quantile(0.5)?,
                q3: sample.quantile(0.75)?,
                skewness: sample.skewness(),
                kurtosis: sample.kurtosis(),
            })
        })
        .collect()
}

/// Slope of every numeric column over rows ordered by the first datetime
/// column.
fn trends(table: &Table) -> Vec<Trend> {
    let Some(date_column) = table.datetime_columns().into_iter().next() else {
        return Vec::new();
    };
    let order = table.order_by_datetime(date_column);

    table
        .numeric_columns()
        .into_iter()
        .filter_map(|column| {
            let values = column.numeric_values()?;
            let ordered: Vec<f64> = order
                .iter()
                .filter_map(|&i| values.get(i).copied().flatten())
                .collect();
            if ordered.len() < 3 {
                return None;
            }
            let slope = linear_slope(&ordered)?;
            Some(Trend {
                date_column: date_column.name().to_string(),
                value_column: column.name().to_string(),
                direction: TrendDirection::from_slope(slope),
                slope,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ColumnView;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn text(name: &str, values: &[Option<&str>]) -> Column {
        Column::text(name, values.iter().map(|v| v.map(str::to_string)).collect())
    }

    fn numeric(name: &str, values: &[Option<f64>]) -> Column {
        Column::new(
            name,
            values.iter().map(|v| v.map(|x| x.to_string())).collect(),
            ColumnView::Numeric(values.to_vec()),
        )
    }

    fn dates(name: &str, days: &[u32]) -> Column {
        let values: Vec<_> = days
            .iter()
            .map(|d| {
                NaiveDate::from_ymd_opt(2024, 1, *d)
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .collect();
        Column::new(
            name,
            days.iter().map(|d| Some(format!("{:02}/01/2024", d))).collect(),
            ColumnView::Datetime(values),
        )
    }

    fn sales_table() -> Table {
        Table::new(
            "Sheet1",
            vec![
                text("region", &[Some("Norte"), Some("Norte"), Some("Sur"), Some("Sur")]),
                numeric("ventas", &[Some(100.0), Some(200.0), Some(150.0), Some(250.0)]),
            ],
        )
    }

    // ==================== KPI tests ====================

    #[test]
    fn test_numeric_kpis() {
        let analysis = QuantitativeAnalyzer::default().analyze_table(&sales_table());
        let kpi = &analysis.kpis.numeric[0];

        assert_eq!(analysis.kpis.total_records, 4);
        assert_eq!(analysis.kpis.completeness_rate, 100.0);
        assert_eq!(kpi.count, 4);
        assert_eq!(kpi.mean, 175.0);
        assert_eq!(kpi.median, 175.0);
        assert_eq!(kpi.sum, 700.0);
        assert_eq!(kpi.min, 100.0);
        assert_eq!(kpi.max, 250.0);
    }

    #[test]
    fn test_all_missing_numeric_column_is_omitted() {
        let table = Table::new(
            "S",
            vec![
                numeric("a", &[Some(1.0), Some(2.0)]),
                numeric("b", &[None, None]),
            ],
        );
        let analysis = QuantitativeAnalyzer::default().analyze_table(&table);
        let names: Vec<&str> = analysis.kpis.numeric.iter().map(|k| k.column.as_str()).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(analysis.kpis.missing_values_total, 2);
        assert_eq!(analysis.kpis.completeness_rate, 50.0);
    }

    #[test]
    fn test_categorical_summary_tie_breaks_on_first_seen() {
        let table = Table::new(
            "S",
            vec![text("color", &[Some("red"), Some("blue"), Some("blue"), Some("red")])],
        );
        let summary = &QuantitativeAnalyzer::default().analyze_table(&table).categorical[0];
        assert_eq!(summary.unique_values, 2);
        assert_eq!(summary.most_common, "red");
        assert_eq!(summary.most_common_count, 2);
        assert_eq!(summary.diversity_score, 50.0);
    }

    // ==================== Aggregation tests ====================

    #[test]
    fn test_aggregation_by_region() {
        let analysis = QuantitativeAnalyzer::default().analyze_table(&sales_table());
        let aggregation = &analysis.aggregations[0];

        assert_eq!(aggregation.group_column, "region");
        assert_eq!(aggregation.value_column, "ventas");
        assert_eq!(aggregation.group("Norte").and_then(|g| g.mean), Some(150.0));
        assert_eq!(aggregation.group("Sur").and_then(|g| g.mean), Some(200.0));
        assert_eq!(aggregation.group("Sur").map(|g| g.count), Some(2));
    }

    #[test]
    fn test_aggregation_skips_high_cardinality() {
        let config = InsightConfig {
            max_aggregation_categories: 1,
            ..Default::default()
        };
        let analysis = QuantitativeAnalyzer::new(&config).analyze_table(&sales_table());
        assert!(analysis.aggregations.is_empty());
    }

    // ==================== Correlation tests ====================

    #[test]
    fn test_single_numeric_column_has_no_correlations() {
        let analysis = QuantitativeAnalyzer::default().analyze_table(&sales_table());
        assert!(analysis.correlations.is_none());
        assert!(analysis.strong_correlations().is_empty());
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let table = Table::new(
            "S",
            vec![
                numeric("x", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
                numeric("y", &[Some(2.0), Some(4.1), Some(5.9), Some(8.2)]),
                numeric("k", &[Some(7.0), Some(7.0), Some(7.0), Some(7.0)]),
            ],
        );
        let corr = QuantitativeAnalyzer::default()
            .analyze_table(&table)
            .correlations
            .unwrap();

        assert_eq!(corr.matrix[0][0], Some(1.0));
        assert_eq!(corr.matrix[0][1], corr.matrix[1][0]);
        // constant column: undefined everywhere, including its diagonal
        assert_eq!(corr.matrix[2][2], None);
        assert_eq!(corr.matrix[0][2], None);
        assert_eq!(corr.strong.len(), 1);
        assert_eq!(corr.strong[0].var1, "x");
        assert_eq!(corr.strong[0].var2, "y");
    }

    // ==================== Distribution and anomaly tests ====================

    #[test]
    fn test_distribution_minimum_sizes() {
        let table = Table::new("S", vec![numeric("v", &[Some(1.0), Some(2.0), Some(4.0)])]);
        let dist = &QuantitativeAnalyzer::default().analyze_table(&table).distributions[0];
        assert_eq!(dist.q2, 2.0);
        assert!(dist.skewness.is_some());
        assert!(dist.kurtosis.is_none());
    }

    #[test]
    fn test_anomalies() {
        let table = Table::new(
            "S",
            vec![numeric(
                "v",
                &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)],
            )],
        );
        let anomaly = &QuantitativeAnalyzer::default().analyze_table(&table).anomalies[0];
        assert_eq!(anomaly.count, 1);
        assert_eq!(anomaly.percentage, 20.0);
        assert_eq!((anomaly.lower_bound, anomaly.upper_bound), (-1.0, 7.0));
    }

    #[test]
    fn test_anomalies_need_five_values() {
        let table = Table::new("S", vec![numeric("v", &[Some(1.0), Some(2.0), Some(50.0)])]);
        assert!(QuantitativeAnalyzer::default().analyze_table(&table).anomalies.is_empty());
    }

    // ==================== Trend tests ====================

    #[test]
    fn test_trend_follows_date_order() {
        // Rows are out of order; sorted by date the values rise.
        let table = Table::new(
            "S",
            vec![
                dates("fecha", &[3, 1, 2, 4]),
                numeric("v", &[Some(30.0), Some(10.0), Some(20.0), Some(40.0)]),
            ],
        );
        let trends = QuantitativeAnalyzer::default().analyze_table(&table).trends;
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].direction, TrendDirection::Increasing);
        assert!((trends[0].slope - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_skipped_below_three_values() {
        let table = Table::new(
            "S",
            vec![
                dates("fecha", &[1, 2, 3]),
                numeric("v", &[Some(1.0), None, Some(3.0)]),
            ],
        );
        assert!(QuantitativeAnalyzer::default().analyze_table(&table).trends.is_empty());
    }

    // ==================== Dataset tests ====================

    #[test]
    fn test_global_kpis() {
        let other = Table::new("B", vec![text("x", &[Some("a"), Some("b")])]);
        let dataset = Dataset::new("book.xlsx", vec![sales_table(), other]);
        let result = QuantitativeAnalyzer::default().analyze(&dataset);

        assert_eq!(result.global.total_sheets, 2);
        assert_eq!(result.global.total_records, 6);
        assert_eq!(result.global.total_columns, 3);
        assert_eq!(result.global.avg_records_per_sheet, 3.0);
        assert!(result.table("B").is_some());
    }

    #[test]
    fn test_domain_kpis_follow_config() {
        let off = QuantitativeAnalyzer::default().analyze_table(&sales_table());
        assert!(off.domain_kpis.is_empty());

        let config = InsightConfig {
            enable_domain_kpis: true,
            ..Default::default()
        };
        let on = QuantitativeAnalyzer::new(&config).analyze_table(&sales_table());
        assert_eq!(on.domain_kpis[0].group, "sales");
    }
}
