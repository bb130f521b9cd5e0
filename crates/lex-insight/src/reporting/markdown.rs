//! Deterministic markdown rendering of an [`AnalysisResult`].
//!
//! The layout is fixed: the same analysis always renders to the same text.
//! Headings and table shapes are part of the contract with the narrative
//! step, which echoes these tables back for chart extraction.

use crate::analysis::{AnalysisResult, TableAnalysis};
use crate::utils::truncate_label;

/// Top-level heading of the report.
pub const REPORT_HEADING: &str = "## QUANTITATIVE ANALYSIS (COMPUTED AUTOMATICALLY)";

const MAX_VALUE_CHARS: usize = 50;

/// Renders analysis results as markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReport;

impl MarkdownReport {
    pub fn format(analysis: &AnalysisResult) -> String {
        let mut out = String::new();
        out.push_str(REPORT_HEADING);
        out.push_str("\n\n");

        let global = &analysis.global;
        out.push_str("### GLOBAL METRICS\n");
        out.push_str(&format!("- **Total Sheets**: {}\n", global.total_sheets));
        out.push_str(&format!("- **Total Records**: {}\n", global.total_records));
        out.push_str(&format!("- **Total Columns**: {}\n", global.total_columns));
        out.push_str(&format!(
            "- **Avg Records Per Sheet**: {}\n\n",
            global.avg_records_per_sheet
        ));

        for table in &analysis.tables {
            format_table(&mut out, table);
        }

        out
    }
}

fn format_table(out: &mut String, table: &TableAnalysis) {
    out.push_str(&format!("### SHEET ANALYSIS: '{}'\n\n", table.sheet));
    out.push_str(&format!("**Total records**: {}\n\n", table.kpis.total_records));
    out.push_str(&format!(
        "**Completeness**: {}% ({} missing values)\n\n",
        table.kpis.completeness_rate, table.kpis.missing_values_total
    ));

    if !table.kpis.numeric.is_empty() {
        out.push_str("#### NUMERIC SUMMARY\n\n");
        out.push_str("| Column | Count | Mean | Median | Std | Min | Max | Sum |\n");
        out.push_str("|--------|-------|------|--------|-----|-----|-----|-----|\n");
        for kpi in &table.kpis.numeric {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                cell(&kpi.column),
                kpi.count,
                num(kpi.mean),
                num(kpi.median),
                opt(kpi.std),
                num(kpi.min),
                num(kpi.max),
                num(kpi.sum)
            ));
        }
        out.push('\n');
    }

    if !table.breakdowns.is_empty() {
        out.push_str("#### CATEGORICAL DISTRIBUTION\n\n");
        for breakdown in &table.breakdowns {
            out.push_str(&format!("**{}:**\n", breakdown.column));
            out.push_str("| Value | Count | Percentage |\n");
            out.push_str("|-------|-------|------------|\n");
            for value in &breakdown.values {
                out.push_str(&format!(
                    "| {} | {} | {:.1}% |\n",
                    cell(&value.value),
                    value.count,
                    value.percentage
                ));
            }
            out.push('\n');
        }
    }

    if !table.aggregations.is_empty() {
        out.push_str("#### AGGREGATIONS\n\n");
        for aggregation in &table.aggregations {
            out.push_str(&format!(
                "**{} by {}:**\n",
                aggregation.value_column, aggregation.group_column
            ));
            out.push_str(&format!(
                "| {} | Mean | Sum | Count |\n",
                cell(&aggregation.group_column)
            ));
            out.push_str("|-------|------|-----|-------|\n");
            for group in &aggregation.groups {
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    cell(&group.key),
                    opt(group.mean),
                    num(group.sum),
                    group.count
                ));
            }
            out.push('\n');
        }
    }

    if !table.distributions.is_empty() {
        out.push_str("#### DISTRIBUTIONS\n\n");
        out.push_str("| Column | Q1 | Median | Q3 | Skewness | Kurtosis |\n");
        out.push_str("|--------|----|--------|----|----------|----------|\n");
        for dist in &table.distributions {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                cell(&dist.column),
                num(dist.q1),
                num(dist.q2),
                num(dist.q3),
                opt(dist.skewness),
                opt(dist.kurtosis)
            ));
        }
        out.push('\n');
    }

    if table.correlations.is_some() {
        out.push_str("#### CORRELATIONS\n\n");
        let strong = table.strong_correlations();
        if strong.is_empty() {
            out.push_str("No strong correlations.\n");
        }
        for pair in strong {
            out.push_str(&format!(
                "- **{}** / **{}**: {:.3}\n",
                pair.var1, pair.var2, pair.correlation
            ));
        }
        out.push('\n');
    }

    if !table.trends.is_empty() {
        out.push_str("#### TRENDS\n\n");
        for trend in &table.trends {
            out.push_str(&format!(
                "- **{}** over **{}**: {} (slope {:.4})\n",
                trend.value_column,
                trend.date_column,
                trend.direction.display_name(),
                trend.slope
            ));
        }
        out.push('\n');
    }

    let outliers: Vec<_> = table.anomalies.iter().filter(|a| a.count > 0).collect();
    if !outliers.is_empty() {
        out.push_str("#### ANOMALIES\n\n");
        for anomaly in outliers {
            out.push_str(&format!(
                "- **{}**: {} outliers ({:.2}%), expected range [{}, {}]\n",
                anomaly.column,
                anomaly.count,
                anomaly.percentage,
                num(anomaly.lower_bound),
                num(anomaly.upper_bound)
            ));
        }
        out.push('\n');
    }

    if !table.domain_kpis.is_empty() {
        out.push_str("#### DOMAIN KPIS\n\n");
        for kpi in &table.domain_kpis {
            let metrics: Vec<String> = kpi
                .metrics
                .iter()
                .map(|m| format!("{} {}", m.name.replace('_', " "), num(m.value)))
                .collect();
            out.push_str(&format!(
                "- **{}** ({}): {}\n",
                kpi.column,
                kpi.group,
                metrics.join(", ")
            ));
        }
        out.push('\n');
    }
}

fn num(value: f64) -> String {
    format!("{:.2}", value)
}

fn opt(value: Option<f64>) -> String {
    value.map(num).unwrap_or_else(|| "n/a".to_string())
}

/// Table cell text: truncated, with pipes replaced so the row stays parseable.
fn cell(value: &str) -> String {
    truncate_label(value, MAX_VALUE_CHARS).replace('|', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::QuantitativeAnalyzer;
    use crate::ingest::{Column, ColumnView, Dataset, Table};
    use crate::narrative::{extract_sections, extract_tables};
    use pretty_assertions::assert_eq;

    fn sales_dataset() -> Dataset {
        let text = |values: &[&str]| values.iter().map(|v| Some(v.to_string())).collect();
        Dataset::new(
            "ventas.csv",
            vec![Table::new(
                "Sheet1",
                vec![
                    Column::text("region", text(&["Norte", "Norte", "Sur", "Sur"])),
                    Column::new(
                        "ventas",
                        text(&["100", "200", "150", "250"]),
                        ColumnView::Numeric(vec![Some(100.0), Some(200.0), Some(150.0), Some(250.0)]),
                    ),
                ],
            )],
        )
    }

    fn report() -> String {
        MarkdownReport::format(&QuantitativeAnalyzer::default().analyze(&sales_dataset()))
    }

    #[test]
    fn test_report_is_deterministic() {
        assert_eq!(report(), report());
    }

    #[test]
    fn test_report_headings() {
        let text = report();
        assert!(text.starts_with(REPORT_HEADING));
        assert!(text.contains("### GLOBAL METRICS"));
        assert!(text.contains("- **Total Records**: 4"));
        assert!(text.contains("### SHEET ANALYSIS: 'Sheet1'"));
        assert!(text.contains("#### CATEGORICAL DISTRIBUTION"));
        assert!(text.contains("| Value | Count | Percentage |"));
        assert!(text.contains("| Norte | 2 | 50.0% |"));
        // one numeric column: no correlation section, no anomalies
        assert!(!text.contains("#### CORRELATIONS"));
        assert!(!text.contains("#### ANOMALIES"));
    }

    #[test]
    fn test_report_tables_reparse() {
        let text = report();
        let sections = extract_sections(&text);
        assert_eq!(sections.len(), 1);

        let tables = extract_tables(&sections[0].body);
        let breakdown = tables
            .iter()
            .find(|t| t.headers == vec!["Value", "Count", "Percentage"])
            .unwrap();
        assert_eq!(breakdown.context, "region:");
        assert_eq!(breakdown.rows[1], vec!["Sur", "2", "50.0%"]);

        let aggregation = tables.iter().find(|t| t.headers[0] == "region").unwrap();
        assert_eq!(aggregation.rows[0], vec!["Norte", "150.00", "300.00", "2"]);
    }

    #[test]
    fn test_cell_escapes_pipes_and_truncates() {
        assert_eq!(cell("a|b"), "a/b");
        assert_eq!(cell(&"x".repeat(60)).chars().count(), MAX_VALUE_CHARS + 3);
    }
}
