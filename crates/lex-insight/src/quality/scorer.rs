//! Heuristic data-quality scoring.
//!
//! Every table is checked on its own and contributes a penalty plus the
//! issues that explain it. The dataset score is `100 - total penalty`,
//! clamped to `[0, 100]`.

use crate::ingest::{ColumnView, Dataset, Table};
use crate::utils::{looks_numeric, percentage, round_to};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Pseudo column name for issues that concern a whole table or dataset.
pub const GLOBAL_COLUMN: &str = "_global";

const EMPTY_TABLE_PENALTY: f64 = 20.0;
const FEW_ROWS_PENALTY: f64 = 5.0;
const MIN_ROWS: usize = 3;
const HIGH_NULL_PENALTY: f64 = 25.0;
const MEDIUM_NULL_PENALTY: f64 = 10.0;
const LOW_NULL_PENALTY: f64 = 3.0;
const SPARSE_COLUMN_PENALTY: f64 = 3.0;
const SPARSE_COLUMN_PCT: f64 = 80.0;
const DUPLICATE_PENALTY: f64 = 5.0;
const DUPLICATE_PCT: f64 = 10.0;
const CONSTANT_COLUMN_PENALTY: f64 = 2.0;
const MISTYPED_SAMPLE_SIZE: usize = 20;
const MISTYPED_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Structure,
    Nulls,
    Duplicates,
    Variance,
    Types,
}

/// One finding of the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    /// Affected column, or [`GLOBAL_COLUMN`].
    pub column: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl QualityIssue {
    fn new(
        severity: Severity,
        category: IssueCategory,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            column: column.into(),
            message: message.into(),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Coarse bucket of a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    /// 80 and above.
    Good,
    /// 50 and above.
    Acceptable,
    Poor,
}

impl QualityStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::Poor => "poor",
        }
    }
}

/// Issue counts and headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub score: f64,
    pub status: QualityStatus,
    pub total_issues: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Always within `[0, 100]`.
    pub score: f64,
    /// In detection order: tables in dataset order, checks in a fixed order.
    pub issues: Vec<QualityIssue>,
    /// Missing-cell percentage of every table that has missing cells.
    pub null_percentages: BTreeMap<String, f64>,
    pub total_sheets: usize,
    pub total_rows: usize,
    pub total_columns: usize,
}

impl QualityReport {
    pub fn status(&self) -> QualityStatus {
        QualityStatus::from_score(self.score)
    }

    pub fn errors(&self) -> Vec<&QualityIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&QualityIssue> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> Vec<&QualityIssue> {
        self.with_severity(Severity::Info)
    }

    pub fn summary(&self) -> QualitySummary {
        QualitySummary {
            score: self.score,
            status: self.status(),
            total_issues: self.issues.len(),
            errors: self.errors().len(),
            warnings: self.warnings().len(),
            infos: self.infos().len(),
        }
    }

    fn with_severity(&self, severity: Severity) -> Vec<&QualityIssue> {
        self.issues.iter().filter(|i| i.severity == severity).collect()
    }
}

/// Issues and penalty of a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableScore {
    pub penalty: f64,
    pub null_percentage: Option<f64>,
    pub issues: Vec<QualityIssue>,
}

/// Scores datasets. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn score(dataset: &Dataset) -> QualityReport {
        info!("Scoring data quality of '{}'", dataset.filename());

        let mut penalty = 0.0;
        let mut issues = Vec::new();
        let mut null_percentages = BTreeMap::new();

        for table in dataset.tables() {
            let table_score = Self::score_table(table);
            debug!(
                "Sheet '{}': penalty {} from {} issues",
                table.name(),
                table_score.penalty,
                table_score.issues.len()
            );
            penalty += table_score.penalty;
            if let Some(pct) = table_score.null_percentage {
                null_percentages.insert(table.name().to_string(), pct);
            }
            issues.extend(table_score.issues);
        }

        let score = if dataset.has_no_data() {
            issues.push(
                QualityIssue::new(
                    Severity::Error,
                    IssueCategory::Structure,
                    GLOBAL_COLUMN,
                    format!("'{}' contains no data", dataset.filename()),
                )
                .with_detail("No sheet has any rows to analyze."),
            );
            0.0
        } else {
            round_to(100.0 - penalty, 1).clamp(0.0, 100.0)
        };

        info!("Quality score {} with {} issues", score, issues.len());

        QualityReport {
            score,
            issues,
            null_percentages,
            total_sheets: dataset.len(),
            total_rows: dataset.total_rows(),
            total_columns: dataset.total_columns(),
        }
    }

    /// Score one table in isolation.
    pub fn score_table(table: &Table) -> TableScore {
        let name = table.name();
        let mut issues = Vec::new();
        let mut penalty = 0.0;

        if table.is_empty() {
            issues.push(QualityIssue::new(
                Severity::Error,
                IssueCategory::Structure,
                GLOBAL_COLUMN,
                format!("Sheet '{}' is empty", name),
            ));
            return TableScore {
                penalty: EMPTY_TABLE_PENALTY,
                null_percentage: None,
                issues,
            };
        }

        let rows = table.height();
        if rows < MIN_ROWS {
            issues.push(
                QualityIssue::new(
                    Severity::Warning,
                    IssueCategory::Structure,
                    GLOBAL_COLUMN,
                    format!("Sheet '{}' has only {} rows", name, rows),
                )
                .with_detail("Few rows may produce an unrepresentative analysis."),
            );
            penalty += FEW_ROWS_PENALTY;
        }

        // Whole-table missing cells
        let null_pct = percentage(table.missing_cells(), table.size());
        let null_percentage = (null_pct > 0.0).then(|| round_to(null_pct, 1));
        let null_message = format!("'{}': {:.1}% missing values", name, null_pct);
        if null_pct > 50.0 {
            issues.push(
                QualityIssue::new(Severity::Error, IssueCategory::Nulls, GLOBAL_COLUMN, null_message)
                    .with_detail("More than half of the data is missing."),
            );
            penalty += HIGH_NULL_PENALTY;
        } else if null_pct > 20.0 {
            issues.push(QualityIssue::new(
                Severity::Warning,
                IssueCategory::Nulls,
                GLOBAL_COLUMN,
                null_message,
            ));
            penalty += MEDIUM_NULL_PENALTY;
        } else if null_pct > 5.0 {
            issues.push(QualityIssue::new(
                Severity::Info,
                IssueCategory::Nulls,
                GLOBAL_COLUMN,
                null_message,
            ));
            penalty += LOW_NULL_PENALTY;
        }

        // Sparse columns
        for column in table.columns() {
            let column_pct = percentage(column.missing_count(), rows);
            if column_pct > SPARSE_COLUMN_PCT {
                issues.push(
                    QualityIssue::new(
                        Severity::Warning,
                        IssueCategory::Nulls,
                        column.name(),
                        format!(
                            "Column '{}' in '{}': {:.0}% missing",
                            column.name(),
                            name,
                            column_pct
                        ),
                    )
                    .with_detail("Consider removing this column."),
                );
                penalty += SPARSE_COLUMN_PENALTY;
            }
        }

        // Duplicate rows
        let duplicates = table.duplicate_row_count().unwrap_or_else(|e| {
            debug!("Duplicate check failed for '{}': {}", name, e);
            0
        });
        if duplicates > 0 {
            let dup_pct = percentage(duplicates, rows);
            let severity = if dup_pct > DUPLICATE_PCT {
                penalty += DUPLICATE_PENALTY;
                Severity::Warning
            } else {
                Severity::Info
            };
            issues.push(QualityIssue::new(
                severity,
                IssueCategory::Duplicates,
                GLOBAL_COLUMN,
                format!("'{}': {} duplicate rows ({:.1}%)", name, duplicates, dup_pct),
            ));
        }

        // Constant columns
        for column in table.columns() {
            if column.distinct_count().unwrap_or(0) == 1 {
                let value = column.present_text().next().unwrap_or_default();
                issues.push(
                    QualityIssue::new(
                        Severity::Info,
                        IssueCategory::Variance,
                        column.name(),
                        format!(
                            "Column '{}' in '{}' has a single distinct value",
                            column.name(),
                            name
                        ),
                    )
                    .with_detail(format!("Constant value: {}", value)),
                );
                penalty += CONSTANT_COLUMN_PENALTY;
            }
        }

        // Numbers stored as text, and text that would not coerce
        for column in table.columns() {
            match column.view() {
                ColumnView::Text => {
                    let sample: Vec<&str> =
                        column.present_text().take(MISTYPED_SAMPLE_SIZE).collect();
                    let numeric = sample.iter().filter(|v| looks_numeric(v)).count();
                    if !sample.is_empty() && numeric as f64 / sample.len() as f64 >= MISTYPED_RATIO
                    {
                        issues.push(QualityIssue::new(
                            Severity::Info,
                            IssueCategory::Types,
                            column.name(),
                            format!(
                                "Column '{}' in '{}' looks numeric but is stored as text",
                                column.name(),
                                name
                            ),
                        ));
                    }
                }
                ColumnView::Numeric(_) | ColumnView::Datetime(_) => {
                    let uncoercible = column.uncoercible_count();
                    if uncoercible > 0 {
                        issues.push(QualityIssue::new(
                            Severity::Info,
                            IssueCategory::Types,
                            column.name(),
                            format!(
                                "Column '{}' in '{}': {} values could not be read as {}",
                                column.name(),
                                name,
                                uncoercible,
                                column.column_type().display_name()
                            ),
                        ));
                    }
                }
                ColumnView::Empty => {}
            }
        }

        TableScore {
            penalty,
            null_percentage,
            issues,
        }
    }
}
