//! Read-only summaries of an ingested dataset.
//!
//! Metadata is computed once from a [`Dataset`] and never updated; ingesting
//! a different file produces a new dataset and new metadata.

use crate::utils::{percentage, round_to};
use serde::{Deserialize, Serialize};

use super::Dataset;
use super::table::{ColumnType, Table};

/// Per-column facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub column_type: ColumnType,
    /// Cells with no value.
    pub missing: usize,
    /// Cells with text the typed view could not coerce.
    pub uncoercible: usize,
}

/// Per-table summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub column_details: Vec<ColumnMetadata>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub datetime_columns: Vec<String>,
    /// Total cells with no value.
    pub missing_values: usize,
    /// Share of cells holding a value, 0-100. Uncoercible cells count as present.
    pub completeness_pct: f64,
}

impl TableMetadata {
    pub fn from_table(table: &Table) -> Self {
        let names_of = |column_type: ColumnType| -> Vec<String> {
            table
                .columns_of_type(column_type)
                .iter()
                .map(|c| c.name().to_string())
                .collect()
        };

        let missing_values = table.missing_cells();
        let size = table.size();

        Self {
            name: table.name().to_string(),
            rows: table.height(),
            columns: table.width(),
            column_names: table.column_names().iter().map(|s| s.to_string()).collect(),
            column_details: table
                .columns()
                .iter()
                .map(|c| ColumnMetadata {
                    name: c.name().to_string(),
                    column_type: c.column_type(),
                    missing: c.missing_count(),
                    uncoercible: c.uncoercible_count(),
                })
                .collect(),
            numeric_columns: names_of(ColumnType::Numeric),
            categorical_columns: names_of(ColumnType::Categorical),
            datetime_columns: names_of(ColumnType::Datetime),
            missing_values,
            completeness_pct: round_to(percentage(size - missing_values, size), 2),
        }
    }
}

/// Summary across every table of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub filename: String,
    pub total_sheets: usize,
    pub total_rows: usize,
    pub total_columns: usize,
    pub sheet_names: Vec<String>,
    pub sheets: Vec<TableMetadata>,
}

impl DatasetMetadata {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let sheets: Vec<TableMetadata> = dataset
            .tables()
            .iter()
            .map(TableMetadata::from_table)
            .collect();

        Self {
            filename: dataset.filename().to_string(),
            total_sheets: sheets.len(),
            total_rows: sheets.iter().map(|s| s.rows).sum(),
            total_columns: sheets.iter().map(|s| s.columns).sum(),
            sheet_names: sheets.iter().map(|s| s.name.clone()).collect(),
            sheets,
        }
    }

    /// Metadata of one sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&TableMetadata> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::table::{Column, ColumnView};

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_table_metadata_counts() {
        let table = Table::new(
            "Sheet1",
            vec![
                Column::text("region", cells(&[Some("Norte"), None, Some("Sur"), Some("Sur")])),
                Column::new(
                    "ventas",
                    cells(&[Some("100"), Some("x"), None, Some("250")]),
                    ColumnView::Numeric(vec![Some(100.0), None, None, Some(250.0)]),
                ),
            ],
        );

        let meta = TableMetadata::from_table(&table);
        assert_eq!(meta.rows, 4);
        assert_eq!(meta.columns, 2);
        assert_eq!(meta.numeric_columns, vec!["ventas".to_string()]);
        assert_eq!(meta.categorical_columns, vec!["region".to_string()]);
        assert_eq!(meta.missing_values, 2);
        assert_eq!(meta.column_details[1].uncoercible, 1);
        assert_eq!(meta.completeness_pct, 75.0);
    }

    #[test]
    fn test_dataset_metadata_sums_tables() {
        let a = Table::new("A", vec![Column::text("x", cells(&[Some("1"), Some("2")]))]);
        let b = Table::new(
            "B",
            vec![
                Column::text("y", cells(&[Some("a")])),
                Column::text("z", cells(&[Some("b")])),
            ],
        );
        let dataset = Dataset::new("book.xlsx", vec![a, b]);
        let meta = DatasetMetadata::from_dataset(&dataset);

        assert_eq!(meta.total_sheets, 2);
        assert_eq!(meta.total_rows, 3);
        assert_eq!(meta.total_columns, 3);
        assert_eq!(meta.sheet_names, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(meta.sheet("B").map(|s| s.columns), Some(2));
    }

    #[test]
    fn test_empty_table_completeness_is_zero() {
        let meta = TableMetadata::from_table(&Table::new("E", vec![]));
        assert_eq!(meta.completeness_pct, 0.0);
    }
}
