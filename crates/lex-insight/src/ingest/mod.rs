//! Tabular ingestion.
//!
//! Turns raw bytes plus a filename hint into a [`Dataset`]: one named
//! [`Table`] per non-empty sheet, with fully-empty rows and columns removed,
//! deterministic column names and a typed view per column.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::ingest::ingest;
//!
//! let dataset = ingest(b"region,ventas\nNorte,100\nSur,150\n", "ventas.csv")?;
//! assert_eq!(dataset.sheet_names(), vec!["Sheet1"]);
//! ```

pub mod metadata;
pub mod readers;
pub mod table;
pub mod type_inference;

pub use metadata::{ColumnMetadata, DatasetMetadata, TableMetadata};
pub use readers::{RawSheet, SourceFormat};
pub use table::{Column, ColumnType, ColumnView, Table};
pub use type_inference::{TypeInference, parse_day_first_datetime};

use crate::analysis::statistics::{NumericSample, NumericSummary};
use crate::config::InsightConfig;
use crate::error::{InsightError, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

// =============================================================================
// Dataset
// =============================================================================

/// Ordered collection of uniquely named tables from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    filename: String,
    tables: Vec<Table>,
}

impl Dataset {
    /// Create a dataset. Tables whose name repeats an earlier one are dropped.
    pub fn new(filename: impl Into<String>, tables: Vec<Table>) -> Self {
        let mut seen = HashSet::new();
        let tables = tables
            .into_iter()
            .filter(|t| seen.insert(t.name().to_string()))
            .collect();
        Self {
            filename: filename.into(),
            tables,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(Table::height).sum()
    }

    pub fn total_columns(&self) -> usize {
        self.tables.iter().map(Table::width).sum()
    }

    /// True when no table holds a single row of data.
    pub fn has_no_data(&self) -> bool {
        self.tables.iter().all(Table::is_empty)
    }

    pub fn metadata(&self) -> DatasetMetadata {
        DatasetMetadata::from_dataset(self)
    }

    fn require(&self, sheet: &str) -> Result<&Table> {
        self.table(sheet)
            .ok_or_else(|| InsightError::SheetNotFound(sheet.to_string()))
    }

    /// First `n` rows of a sheet as display strings.
    pub fn sample(&self, sheet: &str, n: usize) -> Result<Vec<Vec<String>>> {
        let table = self.require(sheet)?;
        Ok((0..table.height().min(n)).map(|i| table.row(i)).collect())
    }

    /// Count, mean, std, min, quartiles and max per numeric column of a sheet.
    pub fn summary_statistics(&self, sheet: &str) -> Result<Vec<NumericSummary>> {
        let table = self.require(sheet)?;
        Ok(table
            .numeric_columns()
            .into_iter()
            .filter_map(|c| NumericSample::from_column(c).map(|s| s.summary(c.name())))
            .collect())
    }
}

// =============================================================================
// Ingestor
// =============================================================================

/// Loads CSV and spreadsheet bytes into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Ingestor {
    csv_sheet_name: String,
    inference: TypeInference,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl Ingestor {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            csv_sheet_name: config.csv_sheet_name.clone(),
            inference: TypeInference::from_config(config),
        }
    }

    /// Ingest raw bytes, using `filename` to pick the reader.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported extensions, empty input and bytes
    /// the reader cannot decode. No partial dataset is returned.
    pub fn ingest(&self, bytes: &[u8], filename: &str) -> Result<Dataset> {
        let format = SourceFormat::from_filename(filename)?;
        if bytes.is_empty() {
            return Err(InsightError::EmptyInput(filename.to_string()));
        }

        info!("Ingesting '{}' ({} bytes, {:?})", filename, bytes.len(), format);

        let tables = match format {
            SourceFormat::Csv => {
                let raw = readers::read_csv(bytes, &self.csv_sheet_name, filename)?;
                vec![self.build_table(raw, true)]
            }
            SourceFormat::Workbook => readers::read_workbook(bytes, filename)?
                .into_iter()
                .filter_map(|raw| {
                    let name = raw.name.clone();
                    let table = self.build_table(raw, false);
                    if table.is_empty() {
                        warn!("Sheet '{}' is empty after cleaning, skipping", name);
                        None
                    } else {
                        Some(table)
                    }
                })
                .collect(),
        };

        let dataset = Dataset::new(filename, tables);
        info!(
            "Ingested {} sheets, {} rows, {} columns",
            dataset.len(),
            dataset.total_rows(),
            dataset.total_columns()
        );
        Ok(dataset)
    }

    /// Clean a raw sheet and type its columns.
    ///
    /// With `keep_header_only` set, a sheet without data rows keeps its named
    /// columns so a header-only CSV still describes its shape.
    fn build_table(&self, raw: RawSheet, keep_header_only: bool) -> Table {
        let RawSheet {
            name,
            header,
            columns,
        } = raw;
        let height = columns.first().map(Vec::len).unwrap_or(0);

        let kept_rows: Vec<usize> = (0..height)
            .filter(|&row| columns.iter().any(|c| c[row].is_some()))
            .collect();
        if kept_rows.len() < height {
            debug!(
                "Sheet '{}': dropped {} empty rows",
                name,
                height - kept_rows.len()
            );
        }

        let mut kept_header = Vec::new();
        let mut kept_columns = Vec::new();
        for (cells, title) in columns.into_iter().zip(header) {
            let cells: Vec<Option<String>> =
                kept_rows.iter().map(|&row| cells[row].clone()).collect();
            let has_data = cells.iter().any(Option::is_some);
            let keep = if kept_rows.is_empty() {
                keep_header_only && title.is_some()
            } else {
                has_data
            };
            if keep {
                kept_header.push(title);
                kept_columns.push(cells);
            }
        }

        let names = resolve_column_names(&kept_header);
        let columns = names
            .into_iter()
            .zip(kept_columns)
            .map(|(column_name, cells)| {
                let column = self.inference.column(column_name, cells);
                debug!(
                    "Sheet '{}': column '{}' inferred as {}",
                    name,
                    column.name(),
                    column.column_type()
                );
                column
            })
            .collect();

        Table::new(name, columns)
    }
}

/// Ingest with default settings.
pub fn ingest(bytes: &[u8], filename: &str) -> Result<Dataset> {
    Ingestor::default().ingest(bytes, filename)
}

/// Resolve header cells into unique column names.
///
/// The first occurrence of a name keeps it. Blank names and later repeats
/// become `Column_{position}` (1-based), suffixed further if that placeholder
/// is already taken.
pub fn resolve_column_names(header: &[Option<String>]) -> Vec<String> {
    let mut taken: HashSet<String> = header.iter().flatten().cloned().collect();
    let mut assigned: HashSet<String> = HashSet::new();

    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            Some(name) if assigned.insert(name.clone()) => name.clone(),
            _ => {
                let base = format!("Column_{}", idx + 1);
                let mut candidate = base.clone();
                let mut suffix = 2;
                while taken.contains(&candidate) {
                    candidate = format!("{}_{}", base, suffix);
                    suffix += 1;
                }
                taken.insert(candidate.clone());
                assigned.insert(candidate.clone());
                candidate
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    // ==================== resolve_column_names() tests ====================

    #[test]
    fn test_resolve_blank_and_duplicate_names() {
        let names = resolve_column_names(&[s("id"), None, s("id"), s("score")]);
        assert_eq!(names, vec!["id", "Column_2", "Column_3", "score"]);
    }

    #[test]
    fn test_resolve_avoids_existing_placeholder_names() {
        let names = resolve_column_names(&[None, s("Column_1")]);
        assert_eq!(names, vec!["Column_1_2", "Column_1"]);
    }

    // ==================== Ingestor tests ====================

    #[test]
    fn test_ingest_csv_single_sheet() {
        let dataset = ingest(b"region,ventas\nNorte,100\nSur,150\n", "ventas.csv").unwrap();
        assert_eq!(dataset.sheet_names(), vec!["Sheet1"]);

        let table = dataset.table("Sheet1").unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.column("ventas").unwrap().column_type(),
            ColumnType::Numeric
        );
        assert_eq!(
            table.column("region").unwrap().column_type(),
            ColumnType::Categorical
        );
    }

    #[test]
    fn test_ingest_csv_drops_empty_rows_and_columns() {
        let csv = b"a,b,c\n1,,x\n,,\n2,,y\n";
        let dataset = ingest(csv, "data.csv").unwrap();
        let table = dataset.table("Sheet1").unwrap();
        assert_eq!(table.column_names(), vec!["a", "c"]);
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn test_ingest_header_only_csv_keeps_columns() {
        let dataset = ingest(b"col1,col2\n", "empty.csv").unwrap();
        let table = dataset.table("Sheet1").unwrap();
        assert_eq!(table.height(), 0);
        assert_eq!(table.column_names(), vec!["col1", "col2"]);
    }

    #[test]
    fn test_ingest_custom_sheet_name() {
        let config = InsightConfig::builder().csv_sheet_name("Data").build().unwrap();
        let dataset = Ingestor::new(&config).ingest(b"a\n1\n", "x.csv").unwrap();
        assert_eq!(dataset.sheet_names(), vec!["Data"]);
    }

    #[test]
    fn test_ingest_rejects_unsupported_and_empty() {
        assert!(matches!(
            ingest(b"a,b", "notes.txt"),
            Err(InsightError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ingest(b"", "data.csv"),
            Err(InsightError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_ingest_preserves_uncoercible_text() {
        let dataset = ingest(b"v\n1\n2\nbad\n", "v.csv").unwrap();
        let column = dataset.table("Sheet1").unwrap().column("v").unwrap();
        assert_eq!(column.column_type(), ColumnType::Numeric);
        assert_eq!(column.uncoercible_count(), 1);
        assert_eq!(column.display_value(2), "bad");
    }

    #[test]
    fn test_build_table_drops_header_only_workbook_columns() {
        let raw = RawSheet::from_rows(
            "S",
            vec![vec![s("a"), s("b")], vec![s("1"), None], vec![s("2"), None]],
        );
        let table = Ingestor::default().build_table(raw, false);
        assert_eq!(table.column_names(), vec!["a"]);
    }

    #[test]
    fn test_build_table_empty_workbook_sheet() {
        let raw = RawSheet::from_rows("S", vec![vec![s("a"), s("b")]]);
        let table = Ingestor::default().build_table(raw, false);
        assert!(table.is_empty());
    }

    // ==================== Dataset tests ====================

    #[test]
    fn test_sample_and_summary_statistics() {
        let dataset = ingest(b"k,v\na,1\nb,2\nc,3\nd,4\n", "d.csv").unwrap();

        let sample = dataset.sample("Sheet1", 2).unwrap();
        assert_eq!(sample, vec![vec!["a", "1"], vec!["b", "2"]]);

        let stats = dataset.summary_statistics("Sheet1").unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].column, "v");
        assert_eq!(stats[0].count, 4);
        assert_eq!(stats[0].mean, 2.5);

        assert!(matches!(
            dataset.sample("Missing", 1),
            Err(InsightError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_dataset_drops_duplicate_table_names() {
        let dataset = Dataset::new(
            "x.xlsx",
            vec![Table::new("A", vec![]), Table::new("A", vec![])],
        );
        assert_eq!(dataset.len(), 1);
    }
}
