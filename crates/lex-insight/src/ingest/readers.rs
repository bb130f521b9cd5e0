//! Raw readers for delimited text and spreadsheet containers.
//!
//! Readers only turn bytes into grids of trimmed cell text. Cleaning, column
//! naming and type inference happen in the ingestor.

use crate::error::{InsightError, Result, ResultExt};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDateTime, Timelike};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Container format selected from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Extensions read as delimited text.
    pub const CSV_EXTENSIONS: [&'static str; 1] = ["csv"];

    /// Extensions read as spreadsheet containers.
    pub const WORKBOOK_EXTENSIONS: [&'static str; 4] = ["xlsx", "xlsm", "xls", "ods"];

    /// Pick the format from a filename hint, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if Self::CSV_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::Csv)
        } else if Self::WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::Workbook)
        } else {
            Err(InsightError::UnsupportedFormat(if extension.is_empty() {
                filename.to_string()
            } else {
                extension
            }))
        }
    }
}

/// One sheet as read from the source: a header row plus column-major cells.
///
/// Every column in `columns` has the same length. Header cells and data
/// cells are trimmed and blank cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub header: Vec<Option<String>>,
    pub columns: Vec<Vec<Option<String>>>,
}

impl RawSheet {
    /// Build a sheet from row-major cells whose first row is the header.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut rows = rows.into_iter();
        let mut header = rows.next().unwrap_or_default();
        header.resize(width, None);

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().flatten());
            }
        }

        Self {
            name: name.into(),
            header,
            columns,
        }
    }

    /// Number of data rows below the header.
    pub fn height(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }
}

/// Normalize a cell: trim and map blank text to `None`.
pub(crate) fn normalize_cell(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Read CSV bytes into a single raw sheet.
///
/// Every field is read as text; the first line is treated as the header by
/// the caller, not by the CSV reader, so duplicate or blank names survive
/// until the ingestor renames them.
pub fn read_csv(bytes: &[u8], sheet_name: &str, filename: &str) -> Result<RawSheet> {
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_truncate_ragged_lines(true),
        )
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| InsightError::ingest(filename, format!("unreadable CSV: {}", e)))?;

    debug!("CSV '{}' read as {} lines x {} fields", filename, df.height(), df.width());

    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(df.width()); df.height()];
    for column in df.get_columns() {
        let series = column
            .as_materialized_series()
            .cast(&DataType::String)
            .context(format!("reading CSV field '{}'", column.name()))?;
        for (row, value) in rows.iter_mut().zip(series.str().context("reading CSV text")?.into_iter()) {
            row.push(value.and_then(normalize_cell));
        }
    }

    Ok(RawSheet::from_rows(sheet_name, rows))
}

// =============================================================================
// Spreadsheet containers
// =============================================================================

/// Read every declared sheet of a spreadsheet container, in workbook order.
pub fn read_workbook(bytes: &[u8], filename: &str) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| InsightError::ingest(filename, format!("unreadable workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    debug!("Workbook '{}' declares {} sheets", filename, sheet_names.len());

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            InsightError::ingest(filename, format!("unreadable sheet '{}': {}", name, e))
        })?;
        let rows: Vec<Vec<Option<String>>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(RawSheet::from_rows(name, rows));
    }

    Ok(sheets)
}

/// Display text of a spreadsheet cell. Error cells count as missing.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => normalize_cell(s),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(datetime) => format_datetime(datetime),
            None => dt.as_f64().to_string(),
        }),
    }
}

/// ISO text that the date parser reads back unchanged.
fn format_datetime(datetime: NaiveDateTime) -> String {
    if datetime.num_seconds_from_midnight() == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_source_format_from_filename() {
        assert_eq!(SourceFormat::from_filename("data.csv").unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_filename("Data.XLSX").unwrap(), SourceFormat::Workbook);
        assert_eq!(SourceFormat::from_filename("book.ods").unwrap(), SourceFormat::Workbook);
        assert!(matches!(
            SourceFormat::from_filename("notes.txt"),
            Err(InsightError::UnsupportedFormat(ext)) if ext == "txt"
        ));
        assert!(SourceFormat::from_filename("no_extension").is_err());
    }

    #[test]
    fn test_raw_sheet_from_ragged_rows() {
        let sheet = RawSheet::from_rows(
            "S",
            vec![
                vec![s("a"), s("b")],
                vec![s("1")],
                vec![s("2"), s("3"), s("4")],
            ],
        );
        assert_eq!(sheet.header, vec![s("a"), s("b"), None]);
        assert_eq!(sheet.height(), 2);
        assert_eq!(sheet.columns[0], vec![s("1"), s("2")]);
        assert_eq!(sheet.columns[1], vec![None, s("3")]);
        assert_eq!(sheet.columns[2], vec![None, s("4")]);
    }

    #[test]
    fn test_read_csv_keeps_text_and_blanks() {
        let bytes = b"region,ventas\nNorte,100\n  Sur , \n";
        let sheet = read_csv(bytes, "Sheet1", "data.csv").unwrap();
        assert_eq!(sheet.header, vec![s("region"), s("ventas")]);
        assert_eq!(sheet.columns[0], vec![s("Norte"), s("Sur")]);
        assert_eq!(sheet.columns[1], vec![s("100"), None]);
    }

    #[test]
    fn test_read_csv_quoted_fields() {
        let bytes = b"name,comment\n\"Smith, J\",\"said \"\"hi\"\"\"\n";
        let sheet = read_csv(bytes, "Sheet1", "q.csv").unwrap();
        assert_eq!(sheet.columns[0], vec![s("Smith, J")]);
        assert_eq!(sheet.columns[1], vec![s("said \"hi\"")]);
    }

    #[test]
    fn test_read_workbook_rejects_garbage() {
        let result = read_workbook(b"definitely not a zip archive", "broken.xlsx");
        assert!(matches!(result, Err(InsightError::Ingest { .. })));
    }

    #[test]
    fn test_format_datetime() {
        let midnight = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(format_datetime(midnight), "2024-05-01");
        let afternoon = midnight.date().and_hms_opt(15, 4, 5).unwrap();
        assert_eq!(format_datetime(afternoon), "2024-05-01 15:04:05");
    }
}
