//! In-memory table model.
//!
//! A [`Column`] keeps every cell's original text next to its typed view, so a
//! value that failed numeric or date coercion is still distinguishable from a
//! cell that was truly empty.

use chrono::NaiveDateTime;
use polars::prelude::{
    Column as FrameColumn, DataFrame, DataType, NamedFrom, PolarsResult, Series, TimeUnit,
    UniqueKeepStrategy,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Column Types
// =============================================================================

/// Semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
    /// Column holds no values at all.
    Unknown,
}

impl ColumnType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Typed view over a column's raw cells.
///
/// The typed vectors always have the same length as the raw cells. A `None`
/// in a typed vector means the cell was either missing or could not be
/// coerced; check the raw cell to tell the two apart.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnView {
    Text,
    Numeric(Vec<Option<f64>>),
    Datetime(Vec<Option<NaiveDateTime>>),
    Empty,
}

impl ColumnView {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Text => ColumnType::Categorical,
            Self::Numeric(_) => ColumnType::Numeric,
            Self::Datetime(_) => ColumnType::Datetime,
            Self::Empty => ColumnType::Unknown,
        }
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named column: original cell text plus the inferred typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    raw: Vec<Option<String>>,
    view: ColumnView,
}

impl Column {
    /// Create a column from already-typed parts.
    ///
    /// Typed views whose length does not match the raw cells are rejected
    /// and the column falls back to text.
    pub fn new(name: impl Into<String>, raw: Vec<Option<String>>, view: ColumnView) -> Self {
        let view = match &view {
            ColumnView::Numeric(values) if values.len() != raw.len() => ColumnView::Text,
            ColumnView::Datetime(values) if values.len() != raw.len() => ColumnView::Text,
            _ => view,
        };
        Self {
            name: name.into(),
            raw,
            view,
        }
    }

    /// Create an untyped text column.
    pub fn text(name: impl Into<String>, raw: Vec<Option<String>>) -> Self {
        Self::new(name, raw, ColumnView::Text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw(&self) -> &[Option<String>] {
        &self.raw
    }

    pub fn view(&self) -> &ColumnView {
        &self.view
    }

    pub fn column_type(&self) -> ColumnType {
        self.view.column_type()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Numeric view, if the column was promoted to numeric.
    pub fn numeric_values(&self) -> Option<&[Option<f64>]> {
        match &self.view {
            ColumnView::Numeric(values) => Some(values),
            _ => None,
        }
    }

    /// Datetime view, if the column was promoted to datetime.
    pub fn datetime_values(&self) -> Option<&[Option<NaiveDateTime>]> {
        match &self.view {
            ColumnView::Datetime(values) => Some(values),
            _ => None,
        }
    }

    /// Non-missing numeric values in row order.
    pub fn present_numbers(&self) -> Vec<f64> {
        self.numeric_values()
            .map(|values| values.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Non-missing raw cells in row order.
    pub fn present_text(&self) -> impl Iterator<Item = &str> {
        self.raw.iter().filter_map(|cell| cell.as_deref())
    }

    /// Cells with no value at all.
    pub fn missing_count(&self) -> usize {
        self.raw.iter().filter(|cell| cell.is_none()).count()
    }

    /// Cells that hold text the typed view could not coerce.
    pub fn uncoercible_count(&self) -> usize {
        let typed_missing = match &self.view {
            ColumnView::Numeric(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnView::Datetime(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnView::Text | ColumnView::Empty => return 0,
        };
        typed_missing - self.missing_count()
    }

    /// Display string of one cell, empty for missing cells.
    pub fn display_value(&self, row: usize) -> &str {
        self.raw.get(row).and_then(|cell| cell.as_deref()).unwrap_or("")
    }

    /// Number of distinct non-missing values, compared by typed value.
    pub fn distinct_count(&self) -> PolarsResult<usize> {
        let series = self.to_series()?.drop_nulls();
        if series.is_empty() {
            return Ok(0);
        }
        series.n_unique()
    }

    /// Convert the typed view into a polars series.
    ///
    /// Datetimes are stored as millisecond timestamps.
    pub fn to_series(&self) -> PolarsResult<Series> {
        let name = self.name.as_str().into();
        match &self.view {
            ColumnView::Numeric(values) => Ok(Series::new(name, values)),
            ColumnView::Datetime(values) => {
                let millis: Vec<Option<i64>> = values
                    .iter()
                    .map(|v| v.map(|dt| dt.and_utc().timestamp_millis()))
                    .collect();
                Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            }
            ColumnView::Text | ColumnView::Empty => Ok(self.raw_series()),
        }
    }

    /// Raw cells as a string series.
    pub fn raw_series(&self) -> Series {
        Series::new(self.name.as_str().into(), &self.raw)
    }
}

// =============================================================================
// Table
// =============================================================================

/// One rectangular sheet of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Create a table. Columns are expected to share one length; shorter
    /// columns are padded with missing cells.
    pub fn new(name: impl Into<String>, mut columns: Vec<Column>) -> Self {
        let height = columns.iter().map(Column::len).max().unwrap_or(0);
        for column in &mut columns {
            if column.len() < height {
                column.raw.resize(height, None);
                match &mut column.view {
                    ColumnView::Numeric(values) => values.resize(height, None),
                    ColumnView::Datetime(values) => values.resize(height, None),
                    ColumnView::Text | ColumnView::Empty => {}
                }
            }
        }
        Self {
            name: name.into(),
            columns,
            height,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.columns.is_empty()
    }

    pub fn columns_of_type(&self, column_type: ColumnType) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.column_type() == column_type)
            .collect()
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns_of_type(ColumnType::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&Column> {
        self.columns_of_type(ColumnType::Categorical)
    }

    pub fn datetime_columns(&self) -> Vec<&Column> {
        self.columns_of_type(ColumnType::Datetime)
    }

    /// Total cell count.
    pub fn size(&self) -> usize {
        self.height * self.columns.len()
    }

    /// Cells with no value, across all columns.
    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// Display strings of one row.
    pub fn row(&self, index: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.display_value(index).to_string())
            .collect()
    }

    /// Typed polars frame of the table.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.to_series().map(FrameColumn::from))
            .collect::<PolarsResult<Vec<_>>>()?;
        DataFrame::new(columns)
    }

    /// Polars frame holding the original cell text.
    pub fn to_raw_dataframe(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(
            self.columns
                .iter()
                .map(|c| FrameColumn::from(c.raw_series()))
                .collect(),
        )
    }

    /// Rows that repeat an earlier row cell for cell.
    pub fn duplicate_row_count(&self) -> PolarsResult<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let df = self.to_raw_dataframe()?;
        let unique = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
        Ok(df.height().saturating_sub(unique.height()))
    }

    /// Row indices ordered by a datetime column, ascending, missing last.
    /// Ties keep their original order.
    pub fn order_by_datetime(&self, column: &Column) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.height).collect();
        if let Some(values) = column.datetime_values() {
            indices.sort_by_key(|&i| match values.get(i).copied().flatten() {
                Some(dt) => (false, Some(dt)),
                None => (true, None),
            });
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    fn numeric(name: &str, values: &[Option<&str>]) -> Column {
        let raw = cells(values);
        let view = raw
            .iter()
            .map(|v| v.as_deref().and_then(|s| s.parse::<f64>().ok()))
            .collect();
        Column::new(name, raw, ColumnView::Numeric(view))
    }

    // ==================== Column tests ====================

    #[test]
    fn test_missing_and_uncoercible_are_distinct() {
        let column = numeric("x", &[Some("1"), None, Some("abc"), Some("4")]);
        assert_eq!(column.missing_count(), 1);
        assert_eq!(column.uncoercible_count(), 1);
        assert_eq!(column.present_numbers(), vec![1.0, 4.0]);
        assert_eq!(column.display_value(2), "abc");
    }

    #[test]
    fn test_mismatched_view_falls_back_to_text() {
        let column = Column::new(
            "x",
            cells(&[Some("1"), Some("2")]),
            ColumnView::Numeric(vec![Some(1.0)]),
        );
        assert_eq!(column.column_type(), ColumnType::Categorical);
    }

    #[test]
    fn test_distinct_count_uses_typed_values() {
        let column = numeric("x", &[Some("1"), Some("1.0"), Some("2"), None]);
        assert_eq!(column.distinct_count().unwrap(), 2);

        let text = Column::text("t", cells(&[Some("a"), Some("a"), None]));
        assert_eq!(text.distinct_count().unwrap(), 1);
    }

    #[test]
    fn test_datetime_series_dtype() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let column = Column::new(
            "d",
            cells(&[Some("01/03/2024"), None]),
            ColumnView::Datetime(vec![Some(date), None]),
        );
        let series = column.to_series().unwrap();
        assert!(matches!(series.dtype(), DataType::Datetime(_, _)));
        assert_eq!(series.null_count(), 1);
    }

    // ==================== Table tests ====================

    #[test]
    fn test_table_pads_short_columns() {
        let table = Table::new(
            "Sheet1",
            vec![
                Column::text("a", cells(&[Some("x"), Some("y"), Some("z")])),
                numeric("b", &[Some("1")]),
            ],
        );
        assert_eq!(table.height(), 3);
        assert_eq!(table.columns()[1].len(), 3);
        assert_eq!(table.missing_cells(), 2);
        assert_eq!(table.row(2), vec!["z".to_string(), String::new()]);
    }

    #[test]
    fn test_duplicate_row_count() {
        let table = Table::new(
            "Sheet1",
            vec![
                Column::text("a", cells(&[Some("x"), Some("x"), Some("y"), None, None])),
                numeric("b", &[Some("1"), Some("1"), Some("2"), None, None]),
            ],
        );
        assert_eq!(table.duplicate_row_count().unwrap(), 2);
    }

    #[test]
    fn test_order_by_datetime_puts_missing_last() {
        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let dates = Column::new(
            "d",
            cells(&[Some("c"), None, Some("a"), Some("b")]),
            ColumnView::Datetime(vec![Some(day(3)), None, Some(day(1)), Some(day(2))]),
        );
        let table = Table::new("Sheet1", vec![dates.clone()]);
        assert_eq!(table.order_by_datetime(&dates), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new("Empty", vec![]);
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
        assert_eq!(table.duplicate_row_count().unwrap(), 0);
    }
}
