//! Chart requests.

use crate::charts::ChartKind;
use crate::narrative::ExtractedTable;
use serde::Serialize;

/// Where a chart's data comes from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    /// A sheet of the ingested dataset, by name.
    Sheet(String),
    /// A table extracted from narrative text.
    Table(ExtractedTable),
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub source: ChartSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Palette index the chart's first color starts at.
    pub palette_offset: usize,
}

impl ChartSpec {
    pub fn for_sheet(kind: ChartKind, title: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self::new(kind, title, ChartSource::Sheet(sheet.into()))
    }

    pub fn for_table(kind: ChartKind, title: impl Into<String>, table: ExtractedTable) -> Self {
        Self::new(kind, title, ChartSource::Table(table))
    }

    fn new(kind: ChartKind, title: impl Into<String>, source: ChartSource) -> Self {
        Self {
            kind,
            title: title.into(),
            source,
            x_column: None,
            y_column: None,
            group_by: None,
            palette_offset: 0,
        }
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x_column = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y_column = Some(column.into());
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    pub fn palette_offset(mut self, offset: usize) -> Self {
        self.palette_offset = offset;
        self
    }
}
