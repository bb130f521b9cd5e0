//! Pipe-table extraction from section bodies.
//!
//! Extraction is purely structural. A block is either parsed completely or
//! skipped; rows are kept with whatever cell count they have.

use serde::{Deserialize, Serialize};

const SEPARATOR: char = '|';
const CONTEXT_LOOKBACK: usize = 3;

/// A table found in narrative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// Caption taken from the nearest preceding non-table line. May be empty.
    pub context: String,
    pub headers: Vec<String>,
    /// Rows as written; lengths may differ from `headers`.
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn new(
        context: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        Self {
            context: context.into(),
            headers,
            rows,
        }
    }

    /// Cell at `(row, col)`, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Every table in a section body, in order of appearance.
///
/// A table starts at a line containing `|` that is directly followed by a
/// separator line (containing `|` and a run of at least two dashes). Rows are
/// the following non-blank lines containing `|`.
pub fn extract_tables(body: &str) -> Vec<ExtractedTable> {
    let lines: Vec<&str> = body.split('\n').collect();
    let mut tables = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        let starts_table = line.contains(SEPARATOR)
            && lines.get(i + 1).is_some_and(|next| is_separator_line(next));
        if !starts_table {
            i += 1;
            continue;
        }

        let context = caption_before(&lines, i);
        let headers = parse_table_row(line);
        i += 2;

        let mut rows = Vec::new();
        while i < lines.len() && lines[i].contains(SEPARATOR) && !lines[i].trim().is_empty() {
            let row = parse_table_row(lines[i]);
            if !row.is_empty() {
                rows.push(row);
            }
            i += 1;
        }

        if !headers.is_empty() && !rows.is_empty() {
            tables.push(ExtractedTable::new(context, headers, rows));
        }
    }

    tables
}

/// Split a table line into trimmed cells, dropping the empty edge cells that
/// a leading or trailing `|` produces.
pub fn parse_table_row(line: &str) -> Vec<String> {
    let mut cells: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(str::to_string).collect()
}

fn is_separator_line(line: &str) -> bool {
    line.contains(SEPARATOR) && line.contains("--")
}

/// First non-empty, non-table line among the few lines above `start`, with
/// heading and emphasis markers removed.
fn caption_before(lines: &[&str], start: usize) -> String {
    lines[start.saturating_sub(CONTEXT_LOOKBACK)..start]
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with(SEPARATOR))
        .map(|l| {
            l.trim_start_matches('#')
                .trim_matches(|c| matches!(c, ' ' | '*' | '_'))
                .to_string()
        })
        .unwrap_or_default()
}
