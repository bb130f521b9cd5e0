//! Chart data preparation.
//!
//! Turns a [`ChartSpec`] source (a dataset sheet or an extracted narrative
//! table) into the plain numbers a chart draws. `Ok(None)` means there is
//! nothing to draw; errors mean the request does not fit the data.

use crate::analysis::statistics::{pearson, value_counts};
use crate::charts::classifier::{label_column, numeric_columns};
use crate::charts::{ChartKind, ChartSpec};
use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::ingest::{Column, ColumnView, Table};
use crate::narrative::ExtractedTable;
use crate::utils::{extract_embedded_number, format_value, parse_numeric_string, truncate_label};
use anyhow::{Result, bail};
use std::collections::HashMap;

/// Category labels longer than this are cut.
const MAX_LABEL_CHARS: usize = 30;

/// Histograms use at most this many bins.
const MAX_HISTOGRAM_BINS: usize = 30;

/// Series a grouped bar chart draws from one sheet.
const MAX_GROUPED_SERIES: usize = 4;

const OTHER_LABEL: &str = "Other";
const FREQUENCY_LABEL: &str = "Frequency";

/// One named series of values aligned with a chart's categories.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Drawable chart content.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Bars per category; one series for bar charts, several for grouped bars.
    Categories {
        labels: Vec<String>,
        series: Vec<DataSeries>,
        value_axis: String,
    },
    /// Pie slices, all positive.
    Slices { labels: Vec<String>, values: Vec<f64> },
    /// Points for line and scatter charts, with labelled x positions.
    Points {
        x_name: String,
        y_name: String,
        points: Vec<(f64, f64)>,
        x_ticks: Vec<(f64, String)>,
    },
    Histogram { column: String, bins: Vec<HistogramBin> },
    /// Square correlation matrix.
    Matrix {
        labels: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
    },
}

// =============================================================================
// Extracted tables
// =============================================================================

/// Chart data from a narrative table.
pub fn from_extracted(
    kind: ChartKind,
    table: &ExtractedTable,
    config: &InsightConfig,
) -> Result<Option<ChartData>> {
    if table.rows.is_empty() || table.headers.is_empty() {
        return Ok(None);
    }

    let label_col = label_column(&table.headers, &table.rows);
    let labels: Vec<String> = (0..table.rows.len())
        .map(|row| truncate_label(table.cell(row, label_col), MAX_LABEL_CHARS))
        .collect();
    let series: Vec<DataSeries> = numeric_columns(&table.headers, &table.rows)
        .into_iter()
        .filter(|col| *col != label_col)
        .map(|col| DataSeries {
            name: table.headers[col].clone(),
            values: (0..table.rows.len())
                .map(|row| cell_number(table.cell(row, col)))
                .collect(),
        })
        .collect();

    let Some(first) = series.first() else {
        bail!("table has no numeric column");
    };

    let data = match kind {
        ChartKind::Bar | ChartKind::BarH => ChartData::Categories {
            labels,
            value_axis: first.name.clone(),
            series: vec![first.clone()],
        },
        ChartKind::GroupedBar => ChartData::Categories {
            labels,
            value_axis: String::new(),
            series,
        },
        ChartKind::Pie => slices(labels.into_iter().zip(first.values.iter().copied()), config)?,
        ChartKind::Line => {
            let points: Vec<(f64, f64)> = first
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v))
                .collect();
            let positions: Vec<f64> = points.iter().map(|p| p.0).collect();
            ChartData::Points {
                x_name: table.headers[label_col].clone(),
                y_name: first.name.clone(),
                x_ticks: index_ticks(&positions, &labels),
                points,
            }
        }
        ChartKind::Scatter => {
            let Some(second) = series.get(1) else {
                bail!("scatter needs two numeric columns");
            };
            ChartData::Points {
                x_name: first.name.clone(),
                y_name: second.name.clone(),
                points: first.values.iter().copied().zip(second.values.iter().copied()).collect(),
                x_ticks: Vec::new(),
            }
        }
        ChartKind::Histogram => ChartData::Histogram {
            column: first.name.clone(),
            bins: histogram(&first.values),
        },
        ChartKind::Heatmap => {
            if series.len() < 2 {
                bail!("heatmap needs two numeric columns");
            }
            let columns: Vec<Vec<Option<f64>>> = series
                .iter()
                .take(config.max_heatmap_columns)
                .map(|s| s.values.iter().map(|v| Some(*v)).collect())
                .collect();
            correlation_matrix(
                series.iter().take(columns.len()).map(|s| s.name.clone()).collect(),
                &columns,
            )
        }
    };
    Ok(Some(data))
}

/// Number in a narrative cell; unreadable cells plot as zero.
fn cell_number(cell: &str) -> f64 {
    parse_numeric_string(cell)
        .or_else(|| extract_embedded_number(cell))
        .unwrap_or(0.0)
}

// =============================================================================
// Dataset sheets
// =============================================================================

/// Chart data from a dataset sheet.
pub fn from_sheet(spec: &ChartSpec, table: &Table, config: &InsightConfig) -> Result<Option<ChartData>> {
    if table.is_empty() {
        return Ok(None);
    }

    let x = spec
        .x_column
        .as_deref()
        .map(|name| column(table, name))
        .transpose()?;
    let y = spec
        .y_column
        .as_deref()
        .map(|name| column(table, name))
        .transpose()?;
    if spec.kind.needs_x_column() && x.is_none() {
        bail!("{} chart needs an x column", spec.kind);
    }

    let data = match (spec.kind, x) {
        (ChartKind::Bar | ChartKind::BarH, Some(x)) => {
            let (pairs, value_axis) = category_totals(x, y)?;
            let (labels, values): (Vec<String>, Vec<f64>) =
                pairs.into_iter().take(config.max_chart_categories).unzip();
            ChartData::Categories {
                labels,
                series: vec![DataSeries {
                    name: value_axis.clone(),
                    values,
                }],
                value_axis,
            }
        }
        (ChartKind::Pie, Some(x)) => {
            let (pairs, _) = category_totals(x, y)?;
            slices(pairs.into_iter().take(config.max_chart_categories), config)?
        }
        (ChartKind::GroupedBar, Some(x)) => {
            let group = spec
                .group_by
                .as_deref()
                .map(|name| column(table, name))
                .transpose()?;
            grouped_means(table, x, y, group, config)?
        }
        (ChartKind::Line, Some(x)) => {
            let Some(y) = y else {
                bail!("line chart needs a y column");
            };
            line_points(x, y.name(), numeric(y)?)
        }
        (ChartKind::Scatter, Some(x)) => {
            let Some(y) = y else {
                bail!("scatter chart needs a y column");
            };
            let points: Vec<(f64, f64)> = numeric(x)?
                .iter()
                .zip(numeric(y)?)
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .collect();
            ChartData::Points {
                x_name: x.name().to_string(),
                y_name: y.name().to_string(),
                points,
                x_ticks: Vec::new(),
            }
        }
        (ChartKind::Histogram, x) => {
            let Some(target) = x.or(y) else {
                bail!("histogram needs a column");
            };
            let values: Vec<f64> = numeric(target)?.iter().flatten().copied().collect();
            ChartData::Histogram {
                column: target.name().to_string(),
                bins: histogram(&values),
            }
        }
        (ChartKind::Heatmap, _) => {
            let columns: Vec<&Column> = table
                .numeric_columns()
                .into_iter()
                .take(config.max_heatmap_columns)
                .collect();
            if columns.len() < 2 {
                bail!("heatmap needs two numeric columns");
            }
            let views: Vec<Vec<Option<f64>>> = columns
                .iter()
                .map(|c| c.numeric_values().unwrap_or(&[]).to_vec())
                .collect();
            correlation_matrix(columns.iter().map(|c| c.name().to_string()).collect(), &views)
        }
        (kind, None) => bail!("{} chart needs an x column", kind),
    };
    Ok(Some(data))
}

fn column<'t>(table: &'t Table, name: &str) -> Result<&'t Column> {
    table
        .column(name)
        .ok_or_else(|| InsightError::ColumnNotFound(name.to_string()).into())
}

fn numeric(column: &Column) -> Result<&[Option<f64>]> {
    match column.numeric_values() {
        Some(values) => Ok(values),
        None => bail!(
            "column '{}' is {}, not numeric",
            column.name(),
            column.column_type().display_name()
        ),
    }
}

/// Per-category totals ordered largest first: sums of `y` when given,
/// occurrence counts of `x` otherwise. Returns the value axis name too.
fn category_totals(x: &Column, y: Option<&Column>) -> Result<(Vec<(String, f64)>, String)> {
    let Some(y) = y else {
        let counts = value_counts(x.present_text())
            .into_iter()
            .map(|(label, n)| (truncate_label(&label, MAX_LABEL_CHARS), n as f64))
            .collect();
        return Ok((counts, FREQUENCY_LABEL.to_string()));
    };

    let values = numeric(y)?;
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sums: Vec<(String, f64)> = Vec::new();
    for (row, key) in x.raw().iter().enumerate() {
        let Some(key) = key.as_deref() else {
            continue;
        };
        let slot = *index.entry(key).or_insert_with(|| {
            sums.push((truncate_label(key, MAX_LABEL_CHARS), 0.0));
            sums.len() - 1
        });
        if let Some(v) = values.get(row).copied().flatten() {
            sums[slot].1 += v;
        }
    }
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok((sums, y.name().to_string()))
}

/// Positive slices, with everything past the slice limit merged into "Other".
fn slices(pairs: impl IntoIterator<Item = (String, f64)>, config: &InsightConfig) -> Result<ChartData> {
    let positive: Vec<(String, f64)> = pairs.into_iter().filter(|(_, v)| *v > 0.0).collect();
    if positive.is_empty() {
        bail!("pie chart has no positive values");
    }

    let mut labels = Vec::new();
    let mut values = Vec::new();
    let mut other = 0.0;
    for (i, (label, value)) in positive.into_iter().enumerate() {
        if i < config.max_pie_slices {
            labels.push(label);
            values.push(value);
        } else {
            other += value;
        }
    }
    if other > 0.0 {
        labels.push(OTHER_LABEL.to_string());
        values.push(other);
    }
    Ok(ChartData::Slices { labels, values })
}

/// Per-category means of several series. Series are either the values of
/// `group` (mean of `y` per category and group) or numeric columns.
fn grouped_means(
    table: &Table,
    x: &Column,
    y: Option<&Column>,
    group: Option<&Column>,
    config: &InsightConfig,
) -> Result<ChartData> {
    let categories: Vec<String> = value_counts(x.present_text())
        .into_iter()
        .take(config.max_chart_categories)
        .map(|(label, _)| label)
        .collect();
    let category_of = |row: usize| -> Option<usize> {
        let key = x.raw().get(row)?.as_deref()?;
        categories.iter().position(|c| c == key)
    };

    let mean_by = |values: &[Option<f64>], keep: &dyn Fn(usize) -> bool| -> Vec<f64> {
        let mut sums = vec![(0.0, 0usize); categories.len()];
        for (row, value) in values.iter().enumerate() {
            if let (Some(v), Some(c)) = (value, category_of(row))
                && keep(row)
            {
                sums[c].0 += v;
                sums[c].1 += 1;
            }
        }
        sums.into_iter()
            .map(|(sum, n)| if n == 0 { 0.0 } else { sum / n as f64 })
            .collect()
    };

    let series: Vec<DataSeries> = match (group, y) {
        (Some(group), Some(y)) => {
            let values = numeric(y)?;
            value_counts(group.present_text())
                .into_iter()
                .take(MAX_GROUPED_SERIES)
                .map(|(name, _)| {
                    let keep = |row: usize| group.raw().get(row).and_then(|g| g.as_deref()) == Some(name.as_str());
                    DataSeries {
                        values: mean_by(values, &keep),
                        name,
                    }
                })
                .collect()
        }
        (_, Some(y)) => vec![DataSeries {
            name: y.name().to_string(),
            values: mean_by(numeric(y)?, &|_| true),
        }],
        (_, None) => table
            .numeric_columns()
            .into_iter()
            .filter(|c| c.name() != x.name())
            .take(MAX_GROUPED_SERIES)
            .map(|c| DataSeries {
                name: c.name().to_string(),
                values: mean_by(c.numeric_values().unwrap_or(&[]), &|_| true),
            })
            .collect(),
    };

    if series.is_empty() {
        bail!("grouped bar chart has no numeric series");
    }
    Ok(ChartData::Categories {
        labels: categories
            .iter()
            .map(|c| truncate_label(c, MAX_LABEL_CHARS))
            .collect(),
        series,
        value_axis: String::new(),
    })
}

/// `y` over `x`, sorted by `x`. Datetime and numeric x values keep their
/// spacing; text x values are spaced evenly in sorted order.
fn line_points(x: &Column, y_name: &str, y: &[Option<f64>]) -> ChartData {
    let (points, x_ticks) = match x.view() {
        ColumnView::Datetime(dates) => {
            let mut pairs: Vec<_> = dates
                .iter()
                .zip(y)
                .filter_map(|(d, v)| Some(((*d)?, (*v)?)))
                .collect();
            pairs.sort_by_key(|(d, _)| *d);
            let points: Vec<(f64, f64)> = pairs
                .iter()
                .map(|(d, v)| (d.and_utc().timestamp_millis() as f64, *v))
                .collect();
            let ticks = match (pairs.first(), pairs.last()) {
                (Some(first), Some(last)) => vec![
                    (points[0].0, first.0.format("%Y-%m-%d").to_string()),
                    (points[points.len() - 1].0, last.0.format("%Y-%m-%d").to_string()),
                ],
                _ => Vec::new(),
            };
            (points, ticks)
        }
        ColumnView::Numeric(xs) => {
            let mut points: Vec<(f64, f64)> = xs
                .iter()
                .zip(y)
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            let ticks = match (points.first(), points.last()) {
                (Some(first), Some(last)) => vec![
                    (first.0, format_value(first.0)),
                    (last.0, format_value(last.0)),
                ],
                _ => Vec::new(),
            };
            (points, ticks)
        }
        ColumnView::Text | ColumnView::Empty => {
            let mut pairs: Vec<(&str, f64)> = x
                .raw()
                .iter()
                .zip(y)
                .filter_map(|(a, b)| Some((a.as_deref()?, (*b)?)))
                .collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            let points: Vec<(f64, f64)> =
                pairs.iter().enumerate().map(|(i, (_, v))| (i as f64, *v)).collect();
            let positions: Vec<f64> = points.iter().map(|p| p.0).collect();
            let labels: Vec<String> = pairs
                .iter()
                .map(|(label, _)| truncate_label(label, MAX_LABEL_CHARS))
                .collect();
            (points, index_ticks(&positions, &labels))
        }
    };

    ChartData::Points {
        x_name: x.name().to_string(),
        y_name: y_name.to_string(),
        points,
        x_ticks,
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Tick labels for evenly spaced positions: all of them when few, else the
/// first, middle and last.
fn index_ticks(positions: &[f64], labels: &[String]) -> Vec<(f64, String)> {
    let n = positions.len().min(labels.len());
    let chosen: Vec<usize> = if n <= 12 {
        (0..n).collect()
    } else {
        vec![0, n / 2, n - 1]
    };
    chosen
        .into_iter()
        .map(|i| (positions[i], labels[i].clone()))
        .collect()
}

/// Equal-width bins over `[min, max]`, one per distinct value up to 30.
/// A single distinct value gets one bin of width 1 centred on it.
pub fn histogram(values: &[f64]) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let mut distinct = finite.clone();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    let bins = distinct.len().min(MAX_HISTOGRAM_BINS);

    let (mut min, mut max) = (distinct[0], distinct[distinct.len() - 1]);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in finite {
        let index = (((v - min) / width).floor() as usize).min(bins - 1);
        result[index].count += 1;
    }
    result
}

fn correlation_matrix(labels: Vec<String>, columns: &[Vec<Option<f64>>]) -> ChartData {
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in 0..n {
            values[i][j] = if i == j {
                pearson(&columns[i], &columns[j]).map(|_| 1.0)
            } else {
                pearson(&columns[i], &columns[j])
            };
        }
    }
    ChartData::Matrix { labels, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn extracted(headers: &[&str], rows: &[&[&str]]) -> ExtractedTable {
        ExtractedTable::new("", strings(headers), rows.iter().map(|r| strings(r)).collect())
    }

    fn text(name: &str, values: &[&str]) -> Column {
        Column::text(name, values.iter().map(|v| Some(v.to_string())).collect())
    }

    fn numeric(name: &str, values: &[f64]) -> Column {
        Column::new(
            name,
            values.iter().map(|v| Some(v.to_string())).collect(),
            ColumnView::Numeric(values.iter().map(|v| Some(*v)).collect()),
        )
    }

    fn sheet() -> Table {
        Table::new(
            "Sheet1",
            vec![
                text("region", &["Norte", "Sur", "Norte", "Este", "Sur", "Norte"]),
                numeric("ventas", &[100.0, 150.0, 200.0, 50.0, 250.0, 300.0]),
                numeric("coste", &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]),
            ],
        )
    }

    // ==================== Extracted table tests ====================

    #[test]
    fn test_extracted_bar_uses_label_and_first_numeric() {
        let table = extracted(&["Region", "Ventas"], &[&["Norte", "$1,200"], &["Sur", "950"]]);
        let data = from_extracted(ChartKind::Bar, &table, &InsightConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            data,
            ChartData::Categories {
                labels: strings(&["Norte", "Sur"]),
                series: vec![DataSeries {
                    name: "Ventas".to_string(),
                    values: vec![1200.0, 950.0]
                }],
                value_axis: "Ventas".to_string(),
            }
        );
    }

    #[test]
    fn test_extracted_empty_rows_is_none() {
        let table = extracted(&["A", "B"], &[]);
        for kind in ChartKind::ALL {
            assert!(from_extracted(kind, &table, &InsightConfig::default()).unwrap().is_none());
        }
    }

    #[test]
    fn test_extracted_without_numbers_is_an_error() {
        let table = extracted(&["A", "B"], &[&["x", "y"], &["z", "w"]]);
        assert!(from_extracted(ChartKind::Bar, &table, &InsightConfig::default()).is_err());
    }

    #[test]
    fn test_extracted_pie_groups_other() {
        let rows: Vec<Vec<String>> = (0..10)
            .map(|i| vec![format!("R{}", i), format!("{}%", 10)])
            .collect();
        let table = ExtractedTable::new("", strings(&["Resp", "Pct"]), rows);
        let Some(ChartData::Slices { labels, values }) =
            from_extracted(ChartKind::Pie, &table, &InsightConfig::default()).unwrap()
        else {
            panic!("expected slices");
        };
        assert_eq!(labels.len(), 9);
        assert_eq!(labels[8], "Other");
        assert_eq!(values[8], 20.0);
    }

    #[test]
    fn test_extracted_grouped_bar_series() {
        let table = extracted(&["Mes", "2023", "2024"], &[&["Ene", "1", "2"], &["Feb", "3", "4"]]);
        let Some(ChartData::Categories { series, .. }) =
            from_extracted(ChartKind::GroupedBar, &table, &InsightConfig::default()).unwrap()
        else {
            panic!("expected categories");
        };
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["2023", "2024"]);
        assert_eq!(series[1].values, vec![2.0, 4.0]);
    }

    // ==================== Sheet tests ====================

    #[test]
    fn test_sheet_bar_counts_values() {
        let spec = ChartSpec::for_sheet(ChartKind::Bar, "t", "Sheet1").x("region");
        let Some(ChartData::Categories { labels, series, value_axis }) =
            from_sheet(&spec, &sheet(), &InsightConfig::default()).unwrap()
        else {
            panic!("expected categories");
        };
        assert_eq!(labels, strings(&["Norte", "Sur", "Este"]));
        assert_eq!(series[0].values, vec![3.0, 2.0, 1.0]);
        assert_eq!(value_axis, "Frequency");
    }

    #[test]
    fn test_sheet_bar_sums_y() {
        let spec = ChartSpec::for_sheet(ChartKind::BarH, "t", "Sheet1")
            .x("region")
            .y("ventas");
        let Some(ChartData::Categories { labels, series, .. }) =
            from_sheet(&spec, &sheet(), &InsightConfig::default()).unwrap()
        else {
            panic!("expected categories");
        };
        assert_eq!(labels, strings(&["Norte", "Sur", "Este"]));
        assert_eq!(series[0].values, vec![600.0, 400.0, 50.0]);
    }

    #[test]
    fn test_sheet_grouped_bar_means() {
        let spec = ChartSpec::for_sheet(ChartKind::GroupedBar, "t", "Sheet1").x("region");
        let Some(ChartData::Categories { labels, series, .. }) =
            from_sheet(&spec, &sheet(), &InsightConfig::default()).unwrap()
        else {
            panic!("expected categories");
        };
        assert_eq!(labels[0], "Norte");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].values[0], 200.0);
        assert_eq!(series[1].values[0], 100.0 / 3.0);
    }

    #[test]
    fn test_sheet_missing_column_is_an_error() {
        let spec = ChartSpec::for_sheet(ChartKind::Bar, "t", "Sheet1").x("nope");
        let err = from_sheet(&spec, &sheet(), &InsightConfig::default()).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_sheet_histogram_rejects_text() {
        let spec = ChartSpec::for_sheet(ChartKind::Histogram, "t", "Sheet1").x("region");
        assert!(from_sheet(&spec, &sheet(), &InsightConfig::default()).is_err());
    }

    #[test]
    fn test_sheet_heatmap() {
        let spec = ChartSpec::for_sheet(ChartKind::Heatmap, "t", "Sheet1");
        let Some(ChartData::Matrix { labels, values }) =
            from_sheet(&spec, &sheet(), &InsightConfig::default()).unwrap()
        else {
            panic!("expected matrix");
        };
        assert_eq!(labels, strings(&["ventas", "coste"]));
        assert_eq!(values[0][0], Some(1.0));
        assert_eq!(values[0][1], values[1][0]);
    }

    #[test]
    fn test_sheet_empty_table_is_none() {
        let empty = Table::new("E", vec![text("a", &[])]);
        let spec = ChartSpec::for_sheet(ChartKind::Bar, "t", "E").x("a");
        assert!(from_sheet(&spec, &empty, &InsightConfig::default()).unwrap().is_none());
    }

    // ==================== Histogram tests ====================

    #[test]
    fn test_histogram_bins() {
        let bins = histogram(&[1.0, 2.0, 2.0, 3.0]);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 2, 1]);
        assert_eq!(bins[0].start, 1.0);
        assert_eq!(bins[2].end, 3.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[5.0, 5.0]);
        assert_eq!(bins.len(), 1);
        assert_eq!((bins[0].start, bins[0].end, bins[0].count), (4.5, 5.5, 2));
    }

    #[test]
    fn test_histogram_caps_bins() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let bins = histogram(&values);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
    }
}
