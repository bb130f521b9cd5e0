//! Chart proposals for raw sheets.

use crate::charts::{ChartKind, ChartSpec};
use crate::config::InsightConfig;
use crate::ingest::{Dataset, Table};
use tracing::debug;

/// Heatmaps are only proposed from this many numeric columns up.
const MIN_HEATMAP_COLUMNS: usize = 3;

/// Charts worth drawing for every non-empty sheet, in sheet order.
///
/// Per sheet: bar charts for low-cardinality categorical columns, histograms
/// for the first numeric columns, a line chart when a date and a number are
/// both present, and a correlation heatmap for three or more numeric columns.
/// Palette offsets increase across the whole list.
pub fn suggest_charts(dataset: &Dataset, config: &InsightConfig) -> Vec<ChartSpec> {
    let mut specs = Vec::new();
    for table in dataset.tables().iter().filter(|t| !t.is_empty()) {
        suggest_for_table(table, config, &mut specs);
    }
    for (offset, spec) in specs.iter_mut().enumerate() {
        spec.palette_offset = offset;
    }
    debug!("Suggested {} charts for '{}'", specs.len(), dataset.filename());
    specs
}

fn suggest_for_table(table: &Table, config: &InsightConfig, specs: &mut Vec<ChartSpec>) {
    let sheet = table.name();

    for column in table
        .categorical_columns()
        .into_iter()
        .take(config.max_suggested_bar_charts)
    {
        let Ok(distinct) = column.distinct_count() else {
            continue;
        };
        if distinct > 1 && distinct <= config.max_chart_categories {
            specs.push(
                ChartSpec::for_sheet(ChartKind::Bar, format!("Distribution: {}", column.name()), sheet)
                    .x(column.name()),
            );
        }
    }

    let numeric = table.numeric_columns();
    for column in numeric.iter().take(config.max_suggested_histograms) {
        specs.push(
            ChartSpec::for_sheet(ChartKind::Histogram, format!("Histogram: {}", column.name()), sheet)
                .x(column.name()),
        );
    }

    if let (Some(date), Some(value)) = (table.datetime_columns().first(), numeric.first()) {
        specs.push(
            ChartSpec::for_sheet(
                ChartKind::Line,
                format!("Evolution: {} over time", value.name()),
                sheet,
            )
            .x(date.name())
            .y(value.name()),
        );
    }

    if numeric.len() >= MIN_HEATMAP_COLUMNS {
        specs.push(ChartSpec::for_sheet(
            ChartKind::Heatmap,
            format!("Correlations: {}", sheet),
            sheet,
        ));
    }
}
