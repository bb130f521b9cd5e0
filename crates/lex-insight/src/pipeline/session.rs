//! Results of one report run.

use crate::analysis::AnalysisResult;
use crate::charts::{ChartRenderer, ChartSpec, classify, suggest_charts};
use crate::config::InsightConfig;
use crate::error::{InsightError, Result};
use crate::ingest::{Dataset, DatasetMetadata};
use crate::narrative::{ReportSection, extract_sections, extract_tables};
use crate::pipeline::progress::{CancellationToken, InsightStage, ProgressReporter, ProgressUpdate};
use crate::quality::QualityReport;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Title for charts whose table has neither a caption nor a section heading.
pub const DEFAULT_CHART_TITLE: &str = "Report data";

/// Everything a run produced for one input file.
///
/// Narrative text can be attached after the run (see [`attach_narrative`]);
/// each attached section carries the charts drawn from its tables.
///
/// [`attach_narrative`]: ReportSession::attach_narrative
#[derive(Debug, Clone)]
pub struct ReportSession {
    config: InsightConfig,
    dataset: Dataset,
    metadata: DatasetMetadata,
    quality: QualityReport,
    analysis: AnalysisResult,
    report_markdown: String,
    sections: Vec<ReportSection>,
    next_palette_offset: usize,
}

/// A chart waiting to be drawn for section `section`.
struct PlannedChart {
    section: usize,
    spec: ChartSpec,
}

impl ReportSession {
    pub(crate) fn new(
        config: InsightConfig,
        dataset: Dataset,
        quality: QualityReport,
        analysis: AnalysisResult,
        report_markdown: String,
    ) -> Self {
        let metadata = dataset.metadata();
        Self {
            config,
            dataset,
            metadata,
            quality,
            analysis,
            report_markdown,
            sections: Vec::new(),
            next_palette_offset: 0,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn quality(&self) -> &QualityReport {
        &self.quality
    }

    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    /// The computed analysis as markdown, ready to hand to a narrative writer.
    pub fn report_markdown(&self) -> &str {
        &self.report_markdown
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Total charts attached across all sections.
    pub fn chart_count(&self) -> usize {
        self.sections.iter().map(|s| s.charts.len()).sum()
    }

    /// Split narrative text into sections, chart every classifiable table and
    /// append the sections. Returns the number of charts attached.
    ///
    /// Tables that cannot be charted are skipped; this never fails.
    pub fn attach_narrative(&mut self, text: &str) -> usize {
        self.attach_narrative_with(text, &CancellationToken::new(), None)
            .unwrap_or_default()
    }

    /// [`attach_narrative`](Self::attach_narrative) with cancellation between
    /// charts and per-chart progress.
    pub(crate) fn attach_narrative_with(
        &mut self,
        text: &str,
        token: &CancellationToken,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<usize> {
        let mut sections = extract_sections(text);
        let planned = self.plan_charts(&sections);
        debug!(
            "Narrative has {} sections and {} chartable tables",
            sections.len(),
            planned.len()
        );

        let base = self.next_palette_offset;
        let specs: Vec<ChartSpec> = planned
            .iter()
            .enumerate()
            .map(|(i, plan)| plan.spec.clone().palette_offset(base + i))
            .collect();
        let pngs = self.render_checked(&specs, token, progress)?;

        // Offsets only advance over attached charts. A chart that failed to
        // draw shifts the ones after it, which are drawn again.
        let renderer = ChartRenderer::new(&self.config).with_dataset(&self.dataset);
        let mut attached = 0;
        for ((plan, spec), png) in planned.iter().zip(specs).zip(pngs) {
            let offset = base + attached;
            let png = match png {
                Some(_) if spec.palette_offset != offset => {
                    renderer.render(&spec.clone().palette_offset(offset))
                }
                png => png,
            };
            if let Some(png) = png {
                sections[plan.section].attach_chart(spec.title, png);
                attached += 1;
            }
        }
        self.next_palette_offset = base + attached;
        info!("Attached {} of {} charts", attached, planned.len());
        self.sections.extend(sections);
        Ok(attached)
    }

    /// Render the charts proposed for the raw sheets, in proposal order.
    /// Charts that cannot be drawn are left out.
    pub fn render_suggested_charts(&self) -> Vec<(ChartSpec, Vec<u8>)> {
        let specs = suggest_charts(&self.dataset, &self.config);
        let renderer = ChartRenderer::new(&self.config).with_dataset(&self.dataset);
        let pngs = renderer.render_batch(&specs);
        specs
            .into_iter()
            .zip(pngs)
            .filter_map(|(spec, png)| Some((spec, png?)))
            .collect()
    }

    /// Classify every table of every section, keeping the ones whose data
    /// resolves. Palette offsets are handed out later, in this order.
    fn plan_charts(&self, sections: &[ReportSection]) -> Vec<PlannedChart> {
        let renderer = ChartRenderer::new(&self.config);
        let mut planned = Vec::new();
        for (index, section) in sections.iter().enumerate() {
            for table in extract_tables(&section.body) {
                let Some(kind) = classify(&table.headers, &table.rows) else {
                    continue;
                };
                let title = chart_title(&table.context, &section.heading);
                let spec = ChartSpec::for_table(kind, title, table);
                match renderer.prepare(&spec) {
                    Ok(Some(_)) => planned.push(PlannedChart {
                        section: index,
                        spec,
                    }),
                    Ok(None) => debug!("Table '{}' has no rows to chart", spec.title),
                    Err(e) => debug!("Table '{}' not charted: {}", spec.title, e),
                }
            }
        }
        planned
    }

    fn render_checked(
        &self,
        specs: &[ChartSpec],
        token: &CancellationToken,
        progress: Option<&dyn ProgressReporter>,
    ) -> Result<Vec<Option<Vec<u8>>>> {
        let renderer = ChartRenderer::new(&self.config).with_dataset(&self.dataset);
        let total = specs.len();
        let done = AtomicUsize::new(0);

        let render_one = |spec: &ChartSpec| -> Option<Vec<u8>> {
            if token.is_cancelled() {
                return None;
            }
            let png = renderer.render(spec);
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(reporter) = progress {
                reporter.report(ProgressUpdate::with_items(
                    InsightStage::ChartRendering,
                    format!("Chart: {}", spec.title),
                    finished,
                    total,
                    format!("Rendered chart {}/{}", finished, total),
                ));
            }
            png
        };

        let pngs: Vec<Option<Vec<u8>>> = if self.config.parallel_rendering {
            specs.par_iter().map(|spec| render_one(spec)).collect()
        } else {
            specs.iter().map(|spec| render_one(spec)).collect()
        };

        if token.is_cancelled() {
            return Err(InsightError::Cancelled);
        }
        Ok(pngs)
    }
}

fn chart_title(caption: &str, heading: &str) -> String {
    [caption, heading]
        .into_iter()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or(DEFAULT_CHART_TITLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::QuantitativeAnalyzer;
    use crate::charts::palette::PALETTE;
    use crate::ingest::ingest;
    use crate::quality::QualityScorer;
    use crate::reporting::MarkdownReport;
    use plotters::style::RGBColor;
    use pretty_assertions::assert_eq;

    const CSV: &[u8] = b"region,ventas,coste\nNorte,100,10\nSur,150,30\nNorte,200,20\nEste,50,5\n";

    fn session() -> ReportSession {
        let config = InsightConfig::default();
        let dataset = ingest(CSV, "ventas.csv").unwrap();
        let quality = QualityScorer::score(&dataset);
        let analysis = QuantitativeAnalyzer::new(&config).analyze(&dataset);
        let report = MarkdownReport::format(&analysis);
        ReportSession::new(config, dataset, quality, analysis, report)
    }

    const NARRATIVE: &str = "\
## Resumen

Las ventas crecieron.

Ventas por region
| Region | Ventas |
|---|---|
| Norte | 300 |
| Sur | 150 |
| Este | 50 |

## Detalle

| Mes | 2023 | 2024 |
|---|---|---|
| Ene | 10 | 12 |
| Feb | 11 | 15 |

| Nombre | Ciudad |
|---|---|
| Ana | Lima |
| Luis | Quito |
";

    #[test]
    fn test_chart_title_fallbacks() {
        assert_eq!(chart_title("Caption", "Heading"), "Caption");
        assert_eq!(chart_title("  ", "Heading"), "Heading");
        assert_eq!(chart_title("", ""), DEFAULT_CHART_TITLE);
    }

    #[test]
    fn test_attach_narrative_charts_tables_in_order() {
        let mut session = session();
        let attached = session.attach_narrative(NARRATIVE);
        assert_eq!(attached, 2);

        let sections = session.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "Resumen");
        assert_eq!(sections[0].charts[0].caption, "Ventas por region");
        assert_eq!(sections[1].charts.len(), 1);
        assert_eq!(sections[1].charts[0].caption, "Detalle");
        assert!(sections[1].charts[0].png.starts_with(b"\x89PNG"));
        assert_eq!(session.chart_count(), 2);
    }

    #[test]
    fn test_palette_offsets_continue_across_calls() {
        let mut session = session();
        session.attach_narrative(NARRATIVE);
        assert_eq!(session.next_palette_offset, 2);
        session.attach_narrative(NARRATIVE);
        assert_eq!(session.next_palette_offset, 4);
        assert_eq!(session.sections().len(), 4);
    }

    #[test]
    fn test_unchartable_table_does_not_take_a_color() {
        let narrative = "\
## Uno

| Region | Ventas |
|---|---|
| Norte | 300 |
| Sur | 150 |

## Dos

| Segmento | Cuota |
|---|---|
| A | 0% |
| B | 0% |

## Tres

| Region | Coste |
|---|---|
| Norte | 30 |
| Sur | 15 |
";
        let mut session = session();
        assert_eq!(session.attach_narrative(narrative), 2);
        assert_eq!(session.next_palette_offset, 2);
        assert!(session.sections()[1].charts.is_empty());

        // Second chart starts on the second palette color.
        let png = &session.sections()[2].charts[0].png;
        let decoded = image::load_from_memory(png).unwrap().to_rgb8();
        let has = |c: RGBColor| decoded.pixels().any(|p| p.0 == [c.0, c.1, c.2]);
        assert!(has(PALETTE[1]));
        assert!(has(PALETTE[2]));
        assert!(!has(PALETTE[0]));
    }

    #[test]
    fn test_narrative_without_tables() {
        let mut session = session();
        assert_eq!(session.attach_narrative("Solo texto, sin encabezados."), 0);
        assert_eq!(session.sections().len(), 1);
        assert_eq!(session.sections()[0].heading, "");
    }

    #[test]
    fn test_cancelled_token_stops_rendering() {
        let mut session = session();
        let token = CancellationToken::new();
        token.cancel();
        let err = session
            .attach_narrative_with(NARRATIVE, &token, None)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(session.sections().is_empty());
    }

    #[test]
    fn test_render_suggested_charts() {
        let session = session();
        let charts = session.render_suggested_charts();
        let kinds: Vec<String> = charts.iter().map(|(s, _)| s.kind.to_string()).collect();
        assert_eq!(kinds, vec!["bar", "histogram", "histogram"]);
        assert!(charts.iter().all(|(_, png)| !png.is_empty()));
    }
}
