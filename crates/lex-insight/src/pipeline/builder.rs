//! The report pipeline.
//!
//! [`Pipeline`] runs ingestion, quality scoring, analysis and report
//! formatting over one input file and, when a narrative provider is set,
//! turns the provider's text into sections with charts.

use crate::analysis::{AnalysisResult, QuantitativeAnalyzer};
use crate::config::{ConfigValidationError, InsightConfig};
use crate::error::{InsightError, Result};
use crate::ingest::{Dataset, Ingestor};
use crate::narrative::NarrativeProvider;
use crate::pipeline::ReportSession;
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, InsightStage, ProgressReporter, ProgressUpdate,
};
use crate::quality::QualityScorer;
use crate::reporting::MarkdownReport;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs the full insight workflow over one input file.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::{InsightConfig, Pipeline, StaticNarrative};
/// use std::sync::Arc;
///
/// let session = Pipeline::builder()
///     .config(InsightConfig::builder().enable_domain_kpis(true).build()?)
///     .narrative_provider(Arc::new(StaticNarrative::new(narrative_text)))
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(&bytes, "ventas.xlsx")?;
///
/// println!("Quality score: {}", session.quality().score);
/// println!("{}", session.report_markdown());
/// ```
pub struct Pipeline {
    config: InsightConfig,
    narrative_provider: Option<Arc<dyn NarrativeProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    ingestor: Ingestor,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Run the pipeline over `bytes`, using `filename` to pick the reader.
    ///
    /// # Errors
    ///
    /// Fails when the input cannot be ingested, or with
    /// [`InsightError::Cancelled`] when the token is cancelled. Problems
    /// after ingestion (statistics that do not apply, charts that cannot be
    /// drawn, a failing narrative provider) are logged and never fail the run.
    pub fn run(&self, bytes: &[u8], filename: &str) -> Result<ReportSession> {
        match self.run_internal(bytes, filename) {
            Ok(session) => {
                self.report_progress(ProgressUpdate::complete("Report completed successfully"));
                Ok(session)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(InsightError::Cancelled);
        }
        Ok(())
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, bytes: &[u8], filename: &str) -> Result<ReportSession> {
        let start_time = Instant::now();
        info!("Starting report for '{}'", filename);

        self.report_progress(ProgressUpdate::new(
            InsightStage::Ingesting,
            0.0,
            format!("Reading {}...", filename),
        ));
        let dataset = self.ingestor.ingest(bytes, filename)?;
        self.check_cancelled()?;

        self.report_progress(ProgressUpdate::new(
            InsightStage::QualityScoring,
            0.0,
            "Scoring data quality...",
        ));
        let quality = QualityScorer::score(&dataset);
        info!(
            "Quality score {} ({}), {} issues",
            quality.score,
            quality.status().display_name(),
            quality.issues.len()
        );
        self.check_cancelled()?;

        let analysis = self.analyze(&dataset)?;

        self.report_progress(ProgressUpdate::new(
            InsightStage::ReportFormatting,
            0.0,
            "Formatting analysis report...",
        ));
        let report = MarkdownReport::format(&analysis);
        let mut session = ReportSession::new(self.config.clone(), dataset, quality, analysis, report);
        self.check_cancelled()?;

        if let Some(provider) = &self.narrative_provider {
            self.narrate(provider.as_ref(), &mut session)?;
        }

        info!(
            "Report for '{}' finished in {:.2?}",
            filename,
            start_time.elapsed()
        );
        Ok(session)
    }

    /// Analyze sheet by sheet so cancellation and progress work per sheet.
    fn analyze(&self, dataset: &Dataset) -> Result<AnalysisResult> {
        let analyzer = QuantitativeAnalyzer::new(&self.config);
        let total = dataset.len();
        let mut tables = Vec::with_capacity(total);

        for (i, table) in dataset.tables().iter().enumerate() {
            self.check_cancelled()?;
            self.report_progress(ProgressUpdate::with_items(
                InsightStage::Analyzing,
                format!("Sheet: {}", table.name()),
                i,
                total,
                format!("Analyzing sheet '{}'", table.name()),
            ));
            tables.push(analyzer.analyze_table(table));
        }

        Ok(AnalysisResult {
            tables,
            global: QuantitativeAnalyzer::global_kpis(dataset),
        })
    }

    fn narrate(&self, provider: &dyn NarrativeProvider, session: &mut ReportSession) -> Result<()> {
        self.report_progress(ProgressUpdate::new(
            InsightStage::NarrativeExtraction,
            0.0,
            format!("Requesting narrative from '{}'...", provider.name()),
        ));

        let text = match provider.narrate(session.report_markdown()) {
            Ok(text) => text,
            Err(e) => {
                warn!("Narrative provider '{}' failed: {:#}", provider.name(), e);
                return Ok(());
            }
        };
        self.check_cancelled()?;

        self.report_progress(ProgressUpdate::new(
            InsightStage::ChartRendering,
            0.0,
            "Rendering narrative charts...",
        ));
        session.attach_narrative_with(
            &text,
            &self.cancellation_token,
            self.progress_reporter.as_deref(),
        )?;
        Ok(())
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<InsightConfig>,
    narrative_provider: Option<Arc<dyn NarrativeProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    pub fn config(mut self, config: InsightConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the narrative writer called with the markdown report.
    ///
    /// Without one, the run stops after the report text; narrative can still
    /// be attached later with [`ReportSession::attach_narrative`].
    pub fn narrative_provider(mut self, provider: Arc<dyn NarrativeProvider>) -> Self {
        self.narrative_provider = Some(provider);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a token for cancelling the run from another thread.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            ingestor: Ingestor::new(&config),
            config,
            narrative_provider: self.narrative_provider,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
