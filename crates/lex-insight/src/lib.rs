//! Tabular Insight Library
//!
//! Turns a CSV or spreadsheet into a quality score, a quantitative analysis,
//! a markdown report and charts for narrative text about the data.
//!
//! # Overview
//!
//! - **Ingestion**: one typed table per non-empty sheet, with deterministic
//!   column names and day-first date handling
//! - **Quality scoring**: a 0-100 score with the issues behind it
//! - **Analysis**: numeric KPIs, breakdowns, cross-tabs, distributions,
//!   correlations, trends and IQR anomalies per sheet
//! - **Report text**: the analysis as markdown for a narrative writer
//! - **Narrative charts**: sections and pipe tables extracted from narrative
//!   text, classified by shape and rendered to PNG
//! - **Progress Reporting**: progress updates with cancellation support
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_insight::{CancellationToken, InsightConfig, Pipeline, StaticNarrative};
//! use std::sync::Arc;
//!
//! let bytes = std::fs::read("ventas.xlsx")?;
//!
//! // Option 1: analysis and report text only
//! let session = Pipeline::builder().build()?.run(&bytes, "ventas.xlsx")?;
//! println!("Quality: {} ({})", session.quality().score, session.quality().status().display_name());
//! println!("{}", session.report_markdown());
//!
//! // Option 2: with a narrative writer, progress and cancellation
//! let token = CancellationToken::new();
//! let session = Pipeline::builder()
//!     .config(InsightConfig::builder().enable_domain_kpis(true).build()?)
//!     .narrative_provider(Arc::new(StaticNarrative::new(narrative)))
//!     .cancellation_token(token.clone())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run(&bytes, "ventas.xlsx")?;
//!
//! for section in session.sections() {
//!     println!("{}: {} charts", section.heading, section.charts.len());
//! }
//! ```
//!
//! # Narrative Providers
//!
//! Narrative text comes from an external writer behind the
//! [`NarrativeProvider`] trait. The crate ships [`StaticNarrative`] and
//! [`EchoNarrative`]; neither performs network I/O. Narrative can also be
//! attached after a run with [`ReportSession::attach_narrative`].
//!
//! # Charts
//!
//! Charts can be drawn without a pipeline:
//!
//! ```rust,ignore
//! use lex_insight::charts::{ChartRenderer, ChartSpec, classify};
//! use lex_insight::narrative::extract_tables;
//!
//! for table in extract_tables(body) {
//!     if let Some(kind) = classify(&table.headers, &table.rows) {
//!         let png = ChartRenderer::new(&config).render(&ChartSpec::for_table(kind, "Ventas", table));
//!     }
//! }
//! ```

pub mod analysis;
pub mod charts;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod narrative;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod utils;

// Re-exports for convenient access
pub use analysis::{AnalysisResult, QuantitativeAnalyzer, TableAnalysis};
pub use charts::{ChartKind, ChartRenderer, ChartSource, ChartSpec, classify, suggest_charts};
pub use config::{ConfigValidationError, InsightConfig, InsightConfigBuilder};
pub use error::{InsightError, Result as InsightResult, ResultExt};
pub use ingest::{Column, ColumnType, Dataset, DatasetMetadata, Ingestor, Table, ingest};
pub use logging::init_tracing;
pub use narrative::{
    EchoNarrative, ExtractedTable, NarrativeProvider, ReportSection, SectionChart,
    StaticNarrative, extract_sections, extract_tables,
};
pub use pipeline::{
    CancellationToken, ClosureProgressReporter, InsightStage, Pipeline, PipelineBuilder,
    ProgressReporter, ProgressUpdate, ReportSession,
};
pub use quality::{QualityIssue, QualityReport, QualityScorer, QualityStatus, Severity};
pub use reporting::MarkdownReport;
pub use utils::{clean_numeric_string, format_value, parse_numeric_string};
