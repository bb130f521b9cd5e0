//! Progress reporting and cancellation for report runs.
//!
//! A run reports coarse stages (ingest, scoring, analysis, narrative, charts)
//! and per-item progress inside the long ones (one item per sheet while
//! analyzing, one per chart while rendering). Cancellation is cooperative:
//! the pipeline polls the token between items.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::{CancellationToken, Pipeline};
//!
//! let token = CancellationToken::new();
//! let cancel = token.clone();
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     cancel.cancel();
//! });
//!
//! let session = Pipeline::builder()
//!     .cancellation_token(token)
//!     .on_progress(|update| println!("[{:?}] {}", update.stage, update.message))
//!     .build()?
//!     .run(&bytes, "ventas.xlsx");
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStage {
    /// Reading the input file into tables
    Ingesting,
    /// Scoring data quality
    QualityScoring,
    /// Computing per-sheet statistics
    Analyzing,
    /// Writing the markdown report
    ReportFormatting,
    /// Requesting narrative text and splitting it into sections and tables
    NarrativeExtraction,
    /// Drawing charts
    ChartRendering,
    Complete,
    Cancelled,
    Failed,
}

impl InsightStage {
    /// Stages a successful run passes through, in order.
    pub const WORKING: [InsightStage; 6] = [
        InsightStage::Ingesting,
        InsightStage::QualityScoring,
        InsightStage::Analyzing,
        InsightStage::ReportFormatting,
        InsightStage::NarrativeExtraction,
        InsightStage::ChartRendering,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ingesting => "Reading File",
            Self::QualityScoring => "Scoring Quality",
            Self::Analyzing => "Analyzing Sheets",
            Self::ReportFormatting => "Formatting Report",
            Self::NarrativeExtraction => "Processing Narrative",
            Self::ChartRendering => "Rendering Charts",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run this stage usually takes (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Ingesting => 0.20,
            Self::QualityScoring => 0.10,
            Self::Analyzing => 0.30,
            Self::ReportFormatting => 0.05,
            Self::NarrativeExtraction => 0.10,
            Self::ChartRendering => 0.25,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Overall progress when this stage starts.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
            working => Self::WORKING
                .iter()
                .take_while(|s| *s != working)
                .map(InsightStage::weight)
                .sum(),
        }
    }
}

/// One progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: InsightStage,

    /// What is being worked on, e.g. "Sheet: Ventas"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: InsightStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        Self {
            stage,
            sub_stage: None,
            progress: (stage.base_progress() + stage.weight() * stage_progress).clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Progress through `current` of `total` items of a stage.
    pub fn with_items(
        stage: InsightStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(InsightStage::Complete, 1.0, message)
    }

    pub fn cancelled() -> Self {
        Self::new(InsightStage::Cancelled, 0.0, "Run cancelled by user")
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(InsightStage::Failed, 0.0, message)
    }
}

/// Receives progress events. Implementations must be cheap; they are called
/// from the pipeline's thread once per sheet and once per chart.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Shared flag for cancelling a run from another thread.
///
/// Clones share state. A cancelled run ends with
/// [`InsightError::Cancelled`](crate::error::InsightError::Cancelled).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
