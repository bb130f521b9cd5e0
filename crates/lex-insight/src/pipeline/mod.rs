//! Pipeline module.
//!
//! [`Pipeline`] orchestrates a report run and returns a [`ReportSession`];
//! [`progress`] carries progress events and cancellation.

mod builder;
pub mod progress;
mod session;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{
    CancellationToken, ClosureProgressReporter, InsightStage, ProgressReporter, ProgressUpdate,
};
pub use session::{DEFAULT_CHART_TITLE, ReportSession};
