//! Custom error types for the insight pipeline.
//!
//! Only ingestion can fail a run. Statistics that cannot be computed are
//! omitted from results, malformed narrative tables are skipped and chart
//! render failures are logged and dropped, so those paths never surface
//! here except through [`InsightError::Render`] inside the renderer.
//!
//! Errors are serializable so a UI shell can forward them as `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the insight pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Pipeline was cancelled by the caller.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Input bytes could not be turned into a dataset.
    #[error("Failed to ingest '{filename}': {reason}")]
    Ingest { filename: String, reason: String },

    /// File extension is not one of the accepted tabular formats.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// Input contained no bytes at all.
    #[error("Input file '{0}' is empty")]
    EmptyInput(String),

    /// Sheet was not found in the dataset.
    #[error("Sheet '{0}' not found in dataset")]
    SheetNotFound(String),

    /// Column was not found in a sheet.
    #[error("Column '{0}' not found in sheet")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A chart could not be drawn from its source data.
    #[error("Failed to render chart '{title}': {reason}")]
    Render { title: String, reason: String },

    /// Internal error (e.g., a worker panicked).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Spreadsheet container error wrapper.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Image encoding error wrapper.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightError>,
    },
}

impl InsightError {
    /// Shorthand for an ingestion failure.
    pub fn ingest(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        InsightError::Ingest {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::Ingest { .. } => "INGEST_FAILED",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::SheetNotFound(_) => "SHEET_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Render { .. } => "RENDER_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Workbook(_) => "WORKBOOK_ERROR",
            Self::Image(_) => "IMAGE_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if the caller can retry with different input or settings.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Cancelled
            | Self::UnsupportedFormat(_)
            | Self::EmptyInput(_)
            | Self::InvalidConfig(_)
            | Self::Render { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(InsightError::Cancelled.error_code(), "CANCELLED");
        assert_eq!(
            InsightError::ingest("data.csv", "bad bytes").error_code(),
            "INGEST_FAILED"
        );
        assert_eq!(
            InsightError::UnsupportedFormat("txt".to_string()).error_code(),
            "UNSUPPORTED_FORMAT"
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(InsightError::Cancelled.is_cancelled());
        assert!(InsightError::Cancelled.with_context("Rendering").is_cancelled());
        assert!(!InsightError::EmptyInput("a.csv".to_string()).is_cancelled());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(InsightError::Cancelled.is_recoverable());
        assert!(InsightError::UnsupportedFormat("pdf".to_string()).is_recoverable());
        assert!(!InsightError::ingest("a.xlsx", "corrupt zip").is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = InsightError::SheetNotFound("Ventas".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("SHEET_NOT_FOUND"));
        assert!(json.contains("Ventas"));
    }

    #[test]
    fn test_with_context() {
        let error = InsightError::ColumnNotFound("region".to_string())
            .with_context("While building chart data");
        assert!(error.to_string().contains("While building chart data"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
