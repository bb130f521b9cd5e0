//! Report text generation.
//!
//! [`MarkdownReport`] turns an [`AnalysisResult`](crate::analysis::AnalysisResult)
//! into the markdown document handed to the narrative step.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::analysis::QuantitativeAnalyzer;
//! use lex_insight::reporting::MarkdownReport;
//!
//! let analysis = QuantitativeAnalyzer::default().analyze(&dataset);
//! let markdown = MarkdownReport::format(&analysis);
//! ```

mod markdown;

pub use markdown::{MarkdownReport, REPORT_HEADING};
