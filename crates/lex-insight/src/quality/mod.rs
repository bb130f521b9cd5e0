//! Data quality scoring.
//!
//! This module rates an ingested dataset from 0 to 100 and lists the issues
//! behind the score: empty or tiny sheets, missing values, duplicate rows,
//! constant columns and type problems.

mod scorer;

pub use scorer::{
    GLOBAL_COLUMN, IssueCategory, QualityIssue, QualityReport, QualityScorer, QualityStatus,
    QualitySummary, Severity, TableScore,
};
