//! Narrative text handling.
//!
//! - [`extract_sections`] splits narrative markdown on "## " headings
//! - [`extract_tables`] pulls pipe tables out of a section body
//! - [`NarrativeProvider`] is the seam to the external text generator

mod provider;
mod sections;
mod tables;

pub use provider::{EchoNarrative, NarrativeProvider, StaticNarrative};
pub use sections::{ReportSection, SectionChart, extract_sections};
pub use tables::{ExtractedTable, extract_tables, parse_table_row};
