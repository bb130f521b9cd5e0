//! Chart classification and rendering.
//!
//! Narrative tables are classified by shape ([`classify`]) and raw sheets get
//! proposals ([`suggest_charts`]); either way the result is a [`ChartSpec`]
//! that [`ChartRenderer`] turns into PNG bytes.
//!
//! Rendering draws with `plotters` on its bitmap backend and encodes PNG
//! with `image`. Text uses an embedded DejaVu Sans face, so output does not
//! depend on system fonts.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::charts::{ChartRenderer, ChartSpec, classify};
//!
//! if let Some(kind) = classify(&table.headers, &table.rows) {
//!     let spec = ChartSpec::for_table(kind, "Ventas por region", table);
//!     let png = ChartRenderer::new(&config).render(&spec);
//! }
//! ```

pub mod classifier;
pub mod data;
mod kind;
pub mod palette;
mod renderer;
mod spec;
mod suggest;

pub use classifier::{TableShape, classify};
pub use data::ChartData;
pub use kind::ChartKind;
pub use renderer::ChartRenderer;
pub use spec::{ChartSource, ChartSpec};
pub use suggest::suggest_charts;
