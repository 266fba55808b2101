//! # Sensor Export
//!
//! Paginated reports for tabular sensor telemetry: PDF tables laid out
//! straight onto fixed pages, plus CSV and Excel exports of the same data.
//!
//! The PDF side is row-count paginated, not measured: each table kind knows
//! how many blocks or rows fit on a page and breaks there, repeating its
//! header. Cells that breach alert thresholds are filled in alert colors.
//! Anything odd in the data (short rows, missing labels, blocks marked as
//! having no data) is reported as a warning, and the rest of the document
//! still renders.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON job / API)
//!       ↓
//!   [model]    — Cells, tables, page geometry
//!   [style]    — Colors, text and table styles
//!       ↓
//!   [layout]   — Page cursor, page hooks, cell and table layouts
//!       ↓
//!   [surface]  — Drawing primitives at absolute coordinates
//!       ↓
//!   [pdf]      — Serialize to PDF bytes
//!
//!   [export]   — CSV and Excel writers, independent of the above
//! ```

pub mod error;
pub mod export;
pub mod font;
pub mod image_loader;
pub mod job;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;
pub mod surface;

pub use error::{ExportError, Result};
pub use job::{render_job, render_job_json, RenderedReport, ReportJob};
pub use layout::{LayoutWarning, PagePipe, Report, TableOutcome};
