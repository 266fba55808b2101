//! Tabular exporters: CSV through the `csv` crate and Excel workbooks
//! through `rust_xlsxwriter`.
//!
//! Both pull rows from a source trait, so callers can stream rows out of
//! whatever they hold without building an intermediate table.

pub mod csv;
pub mod excel;

pub use self::csv::{write_csv, CsvSource, RecordsSource, TableSource};
pub use self::excel::{write_xlsx, RecordsSheet, RecordsWorkbook, SheetSource, WorkbookSource};
