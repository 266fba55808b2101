//! CSV export.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Row, SensorTable};

/// UTF-8 byte order mark, written first so spreadsheet tools pick the
/// right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A pull source of CSV records.
pub trait CsvSource {
    /// Header record, if any. Called once, before the first row.
    fn header(&mut self) -> Option<Vec<String>>;
    /// The next record, or `None` when exhausted.
    fn next_row(&mut self) -> Option<Vec<String>>;
}

/// Write the BOM, the header and every row from `source`. Records may differ
/// in length. Returns the number of data rows written.
pub fn write_csv<W: Write>(source: &mut dyn CsvSource, mut out: W) -> Result<usize> {
    out.write_all(UTF8_BOM)?;
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(out);

    if let Some(header) = source.header() {
        writer.write_record(&header)?;
    }
    let mut rows = 0;
    while let Some(row) = source.next_row() {
        writer.write_record(&row)?;
        rows += 1;
    }
    writer.flush()?;
    tracing::debug!(rows, "csv written");
    Ok(rows)
}

/// Owned header and rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsSource {
    #[serde(default)]
    pub header: Option<Vec<String>>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(skip)]
    cursor: usize,
}

impl RecordsSource {
    pub fn new(header: Option<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        Self {
            header,
            rows,
            cursor: 0,
        }
    }
}

impl CsvSource for RecordsSource {
    fn header(&mut self) -> Option<Vec<String>> {
        self.header.clone()
    }

    fn next_row(&mut self) -> Option<Vec<String>> {
        let row = self.rows.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(row)
    }
}

/// Cell values of a [`SensorTable`]. Tables with per-block headers export
/// without a header record.
pub struct TableSource<'a> {
    table: &'a SensorTable,
    rows: std::slice::Iter<'a, Row>,
}

impl<'a> TableSource<'a> {
    pub fn new(table: &'a SensorTable) -> Self {
        Self {
            table,
            rows: table.rows.iter(),
        }
    }
}

impl CsvSource for TableSource<'_> {
    fn header(&mut self) -> Option<Vec<String>> {
        let header = self.table.flat_header();
        (!self.table.header.is_per_block()).then(|| header.to_vec())
    }

    fn next_row(&mut self) -> Option<Vec<String>> {
        self.rows
            .next()
            .map(|row| row.iter().map(|cell| cell.value.clone()).collect())
    }
}
