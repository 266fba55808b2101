//! Excel workbook export.
//!
//! A [`WorkbookSource`] yields sheets; each [`SheetSource`] yields rows
//! tagged with the 0-based row index they belong at. Every value is
//! written as a string cell.

use std::io::Write;

use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

pub trait WorkbookSource {
    type Sheet: SheetSource;

    /// The next sheet, or `None` when the workbook is complete.
    fn next_sheet(&mut self) -> Option<Self::Sheet>;
}

pub trait SheetSource {
    fn name(&self) -> String;

    /// The next `(row index, values)` pair, or `None` when exhausted.
    fn next_row(&mut self) -> Option<(u32, Vec<String>)>;
}

/// Build the workbook from `source` and write the `.xlsx` bytes to `out`.
/// Returns the number of sheets written.
pub fn write_xlsx<W: Write>(source: &mut impl WorkbookSource, mut out: W) -> Result<usize> {
    let mut workbook = Workbook::new();
    let mut sheets = 0;

    while let Some(mut sheet) = source.next_sheet() {
        let name = sheet.name();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;
        while let Some((row, values)) = sheet.next_row() {
            for (col, value) in values.iter().enumerate() {
                let col = u16::try_from(col).map_err(|_| {
                    ExportError::Config(format!("sheet '{}' row {} has too many columns", name, row))
                })?;
                worksheet.write_string(row, col, value)?;
            }
        }
        sheets += 1;
    }
    // an empty workbook still needs one sheet to be valid
    if sheets == 0 {
        workbook.add_worksheet();
    }

    let bytes = workbook.save_to_buffer()?;
    out.write_all(&bytes)?;
    out.flush()?;
    tracing::debug!(sheets, bytes = bytes.len(), "xlsx written");
    Ok(sheets)
}

/// A sheet held in memory. Rows are written at their position in `rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsSheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(skip)]
    cursor: usize,
}

impl RecordsSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
            cursor: 0,
        }
    }
}

impl SheetSource for RecordsSheet {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn next_row(&mut self) -> Option<(u32, Vec<String>)> {
        let row = self.rows.get(self.cursor)?.clone();
        let index = u32::try_from(self.cursor).ok()?;
        self.cursor += 1;
        Some((index, row))
    }
}

/// A workbook held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsWorkbook {
    pub sheets: Vec<RecordsSheet>,
}

impl WorkbookSource for RecordsWorkbook {
    type Sheet = RecordsSheet;

    fn next_sheet(&mut self) -> Option<RecordsSheet> {
        if self.sheets.is_empty() {
            None
        } else {
            Some(self.sheets.remove(0))
        }
    }
}
