//! Time/value tables and the plain string table.
//!
//! A time/value table lays out [`TimeValueSeries`] `columns_per_row` at a
//! time. The grid layout puts each series in its own bordered column under
//! a header band; the column layout stacks a group of series in one tall
//! column, title above rows. After `rows_per_page` groups the table stops
//! and hands back the series it did not draw, so the caller can open a page
//! and continue with them.

use super::cell::{CellSpec, TEXT_INSET};
use super::{LayoutWarning, Report, TableOutcome};
use crate::error::{ExportError, Result};
use crate::model::{PlainTable, TimeValueSeries};
use crate::style::{Align, Color, TableStyle, TextBlockStyle};
use crate::surface::{RectPaint, Surface};

/// Height of header bands and plain-table rows.
pub const HEADER_HEIGHT: f64 = 20.0;
/// Space above a series title in the column layout.
const TITLE_GAP: f64 = 5.0;
/// Space between a series title and its first row in the column layout.
const TITLE_SPACING: f64 = 10.0;
/// Extra row heights the column layout reserves per series for its title.
const TITLE_ROWS: f64 = 1.5;

impl<S: Surface> Report<S> {
    /// Draw series side by side, one bordered column each, with a header
    /// band per column-row. Returns the series left for the next page.
    pub fn draw_time_value_table<'a>(
        &mut self,
        series: &'a [TimeValueSeries],
        style: &TableStyle,
    ) -> Result<&'a [TimeValueSeries]> {
        let row_height = check_value_style(style)?;
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();
        let header = CellSpec::from_block(&style.header, style.column_width, HEADER_HEIGHT);

        let mut rest = series;
        let mut groups = 0;
        while !rest.is_empty() {
            let (group, tail) = rest.split_at(style.columns_per_row.min(rest.len()));
            for s in group {
                self.cell(&s.header, &header);
            }
            self.br(HEADER_HEIGHT);

            let longest = group.iter().map(|s| s.rows.len()).max().unwrap_or(0).max(1);
            let height = row_height * longest as f64;
            let oy = self.cursor.y;
            for s in group {
                let ox = self.cursor.x;
                self.surface.fill_rect(
                    ox,
                    oy,
                    style.column_width,
                    height,
                    Color::WHITE,
                    RectPaint::FillStroke,
                );
                for row in &s.rows {
                    self.value_row(&row.texts(), &style.data);
                }
                self.cursor.x = ox + style.column_width;
                self.cursor.y = oy;
            }
            self.br(height);

            rest = tail;
            groups += 1;
            if groups == style.rows_per_page {
                break;
            }
        }

        tracing::debug!(groups, left = rest.len(), "time/value table drawn");
        Ok(rest)
    }

    /// Draw series stacked in columns, `columns_per_row` series per column,
    /// columns running left to right. The cursor ends below the tallest
    /// column. Returns the series left for the next page.
    pub fn draw_time_value_columns<'a>(
        &mut self,
        series: &'a [TimeValueSeries],
        style: &TableStyle,
    ) -> Result<&'a [TimeValueSeries]> {
        let row_height = check_value_style(style)?;
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();

        let longest = series.iter().map(|s| s.rows.len()).max().unwrap_or(0).max(1);
        let oy = self.cursor.y;
        let mut tallest: f64 = 0.0;
        let mut rest = series;
        let mut columns = 0;
        while !rest.is_empty() {
            let (group, tail) = rest.split_at(style.columns_per_row.min(rest.len()));
            let ox = self.cursor.x;
            let height = row_height * (longest as f64 + TITLE_ROWS) * group.len() as f64;
            self.surface.fill_rect(
                ox,
                oy,
                style.column_width,
                height,
                Color::WHITE,
                RectPaint::FillStroke,
            );
            tallest = tallest.max(height);

            for s in group {
                self.cursor.y += TITLE_GAP;
                self.text(&s.header, &style.header.text, Align::Left);
                self.cursor.y += TITLE_SPACING;
                self.cursor.x = ox;
                for row in &s.rows {
                    self.value_row(&row.texts(), &style.data);
                }
            }
            self.cursor.x = ox + style.column_width;
            self.cursor.y = oy;

            rest = tail;
            columns += 1;
            if columns == style.rows_per_page {
                break;
            }
        }

        self.br(tallest);
        tracing::debug!(columns, left = rest.len(), "time/value columns drawn");
        Ok(rest)
    }

    /// Draw a header row and every data row in the header style, all cells
    /// `column_width` wide.
    pub fn draw_plain_table(&mut self, table: &PlainTable, style: &TableStyle) -> TableOutcome {
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();
        let spec = CellSpec::from_block(&style.header, style.column_width, HEADER_HEIGHT);
        let mut outcome = TableOutcome::default();

        for label in &table.header {
            self.cell(label, &spec);
        }
        self.br(HEADER_HEIGHT);
        outcome.header_bands = 1;

        for (row_idx, row) in table.rows.iter().enumerate() {
            if row.len() != table.header.len() {
                outcome.warn(LayoutWarning::HeaderRowMismatch {
                    row: row_idx,
                    header_len: table.header.len(),
                    row_len: row.len(),
                });
            }
            for value in row {
                self.cell(value, &spec);
            }
            self.br(HEADER_HEIGHT);
            outcome.blocks_drawn += 1;
        }
        outcome
    }

    /// One row of field texts, each in its own style and box width, with
    /// no background. Moves down by the largest font size.
    fn value_row(&mut self, texts: &[String], styles: &[TextBlockStyle]) {
        let ox = self.cursor.clamped_x();
        let y = self.cursor.y;
        let mut x = ox;
        let mut line: f64 = 0.0;

        for (i, text) in texts.iter().enumerate() {
            let Some(field) = styles.get(i).or_else(|| styles.last()) else {
                break;
            };
            let font = &field.text;
            let tw = self.surface.measure_text(text, &font.font, font.font_size);
            let tx = match field.align {
                Align::Center => x + field.width / 2.0 - tw / 2.0,
                Align::Right => x + field.width - tw,
                Align::Left => x + TEXT_INSET,
            };
            self.surface
                .place_text(text, tx, y, &font.font, font.font_size, font.color);
            x += field.width;
            line = line.max(font.font_size);
        }

        self.cursor.y = y + line;
        self.cursor.x = ox;
    }
}

/// Reject styles the time/value layouts cannot draw with. Returns the row
/// height, the first data style's font size.
fn check_value_style(style: &TableStyle) -> Result<f64> {
    if style.columns_per_row == 0 {
        return Err(ExportError::Config(
            "value table columns_per_row must be at least 1".to_string(),
        ));
    }
    if !style.column_width.is_finite() || style.column_width <= 0.0 {
        return Err(ExportError::Config(format!(
            "value table column_width {} must be positive",
            style.column_width
        )));
    }
    style
        .data
        .first()
        .map(|field| field.text.font_size)
        .ok_or_else(|| ExportError::Config("value table needs at least one data style".to_string()))
}
