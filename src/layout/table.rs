//! Single-header tables: the fixed grid, the paged (time, state) table and
//! the state chart strip.

use super::cell::CellSpec;
use super::page_break::state_row_break;
use super::{LayoutWarning, PagePipe, Report, TableOutcome};
use crate::error::{ExportError, Result};
use crate::model::{AlertState, Cell, SensorTable};
use crate::style::{Align, FixRowColumnTableStyle, StateTableStyle, TextBlockStyle, Valign};
use crate::surface::{RectPaint, Surface};

const ROW_HEIGHT: f64 = 20.0;
/// Data rows between repeated chart header bands.
pub const CHART_ROWS_PER_HEADER: usize = 4;
/// Slots drawn per header column in a chart row.
pub const CHART_SLOTS_PER_COLUMN: f64 = 5.0;
const CHART_TICK_HEIGHT: f64 = 10.0;

impl<S: Surface> Report<S> {
    /// Draw the header row and every data row under it, with no paging.
    pub fn draw_sensor_table(
        &mut self,
        table: &SensorTable,
        style: &FixRowColumnTableStyle,
    ) -> TableOutcome {
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();
        let header = table.header.header_for(0).unwrap_or(&[]);
        let mut outcome = TableOutcome::default();

        for (i, label) in header.iter().enumerate() {
            let spec = if i == 0 {
                label_spec(style)
            } else {
                CellSpec::from_block(&style.row_header, style.row_header.width, ROW_HEIGHT)
            };
            self.cell(label, &spec);
        }
        self.br(ROW_HEIGHT);
        outcome.header_bands = 1;

        for (row_idx, row) in table.rows.iter().enumerate() {
            if row.len() != header.len() {
                outcome.warn(LayoutWarning::HeaderRowMismatch {
                    row: row_idx,
                    header_len: header.len(),
                    row_len: row.len(),
                });
            }
            for (i, cell) in row.iter().enumerate() {
                let spec = if i == 0 {
                    label_spec(style)
                } else {
                    CellSpec::from_block(&style.row_header, style.row_header.width, ROW_HEIGHT)
                        .colored_as(grid_role(cell, style))
                };
                self.cell(&cell.value, &spec);
            }
            self.br(ROW_HEIGHT);
            outcome.blocks_drawn += 1;
        }
        outcome
    }

    /// Draw a two-column (time, state) table, repeating the header on a new
    /// page every `style.max_row_count` rows.
    pub fn draw_state_table(
        &mut self,
        table: &SensorTable,
        style: &StateTableStyle,
        pipes: &mut [&mut dyn PagePipe<S>],
    ) -> Result<TableOutcome> {
        if style.max_row_count == 0 {
            return Err(ExportError::Config(
                "state table max_row_count must be at least 1".to_string(),
            ));
        }
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();
        let header = table.header.header_for(0).unwrap_or(&[]);
        let mut outcome = TableOutcome::default();

        self.state_header(header, style);
        outcome.header_bands = 1;

        for (n, row) in table.rows.iter().enumerate() {
            if state_row_break(n, style.max_row_count).is_new_page() {
                self.add_direct_page(pipes);
                self.state_header(header, style);
                outcome.page_breaks.push(n);
                outcome.header_bands += 1;
            }
            if row.len() != header.len() {
                outcome.warn(LayoutWarning::HeaderRowMismatch {
                    row: n,
                    header_len: header.len(),
                    row_len: row.len(),
                });
            }
            for (i, cell) in row.iter().enumerate() {
                let block = state_column(style, i);
                let spec = CellSpec::from_block(block, block.width, ROW_HEIGHT);
                self.cell(&cell.value, &spec);
            }
            self.br(ROW_HEIGHT);
            outcome.blocks_drawn += 1;
        }
        Ok(outcome)
    }

    fn state_header(&mut self, header: &[String], style: &StateTableStyle) {
        for (i, label) in header.iter().enumerate() {
            let block = state_column(style, i);
            let spec = CellSpec::from_block(block, block.width, ROW_HEIGHT)
                .with_background(style.header_background);
            self.cell(label, &spec);
        }
        self.br(ROW_HEIGHT);
    }

    /// Draw a timeline strip: one row of colored slots per data row, with
    /// a labelled tick band every few rows. `header[0]` names the label
    /// column and is drawn blank; `end_label` closes each band.
    pub fn draw_state_chart_table(
        &mut self,
        table: &SensorTable,
        style: &FixRowColumnTableStyle,
        end_label: &str,
    ) -> TableOutcome {
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();
        let header = table.header.header_for(0).unwrap_or(&[]);
        let slot_width = style.row_header.width / CHART_SLOTS_PER_COLUMN;
        let mut outcome = TableOutcome::default();

        for (n, row) in table.rows.iter().enumerate() {
            if n % CHART_ROWS_PER_HEADER == 0 {
                self.chart_header(header, style, end_label);
                outcome.header_bands += 1;
            }

            for (i, cell) in row.iter().enumerate() {
                if i == 0 {
                    self.cell(&cell.value, &label_spec(style));
                    continue;
                }
                let fill = if cell.alert.is_alert() {
                    &style.heat_alert
                } else if cell.is_no_data() {
                    &style.blank
                } else {
                    &style.content
                };
                let spec = CellSpec::from_block(&style.row_header, slot_width, ROW_HEIGHT)
                    .with_background(fill.background);
                self.cell("", &spec);
            }
            self.br(ROW_HEIGHT);
            outcome.blocks_drawn += 1;
        }
        outcome
    }

    fn chart_header(&mut self, header: &[String], style: &FixRowColumnTableStyle, end_label: &str) {
        self.br(2.0);
        let chart = &style.chart_header;
        for (i, label) in header.iter().enumerate() {
            if i == 0 {
                self.chart_cell("", chart, style.column_header.width - 12.0, Align::Center);
            } else {
                self.chart_cell(label, chart, style.row_header.width, Align::Left);
            }
        }
        self.chart_cell(end_label, chart, style.row_header.width, Align::Left);
        self.br(22.0);

        let y = self.cursor.y;
        let mut x = self.cursor.x + style.column_header.width;
        for _ in 0..=header.len() {
            self.line_xy(1.0, x, y, x, y + CHART_TICK_HEIGHT);
            x += style.row_header.width;
        }
        self.br(12.0);
    }

    fn chart_cell(&mut self, text: &str, chart: &TextBlockStyle, width: f64, align: Align) {
        let spec = CellSpec::from_block(chart, width, ROW_HEIGHT)
            .aligned(align, Valign::Bottom)
            .with_paint(RectPaint::Fill);
        self.cell(text, &spec);
    }
}

fn label_spec(style: &FixRowColumnTableStyle) -> CellSpec<'_> {
    CellSpec::from_block(&style.column_header, style.column_header.width, ROW_HEIGHT)
}

/// Grid tables check the header flag before alerts.
fn grid_role<'s>(cell: &Cell, style: &'s FixRowColumnTableStyle) -> &'s TextBlockStyle {
    if cell.is_header {
        return &style.row_header;
    }
    match cell.alert {
        AlertState::High => &style.heat_alert,
        AlertState::Low => &style.cool_alert,
        AlertState::None => &style.content,
    }
}

fn state_column(style: &StateTableStyle, index: usize) -> &TextBlockStyle {
    if index % 2 == 0 {
        &style.column_time
    } else {
        &style.column_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::model::{Edges, Metadata, PageSetup, PageSize};
    use crate::style::Color;
    use crate::surface::DrawOp;

    fn report() -> Report {
        Report::new(
            FontContext::new(),
            PageSetup {
                size: PageSize::A4,
                margin: Edges::uniform(20.0),
            },
            Metadata::default(),
        )
        .unwrap()
    }

    fn state_rows(n: usize) -> SensorTable {
        let mut table = SensorTable::new(["Time", "State"]);
        for i in 0..n {
            table.add_row(vec![Cell::new(format!("10:{:02}", i)), Cell::new("on")]);
        }
        table
    }

    #[test]
    fn grid_draws_header_plus_rows() {
        let mut r = report();
        let mut table = SensorTable::new(["Sensor", "Max", "Min"]);
        table.add_row(vec![Cell::new("T1"), Cell::new("30"), Cell::new("10")]);
        table.add_row(vec![Cell::new("T2"), Cell::new("31"), Cell::new("11")]);
        let outcome = r.draw_sensor_table(&table, &FixRowColumnTableStyle::default());

        assert_eq!(outcome.blocks_drawn, 2);
        assert_eq!(r.y(), 20.0 + 3.0 * 20.0);
        let ys: Vec<f64> = r.pages()[0].rects().map(|r| r.1).collect();
        assert_eq!(ys, vec![20.0, 20.0, 20.0, 40.0, 40.0, 40.0, 60.0, 60.0, 60.0]);
    }

    #[test]
    fn grid_header_flag_beats_alert() {
        let mut r = report();
        let mut table = SensorTable::new(["Sensor", "a", "b", "c"]);
        let mut flagged = Cell::high("50");
        flagged.is_header = true;
        table.add_row(vec![Cell::new("T1"), flagged, Cell::high("50"), Cell::low("1")]);
        r.draw_sensor_table(&table, &FixRowColumnTableStyle::default());

        let fills: Vec<Color> = r.pages()[0].rects().map(|r| r.4).skip(5).collect();
        assert_eq!(fills, vec![Color::GRAY, Color::HEAT_ALERT, Color::COOL_ALERT]);
    }

    #[test]
    fn grid_warns_on_short_row() {
        let mut r = report();
        let mut table = SensorTable::new(["Sensor", "Max"]);
        table.add_row(vec![Cell::new("T1")]);
        let outcome = r.draw_sensor_table(&table, &FixRowColumnTableStyle::default());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn state_table_breaks_and_repeats_header() {
        let mut r = report();
        let style = StateTableStyle {
            max_row_count: 3,
            ..StateTableStyle::default()
        };
        let outcome = r.draw_state_table(&state_rows(7), &style, &mut []).unwrap();
        assert_eq!(outcome.page_breaks, vec![3, 6]);
        assert_eq!(outcome.header_bands, 3);
        assert_eq!(r.page(), 3);
        for page in r.pages() {
            let first = page.texts().next().unwrap();
            assert_eq!(first.0, "Time");
        }
    }

    #[test]
    fn state_columns_alternate_by_parity() {
        let mut r = report();
        let style = StateTableStyle::default();
        r.draw_state_table(&state_rows(1), &style, &mut []).unwrap();
        let widths: Vec<(f64, Color)> = r.pages()[0].rects().map(|r| (r.2, r.4)).collect();
        assert_eq!(
            widths,
            vec![
                (100.0, Color::GRAY),
                (85.0, Color::GRAY),
                (100.0, Color::WHITE),
                (85.0, Color::WHITE),
            ]
        );
    }

    #[test]
    fn state_table_rejects_zero_max_rows() {
        let mut r = report();
        let style = StateTableStyle {
            max_row_count: 0,
            ..StateTableStyle::default()
        };
        assert!(matches!(
            r.draw_state_table(&state_rows(2), &style, &mut []),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn chart_header_every_four_rows() {
        let mut r = report();
        let style = FixRowColumnTableStyle::default();
        let mut table = SensorTable::new(["Day", "00", "06", "12", "18"]);
        for d in 0..5 {
            table.add_row(vec![
                Cell::new(format!("d{}", d)),
                Cell::high("1"),
                Cell::no_data(),
                Cell::new("0"),
            ]);
        }
        let outcome = r.draw_state_chart_table(&table, &style, "24");
        assert_eq!(outcome.header_bands, 2);

        let ticks = r.pages()[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .count();
        assert_eq!(ticks, 2 * 6);

        // header band: blank + 4 labels + end label, then the first row
        let rects: Vec<_> = r.pages()[0].rects().collect();
        assert_eq!(rects[0].2, 75.0 - 12.0);
        assert_eq!(rects[5].4, Color::WHITE);
        let slots: Vec<(f64, Color)> = rects[7..10].iter().map(|r| (r.2, r.4)).collect();
        assert_eq!(
            slots,
            vec![
                (8.0, Color::HEAT_ALERT),
                (8.0, Color::GRAY),
                (8.0, Color::WHITE),
            ]
        );
    }

    #[test]
    fn chart_band_geometry() {
        let mut r = report();
        let style = FixRowColumnTableStyle::default();
        let mut table = SensorTable::new(["Day", "00"]);
        table.add_row(vec![Cell::new("d0"), Cell::new("0")]);
        r.draw_state_chart_table(&table, &style, "24");

        let first_tick = r.pages()[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Line { x1, y1, y2, .. } => Some((*x1, *y1, *y2)),
                _ => None,
            })
            .unwrap();
        // 2 + 22 below the top margin, offset by the label column
        assert_eq!(first_tick, (95.0, 44.0, 54.0));
        // ticks, then 12, then one row
        assert_eq!(r.y(), 44.0 + 12.0 + 20.0);
    }
}
