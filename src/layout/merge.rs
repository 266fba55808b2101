//! # Merge Table
//!
//! One block per row: a row label cell spanning the block's height on the
//! left, then the row's data cells wrapped into bands of
//! [`COLUMNS_PER_BAND`] columns. Each band opens with the matching slice
//! of header labels on its own line. A new page starts every
//! `page_rows` blocks (see [`merge_block_break`]).
//!
//! The band bookkeeping lives in [`MergeState`], kept apart from drawing
//! so the wrap rules can be checked on their own.

use std::ops::Range;

use super::cell::CellSpec;
use super::page_break::merge_block_break;
use super::{LayoutWarning, PagePipe, Report, TableOutcome};
use crate::error::{ExportError, Result};
use crate::model::{AlertState, HeaderSource, SensorTable};
use crate::style::FixRowColumnTableStyle;
use crate::surface::Surface;

/// Data columns per band before the row wraps.
pub const COLUMNS_PER_BAND: usize = 12;
/// Height of one header or data line.
pub const LINE_HEIGHT: f64 = 20.0;

/// Paging and sizing for a merge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Blocks per page.
    pub page_rows: usize,
    /// Lines the row label cell spans.
    pub merge_rows: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            page_rows: 6,
            merge_rows: 4,
        }
    }
}

/// Where the next data cell falls relative to the band structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Header labels to draw before this cell when it opens a band.
    pub open_band: Option<Range<usize>>,
    /// This cell fills its band; wrap after drawing it.
    pub close_band: bool,
}

/// Block and band counters for a merge table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeState {
    /// 1-based block counter. Skipped blocks still advance it.
    pub block: usize,
    /// 1-based index of the last data cell placed in the current block.
    pub column: usize,
    /// 0-based index of the current band.
    pub band: usize,
    /// End of the header labels consumed so far in this block.
    pub header_scan: usize,
    band_open: bool,
}

impl Default for MergeState {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeState {
    pub fn new() -> Self {
        Self {
            block: 1,
            column: 0,
            band: 0,
            header_scan: 0,
            band_open: false,
        }
    }

    pub fn needs_page_break(&self, page_rows: usize) -> bool {
        merge_block_break(self.block, page_rows).is_new_page()
    }

    /// Reset the band counters for a block about to be drawn.
    pub fn enter_block(&mut self) {
        self.column = 0;
        self.band = 0;
        self.header_scan = 0;
        self.band_open = false;
    }

    /// Place the next data cell of a block whose header has `header_len`
    /// labels.
    pub fn advance(&mut self, header_len: usize) -> Placement {
        self.column += 1;
        let i = self.column;

        let open_band = if (i - 1) % COLUMNS_PER_BAND == 0 {
            self.band = (i - 1) / COLUMNS_PER_BAND;
            let start = (self.band * COLUMNS_PER_BAND).min(header_len);
            let end = (start + COLUMNS_PER_BAND).min(header_len);
            self.header_scan = end;
            self.band_open = true;
            Some(start..end)
        } else {
            None
        };

        let close_band = i % COLUMNS_PER_BAND == 0;
        if close_band {
            self.band_open = false;
        }
        Placement {
            open_band,
            close_band,
        }
    }

    /// Finish a drawn block. Returns true when its last band was short and
    /// still needs a line break.
    pub fn leave_block(&mut self) -> bool {
        let short_band = self.band_open;
        self.band_open = false;
        self.block += 1;
        short_band
    }

    /// Advance past a block that is not drawn.
    pub fn skip_block(&mut self) {
        self.band_open = false;
        self.block += 1;
    }
}

impl<S: Surface> Report<S> {
    /// Draw a merge table with one header shared by every block.
    pub fn draw_sensor_merge_table(
        &mut self,
        table: &SensorTable,
        options: MergeOptions,
        style: &FixRowColumnTableStyle,
        pipes: &mut [&mut dyn PagePipe<S>],
    ) -> Result<TableOutcome> {
        if table.header.is_per_block() {
            return Err(ExportError::Config(
                "merge table needs a flat header; use the dynamic header variant".to_string(),
            ));
        }
        self.draw_merge_table(table, options, style, pipes)
    }

    /// Draw a merge table whose header changes per block. Blocks whose
    /// first data cell is the no-data marker are skipped.
    pub fn draw_sensor_dynamic_header_merge_table(
        &mut self,
        table: &SensorTable,
        options: MergeOptions,
        style: &FixRowColumnTableStyle,
        pipes: &mut [&mut dyn PagePipe<S>],
    ) -> Result<TableOutcome> {
        if !table.header.is_per_block() {
            return Err(ExportError::Config(
                "dynamic header merge table needs per-block headers".to_string(),
            ));
        }
        self.draw_merge_table(table, options, style, pipes)
    }

    /// Draw a merge table with either header kind.
    pub fn draw_merge_table(
        &mut self,
        table: &SensorTable,
        options: MergeOptions,
        style: &FixRowColumnTableStyle,
        pipes: &mut [&mut dyn PagePipe<S>],
    ) -> Result<TableOutcome> {
        if options.page_rows == 0 {
            return Err(ExportError::Config(
                "merge table page_rows must be at least 1".to_string(),
            ));
        }
        if options.page_rows.checked_add(1).is_none() {
            return Err(ExportError::Config(format!(
                "merge table page_rows {} is out of range",
                options.page_rows
            )));
        }
        self.ensure_page();
        self.cursor.x = self.cursor.clamped_x();

        let per_block = matches!(table.header, HeaderSource::PerBlock(_));
        let label_height = options.merge_rows as f64 * LINE_HEIGHT;
        let band_indent = self.cursor.margin.left + style.column_header.width;
        let mut state = MergeState::new();
        let mut outcome = TableOutcome::default();

        for (row_idx, row) in table.rows.iter().enumerate() {
            let block = state.block;

            if per_block && row.get(1).is_some_and(|c| c.is_no_data()) {
                outcome.skip(LayoutWarning::NoDataBlock { block });
                state.skip_block();
                self.cursor.reset_x();
                continue;
            }
            let Some(header) = table.header.header_for(block - 1) else {
                outcome.skip(LayoutWarning::MissingBlockHeader { block });
                state.skip_block();
                self.cursor.reset_x();
                continue;
            };

            if state.needs_page_break(options.page_rows) {
                self.add_direct_page(pipes);
                outcome.page_breaks.push(block);
            }

            let label = match row.first() {
                Some(cell) if !cell.value.is_empty() => cell,
                _ => {
                    outcome.skip(LayoutWarning::EmptyRowLabel { block });
                    state.skip_block();
                    self.cursor.reset_x();
                    continue;
                }
            };
            let data = &row[1..];
            if data.len() != header.len() {
                outcome.warn(LayoutWarning::HeaderRowMismatch {
                    row: row_idx,
                    header_len: header.len(),
                    row_len: data.len(),
                });
            }

            state.enter_block();
            let spec =
                CellSpec::from_block(&style.column_header, style.column_header.width, label_height);
            self.cell(&label.value, &spec);

            for cell in data {
                let placement = state.advance(header.len());

                if let Some(range) = placement.open_band {
                    let spec = CellSpec::from_block(
                        &style.column_header,
                        style.row_header.width,
                        LINE_HEIGHT,
                    );
                    for text in &header[range] {
                        self.cell(text, &spec);
                    }
                    self.br(LINE_HEIGHT);
                    self.cursor.x = band_indent;
                    outcome.header_bands += 1;
                }

                let role = match cell.alert {
                    AlertState::High => &style.heat_alert,
                    AlertState::Low => &style.cool_alert,
                    AlertState::None => &style.content,
                };
                let spec = CellSpec::from_block(&style.row_header, style.row_header.width, LINE_HEIGHT)
                    .colored_as(role);
                self.cell(&cell.value, &spec);

                if placement.close_band {
                    self.br(LINE_HEIGHT);
                    self.cursor.x = band_indent;
                }
            }

            if state.leave_block() {
                self.br(LINE_HEIGHT);
            }
            self.cursor.reset_x();
            outcome.blocks_drawn += 1;
        }

        tracing::debug!(
            blocks = outcome.blocks_drawn,
            skipped = outcome.blocks_skipped,
            bands = outcome.header_bands,
            "merge table drawn"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::model::{Cell, Edges, Metadata, PageSetup, PageSize};
    use crate::style::Color;

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

    fn hours(n: usize) -> Vec<String> {
        (0..n).map(|h| format!("{:02}", h)).collect()
    }

    fn block_row(label: &str, n: usize) -> Vec<Cell> {
        let mut row = vec![Cell::new(label)];
        row.extend((0..n).map(|i| Cell::new(format!("{}.0", i))));
        row
    }

    #[test]
    fn bands_open_every_twelve_columns() {
        let mut state = MergeState::new();
        state.enter_block();
        let placements: Vec<Placement> = (0..24).map(|_| state.advance(24)).collect();

        assert_eq!(placements[0].open_band, Some(0..12));
        assert_eq!(placements[12].open_band, Some(12..24));
        assert!(placements[11].close_band);
        assert!(placements[23].close_band);
        let opens = placements.iter().filter(|p| p.open_band.is_some()).count();
        assert_eq!(opens, 2);
        assert!(!state.leave_block());
    }

    #[test]
    fn short_band_needs_trailing_break() {
        let mut state = MergeState::new();
        state.enter_block();
        let placements: Vec<Placement> = (0..14).map(|_| state.advance(14)).collect();
        assert_eq!(placements[12].open_band, Some(12..14));
        assert_eq!(state.header_scan, 14);
        assert!(state.leave_block());
        assert_eq!(state.block, 2);
    }

    #[test]
    fn header_range_clamped_when_row_longer_than_header() {
        let mut state = MergeState::new();
        state.enter_block();
        for _ in 0..12 {
            state.advance(5);
        }
        assert_eq!(state.advance(5).open_band, Some(5..5));
    }

    #[test]
    fn skipped_blocks_advance_counter() {
        let mut state = MergeState::new();
        state.skip_block();
        state.skip_block();
        assert_eq!(state.block, 3);
        assert!(state.needs_page_break(2));
    }

    #[test]
    fn band_count_per_block() {
        let mut r = report();
        let mut table = SensorTable::new(hours(24));
        table.add_row(block_row("2024-01-01", 24));
        table.add_row(block_row("2024-01-02", 24));
        let outcome = r
            .draw_sensor_merge_table(&table, MergeOptions::default(), &Default::default(), &mut [])
            .unwrap();
        assert_eq!(outcome.blocks_drawn, 2);
        assert_eq!(outcome.header_bands, 4);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn block_geometry() {
        let mut r = report();
        let style = FixRowColumnTableStyle::default();
        let mut table = SensorTable::new(hours(24));
        table.add_row(block_row("day", 24));
        r.draw_sensor_merge_table(&table, MergeOptions::default(), &style, &mut [])
            .unwrap();

        let rects: Vec<_> = r.pages()[0].rects().collect();
        // label cell spans merge_rows lines
        assert_eq!(rects[0], (20.0, 20.0, 75.0, 80.0, Color::GRAY));
        // first header band sits right of the label
        assert_eq!((rects[1].0, rects[1].1, rects[1].2), (95.0, 20.0, 40.0));
        // first data cell on the next line at the band indent
        let first_data = rects[13];
        assert_eq!((first_data.0, first_data.1), (95.0, 40.0));
        // second band header starts a line below the first band's data
        let second_header = rects[25];
        assert_eq!((second_header.0, second_header.1), (95.0, 60.0));
        // four lines drawn: header, data, header, data
        assert_eq!(r.y(), 100.0);
        assert_eq!(r.x(), 20.0);
    }

    #[test]
    fn alert_colors_on_data_cells() {
        let mut r = report();
        let mut table = SensorTable::new(hours(3));
        table.add_row(vec![
            Cell::new("day"),
            Cell::high("40.0"),
            Cell::low("-3.0"),
            Cell::header("x"),
        ]);
        r.draw_sensor_merge_table(&table, MergeOptions::default(), &Default::default(), &mut [])
            .unwrap();
        let fills: Vec<Color> = r.pages()[0].rects().map(|r| r.4).skip(4).collect();
        assert_eq!(fills, vec![Color::HEAT_ALERT, Color::COOL_ALERT, Color::WHITE]);
    }

    #[test]
    fn page_breaks_every_page_rows_blocks() {
        let mut r = report();
        let mut table = SensorTable::new(hours(12));
        for d in 0..7 {
            table.add_row(block_row(&format!("d{}", d), 12));
        }
        let options = MergeOptions {
            page_rows: 3,
            merge_rows: 2,
        };
        let outcome = r
            .draw_sensor_merge_table(&table, options, &Default::default(), &mut [])
            .unwrap();
        assert_eq!(outcome.page_breaks, vec![4]);
        assert_eq!(r.page(), 2);
    }

    #[test]
    fn dynamic_header_skips_no_data_blocks() {
        let mut r = report();
        let mut table = SensorTable::with_block_headers(vec![hours(2), hours(2), hours(3)]);
        table.add_row(block_row("a", 2));
        table.add_row(vec![Cell::new("b"), Cell::no_data(), Cell::no_data()]);
        table.add_row(block_row("c", 3));
        let outcome = r
            .draw_sensor_dynamic_header_merge_table(
                &table,
                MergeOptions::default(),
                &Default::default(),
                &mut [],
            )
            .unwrap();
        assert_eq!(outcome.blocks_drawn, 2);
        assert_eq!(outcome.blocks_skipped, 1);
        assert_eq!(outcome.warnings, vec![LayoutWarning::NoDataBlock { block: 2 }]);
        let texts: Vec<&str> = r.pages()[0].texts().map(|t| t.0).collect();
        assert!(texts.contains(&"c"));
        assert!(!texts.contains(&"b"));
    }

    #[test]
    fn missing_block_header_skips() {
        let mut r = report();
        let mut table = SensorTable::with_block_headers(vec![hours(2)]);
        table.add_row(block_row("a", 2));
        table.add_row(block_row("b", 2));
        let outcome = r
            .draw_sensor_dynamic_header_merge_table(
                &table,
                MergeOptions::default(),
                &Default::default(),
                &mut [],
            )
            .unwrap();
        assert_eq!(
            outcome.warnings,
            vec![LayoutWarning::MissingBlockHeader { block: 2 }]
        );
    }

    #[test]
    fn empty_label_skips_block() {
        let mut r = report();
        let mut table = SensorTable::new(hours(2));
        table.add_row(block_row("", 2));
        table.add_row(block_row("b", 2));
        let outcome = r
            .draw_sensor_merge_table(&table, MergeOptions::default(), &Default::default(), &mut [])
            .unwrap();
        assert_eq!(outcome.blocks_drawn, 1);
        assert_eq!(outcome.warnings, vec![LayoutWarning::EmptyRowLabel { block: 1 }]);
    }

    #[test]
    fn mismatched_row_warns_but_draws() {
        let mut r = report();
        let mut table = SensorTable::new(hours(4));
        table.add_row(block_row("a", 3));
        let outcome = r
            .draw_sensor_merge_table(&table, MergeOptions::default(), &Default::default(), &mut [])
            .unwrap();
        assert_eq!(outcome.blocks_drawn, 1);
        assert_eq!(
            outcome.warnings,
            vec![LayoutWarning::HeaderRowMismatch {
                row: 0,
                header_len: 4,
                row_len: 3
            }]
        );
    }

    #[test]
    fn wrong_header_kind_and_zero_page_rows_rejected() {
        let mut r = report();
        let flat = SensorTable::new(hours(2));
        let dynamic = SensorTable::with_block_headers(vec![hours(2)]);
        let style = FixRowColumnTableStyle::default();
        assert!(r
            .draw_sensor_dynamic_header_merge_table(&flat, MergeOptions::default(), &style, &mut [])
            .is_err());
        assert!(r
            .draw_sensor_merge_table(&dynamic, MergeOptions::default(), &style, &mut [])
            .is_err());
        let zero = MergeOptions {
            page_rows: 0,
            merge_rows: 4,
        };
        assert!(matches!(
            r.draw_merge_table(&flat, zero, &style, &mut []),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn page_rows_at_usize_max_rejected() {
        let mut r = report();
        let mut table = SensorTable::new(hours(2));
        table.add_row(block_row("day 1", 2));
        let huge = MergeOptions {
            page_rows: usize::MAX,
            merge_rows: 4,
        };
        let err = r
            .draw_merge_table(&table, huge, &FixRowColumnTableStyle::default(), &mut [])
            .unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
        assert!(err.to_string().contains("out of range"));
        assert!(r.surface().pages().is_empty());
    }

    #[test]
    fn first_block_starts_at_clamped_x() {
        let mut r = report();
        let mut table = SensorTable::new(hours(2));
        table.add_row(block_row("day 1", 2));
        table.add_row(block_row("day 2", 2));
        let style = FixRowColumnTableStyle::default();
        let label_height = MergeOptions::default().merge_rows as f64 * LINE_HEIGHT;

        r.add_direct_page(&mut []);
        r.set_x(60.0);
        r.draw_merge_table(&table, MergeOptions::default(), &style, &mut [])
            .unwrap();
        let labels: Vec<f64> = r.surface().pages()[0]
            .rects()
            .filter(|&(_, _, w, h, _)| w == style.column_header.width && h == label_height)
            .map(|(x, ..)| x)
            .collect();
        assert_eq!(labels, vec![60.0, 20.0]);

        let mut r = report();
        r.add_direct_page(&mut []);
        r.set_x(3.0);
        r.draw_merge_table(&table, MergeOptions::default(), &style, &mut [])
            .unwrap();
        let first = r.surface().pages()[0].rects().next().unwrap();
        assert_eq!(first.0, 20.0);
    }
}
