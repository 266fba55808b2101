//! # Report Layout
//!
//! A [`Report`] owns a drawing surface and a [`PageCursor`]. Everything
//! that puts content on a page goes through it: text and line primitives,
//! single cells, and the table layouts in [`table`], [`merge`] and
//! [`value_table`].
//!
//! Pages are opened explicitly with [`Report::add_direct_page`] (portrait)
//! or [`Report::add_horizontal_page`] (landscape). Both run caller-supplied
//! [`PagePipe`] hooks around page creation: every `before` hook, then the
//! page, then every `after` hook, with a 10pt break after the first `after`
//! hook so content clears a running header. Drawing before any page exists
//! opens a portrait page without hooks.
//!
//! Malformed table data does not abort a render. Each anomaly becomes a
//! [`LayoutWarning`], logged and returned in the table's [`TableOutcome`].

pub mod cell;
pub mod cursor;
pub mod merge;
pub mod page_break;
pub mod table;
pub mod value_table;

use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::error::{ExportError, Result};
use crate::font::FontContext;
use crate::image_loader::LoadedImage;
use crate::model::{Metadata, Orientation, PageSetup};
use crate::pdf::PdfSurface;
use crate::style::{Align, Color, TextBlockStyle, TextStyle, Valign};
use crate::surface::{PageRecord, RectPaint, Surface};

use cell::{draw_cell, CellSpec};
pub use cursor::PageCursor;
pub use merge::MergeOptions;

/// Break inserted after the first `after` hook of a new page.
pub const HOOK_BREAK: f64 = 10.0;

/// Whether the document has a page to draw on yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    NoPage,
    Active,
}

/// Callbacks fired around page creation, typically to draw running
/// headers and footers.
///
/// `before` runs while the cursor still sits on the outgoing page; `after`
/// runs on the fresh page with the cursor at its top-left margin.
pub trait PagePipe<S: Surface> {
    fn before(&mut self, _report: &mut Report<S>) {}
    fn after(&mut self, _report: &mut Report<S>) {}
}

/// A data anomaly found while laying out a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutWarning {
    /// A row's data length differs from its header. The row is still
    /// drawn.
    HeaderRowMismatch {
        row: usize,
        header_len: usize,
        row_len: usize,
    },
    /// A block had no row label and was not drawn.
    EmptyRowLabel { block: usize },
    /// A block was marked as having no data and was skipped.
    NoDataBlock { block: usize },
    /// No per-block header exists for this block; it was skipped.
    MissingBlockHeader { block: usize },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::HeaderRowMismatch {
                row,
                header_len,
                row_len,
            } => write!(
                f,
                "row {} has {} data cells but its header has {}",
                row, row_len, header_len
            ),
            LayoutWarning::EmptyRowLabel { block } => {
                write!(f, "block {} has no row label, skipped", block)
            }
            LayoutWarning::NoDataBlock { block } => {
                write!(f, "block {} has no data, skipped", block)
            }
            LayoutWarning::MissingBlockHeader { block } => {
                write!(f, "block {} has no header, skipped", block)
            }
        }
    }
}

/// What a table layout did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOutcome {
    /// Blocks (merge tables) or rows (grid and state tables) drawn.
    pub blocks_drawn: usize,
    pub blocks_skipped: usize,
    /// Block numbers (merge tables) or row indices (state tables) that
    /// started a new page.
    pub page_breaks: Vec<usize>,
    /// Header bands drawn, repeats included.
    pub header_bands: usize,
    pub warnings: Vec<LayoutWarning>,
}

impl TableOutcome {
    fn warn(&mut self, warning: LayoutWarning) {
        tracing::warn!(%warning, "table layout");
        self.warnings.push(warning);
    }

    fn skip(&mut self, warning: LayoutWarning) {
        self.warn(warning);
        self.blocks_skipped += 1;
    }
}

/// A document being laid out onto a surface.
pub struct Report<S: Surface = PdfSurface> {
    surface: S,
    cursor: PageCursor,
    setup: PageSetup,
    state: PageState,
}

impl Report<PdfSurface> {
    /// A PDF report with the given fonts, page setup and metadata.
    pub fn new(fonts: FontContext, setup: PageSetup, metadata: Metadata) -> Result<Self> {
        Self::with_surface(PdfSurface::new(fonts, metadata), setup)
    }

    /// Pages recorded so far.
    pub fn pages(&self) -> &[PageRecord] {
        self.surface.pages()
    }
}

impl<S: Surface> Report<S> {
    /// Lay out onto any surface. Rejects unusable page geometry.
    pub fn with_surface(surface: S, setup: PageSetup) -> Result<Self> {
        let (w, h) = setup.size.dimensions();
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ExportError::Config(format!(
                "page size must be positive and finite, got {} x {}",
                w, h
            )));
        }
        let m = setup.margin;
        let margins = [m.top, m.right, m.bottom, m.left];
        if margins.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ExportError::Config(
                "margins must be non-negative and finite".to_string(),
            ));
        }
        if m.horizontal() >= w.min(h) || m.vertical() >= w.min(h) {
            return Err(ExportError::Config(
                "margins leave no printable area".to_string(),
            ));
        }
        Ok(Self {
            surface,
            cursor: PageCursor::new(setup.size, setup.margin),
            setup,
            state: PageState::NoPage,
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn page_state(&self) -> PageState {
        self.state
    }

    pub fn x(&self) -> f64 {
        self.cursor.x
    }

    pub fn y(&self) -> f64 {
        self.cursor.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.cursor.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.cursor.y = y;
    }

    /// Printable width of the current page.
    pub fn width(&self) -> f64 {
        self.cursor.content_width()
    }

    /// Printable height of the current page.
    pub fn height(&self) -> f64 {
        self.cursor.content_height()
    }

    /// Number of pages opened so far.
    pub fn page(&self) -> usize {
        self.cursor.page_count
    }

    /// Open a portrait page, running `pipes` around it.
    pub fn add_direct_page(&mut self, pipes: &mut [&mut dyn PagePipe<S>]) {
        self.add_page(Orientation::Portrait, pipes);
    }

    /// Open a landscape page, running `pipes` around it.
    pub fn add_horizontal_page(&mut self, pipes: &mut [&mut dyn PagePipe<S>]) {
        self.add_page(Orientation::Landscape, pipes);
    }

    fn add_page(&mut self, orientation: Orientation, pipes: &mut [&mut dyn PagePipe<S>]) {
        for pipe in pipes.iter_mut() {
            pipe.before(self);
        }
        self.start_page(orientation);
        for (i, pipe) in pipes.iter_mut().enumerate() {
            pipe.after(self);
            if i == 0 {
                self.br(HOOK_BREAK);
            }
        }
    }

    fn start_page(&mut self, orientation: Orientation) {
        self.cursor.start_page(self.setup.size, orientation);
        self.surface.begin_page(self.cursor.width, self.cursor.height);
        self.state = PageState::Active;
        tracing::debug!(
            page = self.cursor.page_count,
            ?orientation,
            "started page"
        );
    }

    fn ensure_page(&mut self) {
        if self.state == PageState::NoPage {
            self.start_page(Orientation::Portrait);
        }
    }

    /// Line break: down `h`, back to the left margin.
    pub fn br(&mut self, h: f64) {
        self.cursor.line_break(h);
    }

    /// One line of text at the cursor row. Left alignment starts at the
    /// cursor; center and right align against the page.
    pub fn text(&mut self, text: &str, style: &TextStyle, align: Align) {
        self.ensure_page();
        let ox = self.cursor.clamped_x();
        let tw = self.surface.measure_text(text, &style.font, style.font_size);
        let x = match align {
            Align::Left => ox,
            Align::Center => self.cursor.width / 2.0 - tw / 2.0,
            Align::Right => self.cursor.width - tw - self.cursor.margin.right,
        };
        self.surface
            .place_text(text, x, self.cursor.y, &style.font, style.font_size, style.color);
        self.cursor.x = ox + tw;
    }

    /// Text at an absolute position, kept inside the margins. The cursor
    /// does not move.
    pub fn text_at(&mut self, text: &str, style: &TextStyle, x: f64, y: f64) {
        self.ensure_page();
        let tw = self.surface.measure_text(text, &style.font, style.font_size);
        let left = self.cursor.margin.left;
        let right_limit = self.cursor.width - self.cursor.margin.right - tw;
        let x = if x < left { left } else { x.min(right_limit) };
        self.surface
            .place_text(text, x, y, &style.font, style.font_size, style.color);
    }

    /// Two texts on one row: the first at the left margin, the second from
    /// the middle of the page.
    pub fn two_column_text(&mut self, first: &str, second: &str, style: &TextStyle) {
        self.ensure_page();
        let left = self.cursor.margin.left;
        let y = self.cursor.y;
        self.surface
            .place_text(first, left, y, &style.font, style.font_size, style.color);
        let x2 = self.cursor.width / 2.0 + left;
        self.surface
            .place_text(second, x2, y, &style.font, style.font_size, style.color);
        self.cursor.x = x2 + self.surface.measure_text(second, &style.font, style.font_size);
    }

    /// Horizontal black rule across the printable width at the cursor row.
    pub fn line(&mut self, width: f64) {
        self.line_with_color(width, Color::BLACK);
    }

    pub fn line_with_color(&mut self, width: f64, color: Color) {
        self.ensure_page();
        let y = self.cursor.y;
        let x1 = self.cursor.margin.left;
        let x2 = self.cursor.width - self.cursor.margin.right;
        self.surface.stroke_line(x1, y, x2, y, width, color);
    }

    pub fn line_xy(&mut self, width: f64, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.ensure_page();
        self.surface.stroke_line(x1, y1, x2, y2, width, Color::BLACK);
    }

    /// Place an image at the left margin on the cursor row. Returns the
    /// placed height.
    pub fn image(&mut self, image: LoadedImage) -> f64 {
        let (x, y) = (self.cursor.margin.left, self.cursor.y);
        self.image_at(image, x, y)
    }

    /// Place an image at its pixel size in points, scaled down to the
    /// printable width when wider. Returns the placed height.
    pub fn image_at(&mut self, image: LoadedImage, x: f64, y: f64) -> f64 {
        self.ensure_page();
        let mut w = image.width_px as f64;
        let mut h = image.height_px as f64;
        let max_w = self.cursor.content_width();
        if w > max_w && w > 0.0 {
            h *= max_w / w;
            w = max_w;
        }
        self.surface.place_image(image, x, y, w, h);
        h
    }

    /// A filled box with text, no outline.
    pub fn rect_fill_color(
        &mut self,
        text: &str,
        style: &TextBlockStyle,
        w: f64,
        h: f64,
        align: Align,
        valign: Valign,
    ) {
        let spec = CellSpec::from_block(style, w, h)
            .aligned(align, valign)
            .with_paint(RectPaint::Fill);
        self.cell(text, &spec);
    }

    /// A filled, outlined box with text.
    pub fn rect_fill_draw_color(
        &mut self,
        text: &str,
        style: &TextBlockStyle,
        w: f64,
        h: f64,
        align: Align,
        valign: Valign,
    ) {
        let spec = CellSpec::from_block(style, w, h).aligned(align, valign);
        self.cell(text, &spec);
    }

    /// Draw one cell at the cursor.
    pub fn cell(&mut self, text: &str, spec: &CellSpec<'_>) {
        self.ensure_page();
        draw_cell(&mut self.surface, &mut self.cursor, text, spec);
    }

    /// Flush the document to bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.surface.flush(&mut buf)?;
        tracing::info!(
            pages = self.cursor.page_count,
            bytes = buf.len(),
            "report rendered"
        );
        Ok(buf)
    }

    pub fn write_to(self, mut out: impl Write) -> Result<()> {
        let bytes = self.finish()?;
        out.write_all(&bytes)?;
        Ok(())
    }

    pub fn write_to_file(self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }}
