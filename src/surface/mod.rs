//! # Drawing Surface
//!
//! The seam between layout and output. The table engine only ever asks a
//! [`Surface`] to start pages, fill rectangles, place text, stroke lines and
//! place images at absolute coordinates. Coordinates are in points with the
//! origin at the top-left of the page and y growing downward.
//!
//! [`PageRecord`] and [`DrawOp`] are the recorded form of those calls. The
//! PDF surface keeps them until flush, and tests inspect them to check
//! layout geometry without parsing PDF bytes.

use std::io::Write;

use crate::error::Result;
use crate::image_loader::LoadedImage;
use crate::style::Color;

/// Paint mode for rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectPaint {
    /// Fill only.
    Fill,
    /// Fill, then stroke the outline with a thin black line.
    FillStroke,
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Color,
        paint: RectPaint,
    },
    Text {
        text: String,
        /// Left edge.
        x: f64,
        /// Top of the text box.
        y: f64,
        font: String,
        font_size: f64,
        color: Color,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: Color,
    },
    Image {
        /// Index into the surface's image list.
        image: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// A page and everything drawn on it, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecord {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

impl PageRecord {
    /// Text operations on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f64, f64)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }

    /// Rectangles on this page as `(x, y, width, height, fill)`.
    pub fn rects(&self) -> impl Iterator<Item = (f64, f64, f64, f64, Color)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                ..
            } => Some((*x, *y, *width, *height, *fill)),
            _ => None,
        })
    }
}

/// A renderer that places primitives at absolute page coordinates.
pub trait Surface {
    /// Start a new page; subsequent drawing lands on it.
    fn begin_page(&mut self, width: f64, height: f64);

    fn page_count(&self) -> usize;

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Color, paint: RectPaint);

    /// Place a single line of text. `y` is the top of the text box.
    fn place_text(&mut self, text: &str, x: f64, y: f64, font: &str, font_size: f64, color: Color);

    fn stroke_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color);

    fn place_image(&mut self, image: LoadedImage, x: f64, y: f64, width: f64, height: f64);

    /// Width of `text` in points.
    fn measure_text(&self, text: &str, font: &str, font_size: f64) -> f64;

    /// Serialize everything drawn so far.
    fn flush(&mut self, out: &mut dyn Write) -> Result<()>;
}
