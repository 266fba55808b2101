//! The page cursor: where the next cell lands.

use crate::model::{Edges, Orientation, PageSize};

/// Pen position and page geometry for one document.
///
/// `x`/`y` are absolute page coordinates (top-left origin). `width` and
/// `height` are the full page dimensions of the current page; landscape
/// pages swap them.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub x: f64,
    pub y: f64,
    pub margin: Edges,
    pub width: f64,
    pub height: f64,
    pub page_count: usize,
}

impl PageCursor {
    /// A cursor before any page exists, with portrait geometry.
    pub fn new(size: PageSize, margin: Edges) -> Self {
        let (width, height) = size.dimensions();
        Self {
            x: margin.left,
            y: margin.top,
            margin,
            width,
            height,
            page_count: 0,
        }
    }

    /// Move down by `h` and return to the left margin.
    pub fn line_break(&mut self, h: f64) {
        self.y += h;
        self.x = self.margin.left;
    }

    pub fn reset_x(&mut self) {
        self.x = self.margin.left;
    }

    /// `x`, pulled right to the left margin if it sits left of it.
    pub fn clamped_x(&self) -> f64 {
        self.x.max(self.margin.left)
    }

    /// Take the geometry of a fresh page and move to its top-left margin.
    pub fn start_page(&mut self, size: PageSize, orientation: Orientation) {
        let (width, height) = size.oriented(orientation);
        self.width = width;
        self.height = height;
        self.page_count += 1;
        self.x = self.margin.left;
        self.y = self.margin.top;
    }

    /// Printable width (page width minus left and right margins).
    pub fn content_width(&self) -> f64 {
        self.width - self.margin.horizontal()
    }

    /// Printable height (page height minus top and bottom margins).
    pub fn content_height(&self) -> f64 {
        self.height - self.margin.vertical()
    }
}
