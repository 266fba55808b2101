//! # Cell Renderer
//!
//! Draws one rectangle with one line of text in it at the cursor, then
//! moves the cursor to the rectangle's right edge. Every table in the crate
//! is built out of these.

use std::borrow::Cow;

use super::cursor::PageCursor;
use crate::style::{Align, Color, TextBlockStyle, Valign};
use crate::surface::{RectPaint, Surface};

/// Left inset of left-aligned cell text.
pub const TEXT_INSET: f64 = 5.0;

/// Everything needed to draw one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSpec<'a> {
    pub font: &'a str,
    pub font_size: f64,
    pub text_color: Color,
    pub background: Color,
    pub width: f64,
    pub height: f64,
    pub align: Align,
    pub valign: Valign,
    pub paint: RectPaint,
}

impl<'a> CellSpec<'a> {
    /// A bordered, centered cell in `style`'s font, colors and box.
    pub fn from_block(style: &'a TextBlockStyle, width: f64, height: f64) -> Self {
        Self {
            font: &style.text.font,
            font_size: style.text.font_size,
            text_color: style.text.color,
            background: style.background,
            width,
            height,
            align: Align::Center,
            valign: Valign::Middle,
            paint: RectPaint::FillStroke,
        }
    }

    /// Take text color and background from another role.
    pub fn colored_as(mut self, role: &TextBlockStyle) -> Self {
        self.text_color = role.text.color;
        self.background = role.background;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn aligned(mut self, align: Align, valign: Valign) -> Self {
        self.align = align;
        self.valign = valign;
        self
    }

    pub fn with_paint(mut self, paint: RectPaint) -> Self {
        self.paint = paint;
        self
    }
}

/// Draw a cell at the cursor and leave the cursor at its top-right corner.
pub fn draw_cell<S: Surface + ?Sized>(
    surface: &mut S,
    cursor: &mut PageCursor,
    text: &str,
    spec: &CellSpec<'_>,
) {
    let ox = cursor.clamped_x();
    let oy = cursor.y;

    surface.fill_rect(ox, oy, spec.width, spec.height, spec.background, spec.paint);

    if !text.is_empty() {
        let available = match spec.align {
            Align::Left => spec.width - TEXT_INSET,
            Align::Center | Align::Right => spec.width,
        };
        let text = fit_text(surface, text, spec.font, spec.font_size, available);
        let tw = surface.measure_text(&text, spec.font, spec.font_size);

        let tx = match spec.align {
            Align::Center => ox + spec.width / 2.0 - tw / 2.0,
            Align::Right => ox + spec.width - tw,
            Align::Left => ox + TEXT_INSET,
        };
        let ty = match spec.valign {
            Valign::Middle => oy + spec.height / 2.0 - spec.font_size / 2.0,
            Valign::Bottom => oy + spec.height - spec.font_size,
            Valign::Top => oy,
        };
        surface.place_text(&text, tx, ty, spec.font, spec.font_size, spec.text_color);
    }

    cursor.x = ox + spec.width;
    cursor.y = oy;
}

/// Drop characters from the end of `text` until it fits `max_width`.
pub fn fit_text<'t, S: Surface + ?Sized>(
    surface: &S,
    text: &'t str,
    font: &str,
    font_size: f64,
    max_width: f64,
) -> Cow<'t, str> {
    if surface.measure_text(text, font, font_size) <= max_width {
        return Cow::Borrowed(text);
    }
    let mut end = text.len();
    for (idx, _) in text.char_indices().rev() {
        end = idx;
        if surface.measure_text(&text[..end], font, font_size) <= max_width {
            break;
        }
    }
    Cow::Borrowed(&text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::model::{Edges, Metadata, PageSize};
    use crate::pdf::PdfSurface;
    use crate::surface::DrawOp;

    fn setup() -> (PdfSurface, PageCursor) {
        let mut surface = PdfSurface::new(FontContext::new(), Metadata::default());
        surface.begin_page(595.28, 841.89);
        let cursor = PageCursor::new(PageSize::A4, Edges::uniform(20.0));
        (surface, cursor)
    }

    fn block(width: f64) -> TextBlockStyle {
        TextBlockStyle {
            width,
            ..TextBlockStyle::default()
        }
    }

    #[test]
    fn cursor_ends_at_right_edge() {
        let (mut surface, mut cursor) = setup();
        cursor.y = 100.0;
        let style = block(40.0);
        draw_cell(&mut surface, &mut cursor, "12.5", &CellSpec::from_block(&style, 40.0, 20.0));
        assert_eq!((cursor.x, cursor.y), (60.0, 100.0));
    }

    #[test]
    fn x_clamped_to_left_margin() {
        let (mut surface, mut cursor) = setup();
        cursor.x = 0.0;
        let style = block(40.0);
        draw_cell(&mut surface, &mut cursor, "", &CellSpec::from_block(&style, 40.0, 20.0));
        let (x, _, _, _, _) = surface.pages()[0].rects().next().unwrap();
        assert_eq!(x, 20.0);
        assert_eq!(cursor.x, 60.0);
    }

    #[test]
    fn center_middle_placement() {
        let (mut surface, mut cursor) = setup();
        let style = TextBlockStyle {
            text: crate::style::TextStyle::new("Courier", 10.0, Color::BLACK),
            ..block(100.0)
        };
        draw_cell(&mut surface, &mut cursor, "abcd", &CellSpec::from_block(&style, 100.0, 20.0));
        // Courier: 4 glyphs * 6pt = 24pt wide
        let (text, x, y) = surface.pages()[0].texts().next().unwrap();
        assert_eq!(text, "abcd");
        assert!((x - (20.0 + 50.0 - 12.0)).abs() < 1e-9);
        assert!((y - (20.0 + 10.0 - 5.0)).abs() < 1e-9);
    }

    #[test]
    fn left_top_and_right_bottom_placement() {
        let (mut surface, mut cursor) = setup();
        let style = TextBlockStyle {
            text: crate::style::TextStyle::new("Courier", 10.0, Color::BLACK),
            ..block(100.0)
        };
        let spec = CellSpec::from_block(&style, 100.0, 20.0).aligned(Align::Left, Valign::Top);
        draw_cell(&mut surface, &mut cursor, "ab", &spec);
        let spec = CellSpec::from_block(&style, 100.0, 20.0).aligned(Align::Right, Valign::Bottom);
        draw_cell(&mut surface, &mut cursor, "ab", &spec);

        let texts: Vec<_> = surface.pages()[0].texts().collect();
        assert_eq!(texts[0], ("ab", 25.0, 20.0));
        // second cell starts at 120, right-aligned 12pt text
        assert!((texts[1].1 - (120.0 + 100.0 - 12.0)).abs() < 1e-9);
        assert!((texts[1].2 - (20.0 + 20.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn long_text_truncated_to_width() {
        let (mut surface, mut cursor) = setup();
        let style = TextBlockStyle {
            text: crate::style::TextStyle::new("Courier", 10.0, Color::BLACK),
            ..block(30.0)
        };
        draw_cell(
            &mut surface,
            &mut cursor,
            "Temperature",
            &CellSpec::from_block(&style, 30.0, 20.0),
        );
        // 30pt holds five 6pt glyphs
        let (text, _, _) = surface.pages()[0].texts().next().unwrap();
        assert_eq!(text, "Tempe");
    }

    #[test]
    fn fill_only_paint() {
        let (mut surface, mut cursor) = setup();
        let style = block(40.0);
        let spec = CellSpec::from_block(&style, 40.0, 20.0).with_paint(RectPaint::Fill);
        draw_cell(&mut surface, &mut cursor, "", &spec);
        assert!(matches!(
            surface.pages()[0].ops[0],
            DrawOp::Rect {
                paint: RectPaint::Fill,
                ..
            }
        ));
    }

    #[test]
    fn colored_as_keeps_font_and_width() {
        let ts = crate::style::FixRowColumnTableStyle::default();
        let spec = CellSpec::from_block(&ts.row_header, ts.row_header.width, 20.0)
            .colored_as(&ts.heat_alert);
        assert_eq!(spec.width, 40.0);
        assert_eq!(spec.font_size, 8.0);
        assert_eq!(spec.background, Color::HEAT_ALERT);
    }
}
