//! # Style Descriptors
//!
//! Colors, text styles and per-role table styles. All of these are plain
//! data: layout reads them and never mutates them. The `Default` impls
//! carry the built-in "sensor v3" palette, and every struct accepts partial
//! JSON overrides through `#[serde(default)]`.

use serde::{Deserialize, Serialize};

/// An sRGB color with 8-bit channels.
///
/// Deserializes from either `{"r": .., "g": .., "b": ..}` or a hex string
/// (`"#rrggbb"` / `"#rgb"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ColorRepr")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgb { r: u8, g: u8, b: u8 },
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Hex(s) => Color::hex(&s),
            ColorRepr::Rgb { r, g, b } => Color { r, g, b },
        }
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(211, 211, 211);
    pub const HEAT_ALERT: Color = Color::rgb(255, 179, 167);
    pub const COOL_ALERT: Color = Color::rgb(152, 185, 255);
    pub const SEN_COLUMN_LINE: Color = Color::rgb(153, 186, 174);
    pub const MAX: Color = Color::rgb(40, 116, 172);
    pub const MIN: Color = Color::rgb(40, 172, 96);
    pub const AVG: Color = Color::rgb(172, 40, 50);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`. Anything unparseable is black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        match hex.len() {
            3 if hex.is_ascii() => Color::rgb(
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 if hex.is_ascii() => {
                Color::rgb(channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6]))
            }
            _ => Color::BLACK,
        }
    }

    /// Channels scaled to the 0.0-1.0 range PDF color operators take.
    pub fn components(&self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Valign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Font, size and color for a run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    /// Font id, resolved through the document's font context.
    pub font: String,
    pub font_size: f64,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font: &str, font_size: f64, color: Color) -> Self {
        Self {
            font: font.to_string(),
            font_size,
            color,
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new(REGULAR, 12.0, Color::BLACK)
    }
}

/// A text style plus the box it sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBlockStyle {
    #[serde(flatten)]
    pub text: TextStyle,
    pub background: Color,
    pub width: f64,
    pub height: f64,
    pub align: Align,
}

impl Default for TextBlockStyle {
    fn default() -> Self {
        Self {
            text: TextStyle::default(),
            background: Color::WHITE,
            width: 0.0,
            height: 0.0,
            align: Align::Left,
        }
    }
}

impl TextBlockStyle {
    fn table_cell(font_size: f64, width: f64, background: Color) -> Self {
        Self {
            text: TextStyle::new(REGULAR, font_size, Color::BLACK),
            background,
            width,
            ..Self::default()
        }
    }
}

/// Per-role styles for the sensor grid tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixRowColumnTableStyle {
    pub chart_header: TextBlockStyle,
    pub row_header: TextBlockStyle,
    pub column_header: TextBlockStyle,
    pub content: TextBlockStyle,
    pub heat_alert: TextBlockStyle,
    pub cool_alert: TextBlockStyle,
    pub blank: TextBlockStyle,
}

impl Default for FixRowColumnTableStyle {
    fn default() -> Self {
        Self {
            chart_header: TextBlockStyle::table_cell(10.0, 40.0, Color::WHITE),
            row_header: TextBlockStyle::table_cell(8.0, 40.0, Color::GRAY),
            column_header: TextBlockStyle::table_cell(8.0, 75.0, Color::GRAY),
            content: TextBlockStyle::table_cell(8.0, 75.0, Color::WHITE),
            heat_alert: TextBlockStyle::table_cell(8.0, 75.0, Color::HEAT_ALERT),
            cool_alert: TextBlockStyle::table_cell(8.0, 75.0, Color::COOL_ALERT),
            blank: TextBlockStyle::table_cell(8.0, 75.0, Color::GRAY),
        }
    }
}

/// Styles for the two-column (time, state) table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateTableStyle {
    pub column_time: TextBlockStyle,
    pub column_state: TextBlockStyle,
    pub header_background: Color,
    /// Data rows per page before the table breaks and repeats its header.
    pub max_row_count: usize,
}

impl Default for StateTableStyle {
    fn default() -> Self {
        Self {
            column_time: TextBlockStyle::table_cell(10.0, 100.0, Color::WHITE),
            column_state: TextBlockStyle::table_cell(10.0, 85.0, Color::WHITE),
            header_background: Color::GRAY,
            max_row_count: 35,
        }
    }
}

/// Styles for the time/value tables and the plain string table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableStyle {
    /// Series titles and plain-table cells.
    pub header: TextBlockStyle,
    pub column_width: f64,
    /// Series per column-row.
    pub columns_per_row: usize,
    /// Column-rows per page before the rest is handed back; 0 is unlimited.
    pub rows_per_page: usize,
    /// One style per field of a time/value row: the time, then each value.
    /// Values past the last style reuse it.
    pub data: Vec<TextBlockStyle>,
}

impl Default for TableStyle {
    fn default() -> Self {
        let field = |color: Color, width: f64, align: Align| TextBlockStyle {
            text: TextStyle::new(REGULAR, 8.0, color),
            width,
            height: 10.0,
            align,
            ..TextBlockStyle::default()
        };
        Self {
            header: TextBlockStyle::table_cell(8.0, 0.0, Color::WHITE),
            column_width: 138.0,
            columns_per_row: 4,
            rows_per_page: 3,
            data: vec![
                field(Color::BLACK, 30.0, Align::Left),
                field(Color::MAX, 36.0, Align::Right),
                field(Color::AVG, 36.0, Align::Right),
                field(Color::MIN, 36.0, Align::Right),
            ],
        }
    }
}

/// Every style a sensor report draws with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportStyle {
    pub header: TextStyle,
    pub title: TextStyle,
    pub sub_title: TextStyle,
    pub page: TextStyle,
    pub section_block: TextBlockStyle,
    pub sen_column: TextStyle,
    pub sen_column_line: Color,
    pub content: TextStyle,
    pub table_desc: TextStyle,
    pub table_desc_max: TextStyle,
    pub table_desc_min: TextStyle,
    pub table_desc_avg: TextStyle,
    pub table: FixRowColumnTableStyle,
    pub state_table: StateTableStyle,
    pub value_table: TableStyle,
}

/// Default regular font id.
pub const REGULAR: &str = "Helvetica";
/// Default bold font id.
pub const BOLD: &str = "Helvetica-Bold";

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            header: TextStyle::new(REGULAR, 20.0, Color::BLACK),
            title: TextStyle::new(BOLD, 16.0, Color::BLACK),
            sub_title: TextStyle::new(REGULAR, 9.0, Color::rgb(104, 104, 104)),
            page: TextStyle::new(REGULAR, 12.0, Color::rgb(170, 170, 170)),
            section_block: TextBlockStyle {
                text: TextStyle::new(BOLD, 14.0, Color::WHITE),
                background: Color::rgb(99, 147, 141),
                ..TextBlockStyle::default()
            },
            sen_column: TextStyle::new(REGULAR, 14.0, Color::rgb(80, 124, 118)),
            sen_column_line: Color::SEN_COLUMN_LINE,
            content: TextStyle::new(REGULAR, 12.0, Color::rgb(38, 38, 38)),
            table_desc: TextStyle::new(REGULAR, 8.0, Color::BLACK),
            table_desc_max: TextStyle::new(REGULAR, 8.0, Color::MAX),
            table_desc_min: TextStyle::new(REGULAR, 8.0, Color::MIN),
            table_desc_avg: TextStyle::new(REGULAR, 8.0, Color::AVG),
            table: FixRowColumnTableStyle::default(),
            state_table: StateTableStyle::default(),
            value_table: TableStyle::default(),
        }
    }
}
