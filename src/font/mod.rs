//! # Font Management
//!
//! Fonts are addressed by id, the same string a [`TextStyle`](crate::style::TextStyle)
//! names. Three standard PDF fonts are always present (`Helvetica`,
//! `Helvetica-Bold`, `Courier`, plus `Courier-Bold`); TrueType fonts are
//! registered under caller-chosen ids and embedded whole.
//!
//! Unknown ids resolve to Helvetica. The fallback is logged once per id.

pub mod metrics;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

pub use metrics::StandardFontMetrics;

use crate::error::{ExportError, Result};

/// Id every unresolvable font falls back to.
pub const FALLBACK_FONT: &str = "Helvetica";

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType font that is embedded in the output.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

impl FontData {
    /// Width of `text` in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        match self {
            FontData::Standard(font) => font.metrics().measure_string(text, font_size),
            FontData::Custom { metrics, .. } => text
                .chars()
                .map(|ch| metrics.char_width(ch, font_size))
                .sum(),
        }
    }

    /// Distance from the top of the text box to the baseline, in points.
    pub fn ascent(&self, font_size: f64) -> f64 {
        match self {
            FontData::Standard(font) => font.metrics().ascender as f64 / 1000.0 * font_size,
            FontData::Custom { metrics, .. } => {
                metrics.ascender as f64 / metrics.units_per_em as f64 * font_size
            }
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
    /// PostScript name, if the font carries one.
    pub postscript_name: Option<String>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Glyph id for `ch`, or 0 (.notdef) when the font lacks it.
    pub fn glyph_id(&self, ch: char) -> u16 {
        self.glyph_ids.get(&ch).copied().unwrap_or(0)
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    glyph_ids.insert(ch, glyph_id.0);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string());

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
            postscript_name,
        })
    }
}

/// The standard PDF fonts this crate carries metrics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
            Self::Courier | Self::CourierBold => &metrics::COURIER,
        }
    }

    const ALL: [StandardFont; 4] = [
        Self::Helvetica,
        Self::HelveticaBold,
        Self::Courier,
        Self::CourierBold,
    ];
}

/// Font registry for one document, keyed by font id.
///
/// Fonts are loaded once at construction and live for the document.
#[derive(Debug)]
pub struct FontContext {
    fonts: BTreeMap<String, FontData>,
    warned: RefCell<HashSet<String>>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    /// A context holding only the standard fonts.
    pub fn new() -> Self {
        let fonts = StandardFont::ALL
            .iter()
            .map(|f| (f.pdf_name().to_string(), FontData::Standard(*f)))
            .collect();
        Self {
            fonts,
            warned: RefCell::new(HashSet::new()),
        }
    }

    /// Build a context from an id → TrueType path map.
    pub fn from_font_map<K, P>(map: impl IntoIterator<Item = (K, P)>) -> Result<Self>
    where
        K: Into<String>,
        P: AsRef<Path>,
    {
        let mut ctx = Self::new();
        for (id, path) in map {
            ctx.register_file(id, path)?;
        }
        Ok(ctx)
    }

    /// Register a TrueType font file under `id`.
    pub fn register_file(&mut self, id: impl Into<String>, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| ExportError::Font(format!("cannot read {}: {}", path.display(), e)))?;
        self.register_bytes(id, data).map_err(|e| match e {
            ExportError::Font(msg) => ExportError::Font(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Register in-memory TrueType data under `id`, replacing any font
    /// already registered with that id.
    pub fn register_bytes(&mut self, id: impl Into<String>, data: Vec<u8>) -> Result<()> {
        let id = id.into();
        let metrics = CustomFontMetrics::from_font_data(&data)
            .ok_or_else(|| ExportError::Font(format!("'{}' is not a parsable TrueType font", id)))?;
        tracing::debug!(font = %id, glyphs = metrics.glyph_ids.len(), "registered font");
        self.fonts.insert(id, FontData::Custom { data, metrics });
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fonts.contains_key(id)
    }

    /// Resolve an id to the id actually used and its data.
    pub fn resolve<'a>(&'a self, id: &'a str) -> (&'a str, &'a FontData) {
        if let Some((key, data)) = self.fonts.get_key_value(id) {
            return (key.as_str(), data);
        }
        if self.warned.borrow_mut().insert(id.to_string()) {
            tracing::warn!(font = %id, fallback = FALLBACK_FONT, "unknown font id, falling back");
        }
        (FALLBACK_FONT, &FALLBACK_DATA)
    }

    /// Width of `text` in points.
    pub fn measure(&self, text: &str, id: &str, font_size: f64) -> f64 {
        self.resolve(id).1.measure(text, font_size)
    }

    /// Top-of-box to baseline distance in points.
    pub fn ascent(&self, id: &str, font_size: f64) -> f64 {
        self.resolve(id).1.ascent(font_size)
    }

    /// Iterate over all registered fonts in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FontData)> {
        self.fonts.iter()
    }
}

static FALLBACK_DATA: FontData = FontData::Standard(StandardFont::Helvetica);
