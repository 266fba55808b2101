//! # PDF Surface
//!
//! A [`Surface`] that records drawing operations per page and serializes
//! them as a PDF 1.7 file on flush. The bytes are written directly; the
//! subset of PDF a report needs (pages, filled rectangles, lines, text,
//! images) is small.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! ...
//! xref                <- byte offsets of every object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Standard fonts are written as Type1 references with WinAnsiEncoding.
//! TrueType fonts are embedded whole as CIDFontType2 with Identity-H
//! encoding: FontFile2, FontDescriptor, CIDFont, ToUnicode CMap and the
//! Type0 root, five objects per font. Text in those fonts is written as
//! hex glyph ids.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{ExportError, Result};
use crate::font::{CustomFontMetrics, FontContext, FontData};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::model::{Metadata, PageSize};
use crate::style::Color;
use crate::surface::{DrawOp, PageRecord, RectPaint, Surface};

/// Outline width for [`RectPaint::FillStroke`] rectangles.
pub const CELL_BORDER_WIDTH: f64 = 0.1;

/// Records pages in memory and writes them out as PDF.
#[derive(Debug)]
pub struct PdfSurface {
    fonts: FontContext,
    metadata: Metadata,
    pages: Vec<PageRecord>,
    images: Vec<LoadedImage>,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font id -> object id, in resource order (/F0, /F1, ...).
    font_objects: Vec<(String, usize)>,
    /// Glyph maps for embedded fonts, keyed by font id.
    custom_font_gids: HashMap<String, HashMap<char, u16>>,
    /// XObject ids, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_extra: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} >>\nstream\n",
            payload.len(),
            dict_extra
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, id: &str) -> usize {
        self.font_objects
            .iter()
            .position(|(key, _)| key == id)
            .unwrap_or(0)
    }
}

impl PdfSurface {
    pub fn new(fonts: FontContext, metadata: Metadata) -> Self {
        Self {
            fonts,
            metadata,
            pages: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Pages recorded so far.
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// The page drawing lands on. Drawing before any page exists opens a
    /// portrait A4 page.
    fn current_page(&mut self) -> &mut PageRecord {
        if self.pages.is_empty() {
            let (width, height) = PageSize::A4.dimensions();
            tracing::debug!("drawing before first page, opening A4 portrait");
            self.begin_page(width, height);
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Serialize the recorded pages to PDF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(ExportError::Render("document has no pages".to_string()));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            custom_font_gids: HashMap::new(),
            image_objects: Vec::new(),
        };

        // 0 = placeholder (objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.push(Vec::new());
        }

        self.register_fonts(&mut builder)?;
        for image in &self.images {
            let id = Self::write_image_xobject(&mut builder, image);
            builder.image_objects.push(id);
        }

        let font_resources = Self::build_font_resource_dict(&builder.font_objects);
        let mut page_obj_ids: Vec<usize> = Vec::new();

        for page in &self.pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_obj_id = builder.push_stream(" /Filter /FlateDecode", &compressed);

            let xobject_resources = Self::build_xobject_resource_dict(page, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = self.write_info(&mut builder);
        Ok(Self::serialize(&builder, info_obj_id))
    }

    fn write_info(&self, builder: &mut PdfBuilder) -> Option<usize> {
        let meta = &self.metadata;
        if meta.title.is_none() && meta.author.is_none() && meta.subject.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        if let Some(ref title) = meta.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = meta.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        if let Some(ref subject) = meta.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_pdf_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (sensor-export {}) >>",
            env!("CARGO_PKG_VERSION")
        );
        Some(builder.push(info.into_bytes()))
    }

    /// Build the content stream for one page. Page coordinates are
    /// top-left based; PDF user space is bottom-left based.
    fn build_content_stream(&self, page: &PageRecord, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        let page_height = page.height;

        for op in &page.ops {
            match op {
                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    paint,
                } => {
                    let (r, g, b) = fill.components();
                    let pdf_y = page_height - y - height;
                    let _ = write!(stream, "q\n{:.3} {:.3} {:.3} rg\n", r, g, b);
                    match paint {
                        RectPaint::Fill => {
                            let _ = write!(
                                stream,
                                "{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                                x, pdf_y, width, height
                            );
                        }
                        RectPaint::FillStroke => {
                            let _ = write!(
                                stream,
                                "0 0 0 RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nB\nQ\n",
                                CELL_BORDER_WIDTH, x, pdf_y, width, height
                            );
                        }
                    }
                }

                DrawOp::Text {
                    text,
                    x,
                    y,
                    font,
                    font_size,
                    color,
                } => {
                    let (r, g, b) = color.components();
                    let baseline = page_height - (y + self.fonts.ascent(font, *font_size));
                    let _ = write!(
                        stream,
                        "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n",
                        r,
                        g,
                        b,
                        builder.font_index(font),
                        font_size,
                        x,
                        baseline
                    );
                    match builder.custom_font_gids.get(font) {
                        Some(gids) => {
                            let mut hex = String::new();
                            for ch in text.chars() {
                                let gid = gids.get(&ch).copied().unwrap_or(0);
                                let _ = write!(hex, "{:04X}", gid);
                            }
                            let _ = write!(stream, "<{}> Tj\nET\n", hex);
                        }
                        None => {
                            let _ = write!(stream, "({}) Tj\nET\n", Self::encode_winansi(text));
                        }
                    }
                }

                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                } => {
                    let (r, g, b) = color.components();
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        r,
                        g,
                        b,
                        width,
                        x1,
                        page_height - y1,
                        x2,
                        page_height - y2
                    );
                }

                DrawOp::Image {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let pdf_y = page_height - y - height;
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        width, height, x, pdf_y, image
                    );
                }
            }
        }

        stream
    }

    /// Every font id used on any page gets one PDF font resource, in id
    /// order. A document without text still carries Helvetica.
    fn register_fonts(&self, builder: &mut PdfBuilder) -> Result<()> {
        let mut font_chars: BTreeMap<&str, HashSet<char>> = BTreeMap::new();
        for page in &self.pages {
            for op in &page.ops {
                if let DrawOp::Text { text, font, .. } = op {
                    font_chars
                        .entry(font.as_str())
                        .or_default()
                        .extend(text.chars());
                }
            }
        }
        if font_chars.is_empty() {
            font_chars.insert(crate::font::FALLBACK_FONT, HashSet::new());
        }

        for (id, chars) in &font_chars {
            let (resolved, data) = self.fonts.resolve(id);
            let obj_id = match data {
                FontData::Standard(std_font) => {
                    let font_dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    builder.push(font_dict.into_bytes())
                }
                FontData::Custom { data, metrics } => {
                    let name = metrics.postscript_name.as_deref().unwrap_or(resolved);
                    Self::write_custom_font_objects(builder, id, name, data, metrics, chars)?
                }
            };
            builder.font_objects.push((id.to_string(), obj_id));
        }

        Ok(())
    }

    /// Write the 5 CIDFont PDF objects for an embedded TrueType font.
    /// Returns the object ID of the Type0 root font dictionary.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        id: &str,
        name: &str,
        ttf_data: &[u8],
        metrics: &CustomFontMetrics,
        used_chars: &HashSet<char>,
    ) -> Result<usize> {
        let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
            ExportError::Font(format!("failed to parse TTF data for font '{}': {}", id, e))
        })?;

        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .map(|&ch| (ch, metrics.glyph_id(ch)))
            .filter(|&(_, gid)| gid != 0)
            .collect();

        let pdf_font_name = Self::sanitize_font_name(name);

        // 1. FontFile2
        let compressed_ttf = compress_to_vec_zlib(ttf_data, 6);
        let fontfile2_id = builder.push_stream(
            &format!(" /Length1 {} /Filter /FlateDecode", ttf_data.len()),
            &compressed_ttf,
        );

        // 2. FontDescriptor
        let bbox = face.global_bounding_box();
        let scale = 1000.0 / units_per_em as f64;
        let bbox_str = format!(
            "[{} {} {} {}]",
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
        );
        let cap_height = face.capital_height().unwrap_or(ascender) as f64 * scale;
        let font_descriptor_dict = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox {} /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV 80 \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            bbox_str,
            (ascender as f64 * scale) as i32,
            (descender as f64 * scale) as i32,
            cap_height as i32,
            fontfile2_id,
        );
        let font_descriptor_id = builder.push(font_descriptor_dict.into_bytes());

        // 3. CIDFont (DescendantFont)
        let w_array = Self::build_w_array(&char_to_gid, &face, units_per_em);
        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont_dict = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            pdf_font_name, font_descriptor_id, default_width, w_array,
        );
        let cidfont_id = builder.push(cidfont_dict.into_bytes());

        // 4. ToUnicode CMap
        let cmap_content = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let compressed_cmap = compress_to_vec_zlib(cmap_content.as_bytes(), 6);
        let tounicode_id = builder.push_stream(" /Filter /FlateDecode", &compressed_cmap);

        // 5. Type0 root, referenced from /Resources
        let type0_dict = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} \
             /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] \
             /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0_dict.into_bytes());

        builder.custom_font_gids.insert(id.to_string(), char_to_gid);
        Ok(type0_id)
    }

    /// The /W array for per-glyph widths: `[gid [width] gid [width] ...]`.
    fn build_w_array(
        char_to_gid: &HashMap<char, u16>,
        face: &ttf_parser::Face,
        units_per_em: u16,
    ) -> String {
        let scale = 1000.0 / units_per_em as f64;
        let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();

        let mut result = String::from("[");
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        result.push_str(" ]");
        result
    }

    /// ToUnicode CMap so text in embedded fonts stays extractable.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, u32)> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, ch as u32))
            .collect();
        gid_to_unicode.sort_unstable();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo\n");
        cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // beginbfchar blocks hold at most 100 entries
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                let _ = writeln!(cmap, "<{:04X}> <{:04X}>", gid, unicode);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");
        cmap
    }

    /// Strip everything a PDF name object can't carry.
    fn sanitize_font_name(name: &str) -> String {
        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            "CustomFont".to_string()
        } else {
            name
        }
    }

    fn build_font_resource_dict(font_objects: &[(String, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// /XObject entries for the images drawn on `page`.
    fn build_xobject_resource_dict(page: &PageRecord, builder: &PdfBuilder) -> String {
        let used: BTreeSet<usize> = page
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { image, .. } => Some(*image),
                _ => None,
            })
            .collect();
        used.into_iter()
            .filter_map(|idx| {
                builder
                    .image_objects
                    .get(idx)
                    .map(|obj_id| format!("/Im{} {} 0 R", idx, obj_id))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write an image as one XObject, or two when it carries an SMask.
    /// Returns the main XObject id.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                builder.push_stream(
                    &format!(
                        " /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                        image.width_px, image.height_px, color_space_str
                    ),
                    data,
                )
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
                        let smask_id = builder.push_stream(
                            &format!(
                                " /Type /XObject /Subtype /Image /Width {} /Height {} \
                                 /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                                image.width_px, image.height_px
                            ),
                            &compressed_alpha,
                        );
                        format!(" /SMask {} 0 R", smask_id)
                    })
                    .unwrap_or_default();

                let compressed_rgb = compress_to_vec_zlib(rgb, 6);
                builder.push_stream(
                    &format!(
                        " /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                        image.width_px, image.height_px, smask_ref
                    ),
                    &compressed_rgb,
                )
            }
        }
    }

    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Encode text for a WinAnsi string literal. Unmappable characters
    /// become `?`.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::new();
        for ch in text.chars() {
            match Self::unicode_to_winansi(ch).unwrap_or(b'?') {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                b @ 0x20..=0x7E => out.push(b as char),
                b => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a codepoint to its Windows-1252 byte.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R",
            builder.objects.len()
        );
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

impl Surface for PdfSurface {
    fn begin_page(&mut self, width: f64, height: f64) {
        self.pages.push(PageRecord {
            width,
            height,
            ops: Vec::new(),
        });
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn fill_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Color,
        paint: RectPaint,
    ) {
        self.current_page().ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            paint,
        });
    }

    fn place_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: &str,
        font_size: f64,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        let font = self.fonts.resolve(font).0.to_string();
        self.current_page().ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            font,
            font_size,
            color,
        });
    }

    fn stroke_line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: Color,
    ) {
        self.current_page().ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        });
    }

    fn place_image(&mut self, image: LoadedImage, x: f64, y: f64, width: f64, height: f64) {
        let index = self.images.len();
        self.images.push(image);
        self.current_page().ops.push(DrawOp::Image {
            image: index,
            x,
            y,
            width,
            height,
        });
    }

    fn measure_text(&self, text: &str, font: &str, font_size: f64) -> f64 {
        self.fonts.measure(text, font, font_size)
    }

    fn flush(&mut self, out: &mut dyn IoWrite) -> Result<()> {
        let bytes = self.to_bytes()?;
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }
}
