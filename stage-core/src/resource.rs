//! Resources referenced by drawables and nodes: bitmap data, text content and
//! fonts.
//!
//! Each resource carries its own dirty flag, independent of the nodes that
//! reference it, so an unchanged resource is never re-sent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, TWIPS_PER_PIXEL};
use crate::style::TextFormatAlign;
use crate::transform::Matrix;
use crate::ObjectId;

/// Pixel layout of bitmap data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ImageType {
    /// 32-bit ARGB with premultiplied alpha.
    PremultipliedAlphaArgb = 1,
    /// 32-bit ARGB with straight alpha.
    StraightAlphaArgb = 2,
    /// 32-bit RGBA with straight alpha.
    StraightAlphaRgba = 3,
    /// Encoded JPEG.
    Jpeg = 4,
    /// Encoded PNG.
    Png = 5,
    /// Encoded GIF.
    Gif = 6,
}

impl ImageType {
    /// Parse a wire code.
    #[must_use]
    pub const fn from_number(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::PremultipliedAlphaArgb),
            2 => Some(Self::StraightAlphaArgb),
            3 => Some(Self::StraightAlphaRgba),
            4 => Some(Self::Jpeg),
            5 => Some(Self::Png),
            6 => Some(Self::Gif),
            _ => None,
        }
    }

    /// The wire code.
    #[must_use]
    pub const fn to_number(self) -> i32 {
        self as i32
    }
}

/// A pixel buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapData {
    id: ObjectId,
    /// Symbol the data was created from, if any.
    pub symbol: Option<i32>,
    width: u32,
    height: u32,
    kind: ImageType,
    pixels: Vec<u8>,
    dirty: bool,
}

impl BitmapData {
    /// Create bitmap data. New data is dirty.
    #[must_use]
    pub fn new(id: ObjectId, width: u32, height: u32, kind: ImageType, pixels: Vec<u8>) -> Self {
        Self {
            id,
            symbol: None,
            width,
            height,
            kind,
            pixels,
            dirty: true,
        }
    }

    /// Identity.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout.
    #[must_use]
    pub const fn kind(&self) -> ImageType {
        self.kind
    }

    /// Raw pixel bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Replace the pixels and mark the data dirty.
    pub fn set_pixels(&mut self, kind: ImageType, pixels: Vec<u8>) {
        self.kind = kind;
        self.pixels = pixels;
        self.dirty = true;
    }

    /// Content bounds in twips.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // Bitmap sizes are far below i32::MAX / 20
    pub fn bounds(&self) -> Bounds {
        Bounds::from_xywh(
            0,
            0,
            self.width as i32 * TWIPS_PER_PIXEL,
            self.height as i32 * TWIPS_PER_PIXEL,
        )
    }

    /// Whether the data changed since it was last sent.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the data changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Mark the data sent.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Character formatting of a text run.
///
/// Unset fields fall back to renderer defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFormat {
    /// Font name.
    pub font: Option<String>,
    /// Size in pixels.
    pub size: Option<f64>,
    /// Packed `0xRRGGBB` color.
    pub color: Option<u32>,
    /// Bold; when unset an embedded font's own style decides.
    pub bold: Option<bool>,
    /// Italic; when unset an embedded font's own style decides.
    pub italic: Option<bool>,
    /// Underline.
    pub underline: Option<bool>,
    /// Paragraph alignment.
    pub align: Option<TextFormatAlign>,
    /// Bulleted paragraph.
    pub bullet: Option<bool>,
    /// First-line indent in pixels.
    pub indent: Option<f64>,
    /// Kerning enabled.
    pub kerning: Option<bool>,
    /// Left margin in pixels.
    pub left_margin: Option<f64>,
    /// Right margin in pixels.
    pub right_margin: Option<f64>,
    /// Extra spacing between characters in pixels.
    pub letter_spacing: Option<f64>,
    /// Extra spacing between lines in pixels.
    pub leading: Option<f64>,
}

/// A span of text sharing one format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// First character index.
    pub begin_index: i32,
    /// One past the last character index.
    pub end_index: i32,
    /// Formatting.
    pub format: TextFormat,
}

/// Laid-out text forwarded to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    id: ObjectId,
    plain_text: String,
    runs: Vec<TextRun>,
    /// Text transform; identity when unset.
    pub matrix: Option<Matrix>,
    /// Background color, packed `0xRRGGBBAA`.
    pub background_color: u32,
    /// Border color, packed `0xRRGGBBAA`.
    pub border_color: u32,
    /// Grow the field to fit its text.
    pub auto_size: bool,
    /// Wrap lines at the field width.
    pub word_wrap: bool,
    /// Field bounds in twips.
    pub bounds: Bounds,
    coords: Option<Vec<i32>>,
    dirty: bool,
}

impl TextContent {
    /// Create empty text content. New content is dirty.
    #[must_use]
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            plain_text: String::new(),
            runs: Vec::new(),
            matrix: None,
            background_color: 0,
            border_color: 0,
            auto_size: false,
            word_wrap: false,
            bounds: Bounds::EMPTY,
            coords: None,
            dirty: true,
        }
    }

    /// Identity.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Unformatted text.
    #[must_use]
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    /// Formatted runs.
    #[must_use]
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Per-character glyph coordinates in twips.
    #[must_use]
    pub fn coords(&self) -> Option<&[i32]> {
        self.coords.as_deref()
    }

    /// Replace the text with a single run in `format`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Text length fits in i32
    pub fn set_text(&mut self, text: impl Into<String>, format: TextFormat) {
        self.plain_text = text.into();
        let end_index = self.plain_text.chars().count() as i32;
        self.runs = vec![TextRun {
            begin_index: 0,
            end_index,
            format,
        }];
        self.dirty = true;
    }

    /// Replace the text and its runs.
    pub fn set_runs(&mut self, text: impl Into<String>, runs: Vec<TextRun>) {
        self.plain_text = text.into();
        self.runs = runs;
        self.dirty = true;
    }

    /// Replace the glyph coordinates.
    pub fn set_coords(&mut self, coords: Option<Vec<i32>>) {
        self.coords = coords;
        self.dirty = true;
    }

    /// Whether the content changed since it was last sent.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the content changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Mark the content sent.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Style a font was designed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    /// Regular.
    #[default]
    Regular,
    /// Bold.
    Bold,
    /// Italic.
    Italic,
    /// Bold italic.
    BoldItalic,
}

impl FontStyle {
    /// Whether the style is bold.
    #[must_use]
    pub const fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Whether the style is italic.
    #[must_use]
    pub const fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Where a font's glyphs come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FontSource {
    /// Installed on the rendering device.
    Device,
    /// Shipped with the content.
    Embedded {
        /// Glyphs are bold.
        bold: bool,
        /// Glyphs are italic.
        italic: bool,
        /// Glyph data.
        data: Vec<u8>,
    },
}

/// A font and its em-relative metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// Identity.
    pub id: ObjectId,
    /// Family name used by text formats.
    pub name: String,
    /// Design style.
    pub style: FontStyle,
    /// Ascent per em.
    pub ascent: f64,
    /// Descent per em.
    pub descent: f64,
    /// Leading per em.
    pub leading: f64,
    /// Glyph source.
    pub source: FontSource,
}

impl Font {
    /// Whether the font ships its own glyphs.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self.source, FontSource::Embedded { .. })
    }
}

/// Registry of bitmap data and fonts.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    bitmaps: HashMap<ObjectId, BitmapData>,
    fonts: Vec<Font>,
}

impl Resources {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace bitmap data.
    pub fn insert_bitmap(&mut self, bitmap: BitmapData) -> ObjectId {
        let id = bitmap.id();
        self.bitmaps.insert(id, bitmap);
        id
    }

    /// Look up bitmap data.
    #[must_use]
    pub fn bitmap(&self, id: ObjectId) -> Option<&BitmapData> {
        self.bitmaps.get(&id)
    }

    /// Look up bitmap data mutably.
    pub fn bitmap_mut(&mut self, id: ObjectId) -> Option<&mut BitmapData> {
        self.bitmaps.get_mut(&id)
    }

    /// Register a font. A font with the same name replaces the earlier one.
    pub fn register_font(&mut self, font: Font) {
        self.fonts.retain(|f| f.name != font.name);
        self.fonts.push(font);
    }

    /// Look up a font by family name.
    #[must_use]
    pub fn font_by_name(&self, name: &str) -> Option<&Font> {
        self.fonts.iter().find(|f| f.name == name)
    }

    /// Registered fonts in registration order.
    #[must_use]
    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_bounds_in_twips() {
        let bitmap = BitmapData::new(ObjectId::from_raw(3), 4, 2, ImageType::Png, vec![0; 4]);
        assert_eq!(bitmap.bounds(), Bounds::new(0, 0, 80, 40));
        assert!(bitmap.is_dirty());
    }

    #[test]
    fn test_text_run_covers_characters() {
        let mut text = TextContent::new(ObjectId::from_raw(9));
        text.clear_dirty();
        text.set_text("héllo", TextFormat::default());
        assert!(text.is_dirty());
        assert_eq!(text.runs().len(), 1);
        assert_eq!(text.runs()[0].end_index, 5);
    }

    #[test]
    fn test_font_registry_replaces_by_name() {
        let mut resources = Resources::new();
        let font = |id: i32, style: FontStyle| Font {
            id: ObjectId::from_raw(id),
            name: "Sans".to_string(),
            style,
            ascent: 0.8,
            descent: 0.2,
            leading: 0.0,
            source: FontSource::Device,
        };
        resources.register_font(font(1, FontStyle::Regular));
        resources.register_font(font(2, FontStyle::Bold));
        assert_eq!(resources.fonts().len(), 1);
        let found = resources.font_by_name("Sans").map(|f| f.id.raw());
        assert_eq!(found, Some(2));
        assert!(resources.font_by_name("Serif").is_none());
    }

    #[test]
    fn test_font_style_flags() {
        assert!(FontStyle::BoldItalic.is_bold());
        assert!(FontStyle::BoldItalic.is_italic());
        assert!(!FontStyle::Bold.is_italic());
        assert!(!FontStyle::Regular.is_bold());
    }
}
