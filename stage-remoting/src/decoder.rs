//! Renderer-side decoder for outbound messages.

use serde::{Deserialize, Serialize};
use stage_core::{
    BlendMode, Bounds, ColorTransform, ImageType, Matrix, ObjectId, PixelSnapping, TextFormatAlign,
};

use crate::codec::WireReader;
use crate::error::{RemotingError, RemotingResult};
use crate::wire::{ColorTransformEncoding, MessageBits, MessageTag, Reference};

/// Clip, blend mode, visibility and bitmap rendering of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscellaneousProperties {
    /// Number of following siblings clipped.
    pub clip: i32,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Whether the node is rendered.
    pub visible: bool,
    /// Pixel snapping.
    pub pixel_snapping: PixelSnapping,
    /// Smooth when scaled.
    pub smoothing: bool,
}

/// Decoded `UpdateFrame`. Absent sections were not dirty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameUpdate {
    /// Node identity.
    pub id: ObjectId,
    /// New matrix.
    pub matrix: Option<Matrix>,
    /// New color transform.
    pub color_transform: Option<ColorTransform>,
    /// New mask; `Some(None)` removes it.
    pub mask: Option<Option<ObjectId>>,
    /// New miscellaneous properties.
    pub miscellaneous: Option<MiscellaneousProperties>,
    /// New child references.
    pub children: Option<Vec<Reference>>,
}

/// Decoded run format. Metrics are already scaled by the font size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTextFormat {
    /// Size in pixels.
    pub size: i32,
    /// Embedded font, or `None` for a device font.
    pub font: Option<ObjectId>,
    /// Ascent in pixels.
    pub ascent: i32,
    /// Descent in pixels.
    pub descent: i32,
    /// Leading in pixels.
    pub leading: i32,
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Packed color.
    pub color: i32,
    /// Alignment.
    pub align: TextFormatAlign,
    /// Bulleted.
    pub bullet: bool,
    /// Indent in pixels.
    pub indent: i32,
    /// Kerning enabled.
    pub kerning: bool,
    /// Left margin in pixels.
    pub left_margin: i32,
    /// Letter spacing in pixels.
    pub letter_spacing: i32,
    /// Right margin in pixels.
    pub right_margin: i32,
    /// Underlined.
    pub underline: bool,
}

/// Decoded text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTextRun {
    /// First character index.
    pub begin_index: i32,
    /// One past the last character index.
    pub end_index: i32,
    /// Formatting.
    pub format: WireTextFormat,
}

/// Decoded `UpdateTextContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUpdate {
    /// Text content identity.
    pub id: ObjectId,
    /// Symbol, if any.
    pub symbol: Option<i32>,
    /// Field bounds in twips.
    pub bounds: Bounds,
    /// Text transform.
    pub matrix: Matrix,
    /// Background color.
    pub background_color: i32,
    /// Border color.
    pub border_color: i32,
    /// Auto-size.
    pub auto_size: bool,
    /// Word wrap.
    pub word_wrap: bool,
    /// Asset index of the plain text.
    pub asset: i32,
    /// Formatted runs.
    pub runs: Vec<WireTextRun>,
    /// Per-character coordinates in pixels; empty when not laid out.
    pub coords: Vec<i32>,
}

/// A decoded outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Stage size.
    UpdateStage {
        /// Stage rectangle in twips.
        bounds: Bounds,
    },
    /// Drawable path data.
    UpdateGraphics {
        /// Drawable identity.
        id: ObjectId,
        /// Symbol, if any.
        symbol: Option<i32>,
        /// Content bounds in twips.
        bounds: Bounds,
        /// Asset index of the path data.
        asset: i32,
        /// Bitmap data used by fills, by texture index.
        textures: Vec<ObjectId>,
    },
    /// Pixel data.
    UpdateBitmapData {
        /// Bitmap data identity.
        id: ObjectId,
        /// Symbol, if any.
        symbol: Option<i32>,
        /// Bounds in twips.
        bounds: Bounds,
        /// Pixel layout.
        kind: ImageType,
        /// Asset index of the pixels.
        asset: i32,
    },
    /// Text content.
    UpdateTextContent(TextUpdate),
    /// Embedded font.
    RegisterFont {
        /// Font identity.
        id: ObjectId,
        /// Glyphs are bold.
        bold: bool,
        /// Glyphs are italic.
        italic: bool,
        /// Asset index of the glyph data.
        asset: i32,
    },
    /// Node update.
    UpdateFrame(FrameUpdate),
    /// Render request.
    CacheAsBitmap {
        /// Bitmap data receiving the pixels.
        target: ObjectId,
        /// What to render.
        source: Reference,
        /// Source transform.
        matrix: Option<Matrix>,
        /// Source color transform.
        color_transform: Option<ColorTransform>,
        /// Clip rectangle in twips.
        clip_rect: Option<Bounds>,
        /// Blend mode.
        blend_mode: BlendMode,
        /// Smooth when scaling.
        smoothing: bool,
    },
}

/// Reads messages from a batch's byte stream.
#[derive(Debug, Clone)]
pub struct MessageDecoder<'a> {
    input: WireReader<'a>,
}

impl<'a> MessageDecoder<'a> {
    /// Decode `bytes` from the start.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            input: WireReader::new(bytes),
        }
    }

    /// Whether every message has been read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Read the next message.
    ///
    /// # Errors
    ///
    /// Fails on an unknown or event tag, an unknown encoding or image type,
    /// or a truncated message.
    pub fn read_message(&mut self) -> RemotingResult<Message> {
        let input = &mut self.input;
        let tag = input.read_int()?;
        let message = match MessageTag::from_number(tag) {
            Some(MessageTag::UpdateStage) => {
                input.read_int()?;
                Message::UpdateStage {
                    bounds: read_rectangle(input)?,
                }
            }
            Some(MessageTag::UpdateGraphics) => {
                let id = read_id(input)?;
                let symbol = read_symbol(input)?;
                let bounds = read_rectangle(input)?;
                let asset = input.read_int()?;
                let count = input.read_count()?;
                let textures = (0..count).map(|_| read_id(input)).collect::<RemotingResult<_>>()?;
                Message::UpdateGraphics {
                    id,
                    symbol,
                    bounds,
                    asset,
                    textures,
                }
            }
            Some(MessageTag::UpdateBitmapData) => {
                let id = read_id(input)?;
                let symbol = read_symbol(input)?;
                let bounds = read_rectangle(input)?;
                let kind = input.read_int()?;
                let kind = ImageType::from_number(kind).ok_or(RemotingError::UnknownImageType(kind))?;
                Message::UpdateBitmapData {
                    id,
                    symbol,
                    bounds,
                    kind,
                    asset: input.read_int()?,
                }
            }
            Some(MessageTag::UpdateTextContent) => Message::UpdateTextContent(read_text_update(input)?),
            Some(MessageTag::RegisterFont) => Message::RegisterFont {
                id: read_id(input)?,
                bold: input.read_boolean()?,
                italic: input.read_boolean()?,
                asset: input.read_int()?,
            },
            Some(MessageTag::UpdateFrame) => Message::UpdateFrame(read_frame_update(input)?),
            Some(MessageTag::CacheAsBitmap) => {
                let target = read_id(input)?;
                let source = Reference::from_wire(input.read_int()?);
                let bits = MessageBits::from_bits_truncate(input.read_int()?);
                let matrix = bits
                    .contains(MessageBits::HAS_MATRIX)
                    .then(|| read_matrix(input))
                    .transpose()?;
                let color_transform = bits
                    .contains(MessageBits::HAS_COLOR_TRANSFORM)
                    .then(|| read_color_transform(input))
                    .transpose()?;
                let clip_rect = bits
                    .contains(MessageBits::HAS_CLIP_RECT)
                    .then(|| read_rectangle(input))
                    .transpose()?;
                Message::CacheAsBitmap {
                    target,
                    source,
                    matrix,
                    color_transform,
                    clip_rect,
                    blend_mode: BlendMode::from_number(input.read_int()?).unwrap_or_default(),
                    smoothing: input.read_boolean()?,
                }
            }
            _ => {
                tracing::warn!("Unknown message tag: {tag}");
                return Err(RemotingError::UnknownTag(tag));
            }
        };
        Ok(message)
    }
}

impl Iterator for MessageDecoder<'_> {
    type Item = RemotingResult<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            None
        } else {
            Some(self.read_message())
        }
    }
}

fn read_id(input: &mut WireReader<'_>) -> RemotingResult<ObjectId> {
    input.read_int().map(ObjectId::from_raw)
}

fn read_symbol(input: &mut WireReader<'_>) -> RemotingResult<Option<i32>> {
    let symbol = input.read_int()?;
    Ok((symbol != -1).then_some(symbol))
}

/// Read origin and size in twips.
///
/// # Errors
///
/// Fails if the input is truncated.
pub fn read_rectangle(input: &mut WireReader<'_>) -> RemotingResult<Bounds> {
    let x = input.read_int()?;
    let y = input.read_int()?;
    let width = input.read_int()?;
    let height = input.read_int()?;
    Ok(Bounds::from_xywh(x, y, width, height))
}

/// Read six matrix floats.
///
/// # Errors
///
/// Fails if the input is truncated.
pub fn read_matrix(input: &mut WireReader<'_>) -> RemotingResult<Matrix> {
    let mut coefficients = [0.0; 6];
    for coefficient in &mut coefficients {
        *coefficient = f64::from(input.read_float()?);
    }
    Ok(Matrix::new(coefficients))
}

/// Read a color transform in any of its encodings.
///
/// # Errors
///
/// Fails on an unknown encoding or a truncated input.
pub fn read_color_transform(input: &mut WireReader<'_>) -> RemotingResult<ColorTransform> {
    let encoding = input.read_int()?;
    match ColorTransformEncoding::from_number(encoding) {
        Some(ColorTransformEncoding::Identity) => Ok(ColorTransform::IDENTITY),
        Some(ColorTransformEncoding::AlphaMultiplierOnly) => {
            Ok(ColorTransform::from_alpha(input.read_float()?))
        }
        Some(ColorTransformEncoding::All) => Ok(ColorTransform {
            red_multiplier: input.read_float()?,
            green_multiplier: input.read_float()?,
            blue_multiplier: input.read_float()?,
            alpha_multiplier: input.read_float()?,
            red_offset: input.read_int()?,
            green_offset: input.read_int()?,
            blue_offset: input.read_int()?,
            alpha_offset: input.read_int()?,
        }),
        None => Err(RemotingError::UnknownColorTransformEncoding(encoding)),
    }
}

fn read_frame_update(input: &mut WireReader<'_>) -> RemotingResult<FrameUpdate> {
    let id = read_id(input)?;
    let bits = MessageBits::from_bits_truncate(input.read_int()?);
    let matrix = bits
        .contains(MessageBits::HAS_MATRIX)
        .then(|| read_matrix(input))
        .transpose()?;
    let color_transform = bits
        .contains(MessageBits::HAS_COLOR_TRANSFORM)
        .then(|| read_color_transform(input))
        .transpose()?;
    let mask = if bits.contains(MessageBits::HAS_MASK) {
        let mask = input.read_int()?;
        Some((mask != -1).then(|| ObjectId::from_raw(mask)))
    } else {
        None
    };
    let miscellaneous = if bits.contains(MessageBits::HAS_MISCELLANEOUS_PROPERTIES) {
        Some(MiscellaneousProperties {
            clip: input.read_int()?,
            blend_mode: BlendMode::from_number(input.read_int()?).unwrap_or_default(),
            visible: input.read_boolean()?,
            pixel_snapping: PixelSnapping::from_number(input.read_int()?).unwrap_or_default(),
            smoothing: input.read_int()? != 0,
        })
    } else {
        None
    };
    let children = if bits.contains(MessageBits::HAS_CHILDREN) {
        let count = input.read_count()?;
        let children = (0..count)
            .map(|_| input.read_int().map(Reference::from_wire))
            .collect::<RemotingResult<_>>()?;
        Some(children)
    } else {
        None
    };
    Ok(FrameUpdate {
        id,
        matrix,
        color_transform,
        mask,
        miscellaneous,
        children,
    })
}

fn read_text_update(input: &mut WireReader<'_>) -> RemotingResult<TextUpdate> {
    let id = read_id(input)?;
    let symbol = read_symbol(input)?;
    let bounds = read_rectangle(input)?;
    let matrix = read_matrix(input)?;
    let background_color = input.read_int()?;
    let border_color = input.read_int()?;
    let auto_size = input.read_boolean()?;
    let word_wrap = input.read_boolean()?;
    let asset = input.read_int()?;
    let run_count = input.read_count()?;
    let mut runs = Vec::with_capacity(run_count.min(input.remaining()));
    for _ in 0..run_count {
        runs.push(WireTextRun {
            begin_index: input.read_int()?,
            end_index: input.read_int()?,
            format: read_text_format(input)?,
        });
    }
    let coord_count = input.read_count()?;
    let coords = (0..coord_count)
        .map(|_| input.read_int())
        .collect::<RemotingResult<_>>()?;
    Ok(TextUpdate {
        id,
        symbol,
        bounds,
        matrix,
        background_color,
        border_color,
        auto_size,
        word_wrap,
        asset,
        runs,
        coords,
    })
}

/// Read a run format.
///
/// # Errors
///
/// Fails if the input is truncated.
pub fn read_text_format(input: &mut WireReader<'_>) -> RemotingResult<WireTextFormat> {
    let size = input.read_int()?;
    let font = input.read_int()?;
    Ok(WireTextFormat {
        size,
        font: (font != 0).then(|| ObjectId::from_raw(font)),
        ascent: input.read_int()?,
        descent: input.read_int()?,
        leading: input.read_int()?,
        bold: input.read_boolean()?,
        italic: input.read_boolean()?,
        color: input.read_int()?,
        align: TextFormatAlign::from_number(input.read_int()?).unwrap_or_default(),
        bullet: input.read_boolean()?,
        indent: input.read_int()?,
        kerning: input.read_int()? != 0,
        left_margin: input.read_int()?,
        letter_spacing: input.read_int()?,
        right_margin: input.read_int()?,
        underline: input.read_boolean()?,
    })
}
