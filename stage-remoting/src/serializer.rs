//! Player-side serializer.
//!
//! Walks dirty state in a [`DisplayTree`] and writes tagged messages to a
//! byte buffer, pushing bulk payloads onto an [`AssetTable`]. Each
//! sub-resource (drawable, bitmap data, text content) carries its own dirty
//! flag, so writing an unchanged one again emits nothing.
//!
//! ```text
//!  UpdateFrame  ┌─────┬────┬──────┬────────┬────┬──────┬──────┬──────────┐
//!               │ tag │ id │ bits │ matrix │ ct │ mask │ misc │ children │
//!               └─────┴────┴──────┴────────┴────┴──────┴──────┴──────────┘
//!                               (sections present only when their bit is set)
//! ```

use serde::{Deserialize, Serialize};
use stage_core::{
    BlendMode, Bounds, ColorTransform, CoreError, DisplayNode, DisplayTree, Font, FontSource,
    Graphics, Matrix, NodeFlags, NodeKind, ObjectId, PixelSnapping, Resources, TextContent,
    TextFormat, TWIPS_PER_PIXEL,
};

use crate::asset::{Asset, AssetTable};
use crate::codec::WireWriter;
use crate::error::RemotingResult;
use crate::wire::{ColorTransformEncoding, MessageBits, MessageTag, Reference, RemotingPhase};
use crate::RemotingConfig;

/// The output of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameBatch {
    /// Message stream.
    pub bytes: Vec<u8>,
    /// Payloads referenced from the stream by index.
    pub assets: AssetTable,
}

/// What `cache_as_bitmap` renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheSource {
    /// A display node and its subtree.
    Node(ObjectId),
    /// Existing bitmap data.
    BitmapData(ObjectId),
}

impl CacheSource {
    const fn reference(self) -> Reference {
        match self {
            Self::Node(id) => Reference::Object(id),
            Self::BitmapData(id) => Reference::Asset(id),
        }
    }
}

/// A request to render a source into bitmap data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheAsBitmapRequest {
    /// Bitmap data receiving the pixels.
    pub target: ObjectId,
    /// What to render.
    pub source: CacheSource,
    /// Transform applied to the source.
    pub matrix: Option<Matrix>,
    /// Color transform applied to the source.
    pub color_transform: Option<ColorTransform>,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Clip rectangle in twips.
    pub clip_rect: Option<Bounds>,
    /// Smooth when scaling.
    pub smoothing: bool,
}

impl CacheAsBitmapRequest {
    /// A request with no transform, clip or smoothing.
    #[must_use]
    pub fn new(target: ObjectId, source: CacheSource) -> Self {
        Self {
            target,
            source,
            matrix: None,
            color_transform: None,
            blend_mode: BlendMode::Normal,
            clip_rect: None,
            smoothing: false,
        }
    }
}

/// Payload attached to a node, written after its frame update.
enum Attached {
    Graphics,
    Text(Bounds),
    Bitmap(ObjectId),
}

/// Writes outbound messages for a display tree.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    output: WireWriter,
    assets: AssetTable,
}

impl Serializer {
    /// Create a serializer with an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer sized by `config`.
    #[must_use]
    pub fn with_config(config: &RemotingConfig) -> Self {
        Self {
            output: WireWriter::with_capacity(config.initial_buffer_capacity),
            assets: AssetTable::new(),
        }
    }

    /// Bytes written since the last batch was taken.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Assets pushed since the last batch was taken.
    #[must_use]
    pub const fn assets(&self) -> &AssetTable {
        &self.assets
    }

    /// Hand off everything written so far and start a new batch.
    pub fn take_batch(&mut self) -> FrameBatch {
        FrameBatch {
            bytes: self.output.take(),
            assets: std::mem::take(&mut self.assets),
        }
    }

    /// Consume the serializer, returning its batch.
    #[must_use]
    pub fn finish(self) -> FrameBatch {
        FrameBatch {
            bytes: self.output.finish(),
            assets: self.assets,
        }
    }

    fn write_tag(&mut self, tag: MessageTag) {
        self.output.write_int(tag.to_number());
    }

    fn write_reference(&mut self, reference: Reference) {
        self.output.write_int(reference.to_wire());
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Write a frame update for every dirty node under `root`, parents first.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not in the tree.
    pub fn write_display_object(
        &mut self,
        tree: &mut DisplayTree,
        root: ObjectId,
        phase: RemotingPhase,
    ) -> RemotingResult<()> {
        for id in tree.dirty_nodes(root)? {
            self.write_update_frame(tree, id, phase)?;
        }
        Ok(())
    }

    /// Write the stage size.
    pub fn write_stage(&mut self, tree: &DisplayTree) {
        tracing::debug!("Sending Stage");
        let (width, height) = tree.stage_size();
        let twips = |pixels: u32| i32::try_from(pixels).unwrap_or(i32::MAX).saturating_mul(TWIPS_PER_PIXEL);
        self.write_tag(MessageTag::UpdateStage);
        self.output.write_int(0);
        self.write_rectangle(&Bounds::from_xywh(0, 0, twips(width), twips(height)));
    }

    /// Write one node's dirty properties, its child references in the
    /// `References` phase, and then any dirty payload attached to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the tree.
    pub fn write_update_frame(
        &mut self,
        tree: &mut DisplayTree,
        id: ObjectId,
        phase: RemotingPhase,
    ) -> RemotingResult<()> {
        let node = tree.node(id).ok_or(CoreError::NodeNotFound(id))?;
        tracing::debug!("Sending UpdateFrame: {} {id}", node.kind().name());

        self.write_tag(MessageTag::UpdateFrame);
        self.output.write_int(id.raw());

        let has_matrix = node.has_flags(NodeFlags::DIRTY_MATRIX);
        let has_color_transform = node.has_flags(NodeFlags::DIRTY_COLOR_TRANSFORM);
        let has_miscellaneous = node.has_flags(NodeFlags::DIRTY_MISCELLANEOUS_PROPERTIES);
        let (has_children, has_mask) = match phase {
            RemotingPhase::Objects => (false, false),
            RemotingPhase::References => (
                node.has_any_flags(
                    NodeFlags::DIRTY_CHILDREN | NodeFlags::DIRTY_GRAPHICS | NodeFlags::DIRTY_BITMAP_DATA,
                ),
                node.has_flags(NodeFlags::DIRTY_MASK),
            ),
        };

        let mut bits = MessageBits::empty();
        bits.set(MessageBits::HAS_MATRIX, has_matrix);
        bits.set(MessageBits::HAS_COLOR_TRANSFORM, has_color_transform);
        bits.set(MessageBits::HAS_MASK, has_mask);
        bits.set(MessageBits::HAS_MISCELLANEOUS_PROPERTIES, has_miscellaneous);
        bits.set(MessageBits::HAS_CHILDREN, has_children);
        self.output.write_int(bits.bits());

        if has_matrix {
            self.write_matrix(&node.matrix());
        }
        if has_color_transform {
            self.write_color_transform(&node.color_transform());
        }
        if has_mask {
            self.output.write_int(node.mask().map_or(-1, ObjectId::raw));
        }
        if has_miscellaneous {
            self.write_miscellaneous_properties(node);
        }
        if has_children {
            self.write_children(node);
        }

        let attached = match node.kind() {
            NodeKind::Sprite { graphics: Some(_) } | NodeKind::Shape { .. } => Some(Attached::Graphics),
            NodeKind::Text { .. } => Some(Attached::Text(tree.content_bounds(node))),
            NodeKind::Bitmap {
                bitmap_data: Some(data),
                ..
            } => Some(Attached::Bitmap(*data)),
            _ => None,
        };

        if phase == RemotingPhase::References {
            tree.clear_dirty(id)?;
        }

        match attached {
            Some(Attached::Graphics) => self.write_graphics(tree, id)?,
            Some(Attached::Text(bounds)) => self.write_text_content(tree, id, bounds)?,
            Some(Attached::Bitmap(data)) => self.write_bitmap_data(tree.resources_mut(), data),
            None => {}
        }
        Ok(())
    }

    fn write_miscellaneous_properties(&mut self, node: &DisplayNode) {
        let clip = if node.parent().is_some() { node.clip() } else { 0 };
        self.output.write_count(clip);
        self.output.write_int(node.blend_mode().to_number());
        self.output.write_boolean(node.is_visible());
        if let NodeKind::Bitmap {
            pixel_snapping,
            smoothing,
            ..
        } = node.kind()
        {
            self.output.write_int(pixel_snapping.to_number());
            self.output.write_int(i32::from(*smoothing));
        } else {
            self.output.write_int(PixelSnapping::Auto.to_number());
            self.output.write_int(1);
        }
    }

    fn write_children(&mut self, node: &DisplayNode) {
        if let NodeKind::Bitmap { bitmap_data, .. } = node.kind() {
            if let Some(data) = bitmap_data {
                self.output.write_int(1);
                self.write_reference(Reference::Asset(*data));
            } else {
                self.output.write_int(0);
            }
            return;
        }

        let attached = node
            .graphics()
            .map(Graphics::id)
            .or_else(|| node.text_content().map(TextContent::id));
        let children: Vec<ObjectId> = node.children().iter().flatten().copied().collect();
        self.output
            .write_count(usize::from(attached.is_some()) + children.len());
        if let Some(payload) = attached {
            tracing::trace!("Reference payload: {payload}");
            self.write_reference(Reference::Asset(payload));
        }
        for child in children {
            tracing::trace!("Reference node: {child}");
            self.write_reference(Reference::Object(child));
        }
    }

    // ------------------------------------------------------------------
    // Payloads
    // ------------------------------------------------------------------

    /// Write the node's drawable if it changed since it was last written.
    ///
    /// Dirty bitmap data used by its fills is written first.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the tree.
    pub fn write_graphics(&mut self, tree: &mut DisplayTree, node: ObjectId) -> RemotingResult<()> {
        let Some(graphics) = tree.node(node).and_then(DisplayNode::graphics) else {
            return Ok(());
        };
        if !graphics.is_dirty() {
            return Ok(());
        }
        let textures = graphics.textures().to_vec();
        for &texture in &textures {
            self.write_bitmap_data(tree.resources_mut(), texture);
        }

        let graphics = tree
            .node(node)
            .and_then(DisplayNode::graphics)
            .ok_or(CoreError::NodeNotFound(node))?;
        tracing::debug!("Sending Graphics: {}", graphics.id());
        self.write_tag(MessageTag::UpdateGraphics);
        self.output.write_int(graphics.id().raw());
        self.output.write_int(-1);
        self.write_rectangle(&graphics.content_bounds(true));
        let index = self.assets.push(Asset::Shape(graphics.shape().clone()));
        self.output.write_int(index);
        self.output.write_count(textures.len());
        for texture in textures {
            self.output.write_int(texture.raw());
        }
        tree.clear_graphics_dirty(node)?;
        Ok(())
    }

    /// Write bitmap data if it changed since it was last written.
    pub fn write_bitmap_data(&mut self, resources: &mut Resources, id: ObjectId) {
        let Some(bitmap) = resources.bitmap_mut(id) else {
            tracing::debug!("Skipping unregistered bitmap data {id}");
            return;
        };
        if !bitmap.is_dirty() {
            return;
        }
        tracing::debug!("Sending BitmapData: {id}");
        self.write_tag(MessageTag::UpdateBitmapData);
        self.output.write_int(id.raw());
        self.output.write_int(bitmap.symbol.unwrap_or(-1));
        self.write_rectangle(&bitmap.bounds());
        self.output.write_int(bitmap.kind().to_number());
        let index = self.assets.push(Asset::Pixels {
            kind: bitmap.kind(),
            data: bitmap.pixels().to_vec(),
        });
        self.output.write_int(index);
        bitmap.clear_dirty();
    }

    /// Write the node's text content if it changed and holds any text.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the tree.
    pub fn write_text_content(
        &mut self,
        tree: &mut DisplayTree,
        node: ObjectId,
        bounds: Bounds,
    ) -> RemotingResult<()> {
        let Some(content) = tree.node(node).and_then(DisplayNode::text_content) else {
            return Ok(());
        };
        if !content.is_dirty() || content.plain_text().is_empty() {
            return Ok(());
        }
        tracing::debug!("Sending TextContent: {}", content.id());
        self.write_tag(MessageTag::UpdateTextContent);
        self.output.write_int(content.id().raw());
        self.output.write_int(-1);
        self.write_rectangle(&bounds);
        self.write_matrix(&content.matrix.unwrap_or(Matrix::IDENTITY));
        self.output.write_int(color_bits(content.background_color));
        self.output.write_int(color_bits(content.border_color));
        self.output.write_boolean(content.auto_size);
        self.output.write_boolean(content.word_wrap);
        let index = self.assets.push(Asset::Text {
            text: content.plain_text().to_owned(),
        });
        self.output.write_int(index);
        self.output.write_count(content.runs().len());
        for run in content.runs() {
            self.output.write_int(run.begin_index);
            self.output.write_int(run.end_index);
            self.write_text_format(&run.format, tree.resources());
        }
        if let Some(coords) = content.coords() {
            self.output.write_count(coords.len());
            for &coord in coords {
                self.output.write_int(coord / TWIPS_PER_PIXEL);
            }
        } else {
            self.output.write_int(0);
        }
        tree.clear_text_dirty(node)?;
        Ok(())
    }

    /// Register an embedded font. Device fonts are skipped; the renderer
    /// already has them.
    pub fn write_font(&mut self, font: &Font) {
        let FontSource::Embedded { bold, italic, data } = &font.source else {
            return;
        };
        tracing::debug!("Sending Font: {}", font.id);
        self.write_tag(MessageTag::RegisterFont);
        self.output.write_int(font.id.raw());
        self.output.write_boolean(*bold);
        self.output.write_boolean(*italic);
        let index = self.assets.push(Asset::Font { data: data.clone() });
        self.output.write_int(index);
    }

    /// Ask the renderer to draw a source into bitmap data.
    pub fn write_cache_as_bitmap(&mut self, request: &CacheAsBitmapRequest) {
        tracing::debug!("Sending CacheAsBitmap: {}", request.target);
        self.write_tag(MessageTag::CacheAsBitmap);
        self.output.write_int(request.target.raw());
        self.write_reference(request.source.reference());

        let mut bits = MessageBits::empty();
        bits.set(MessageBits::HAS_MATRIX, request.matrix.is_some());
        bits.set(MessageBits::HAS_COLOR_TRANSFORM, request.color_transform.is_some());
        bits.set(MessageBits::HAS_CLIP_RECT, request.clip_rect.is_some());
        self.output.write_int(bits.bits());

        if let Some(matrix) = &request.matrix {
            self.write_matrix(matrix);
        }
        if let Some(color_transform) = &request.color_transform {
            self.write_color_transform(color_transform);
        }
        if let Some(clip_rect) = &request.clip_rect {
            self.write_rectangle(clip_rect);
        }
        self.output.write_int(request.blend_mode.to_number());
        self.output.write_boolean(request.smoothing);
    }

    // ------------------------------------------------------------------
    // Value blocks
    // ------------------------------------------------------------------

    /// Write `[a, b, c, d, tx, ty]` as six floats.
    #[allow(clippy::cast_possible_truncation)] // Wire floats are single precision
    pub fn write_matrix(&mut self, matrix: &Matrix) {
        for coefficient in matrix.as_coeffs() {
            self.output.write_float(coefficient as f32);
        }
    }

    /// Write origin and size in twips.
    pub fn write_rectangle(&mut self, bounds: &Bounds) {
        self.output.write_int(bounds.x_min);
        self.output.write_int(bounds.y_min);
        self.output.write_int(bounds.width());
        self.output.write_int(bounds.height());
    }

    /// Write a color transform in its most compact encoding.
    pub fn write_color_transform(&mut self, color_transform: &ColorTransform) {
        if color_transform.has_identity_offsets() && color_transform.has_identity_color_multipliers() {
            if color_transform.is_identity() {
                self.output.write_int(ColorTransformEncoding::Identity as i32);
            } else {
                self.output
                    .write_int(ColorTransformEncoding::AlphaMultiplierOnly as i32);
                self.output.write_float(color_transform.alpha_multiplier);
            }
            return;
        }
        self.output.write_int(ColorTransformEncoding::All as i32);
        self.output.write_float(color_transform.red_multiplier);
        self.output.write_float(color_transform.green_multiplier);
        self.output.write_float(color_transform.blue_multiplier);
        self.output.write_float(color_transform.alpha_multiplier);
        self.output.write_int(color_transform.red_offset);
        self.output.write_int(color_transform.green_offset);
        self.output.write_int(color_transform.blue_offset);
        self.output.write_int(color_transform.alpha_offset);
    }

    /// Write a run's format. Embedded fonts contribute their identity and
    /// metrics scaled by the font size, and their own style decides bold and
    /// italic when the format leaves them unset.
    pub fn write_text_format(&mut self, format: &TextFormat, resources: &Resources) {
        let size = format.size.unwrap_or(0.0);
        self.output.write_int(truncate(size));

        let font = format
            .font
            .as_deref()
            .and_then(|name| resources.font_by_name(name))
            .filter(|font| font.is_embedded());
        if let Some(font) = font {
            self.output.write_int(font.id.raw());
            self.output.write_int(truncate(font.ascent * size));
            self.output.write_int(truncate(font.descent * size));
            self.output
                .write_int(truncate(format.leading.unwrap_or(font.leading * size)));
            self.output
                .write_boolean(format.bold.unwrap_or_else(|| font.style.is_bold()));
            self.output
                .write_boolean(format.italic.unwrap_or_else(|| font.style.is_italic()));
        } else {
            self.output.write_int(0);
            self.output.write_int(0);
            self.output.write_int(0);
            self.output.write_int(truncate(format.leading.unwrap_or(0.0)));
            self.output.write_boolean(format.bold.unwrap_or(false));
            self.output.write_boolean(format.italic.unwrap_or(false));
        }

        self.output.write_int(color_bits(format.color.unwrap_or(0)));
        self.output
            .write_int(format.align.unwrap_or_default().to_number());
        self.output.write_boolean(format.bullet.unwrap_or(false));
        self.output.write_int(truncate(format.indent.unwrap_or(0.0)));
        self.output
            .write_int(i32::from(format.kerning.unwrap_or(false)));
        self.output
            .write_int(truncate(format.left_margin.unwrap_or(0.0)));
        self.output
            .write_int(truncate(format.letter_spacing.unwrap_or(0.0)));
        self.output
            .write_int(truncate(format.right_margin.unwrap_or(0.0)));
        self.output.write_boolean(format.underline.unwrap_or(false));
    }
}

/// Reinterpret a packed color as the signed wire integer.
#[allow(clippy::cast_possible_wrap)] // Bit pattern is preserved
const fn color_bits(color: u32) -> i32 {
    color as i32
}

#[allow(clippy::cast_possible_truncation)] // Wire integers truncate toward zero
fn truncate(value: f64) -> i32 {
    value as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireReader;
    use stage_core::{FontMetrics, FontStyle, ImageType, TextRun};

    fn ints(bytes: &[u8]) -> Vec<i32> {
        bytes
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn square_shape(tree: &mut DisplayTree) -> ObjectId {
        let shape = tree.create_shape();
        tree.update_graphics(shape, |g, _| {
            g.begin_fill(0, 1.0);
            g.draw_rect(0.0, 0.0, 100.0, 100.0);
            g.end_fill();
        })
        .unwrap();
        shape
    }

    // ========================================================================
    // Stage and value blocks
    // ========================================================================

    #[test]
    fn test_write_stage() {
        let tree = DisplayTree::new(550, 400);
        let mut serializer = Serializer::new();
        serializer.write_stage(&tree);
        assert_eq!(ints(serializer.output()), vec![104, 0, 0, 0, 11000, 8000]);
    }

    #[test]
    fn test_color_transform_identity_has_no_payload() {
        let mut serializer = Serializer::new();
        serializer.write_color_transform(&ColorTransform::IDENTITY);
        assert_eq!(ints(serializer.output()), vec![0]);
    }

    #[test]
    fn test_color_transform_alpha_only() {
        let mut serializer = Serializer::new();
        serializer.write_color_transform(&ColorTransform::from_alpha(0.5));
        let bytes = serializer.output();
        assert_eq!(bytes.len(), 8);
        let mut reader = WireReader::new(bytes);
        assert_eq!(reader.read_int().unwrap(), 1);
        assert!((reader.read_float().unwrap() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_color_transform_offsets_need_full_form() {
        let mut serializer = Serializer::new();
        let color_transform = ColorTransform {
            red_offset: 10,
            ..ColorTransform::IDENTITY
        };
        serializer.write_color_transform(&color_transform);
        assert_eq!(serializer.output().len(), 4 + 16 + 16);
        assert_eq!(ints(&serializer.output()[..4]), vec![2]);
    }

    #[test]
    fn test_rectangle_writes_size() {
        let mut serializer = Serializer::new();
        serializer.write_rectangle(&Bounds::new(-20, 40, 200, 100));
        assert_eq!(ints(serializer.output()), vec![-20, 40, 220, 60]);
    }

    // ========================================================================
    // Payloads
    // ========================================================================

    #[test]
    fn test_unchanged_graphics_written_once() {
        let mut tree = DisplayTree::new(550, 400);
        let shape = square_shape(&mut tree);
        let graphics_id = tree.node(shape).unwrap().graphics().unwrap().id();

        let mut serializer = Serializer::new();
        serializer.write_graphics(&mut tree, shape).unwrap();
        let first = ints(serializer.output());
        assert_eq!(
            first,
            vec![101, graphics_id.raw(), -1, 0, 0, 2000, 2000, 0, 0]
        );
        assert_eq!(serializer.assets().len(), 1);

        serializer.write_graphics(&mut tree, shape).unwrap();
        assert_eq!(ints(serializer.output()).len(), first.len());
        assert_eq!(serializer.assets().len(), 1);
    }

    #[test]
    fn test_graphics_writes_textures_first() {
        let mut tree = DisplayTree::new(550, 400);
        let data = tree.create_bitmap_data(1, 1, ImageType::PremultipliedAlphaArgb, vec![0; 4]);
        let shape = tree.create_shape();
        tree.update_graphics(shape, |g, resources| {
            g.begin_bitmap_fill(resources.bitmap(data), None, false, false)
                .unwrap();
            g.draw_rect(0.0, 0.0, 1.0, 1.0);
        })
        .unwrap();

        let mut serializer = Serializer::new();
        serializer.write_graphics(&mut tree, shape).unwrap();
        let words = ints(serializer.output());
        assert_eq!(&words[..8], &[102, data.raw(), -1, 0, 0, 20, 20, 1]);
        assert_eq!(words[9], 101);
        assert_eq!(&words[words.len() - 2..], &[1, data.raw()]);
        assert!(!tree.resources().bitmap(data).unwrap().is_dirty());
    }

    #[test]
    fn test_text_content_requires_text() {
        let mut tree = DisplayTree::new(550, 400);
        let text = tree.create_text();
        let mut serializer = Serializer::new();
        serializer
            .write_text_content(&mut tree, text, Bounds::EMPTY)
            .unwrap();
        assert!(serializer.output().is_empty());
        assert!(tree.node(text).unwrap().text_content().unwrap().is_dirty());
    }

    #[test]
    fn test_text_content_layout() {
        let mut tree = DisplayTree::new(550, 400);
        let text = tree.create_text();
        tree.update_text(text, |content| {
            content.set_text("hi", TextFormat::default());
            content.set_coords(Some(vec![40, 200]));
        })
        .unwrap();
        let content_id = tree.node(text).unwrap().text_content().unwrap().id();

        let mut serializer = Serializer::new();
        serializer
            .write_text_content(&mut tree, text, Bounds::new(0, 0, 100, 20))
            .unwrap();
        let bytes = serializer.output().to_vec();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_int().unwrap(), 103);
        assert_eq!(reader.read_int().unwrap(), content_id.raw());
        assert_eq!(reader.read_int().unwrap(), -1);
        for expected in [0, 0, 100, 20] {
            assert_eq!(reader.read_int().unwrap(), expected);
        }
        for expected in [1.0, 0.0, 0.0, 1.0, 0.0, 0.0] {
            assert!((reader.read_float().unwrap() - expected).abs() < f32::EPSILON);
        }
        assert_eq!(reader.read_int().unwrap(), 0);
        assert_eq!(reader.read_int().unwrap(), 0);
        assert!(!reader.read_boolean().unwrap());
        assert!(!reader.read_boolean().unwrap());
        assert_eq!(reader.read_int().unwrap(), 0);
        assert_eq!(reader.read_int().unwrap(), 1);
        assert_eq!(reader.read_int().unwrap(), 0);
        assert_eq!(reader.read_int().unwrap(), 2);
        // Device-font format block: size, 3 zero metrics, leading, bold, italic,
        // color, align, bullet, indent, kerning, margins, spacing, underline.
        let format_len = 4 * 5 + 2 + 4 * 2 + 1 + 4 * 5 + 1;
        for _ in 0..format_len {
            reader.read_boolean().unwrap();
        }
        assert_eq!(reader.read_int().unwrap(), 2);
        assert_eq!(reader.read_int().unwrap(), 2);
        assert_eq!(reader.read_int().unwrap(), 10);
        assert!(reader.is_empty());
        assert_eq!(
            serializer.assets().get(0),
            Some(&Asset::Text { text: "hi".into() })
        );
    }

    #[test]
    fn test_text_format_embedded_font_metrics() {
        let mut tree = DisplayTree::new(550, 400);
        let font = tree.register_font(
            "Sans",
            FontStyle::BoldItalic,
            FontMetrics {
                ascent: 0.75,
                descent: 0.25,
                leading: 0.5,
            },
            FontSource::Embedded {
                bold: true,
                italic: true,
                data: vec![1],
            },
        );
        let format = TextFormat {
            font: Some("Sans".into()),
            size: Some(20.0),
            italic: Some(false),
            ..TextFormat::default()
        };

        let mut serializer = Serializer::new();
        serializer.write_text_format(&format, tree.resources());
        let bytes = serializer.output();
        let mut reader = WireReader::new(bytes);
        assert_eq!(reader.read_int().unwrap(), 20);
        assert_eq!(reader.read_int().unwrap(), font.raw());
        assert_eq!(reader.read_int().unwrap(), 15);
        assert_eq!(reader.read_int().unwrap(), 5);
        assert_eq!(reader.read_int().unwrap(), 10);
        assert!(reader.read_boolean().unwrap());
        assert!(!reader.read_boolean().unwrap());
    }

    #[test]
    fn test_device_fonts_not_registered() {
        let font = Font {
            id: ObjectId::from_raw(5),
            name: "Arial".into(),
            style: FontStyle::Regular,
            ascent: 0.8,
            descent: 0.2,
            leading: 0.0,
            source: FontSource::Device,
        };
        let mut serializer = Serializer::new();
        serializer.write_font(&font);
        assert!(serializer.output().is_empty());

        let embedded = Font {
            source: FontSource::Embedded {
                bold: false,
                italic: true,
                data: vec![0xca, 0xfe],
            },
            ..font
        };
        serializer.write_font(&embedded);
        assert_eq!(serializer.output(), &[0, 0, 0, 200, 0, 0, 0, 5, 0, 1, 0, 0, 0, 0]);
        assert_eq!(
            serializer.assets().get(0),
            Some(&Asset::Font { data: vec![0xca, 0xfe] })
        );
    }

    // ========================================================================
    // Frame updates
    // ========================================================================

    #[test]
    fn test_objects_phase_keeps_dirty_bits() {
        let mut tree = DisplayTree::new(550, 400);
        let root = tree.root();
        let shape = square_shape(&mut tree);
        tree.add_child(root, shape).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, root, RemotingPhase::Objects)
            .unwrap();
        let words = ints(&serializer.output()[..12]);
        assert_eq!(words[0], 100);
        assert_eq!(words[1], root.raw());
        let bits = MessageBits::from_bits_truncate(words[2]);
        assert!(bits.contains(MessageBits::HAS_MATRIX | MessageBits::HAS_COLOR_TRANSFORM));
        assert!(!bits.intersects(MessageBits::HAS_CHILDREN | MessageBits::HAS_MASK));
        assert!(tree.node(root).unwrap().has_any_flags(NodeFlags::DIRTY));
    }

    #[test]
    fn test_references_phase_writes_children_and_clears() {
        let mut tree = DisplayTree::new(550, 400);
        let root = tree.root();
        let a = square_shape(&mut tree);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, None).unwrap();
        for id in [root, a] {
            tree.clear_dirty(id).unwrap();
        }
        tree.add_child(root, None).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, root, RemotingPhase::References)
            .unwrap();
        let words = ints(serializer.output());
        assert_eq!(words, vec![100, root.raw(), MessageBits::HAS_CHILDREN.bits(), 1, a.raw()]);
        assert!(!tree.node(root).unwrap().has_any_flags(NodeFlags::DIRTY));
    }

    #[test]
    fn test_shape_references_its_graphics_as_asset() {
        let mut tree = DisplayTree::new(550, 400);
        let shape = square_shape(&mut tree);
        let graphics_id = tree.node(shape).unwrap().graphics().unwrap().id();
        tree.clear_graphics_dirty(shape).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, shape, RemotingPhase::References)
            .unwrap();
        let words = ints(serializer.output());
        let children = &words[words.len() - 2..];
        assert_eq!(children, &[1, Reference::Asset(graphics_id).to_wire()]);
    }

    #[test]
    fn test_misc_block_for_bitmap() {
        let mut tree = DisplayTree::new(550, 400);
        let root = tree.root();
        let data = tree.create_bitmap_data(2, 2, ImageType::Png, vec![1, 2, 3]);
        let bitmap = tree.create_bitmap(Some(data)).unwrap();
        tree.add_child(root, bitmap).unwrap();
        tree.set_bitmap_rendering(bitmap, PixelSnapping::Always, true)
            .unwrap();
        tree.set_clip(bitmap, 3).unwrap();
        tree.clear_dirty(bitmap).unwrap();
        tree.set_visible(bitmap, false).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, bitmap, RemotingPhase::Objects)
            .unwrap();
        let bytes = serializer.output().to_vec();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_int().unwrap(), 100);
        assert_eq!(reader.read_int().unwrap(), bitmap.raw());
        assert_eq!(
            reader.read_int().unwrap(),
            MessageBits::HAS_MISCELLANEOUS_PROPERTIES.bits()
        );
        assert_eq!(reader.read_int().unwrap(), 3);
        assert_eq!(reader.read_int().unwrap(), BlendMode::Normal.to_number());
        assert!(!reader.read_boolean().unwrap());
        assert_eq!(reader.read_int().unwrap(), PixelSnapping::Always.to_number());
        assert_eq!(reader.read_int().unwrap(), 1);
        // The bitmap data follows as its own message.
        assert_eq!(reader.read_int().unwrap(), 102);
    }

    #[test]
    fn test_bitmap_without_data_writes_empty_child_list() {
        let mut tree = DisplayTree::new(550, 400);
        let bitmap = tree.create_bitmap(None).unwrap();
        tree.clear_dirty(bitmap).unwrap();
        tree.set_bitmap_data(bitmap, None).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, bitmap, RemotingPhase::References)
            .unwrap();
        assert_eq!(
            ints(serializer.output()),
            vec![100, bitmap.raw(), MessageBits::HAS_CHILDREN.bits(), 0]
        );
    }

    #[test]
    fn test_mask_reference() {
        let mut tree = DisplayTree::new(550, 400);
        let a = tree.create_sprite();
        let mask = tree.create_shape();
        tree.clear_dirty(a).unwrap();
        tree.set_mask(a, Some(mask)).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, a, RemotingPhase::References)
            .unwrap();
        assert_eq!(
            ints(serializer.output()),
            vec![100, a.raw(), MessageBits::HAS_MASK.bits(), mask.raw()]
        );

        tree.set_mask(a, None).unwrap();
        let mut serializer = Serializer::new();
        serializer
            .write_update_frame(&mut tree, a, RemotingPhase::References)
            .unwrap();
        assert_eq!(ints(serializer.output())[3], -1);
    }

    #[test]
    fn test_display_object_visits_dirty_nodes() {
        let mut tree = DisplayTree::new(550, 400);
        let root = tree.root();
        let a = square_shape(&mut tree);
        let b = tree.create_sprite();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        let mut serializer = Serializer::new();
        serializer
            .write_display_object(&mut tree, root, RemotingPhase::References)
            .unwrap();
        assert!(tree.dirty_nodes(root).unwrap().is_empty());
        assert_eq!(serializer.assets().len(), 1);

        let batch = serializer.take_batch();
        assert!(!batch.bytes.is_empty());
        assert!(serializer.output().is_empty());

        serializer
            .write_display_object(&mut tree, root, RemotingPhase::References)
            .unwrap();
        assert!(serializer.output().is_empty());
    }

    #[test]
    fn test_cache_as_bitmap_masks_bitmap_sources() {
        let mut serializer = Serializer::new();
        let mut request = CacheAsBitmapRequest::new(
            ObjectId::from_raw(7),
            CacheSource::BitmapData(ObjectId::from_raw(3)),
        );
        request.clip_rect = Some(Bounds::new(0, 0, 20, 20));
        request.smoothing = true;
        serializer.write_cache_as_bitmap(&request);
        let bytes = serializer.output();
        assert_eq!(
            ints(&bytes[..bytes.len() - 1]),
            vec![
                201,
                7,
                0x0800_0003,
                MessageBits::HAS_CLIP_RECT.bits(),
                0,
                0,
                20,
                20,
                BlendMode::Normal.to_number(),
            ]
        );
        assert_eq!(bytes[bytes.len() - 1], 1);
    }

    #[test]
    fn test_text_runs_follow_plain_text() {
        let mut tree = DisplayTree::new(550, 400);
        let text = tree.create_text();
        tree.update_text(text, |content| {
            content.set_runs(
                "abcd",
                vec![
                    TextRun {
                        begin_index: 0,
                        end_index: 2,
                        format: TextFormat::default(),
                    },
                    TextRun {
                        begin_index: 2,
                        end_index: 4,
                        format: TextFormat::default(),
                    },
                ],
            );
        })
        .unwrap();
        let mut serializer = Serializer::new();
        serializer
            .write_text_content(&mut tree, text, Bounds::EMPTY)
            .unwrap();
        assert!(!tree.node(text).unwrap().text_content().unwrap().is_dirty());
        serializer
            .write_text_content(&mut tree, text, Bounds::EMPTY)
            .unwrap();
        assert_eq!(serializer.assets().len(), 1);
    }
}
