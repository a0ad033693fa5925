//! Display nodes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::graphics::Graphics;
use crate::resource::TextContent;
use crate::style::{BlendMode, PixelSnapping};
use crate::transform::{ColorTransform, Matrix};
use crate::ObjectId;

bitflags! {
    /// Per-node state and dirty bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NodeFlags: u32 {
        /// The node is rendered.
        const VISIBLE = 1 << 0;
        /// Cached aggregate bounds must be recomputed.
        const INVALID_BOUNDS = 1 << 1;
        /// Matrix changed.
        const DIRTY_MATRIX = 1 << 2;
        /// Color transform changed.
        const DIRTY_COLOR_TRANSFORM = 1 << 3;
        /// Mask changed.
        const DIRTY_MASK = 1 << 4;
        /// Clip, blend mode, visibility or bitmap rendering options changed.
        const DIRTY_MISCELLANEOUS_PROPERTIES = 1 << 5;
        /// Child list changed.
        const DIRTY_CHILDREN = 1 << 6;
        /// Attached drawable changed.
        const DIRTY_GRAPHICS = 1 << 7;
        /// Referenced bitmap data changed.
        const DIRTY_BITMAP_DATA = 1 << 8;
        /// Attached text content changed.
        const DIRTY_TEXT_CONTENT = 1 << 9;
        /// Any dirty bit.
        const DIRTY = Self::DIRTY_MATRIX.bits()
            | Self::DIRTY_COLOR_TRANSFORM.bits()
            | Self::DIRTY_MASK.bits()
            | Self::DIRTY_MISCELLANEOUS_PROPERTIES.bits()
            | Self::DIRTY_CHILDREN.bits()
            | Self::DIRTY_GRAPHICS.bits()
            | Self::DIRTY_BITMAP_DATA.bits()
            | Self::DIRTY_TEXT_CONTENT.bits();
    }
}

bitflags! {
    /// Writes a node permits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u32 {
        /// Matrix writes.
        const ALLOW_MATRIX_WRITE = 1 << 0;
        /// Color transform writes.
        const ALLOW_COLOR_TRANSFORM_WRITE = 1 << 1;
        /// Blend mode writes.
        const ALLOW_BLEND_MODE_WRITE = 1 << 2;
        /// Mask writes.
        const ALLOW_MASK_WRITE = 1 << 3;
        /// Clip span writes.
        const ALLOW_CLIP_WRITE = 1 << 4;
        /// Child list writes.
        const ALLOW_CHILDREN_WRITE = 1 << 5;
        /// Visibility writes.
        const ALLOW_VISIBLE_WRITE = 1 << 6;
        /// Every write.
        const ALL = Self::ALLOW_MATRIX_WRITE.bits()
            | Self::ALLOW_COLOR_TRANSFORM_WRITE.bits()
            | Self::ALLOW_BLEND_MODE_WRITE.bits()
            | Self::ALLOW_MASK_WRITE.bits()
            | Self::ALLOW_CLIP_WRITE.bits()
            | Self::ALLOW_CHILDREN_WRITE.bits()
            | Self::ALLOW_VISIBLE_WRITE.bits();
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// What a node displays.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A container with an optional drawable under its children.
    Sprite {
        /// Drawable, created on first drawing call.
        graphics: Option<Graphics>,
    },
    /// A drawable without children.
    Shape {
        /// Drawable.
        graphics: Graphics,
    },
    /// A view of bitmap data.
    Bitmap {
        /// Displayed bitmap data.
        bitmap_data: Option<ObjectId>,
        /// Pixel snapping.
        pixel_snapping: PixelSnapping,
        /// Smooth when scaled.
        smoothing: bool,
    },
    /// A text field.
    Text {
        /// Laid-out text.
        content: TextContent,
    },
}

impl NodeKind {
    /// Short name for errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sprite { .. } => "sprite",
            Self::Shape { .. } => "shape",
            Self::Bitmap { .. } => "bitmap",
            Self::Text { .. } => "text",
        }
    }
}

/// A node in the display tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    pub(crate) id: ObjectId,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<Option<ObjectId>>,
    pub(crate) matrix: Matrix,
    pub(crate) color_transform: ColorTransform,
    pub(crate) mask: Option<ObjectId>,
    pub(crate) clip: usize,
    pub(crate) blend_mode: BlendMode,
    pub(crate) flags: NodeFlags,
    pub(crate) capabilities: Capabilities,
    pub(crate) bounds: Bounds,
}

impl DisplayNode {
    /// A visible, fully dirty node with identity transforms.
    pub(crate) fn new(id: ObjectId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            matrix: Matrix::IDENTITY,
            color_transform: ColorTransform::IDENTITY,
            mask: None,
            clip: 0,
            blend_mode: BlendMode::Normal,
            flags: NodeFlags::VISIBLE | NodeFlags::DIRTY | NodeFlags::INVALID_BOUNDS,
            capabilities: Capabilities::ALL,
            bounds: Bounds::EMPTY,
        }
    }

    /// Identity.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// What the node displays.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Containing node.
    #[must_use]
    pub const fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Ordered children; `None` entries are placeholders.
    #[must_use]
    pub fn children(&self) -> &[Option<ObjectId>] {
        &self.children
    }

    /// Local transform.
    #[must_use]
    pub const fn matrix(&self) -> Matrix {
        self.matrix
    }

    /// Color transform.
    #[must_use]
    pub const fn color_transform(&self) -> ColorTransform {
        self.color_transform
    }

    /// Masking node.
    #[must_use]
    pub const fn mask(&self) -> Option<ObjectId> {
        self.mask
    }

    /// Number of following siblings this node clips.
    #[must_use]
    pub const fn clip(&self) -> usize {
        self.clip
    }

    /// Blend mode.
    #[must_use]
    pub const fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// State and dirty bits.
    #[must_use]
    pub const fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether all of `flags` are set.
    #[must_use]
    pub const fn has_flags(&self, flags: NodeFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Whether any of `flags` is set.
    #[must_use]
    pub const fn has_any_flags(&self, flags: NodeFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Whether the node is rendered.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Permitted writes.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether the node can hold children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Sprite { .. })
    }

    /// Attached drawable, if any.
    #[must_use]
    pub const fn graphics(&self) -> Option<&Graphics> {
        match &self.kind {
            NodeKind::Sprite { graphics } => graphics.as_ref(),
            NodeKind::Shape { graphics } => Some(graphics),
            _ => None,
        }
    }

    /// Attached text content, if any.
    #[must_use]
    pub const fn text_content(&self) -> Option<&TextContent> {
        match &self.kind {
            NodeKind::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Displayed bitmap data, for bitmap nodes.
    #[must_use]
    pub const fn bitmap_data(&self) -> Option<ObjectId> {
        match self.kind {
            NodeKind::Bitmap { bitmap_data, .. } => bitmap_data,
            _ => None,
        }
    }

    pub(crate) fn graphics_mut(&mut self) -> Option<&mut Graphics> {
        match &mut self.kind {
            NodeKind::Sprite { graphics } => graphics.as_mut(),
            NodeKind::Shape { graphics } => Some(graphics),
            _ => None,
        }
    }

    pub(crate) fn text_content_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.kind {
            NodeKind::Text { content } => Some(content),
            _ => None,
        }
    }
}
