//! The display tree: an arena of nodes addressed by identity.
//!
//! ```text
//!            root (sprite)
//!           ┌─────┴──────┬───────────┐
//!        shape        sprite       (none)      children may be placeholders
//!      [graphics]   ┌───┴───┐
//!                 text    bitmap ──▶ bitmap data (resources)
//! ```
//!
//! Nodes refer to their parent and children by [`ObjectId`]; the tree is the
//! sole owner. Every mutation sets the matching dirty bit on the node and
//! invalidates cached bounds up to the root.

use std::collections::{BTreeMap, HashMap};

use crate::bounds::Bounds;
use crate::graphics::Graphics;
use crate::id::IdAllocator;
use crate::node::{Capabilities, DisplayNode, NodeFlags, NodeKind};
use crate::resource::{BitmapData, Font, FontSource, FontStyle, ImageType, Resources, TextContent};
use crate::style::{BlendMode, PixelSnapping};
use crate::transform::{ColorTransform, Matrix};
use crate::{CoreError, CoreResult, ObjectId};

/// Em-relative font metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Ascent per em.
    pub ascent: f64,
    /// Descent per em.
    pub descent: f64,
    /// Leading per em.
    pub leading: f64,
}

/// Arena of display nodes plus the resources they reference.
#[derive(Debug, Clone)]
pub struct DisplayTree {
    ids: IdAllocator,
    nodes: HashMap<ObjectId, DisplayNode>,
    resources: Resources,
    root: ObjectId,
    stage_width: u32,
    stage_height: u32,
}

impl DisplayTree {
    /// Create a tree with an empty root sprite and the given stage size in
    /// pixels.
    #[must_use]
    pub fn new(stage_width: u32, stage_height: u32) -> Self {
        Self::with_allocator(IdAllocator::new(), stage_width, stage_height)
    }

    /// Create a tree that draws identities from `ids`.
    #[must_use]
    pub fn with_allocator(mut ids: IdAllocator, stage_width: u32, stage_height: u32) -> Self {
        let root = ids.next_id();
        let mut nodes = HashMap::new();
        nodes.insert(root, DisplayNode::new(root, NodeKind::Sprite { graphics: None }));
        Self {
            ids,
            nodes,
            resources: Resources::new(),
            root,
            stage_width,
            stage_height,
        }
    }

    /// The root node.
    #[must_use]
    pub const fn root(&self) -> ObjectId {
        self.root
    }

    /// Stage size in pixels.
    #[must_use]
    pub const fn stage_size(&self) -> (u32, u32) {
        (self.stage_width, self.stage_height)
    }

    /// Resize the stage.
    pub fn set_stage_size(&mut self, width: u32, height: u32) {
        self.stage_width = width;
        self.stage_height = height;
    }

    /// Bitmap data and fonts.
    #[must_use]
    pub const fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Bitmap data and fonts, mutably.
    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: ObjectId) -> Option<&DisplayNode> {
        self.nodes.get(&id)
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached sprite.
    pub fn create_sprite(&mut self) -> ObjectId {
        let id = self.ids.next_id();
        self.insert(id, NodeKind::Sprite { graphics: None })
    }

    /// Create a detached shape with an empty drawable.
    pub fn create_shape(&mut self) -> ObjectId {
        let id = self.ids.next_id();
        let mut graphics = Graphics::new(self.ids.next_id());
        graphics.set_owner(id);
        self.insert(id, NodeKind::Shape { graphics })
    }

    /// Create a detached bitmap node.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceNotFound`] if `bitmap_data` is not
    /// registered.
    pub fn create_bitmap(&mut self, bitmap_data: Option<ObjectId>) -> CoreResult<ObjectId> {
        if let Some(data) = bitmap_data {
            self.require_bitmap_data(data)?;
        }
        let id = self.ids.next_id();
        Ok(self.insert(
            id,
            NodeKind::Bitmap {
                bitmap_data,
                pixel_snapping: PixelSnapping::Auto,
                smoothing: false,
            },
        ))
    }

    /// Create a detached text node with empty content.
    pub fn create_text(&mut self) -> ObjectId {
        let id = self.ids.next_id();
        let content = TextContent::new(self.ids.next_id());
        self.insert(id, NodeKind::Text { content })
    }

    /// Register new bitmap data.
    pub fn create_bitmap_data(
        &mut self,
        width: u32,
        height: u32,
        kind: ImageType,
        pixels: Vec<u8>,
    ) -> ObjectId {
        let id = self.ids.next_id();
        self.resources
            .insert_bitmap(BitmapData::new(id, width, height, kind, pixels))
    }

    /// Register a font.
    pub fn register_font(
        &mut self,
        name: impl Into<String>,
        style: FontStyle,
        metrics: FontMetrics,
        source: FontSource,
    ) -> ObjectId {
        let id = self.ids.next_id();
        self.resources.register_font(Font {
            id,
            name: name.into(),
            style,
            ascent: metrics.ascent,
            descent: metrics.descent,
            leading: metrics.leading,
            source,
        });
        id
    }

    fn insert(&mut self, id: ObjectId, kind: NodeKind) -> ObjectId {
        tracing::trace!("Created {} node {id}", kind.name());
        self.nodes.insert(id, DisplayNode::new(id, kind));
        id
    }

    // ------------------------------------------------------------------
    // Child list
    // ------------------------------------------------------------------

    /// Append a child, or a placeholder when `child` is `None`.
    ///
    /// A child that already has a parent is detached from it first.
    ///
    /// # Errors
    ///
    /// Fails if either node is missing, `parent` is not a container or lacks
    /// [`Capabilities::ALLOW_CHILDREN_WRITE`], or `child` is an ancestor of
    /// `parent`.
    pub fn add_child(&mut self, parent: ObjectId, child: impl Into<Option<ObjectId>>) -> CoreResult<()> {
        let len = self.container(parent)?.children.len();
        self.add_child_at(parent, child, len)
    }

    /// Insert a child, or a placeholder, at `index`.
    ///
    /// # Errors
    ///
    /// As [`add_child`](Self::add_child), plus
    /// [`CoreError::IndexOutOfRange`] when `index` exceeds the child count.
    pub fn add_child_at(
        &mut self,
        parent: ObjectId,
        child: impl Into<Option<ObjectId>>,
        index: usize,
    ) -> CoreResult<()> {
        let child = child.into();
        let len = self.writable_container(parent)?.children.len();
        if index > len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }

        let mut index = index;
        if let Some(child) = child {
            let previous = self.node_ref(child)?.parent;
            if self.is_ancestor_or_self(child, parent) {
                return Err(CoreError::CyclicHierarchy { parent, child });
            }
            if let Some(previous) = previous {
                self.detach(previous, child);
                if previous == parent {
                    index = index.min(self.node_ref(parent)?.children.len());
                }
            }
        }

        let node = self.node_mut(parent)?;
        node.children.insert(index, child);
        node.flags.insert(NodeFlags::DIRTY_CHILDREN);
        if let Some(child) = child {
            tracing::trace!("Added {child} to {parent} at {index}");
            self.node_mut(child)?.parent = Some(parent);
            self.invalidate_position(child);
        }
        self.invalidate_bounds(parent);
        Ok(())
    }

    /// Remove `child` if it belongs to `parent`; otherwise do nothing.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is missing, not a container or lacks
    /// [`Capabilities::ALLOW_CHILDREN_WRITE`].
    pub fn remove_child(&mut self, parent: ObjectId, child: ObjectId) -> CoreResult<()> {
        let node = self.writable_container(parent)?;
        let index = node.children.iter().position(|&c| c == Some(child));
        if let Some(index) = index {
            self.remove_child_at(parent, index)?;
        }
        Ok(())
    }

    /// Remove the entry at `index`, returning the removed child.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is missing, not a container or lacks
    /// [`Capabilities::ALLOW_CHILDREN_WRITE`], or `index` is out of range.
    pub fn remove_child_at(&mut self, parent: ObjectId, index: usize) -> CoreResult<Option<ObjectId>> {
        let node = self.writable_container_mut(parent)?;
        let len = node.children.len();
        if index >= len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }
        let removed = node.children.remove(index);
        node.flags.insert(NodeFlags::DIRTY_CHILDREN);
        if let Some(child) = removed {
            tracing::trace!("Removed {child} from {parent} at {index}");
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = None;
            }
            self.invalidate_position(child);
        }
        self.invalidate_bounds(parent);
        Ok(removed)
    }

    /// Remove every child.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is missing, not a container or lacks
    /// [`Capabilities::ALLOW_CHILDREN_WRITE`].
    pub fn clear_children(&mut self, parent: ObjectId) -> CoreResult<()> {
        let node = self.writable_container_mut(parent)?;
        let children = std::mem::take(&mut node.children);
        node.flags.insert(NodeFlags::DIRTY_CHILDREN);
        for child in children.into_iter().flatten() {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = None;
            }
        }
        self.invalidate_bounds(parent);
        Ok(())
    }

    /// Clip-leave events of `parent`'s children.
    ///
    /// Maps each index at which one or more clip spans end to the clipping
    /// children, in child order. At most one clip starts at an index, but
    /// several may end at the same one.
    ///
    /// ```text
    ///  i:  0  1  2  3  4  5  6  7  8  9
    ///  A:  ---[--------------------]---     A at 1 clips 7
    ///  B:  ------[-----------------]---     B at 2 clips 6
    ///  C:  ---------[-----------]------     C at 3 clips 4
    ///
    ///  => { 7: [C], 8: [A, B] }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if `parent` is missing.
    pub fn gather_clip_leave_events(&self, parent: ObjectId) -> CoreResult<BTreeMap<usize, Vec<ObjectId>>> {
        let mut clip_leave: BTreeMap<usize, Vec<ObjectId>> = BTreeMap::new();
        for (index, child) in self.node_ref(parent)?.children.iter().enumerate() {
            let Some(node) = child.and_then(|c| self.nodes.get(&c)) else {
                continue;
            };
            if node.clip > 0 {
                clip_leave.entry(index + node.clip).or_default().push(node.id);
            }
        }
        Ok(clip_leave)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Set the local transform.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or lacks
    /// [`Capabilities::ALLOW_MATRIX_WRITE`].
    pub fn set_matrix(&mut self, id: ObjectId, matrix: Matrix) -> CoreResult<()> {
        let node = self.writable(id, Capabilities::ALLOW_MATRIX_WRITE, "ALLOW_MATRIX_WRITE")?;
        node.matrix = matrix;
        node.flags.insert(NodeFlags::DIRTY_MATRIX);
        self.invalidate_position(id);
        Ok(())
    }

    /// Set the color transform.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or lacks
    /// [`Capabilities::ALLOW_COLOR_TRANSFORM_WRITE`].
    pub fn set_color_transform(&mut self, id: ObjectId, color_transform: ColorTransform) -> CoreResult<()> {
        let node = self.writable(
            id,
            Capabilities::ALLOW_COLOR_TRANSFORM_WRITE,
            "ALLOW_COLOR_TRANSFORM_WRITE",
        )?;
        node.color_transform = color_transform;
        node.flags.insert(NodeFlags::DIRTY_COLOR_TRANSFORM);
        Ok(())
    }

    /// Set or clear the mask.
    ///
    /// # Errors
    ///
    /// Fails if either node is missing or `id` lacks
    /// [`Capabilities::ALLOW_MASK_WRITE`].
    pub fn set_mask(&mut self, id: ObjectId, mask: Option<ObjectId>) -> CoreResult<()> {
        if let Some(mask) = mask {
            self.node_ref(mask)?;
        }
        let node = self.writable(id, Capabilities::ALLOW_MASK_WRITE, "ALLOW_MASK_WRITE")?;
        node.mask = mask;
        node.flags.insert(NodeFlags::DIRTY_MASK);
        Ok(())
    }

    /// Set the number of following siblings the node clips.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or lacks
    /// [`Capabilities::ALLOW_CLIP_WRITE`].
    pub fn set_clip(&mut self, id: ObjectId, clip: usize) -> CoreResult<()> {
        let node = self.writable(id, Capabilities::ALLOW_CLIP_WRITE, "ALLOW_CLIP_WRITE")?;
        node.clip = clip;
        node.flags.insert(NodeFlags::DIRTY_MISCELLANEOUS_PROPERTIES);
        Ok(())
    }

    /// Set the blend mode.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or lacks
    /// [`Capabilities::ALLOW_BLEND_MODE_WRITE`].
    pub fn set_blend_mode(&mut self, id: ObjectId, blend_mode: BlendMode) -> CoreResult<()> {
        let node = self.writable(id, Capabilities::ALLOW_BLEND_MODE_WRITE, "ALLOW_BLEND_MODE_WRITE")?;
        node.blend_mode = blend_mode;
        node.flags.insert(NodeFlags::DIRTY_MISCELLANEOUS_PROPERTIES);
        Ok(())
    }

    /// Show or hide the node.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or lacks
    /// [`Capabilities::ALLOW_VISIBLE_WRITE`].
    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> CoreResult<()> {
        let node = self.writable(id, Capabilities::ALLOW_VISIBLE_WRITE, "ALLOW_VISIBLE_WRITE")?;
        node.flags.set(NodeFlags::VISIBLE, visible);
        node.flags.insert(NodeFlags::DIRTY_MISCELLANEOUS_PROPERTIES);
        Ok(())
    }

    /// Replace the node's permitted writes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if the node is missing.
    pub fn set_capabilities(&mut self, id: ObjectId, capabilities: Capabilities) -> CoreResult<()> {
        self.node_mut(id)?.capabilities = capabilities;
        Ok(())
    }

    /// Point a bitmap node at different bitmap data.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or not a bitmap, or the data is not
    /// registered.
    pub fn set_bitmap_data(&mut self, id: ObjectId, data: Option<ObjectId>) -> CoreResult<()> {
        if let Some(data) = data {
            self.require_bitmap_data(data)?;
        }
        let node = self.node_mut(id)?;
        let NodeKind::Bitmap { bitmap_data, .. } = &mut node.kind else {
            return Err(CoreError::WrongNodeKind {
                node: id,
                expected: "bitmap",
            });
        };
        *bitmap_data = data;
        node.flags.insert(NodeFlags::DIRTY_BITMAP_DATA);
        self.invalidate_bounds(id);
        Ok(())
    }

    /// Set how a bitmap node is rendered.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or not a bitmap.
    pub fn set_bitmap_rendering(
        &mut self,
        id: ObjectId,
        snapping: PixelSnapping,
        smooth: bool,
    ) -> CoreResult<()> {
        let node = self.node_mut(id)?;
        let NodeKind::Bitmap {
            pixel_snapping,
            smoothing,
            ..
        } = &mut node.kind
        else {
            return Err(CoreError::WrongNodeKind {
                node: id,
                expected: "bitmap",
            });
        };
        *pixel_snapping = snapping;
        *smoothing = smooth;
        node.flags.insert(NodeFlags::DIRTY_MISCELLANEOUS_PROPERTIES);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Drawables and text
    // ------------------------------------------------------------------

    /// Run `f` against the node's drawable, creating it for a sprite that has
    /// none yet, then mark the node's graphics dirty and its bounds invalid.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or is neither a sprite nor a shape.
    pub fn update_graphics<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut Graphics, &Resources) -> R,
    ) -> CoreResult<R> {
        let Self {
            ids,
            nodes,
            resources,
            ..
        } = &mut *self;
        let node = nodes.get_mut(&id).ok_or(CoreError::NodeNotFound(id))?;
        let graphics = match &mut node.kind {
            NodeKind::Shape { graphics } => graphics,
            NodeKind::Sprite { graphics } => graphics.get_or_insert_with(|| {
                let mut graphics = Graphics::new(ids.next_id());
                graphics.set_owner(id);
                graphics
            }),
            _ => {
                return Err(CoreError::WrongNodeKind {
                    node: id,
                    expected: "sprite or shape",
                })
            }
        };
        let result = f(graphics, &*resources);
        node.flags.insert(NodeFlags::DIRTY_GRAPHICS);
        self.invalidate_bounds(id);
        Ok(result)
    }

    /// Replace `target`'s drawing with a copy of `source`'s.
    ///
    /// # Errors
    ///
    /// Fails if either node is missing or has no drawable.
    pub fn copy_graphics(&mut self, source: ObjectId, target: ObjectId) -> CoreResult<()> {
        let source_graphics = self
            .node_ref(source)?
            .graphics()
            .cloned()
            .ok_or(CoreError::WrongNodeKind {
                node: source,
                expected: "drawable",
            })?;
        self.update_graphics(target, |graphics, _| graphics.copy_from(&source_graphics))
    }

    /// Run `f` against a text node's content, then mark it dirty.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or not a text node.
    pub fn update_text<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut TextContent) -> R) -> CoreResult<R> {
        let node = self.node_mut(id)?;
        let content = node.text_content_mut().ok_or(CoreError::WrongNodeKind {
            node: id,
            expected: "text",
        })?;
        let result = f(content);
        content.mark_dirty();
        node.flags.insert(NodeFlags::DIRTY_TEXT_CONTENT);
        self.invalidate_bounds(id);
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Bounds
    // ------------------------------------------------------------------

    /// Bounds of the node's own content, in its local space.
    #[must_use]
    pub fn content_bounds(&self, node: &DisplayNode) -> Bounds {
        match &node.kind {
            NodeKind::Sprite { graphics } => graphics
                .as_ref()
                .map_or(Bounds::EMPTY, Graphics::line_bounds),
            NodeKind::Shape { graphics } => graphics.line_bounds(),
            NodeKind::Bitmap { bitmap_data, .. } => bitmap_data
                .and_then(|data| self.resources.bitmap(data))
                .map_or(Bounds::EMPTY, BitmapData::bounds),
            NodeKind::Text { content } => content.bounds,
        }
    }

    /// Aggregate bounds of a node and its descendants in its local space.
    ///
    /// Returns the cached value unless a change since the last query
    /// invalidated it; otherwise unions each child's bounds through that
    /// child's matrix and caches the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if the node is missing.
    pub fn get_bounds(&mut self, id: ObjectId) -> CoreResult<Bounds> {
        let node = self.node_ref(id)?;
        if !node.has_flags(NodeFlags::INVALID_BOUNDS) {
            return Ok(node.bounds);
        }
        let mut bounds = self.content_bounds(node);
        let children: Vec<ObjectId> = node.children.iter().flatten().copied().collect();
        for child in children {
            let child_bounds = self.get_bounds(child)?;
            let matrix = self.node_ref(child)?.matrix;
            bounds = bounds.union(&child_bounds.transform_aabb(&matrix));
        }
        let node = self.node_mut(id)?;
        node.bounds = bounds;
        node.flags.remove(NodeFlags::INVALID_BOUNDS);
        Ok(bounds)
    }

    /// Mark the node's cached bounds, and every ancestor's, invalid.
    pub fn invalidate_bounds(&mut self, id: ObjectId) {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get_mut(&id)) {
            node.flags.insert(NodeFlags::INVALID_BOUNDS);
            current = node.parent;
        }
    }

    /// A node moved within its parent; the parent chain's bounds are stale.
    fn invalidate_position(&mut self, id: ObjectId) {
        if let Some(parent) = self.nodes.get(&id).and_then(DisplayNode::parent) {
            self.invalidate_bounds(parent);
        }
    }

    // ------------------------------------------------------------------
    // Dirty state
    // ------------------------------------------------------------------

    /// Dirty nodes under `root`, parents before children and children in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if `root` is missing.
    pub fn dirty_nodes(&self, root: ObjectId) -> CoreResult<Vec<ObjectId>> {
        self.node_ref(root)?;
        let mut dirty = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.has_any_flags(NodeFlags::DIRTY) {
                dirty.push(id);
            }
            stack.extend(node.children.iter().rev().flatten().copied());
        }
        Ok(dirty)
    }

    /// Clear every dirty bit on the node.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if the node is missing.
    pub fn clear_dirty(&mut self, id: ObjectId) -> CoreResult<()> {
        self.node_mut(id)?.flags.remove(NodeFlags::DIRTY);
        Ok(())
    }

    /// Mark the node's drawable as sent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if the node is missing.
    pub fn clear_graphics_dirty(&mut self, id: ObjectId) -> CoreResult<()> {
        if let Some(graphics) = self.node_mut(id)?.graphics_mut() {
            graphics.clear_dirty();
        }
        Ok(())
    }

    /// Mark the node's text content as sent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if the node is missing.
    pub fn clear_text_dirty(&mut self, id: ObjectId) -> CoreResult<()> {
        if let Some(content) = self.node_mut(id)?.text_content_mut() {
            content.clear_dirty();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn node_ref(&self, id: ObjectId) -> CoreResult<&DisplayNode> {
        self.nodes.get(&id).ok_or(CoreError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: ObjectId) -> CoreResult<&mut DisplayNode> {
        self.nodes.get_mut(&id).ok_or(CoreError::NodeNotFound(id))
    }

    fn container(&self, id: ObjectId) -> CoreResult<&DisplayNode> {
        let node = self.node_ref(id)?;
        if !node.is_container() {
            return Err(CoreError::NotAContainer(id));
        }
        Ok(node)
    }

    fn writable_container(&self, id: ObjectId) -> CoreResult<&DisplayNode> {
        let node = self.container(id)?;
        if !node.capabilities.contains(Capabilities::ALLOW_CHILDREN_WRITE) {
            return Err(CoreError::MissingCapability {
                node: id,
                capability: "ALLOW_CHILDREN_WRITE",
            });
        }
        Ok(node)
    }

    fn writable_container_mut(&mut self, id: ObjectId) -> CoreResult<&mut DisplayNode> {
        self.writable_container(id)?;
        self.node_mut(id)
    }

    fn writable(
        &mut self,
        id: ObjectId,
        capability: Capabilities,
        name: &'static str,
    ) -> CoreResult<&mut DisplayNode> {
        let node = self.node_mut(id)?;
        if !node.capabilities.contains(capability) {
            return Err(CoreError::MissingCapability {
                node: id,
                capability: name,
            });
        }
        Ok(node)
    }

    fn require_bitmap_data(&self, id: ObjectId) -> CoreResult<()> {
        self.resources
            .bitmap(id)
            .map(|_| ())
            .ok_or(CoreError::ResourceNotFound(id))
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(DisplayNode::parent);
        }
        false
    }

    fn detach(&mut self, parent: ObjectId, child: ObjectId) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != Some(child));
            node.flags.insert(NodeFlags::DIRTY_CHILDREN);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        self.invalidate_bounds(parent);
    }
}
