//! Wire constants shared by both ends of the channel.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use stage_core::ObjectId;

/// Bit marking an integer reference as an asset-table entry rather than an
/// object identity.
pub const ASSET_ID_MASK: i32 = 0x0800_0000;

/// Message tag, the first integer of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum MessageTag {
    /// Node properties and child references.
    UpdateFrame = 100,
    /// Drawable path data.
    UpdateGraphics = 101,
    /// Pixel data.
    UpdateBitmapData = 102,
    /// Text and its runs.
    UpdateTextContent = 103,
    /// Stage size.
    UpdateStage = 104,
    /// Embedded font glyphs.
    RegisterFont = 200,
    /// Render a node or bitmap into bitmap data.
    CacheAsBitmap = 201,
    /// Pointer event.
    MouseEvent = 300,
    /// Key event.
    KeyboardEvent = 301,
    /// Focus event.
    FocusEvent = 302,
}

impl MessageTag {
    /// Parse a wire code.
    #[must_use]
    pub const fn from_number(value: i32) -> Option<Self> {
        match value {
            100 => Some(Self::UpdateFrame),
            101 => Some(Self::UpdateGraphics),
            102 => Some(Self::UpdateBitmapData),
            103 => Some(Self::UpdateTextContent),
            104 => Some(Self::UpdateStage),
            200 => Some(Self::RegisterFont),
            201 => Some(Self::CacheAsBitmap),
            300 => Some(Self::MouseEvent),
            301 => Some(Self::KeyboardEvent),
            302 => Some(Self::FocusEvent),
            _ => None,
        }
    }

    /// The wire code.
    #[must_use]
    pub const fn to_number(self) -> i32 {
        self as i32
    }
}

bitflags! {
    /// Optional payload sections present in a message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MessageBits: i32 {
        /// Six-float matrix follows.
        const HAS_MATRIX = 0x0001;
        /// Bounds rectangle follows.
        const HAS_BOUNDS = 0x0002;
        /// Child reference list follows.
        const HAS_CHILDREN = 0x0004;
        /// Encoded color transform follows.
        const HAS_COLOR_TRANSFORM = 0x0008;
        /// Clip rectangle follows.
        const HAS_CLIP_RECT = 0x0010;
        /// Clip, blend mode, visibility and bitmap rendering follow.
        const HAS_MISCELLANEOUS_PROPERTIES = 0x0020;
        /// Mask reference follows.
        const HAS_MASK = 0x0040;
        /// Clip depth follows.
        const HAS_CLIP = 0x0080;
    }
}

bitflags! {
    /// Modifier keys packed into pointer and key events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct KeyboardEventFlags: i32 {
        /// Control key.
        const CTRL_KEY = 0x0001;
        /// Alt key.
        const ALT_KEY = 0x0002;
        /// Shift key.
        const SHIFT_KEY = 0x0004;
    }
}

/// Representation chosen for a color transform on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ColorTransformEncoding {
    /// No payload.
    Identity = 0,
    /// One float: the alpha multiplier.
    AlphaMultiplierOnly = 1,
    /// Four multiplier floats, then four offset integers.
    All = 2,
}

impl ColorTransformEncoding {
    /// Parse a wire code.
    #[must_use]
    pub const fn from_number(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Identity),
            1 => Some(Self::AlphaMultiplierOnly),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

/// Serialization pass.
///
/// An `Objects` pass describes every dirty object in full and leaves dirty
/// bits alone. A `References` pass additionally writes child and mask
/// references and retires the node dirty bits it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemotingPhase {
    /// Full object descriptions.
    Objects,
    /// References, then dirty bits cleared.
    References,
}

/// A reference as written in child lists and cache requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// A display node.
    Object(ObjectId),
    /// A remoted payload: drawable, text content or bitmap data.
    Asset(ObjectId),
}

impl Reference {
    /// Split a wire integer on the asset bit.
    #[must_use]
    pub const fn from_wire(value: i32) -> Self {
        if value & ASSET_ID_MASK != 0 {
            Self::Asset(ObjectId::from_raw(value & !ASSET_ID_MASK))
        } else {
            Self::Object(ObjectId::from_raw(value))
        }
    }

    /// The wire integer.
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::Object(id) => id.raw(),
            Self::Asset(id) => ASSET_ID_MASK | id.raw(),
        }
    }
}
