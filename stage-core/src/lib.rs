//! # Stage Core
//!
//! Retained-mode state for a vector-graphics stage whose rendering happens
//! elsewhere. Geometry is recorded in twips (1/20 px) and every change leaves
//! a dirty bit behind for the remoting layer to pick up.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 stage-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Display Tree    │  Drawables               │
//! │  - Containers    │  - Path buffer           │
//! │  - Capabilities  │  - Fill / line styles    │
//! │  - Dirty bits    │  - Incremental bounds    │
//! │  - Clip spans    │  - Hit testing           │
//! ├─────────────────────────────────────────────┤
//! │  Resources       │  Geometry                │
//! │  - Bitmap data   │  - Twip bounds           │
//! │  - Text content  │  - Bezier extremes       │
//! │  - Fonts         │  - Ray crossings         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Input events arriving from the renderer are described in [`event`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bounds;
pub mod error;
pub mod event;
pub mod geometry;
pub mod graphics;
pub mod id;
pub mod node;
pub mod resource;
pub mod shape;
pub mod style;
pub mod transform;
pub mod tree;

pub use bounds::{to_twips, Bounds, SENTINEL, TWIPS_PER_PIXEL};
pub use error::{CoreError, CoreResult};
pub use event::{
    EventKind, FocusEvent, FocusEventType, InputEvent, KeyModifiers, KeyboardEvent,
    KeyboardEventType, MouseEvent, MouseEventType,
};
pub use geometry::RootFinderConfig;
pub use graphics::{Graphics, GradientSpec, ShapeSymbol, StrokeSpec};
pub use id::{IdAllocator, ObjectId, MAX_OBJECT_ID};
pub use node::{Capabilities, DisplayNode, NodeFlags, NodeKind};
pub use resource::{
    BitmapData, Font, FontSource, FontStyle, ImageType, Resources, TextContent, TextFormat, TextRun,
};
pub use shape::{PathCommand, PathSegment, ShapeData, StyleRecord};
pub use style::{
    BlendMode, CapsStyle, GradientType, InterpolationMethod, JointStyle, LineScaleMode,
    PixelSnapping, SpreadMethod, TextFormatAlign, WindingRule,
};
pub use transform::{ColorTransform, Matrix};
pub use tree::{DisplayTree, FontMetrics};

/// Stage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
