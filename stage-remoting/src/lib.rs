//! # Stage Remoting
//!
//! Dirty-state synchronization between a player that owns the display tree
//! and a renderer that draws it.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────────┐  Serializer   ┌─────────────────────┐  MessageDecoder  ┌──────────┐
//! │ DisplayTree  │ ────────────▶ │ FrameBatch          │ ───────────────▶ │ Renderer │
//! │ (dirty bits) │               │  bytes │ AssetTable │                  │          │
//! └──────────────┘               └─────────────────────┘                  └──────────┘
//!        ▲                                                                     │
//!        │            read_event           ┌────────────┐  EventSerializer     │
//!        └──────────────────────────────── │ event bytes│ ◀────────────────────┘
//!                                          └────────────┘
//! ```
//!
//! Batches cross between the two ends over a bounded [`channel`]. Every
//! message starts with a [`MessageTag`]; optional sections are announced by
//! [`MessageBits`]; bulk payloads travel in the [`AssetTable`] and are
//! referred to by index.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod channel;
pub mod codec;
pub mod decoder;
pub mod deserializer;
pub mod error;
pub mod serializer;
pub mod wire;

pub use asset::{Asset, AssetTable};
pub use channel::{channel, BatchReceiver, BatchSender};
pub use codec::{WireReader, WireWriter};
pub use decoder::{
    FrameUpdate, Message, MessageDecoder, MiscellaneousProperties, TextUpdate, WireTextFormat,
    WireTextRun,
};
pub use deserializer::{read_event, read_events, EventSerializer};
pub use error::{RemotingError, RemotingResult};
pub use serializer::{CacheAsBitmapRequest, CacheSource, FrameBatch, Serializer};
pub use wire::{
    ColorTransformEncoding, KeyboardEventFlags, MessageBits, MessageTag, Reference,
    RemotingPhase, ASSET_ID_MASK,
};

/// Configuration for the remoting layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemotingConfig {
    /// Batches that may wait in a channel before senders block.
    pub channel_capacity: usize,
    /// Bytes reserved up front for a serializer's output.
    pub initial_buffer_capacity: usize,
}

impl Default for RemotingConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            initial_buffer_capacity: 4096,
        }
    }
}

/// Stage remoting version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
