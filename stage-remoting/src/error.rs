//! Remoting error types.

use stage_core::CoreError;
use thiserror::Error;

/// Result type for remoting operations.
pub type RemotingResult<T> = Result<T, RemotingError>;

/// Errors that can occur while encoding, decoding or transporting messages.
#[derive(Debug, Error)]
pub enum RemotingError {
    /// The stream carried a message tag this side does not read.
    #[error("Unknown message tag: {0}")]
    UnknownTag(i32),

    /// An event carried a subtype its kind does not define.
    #[error("Unknown {kind} event type: {id}")]
    UnknownEventType {
        /// Event category.
        kind: &'static str,
        /// Subtype code on the wire.
        id: i32,
    },

    /// A color transform used an encoding outside the three defined ones.
    #[error("Unknown color transform encoding: {0}")]
    UnknownColorTransformEncoding(i32),

    /// A bitmap data message named an unknown pixel layout.
    #[error("Unknown image type: {0}")]
    UnknownImageType(i32),

    /// A count on the wire was negative.
    #[error("Negative count on the wire: {0}")]
    NegativeCount(i32),

    /// The buffer ended inside a message.
    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// The other end of the batch channel was dropped.
    #[error("Batch channel closed")]
    ChannelClosed,

    /// Display tree access failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Asset table serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
