//! Error types for stage operations.

use thiserror::Error;

use crate::ObjectId;

/// Result type for stage operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in stage operations.
///
/// These are contract violations at the API boundary. Malformed but
/// well-typed input (bad gradient records, unknown style selectors) never
/// produces an error; it degrades to a documented default instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required argument was absent.
    #[error("Required argument is null: {0}")]
    NullArgument(&'static str),

    /// A required selector did not name a known enumeration value.
    #[error("Invalid enumeration value for argument: {0}")]
    InvalidEnum(&'static str),

    /// Node not found in the display tree.
    #[error("Node not found: {0}")]
    NodeNotFound(ObjectId),

    /// Bitmap data, font or other resource not found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(ObjectId),

    /// The node cannot hold children.
    #[error("Node is not a container: {0}")]
    NotAContainer(ObjectId),

    /// The node is of the wrong kind for the operation.
    #[error("Node {node} is not a {expected} node")]
    WrongNodeKind {
        /// The node.
        node: ObjectId,
        /// Kind the operation requires.
        expected: &'static str,
    },

    /// Adding the child would make a node its own ancestor.
    #[error("Cannot add {child} to {parent}: it is an ancestor")]
    CyclicHierarchy {
        /// The would-be parent.
        parent: ObjectId,
        /// The would-be child.
        child: ObjectId,
    },

    /// The node lacks the capability required for the write.
    #[error("Node {node} lacks capability {capability}")]
    MissingCapability {
        /// The node that rejected the write.
        node: ObjectId,
        /// Name of the missing capability.
        capability: &'static str,
    },

    /// A child index was outside the child list.
    #[error("Child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Current child count.
        len: usize,
    },

    /// The path command stream does not consume exactly its coordinate buffer.
    #[error("Malformed path data: commands consume {consumed} coordinates, buffer holds {available}")]
    MalformedPath {
        /// Coordinates the command stream requires.
        consumed: usize,
        /// Coordinates actually present.
        available: usize,
    },

    /// The path command stream does not consume exactly its style records.
    #[error("Malformed path data: commands consume {consumed} style records, buffer holds {available}")]
    MalformedStyles {
        /// Style records the command stream requires.
        consumed: usize,
        /// Style records actually present.
        available: usize,
    },

    /// Payload serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
