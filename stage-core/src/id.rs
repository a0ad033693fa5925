//! Object identities shared by the stage and the remoting protocol.

use serde::{Deserialize, Serialize};

/// Largest identity the allocator will hand out.
///
/// Identities share a wire field with asset-table indices, which set bit 27,
/// so every identity must stay below it.
pub const MAX_OBJECT_ID: i32 = 0x07FF_FFFF;

/// Identity of a node, drawable or resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(i32);

impl ObjectId {
    /// Create an identity from its raw wire value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic identity allocator.
///
/// Passed explicitly to constructors so object creation is deterministic.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: i32,
}

impl IdAllocator {
    /// Create an allocator whose first identity is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create an allocator whose first identity is `first`.
    #[must_use]
    pub const fn starting_at(first: i32) -> Self {
        Self { next: first }
    }

    /// Allocate the next identity.
    ///
    /// # Panics
    ///
    /// Panics if the identity space below the asset bit is exhausted.
    pub fn next_id(&mut self) -> ObjectId {
        assert!(self.next <= MAX_OBJECT_ID, "object identity space exhausted");
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }

    /// Identity the next call to [`IdAllocator::next_id`] will return.
    #[must_use]
    pub const fn peek(&self) -> ObjectId {
        ObjectId(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(ids.peek().raw(), 3);
    }

    #[test]
    #[should_panic(expected = "identity space exhausted")]
    fn test_allocator_refuses_asset_bit() {
        let mut ids = IdAllocator::starting_at(MAX_OBJECT_ID);
        let _ = ids.next_id();
        let _ = ids.next_id();
    }
}
