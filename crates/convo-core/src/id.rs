//! Stable node identifiers and the allocator that hands them out.
//!
//! Node ids are unique within one conversation and immutable after creation.
//! The allocator is a plain monotonic counter: deletions never return an id
//! to the pool, so an id observed once can never refer to a different node
//! later in the same session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a conversation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id allocator for one conversation.
///
/// The counter is persisted as conversation-level state and resumed on load,
/// so ids stay unique across save/load cycles. Overflow is not handled; a
/// conversation with four billion nodes has bigger problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// A fresh allocator starting at id 0.
    pub fn new() -> Self {
        IdAllocator { next: 0 }
    }

    /// Resumes an allocator from a persisted counter value.
    pub fn resume(next: u32) -> Self {
        IdAllocator { next }
    }

    /// Returns the next id and advances the counter.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// The value the next call to [`allocate`](Self::allocate) would return.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Raises the counter so `id` can never be handed out again.
    ///
    /// Used when resuming from storage whose counter lags behind the highest
    /// id actually present in the node records.
    pub fn reserve_through(&mut self, id: NodeId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
