//! Process-wide entity identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a sketch entity or constraint.
///
/// Ids are unique within the process; `0` is never handed out and can be
/// used as a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The reserved "no entity" id.
    pub const NONE: EntityId = EntityId(0);

    /// Allocate a fresh id.
    pub fn next() -> Self {
        EntityId(next_id())
    }

    /// The raw integer value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Draw the next value from the shared monotonic counter.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_and_nonzero() {
        let a = EntityId::next();
        let b = EntityId::next();
        assert_ne!(a, b);
        assert!(a.get() > 0 && b.get() > 0);
        assert!(b > a);
        assert_eq!(format!("{}", EntityId(7)), "#7");
    }
}
