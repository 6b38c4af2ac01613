//! Opaque ID newtypes for netlist entities.
//!
//! Each ID is a thin `u32` wrapper created by [`Arena::alloc`](crate::arena::Arena::alloc)
//! and used for O(1) lookup. IDs are `Ord` so that sets and maps keyed by them
//! iterate in a deterministic order.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a module in the design.
    ModuleId
);

define_id!(
    /// Opaque, copyable ID for a wire within a module.
    WireId
);

define_id!(
    /// Opaque, copyable ID for a cell within a module.
    CellId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn id_roundtrip() {
        let id = WireId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_ordering_is_index_ordering() {
        let mut set = BTreeSet::new();
        set.insert(CellId::from_raw(3));
        set.insert(CellId::from_raw(1));
        set.insert(CellId::from_raw(2));
        let raws: Vec<u32> = set.iter().map(|id| id.as_raw()).collect();
        assert_eq!(raws, vec![1, 2, 3]);
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = ModuleId::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let restored: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
