//! The top-level design: a collection of modules.

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::Module;
use serde::{Deserialize, Serialize};

/// A hierarchical design holding one or more modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    /// All modules of the design.
    pub modules: Arena<ModuleId, Module>,
    /// Monotonic counter for generated names. Never reset, so generated
    /// names stay unique across passes over the same design.
    pub autoidx: u64,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty module with the given name.
    pub fn add_module(&mut self, name: &str) -> ModuleId {
        let id = self.modules.next_id();
        self.modules.alloc(Module::new(id, name));
        id
    }

    /// Looks up a module by name.
    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Returns the next value of the generated-name counter and advances it.
    pub fn bump_autoidx(&mut self) -> u64 {
        let idx = self.autoidx;
        self.autoidx += 1;
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_lookup() {
        let mut design = Design::new();
        let top = design.add_module("top");
        design.add_module("sub");
        assert_eq!(design.module_by_name("top"), Some(top));
        assert_eq!(design.module_by_name("missing"), None);
    }

    #[test]
    fn autoidx_is_monotonic() {
        let mut design = Design::new();
        assert_eq!(design.bump_autoidx(), 0);
        assert_eq!(design.bump_autoidx(), 1);
        assert_eq!(design.autoidx, 2);
    }

    #[test]
    fn serde_roundtrip_preserves_autoidx() {
        let mut design = Design::new();
        design.add_module("top");
        design.bump_autoidx();
        let json = serde_json::to_string(&design).unwrap();
        let restored: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.autoidx, 1);
        assert_eq!(restored.modules.len(), 1);
    }
}
