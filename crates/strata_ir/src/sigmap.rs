//! Canonical-bit resolution across direct connections.
//!
//! Direct assignments make several [`SigBit`]s name the same net. A
//! [`SigMap`] built from a module's connection list resolves any bit to one
//! canonical representative, so hash-map keys agree for aliased bits.

use crate::module::Module;
use crate::sig::{SigBit, SigSpec};
use std::collections::HashMap;

/// Maps signal bits to canonical representatives.
///
/// Built once from a module; later structural edits to the module are not
/// reflected.
#[derive(Debug, Default)]
pub struct SigMap {
    forward: HashMap<SigBit, SigBit>,
}

impl SigMap {
    /// Creates an empty map where every bit is its own representative.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from a module's direct connections.
    ///
    /// For every assignment `lhs <- rhs`, each lhs bit is unified with the
    /// corresponding rhs bit. Constants always win as representatives, so a
    /// bit tied to a constant resolves to that constant.
    pub fn from_module(module: &Module) -> Self {
        let mut map = Self::new();
        for (lhs, rhs) in &module.connections {
            for (l, r) in lhs.iter().zip(rhs.iter()) {
                map.unify(l, r);
            }
        }
        map
    }

    fn root(&self, mut bit: SigBit) -> SigBit {
        while let Some(&next) = self.forward.get(&bit) {
            if next == bit {
                break;
            }
            bit = next;
        }
        bit
    }

    fn unify(&mut self, a: SigBit, b: SigBit) {
        let ra = self.root(a);
        let rb = self.root(b);
        if ra == rb {
            return;
        }
        // Constants must stay roots so canonicalization exposes them.
        let (from, to) = match (ra, rb) {
            (SigBit::Const(_), _) => (rb, ra),
            _ => (ra, rb),
        };
        self.forward.insert(from, to);
    }

    /// Resolves a bit to its canonical representative, compressing the
    /// lookup path.
    pub fn canonical(&mut self, bit: SigBit) -> SigBit {
        let root = self.root(bit);
        let mut cursor = bit;
        while cursor != root {
            let next = self.forward.insert(cursor, root).unwrap_or(root);
            cursor = next;
        }
        root
    }

    /// Resolves every bit of a signal.
    pub fn apply(&mut self, spec: &SigSpec) -> SigSpec {
        SigSpec::from_bits(spec.iter().map(|b| self.canonical(b)).collect())
    }
}
