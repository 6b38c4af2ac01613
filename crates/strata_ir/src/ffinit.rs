//! Per-bit flip-flop initial values collected from wire annotations.

use crate::logic::Logic;
use crate::module::Module;
use crate::sig::SigBit;
use crate::sigmap::SigMap;
use std::collections::HashMap;

/// Initial values of flip-flop output bits, keyed by canonical bit.
#[derive(Debug, Default)]
pub struct FfInit {
    values: HashMap<SigBit, Logic>,
}

impl FfInit {
    /// Collects initial values from every `init`-annotated wire of a module.
    ///
    /// Bits annotated `x` are skipped; a later lookup returns `Logic::X` for
    /// them anyway. When two aliased wires both carry a definite init, the
    /// last one collected wins.
    pub fn from_module(module: &Module, sigmap: &mut SigMap) -> Self {
        let mut values = HashMap::new();
        for wire in module.wires.values() {
            let Some(init) = &wire.init else { continue };
            for offset in 0..wire.width.min(init.width()) {
                let value = init.get(offset);
                if !value.is_definite() {
                    continue;
                }
                let bit = sigmap.canonical(SigBit::Wire {
                    wire: wire.id,
                    offset,
                });
                values.insert(bit, value);
            }
        }
        Self { values }
    }

    /// Returns the initial value of a canonical bit, `X` when unannotated.
    pub fn get(&self, bit: SigBit) -> Logic {
        self.values.get(&bit).copied().unwrap_or(Logic::X)
    }

    /// Returns `true` if any bit carries a definite initial value.
    pub fn any_definite(&self) -> bool {
        !self.values.is_empty()
    }
}
