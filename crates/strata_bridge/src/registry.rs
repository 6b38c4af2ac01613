//! The signal registry: a dense node graph over canonical signal bits.
//!
//! Every distinct canonical bit the flattening pass touches gets one
//! [`GateNode`] with a dense integer id. Nodes are created on first
//! reference with [`GateKind::None`] and refined when the driving gate is
//! extracted; a node may therefore be referenced as a fan-in before its own
//! driver is seen. Last write per field wins, mirroring the single-driver
//! contract the host design must uphold.

use std::collections::HashMap;
use strata_ir::{FfInit, Logic, SigBit, SigMap, SigSpec};

/// The gate vocabulary of the flattened graph.
///
/// `None` marks a bit that is referenced but not driven by an extracted
/// gate, which makes it a primary input if it is also a boundary bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    /// Referenced but not (yet) driven by an extracted gate.
    None,
    /// Flip-flop (clocking lives on the pass context, not the node).
    Ff,
    /// Buffer.
    Buf,
    /// Inverter.
    Not,
    /// 2-input AND.
    And,
    /// 2-input NAND.
    Nand,
    /// 2-input OR.
    Or,
    /// 2-input NOR.
    Nor,
    /// 2-input XOR.
    Xor,
    /// 2-input XNOR.
    Xnor,
    /// `A & !B`.
    AndNot,
    /// `A | !B`.
    OrNot,
    /// 2-to-1 mux.
    Mux,
    /// Inverted 2-to-1 mux.
    Nmux,
    /// `!((A & B) | C)`.
    Aoi3,
    /// `!((A | B) & C)`.
    Oai3,
    /// `!((A & B) | (C & D))`.
    Aoi4,
    /// `!((A | B) & (C | D))`.
    Oai4,
}

/// One node of the flattened graph.
#[derive(Debug, Clone)]
pub struct GateNode {
    /// Dense id, stable for the lifetime of one flattening pass.
    pub id: usize,
    /// The driving gate kind.
    pub kind: GateKind,
    /// Up to four fan-in node ids. Duplicates are legal.
    pub fanin: [Option<usize>; 4],
    /// True if the bit must surface as a primary input or output.
    pub is_boundary: bool,
    /// The originating canonical bit.
    pub bit: SigBit,
    /// Initial value, meaningful only for flip-flop nodes.
    pub init: Logic,
}

impl GateNode {
    /// Iterates over the distinct fan-in ids, preserving first occurrence
    /// order. Duplicate slots count as one edge.
    pub fn distinct_fanins(&self) -> impl Iterator<Item = usize> + '_ {
        self.fanin.iter().enumerate().filter_map(|(i, f)| {
            let id = (*f)?;
            if self.fanin[..i].contains(&Some(id)) {
                None
            } else {
                Some(id)
            }
        })
    }
}

/// Registry of [`GateNode`]s, indexed by canonical bit.
#[derive(Debug, Default)]
pub struct SignalRegistry {
    nodes: Vec<GateNode>,
    index: HashMap<SigBit, usize>,
}

impl SignalRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bit, or refines an already-registered one.
    ///
    /// The bit is canonicalized first. A fresh node starts as
    /// [`GateKind::None`] with empty fan-ins and its initial value from
    /// `initvals`. A non-`None` `kind` overwrites the stored kind; each
    /// `Some` fan-in overwrites the corresponding slot. Returns the node id.
    pub fn register(
        &mut self,
        sigmap: &mut SigMap,
        initvals: &FfInit,
        bit: SigBit,
        kind: GateKind,
        fanin: [Option<usize>; 4],
    ) -> usize {
        let bit = sigmap.canonical(bit);
        let id = match self.index.get(&bit) {
            Some(&id) => id,
            None => {
                let id = self.nodes.len();
                self.nodes.push(GateNode {
                    id,
                    kind: GateKind::None,
                    fanin: [None; 4],
                    is_boundary: false,
                    bit,
                    init: initvals.get(bit),
                });
                self.index.insert(bit, id);
                id
            }
        };
        let node = &mut self.nodes[id];
        if kind != GateKind::None {
            node.kind = kind;
        }
        for (slot, value) in node.fanin.iter_mut().zip(fanin) {
            if value.is_some() {
                *slot = value;
            }
        }
        id
    }

    /// Marks every already-registered wire bit of `sig` as a boundary bit.
    /// Constants and unregistered bits are ignored.
    pub fn mark_boundary(&mut self, sigmap: &mut SigMap, sig: &SigSpec) {
        for bit in sig.iter() {
            let bit = sigmap.canonical(bit);
            if bit.wire().is_none() {
                continue;
            }
            if let Some(&id) = self.index.get(&bit) {
                self.nodes[id].is_boundary = true;
            }
        }
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node has been registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: usize) -> &GateNode {
        &self.nodes[id]
    }

    /// Mutable access to the node with the given id.
    pub fn node_mut(&mut self, id: usize) -> &mut GateNode {
        &mut self.nodes[id]
    }

    /// Iterates over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GateNode> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{Module, ModuleId};

    fn setup() -> (Module, SigMap, FfInit) {
        let mut m = Module::new(ModuleId::from_raw(0), "top");
        m.add_wire("a", 1);
        m.add_wire("b", 1);
        let mut sigmap = SigMap::from_module(&m);
        let initvals = FfInit::from_module(&m, &mut sigmap);
        (m, sigmap, initvals)
    }

    fn bit(m: &Module, name: &str) -> SigBit {
        SigBit::Wire {
            wire: m.wire(name).unwrap(),
            offset: 0,
        }
    }

    #[test]
    fn ids_are_dense_and_stable() {
        let (m, mut sigmap, initvals) = setup();
        let mut reg = SignalRegistry::new();
        let a = reg.register(&mut sigmap, &initvals, bit(&m, "a"), GateKind::None, [None; 4]);
        let b = reg.register(&mut sigmap, &initvals, bit(&m, "b"), GateKind::None, [None; 4]);
        assert_eq!((a, b), (0, 1));
        // Re-registering returns the same id.
        let a2 = reg.register(&mut sigmap, &initvals, bit(&m, "a"), GateKind::None, [None; 4]);
        assert_eq!(a2, a);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn kind_and_fanins_refine_in_any_order() {
        let (m, mut sigmap, initvals) = setup();
        let mut reg = SignalRegistry::new();
        let a = reg.register(&mut sigmap, &initvals, bit(&m, "a"), GateKind::None, [None; 4]);
        // Declare the driver later, with fan-ins.
        let b = reg.register(
            &mut sigmap,
            &initvals,
            bit(&m, "b"),
            GateKind::Not,
            [Some(a), None, None, None],
        );
        assert_eq!(reg.node(b).kind, GateKind::Not);
        assert_eq!(reg.node(b).fanin[0], Some(a));
        // A later call adds a fan-in without touching the kind.
        reg.register(
            &mut sigmap,
            &initvals,
            bit(&m, "b"),
            GateKind::None,
            [None, Some(a), None, None],
        );
        assert_eq!(reg.node(b).kind, GateKind::Not);
        assert_eq!(reg.node(b).fanin[1], Some(a));
    }

    #[test]
    fn boundary_marking_ignores_unregistered_bits() {
        let (m, mut sigmap, initvals) = setup();
        let mut reg = SignalRegistry::new();
        let a = reg.register(&mut sigmap, &initvals, bit(&m, "a"), GateKind::None, [None; 4]);
        reg.mark_boundary(&mut sigmap, &SigSpec::from_bit(bit(&m, "a")));
        reg.mark_boundary(&mut sigmap, &SigSpec::from_bit(bit(&m, "b")));
        assert!(reg.node(a).is_boundary);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn distinct_fanins_deduplicate() {
        let node = GateNode {
            id: 0,
            kind: GateKind::And,
            fanin: [Some(3), Some(3), Some(5), None],
            is_boundary: false,
            bit: SigBit::Const(Logic::Zero),
            init: Logic::X,
        };
        let fanins: Vec<usize> = node.distinct_fanins().collect();
        assert_eq!(fanins, vec![3, 5]);
    }
}
