//! Combinational feedback breaking.
//!
//! Runs Kahn's topological sort over one domain's node graph. Flip-flop and
//! undriven nodes seed the workpool; when the pool drains while edges remain,
//! a combinational cycle exists and one node is split: its output becomes a
//! primary output, a fresh synthetic signal re-enters as a primary input, and
//! a host-design connection ties the two back together so reintegration
//! closes the loop through the boundary instead of an internal edge.

use crate::registry::{GateKind, SignalRegistry};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use strata_ir::{FfInit, Module, SigBit, SigMap, SigSpec};

/// Decides whether `cand` is a better node to break than `best`.
///
/// Preference order: a node with no backing wire, then a generated
/// (`$`-prefixed) wire name over a user-given one, then the node with the
/// most remaining successors, then the lexicographically smaller display
/// name. Equal candidates keep the incumbent, which together with ordered
/// iteration makes the choice deterministic.
fn prefer_break(
    module: &Module,
    registry: &SignalRegistry,
    edges: &BTreeMap<usize, BTreeSet<usize>>,
    best: usize,
    cand: usize,
) -> bool {
    let wb = registry.node(best).bit.wire();
    let wc = registry.node(cand).bit.wire();
    let (wb, wc) = match (wb, wc) {
        (None, _) => return false,
        (_, None) => return true,
        (Some(b), Some(c)) => (b, c),
    };
    let gb = module.wires[wb].has_generated_name();
    let gc = module.wires[wc].has_generated_name();
    if gb != gc {
        return gc;
    }
    let sb = edges.get(&best).map_or(0, BTreeSet::len);
    let sc = edges.get(&cand).map_or(0, BTreeSet::len);
    if sb != sc {
        return sc > sb;
    }
    module.display_bit(registry.node(cand).bit) < module.display_bit(registry.node(best).bit)
}

/// Makes the domain's node graph acyclic, breaking cycles through synthetic
/// boundary signals. Returns the number of breaks performed.
pub fn break_loops(
    module: &mut Module,
    registry: &mut SignalRegistry,
    sigmap: &mut SigMap,
    initvals: &FfInit,
    autoidx: &mut u64,
) -> usize {
    let mut edges: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    let mut in_count = vec![0usize; registry.len()];
    let mut workpool: BTreeSet<usize> = BTreeSet::new();
    let mut breaks = 0;

    for node in registry.nodes() {
        if matches!(node.kind, GateKind::None | GateKind::Ff) {
            workpool.insert(node.id);
        } else {
            for fanin in node.distinct_fanins() {
                edges.entry(fanin).or_default().insert(node.id);
                in_count[node.id] += 1;
            }
        }
    }

    loop {
        while let Some(&id) = workpool.iter().next() {
            workpool.remove(&id);
            for succ in edges.remove(&id).unwrap_or_default() {
                assert!(in_count[succ] > 0, "in-degree underflow at node {succ}");
                in_count[succ] -= 1;
                if in_count[succ] == 0 {
                    workpool.insert(succ);
                }
            }
        }

        // Whatever remains after a full drain is cyclic. This also covers
        // graphs with no seed nodes at all, where the pool starts empty.
        edges.retain(|_, succs| !succs.is_empty());
        if edges.is_empty() {
            break;
        }

        let mut chosen = *edges.keys().next().unwrap();
        for &cand in edges.keys() {
            if prefer_break(module, registry, &edges, chosen, cand) {
                chosen = cand;
            }
        }

        let name = format!("$strataloop${autoidx}");
        *autoidx += 1;
        let wire = module.add_wire(&name, 1);
        let new_bit = SigBit::Wire { wire, offset: 0 };
        let new_id = registry.register(sigmap, initvals, new_bit, GateKind::None, [None; 4]);
        assert_eq!(new_id, in_count.len(), "break signal already registered");
        in_count.push(0);
        registry.node_mut(chosen).is_boundary = true;
        registry.node_mut(new_id).is_boundary = true;
        workpool.insert(new_id);

        let successors = edges.remove(&chosen).unwrap_or_default();
        for &succ in &successors {
            debug!(
                "breaking loop with {name}: {} -> {}",
                module.display_bit(registry.node(chosen).bit),
                module.display_bit(registry.node(succ).bit)
            );
            for slot in registry.node_mut(succ).fanin.iter_mut() {
                if *slot == Some(chosen) {
                    *slot = Some(new_id);
                }
            }
        }
        edges.insert(new_id, successors);

        let old_bit = registry.node(chosen).bit;
        module.connect(SigSpec::from_bit(new_bit), SigSpec::from_bit(old_bit));
        breaks += 1;
    }

    breaks
}
