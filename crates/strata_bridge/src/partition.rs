//! Clock-domain partitioning.
//!
//! Groups the cells of a module into independent clusters by flip-flop
//! clock/enable discipline, so each cluster can be flattened and optimized on
//! its own. Combinational logic joins the domain of the flip-flops it feeds
//! or is fed by; logic with no reachable flip-flop lands in the default
//! domain.

use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use strata_ir::{CellId, Module, SigBit, SigMap, SigSpec};

/// Identity of one clock domain.
///
/// Equality is structural over the canonicalized clock and enable signals.
/// `Ord` so that domains iterate in a stable order regardless of how the
/// partition was discovered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DomainKey {
    /// Clock polarity, `true` for positive edge.
    pub clk_polarity: bool,
    /// The clock signal; empty for the default domain.
    pub clk: SigSpec,
    /// Enable polarity, `true` for active high.
    pub en_polarity: bool,
    /// The enable signal; empty when there is no enable.
    pub en: SigSpec,
}

impl DomainKey {
    /// The synthetic domain for cells with no recognized flip-flop
    /// discipline.
    pub fn default_key() -> Self {
        Self {
            clk_polarity: true,
            clk: SigSpec::new(),
            en_polarity: true,
            en: SigSpec::new(),
        }
    }

    /// True if this domain carries a clock signal.
    pub fn has_clock(&self) -> bool {
        !self.clk.is_empty()
    }

    /// Renders the domain for log output, e.g. `clk=!clock, en=ce`.
    pub fn describe(&self, module: &Module) -> String {
        format!(
            "clk={}{}, en={}{}",
            if self.clk_polarity { "" } else { "!" },
            module.display_spec(&self.clk),
            if self.en_polarity { "" } else { "!" },
            module.display_spec(&self.en),
        )
    }
}

/// Partitions the live cells of a module into clock domains.
///
/// Flip-flops seed their domain directly. A lock-step bidirectional flood
/// fill then attaches combinational logic reachable through its fan-in or
/// fan-out, alternating fairly between the two directions so neither
/// starves. An undirected closure pass absorbs everything sharing any bit
/// with an assigned cell, and remaining cells form the default domain.
///
/// Every live cell lands in exactly one domain.
pub fn partition(module: &Module, sigmap: &mut SigMap) -> BTreeMap<DomainKey, Vec<CellId>> {
    let mut unassigned: BTreeSet<CellId> = module.live_cells().map(|c| c.id).collect();

    let mut cell_to_bit: HashMap<CellId, BTreeSet<SigBit>> = HashMap::new();
    let mut cell_to_bit_up: HashMap<CellId, BTreeSet<SigBit>> = HashMap::new();
    let mut cell_to_bit_down: HashMap<CellId, BTreeSet<SigBit>> = HashMap::new();
    let mut bit_to_cell: HashMap<SigBit, BTreeSet<CellId>> = HashMap::new();
    let mut bit_to_cell_up: HashMap<SigBit, BTreeSet<CellId>> = HashMap::new();
    let mut bit_to_cell_down: HashMap<SigBit, BTreeSet<CellId>> = HashMap::new();

    let mut assigned: BTreeMap<DomainKey, Vec<CellId>> = BTreeMap::new();
    let mut reverse: HashMap<CellId, DomainKey> = HashMap::new();

    let mut queue: BTreeSet<CellId> = BTreeSet::new();
    let mut queue_up: BTreeSet<CellId> = BTreeSet::new();
    let mut queue_down: BTreeSet<CellId> = BTreeSet::new();

    for cell in module.live_cells() {
        for conn in &cell.connections {
            for bit in conn.signal.iter() {
                let bit = sigmap.canonical(bit);
                if bit.wire().is_none() {
                    continue;
                }
                cell_to_bit.entry(cell.id).or_default().insert(bit);
                bit_to_cell.entry(bit).or_default().insert(cell.id);
                match conn.direction {
                    strata_ir::PortDirection::Input => {
                        cell_to_bit_up.entry(cell.id).or_default().insert(bit);
                        bit_to_cell_down.entry(bit).or_default().insert(cell.id);
                    }
                    strata_ir::PortDirection::Output => {
                        cell_to_bit_down.entry(cell.id).or_default().insert(bit);
                        bit_to_cell_up.entry(bit).or_default().insert(cell.id);
                    }
                }
            }
        }

        if !cell.kind.is_ff() {
            continue;
        }
        let clk = cell
            .port("C")
            .map(|s| sigmap.apply(s))
            .unwrap_or_default();
        let en = match cell.kind.ff_en_polarity() {
            Some(_) => cell
                .port("E")
                .map(|s| sigmap.apply(s))
                .unwrap_or_default(),
            None => SigSpec::new(),
        };
        let key = DomainKey {
            clk_polarity: cell.kind.ff_clk_polarity().unwrap_or(true),
            clk,
            en_polarity: cell.kind.ff_en_polarity().unwrap_or(true),
            en,
        };

        unassigned.remove(&cell.id);
        queue.insert(cell.id);
        queue_up.insert(cell.id);
        queue_down.insert(cell.id);
        assigned.entry(key.clone()).or_default().push(cell.id);
        reverse.insert(cell.id, key);
    }

    // Directed expansion: upstream through producers of the cell's inputs,
    // downstream through consumers of its outputs, in lock-step generations.
    let mut next_queue_up: BTreeSet<CellId> = BTreeSet::new();
    let mut next_queue_down: BTreeSet<CellId> = BTreeSet::new();
    while !queue_up.is_empty() || !queue_down.is_empty() {
        if let Some(&cell) = queue_up.iter().next() {
            queue_up.remove(&cell);
            let key = reverse[&cell].clone();
            if let Some(bits) = cell_to_bit_up.get(&cell) {
                for bit in bits {
                    for &c in bit_to_cell_up.get(bit).into_iter().flatten() {
                        if unassigned.remove(&c) {
                            next_queue_up.insert(c);
                            queue.insert(c);
                            assigned.entry(key.clone()).or_default().push(c);
                            reverse.insert(c, key.clone());
                        }
                    }
                }
            }
        }
        if let Some(&cell) = queue_down.iter().next() {
            queue_down.remove(&cell);
            let key = reverse[&cell].clone();
            if let Some(bits) = cell_to_bit_down.get(&cell) {
                for bit in bits {
                    for &c in bit_to_cell_down.get(bit).into_iter().flatten() {
                        if unassigned.remove(&c) {
                            next_queue_down.insert(c);
                            queue.insert(c);
                            assigned.entry(key.clone()).or_default().push(c);
                            reverse.insert(c, key.clone());
                        }
                    }
                }
            }
        }
        if queue_up.is_empty() && queue_down.is_empty() {
            std::mem::swap(&mut queue_up, &mut next_queue_up);
            std::mem::swap(&mut queue_down, &mut next_queue_down);
        }
    }

    // Undirected closure to a fixed point. Each bit's cell set is consumed
    // once, so this terminates in one visit per bit occurrence.
    let mut next_queue: BTreeSet<CellId> = BTreeSet::new();
    while !queue.is_empty() {
        let cell = *queue.iter().next().unwrap();
        queue.remove(&cell);
        let key = reverse[&cell].clone();
        if let Some(bits) = cell_to_bit.get(&cell) {
            for bit in bits {
                if let Some(cells) = bit_to_cell.get_mut(bit) {
                    for &c in cells.iter() {
                        if unassigned.remove(&c) {
                            next_queue.insert(c);
                            assigned.entry(key.clone()).or_default().push(c);
                            reverse.insert(c, key.clone());
                        }
                    }
                    cells.clear();
                }
            }
        }
        if queue.is_empty() {
            std::mem::swap(&mut queue, &mut next_queue);
        }
    }

    if !unassigned.is_empty() {
        let key = DomainKey::default_key();
        let list = assigned.entry(key.clone()).or_default();
        for cell in unassigned {
            list.push(cell);
            reverse.insert(cell, key.clone());
        }
    }

    debug!("partitioned {} into {} clock domains", module.name, assigned.len());
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{CellKind, Connection, Module, ModuleId};

    fn wire_spec(m: &mut Module, name: &str) -> SigSpec {
        let id = match m.wire(name) {
            Some(id) => id,
            None => m.add_wire(name, 1),
        };
        m.wire_spec(id)
    }

    fn add_dff(m: &mut Module, name: &str, clk: &str, d: &str, q: &str) -> CellId {
        let c = wire_spec(m, clk);
        let d = wire_spec(m, d);
        let q = wire_spec(m, q);
        m.add_cell(
            name,
            CellKind::DffP,
            vec![
                Connection::input("C", c),
                Connection::input("D", d),
                Connection::output("Q", q),
            ],
        )
    }

    fn add_not(m: &mut Module, name: &str, a: &str, y: &str) -> CellId {
        let a = wire_spec(m, a);
        let y = wire_spec(m, y);
        m.add_cell(
            name,
            CellKind::Not,
            vec![Connection::input("A", a), Connection::output("Y", y)],
        )
    }

    #[test]
    fn two_clocks_give_two_domains() {
        let mut m = Module::new(ModuleId::from_raw(0), "top");
        let ff1 = add_dff(&mut m, "ff1", "clk1", "d1", "q1");
        let ff2 = add_dff(&mut m, "ff2", "clk2", "d2", "q2");
        let inv1 = add_not(&mut m, "inv1", "q1", "d1");
        let inv2 = add_not(&mut m, "inv2", "q2", "d2");

        let mut sigmap = SigMap::from_module(&m);
        let domains = partition(&m, &mut sigmap);
        assert_eq!(domains.len(), 2);
        let mut memberships: Vec<BTreeSet<CellId>> = domains
            .values()
            .map(|v| v.iter().copied().collect())
            .collect();
        memberships.sort();
        assert!(memberships.contains(&[ff1, inv1].into_iter().collect()));
        assert!(memberships.contains(&[ff2, inv2].into_iter().collect()));
    }

    #[test]
    fn comb_cloud_between_ffs_joins_via_flood_fill() {
        let mut m = Module::new(ModuleId::from_raw(0), "top");
        // q -> inv_a -> t -> inv_b -> d, all one clock.
        let ff = add_dff(&mut m, "ff", "clk", "d", "q");
        let a = add_not(&mut m, "inv_a", "q", "t");
        let b = add_not(&mut m, "inv_b", "t", "d");

        let mut sigmap = SigMap::from_module(&m);
        let domains = partition(&m, &mut sigmap);
        assert_eq!(domains.len(), 1);
        let members: BTreeSet<CellId> = domains.values().next().unwrap().iter().copied().collect();
        assert_eq!(members, [ff, a, b].into_iter().collect());
    }

    #[test]
    fn pure_comb_lands_in_default_domain() {
        let mut m = Module::new(ModuleId::from_raw(0), "top");
        let inv = add_not(&mut m, "inv", "a", "y");
        let mut sigmap = SigMap::from_module(&m);
        let domains = partition(&m, &mut sigmap);
        assert_eq!(domains.len(), 1);
        let (key, cells) = domains.iter().next().unwrap();
        assert_eq!(*key, DomainKey::default_key());
        assert_eq!(cells, &vec![inv]);
    }

    #[test]
    fn partition_is_strict() {
        let mut m = Module::new(ModuleId::from_raw(0), "top");
        add_dff(&mut m, "ff1", "clk1", "d1", "q1");
        add_dff(&mut m, "ff2", "clk2", "d2", "q2");
        add_not(&mut m, "inv1", "q1", "d1");
        add_not(&mut m, "lonely", "x", "y");

        let mut sigmap = SigMap::from_module(&m);
        let domains = partition(&m, &mut sigmap);
        let total: usize = domains.values().map(Vec::len).sum();
        assert_eq!(total, m.live_cells().count());
        let mut seen = BTreeSet::new();
        for cells in domains.values() {
            for c in cells {
                assert!(seen.insert(*c), "cell assigned twice");
            }
        }
    }

    #[test]
    fn enable_signal_splits_domains() {
        let mut m = Module::new(ModuleId::from_raw(0), "top");
        let c = wire_spec(&mut m, "clk");
        let e = wire_spec(&mut m, "en");
        let d1 = wire_spec(&mut m, "d1");
        let q1 = wire_spec(&mut m, "q1");
        m.add_cell(
            "ffe",
            CellKind::DffePP,
            vec![
                Connection::input("C", c),
                Connection::input("E", e),
                Connection::input("D", d1),
                Connection::output("Q", q1),
            ],
        );
        add_dff(&mut m, "ff", "clk", "d2", "q2");

        let mut sigmap = SigMap::from_module(&m);
        let domains = partition(&m, &mut sigmap);
        assert_eq!(domains.len(), 2);
    }
}
