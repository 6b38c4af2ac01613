//! Modules: named containers of wires, cells, and connections.

use crate::arena::Arena;
use crate::cell::{Cell, CellKind, Connection};
use crate::ids::{CellId, ModuleId, WireId};
use crate::sig::{SigBit, SigSpec};
use crate::wire::{PortDirection, Wire};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single module of a hierarchical design.
///
/// Wires and cells live in arenas and are referenced by ID. Cells are never
/// physically removed while a transformation walks the module; they are
/// recorded in `dead_cells` and dropped by [`Module::compact_cells`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The unique ID of this module within its design.
    pub id: ModuleId,
    /// The module name. Generated names start with `$`.
    pub name: String,
    /// All wires of the module.
    pub wires: Arena<WireId, Wire>,
    /// Name-to-wire index. Ordered so iteration over names is deterministic.
    pub wire_names: BTreeMap<String, WireId>,
    /// All cells of the module, dead ones included.
    pub cells: Arena<CellId, Cell>,
    /// Cells scheduled for removal.
    pub dead_cells: BTreeSet<CellId>,
    /// Direct signal-to-signal assignments (`lhs` driven by `rhs`).
    pub connections: Vec<(SigSpec, SigSpec)>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(id: ModuleId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            wires: Arena::new(),
            wire_names: BTreeMap::new(),
            cells: Arena::new(),
            dead_cells: BTreeSet::new(),
            connections: Vec::new(),
        }
    }

    /// Adds a wire with the given name and width.
    ///
    /// # Panics
    ///
    /// Panics if a wire with the same name already exists.
    pub fn add_wire(&mut self, name: &str, width: u32) -> WireId {
        assert!(
            !self.wire_names.contains_key(name),
            "duplicate wire name {name:?} in module {}",
            self.name
        );
        let id = self.wires.next_id();
        self.wires.alloc(Wire {
            id,
            name: name.to_string(),
            width,
            port: None,
            keep: false,
            init: None,
            src: None,
        });
        self.wire_names.insert(name.to_string(), id);
        id
    }

    /// Looks up a wire by name.
    pub fn wire(&self, name: &str) -> Option<WireId> {
        self.wire_names.get(name).copied()
    }

    /// Returns the full-width signal covering every bit of a wire.
    pub fn wire_spec(&self, wire: WireId) -> SigSpec {
        let width = self.wires[wire].width;
        SigSpec::from_bits(
            (0..width)
                .map(|offset| SigBit::Wire { wire, offset })
                .collect(),
        )
    }

    /// Adds a cell with the given name, kind, and connections.
    pub fn add_cell(&mut self, name: &str, kind: CellKind, connections: Vec<Connection>) -> CellId {
        let id = self.cells.next_id();
        self.cells.alloc(Cell {
            id,
            name: name.to_string(),
            kind,
            connections,
        });
        id
    }

    /// Schedules a cell for removal. The cell stays in the arena until
    /// [`Module::compact_cells`] runs.
    pub fn remove_cell(&mut self, cell: CellId) {
        self.dead_cells.insert(cell);
    }

    /// Returns `true` if the cell is scheduled for removal.
    pub fn is_dead(&self, cell: CellId) -> bool {
        self.dead_cells.contains(&cell)
    }

    /// Iterates over cells that are not scheduled for removal.
    pub fn live_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().filter(|c| !self.dead_cells.contains(&c.id))
    }

    /// Drops all cells scheduled for removal and clears the schedule.
    ///
    /// Surviving cells are renumbered, so any `CellId` held from before this
    /// call is invalidated. Call only between transformation passes.
    pub fn compact_cells(&mut self) {
        let dead = std::mem::take(&mut self.dead_cells);
        let old = std::mem::take(&mut self.cells);
        for (id, cell) in old.iter() {
            if dead.contains(&id) {
                continue;
            }
            let mut cell = cell.clone();
            cell.id = self.cells.next_id();
            self.cells.alloc(cell);
        }
    }

    /// Adds a direct assignment driving `lhs` from `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the two signals differ in width.
    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) {
        assert_eq!(
            lhs.len(),
            rhs.len(),
            "connection width mismatch in module {}",
            self.name
        );
        self.connections.push((lhs, rhs));
    }

    /// Iterates over wires that are module ports, input ports first, in
    /// creation order within each group.
    pub fn ports(&self) -> impl Iterator<Item = &Wire> {
        let inputs = self
            .wires
            .values()
            .filter(|w| w.port == Some(PortDirection::Input));
        let outputs = self
            .wires
            .values()
            .filter(|w| w.port == Some(PortDirection::Output));
        inputs.chain(outputs)
    }

    /// Renders one bit for diagnostics, e.g. `data[3]` or `1'x`.
    pub fn display_bit(&self, bit: SigBit) -> String {
        match bit {
            SigBit::Const(value) => format!("1'{value}"),
            SigBit::Wire { wire, offset } => {
                let w = &self.wires[wire];
                if w.width == 1 {
                    w.name.clone()
                } else {
                    format!("{}[{offset}]", w.name)
                }
            }
        }
    }

    /// Renders a signal for diagnostics, MSB first, comma separated.
    pub fn display_spec(&self, spec: &SigSpec) -> String {
        let parts: Vec<String> = spec.iter().rev().map(|b| self.display_bit(b)).collect();
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::Logic;

    fn module() -> Module {
        Module::new(ModuleId::from_raw(0), "top")
    }

    #[test]
    fn add_and_look_up_wires() {
        let mut m = module();
        let a = m.add_wire("a", 1);
        let b = m.add_wire("b", 4);
        assert_eq!(m.wire("a"), Some(a));
        assert_eq!(m.wire("b"), Some(b));
        assert_eq!(m.wire("c"), None);
        assert_eq!(m.wire_spec(b).len(), 4);
    }

    #[test]
    #[should_panic(expected = "duplicate wire name")]
    fn duplicate_wire_names_rejected() {
        let mut m = module();
        m.add_wire("a", 1);
        m.add_wire("a", 2);
    }

    #[test]
    fn dead_cell_schedule() {
        let mut m = module();
        let a = m.add_wire("a", 1);
        let y = m.add_wire("y", 1);
        let cell = m.add_cell(
            "g0",
            CellKind::Not,
            vec![
                Connection::input("A", m.wire_spec(a)),
                Connection::output("Y", m.wire_spec(y)),
            ],
        );
        assert_eq!(m.live_cells().count(), 1);
        m.remove_cell(cell);
        assert!(m.is_dead(cell));
        assert_eq!(m.live_cells().count(), 0);
        assert_eq!(m.cells.len(), 1);
        m.compact_cells();
        assert_eq!(m.cells.len(), 0);
        assert!(m.dead_cells.is_empty());
    }

    #[test]
    #[should_panic(expected = "width mismatch")]
    fn connect_checks_widths() {
        let mut m = module();
        let a = m.add_wire("a", 2);
        m.connect(m.wire_spec(a), SigSpec::from_const(Logic::Zero));
    }

    #[test]
    fn port_iteration_order() {
        let mut m = module();
        let o = m.add_wire("o", 1);
        let i = m.add_wire("i", 1);
        m.wires[o].port = Some(PortDirection::Output);
        m.wires[i].port = Some(PortDirection::Input);
        let names: Vec<&str> = m.ports().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["i", "o"]);
    }

    #[test]
    fn bit_display() {
        let mut m = module();
        let a = m.add_wire("a", 1);
        let d = m.add_wire("data", 4);
        assert_eq!(m.display_bit(SigBit::Wire { wire: a, offset: 0 }), "a");
        assert_eq!(m.display_bit(SigBit::Wire { wire: d, offset: 2 }), "data[2]");
        assert_eq!(m.display_bit(SigBit::Const(Logic::X)), "1'x");
    }

    #[test]
    fn spec_display_is_msb_first() {
        let mut m = module();
        let d = m.add_wire("data", 2);
        let mut spec = m.wire_spec(d);
        spec.push(SigBit::Const(Logic::One));
        assert_eq!(m.display_spec(&spec), "1'1,data[1],data[0]");
    }
}
