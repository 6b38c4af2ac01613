//! Primitive extraction: absorbing catalogue cells into the node graph.
//!
//! Each recognized primitive cell is recorded in the [`SignalRegistry`] as a
//! typed node and removed from the host module. Flip-flops are only absorbed
//! when their clock/enable discipline matches the domain being flattened;
//! mismatching flip-flops and non-catalogue cells are left untouched.

use crate::partition::DomainKey;
use crate::registry::{GateKind, SignalRegistry};
use strata_ir::{Cell, CellId, CellKind, FfInit, Module, SigBit, SigMap, SigSpec};

fn port_bit(cell: &Cell, name: &str) -> SigBit {
    cell.port(name)
        .unwrap_or_else(|| panic!("cell {} has no {name} port", cell.name))
        .as_bit()
}

/// Absorbs one cell into the registry if it is an extractable primitive.
///
/// On a match the output bit is registered with the resolved kind and input
/// node ids and the cell is scheduled for removal from the module. With
/// `keepff`, flip-flop output wires get the keep marker first, so they stay
/// boundary bits through later passes.
///
/// # Panics
///
/// Panics if a catalogue cell is missing one of its ports or connects a
/// multi-bit signal to a single-bit port; both violate the structural
/// contract the host design must uphold.
pub fn extract_cell(
    module: &mut Module,
    registry: &mut SignalRegistry,
    sigmap: &mut SigMap,
    initvals: &FfInit,
    domain: &DomainKey,
    cell_id: CellId,
    keepff: bool,
) {
    let cell = &module.cells[cell_id];

    if cell.kind.is_ff() {
        if cell.kind.ff_clk_polarity() != Some(domain.clk_polarity) {
            return;
        }
        match cell.kind.ff_en_polarity() {
            None => {
                if !domain.en.is_empty() {
                    return;
                }
            }
            Some(en_pol) => {
                if en_pol != domain.en_polarity {
                    return;
                }
                let en = cell
                    .port("E")
                    .map(|s| sigmap.apply(s))
                    .unwrap_or_default();
                if en != domain.en {
                    return;
                }
            }
        }
        let clk = cell
            .port("C")
            .map(|s| sigmap.apply(s))
            .unwrap_or_default();
        if clk != domain.clk {
            return;
        }

        let d = port_bit(cell, "D");
        let q = port_bit(cell, "Q");
        if keepff {
            if let Some(wire) = q.wire() {
                module.wires[wire].keep = true;
            }
        }
        let d_id = registry.register(sigmap, initvals, d, GateKind::None, [None; 4]);
        registry.register(
            sigmap,
            initvals,
            q,
            GateKind::Ff,
            [Some(d_id), None, None, None],
        );
        module.remove_cell(cell_id);
        return;
    }

    let (kind, inputs): (GateKind, &[&str]) = match cell.kind {
        CellKind::Buf => (GateKind::Buf, &["A"]),
        CellKind::Not => (GateKind::Not, &["A"]),
        CellKind::And => (GateKind::And, &["A", "B"]),
        CellKind::Nand => (GateKind::Nand, &["A", "B"]),
        CellKind::Or => (GateKind::Or, &["A", "B"]),
        CellKind::Nor => (GateKind::Nor, &["A", "B"]),
        CellKind::Xor => (GateKind::Xor, &["A", "B"]),
        CellKind::Xnor => (GateKind::Xnor, &["A", "B"]),
        CellKind::AndNot => (GateKind::AndNot, &["A", "B"]),
        CellKind::OrNot => (GateKind::OrNot, &["A", "B"]),
        CellKind::Mux => (GateKind::Mux, &["A", "B", "S"]),
        CellKind::Nmux => (GateKind::Nmux, &["A", "B", "S"]),
        CellKind::Aoi3 => (GateKind::Aoi3, &["A", "B", "C"]),
        CellKind::Oai3 => (GateKind::Oai3, &["A", "B", "C"]),
        CellKind::Aoi4 => (GateKind::Aoi4, &["A", "B", "C", "D"]),
        CellKind::Oai4 => (GateKind::Oai4, &["A", "B", "C", "D"]),
        // Wide muxes, LUTs, latches, and foreign cells are not flattened.
        _ => return,
    };

    let y = port_bit(cell, "Y");
    let mut fanin = [None; 4];
    for (slot, port) in fanin.iter_mut().zip(inputs) {
        let bit = port_bit(cell, port);
        *slot = Some(registry.register(sigmap, initvals, bit, GateKind::None, [None; 4]));
    }
    registry.register(sigmap, initvals, y, kind, fanin);
    module.remove_cell(cell_id);
}

/// Marks every bit that must surface as a primary input or output.
///
/// Boundary bits are: bits of port wires and keep-marked wires, bits still
/// connected to surviving (non-extracted) cells, and the domain's clock and
/// enable signals. Bits never registered stay ignored; they are outside the
/// flattened region.
pub fn mark_boundaries(
    module: &Module,
    registry: &mut SignalRegistry,
    sigmap: &mut SigMap,
    domain: &DomainKey,
) {
    for wire in module.wires.values() {
        if wire.port.is_some() || wire.keep {
            registry.mark_boundary(sigmap, &module.wire_spec(wire.id));
        }
    }
    for cell in module.live_cells() {
        for conn in &cell.connections {
            registry.mark_boundary(sigmap, &conn.signal);
        }
    }
    if !domain.clk.is_empty() {
        registry.mark_boundary(sigmap, &domain.clk);
    }
    if !domain.en.is_empty() {
        registry.mark_boundary(sigmap, &domain.en);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{Connection, Logic, LogicVec, ModuleId, PortDirection};

    fn module() -> Module {
        Module::new(ModuleId::from_raw(0), "top")
    }

    fn spec(m: &mut Module, name: &str) -> SigSpec {
        let id = match m.wire(name) {
            Some(id) => id,
            None => m.add_wire(name, 1),
        };
        m.wire_spec(id)
    }

    fn ctx(m: &Module) -> (SigMap, FfInit) {
        let mut sigmap = SigMap::from_module(m);
        let initvals = FfInit::from_module(m, &mut sigmap);
        (sigmap, initvals)
    }

    #[test]
    fn and_gate_is_absorbed() {
        let mut m = module();
        let a = spec(&mut m, "a");
        let b = spec(&mut m, "b");
        let y = spec(&mut m, "y");
        let cell = m.add_cell(
            "g",
            CellKind::And,
            vec![
                Connection::input("A", a.clone()),
                Connection::input("B", b.clone()),
                Connection::output("Y", y.clone()),
            ],
        );
        let (mut sigmap, initvals) = ctx(&m);
        let mut reg = SignalRegistry::new();
        let domain = DomainKey::default_key();
        extract_cell(&mut m, &mut reg, &mut sigmap, &initvals, &domain, cell, false);

        assert!(m.is_dead(cell));
        assert_eq!(reg.len(), 3);
        let y_id = reg.register(&mut sigmap, &initvals, y.as_bit(), GateKind::None, [None; 4]);
        assert_eq!(reg.node(y_id).kind, GateKind::And);
        assert_eq!(reg.node(y_id).fanin[0], Some(0));
        assert_eq!(reg.node(y_id).fanin[1], Some(1));
    }

    #[test]
    fn matching_dff_is_absorbed_with_init() {
        let mut m = module();
        let clk = spec(&mut m, "clk");
        let d = spec(&mut m, "d");
        let q = spec(&mut m, "q");
        let qw = m.wire("q").unwrap();
        m.wires[qw].init = Some(LogicVec::from_binary_str("1").unwrap());
        let cell = m.add_cell(
            "ff",
            CellKind::DffP,
            vec![
                Connection::input("C", clk.clone()),
                Connection::input("D", d),
                Connection::output("Q", q.clone()),
            ],
        );
        let (mut sigmap, initvals) = ctx(&m);
        let mut reg = SignalRegistry::new();
        let domain = DomainKey {
            clk_polarity: true,
            clk,
            en_polarity: true,
            en: SigSpec::new(),
        };
        extract_cell(&mut m, &mut reg, &mut sigmap, &initvals, &domain, cell, false);

        assert!(m.is_dead(cell));
        let q_id = reg.register(&mut sigmap, &initvals, q.as_bit(), GateKind::None, [None; 4]);
        assert_eq!(reg.node(q_id).kind, GateKind::Ff);
        assert_eq!(reg.node(q_id).init, Logic::One);
    }

    #[test]
    fn mismatching_clock_is_left_alone() {
        let mut m = module();
        let clk = spec(&mut m, "clk");
        let other = spec(&mut m, "other_clk");
        let d = spec(&mut m, "d");
        let q = spec(&mut m, "q");
        let cell = m.add_cell(
            "ff",
            CellKind::DffP,
            vec![
                Connection::input("C", other),
                Connection::input("D", d),
                Connection::output("Q", q),
            ],
        );
        let (mut sigmap, initvals) = ctx(&m);
        let mut reg = SignalRegistry::new();
        let domain = DomainKey {
            clk_polarity: true,
            clk,
            en_polarity: true,
            en: SigSpec::new(),
        };
        extract_cell(&mut m, &mut reg, &mut sigmap, &initvals, &domain, cell, false);
        assert!(!m.is_dead(cell));
        assert!(reg.is_empty());
    }

    #[test]
    fn keepff_marks_output_wire() {
        let mut m = module();
        let clk = spec(&mut m, "clk");
        let d = spec(&mut m, "d");
        let q = spec(&mut m, "q");
        let cell = m.add_cell(
            "ff",
            CellKind::DffN,
            vec![
                Connection::input("C", clk.clone()),
                Connection::input("D", d),
                Connection::output("Q", q),
            ],
        );
        let (mut sigmap, initvals) = ctx(&m);
        let mut reg = SignalRegistry::new();
        let domain = DomainKey {
            clk_polarity: false,
            clk,
            en_polarity: true,
            en: SigSpec::new(),
        };
        extract_cell(&mut m, &mut reg, &mut sigmap, &initvals, &domain, cell, true);
        assert!(m.wires[m.wire("q").unwrap()].keep);
    }

    #[test]
    fn foreign_cells_are_never_extracted() {
        let mut m = module();
        let a = spec(&mut m, "a");
        let y = spec(&mut m, "y");
        let cell = m.add_cell(
            "lib",
            CellKind::Foreign {
                type_name: "INVX1".to_string(),
                parameters: vec![],
            },
            vec![Connection::input("A", a), Connection::output("Y", y)],
        );
        let (mut sigmap, initvals) = ctx(&m);
        let mut reg = SignalRegistry::new();
        let domain = DomainKey::default_key();
        extract_cell(&mut m, &mut reg, &mut sigmap, &initvals, &domain, cell, false);
        assert!(!m.is_dead(cell));
    }

    #[test]
    fn boundaries_cover_ports_and_survivor_connections() {
        let mut m = module();
        let a = spec(&mut m, "a");
        let y = spec(&mut m, "y");
        let aw = m.wire("a").unwrap();
        m.wires[aw].port = Some(PortDirection::Input);
        let inv = m.add_cell(
            "inv",
            CellKind::Not,
            vec![
                Connection::input("A", a.clone()),
                Connection::output("Y", y.clone()),
            ],
        );
        // A surviving foreign cell consumes y.
        let z = spec(&mut m, "z");
        m.add_cell(
            "lib",
            CellKind::Foreign {
                type_name: "BUFX2".to_string(),
                parameters: vec![],
            },
            vec![Connection::input("A", y.clone()), Connection::output("Y", z)],
        );
        let (mut sigmap, initvals) = ctx(&m);
        let mut reg = SignalRegistry::new();
        let domain = DomainKey::default_key();
        extract_cell(&mut m, &mut reg, &mut sigmap, &initvals, &domain, inv, false);
        mark_boundaries(&m, &mut reg, &mut sigmap, &domain);

        let a_id = reg.register(&mut sigmap, &initvals, a.as_bit(), GateKind::None, [None; 4]);
        let y_id = reg.register(&mut sigmap, &initvals, y.as_bit(), GateKind::None, [None; 4]);
        assert!(reg.node(a_id).is_boundary);
        assert!(reg.node(y_id).is_boundary);
    }
}
