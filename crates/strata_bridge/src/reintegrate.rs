//! Splicing the optimizer's result back into the host design.
//!
//! The mapped netlist comes back as a fresh module whose wires are either
//! preserved boundary names (`st__n<id>`) or tool-invented ones. Every
//! mapped wire is re-created in the host under the `$abc$<pass>$` namespace,
//! with boundary names resolved through the registry to the display name of
//! the bit they stand for. The mapped cell vocabulary is translated back to
//! host primitives, flip-flops get the domain's clock and enable restored,
//! and boundary bits are tied to their re-created wires so the optimized
//! region drives and observes exactly what the flattened region did.

use crate::partition::DomainKey;
use crate::registry::{GateKind, SignalRegistry};
use log::info;
use std::collections::BTreeMap;
use strata_ir::{Cell, CellKind, Connection, Module, SigBit, SigSpec, WireId};

/// Counters reported after one splice.
#[derive(Debug, Default)]
pub struct ReintStats {
    /// Mapped cells by vocabulary name.
    pub cell_counts: BTreeMap<String, usize>,
    /// Boundary signals entering the mapped region.
    pub in_wires: usize,
    /// Boundary signals driven by the mapped region.
    pub out_wires: usize,
    /// Mapped signals with no boundary role.
    pub internal: usize,
}

fn strip_sigil(name: &str) -> &str {
    name.strip_prefix('$').unwrap_or(name)
}

/// Maps a name from the optimizer's netlist into the host namespace.
///
/// `st__n<id>` names (optionally wrapped as `new_<name>` or carrying a
/// postfix) resolve through the registry to
/// `$abc$<pass>$<display name>[offset]` with a `_new` marker for the
/// wrapped form; the backing wire is also returned so source-location
/// attributes can be carried over. Anything else lands verbatim under
/// `$abc$<pass>$`.
pub fn remap_name(
    pass: u64,
    module: &Module,
    registry: &SignalRegistry,
    name: &str,
) -> (String, Option<WireId>) {
    let (base, isnew) = match name.strip_prefix("new_") {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    if let Some(rest) = base.strip_prefix(crate::emit::NODE_PREFIX) {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits > 0 {
            if let Ok(sid) = rest[..digits].parse::<usize>() {
                if sid < registry.len() {
                    let node = registry.node(sid);
                    if let (Some(wire), SigBit::Wire { offset, .. }) =
                        (node.bit.wire(), node.bit)
                    {
                        let w = &module.wires[wire];
                        let mut s = format!("$abc${pass}${}", strip_sigil(&w.name));
                        if w.width != 1 {
                            s.push_str(&format!("[{offset}]"));
                        }
                        if isnew {
                            s.push_str("_new");
                        }
                        s.push_str(&rest[digits..]);
                        return (s, Some(wire));
                    }
                }
            }
        }
    }
    (format!("$abc${pass}${}", strip_sigil(name)), None)
}

fn host_bit(host: &Module, mapped: &Module, registry: &SignalRegistry, pass: u64, bit: SigBit) -> SigBit {
    match bit {
        SigBit::Const(_) => bit,
        SigBit::Wire { wire, .. } => {
            let (name, _) = remap_name(pass, host, registry, &mapped.wires[wire].name);
            let id = host
                .wire(&name)
                .unwrap_or_else(|| panic!("mapped wire {name} was not re-created"));
            SigBit::Wire { wire: id, offset: 0 }
        }
    }
}

fn host_spec(
    host: &Module,
    mapped: &Module,
    registry: &SignalRegistry,
    pass: u64,
    spec: &SigSpec,
) -> SigSpec {
    SigSpec::from_bits(
        spec.iter()
            .map(|bit| host_bit(host, mapped, registry, pass, bit))
            .collect(),
    )
}

/// Built-in library cells with their input port order; output is `Y`.
fn builtin_gate(type_name: &str) -> Option<(CellKind, &'static [&'static str])> {
    Some(match type_name {
        "NOT" => (CellKind::Not, &["A"][..]),
        "AND" => (CellKind::And, &["A", "B"]),
        "NAND" => (CellKind::Nand, &["A", "B"]),
        "OR" => (CellKind::Or, &["A", "B"]),
        "NOR" => (CellKind::Nor, &["A", "B"]),
        "XOR" => (CellKind::Xor, &["A", "B"]),
        "XNOR" => (CellKind::Xnor, &["A", "B"]),
        "ANDNOT" => (CellKind::AndNot, &["A", "B"]),
        "ORNOT" => (CellKind::OrNot, &["A", "B"]),
        "MUX" => (CellKind::Mux, &["A", "B", "S"]),
        "NMUX" => (CellKind::Nmux, &["A", "B", "S"]),
        "MUX4" => (CellKind::Mux4, &["A", "B", "C", "D", "S", "T"]),
        "MUX8" => (
            CellKind::Mux8,
            &["A", "B", "C", "D", "E", "F", "G", "H", "S", "T", "U"],
        ),
        "MUX16" => (
            CellKind::Mux16,
            &[
                "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O",
                "P", "S", "T", "U", "V",
            ],
        ),
        "AOI3" => (CellKind::Aoi3, &["A", "B", "C"]),
        "OAI3" => (CellKind::Oai3, &["A", "B", "C"]),
        "AOI4" => (CellKind::Aoi4, &["A", "B", "C", "D"]),
        "OAI4" => (CellKind::Oai4, &["A", "B", "C", "D"]),
        _ => return None,
    })
}

fn mapped_port(cell: &Cell, name: &str) -> SigSpec {
    cell.port(name)
        .unwrap_or_else(|| panic!("mapped cell {} has no {name} port", cell.name))
        .clone()
}

/// Splices one mapped netlist into the host module.
///
/// `pass` is the session-wide pass counter namespacing all re-created
/// names; `recover_init` carries latch reset values from the mapped
/// netlist onto the re-created output wires. `builtin_lib` is true when
/// the optimizer mapped against the generated standard-cell library, so
/// its cell names (ZERO, BUF, AND, ...) denote host primitives; with an
/// external library those names belong to the library and the cells pass
/// through as foreign.
///
/// # Panics
///
/// Panics when the mapped netlist is structurally inconsistent with the
/// flattened state it was produced from (unknown boundary names, missing
/// ports, clashing init attributes).
pub fn splice_mapped(
    module: &mut Module,
    registry: &SignalRegistry,
    domain: &DomainKey,
    mapped: &Module,
    pass: u64,
    recover_init: bool,
    builtin_lib: bool,
) -> ReintStats {
    let mut stats = ReintStats::default();

    for wire in mapped.wires.values() {
        let (name, orig) = remap_name(pass, module, registry, &wire.name);
        let src = orig.and_then(|w| module.wires[w].src.clone());
        let id = module.add_wire(&name, 1);
        module.wires[id].src = src;
        if recover_init {
            if let Some(init) = &wire.init {
                assert!(
                    module.wires[id].init.is_none(),
                    "init attribute already present on {name}"
                );
                module.wires[id].init = Some(init.clone());
            }
        }
    }

    let en_polarity = if domain.en.is_empty() {
        None
    } else {
        Some(domain.en_polarity)
    };

    for cell in mapped.cells.values() {
        let remap = |spec: &SigSpec| host_spec(module, mapped, registry, pass, spec);
        let (cell_name, _) = remap_name(pass, module, registry, &cell.name);

        match &cell.kind {
            CellKind::Latch { .. } => {
                *stats.cell_counts.entry("DFF".to_string()).or_default() += 1;
                let d = remap(&mapped_port(cell, "D"));
                let q = remap(&mapped_port(cell, "Q"));
                let mut connections = vec![
                    Connection::input("C", domain.clk.clone()),
                    Connection::input("D", d),
                    Connection::output("Q", q),
                ];
                if en_polarity.is_some() {
                    connections.push(Connection::input("E", domain.en.clone()));
                }
                module.add_cell(
                    &cell_name,
                    CellKind::dff(domain.clk_polarity, en_polarity),
                    connections,
                );
            }
            CellKind::Lut { width: 1, init } if init.to_u64() == Some(2) => {
                // A single-input buffer LUT carries no logic; collapse it.
                *stats.cell_counts.entry("$lut".to_string()).or_default() += 1;
                let a = remap(&mapped_port(cell, "A"));
                let y = remap(&mapped_port(cell, "Y"));
                module.connect(y, a);
            }
            CellKind::Lut { .. } => {
                *stats.cell_counts.entry("$lut".to_string()).or_default() += 1;
                let a = remap(&mapped_port(cell, "A"));
                let y = remap(&mapped_port(cell, "Y"));
                module.add_cell(
                    &cell_name,
                    cell.kind.clone(),
                    vec![Connection::input("A", a), Connection::output("Y", y)],
                );
            }
            CellKind::Foreign { type_name, .. } => {
                *stats.cell_counts.entry(type_name.clone()).or_default() += 1;
                // Generated-library vocabulary; with an external library
                // these names belong to the library's own cells.
                if builtin_lib {
                    match type_name.as_str() {
                        "ZERO" => {
                            let y = remap(&mapped_port(cell, "Y"));
                            module.connect(y, SigSpec::from_const(strata_ir::Logic::Zero));
                            continue;
                        }
                        "ONE" => {
                            let y = remap(&mapped_port(cell, "Y"));
                            module.connect(y, SigSpec::from_const(strata_ir::Logic::One));
                            continue;
                        }
                        "BUF" => {
                            let a = remap(&mapped_port(cell, "A"));
                            let y = remap(&mapped_port(cell, "Y"));
                            module.connect(y, a);
                            continue;
                        }
                        name => {
                            if let Some((kind, inputs)) = builtin_gate(name) {
                                let mut connections = Vec::with_capacity(inputs.len() + 1);
                                for port in inputs {
                                    connections.push(Connection::input(
                                        port,
                                        remap(&mapped_port(cell, port)),
                                    ));
                                }
                                connections.push(Connection::output(
                                    "Y",
                                    remap(&mapped_port(cell, "Y")),
                                ));
                                module.add_cell(&cell_name, kind, connections);
                                continue;
                            }
                        }
                    }
                }
                match type_name.as_str() {
                    "_const0_" => {
                        let y = remap(&mapped_port(cell, "Y"));
                        module.connect(y, SigSpec::from_const(strata_ir::Logic::Zero));
                    }
                    "_const1_" => {
                        let y = remap(&mapped_port(cell, "Y"));
                        module.connect(y, SigSpec::from_const(strata_ir::Logic::One));
                    }
                    "_dff_" => {
                        let d = remap(&mapped_port(cell, "D"));
                        let q = remap(&mapped_port(cell, "Q"));
                        let mut connections = vec![
                            Connection::input("C", domain.clk.clone()),
                            Connection::input("D", d),
                            Connection::output("Q", q),
                        ];
                        if en_polarity.is_some() {
                            connections.push(Connection::input("E", domain.en.clone()));
                        }
                        module.add_cell(
                            &cell_name,
                            CellKind::dff(domain.clk_polarity, en_polarity),
                            connections,
                        );
                    }
                    _ => {
                        // Library cell: pass through with ports remapped.
                        let connections = cell
                            .connections
                            .iter()
                            .map(|c| Connection {
                                port_name: c.port_name.clone(),
                                direction: c.direction,
                                signal: remap(&c.signal),
                            })
                            .collect();
                        module.add_cell(&cell_name, cell.kind.clone(), connections);
                    }
                }
            }
            kind => panic!("unexpected {} cell in mapped netlist", kind.label()),
        }
    }

    for (lhs, rhs) in &mapped.connections {
        let lhs = host_spec(module, mapped, registry, pass, lhs);
        let rhs = host_spec(module, mapped, registry, pass, rhs);
        module.connect(lhs, rhs);
    }

    for node in registry.nodes() {
        if !node.is_boundary {
            continue;
        }
        let name = format!("{}{}", crate::emit::NODE_PREFIX, node.id);
        let (mapped_name, _) = remap_name(pass, module, registry, &name);
        let id = module
            .wire(&mapped_name)
            .unwrap_or_else(|| panic!("boundary wire {mapped_name} missing from mapped netlist"));
        let new_side = module.wire_spec(id);
        let orig_side = SigSpec::from_bit(node.bit);
        if node.kind != GateKind::None {
            module.connect(orig_side, new_side);
            stats.out_wires += 1;
        } else {
            module.connect(new_side, orig_side);
            stats.in_wires += 1;
        }
    }
    stats.internal = registry.len() - stats.in_wires - stats.out_wires;

    for (name, count) in &stats.cell_counts {
        info!("RESULTS: {name:>15} cells: {count:8}");
    }
    info!("RESULTS: internal signals: {:8}", stats.internal);
    info!("RESULTS:    input signals: {:8}", stats.in_wires);
    info!("RESULTS:   output signals: {:8}", stats.out_wires);

    stats
}
