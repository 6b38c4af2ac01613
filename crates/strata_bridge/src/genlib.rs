//! Standard-cell library generation for the default mapping mode.
//!
//! When no external library is supplied, the optimizer maps against a
//! generated `stdcells.genlib` describing the primitive catalogue with
//! per-gate area costs. LUT mode instead gets a `lutdefs.txt` cost table.
//! This module also owns the gate-set and LUT-list argument grammars.

use crate::error::{BridgeError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};

/// A gate that can be enabled or disabled in the generated library.
/// `BUF`, `NOT`, and the constant drivers are always present. Declaration
/// order is library emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LibGate {
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
    /// `A * !B`.
    AndNot,
    /// `A + !B`.
    OrNot,
    /// 3-input AND-OR-invert.
    Aoi3,
    /// 3-input OR-AND-invert.
    Oai3,
    /// 4-input AND-OR-invert.
    Aoi4,
    /// 4-input OR-AND-invert.
    Oai4,
    /// 2-to-1 mux.
    Mux,
    /// Inverted 2-to-1 mux.
    Nmux,
}

impl LibGate {
    const ALL: [LibGate; 14] = [
        LibGate::And,
        LibGate::Nand,
        LibGate::Or,
        LibGate::Nor,
        LibGate::Xor,
        LibGate::Xnor,
        LibGate::AndNot,
        LibGate::OrNot,
        LibGate::Aoi3,
        LibGate::Oai3,
        LibGate::Aoi4,
        LibGate::Oai4,
        LibGate::Mux,
        LibGate::Nmux,
    ];

    fn from_name(name: &str) -> Option<LibGate> {
        Some(match name {
            "AND" => LibGate::And,
            "NAND" => LibGate::Nand,
            "OR" => LibGate::Or,
            "NOR" => LibGate::Nor,
            "XOR" => LibGate::Xor,
            "XNOR" => LibGate::Xnor,
            "ANDNOT" => LibGate::AndNot,
            "ORNOT" => LibGate::OrNot,
            "AOI3" => LibGate::Aoi3,
            "OAI3" => LibGate::Oai3,
            "AOI4" => LibGate::Aoi4,
            "OAI4" => LibGate::Oai4,
            "MUX" => LibGate::Mux,
            "NMUX" => LibGate::Nmux,
            _ => return None,
        })
    }

    /// Area cost, from the default or the CMOS transistor-count table.
    pub fn cost(self, cmos: bool) -> u32 {
        if cmos {
            match self {
                LibGate::Nand | LibGate::Nor => 4,
                LibGate::And | LibGate::Or | LibGate::AndNot | LibGate::OrNot => 6,
                LibGate::Aoi3 | LibGate::Oai3 => 6,
                LibGate::Aoi4 | LibGate::Oai4 => 8,
                LibGate::Nmux => 10,
                LibGate::Mux | LibGate::Xor | LibGate::Xnor => 12,
            }
        } else {
            match self {
                LibGate::And
                | LibGate::Nand
                | LibGate::Or
                | LibGate::Nor
                | LibGate::AndNot
                | LibGate::OrNot
                | LibGate::Mux
                | LibGate::Nmux => 4,
                LibGate::Xor | LibGate::Xnor => 5,
                LibGate::Aoi3 | LibGate::Oai3 => 6,
                LibGate::Aoi4 | LibGate::Oai4 => 7,
            }
        }
    }

    fn row(self) -> (&'static str, &'static str, &'static str) {
        match self {
            LibGate::And => ("AND", "Y=A*B", "NONINV"),
            LibGate::Nand => ("NAND", "Y=!(A*B)", "INV"),
            LibGate::Or => ("OR", "Y=A+B", "NONINV"),
            LibGate::Nor => ("NOR", "Y=!(A+B)", "INV"),
            LibGate::Xor => ("XOR", "Y=(A*!B)+(!A*B)", "UNKNOWN"),
            LibGate::Xnor => ("XNOR", "Y=(A*B)+(!A*!B)", "UNKNOWN"),
            LibGate::AndNot => ("ANDNOT", "Y=A*!B", "UNKNOWN"),
            LibGate::OrNot => ("ORNOT", "Y=A+!B", "UNKNOWN"),
            LibGate::Aoi3 => ("AOI3", "Y=!((A*B)+C)", "INV"),
            LibGate::Oai3 => ("OAI3", "Y=!((A+B)*C)", "INV"),
            LibGate::Aoi4 => ("AOI4", "Y=!((A*B)+(C*D))", "INV"),
            LibGate::Oai4 => ("OAI4", "Y=!((A+B)*(C+D))", "INV"),
            LibGate::Mux => ("MUX", "Y=(A*!S)+(B*S)", "UNKNOWN"),
            LibGate::Nmux => ("NMUX", "Y=!((A*!S)+(B*S))", "UNKNOWN"),
        }
    }
}

impl fmt::Display for LibGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.row().0)
    }
}

/// Which selectable gates the generated library offers and which cost table
/// prices them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateLibrary {
    /// Enabled selectable gates.
    pub enabled: BTreeSet<LibGate>,
    /// Use the CMOS transistor-count cost table.
    pub cmos_cost: bool,
}

impl Default for GateLibrary {
    /// Everything except NMUX and the AOI/OAI compounds.
    fn default() -> Self {
        let enabled = LibGate::ALL
            .into_iter()
            .filter(|g| {
                !matches!(
                    g,
                    LibGate::Nmux
                        | LibGate::Aoi3
                        | LibGate::Oai3
                        | LibGate::Aoi4
                        | LibGate::Oai4
                )
            })
            .collect();
        Self {
            enabled,
            cmos_cost: false,
        }
    }
}

fn alias(name: &str) -> Option<(&'static [LibGate], bool)> {
    Some(match name {
        "simple" => (
            &[LibGate::And, LibGate::Or, LibGate::Xor, LibGate::Mux][..],
            false,
        ),
        "cmos2" => (&[LibGate::Nand, LibGate::Nor][..], true),
        "cmos3" => (
            &[LibGate::Nand, LibGate::Nor, LibGate::Aoi3, LibGate::Oai3][..],
            true,
        ),
        "cmos4" => (
            &[
                LibGate::Nand,
                LibGate::Nor,
                LibGate::Aoi3,
                LibGate::Oai3,
                LibGate::Aoi4,
                LibGate::Oai4,
            ][..],
            true,
        ),
        "cmos" => (
            &[
                LibGate::Nand,
                LibGate::Nor,
                LibGate::Aoi3,
                LibGate::Oai3,
                LibGate::Aoi4,
                LibGate::Oai4,
                LibGate::Nmux,
                LibGate::Mux,
                LibGate::Xor,
                LibGate::Xnor,
            ][..],
            true,
        ),
        "gates" => (
            &[
                LibGate::And,
                LibGate::Nand,
                LibGate::Or,
                LibGate::Nor,
                LibGate::Xor,
                LibGate::Xnor,
                LibGate::AndNot,
                LibGate::OrNot,
            ][..],
            false,
        ),
        "aig" => (
            &[
                LibGate::And,
                LibGate::Nand,
                LibGate::Or,
                LibGate::Nor,
                LibGate::AndNot,
                LibGate::OrNot,
            ][..],
            false,
        ),
        "all" => (&LibGate::ALL[..], false),
        _ => return None,
    })
}

/// Resolves a `--gates` argument into a [`GateLibrary`].
///
/// The argument is a comma-separated list of gate names and aliases
/// (`simple`, `cmos2`, `cmos3`, `cmos4`, `cmos`, `gates`, `aig`, `all`); a
/// leading `-` removes the named gates instead of adding them. The `cmos*`
/// aliases also switch to the CMOS cost table, except when used for removal.
/// `None` yields the default set.
pub fn resolve_gate_set(arg: Option<&str>) -> Result<GateLibrary> {
    let Some(arg) = arg else {
        return Ok(GateLibrary::default());
    };
    let mut enabled = BTreeSet::new();
    let mut cmos_cost = false;
    for token in arg.split(',') {
        let (remove, name) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let gates: Vec<LibGate> = if let Some(gate) = LibGate::from_name(name) {
            vec![gate]
        } else if let Some((list, cmos)) = alias(name) {
            if cmos && !remove {
                cmos_cost = true;
            }
            list.to_vec()
        } else {
            return Err(BridgeError::Config(format!(
                "unsupported gate type: '{token}'"
            )));
        };
        for gate in gates {
            if remove {
                enabled.remove(&gate);
            } else {
                enabled.insert(gate);
            }
        }
    }
    Ok(GateLibrary {
        enabled,
        cmos_cost,
    })
}

/// Writes the generated standard-cell library.
///
/// Constant drivers, `BUF`, and `NOT` are unconditional; the selectable
/// gates follow the enabled set, and the wide muxes are priced as multiples
/// of the 2-to-1 mux when requested.
pub fn write_genlib<W: Write>(
    w: &mut W,
    library: &GateLibrary,
    mux4: bool,
    mux8: bool,
    mux16: bool,
) -> io::Result<()> {
    writeln!(w, "GATE ZERO    1 Y=CONST0;")?;
    writeln!(w, "GATE ONE     1 Y=CONST1;")?;
    writeln!(w, "GATE BUF    1 Y=A;                  PIN * NONINV  1 999 1 0 1 0")?;
    writeln!(w, "GATE NOT    2 Y=!A;                 PIN * INV     1 999 1 0 1 0")?;
    for gate in &library.enabled {
        let (name, expr, phase) = gate.row();
        writeln!(
            w,
            "GATE {:<6} {} {:<21} PIN * {:<7} 1 999 1 0 1 0",
            name,
            gate.cost(library.cmos_cost),
            format!("{expr};"),
            phase,
        )?;
    }
    let mux_cost = LibGate::Mux.cost(library.cmos_cost);
    if mux4 {
        writeln!(
            w,
            "GATE MUX4   {} {}; PIN * UNKNOWN 1 999 1 0 1 0",
            2 * mux_cost,
            wide_mux_expr(2),
        )?;
    }
    if mux8 {
        writeln!(
            w,
            "GATE MUX8   {} {}; PIN * UNKNOWN 1 999 1 0 1 0",
            4 * mux_cost,
            wide_mux_expr(3),
        )?;
    }
    if mux16 {
        writeln!(
            w,
            "GATE MUX16  {} {}; PIN * UNKNOWN 1 999 1 0 1 0",
            8 * mux_cost,
            wide_mux_expr(4),
        )?;
    }
    Ok(())
}

/// Sum-of-products expression of a wide mux with `selects` select pins.
/// Data pins are `A`, `B`, ... and select pins `S`, `T`, `U`, `V`; data pin
/// index bits map to selects LSB-first.
fn wide_mux_expr(selects: u32) -> String {
    let sel_names = ['S', 'T', 'U', 'V'];
    let mut terms = Vec::new();
    for data in 0..(1u32 << selects) {
        let mut term = String::from("(");
        for bit in 0..selects {
            if data & (1 << bit) == 0 {
                term.push('!');
            }
            term.push(sel_names[bit as usize]);
            term.push('*');
        }
        term.push((b'A' + data as u8) as char);
        term.push(')');
        terms.push(term);
    }
    format!("Y={}", terms.join("+"))
}

/// Writes the LUT size/cost table consumed in LUT mode. Line `i` describes
/// LUTs with `i` inputs: `<inputs> <cost>.00 1.00`.
pub fn write_lutdefs<W: Write>(w: &mut W, lut_costs: &[u32]) -> io::Result<()> {
    for (i, cost) in lut_costs.iter().enumerate() {
        writeln!(w, "{} {cost}.00 1.00", i + 1)?;
    }
    Ok(())
}

/// Parses the `--lut` argument: either a single width `W` (cost 1 for every
/// size up to `W`) or `W1:W2` (cost 1 up to `W1`, then doubling up to `W2`).
pub fn parse_lut_arg(arg: &str) -> Result<Vec<u32>> {
    let bad = || BridgeError::Config(format!("invalid LUT width specification: '{arg}'"));
    let (w1, w2) = match arg.split_once(':') {
        None => {
            let w: u32 = arg.parse().map_err(|_| bad())?;
            (w, w)
        }
        Some((a, b)) => (
            a.parse().map_err(|_| bad())?,
            b.parse().map_err(|_| bad())?,
        ),
    };
    if w1 == 0 || w2 < w1 {
        return Err(bad());
    }
    let mut costs = vec![1; w1 as usize];
    for i in w1..w2 {
        costs.push(2 << (i - w1));
    }
    Ok(costs)
}

/// Parses the `--luts` argument: a comma-separated cost list. A bare number
/// is the cost of the next LUT size; `SIZE:COST` pads the list with `COST`
/// up to `SIZE` entries; an empty token repeats the previous cost.
pub fn parse_luts_arg(arg: &str) -> Result<Vec<u32>> {
    let mut costs: Vec<u32> = Vec::new();
    for token in arg.split(',') {
        if token.is_empty() {
            let &last = costs
                .last()
                .ok_or_else(|| BridgeError::Config("leading empty LUT cost".into()))?;
            costs.push(last);
            continue;
        }
        match token.split_once(':') {
            None => {
                let cost = token.parse().map_err(|_| {
                    BridgeError::Config(format!("invalid LUT cost: '{token}'"))
                })?;
                costs.push(cost);
            }
            Some((size, cost)) => {
                let size: usize = size.parse().map_err(|_| {
                    BridgeError::Config(format!("invalid LUT size: '{token}'"))
                })?;
                let cost: u32 = cost.parse().map_err(|_| {
                    BridgeError::Config(format!("invalid LUT cost: '{token}'"))
                })?;
                while costs.len() < size {
                    costs.push(cost);
                }
            }
        }
    }
    Ok(costs)
}
