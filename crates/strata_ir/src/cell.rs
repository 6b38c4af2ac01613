//! Cell definitions — the closed primitive catalogue plus foreign cells.
//!
//! A [`Cell`] is a primitive gate, flip-flop, LUT, or a foreign (library)
//! cell. The primitive catalogue is a closed enum so that pattern matching
//! over it is exhaustive and compiler-checked.

use crate::ids::CellId;
use crate::logic::Logic;
use crate::logic_vec::LogicVec;
use crate::sig::SigSpec;
use crate::wire::PortDirection;
use serde::{Deserialize, Serialize};

/// The kind of a cell.
///
/// Flip-flop variants encode clock polarity (`N`/`P`) and, for enabled
/// variants, enable polarity as the second letter. `Latch` and `Lut` appear
/// in parsed optimizer output; `Foreign` covers technology-library cells that
/// are passed through reintegration unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellKind {
    /// D flip-flop, negative clock edge.
    DffN,
    /// D flip-flop, positive clock edge.
    DffP,
    /// Enabled D flip-flop, negative edge, active-low enable.
    DffeNN,
    /// Enabled D flip-flop, negative edge, active-high enable.
    DffeNP,
    /// Enabled D flip-flop, positive edge, active-low enable.
    DffePN,
    /// Enabled D flip-flop, positive edge, active-high enable.
    DffePP,
    /// Non-inverting buffer.
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
    /// 2-to-1 multiplexer (`S ? B : A`).
    Mux,
    /// Inverted 2-to-1 multiplexer (`!(S ? B : A)`).
    Nmux,
    /// 4-to-1 multiplexer with selects S, T.
    Mux4,
    /// 8-to-1 multiplexer with selects S, T, U.
    Mux8,
    /// 16-to-1 multiplexer with selects S, T, U, V.
    Mux16,
    /// 3-input AND-OR-INVERT: `!((A & B) | C)`.
    Aoi3,
    /// 3-input OR-AND-INVERT: `!((A | B) & C)`.
    Oai3,
    /// 4-input AND-OR-INVERT: `!((A & B) | (C & D))`.
    Aoi4,
    /// 4-input OR-AND-INVERT: `!((A | B) & (C | D))`.
    Oai4,
    /// Look-up table. Bit `i` of `init` is the output for input pattern `i`.
    Lut {
        /// Number of inputs.
        width: u32,
        /// Truth-table contents.
        init: LogicVec,
    },
    /// Clockless latch from parsed optimizer output; reintegration rebinds it
    /// to the pass clock domain.
    Latch {
        /// Reset value (0, 1, or unknown).
        init: Logic,
    },
    /// A cell outside the primitive catalogue, e.g. a technology-library
    /// cell. Passed through reintegration with ports remapped only.
    Foreign {
        /// The foreign cell type name.
        type_name: String,
        /// Opaque parameters, carried through unchanged.
        parameters: Vec<(String, String)>,
    },
}

impl CellKind {
    /// Returns `true` for the six flip-flop variants.
    pub fn is_ff(&self) -> bool {
        matches!(
            self,
            CellKind::DffN
                | CellKind::DffP
                | CellKind::DffeNN
                | CellKind::DffeNP
                | CellKind::DffePN
                | CellKind::DffePP
        )
    }

    /// Clock polarity of a flip-flop variant (`true` = positive edge).
    pub fn ff_clk_polarity(&self) -> Option<bool> {
        match self {
            CellKind::DffN | CellKind::DffeNN | CellKind::DffeNP => Some(false),
            CellKind::DffP | CellKind::DffePN | CellKind::DffePP => Some(true),
            _ => None,
        }
    }

    /// Enable polarity of an enabled flip-flop variant (`true` = active
    /// high). `None` for enable-less variants and non-flip-flops.
    pub fn ff_en_polarity(&self) -> Option<bool> {
        match self {
            CellKind::DffeNP | CellKind::DffePP => Some(true),
            CellKind::DffeNN | CellKind::DffePN => Some(false),
            _ => None,
        }
    }

    /// Builds the flip-flop variant for the given clock/enable discipline.
    pub fn dff(clk_polarity: bool, en_polarity: Option<bool>) -> CellKind {
        match (clk_polarity, en_polarity) {
            (false, None) => CellKind::DffN,
            (true, None) => CellKind::DffP,
            (false, Some(false)) => CellKind::DffeNN,
            (false, Some(true)) => CellKind::DffeNP,
            (true, Some(false)) => CellKind::DffePN,
            (true, Some(true)) => CellKind::DffePP,
        }
    }

    /// A short display label used in result statistics.
    pub fn label(&self) -> String {
        match self {
            CellKind::DffN => "DFF_N".to_string(),
            CellKind::DffP => "DFF_P".to_string(),
            CellKind::DffeNN => "DFFE_NN".to_string(),
            CellKind::DffeNP => "DFFE_NP".to_string(),
            CellKind::DffePN => "DFFE_PN".to_string(),
            CellKind::DffePP => "DFFE_PP".to_string(),
            CellKind::Buf => "BUF".to_string(),
            CellKind::Not => "NOT".to_string(),
            CellKind::And => "AND".to_string(),
            CellKind::Nand => "NAND".to_string(),
            CellKind::Or => "OR".to_string(),
            CellKind::Nor => "NOR".to_string(),
            CellKind::Xor => "XOR".to_string(),
            CellKind::Xnor => "XNOR".to_string(),
            CellKind::AndNot => "ANDNOT".to_string(),
            CellKind::OrNot => "ORNOT".to_string(),
            CellKind::Mux => "MUX".to_string(),
            CellKind::Nmux => "NMUX".to_string(),
            CellKind::Mux4 => "MUX4".to_string(),
            CellKind::Mux8 => "MUX8".to_string(),
            CellKind::Mux16 => "MUX16".to_string(),
            CellKind::Aoi3 => "AOI3".to_string(),
            CellKind::Oai3 => "OAI3".to_string(),
            CellKind::Aoi4 => "AOI4".to_string(),
            CellKind::Oai4 => "OAI4".to_string(),
            CellKind::Lut { width, .. } => format!("LUT{width}"),
            CellKind::Latch { .. } => "LATCH".to_string(),
            CellKind::Foreign { type_name, .. } => type_name.clone(),
        }
    }
}

/// A connection between a cell port and a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// The name of the port on the cell (`A`, `B`, `S`, `Y`, `C`, ...).
    pub port_name: String,
    /// The direction of data flow.
    pub direction: PortDirection,
    /// The signal connected to this port.
    pub signal: SigSpec,
}

impl Connection {
    /// Creates an input connection.
    pub fn input(port_name: &str, signal: SigSpec) -> Self {
        Self {
            port_name: port_name.to_string(),
            direction: PortDirection::Input,
            signal,
        }
    }

    /// Creates an output connection.
    pub fn output(port_name: &str, signal: SigSpec) -> Self {
        Self {
            port_name: port_name.to_string(),
            direction: PortDirection::Output,
            signal,
        }
    }
}

/// A cell in the netlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The unique ID of this cell within its module.
    pub id: CellId,
    /// The cell instance name.
    pub name: String,
    /// The kind of cell.
    pub kind: CellKind,
    /// The port-to-signal connections.
    pub connections: Vec<Connection>,
}

impl Cell {
    /// Returns the signal connected to the named port, if any.
    pub fn port(&self, name: &str) -> Option<&SigSpec> {
        self.connections
            .iter()
            .find(|c| c.port_name == name)
            .map(|c| &c.signal)
    }

    /// Replaces (or adds) the connection for the named port.
    pub fn set_port(&mut self, name: &str, direction: PortDirection, signal: SigSpec) {
        if let Some(conn) = self.connections.iter_mut().find(|c| c.port_name == name) {
            conn.direction = direction;
            conn.signal = signal;
        } else {
            self.connections.push(Connection {
                port_name: name.to_string(),
                direction,
                signal,
            });
        }
    }
}
