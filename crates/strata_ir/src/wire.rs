//! Wire definitions and port directions.

use crate::ids::WireId;
use crate::logic_vec::LogicVec;
use serde::{Deserialize, Serialize};

/// The direction of data flow through a port.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the cell or module.
    Input,
    /// Data flows out of the cell or module.
    Output,
}

/// A named multi-bit net within a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    /// The unique ID of this wire within its module.
    pub id: WireId,
    /// The wire name. Generated names start with `$`.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Module port direction, if this wire is a port.
    pub port: Option<PortDirection>,
    /// When set, the wire must survive optimization (the `keepff` marker).
    pub keep: bool,
    /// Flip-flop initial value annotation, one bit per wire bit.
    pub init: Option<LogicVec>,
    /// Source-location attribute carried through transformations.
    pub src: Option<String>,
}

impl Wire {
    /// Returns `true` if the wire name was generated by a tool rather than
    /// written by a user.
    pub fn has_generated_name(&self) -> bool {
        self.name.starts_with('$')
    }
}
