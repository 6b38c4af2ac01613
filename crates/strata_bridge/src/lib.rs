//! The Strata optimizer bridge.
//!
//! Takes a region of a gate-level design, flattens it into a Boolean node
//! graph, hands the graph to an external combinational optimizer through the
//! BLIF interchange format, and splices the optimized result back into the
//! design with stable names and restored clocking.
//!
//! The pipeline per (module, clock domain) pass:
//!
//! 1. [`partition`] groups cells by clock/enable discipline,
//! 2. [`extract`] absorbs primitive cells into the [`registry`] node graph,
//! 3. [`loops`] breaks combinational feedback so the graph is a DAG,
//! 4. [`emit`] writes the graph as BLIF,
//! 5. [`driver`] runs the optimizer over a generated [`script`],
//! 6. [`reintegrate`] reads the optimizer's BLIF back into the design.
//!
//! [`session::Session`] orchestrates the whole run; the pass counter lives
//! in the design itself and nothing in this crate is process-global.

pub mod driver;
pub mod emit;
pub mod error;
pub mod extract;
pub mod genlib;
pub mod loops;
pub mod partition;
pub mod registry;
pub mod reintegrate;
pub mod script;
pub mod session;

pub use driver::{OutputFilter, SubprocessRunner, ToolRunner};
pub use error::{BridgeError, Result};
pub use partition::DomainKey;
pub use registry::{GateKind, GateNode, SignalRegistry};
pub use session::{MapConfig, Session};
