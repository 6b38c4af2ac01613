//! BLIF netlist reading for the Strata optimizer bridge.
//!
//! The bridge hands a flat netlist to the external optimizer and reads the
//! optimized result back as BLIF. This crate parses that result into a
//! [`strata_ir::Module`]: `.names` covers become LUT cells, `.latch` lines
//! become latch cells, and `.gate` lines become foreign cells for the
//! reintegration step to translate.

#![warn(missing_docs)]

pub mod error;
pub mod parse;

pub use error::BlifError;
pub use parse::parse_module;
