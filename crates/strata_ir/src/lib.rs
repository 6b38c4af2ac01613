//! StrataIR — the gate-level netlist representation for the Strata bridge.
//!
//! This crate defines the host design model the bridge operates on: a
//! [`Design`] of [`Module`]s holding [`Wire`] and [`Cell`] arenas, single-bit
//! signal references ([`SigBit`], [`SigSpec`]), the alias-resolving
//! [`SigMap`], and the flip-flop initial-value index [`FfInit`].

#![warn(missing_docs)]

pub mod arena;
pub mod cell;
pub mod design;
pub mod ffinit;
pub mod ids;
pub mod logic;
pub mod logic_vec;
pub mod module;
pub mod sig;
pub mod sigmap;
pub mod wire;

pub use arena::{Arena, ArenaId};
pub use cell::{Cell, CellKind, Connection};
pub use design::Design;
pub use ffinit::FfInit;
pub use ids::{CellId, ModuleId, WireId};
pub use logic::Logic;
pub use logic_vec::LogicVec;
pub use module::Module;
pub use sig::{SigBit, SigSpec};
pub use sigmap::SigMap;
pub use wire::{PortDirection, Wire};
