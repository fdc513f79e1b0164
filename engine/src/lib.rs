//! Automatic test pattern generation for single stuck-at faults.
//!
//! The engine takes a levelized [`Circuit`][atpg_circuit::Circuit] and a [`FaultStore`] and
//! produces a [`PatternSet`]. For each fault at the head of the active fault list a test is
//! searched with [`PatternGenerator`], extended to further faults by dynamic compression and
//! finalized by bit-parallel fault simulation ([`FaultSim`]), which also drops every other fault
//! the pattern detects. Afterwards [`reverse_fault_simulation`] removes patterns that became
//! redundant.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod atpg;
pub mod compression;
pub mod error;
pub mod event_sim;
pub mod fault;
pub mod fault_sim;
pub mod generation;
pub mod options;
pub mod pattern;
pub mod reverse;
pub mod xpath;

#[cfg(test)]
mod testing;

pub use atpg::{run_atpg, Atpg, AtpgReport};
pub use error::InvariantViolation;
pub use event_sim::EventSim;
pub use fault::{Fault, FaultId, FaultLine, FaultState, FaultStore};
pub use fault_sim::FaultSim;
pub use generation::{Generation, PatternGenerator};
pub use options::AtpgOptions;
pub use pattern::{write_patterns, CaptureMode, Pattern, PatternSet};
pub use reverse::reverse_fault_simulation;
