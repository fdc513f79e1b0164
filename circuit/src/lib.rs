//! Levelized gate-level circuit graph and logic value algebra for test pattern generation.
//!
//! A [`Circuit`] is an immutable array of [`Gate`]s stored in non-decreasing level order, so that
//! evaluating the gates in array order is always dependency correct. Gates reference each other
//! by [`GateId`]. Circuits are constructed and levelized by the [`CircuitBuilder`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod circuit;
pub mod depth;
pub mod error;
pub mod gate;
pub mod logic;
pub mod testability;

pub use builder::{CircuitBuilder, NetId};
pub use circuit::Circuit;
pub use error::CircuitError;
pub use gate::{Gate, GateId, GateKind};
pub use logic::{para::ParaValue, Logic, Value};
pub use testability::Scoap;
