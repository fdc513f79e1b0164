//! Circuit construction errors.
use std::fmt;

use crate::gate::{Arity, GateKind};

/// Error cases for building a [`Circuit`][crate::Circuit].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CircuitError {
    /// A net is used as a fanin but never driven.
    UndefinedNet {
        /// Name of the net.
        name: String,
    },
    /// A net is driven more than once.
    RedefinedNet {
        /// Name of the net.
        name: String,
    },
    /// A gate kind that cannot drive a named net was used for one.
    NotANetDriver {
        /// Name of the net.
        name: String,
        /// Kind of the rejected driver.
        kind: GateKind,
    },
    /// A gate has a number of fanins its kind does not accept.
    ArityMismatch {
        /// Name of the gate.
        name: String,
        /// Kind of the gate.
        kind: GateKind,
        /// Accepted number of fanins.
        expected: Arity,
        /// Number of given fanins.
        found: usize,
    },
    /// The combinational part of the netlist contains a cycle.
    CombinationalCycle {
        /// Name of a gate on the cycle.
        name: String,
    },
    /// Depth from output was already present before it was computed.
    DepthAlreadyComputed {
        /// Name of the first gate carrying a depth.
        name: String,
    },
    /// A constant constraint was placed on a gate that is not an input.
    ConstraintOnNonInput {
        /// Name of the gate.
        name: String,
    },
}

impl fmt::Display for CircuitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitError::UndefinedNet { name } => write!(f, "net `{name}` is used but never driven"),
            CircuitError::RedefinedNet { name } => write!(f, "net `{name}` is driven more than once"),
            CircuitError::NotANetDriver { name, kind } => {
                write!(f, "net `{name}` cannot be driven by a {} gate", kind.name())
            }
            CircuitError::ArityMismatch {
                name,
                kind,
                expected,
                found,
            } => {
                let expected = match expected {
                    Arity::Exactly(n) => format!("{n}"),
                    Arity::AtLeast(n) => format!("at least {n}"),
                };
                write!(
                    f,
                    "{} gate `{name}` has {found} inputs, expected {expected}",
                    kind.name()
                )
            }
            CircuitError::CombinationalCycle { name } => {
                write!(f, "combinational cycle through `{name}`")
            }
            CircuitError::DepthAlreadyComputed { name } => {
                write!(f, "depth from output of `{name}` was set before it was computed")
            }
            CircuitError::ConstraintOnNonInput { name } => {
                write!(f, "constraint on `{name}` which is not an input")
            }
        }
    }
}

impl std::error::Error for CircuitError {}
