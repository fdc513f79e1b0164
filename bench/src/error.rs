//! Netlist import errors.
use std::{fmt, io};

use atpg_circuit::CircuitError;

/// Error cases for reading a bench netlist.
#[derive(Debug)]
pub enum BenchError {
    /// Reading the input failed.
    Io(io::Error),
    /// A line does not follow the bench syntax.
    Syntax {
        /// One based line number.
        line: usize,
        /// What was expected.
        message: String,
    },
    /// A gate uses a function that is not supported.
    UnknownFunction {
        /// One based line number.
        line: usize,
        /// The function name as written.
        name: String,
    },
    /// The netlist is syntactically valid but does not describe a circuit.
    Circuit(CircuitError),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Io(err) => write!(f, "reading netlist: {err}"),
            BenchError::Syntax { line, message } => write!(f, "line {line}: {message}"),
            BenchError::UnknownFunction { line, name } => {
                write!(f, "line {line}: unknown gate function `{name}`")
            }
            BenchError::Circuit(err) => write!(f, "invalid netlist: {err}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Io(err) => Some(err),
            BenchError::Circuit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BenchError {
    fn from(err: io::Error) -> Self {
        BenchError::Io(err)
    }
}

impl From<CircuitError> for BenchError {
    fn from(err: CircuitError) -> Self {
        BenchError::Circuit(err)
    }
}
