//! Gates and gate types.
use atpg_ids::define_id;

use crate::testability::Scoap;

define_id! {
    /// Position of a gate in the circuit's gate array.
    pub struct GateId;
}

/// The function computed by a gate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GateKind {
    /// Primary input, its value is assigned by a test pattern.
    PrimaryInput,
    /// Primary output, a buffer observing its single fanin.
    PrimaryOutput,
    /// Pseudo primary input, the scanned state of a flip-flop.
    PseudoInput,
    /// Pseudo primary output, the captured next state of a flip-flop.
    PseudoOutput,
    /// Inverter.
    Inv,
    /// Buffer.
    Buf,
    /// N-input AND.
    And,
    /// N-input NAND.
    Nand,
    /// N-input OR.
    Or,
    /// N-input NOR.
    Nor,
    /// N-input XOR.
    Xor,
    /// N-input XNOR.
    Xnor,
    /// Multiplexer with fanins `[d0, d1, select]`.
    Mux,
    /// Constant 0.
    Tie0,
    /// Constant 1.
    Tie1,
    /// Constant unknown.
    TieX,
}

/// Number of fanins a [`GateKind`] accepts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Arity {
    /// Exactly this many fanins.
    Exactly(usize),
    /// At least this many fanins.
    AtLeast(usize),
}

impl Arity {
    /// Returns whether `count` fanins are accepted.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl GateKind {
    /// The netlist style name of this gate kind.
    pub fn name(self) -> &'static str {
        match self {
            GateKind::PrimaryInput => "PI",
            GateKind::PrimaryOutput => "PO",
            GateKind::PseudoInput => "PPI",
            GateKind::PseudoOutput => "PPO",
            GateKind::Inv => "INV",
            GateKind::Buf => "BUF",
            GateKind::And => "AND",
            GateKind::Nand => "NAND",
            GateKind::Or => "OR",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Mux => "MUX",
            GateKind::Tie0 => "TIE0",
            GateKind::Tie1 => "TIE1",
            GateKind::TieX => "TIEX",
        }
    }

    /// Number of fanins this kind of gate accepts.
    pub fn arity(self) -> Arity {
        match self {
            GateKind::PrimaryInput
            | GateKind::PseudoInput
            | GateKind::Tie0
            | GateKind::Tie1
            | GateKind::TieX => Arity::Exactly(0),
            GateKind::PrimaryOutput | GateKind::PseudoOutput | GateKind::Inv | GateKind::Buf => {
                Arity::Exactly(1)
            }
            GateKind::Mux => Arity::Exactly(3),
            GateKind::And
            | GateKind::Nand
            | GateKind::Or
            | GateKind::Nor
            | GateKind::Xor
            | GateKind::Xnor => Arity::AtLeast(1),
        }
    }

    /// Returns `true` for primary and pseudo primary inputs.
    pub fn is_input(self) -> bool {
        matches!(self, GateKind::PrimaryInput | GateKind::PseudoInput)
    }

    /// Returns `true` for primary and pseudo primary outputs.
    pub fn is_output(self) -> bool {
        matches!(self, GateKind::PrimaryOutput | GateKind::PseudoOutput)
    }

    /// Returns `true` for constant gates.
    pub fn is_tie(self) -> bool {
        matches!(self, GateKind::Tie0 | GateKind::Tie1 | GateKind::TieX)
    }

    /// Returns `true` when the gate inverts the result of its base function.
    pub fn is_inverting(self) -> bool {
        matches!(
            self,
            GateKind::Inv | GateKind::Nand | GateKind::Nor | GateKind::Xnor
        )
    }

    /// The input value that alone determines the output, if there is one.
    ///
    /// This is `0` for the AND family and `1` for the OR family.
    pub fn controlling_input(self) -> Option<bool> {
        match self {
            GateKind::And | GateKind::Nand => Some(false),
            GateKind::Or | GateKind::Nor => Some(true),
            _ => None,
        }
    }
}

/// A node of the circuit graph.
#[derive(Clone, Debug)]
pub struct Gate {
    /// Netlist name.
    pub name: String,
    /// The computed function.
    pub kind: GateKind,
    /// Level after levelization, every fanin has a strictly smaller level.
    pub level: u32,
    /// Ordered fanin gates.
    pub fanins: Vec<GateId>,
    /// Gates driven by this gate.
    pub fanouts: Vec<GateId>,
    /// Constant this gate is tied to, only used for inputs.
    pub constraint: Option<bool>,
    /// SCOAP testability measures.
    pub scoap: Scoap,
    pub(crate) depth_from_po: Option<u32>,
}

impl Gate {
    pub(crate) fn new(name: String, kind: GateKind, level: u32, fanins: Vec<GateId>) -> Self {
        Self {
            name,
            kind,
            level,
            fanins,
            fanouts: vec![],
            constraint: None,
            scoap: Scoap::default(),
            depth_from_po: None,
        }
    }

    /// Level distance to the nearest primary or pseudo output.
    ///
    /// `None` until the circuit's depth pass ran.
    pub fn depth_from_po(&self) -> Option<u32> {
        self.depth_from_po
    }
}
