//! SCOAP controllability and observability.
//!
//! The measures only guide the search heuristics, so a plain combinational computation over the
//! levelized gate array is sufficient. Pseudo inputs are treated like primary inputs and pseudo
//! outputs like primary outputs.
use atpg_ids::IdVec;

use crate::gate::{Gate, GateId, GateKind};

/// Cost used for values that cannot be produced or lines that cannot be observed.
pub const UNREACHABLE: u32 = u32::MAX / 4;

/// SCOAP measures of a single gate output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Scoap {
    /// Cost of setting the gate to 0.
    pub cc0: u32,
    /// Cost of setting the gate to 1.
    pub cc1: u32,
    /// Cost of observing the gate at an output.
    pub co: u32,
}

impl Default for Scoap {
    fn default() -> Self {
        Self {
            cc0: UNREACHABLE,
            cc1: UNREACHABLE,
            co: UNREACHABLE,
        }
    }
}

impl Scoap {
    /// Cost of setting the gate to the given value.
    pub fn cc(&self, value: bool) -> u32 {
        if value {
            self.cc1
        } else {
            self.cc0
        }
    }
}

fn add(a: u32, b: u32) -> u32 {
    a.saturating_add(b).min(UNREACHABLE)
}

fn controllability(kind: GateKind, fanins: &[Scoap], constraint: Option<bool>) -> (u32, u32) {
    let sum = |f: fn(&Scoap) -> u32| fanins.iter().map(f).fold(0, add);
    let min = |f: fn(&Scoap) -> u32| fanins.iter().map(f).min().unwrap_or(UNREACHABLE);

    let (cc0, cc1) = match kind {
        GateKind::PrimaryInput | GateKind::PseudoInput => match constraint {
            Some(false) => (1, UNREACHABLE),
            Some(true) => (UNREACHABLE, 1),
            None => (1, 1),
        },
        GateKind::Tie0 => (0, UNREACHABLE),
        GateKind::Tie1 => (UNREACHABLE, 0),
        GateKind::TieX => (UNREACHABLE, UNREACHABLE),
        GateKind::PrimaryOutput | GateKind::PseudoOutput => {
            return (min(|s| s.cc0), min(|s| s.cc1));
        }
        GateKind::Buf | GateKind::Inv => (min(|s| s.cc0), min(|s| s.cc1)),
        GateKind::And | GateKind::Nand => (min(|s| s.cc0), sum(|s| s.cc1)),
        GateKind::Or | GateKind::Nor => (sum(|s| s.cc0), min(|s| s.cc1)),
        GateKind::Xor | GateKind::Xnor => {
            // cheapest way to reach even and odd parity
            let mut even = 0;
            let mut odd = UNREACHABLE;
            for s in fanins {
                let next_even = add(even, s.cc0).min(add(odd, s.cc1));
                let next_odd = add(even, s.cc1).min(add(odd, s.cc0));
                even = next_even;
                odd = next_odd;
            }
            (even, odd)
        }
        GateKind::Mux => {
            let [d0, d1, s] = [fanins[0], fanins[1], fanins[2]];
            (
                add(s.cc0, d0.cc0).min(add(s.cc1, d1.cc0)),
                add(s.cc0, d0.cc1).min(add(s.cc1, d1.cc1)),
            )
        }
    };
    let (cc0, cc1) = if kind.is_inverting() {
        (cc1, cc0)
    } else {
        (cc0, cc1)
    };
    if kind.is_input() || kind.is_tie() {
        (cc0, cc1)
    } else {
        (add(cc0, 1), add(cc1, 1))
    }
}

/// Observability cost of fanin `line` of `gate` given the gate's own observability.
fn input_observability(gates: &IdVec<GateId, Gate>, gate: &Gate, line: usize) -> u32 {
    let co = gate.scoap.co;
    if gate.kind.is_output() {
        return co;
    }
    let others = || {
        gate.fanins
            .iter()
            .enumerate()
            .filter(move |&(k, _)| k != line)
            .map(|(_, &fanin)| gates[fanin].scoap)
    };
    let side_cost = match gate.kind {
        GateKind::And | GateKind::Nand => others().map(|s| s.cc1).fold(0, add),
        GateKind::Or | GateKind::Nor => others().map(|s| s.cc0).fold(0, add),
        GateKind::Xor | GateKind::Xnor => others().map(|s| s.cc0.min(s.cc1)).fold(0, add),
        GateKind::Mux => {
            let [d0, d1, s] = [0, 1, 2].map(|k| gates[gate.fanins[k]].scoap);
            match line {
                0 => s.cc0,
                1 => s.cc1,
                _ => add(d0.cc0, d1.cc1).min(add(d0.cc1, d1.cc0)),
            }
        }
        _ => 0,
    };
    add(add(co, side_cost), 1)
}

/// Computes SCOAP measures for every gate of a levelized gate array.
pub(crate) fn compute_scoap(gates: &mut IdVec<GateId, Gate>) {
    let ids: Vec<GateId> = gates.keys().iter().collect();

    for &id in &ids {
        let fanin_scoap: Vec<Scoap> = gates[id].fanins.iter().map(|&f| gates[f].scoap).collect();
        let gate = &gates[id];
        let (cc0, cc1) = controllability(gate.kind, &fanin_scoap, gate.constraint);
        let scoap = &mut gates[id].scoap;
        scoap.cc0 = cc0;
        scoap.cc1 = cc1;
        scoap.co = UNREACHABLE;
    }

    for &id in ids.iter().rev() {
        if gates[id].kind.is_output() {
            gates[id].scoap.co = 0;
        }
        for line in 0..gates[id].fanins.len() {
            let observability = input_observability(gates, &gates[id], line);
            let fanin = gates[id].fanins[line];
            let fanin_co = &mut gates[fanin].scoap.co;
            *fanin_co = (*fanin_co).min(observability);
        }
    }
}
