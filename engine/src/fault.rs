//! Single stuck-at faults and their detection state.
use std::{collections::VecDeque, fmt};

use atpg_circuit::{Circuit, GateId};
use atpg_ids::{define_id, IdRange, IdVec};

define_id! {
    /// Index of a fault in a [`FaultStore`].
    pub struct FaultId;
}

/// The line of a gate a fault sits on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FaultLine {
    /// The gate's output.
    Output,
    /// The fanin line at the given position.
    Input(usize),
}

impl FaultLine {
    /// Converts from the numbering where 0 is the output and `k` the `k`-th fanin.
    pub fn from_number(number: usize) -> Self {
        match number {
            0 => FaultLine::Output,
            k => FaultLine::Input(k - 1),
        }
    }

    /// Converts to the numbering where 0 is the output and `k` the `k`-th fanin.
    pub fn number(self) -> usize {
        match self {
            FaultLine::Output => 0,
            FaultLine::Input(k) => k + 1,
        }
    }
}

/// Detection state of a fault.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum FaultState {
    /// Not yet processed.
    #[default]
    NotProcessed,
    /// Queued for processing, no detecting pattern known yet.
    Undetected,
    /// Detected by at least one pattern.
    Detected,
    /// Targeted by compression within the current pattern, awaiting confirmation by fault
    /// simulation of the finalized pattern.
    DroppedByCompression,
    /// The search gave up on this fault.
    Aborted,
    /// Proven to have no detecting pattern.
    Untestable,
}

impl FaultState {
    /// Two letter code used in reports.
    pub fn code(self) -> &'static str {
        match self {
            FaultState::NotProcessed => "NA",
            FaultState::Undetected => "UD",
            FaultState::Detected => "DT",
            FaultState::DroppedByCompression => "DC",
            FaultState::Aborted => "AB",
            FaultState::Untestable => "AU",
        }
    }

    /// All states in report order.
    pub const ALL: [FaultState; 6] = [
        FaultState::NotProcessed,
        FaultState::Undetected,
        FaultState::Detected,
        FaultState::DroppedByCompression,
        FaultState::Aborted,
        FaultState::Untestable,
    ];
}

impl fmt::Display for FaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single stuck-at fault.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Fault {
    /// The gate the fault belongs to.
    pub gate: GateId,
    /// The faulty line of that gate.
    pub line: FaultLine,
    /// The value the line is stuck at.
    pub stuck: bool,
    /// Current detection state.
    pub state: FaultState,
    /// Number of applied patterns that detected this fault.
    pub detections: u32,
}

impl Fault {
    /// A fault that was not processed yet.
    pub fn new(gate: GateId, line: FaultLine, stuck: bool) -> Self {
        Self {
            gate,
            line,
            stuck,
            state: FaultState::NotProcessed,
            detections: 0,
        }
    }

    /// The gate whose value has to be the opposite of the stuck value to activate the fault.
    ///
    /// This is the faulty gate itself for output faults and the driver of the faulty line for
    /// input faults.
    pub fn activation_gate(&self, circuit: &Circuit) -> GateId {
        match self.line {
            FaultLine::Output => self.gate,
            FaultLine::Input(k) => circuit.gate(self.gate).fanins[k],
        }
    }

    /// Returns whether the fault is at fanin `line` of `gate`.
    pub fn is_on_input(&self, gate: GateId, line: usize) -> bool {
        self.gate == gate && self.line == FaultLine::Input(line)
    }

    /// Formats the fault using gate names.
    pub fn describe<'a>(&'a self, circuit: &'a Circuit) -> impl fmt::Display + 'a {
        DescribeFault {
            fault: self,
            circuit,
        }
    }
}

struct DescribeFault<'a> {
    fault: &'a Fault,
    circuit: &'a Circuit,
}

impl fmt::Display for DescribeFault<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gate = self.circuit.gate(self.fault.gate);
        match self.fault.line {
            FaultLine::Output => write!(f, "{}", gate.name)?,
            FaultLine::Input(k) => {
                let driver = self.circuit.gate(gate.fanins[k]);
                write!(f, "{}->{}", driver.name, gate.name)?
            }
        }
        write!(f, " SA{}", self.fault.stuck as u8)
    }
}

/// Owns all faults of a run, other components refer to them by [`FaultId`].
#[derive(Clone, Default, Debug)]
pub struct FaultStore {
    faults: IdVec<FaultId, Fault>,
}

impl FaultStore {
    /// Adds a fault.
    pub fn push(&mut self, fault: Fault) -> FaultId {
        self.faults.push(fault)
    }

    /// The uncollapsed single stuck-at fault list.
    ///
    /// Contains both polarities for the output of every gate that is not an output and for every
    /// fanin line driven by a gate with more than one fanout.
    pub fn all_stuck_at(circuit: &Circuit) -> Self {
        let mut store = Self::default();
        for (id, gate) in circuit.gates().iter() {
            if !gate.kind.is_output() {
                for stuck in [false, true] {
                    store.push(Fault::new(id, FaultLine::Output, stuck));
                }
            }
            for (k, &fanin) in gate.fanins.iter().enumerate() {
                if circuit.gate(fanin).fanouts.len() > 1 {
                    for stuck in [false, true] {
                        store.push(Fault::new(id, FaultLine::Input(k), stuck));
                    }
                }
            }
        }
        store
    }

    /// Number of faults.
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    /// Returns `true` when there are no faults.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Ids of all faults.
    pub fn ids(&self) -> IdRange<FaultId> {
        self.faults.keys()
    }

    /// Iterates over all faults.
    pub fn iter(&self) -> impl Iterator<Item = (FaultId, &Fault)> + '_ {
        self.faults.iter()
    }

    /// Moves every unprocessed fault to [`FaultState::Undetected`] and returns them in order as
    /// the active fault list.
    pub fn activate(&mut self) -> VecDeque<FaultId> {
        let mut list = VecDeque::with_capacity(self.len());
        for (id, fault) in self.faults.iter_mut() {
            if fault.state == FaultState::NotProcessed {
                fault.state = FaultState::Undetected;
                list.push_back(id);
            }
        }
        list
    }

    /// Number of faults in the given state.
    pub fn count(&self, state: FaultState) -> usize {
        self.faults.values().iter().filter(|f| f.state == state).count()
    }

    /// Faults detected so far.
    pub fn detected(&self) -> impl Iterator<Item = FaultId> + '_ {
        self.faults
            .iter()
            .filter(|(_, fault)| fault.state == FaultState::Detected)
            .map(|(id, _)| id)
    }
}

impl std::ops::Index<FaultId> for FaultStore {
    type Output = Fault;

    fn index(&self, index: FaultId) -> &Self::Output {
        &self.faults[index]
    }
}

impl std::ops::IndexMut<FaultId> for FaultStore {
    fn index_mut(&mut self, index: FaultId) -> &mut Self::Output {
        &mut self.faults[index]
    }
}

#[cfg(test)]
mod tests {
    use atpg_circuit::{CircuitBuilder, GateKind};

    use super::*;

    fn fanout_circuit() -> Circuit {
        let mut builder = CircuitBuilder::default();
        let a = builder.input("a");
        let b = builder.input("b");
        let g = builder.gate("g", GateKind::And, [a, b]);
        let h = builder.gate("h", GateKind::Or, [a, g]);
        builder.output("o1", g);
        builder.output("o2", h);
        builder.build().unwrap()
    }

    #[test]
    fn stuck_at_list_includes_branches() {
        let circuit = fanout_circuit();
        let store = FaultStore::all_stuck_at(&circuit);

        // outputs of a, b, g, h and the branches of the stems a and g
        let outputs = store
            .iter()
            .filter(|(_, f)| f.line == FaultLine::Output)
            .count();
        assert_eq!(outputs, 8);
        assert_eq!(store.len(), 8 + 2 * 4);

        let g = circuit.gate_by_name("g").unwrap();
        let a = circuit.gate_by_name("a").unwrap();
        let branch = store
            .iter()
            .find(|(_, f)| f.gate == g && f.line == FaultLine::Input(0))
            .unwrap()
            .1;
        assert_eq!(branch.activation_gate(&circuit), a);
        assert_eq!(branch.describe(&circuit).to_string(), "a->g SA0");
    }

    #[test]
    fn activation_moves_to_undetected() {
        let circuit = fanout_circuit();
        let mut store = FaultStore::all_stuck_at(&circuit);
        let list = store.activate();
        assert_eq!(list.len(), store.len());
        assert_eq!(store.count(FaultState::Undetected), store.len());
        assert!(store.activate().is_empty());
    }

    #[test]
    fn line_numbering() {
        assert_eq!(FaultLine::from_number(0), FaultLine::Output);
        assert_eq!(FaultLine::from_number(2), FaultLine::Input(1));
        assert_eq!(FaultLine::Input(1).number(), 2);
    }
}
