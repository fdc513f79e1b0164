//! Search for paths of unassigned gates to an output.
use atpg_circuit::{Circuit, GateId, Value};
use atpg_ids::IdVec;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Status {
    Unknown,
    Visited,
}

/// Reusable state for X-path checks.
///
/// An X-path from a gate is a fanout path on which every gate, including the start and the
/// reached output, has the value [`Value::X`]. Its existence means a fault effect at the start can
/// still be propagated without contradicting the assigned values.
pub struct XPath {
    status: IdVec<GateId, Status>,
    visited: Vec<GateId>,
    stack: Vec<GateId>,
}

impl XPath {
    /// Creates the search state for a circuit.
    pub fn new(circuit: &Circuit) -> Self {
        Self {
            status: IdVec::repeat(Status::Unknown, circuit.len()),
            visited: vec![],
            stack: vec![],
        }
    }

    /// Returns whether an X-path leads from `start` to a primary or pseudo primary output.
    pub fn exists(
        &mut self,
        circuit: &Circuit,
        values: &IdVec<GateId, Value>,
        start: GateId,
    ) -> bool {
        for gate in self.visited.drain(..) {
            self.status[gate] = Status::Unknown;
        }
        self.stack.clear();

        if values[start] != Value::X {
            return false;
        }
        self.stack.push(start);
        while let Some(gate) = self.stack.pop() {
            if self.status[gate] == Status::Visited {
                continue;
            }
            self.status[gate] = Status::Visited;
            self.visited.push(gate);

            if circuit.gate(gate).kind.is_output() {
                return true;
            }
            for &fanout in &circuit.gate(gate).fanouts {
                if values[fanout] == Value::X && self.status[fanout] == Status::Unknown {
                    self.stack.push(fanout);
                }
            }
        }
        false
    }
}
