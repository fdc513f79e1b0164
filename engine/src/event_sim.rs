//! Five-valued good circuit simulation with event-driven incremental updates.
//!
//! The simulator owns the current value and the snapshot value of every gate. While a target
//! fault is injected, evaluation composes the faulty line with its stuck value, so that the fault
//! effect shows up as [`Value::D`] or [`Value::B`].
use atpg_circuit::{logic, Circuit, GateId, Value};
use atpg_ids::{Id, IdVec};

use crate::{
    error::InvariantViolation,
    fault::{Fault, FaultLine},
};

/// A fault injected into the scalar simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FaultSite {
    /// The faulty gate.
    pub gate: GateId,
    /// The faulty line of that gate.
    pub line: FaultLine,
    /// The stuck value.
    pub stuck: bool,
}

impl From<&Fault> for FaultSite {
    fn from(fault: &Fault) -> Self {
        Self {
            gate: fault.gate,
            line: fault.line,
            stuck: fault.stuck,
        }
    }
}

/// Scalar simulator state for a single circuit.
pub struct EventSim {
    values: IdVec<GateId, Value>,
    snapshot: IdVec<GateId, Value>,
    queues: Vec<Vec<GateId>>,
    queued: IdVec<GateId, bool>,
    fault: Option<FaultSite>,
}

impl EventSim {
    /// Creates a simulator with every gate at [`Value::X`].
    pub fn new(circuit: &Circuit) -> Self {
        Self {
            values: IdVec::repeat(Value::X, circuit.len()),
            snapshot: IdVec::repeat(Value::X, circuit.len()),
            queues: vec![vec![]; circuit.level_count() as usize],
            queued: IdVec::repeat(false, circuit.len()),
            fault: None,
        }
    }

    /// Current value of a gate.
    pub fn value(&self, gate: GateId) -> Value {
        self.values[gate]
    }

    /// Current values of all gates.
    pub fn values(&self) -> &IdVec<GateId, Value> {
        &self.values
    }

    /// Snapshot value of a gate.
    pub fn snapshot_value(&self, gate: GateId) -> Value {
        self.snapshot[gate]
    }

    /// The currently injected fault.
    pub fn fault(&self) -> Option<FaultSite> {
        self.fault
    }

    /// Injects a fault into subsequent evaluations, or removes it.
    pub fn set_fault(&mut self, fault: Option<FaultSite>) {
        self.fault = fault;
    }

    /// The value gate `gate` sees on fanin line `line`.
    pub fn input_value(&self, circuit: &Circuit, gate: GateId, line: usize) -> Value {
        let value = self.values[circuit.gate(gate).fanins[line]];
        match self.fault {
            Some(site) if site.gate == gate && site.line == FaultLine::Input(line) => {
                value.with_stuck_at(site.stuck)
            }
            _ => value,
        }
    }

    fn inject_output(&self, gate: GateId, value: Value) -> Value {
        match self.fault {
            Some(site) if site.gate == gate && site.line == FaultLine::Output => {
                value.with_stuck_at(site.stuck)
            }
            _ => value,
        }
    }

    /// Evaluates a gate from the current values of its fanins.
    ///
    /// Inputs keep the good part of their current value.
    pub fn evaluate(&self, circuit: &Circuit, gate: GateId) -> Value {
        let node = circuit.gate(gate);
        let good = if node.kind.is_input() {
            self.values[gate].without_fault_effect()
        } else {
            logic::eval(
                node.kind,
                (0..node.fanins.len()).map(|line| self.input_value(circuit, gate, line)),
            )
        };
        self.inject_output(gate, good)
    }

    /// Assigns an input without propagating the change.
    pub fn assign_input(&mut self, gate: GateId, value: Value) {
        self.values[gate] = self.inject_output(gate, value);
    }

    /// Evaluates every gate once in level order.
    pub fn simulate_full(&mut self, circuit: &Circuit) {
        for gate in circuit.gates().keys() {
            self.values[gate] = self.evaluate(circuit, gate);
        }
    }

    /// Empties the event queues and checks that no gate is left marked as queued.
    fn clear_events(&mut self) -> Result<(), InvariantViolation> {
        for queue in &mut self.queues {
            for gate in queue.drain(..) {
                self.queued[gate] = false;
            }
        }
        if let Some(index) = self.queued.values().iter().position(|&queued| queued) {
            self.queued.fill(false);
            return Err(InvariantViolation::StaleEventMarker {
                gate: GateId::from_id_index(index),
            });
        }
        Ok(())
    }

    fn enqueue_fanouts(&mut self, circuit: &Circuit, gate: GateId) {
        for &fanout in &circuit.gate(gate).fanouts {
            if !self.queued[fanout] {
                self.queued[fanout] = true;
                self.queues[circuit.gate(fanout).level as usize].push(fanout);
            }
        }
    }

    /// Sets the value of a gate directly and propagates the change through its fanout cone in
    /// level order.
    ///
    /// For inputs the value is composed with an injected output fault. Other gates take `value`
    /// as is, which allows forcing internal gates to [`Value::X`].
    pub fn set_value_and_imply(
        &mut self,
        circuit: &Circuit,
        gate: GateId,
        value: Value,
    ) -> Result<(), InvariantViolation> {
        self.clear_events()?;

        self.values[gate] = if circuit.gate(gate).kind.is_input() {
            self.inject_output(gate, value)
        } else {
            value
        };
        self.enqueue_fanouts(circuit, gate);

        for level in circuit.gate(gate).level as usize..self.queues.len() {
            // fanouts always have a larger level, so this queue cannot grow while drained
            while let Some(current) = self.queues[level].pop() {
                self.queued[current] = false;
                let new_value = self.evaluate(circuit, current);
                if new_value != self.values[current] {
                    self.values[current] = new_value;
                    self.enqueue_fanouts(circuit, current);
                }
            }
        }

        Ok(())
    }

    /// Replaces every fault effect by its good value and re-simulates the whole circuit without
    /// the injected fault.
    pub fn clear_fault_effects(&mut self, circuit: &Circuit) {
        self.fault = None;
        for gate in circuit.inputs() {
            self.values[gate] = self.values[gate].without_fault_effect();
        }
        self.simulate_full(circuit);
    }

    /// Resets every snapshot value to [`Value::X`].
    pub fn reset_snapshot(&mut self) {
        self.snapshot.fill(Value::X);
    }

    /// Copies the current values into the snapshot.
    ///
    /// Returns the number of gates whose snapshot was assigned and differs from the current
    /// value.
    pub fn store_snapshot(&mut self) -> usize {
        let mut changed = 0;
        for (snapshot, &value) in self.snapshot.values_mut().iter_mut().zip(self.values.values()) {
            if *snapshot != Value::X && *snapshot != value {
                changed += 1;
            }
            *snapshot = value;
        }
        changed
    }

    /// Like [`store_snapshot`][Self::store_snapshot] but fails when an assigned value changed.
    pub fn store_stable_snapshot(&mut self) -> Result<(), InvariantViolation> {
        match self.store_snapshot() {
            0 => Ok(()),
            count => Err(InvariantViolation::SnapshotChanged { count }),
        }
    }

    /// Restores every gate value from the snapshot.
    pub fn restore_snapshot(&mut self) {
        self.values.values_mut().copy_from_slice(self.snapshot.values());
    }

    /// Assigns all inputs from the given values in input order and simulates the circuit.
    pub fn apply_inputs(&mut self, circuit: &Circuit, inputs: impl IntoIterator<Item = Value>) {
        for (gate, value) in circuit.inputs().into_iter().zip(inputs) {
            self.assign_input(gate, value);
        }
        self.simulate_full(circuit);
    }

    #[cfg(test)]
    pub(crate) fn mark_queued(&mut self, gate: GateId) {
        self.queued[gate] = true;
    }
}
