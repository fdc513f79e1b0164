//! Bit-parallel single fault propagation.
//!
//! The good circuit is simulated once per pattern. Faults are then simulated in batches of
//! [`LANES`], each fault in its own bit lane. Only the fanout cones of the injected faults are
//! re-evaluated, and every gate touched by a batch is restored to its good value afterwards.
use std::collections::VecDeque;

use atpg_circuit::{
    logic::{
        self,
        para::{lane_mask, set_lanes, WordVec, LANES},
    },
    Circuit, GateId, Logic, ParaValue, Value,
};
use atpg_ids::IdVec;
use zwohash::HashMap;

use crate::{
    fault::{FaultId, FaultLine, FaultState, FaultStore},
    pattern::Pattern,
};

#[derive(Clone, Copy, Debug)]
struct Injection {
    line: FaultLine,
    lanes: WordVec,
    stuck: bool,
}

/// Parallel pattern single fault propagation simulator.
pub struct FaultSim {
    good: IdVec<GateId, ParaValue>,
    faulty: IdVec<GateId, ParaValue>,
    queues: Vec<Vec<GateId>>,
    queued: IdVec<GateId, bool>,
    touched: Vec<GateId>,
    is_touched: IdVec<GateId, bool>,
    injections: HashMap<GateId, Vec<Injection>>,
}

impl FaultSim {
    /// Creates a simulator for the given circuit.
    pub fn new(circuit: &Circuit) -> Self {
        Self {
            good: IdVec::repeat(ParaValue::unknown(), circuit.len()),
            faulty: IdVec::repeat(ParaValue::unknown(), circuit.len()),
            queues: vec![vec![]; circuit.level_count() as usize],
            queued: IdVec::repeat(false, circuit.len()),
            touched: vec![],
            is_touched: IdVec::repeat(false, circuit.len()),
            injections: HashMap::default(),
        }
    }

    /// Simulates the fault free circuit for the inputs of a pattern.
    pub fn simulate_good(&mut self, circuit: &Circuit, pattern: &Pattern) {
        for (gate, &value) in circuit.inputs().into_iter().zip(pattern.inputs()) {
            self.good[gate] = ParaValue::splat(value);
        }
        for (gate, node) in circuit.gates().iter() {
            if !node.kind.is_input() {
                self.good[gate] = logic::eval(node.kind, node.fanins.iter().map(|&f| self.good[f]));
            }
        }
        self.faulty.values_mut().copy_from_slice(self.good.values());
    }

    /// Good value of a gate after [`simulate_good`][Self::simulate_good].
    pub fn good_value(&self, gate: GateId) -> Value {
        Value::from_option(self.good[gate].lane(0))
    }

    /// Good values of the primary and pseudo primary outputs.
    pub fn output_values(&self, circuit: &Circuit) -> (Vec<Value>, Vec<Value>) {
        let values = |outputs: &[GateId]| outputs.iter().map(|&o| self.good_value(o)).collect();
        (
            values(circuit.primary_outputs()),
            values(circuit.pseudo_outputs()),
        )
    }

    /// Simulates all faults of the active list against a pattern.
    ///
    /// Detected faults move to [`FaultState::Detected`] and are removed from the list. Returns the
    /// number of newly detected faults.
    pub fn simulate(
        &mut self,
        circuit: &Circuit,
        pattern: &Pattern,
        faults: &mut FaultStore,
        list: &mut VecDeque<FaultId>,
    ) -> usize {
        self.simulate_good(circuit, pattern);

        // only activated faults with a path to an output can be detected
        let candidates: Vec<FaultId> = list
            .iter()
            .copied()
            .filter(|&id| {
                let fault = &faults[id];
                let activation = fault.activation_gate(circuit);
                self.good[activation].lane(0) == Some(!fault.stuck)
                    && circuit.is_observable(fault.gate)
            })
            .collect();

        let mut detected = vec![];
        for batch in candidates.chunks(LANES) {
            self.simulate_batch(circuit, faults, batch, &mut detected);
        }

        for &id in &detected {
            let fault = &mut faults[id];
            fault.state = FaultState::Detected;
            fault.detections += 1;
        }
        list.retain(|&id| faults[id].state != FaultState::Detected);

        log::trace!(
            "fault simulation: {} candidates, {} detected, {} left",
            candidates.len(),
            detected.len(),
            list.len()
        );

        detected.len()
    }

    fn simulate_batch(
        &mut self,
        circuit: &Circuit,
        faults: &FaultStore,
        batch: &[FaultId],
        detected: &mut Vec<FaultId>,
    ) {
        self.injections.clear();
        for (lane, &id) in batch.iter().enumerate() {
            let fault = &faults[id];
            self.injections
                .entry(fault.gate)
                .or_default()
                .push(Injection {
                    line: fault.line,
                    lanes: lane_mask(lane),
                    stuck: fault.stuck,
                });
        }

        let sites: Vec<GateId> = self.injections.keys().copied().collect();
        let mut first_level = self.queues.len();
        for gate in sites {
            first_level = first_level.min(circuit.gate(gate).level as usize);
            self.enqueue(circuit, gate);
        }

        for level in first_level..self.queues.len() {
            while let Some(gate) = self.queues[level].pop() {
                self.queued[gate] = false;
                let value = self.evaluate_faulty(circuit, gate);
                if value != self.faulty[gate] {
                    self.faulty[gate] = value;
                    if !self.is_touched[gate] {
                        self.is_touched[gate] = true;
                        self.touched.push(gate);
                    }
                    for &fanout in &circuit.gate(gate).fanouts {
                        self.enqueue(circuit, fanout);
                    }
                }
            }
        }

        let mut detected_lanes = WordVec::ZERO;
        for gate in self.touched.drain(..) {
            if circuit.gate(gate).kind.is_output() {
                detected_lanes = detected_lanes | self.good[gate].differs(self.faulty[gate]);
            }
            self.faulty[gate] = self.good[gate];
            self.is_touched[gate] = false;
        }
        detected.extend(set_lanes(detected_lanes).map(|lane| batch[lane]));
    }

    fn enqueue(&mut self, circuit: &Circuit, gate: GateId) {
        if !self.queued[gate] {
            self.queued[gate] = true;
            self.queues[circuit.gate(gate).level as usize].push(gate);
        }
    }

    fn evaluate_faulty(&self, circuit: &Circuit, gate: GateId) -> ParaValue {
        let node = circuit.gate(gate);
        let injections = self.injections.get(&gate).map_or(&[][..], Vec::as_slice);

        let value = if node.kind.is_input() {
            self.good[gate]
        } else {
            logic::eval(
                node.kind,
                node.fanins.iter().enumerate().map(|(line, &fanin)| {
                    injections
                        .iter()
                        .filter(|injection| injection.line == FaultLine::Input(line))
                        .fold(self.faulty[fanin], |value, injection| {
                            value.force(injection.lanes, injection.stuck)
                        })
                }),
            )
        };

        injections
            .iter()
            .filter(|injection| injection.line == FaultLine::Output)
            .fold(value, |value, injection| {
                value.force(injection.lanes, injection.stuck)
            })
    }
}
