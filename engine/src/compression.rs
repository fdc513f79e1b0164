//! Dynamic test compression.
//!
//! After a test for the head fault was found, the inputs it left unassigned are used to target
//! further faults of the active list within the same pattern. Every secondary test keeps all
//! previously assigned inputs, so the detections already fixed in the pattern are preserved.
use atpg_circuit::Value;

use crate::{
    atpg::Atpg,
    error::InvariantViolation,
    fault::{FaultId, FaultState},
    generation::{Generation, Mode},
    pattern::Pattern,
};

impl Atpg<'_> {
    /// Extends `pattern`, the test for `target` currently held by the event simulator, with tests
    /// for further active faults.
    ///
    /// The event simulator's snapshot must hold the fault free values of the pattern. Returns the
    /// faults targeted in addition to `target`, they are left in
    /// [`FaultState::DroppedByCompression`] until the finalized pattern is fault simulated.
    pub(crate) fn compress(
        &mut self,
        target: FaultId,
        pattern: &mut Pattern,
    ) -> Result<Vec<FaultId>, InvariantViolation> {
        let circuit = self.circuit;
        let candidates: Vec<FaultId> = self.list.iter().copied().collect();

        // drops everything the partial pattern already detects
        self.fault_sim
            .simulate(circuit, pattern, &mut self.faults, &mut self.list);

        let mut secondary = vec![];
        for id in candidates {
            if id == target || self.faults[id].state == FaultState::Detected {
                continue;
            }
            let fault = self.faults[id].clone();
            let activation = fault.activation_gate(circuit);
            let current = self.sim.value(activation);
            if current.good() == Some(fault.stuck) {
                continue;
            }
            if current.is_assigned() {
                self.sim.set_value_and_imply(circuit, activation, Value::X)?;
            }

            if !self.xpath.exists(circuit, self.sim.values(), activation) {
                let restored = self.sim.snapshot_value(activation);
                self.sim.set_value_and_imply(circuit, activation, restored)?;
                continue;
            }

            let result =
                self.generator
                    .generate(circuit, &mut self.sim, &fault, Mode::Compression)?;
            if result == Generation::TestFound {
                self.sim.clear_fault_effects(circuit);
                self.sim.store_stable_snapshot()?;
                pattern.set_inputs(
                    circuit,
                    circuit.inputs().iter().map(|input| self.sim.value(input)),
                );
                self.faults[id].state = FaultState::DroppedByCompression;
                secondary.push(id);
            } else {
                self.sim.restore_snapshot();
            }
        }

        self.sim.clear_fault_effects(circuit);
        self.sim.store_stable_snapshot()?;
        pattern.set_inputs(
            circuit,
            circuit.inputs().iter().map(|input| self.sim.value(input)),
        );

        log::trace!(
            "compression: {} secondary faults, {} inputs unassigned",
            secondary.len(),
            pattern.unassigned_inputs()
        );
        Ok(secondary)
    }
}

#[cfg(test)]
mod tests {
    use atpg_circuit::{Circuit, CircuitBuilder, GateKind};

    use super::*;
    use crate::{
        fault::{Fault, FaultLine, FaultStore},
        options::AtpgOptions,
    };

    /// Two independent AND gates, a test for one leaves the inputs of the other unassigned.
    fn two_and_circuit() -> Circuit {
        let mut builder = CircuitBuilder::default();
        let a = builder.input("a");
        let b = builder.input("b");
        let c = builder.input("c");
        let d = builder.input("d");
        let g = builder.gate("g", GateKind::And, [a, b]);
        let h = builder.gate("h", GateKind::And, [c, d]);
        builder.output("og", g);
        builder.output("oh", h);
        builder.build().unwrap()
    }

    fn output_fault(circuit: &Circuit, faults: &mut FaultStore, name: &str, stuck: bool) -> FaultId {
        let gate = circuit.gate_by_name(name).unwrap();
        faults.push(Fault::new(gate, FaultLine::Output, stuck))
    }

    #[test]
    fn one_pattern_for_independent_faults() {
        atpg_logger::test_setup("trace");
        let circuit = two_and_circuit();
        let mut faults = FaultStore::default();
        let g = output_fault(&circuit, &mut faults, "g", false);
        let h = output_fault(&circuit, &mut faults, "h", false);

        let mut atpg = Atpg::new(&circuit, faults.clone(), AtpgOptions::default());
        atpg.run().unwrap();
        assert_eq!(atpg.patterns().len(), 1);
        assert_eq!(atpg.faults()[g].state, FaultState::Detected);
        assert_eq!(atpg.faults()[h].state, FaultState::Detected);
        assert_eq!(
            atpg.patterns().patterns[0].primary_inputs,
            [Value::One; 4]
        );

        let options = AtpgOptions {
            dynamic_compression: false,
            ..AtpgOptions::default()
        };
        let mut atpg = Atpg::new(&circuit, faults, options);
        atpg.run().unwrap();
        assert_eq!(atpg.patterns().len(), 2);
    }

    #[test]
    fn conflicting_faults_need_separate_patterns() {
        let circuit = two_and_circuit();
        let mut faults = FaultStore::default();
        let sa0 = output_fault(&circuit, &mut faults, "g", false);
        let sa1 = output_fault(&circuit, &mut faults, "g", true);

        let mut atpg = Atpg::new(&circuit, faults, AtpgOptions::default());
        atpg.run().unwrap();
        assert_eq!(atpg.patterns().len(), 2);
        assert_eq!(atpg.faults()[sa0].state, FaultState::Detected);
        assert_eq!(atpg.faults()[sa1].state, FaultState::Detected);
        assert!(atpg.active().is_empty());
    }

    #[test]
    fn secondary_tests_keep_assigned_inputs() {
        let circuit = two_and_circuit();
        let mut faults = FaultStore::default();
        let g = output_fault(&circuit, &mut faults, "g", false);
        let h = output_fault(&circuit, &mut faults, "h", true);

        let mut atpg = Atpg::new(&circuit, faults, AtpgOptions::default());
        assert_eq!(atpg.step().unwrap(), Some(Generation::TestFound));
        let pattern = &atpg.patterns().patterns[0];
        assert_eq!(&pattern.primary_inputs[..2], [Value::One, Value::One]);
        // one of c and d is 0, the other is left unassigned
        assert_eq!(pattern.unassigned_inputs(), 1);
        assert!(pattern.primary_inputs[2..].contains(&Value::Zero));
        assert_eq!(pattern.primary_outputs, [Value::One, Value::Zero]);
        assert_eq!(atpg.faults()[g].state, FaultState::Detected);
        assert_eq!(atpg.faults()[h].state, FaultState::Detected);
        assert!(atpg.is_done());
    }
}
