//! Path oriented decision making test generation for a single stuck-at fault.
//!
//! Decisions are only made on primary and pseudo primary inputs. Each decision is propagated with
//! [`EventSim::set_value_and_imply`], objectives derived from the current values are traced back
//! to an unassigned input guided by the SCOAP measures, and conflicts are resolved by
//! chronological backtracking.
use atpg_circuit::{Circuit, GateId, GateKind, Value};

use crate::{
    error::InvariantViolation,
    event_sim::{EventSim, FaultSite},
    fault::Fault,
    xpath::XPath,
};

/// Result of a test generation attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Generation {
    /// The current input assignment propagates a fault effect to an output.
    TestFound,
    /// The search space is exhausted, no test exists under the fixed assignments.
    Untestable,
    /// The backtrack limit was exceeded.
    Aborted,
}

/// Which inputs the generator may change.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Start from all unconstrained inputs unknown.
    Primary,
    /// Keep every input that is already assigned and only decide the unknown ones.
    Compression,
}

#[derive(Clone, Copy, Debug)]
struct Decision {
    input: GateId,
    value: bool,
    flipped: bool,
}

enum Status {
    Detected,
    Conflict,
    Objectives(Vec<(GateId, bool)>),
}

/// Test generator with reusable search state.
pub struct PatternGenerator {
    backtrack_limit: usize,
    decisions: Vec<Decision>,
    xpath: XPath,
    frontier: Vec<GateId>,
}

impl PatternGenerator {
    /// Creates a generator for a circuit.
    pub fn new(circuit: &Circuit, backtrack_limit: usize) -> Self {
        Self {
            backtrack_limit,
            decisions: vec![],
            xpath: XPath::new(circuit),
            frontier: vec![],
        }
    }

    /// Searches for an input assignment detecting `fault`.
    ///
    /// On return the fault is no longer injected into `sim`, but the gate values still include
    /// its fault effects. When a test was found, the inputs of `sim` hold it.
    pub fn generate(
        &mut self,
        circuit: &Circuit,
        sim: &mut EventSim,
        fault: &Fault,
        mode: Mode,
    ) -> Result<Generation, InvariantViolation> {
        let result = self.search(circuit, sim, fault, mode);
        sim.set_fault(None);
        if let Ok(generation) = &result {
            log::trace!("{}: {generation:?}", fault.describe(circuit));
        }
        result
    }

    fn search(
        &mut self,
        circuit: &Circuit,
        sim: &mut EventSim,
        fault: &Fault,
        mode: Mode,
    ) -> Result<Generation, InvariantViolation> {
        let activation = fault.activation_gate(circuit);
        if !circuit.is_observable(fault.gate) || !can_activate(circuit, activation, fault.stuck) {
            return Ok(Generation::Untestable);
        }

        sim.set_fault(Some(FaultSite::from(fault)));
        for input in circuit.inputs() {
            let value = match (circuit.gate(input).constraint, mode) {
                (Some(constraint), _) => Value::from_bool(constraint),
                (None, Mode::Primary) => Value::X,
                (None, Mode::Compression) => sim.value(input).without_fault_effect(),
            };
            sim.assign_input(input, value);
        }
        sim.simulate_full(circuit);

        self.decisions.clear();
        let mut backtracks = 0;

        'search: loop {
            match self.status(circuit, sim, fault, activation) {
                Status::Detected => return Ok(Generation::TestFound),
                Status::Objectives(objectives) => {
                    for (gate, value) in objectives {
                        if let Some((input, value)) = backtrace(circuit, sim, gate, value) {
                            self.decisions.push(Decision {
                                input,
                                value,
                                flipped: false,
                            });
                            sim.set_value_and_imply(circuit, input, Value::from_bool(value))?;
                            continue 'search;
                        }
                    }
                }
                Status::Conflict => (),
            }

            // conflict or no objective can be justified
            loop {
                let Some(decision) = self.decisions.pop() else {
                    return Ok(Generation::Untestable);
                };
                if decision.flipped {
                    sim.set_value_and_imply(circuit, decision.input, Value::X)?;
                    continue;
                }
                backtracks += 1;
                if backtracks > self.backtrack_limit {
                    return Ok(Generation::Aborted);
                }
                let flipped = Decision {
                    value: !decision.value,
                    flipped: true,
                    ..decision
                };
                self.decisions.push(flipped);
                sim.set_value_and_imply(circuit, flipped.input, Value::from_bool(flipped.value))?;
                break;
            }
        }
    }

    fn status(
        &mut self,
        circuit: &Circuit,
        sim: &EventSim,
        fault: &Fault,
        activation: GateId,
    ) -> Status {
        if circuit.outputs().any(|output| sim.value(output).is_fault_effect()) {
            return Status::Detected;
        }

        match sim.value(activation).good() {
            Some(value) if value == fault.stuck => Status::Conflict,
            None => Status::Objectives(vec![(activation, !fault.stuck)]),
            Some(_) => {
                self.frontier.clear();
                for (gate, node) in circuit.gates().iter() {
                    if !node.kind.is_input()
                        && sim.value(gate) == Value::X
                        && (0..node.fanins.len())
                            .any(|line| sim.input_value(circuit, gate, line).is_fault_effect())
                    {
                        self.frontier.push(gate);
                    }
                }
                let xpath = &mut self.xpath;
                self.frontier
                    .retain(|&gate| xpath.exists(circuit, sim.values(), gate));
                self.frontier.sort_by_key(|&gate| circuit.depth_from_po(gate));

                let objectives: Vec<_> = self
                    .frontier
                    .iter()
                    .filter_map(|&gate| propagation_objective(circuit, sim, gate))
                    .collect();
                if objectives.is_empty() {
                    Status::Conflict
                } else {
                    Status::Objectives(objectives)
                }
            }
        }
    }
}

/// Returns `false` when the activation gate can never take the value opposite to `stuck`.
fn can_activate(circuit: &Circuit, activation: GateId, stuck: bool) -> bool {
    let node = circuit.gate(activation);
    match node.kind {
        GateKind::Tie0 => stuck,
        GateKind::Tie1 => !stuck,
        GateKind::TieX => false,
        _ => node.constraint != Some(stuck),
    }
}

/// An assignment to a fanin of a D-frontier gate that moves the fault effect through it.
fn propagation_objective(circuit: &Circuit, sim: &EventSim, gate: GateId) -> Option<(GateId, bool)> {
    let node = circuit.gate(gate);
    let inputs: Vec<Value> = (0..node.fanins.len())
        .map(|line| sim.input_value(circuit, gate, line))
        .collect();
    let unknown = || (0..inputs.len()).filter(|&line| inputs[line] == Value::X);
    let cost = |line: usize, value: bool| circuit.gate(node.fanins[line]).scoap.cc(value);

    match node.kind {
        GateKind::And | GateKind::Nand | GateKind::Or | GateKind::Nor => {
            let value = !node.kind.controlling_input()?;
            // all of them have to be set, fail early on the hardest one
            let line = unknown().max_by_key(|&line| cost(line, value))?;
            Some((node.fanins[line], value))
        }
        GateKind::Xor | GateKind::Xnor => {
            let line = unknown().next()?;
            let value = cost(line, true) < cost(line, false);
            Some((node.fanins[line], value))
        }
        GateKind::Mux => {
            let [d0, d1, select] = [inputs[0], inputs[1], inputs[2]];
            if select == Value::X {
                match (d0.is_fault_effect(), d1.is_fault_effect()) {
                    (true, _) => Some((node.fanins[2], false)),
                    (false, true) => Some((node.fanins[2], true)),
                    (false, false) => None,
                }
            } else if select.is_fault_effect() {
                // the good circuit reads one data input, the faulty circuit the other
                let (good_line, faulty_line) = if select == Value::D { (1, 0) } else { (0, 1) };
                match (inputs[good_line].good(), inputs[faulty_line].faulty()) {
                    (Some(value), None) => Some((node.fanins[faulty_line], !value)),
                    (None, Some(value)) => Some((node.fanins[good_line], !value)),
                    (None, None) => Some((
                        node.fanins[good_line],
                        cost(good_line, true) < cost(good_line, false),
                    )),
                    (Some(_), Some(_)) => None,
                }
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Traces an objective back to an unassigned input.
///
/// Returns `None` when the objective cannot be reached through unknown gates.
fn backtrace(
    circuit: &Circuit,
    sim: &EventSim,
    mut gate: GateId,
    mut value: bool,
) -> Option<(GateId, bool)> {
    loop {
        let node = circuit.gate(gate);
        if node.kind.is_input() {
            return (sim.value(gate) == Value::X && node.constraint.is_none())
                .then_some((gate, value));
        }

        let fanin_value = |line: usize| sim.value(node.fanins[line]);
        let cost = |line: usize, value: bool| circuit.gate(node.fanins[line]).scoap.cc(value);
        let unknown: Vec<usize> = (0..node.fanins.len())
            .filter(|&line| fanin_value(line) == Value::X)
            .collect();
        let base = value ^ node.kind.is_inverting();

        let (line, next) = match node.kind {
            GateKind::PrimaryOutput
            | GateKind::PseudoOutput
            | GateKind::Buf
            | GateKind::Inv => (*unknown.first()?, base),
            GateKind::And | GateKind::Nand | GateKind::Or | GateKind::Nor => {
                let controlling = node.kind.controlling_input()?;
                let line = if base == controlling {
                    unknown.iter().copied().min_by_key(|&line| cost(line, base))?
                } else {
                    unknown.iter().copied().max_by_key(|&line| cost(line, base))?
                };
                (line, base)
            }
            GateKind::Xor | GateKind::Xnor => {
                let line = unknown
                    .iter()
                    .copied()
                    .min_by_key(|&line| cost(line, false).min(cost(line, true)))?;
                // remaining unknown fanins are assumed to end up 0
                let parity = (0..node.fanins.len())
                    .filter_map(|line| fanin_value(line).good())
                    .fold(false, |acc, value| acc ^ value);
                (line, base ^ parity)
            }
            GateKind::Mux => match fanin_value(2).good() {
                Some(select) => {
                    let line = select as usize;
                    if fanin_value(line) == Value::X {
                        (line, base)
                    } else {
                        // a faulty select leaves the other data input to decide
                        (*unknown.first()?, base)
                    }
                }
                None => {
                    if fanin_value(0).good() == Some(base) {
                        (2, false)
                    } else if fanin_value(1).good() == Some(base) {
                        (2, true)
                    } else {
                        let through_d0 = cost(2, false).saturating_add(cost(0, base));
                        let through_d1 = cost(2, true).saturating_add(cost(1, base));
                        (2, through_d1 < through_d0)
                    }
                }
            },
            GateKind::PrimaryInput
            | GateKind::PseudoInput
            | GateKind::Tie0
            | GateKind::Tie1
            | GateKind::TieX => return None,
        };

        gate = node.fanins[line];
        value = next;
    }
}

#[cfg(test)]
mod tests {
    use atpg_circuit::CircuitBuilder;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::{
        fault::{FaultLine, FaultStore},
        testing::{and_circuit, random_circuit},
    };

    /// Checks a found test by simulating the fault with the generated input values.
    fn detects(circuit: &Circuit, fault: &Fault, inputs: &[Value]) -> bool {
        let mut sim = EventSim::new(circuit);
        sim.set_fault(Some(FaultSite::from(fault)));
        sim.apply_inputs(circuit, inputs.iter().copied());
        circuit.outputs().any(|output| sim.value(output).is_fault_effect())
    }

    fn input_values(circuit: &Circuit, sim: &EventSim) -> Vec<Value> {
        circuit
            .inputs()
            .iter()
            .map(|input| sim.value(input).without_fault_effect())
            .collect()
    }

    #[test]
    fn and_gate_output_stuck_at_zero() {
        atpg_logger::test_setup("trace");
        let circuit = and_circuit();
        let g = circuit.gate_by_name("G").unwrap();
        let fault = Fault::new(g, FaultLine::Output, false);

        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Primary)
            .unwrap();
        assert_eq!(result, Generation::TestFound);
        assert_eq!(input_values(&circuit, &sim), [Value::One, Value::One]);
        assert_eq!(sim.fault(), None);
    }

    #[test]
    fn and_gate_input_stuck_at_one() {
        let circuit = and_circuit();
        let a = circuit.gate_by_name("A").unwrap();
        let fault = Fault::new(a, FaultLine::Output, true);

        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Primary)
            .unwrap();
        assert_eq!(result, Generation::TestFound);
        assert_eq!(input_values(&circuit, &sim), [Value::Zero, Value::One]);
    }

    #[test]
    fn redundant_fault_is_untestable() {
        // o = a | (a & b), the AND output stuck at 0 is masked whenever it could be observed
        let mut builder = CircuitBuilder::default();
        let a = builder.input("a");
        let b = builder.input("b");
        let g = builder.gate("g", GateKind::And, [a, b]);
        let h = builder.gate("h", GateKind::Or, [a, g]);
        builder.output("o", h);
        let circuit = builder.build().unwrap();

        let g = circuit.gate_by_name("g").unwrap();
        let fault = Fault::new(g, FaultLine::Output, false);
        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Primary)
            .unwrap();
        assert_eq!(result, Generation::Untestable);
    }

    #[test]
    fn unobservable_and_constant_faults() {
        let mut builder = CircuitBuilder::default();
        let a = builder.input("a");
        let zero = builder.gate("zero", GateKind::Tie0, []);
        let g = builder.gate("g", GateKind::Or, [a, zero]);
        builder.output("o", g);
        builder.gate("dangling", GateKind::Inv, [a]);
        let circuit = builder.build().unwrap();

        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);
        let mut run = |name: &str, stuck| {
            let gate = circuit.gate_by_name(name).unwrap();
            let fault = Fault::new(gate, FaultLine::Output, stuck);
            generator
                .generate(&circuit, &mut sim, &fault, Mode::Primary)
                .unwrap()
        };
        assert_eq!(run("dangling", false), Generation::Untestable);
        assert_eq!(run("zero", false), Generation::Untestable);
        assert_eq!(run("zero", true), Generation::TestFound);
    }

    #[test]
    fn constrained_inputs_are_respected() {
        let mut builder = CircuitBuilder::default();
        let a = builder.input("a");
        let b = builder.input("b");
        builder.constrain(b, false);
        let g = builder.gate("g", GateKind::And, [a, b]);
        builder.output("o", g);
        let circuit = builder.build().unwrap();

        let g = circuit.gate_by_name("g").unwrap();
        let a = circuit.gate_by_name("a").unwrap();
        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);

        let fault = Fault::new(g, FaultLine::Output, false);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Primary)
            .unwrap();
        assert_eq!(result, Generation::Untestable);

        let fault = Fault::new(a, FaultLine::Output, true);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Primary)
            .unwrap();
        assert_eq!(result, Generation::Untestable);
    }

    #[test]
    fn compression_keeps_assigned_inputs() {
        let circuit = and_circuit();
        let a = circuit.gate_by_name("A").unwrap();
        let g = circuit.gate_by_name("G").unwrap();
        let mut sim = EventSim::new(&circuit);
        sim.apply_inputs(&circuit, [Value::Zero, Value::X]);

        let mut generator = PatternGenerator::new(&circuit, 10);
        // G SA0 needs A = 1, which is locked to 0
        let fault = Fault::new(g, FaultLine::Output, false);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Compression)
            .unwrap();
        assert_eq!(result, Generation::Untestable);

        sim.clear_fault_effects(&circuit);
        sim.apply_inputs(&circuit, [Value::Zero, Value::X]);
        let fault = Fault::new(a, FaultLine::Output, true);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Compression)
            .unwrap();
        assert_eq!(result, Generation::TestFound);
        assert_eq!(input_values(&circuit, &sim), [Value::Zero, Value::One]);
    }

    #[test]
    fn mux_select_steers_the_fault_effect() {
        let mut builder = CircuitBuilder::default();
        let d0 = builder.input("d0");
        let d1 = builder.input("d1");
        let s = builder.input("s");
        let m = builder.gate("m", GateKind::Mux, [d0, d1, s]);
        builder.output("o", m);
        let circuit = builder.build().unwrap();

        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);
        for name in ["d0", "d1", "s"] {
            for stuck in [false, true] {
                let gate = circuit.gate_by_name(name).unwrap();
                let fault = Fault::new(gate, FaultLine::Output, stuck);
                let result = generator
                    .generate(&circuit, &mut sim, &fault, Mode::Primary)
                    .unwrap();
                assert_eq!(result, Generation::TestFound, "{name} SA{}", stuck as u8);
                let inputs = input_values(&circuit, &sim);
                assert!(detects(&circuit, &fault, &inputs), "{name} SA{}", stuck as u8);
                sim.clear_fault_effects(&circuit);
            }
        }
    }

    #[test]
    fn fault_effect_on_mux_select() {
        // s and d0 share the stem a, the good circuit reads d1 while the faulty one reads d0
        let mut builder = CircuitBuilder::default();
        let a = builder.input("a");
        let b = builder.input("b");
        let c = builder.input("c");
        let d1 = builder.gate("d1", GateKind::And, [b, c]);
        let m = builder.gate("m", GateKind::Mux, [a, d1, a]);
        builder.output("o", m);
        let circuit = builder.build().unwrap();

        let a = circuit.gate_by_name("a").unwrap();
        let fault = Fault::new(a, FaultLine::Output, false);
        let mut sim = EventSim::new(&circuit);
        let mut generator = PatternGenerator::new(&circuit, 10);
        let result = generator
            .generate(&circuit, &mut sim, &fault, Mode::Primary)
            .unwrap();
        assert_eq!(result, Generation::TestFound);
        assert_eq!(
            input_values(&circuit, &sim),
            [Value::One, Value::One, Value::One]
        );
    }

    #[test]
    fn mux_verdicts_match_exhaustive_search() {
        let mut rng = SmallRng::seed_from_u64(37);
        for _ in 0..100 {
            let mut builder = CircuitBuilder::default();
            let mut nets: Vec<_> = (0..5).map(|i| builder.input(&format!("i{i}"))).collect();
            for g in 0..12 {
                let kind = [GateKind::Mux, GateKind::Mux, GateKind::And, GateKind::Xor]
                    [rng.gen_range(0..4)];
                let arity = if kind == GateKind::Mux { 3 } else { 2 };
                let fanins: Vec<_> = (0..arity)
                    .map(|_| nets[rng.gen_range(0..nets.len())])
                    .collect();
                let net = builder.gate(&format!("g{g}"), kind, fanins);
                if g >= 9 {
                    builder.output(&format!("o{g}"), net);
                }
                nets.push(net);
            }
            let circuit = builder.build().unwrap();

            let faults = FaultStore::all_stuck_at(&circuit);
            let mut sim = EventSim::new(&circuit);
            let mut generator = PatternGenerator::new(&circuit, usize::MAX);
            for (_, fault) in faults.iter() {
                let result = generator
                    .generate(&circuit, &mut sim, fault, Mode::Primary)
                    .unwrap();
                sim.clear_fault_effects(&circuit);
                let testable = (0..1u32 << 5).any(|bits| {
                    let inputs: Vec<Value> = (0..5)
                        .map(|i| Value::from_bool(bits >> i & 1 != 0))
                        .collect();
                    detects(&circuit, fault, &inputs)
                });
                let expected = if testable {
                    Generation::TestFound
                } else {
                    Generation::Untestable
                };
                assert_eq!(result, expected, "{}", fault.describe(&circuit));
            }
        }
    }

    #[test]
    fn found_tests_detect_their_target() {
        atpg_logger::test_setup("debug");
        let mut rng = SmallRng::seed_from_u64(29);
        for _ in 0..20 {
            let circuit = random_circuit(&mut rng, 6, 60, 2);
            let faults = FaultStore::all_stuck_at(&circuit);
            let mut sim = EventSim::new(&circuit);
            let mut generator = PatternGenerator::new(&circuit, 200);

            for (_, fault) in faults.iter() {
                let result = generator
                    .generate(&circuit, &mut sim, fault, Mode::Primary)
                    .unwrap();
                if result == Generation::TestFound {
                    let inputs = input_values(&circuit, &sim);
                    assert!(detects(&circuit, fault, &inputs), "{}", fault.describe(&circuit));
                }
                sim.clear_fault_effects(&circuit);
            }
        }
    }

    #[test]
    fn untestable_faults_have_no_binary_test() {
        let mut rng = SmallRng::seed_from_u64(31);
        for _ in 0..10 {
            let circuit = random_circuit(&mut rng, 4, 30, 1);
            let faults = FaultStore::all_stuck_at(&circuit);
            let mut sim = EventSim::new(&circuit);
            let mut generator = PatternGenerator::new(&circuit, usize::MAX);

            let input_count = circuit.inputs().len();
            for (_, fault) in faults.iter() {
                let result = generator
                    .generate(&circuit, &mut sim, fault, Mode::Primary)
                    .unwrap();
                sim.clear_fault_effects(&circuit);
                if result != Generation::Untestable {
                    continue;
                }
                for bits in 0..1u32 << input_count {
                    let inputs: Vec<Value> = (0..input_count)
                        .map(|i| Value::from_bool(bits >> i & 1 != 0))
                        .collect();
                    assert!(!detects(&circuit, fault, &inputs), "{}", fault.describe(&circuit));
                }
            }
        }
    }
}
