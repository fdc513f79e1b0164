//! Test patterns and their textual format.
use std::io::{self, Write};

use atpg_circuit::{Circuit, Value};
use rand::Rng;

use crate::options::AtpgOptions;

/// How the scan chain is operated when a pattern is applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, clap::ValueEnum)]
pub enum CaptureMode {
    /// Scan in, apply, capture once.
    #[default]
    BasicScan,
    /// Launch the transition by a capture cycle.
    LaunchCapture,
    /// Launch the transition by the last shift cycle.
    LaunchShift,
}

impl CaptureMode {
    /// Tag used in the pattern format.
    pub fn tag(self) -> &'static str {
        match self {
            CaptureMode::BasicScan => "BASIC_SCAN",
            CaptureMode::LaunchCapture => "LAUNCH_CAPTURE",
            CaptureMode::LaunchShift => "LAUNCH_SHIFT",
        }
    }
}

/// A single test vector with its expected responses.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Pattern {
    /// Values of the primary inputs.
    pub primary_inputs: Vec<Value>,
    /// Scanned in values of the pseudo primary inputs.
    pub pseudo_inputs: Vec<Value>,
    /// Expected values of the primary outputs.
    pub primary_outputs: Vec<Value>,
    /// Expected captured values of the pseudo primary outputs.
    pub pseudo_outputs: Vec<Value>,
}

impl Pattern {
    /// An all unknown pattern sized for the given circuit.
    pub fn new(circuit: &Circuit) -> Self {
        Self {
            primary_inputs: vec![Value::X; circuit.primary_inputs().len()],
            pseudo_inputs: vec![Value::X; circuit.pseudo_inputs().len()],
            primary_outputs: vec![Value::X; circuit.primary_outputs().len()],
            pseudo_outputs: vec![Value::X; circuit.pseudo_outputs().len()],
        }
    }

    /// Primary input values followed by pseudo primary input values.
    pub fn inputs(&self) -> impl Iterator<Item = &Value> + '_ {
        self.primary_inputs.iter().chain(&self.pseudo_inputs)
    }

    /// Assigns the inputs in the order of [`inputs`][Self::inputs].
    ///
    /// Fault effects are reduced to their good value.
    pub fn set_inputs(&mut self, circuit: &Circuit, values: impl IntoIterator<Item = Value>) {
        debug_assert_eq!(self.primary_inputs.len(), circuit.primary_inputs().len());
        let targets = self
            .primary_inputs
            .iter_mut()
            .chain(&mut self.pseudo_inputs);
        for (target, value) in targets.zip(values) {
            *target = value.without_fault_effect();
        }
    }

    /// Number of inputs that are still unknown.
    pub fn unassigned_inputs(&self) -> usize {
        self.inputs().filter(|value| !value.is_assigned()).count()
    }

    /// Assigns a random value to every unknown input, assigned inputs are kept.
    pub fn random_fill(&mut self, rng: &mut impl Rng) {
        for value in self
            .primary_inputs
            .iter_mut()
            .chain(&mut self.pseudo_inputs)
        {
            if !value.is_assigned() {
                *value = Value::from_bool(rng.gen());
            }
        }
    }
}

/// The patterns generated by a run together with the options they were generated with.
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    /// Patterns in application order.
    pub patterns: Vec<Pattern>,
    /// Whether dynamic compression was enabled.
    pub dynamic_compression: bool,
    /// Whether unknown inputs were randomly filled.
    pub random_fill: bool,
    /// Capture mode recorded in the pattern format.
    pub capture_mode: CaptureMode,
}

impl PatternSet {
    /// An empty set configured from run options.
    pub fn new(options: &AtpgOptions) -> Self {
        Self {
            patterns: vec![],
            dynamic_compression: options.dynamic_compression,
            random_fill: options.random_fill,
            capture_mode: options.capture_mode,
        }
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` when there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(" ")
}

fn write_values(out: &mut impl Write, values: &[Value]) -> io::Result<()> {
    for value in values {
        write!(out, "{value}")?;
    }
    Ok(())
}

/// Writes a pattern set.
///
/// The format consists of the input, pseudo input and output names, the capture mode tag, the
/// number of patterns and one line per pattern:
///
/// ```text
/// A B |  | O
/// BASIC_SCAN
/// _num_of_pattern_1
/// _pattern_1 11 |  | 1 |
/// ```
pub fn write_patterns(
    out: &mut impl Write,
    circuit: &Circuit,
    patterns: &PatternSet,
) -> io::Result<()> {
    writeln!(
        out,
        "{} | {} | {}",
        join(circuit.names(circuit.primary_inputs())),
        join(circuit.names(circuit.pseudo_inputs())),
        join(circuit.names(circuit.primary_outputs().iter().copied())),
    )?;
    writeln!(out, "{}", patterns.capture_mode.tag())?;
    writeln!(out, "_num_of_pattern_{}", patterns.len())?;

    for (index, pattern) in patterns.patterns.iter().enumerate() {
        write!(out, "_pattern_{} ", index + 1)?;
        write_values(out, &pattern.primary_inputs)?;
        write!(out, " | ")?;
        write_values(out, &pattern.pseudo_inputs)?;
        write!(out, " | ")?;
        write_values(out, &pattern.primary_outputs)?;
        write!(out, " | ")?;
        write_values(out, &pattern.pseudo_outputs)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::testing::{and_circuit, random_circuit};

    #[test]
    fn pattern_shape_follows_circuit() {
        let mut rng = SmallRng::seed_from_u64(2);
        let circuit = random_circuit(&mut rng, 4, 30, 3);
        let pattern = Pattern::new(&circuit);
        assert_eq!(pattern.primary_inputs.len(), 4);
        assert_eq!(pattern.pseudo_inputs.len(), 3);
        assert_eq!(pattern.primary_outputs.len(), circuit.primary_outputs().len());
        assert_eq!(pattern.pseudo_outputs.len(), 3);
        assert_eq!(pattern.unassigned_inputs(), 7);
    }

    #[test]
    fn random_fill_keeps_assigned_values() {
        let circuit = and_circuit();
        let mut pattern = Pattern::new(&circuit);
        pattern.set_inputs(&circuit, [Value::D, Value::X]);
        assert_eq!(pattern.primary_inputs[0], Value::One);

        let mut rng = SmallRng::seed_from_u64(0);
        pattern.random_fill(&mut rng);
        assert_eq!(pattern.primary_inputs[0], Value::One);
        assert_eq!(pattern.unassigned_inputs(), 0);
    }

    #[test]
    fn pattern_format() {
        let circuit = and_circuit();
        let mut set = PatternSet::new(&AtpgOptions::default());
        let mut pattern = Pattern::new(&circuit);
        pattern.set_inputs(&circuit, [Value::One, Value::X]);
        pattern.primary_outputs = vec![Value::X];
        set.patterns.push(pattern);

        let mut out = vec![];
        write_patterns(&mut out, &circuit, &set).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "A B |  | O\nBASIC_SCAN\n_num_of_pattern_1\n_pattern_1 1X |  | X | \n"
        );
    }
}
