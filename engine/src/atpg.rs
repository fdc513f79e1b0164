//! The whole fault list test generation loop.
use std::{
    collections::VecDeque,
    fmt::{self, Display},
};

use atpg_circuit::Circuit;
use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    error::InvariantViolation,
    event_sim::EventSim,
    fault::{FaultId, FaultState, FaultStore},
    fault_sim::FaultSim,
    generation::{Generation, Mode, PatternGenerator},
    options::AtpgOptions,
    pattern::{Pattern, PatternSet},
    xpath::XPath,
};

/// Test generation state for one circuit and fault list.
///
/// Faults are taken from the head of the active list. Each found test is extended by dynamic
/// compression, finalized by fault simulation against the whole active list and appended to the
/// pattern set.
pub struct Atpg<'a> {
    pub(crate) circuit: &'a Circuit,
    pub(crate) options: AtpgOptions,
    pub(crate) faults: FaultStore,
    pub(crate) list: VecDeque<FaultId>,
    pub(crate) patterns: PatternSet,
    pub(crate) sim: EventSim,
    pub(crate) fault_sim: FaultSim,
    pub(crate) generator: PatternGenerator,
    pub(crate) xpath: XPath,
    rng: SmallRng,
    untestable: usize,
    abort_streak: usize,
}

impl<'a> Atpg<'a> {
    /// Prepares a run, every unprocessed fault of `faults` becomes active.
    pub fn new(circuit: &'a Circuit, mut faults: FaultStore, options: AtpgOptions) -> Self {
        let list = faults.activate();
        Self {
            circuit,
            patterns: PatternSet::new(&options),
            sim: EventSim::new(circuit),
            fault_sim: FaultSim::new(circuit),
            generator: PatternGenerator::new(circuit, options.backtrack_limit),
            xpath: XPath::new(circuit),
            rng: SmallRng::seed_from_u64(options.seed),
            options,
            faults,
            list,
            untestable: 0,
            abort_streak: 0,
        }
    }

    /// All faults with their current state.
    pub fn faults(&self) -> &FaultStore {
        &self.faults
    }

    /// Faults that still wait for a test.
    pub fn active(&self) -> &VecDeque<FaultId> {
        &self.list
    }

    /// Patterns generated so far.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Number of faults proven untestable.
    pub fn untestable_count(&self) -> usize {
        self.untestable
    }

    /// Returns `true` when no further step can make progress.
    ///
    /// This is the case when the active list is empty or when every fault left in it aborted
    /// since the last fault was detected or proven untestable.
    pub fn is_done(&self) -> bool {
        self.list.is_empty() || self.abort_streak >= self.list.len()
    }

    /// Processes the fault at the head of the active list.
    ///
    /// Returns `None` when [`is_done`][Self::is_done].
    pub fn step(&mut self) -> Result<Option<Generation>, InvariantViolation> {
        if self.is_done() {
            return Ok(None);
        }
        let Some(&target) = self.list.front() else {
            return Ok(None);
        };

        let fault = self.faults[target].clone();
        let result = self
            .generator
            .generate(self.circuit, &mut self.sim, &fault, Mode::Primary)?;

        match result {
            Generation::TestFound => {
                self.abort_streak = 0;
                self.add_pattern(target)?;
            }
            Generation::Untestable => {
                self.abort_streak = 0;
                self.faults[target].state = FaultState::Untestable;
                self.list.pop_front();
                self.untestable += 1;
                log::debug!("{} untestable", fault.describe(self.circuit));
            }
            Generation::Aborted => {
                self.abort_streak += 1;
                self.faults[target].state = FaultState::Aborted;
                self.list.pop_front();
                self.list.push_back(target);
                log::debug!("{} aborted", fault.describe(self.circuit));
            }
        }
        Ok(Some(result))
    }

    /// Processes faults until [`is_done`][Self::is_done].
    pub fn run(&mut self) -> Result<(), InvariantViolation> {
        let total = self.list.len();
        while self.step()?.is_some() {
            let patterns = self.patterns.len();
            if patterns > 0 && patterns % 1000 == 0 && self.abort_streak == 0 {
                log::info!("{patterns} patterns, {} of {total} faults left", self.list.len());
            }
        }
        log::info!(
            "generated {} patterns, {} untestable, {} left",
            self.patterns.len(),
            self.untestable,
            self.list.len()
        );
        Ok(())
    }

    /// Consumes the run, returning the final fault states and the patterns.
    pub fn into_parts(self) -> (FaultStore, PatternSet) {
        (self.faults, self.patterns)
    }

    /// Turns the test for `target` held by the event simulator into a finalized pattern.
    fn add_pattern(&mut self, target: FaultId) -> Result<(), InvariantViolation> {
        let circuit = self.circuit;
        self.sim.reset_snapshot();
        self.sim.clear_fault_effects(circuit);
        self.sim.store_snapshot();

        let mut pattern = Pattern::new(circuit);
        pattern.set_inputs(circuit, circuit.inputs().iter().map(|input| self.sim.value(input)));

        let secondary = if self.options.dynamic_compression {
            self.compress(target, &mut pattern)?
        } else {
            vec![]
        };

        if self.options.random_fill {
            pattern.random_fill(&mut self.rng);
        }
        self.fault_sim
            .simulate(circuit, &pattern, &mut self.faults, &mut self.list);
        (pattern.primary_outputs, pattern.pseudo_outputs) = self.fault_sim.output_values(circuit);

        for fault in [target].into_iter().chain(secondary.iter().copied()) {
            if self.faults[fault].state != FaultState::Detected {
                return Err(InvariantViolation::TargetNotDetected { fault });
            }
        }
        log::trace!(
            "pattern {} targets {} faults",
            self.patterns.len() + 1,
            secondary.len() + 1
        );

        self.patterns.patterns.push(pattern);
        Ok(())
    }
}

/// Fault and pattern counts after a run.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AtpgReport {
    /// Total number of faults.
    pub faults: usize,
    /// Faults in [`FaultState::Detected`].
    pub detected: usize,
    /// Faults in [`FaultState::Untestable`].
    pub untestable: usize,
    /// Faults in [`FaultState::Aborted`].
    pub aborted: usize,
    /// Faults neither detected nor classified otherwise.
    pub undetected: usize,
    /// Number of patterns.
    pub patterns: usize,
}

impl AtpgReport {
    /// Counts the final fault states.
    pub fn new(faults: &FaultStore, patterns: &PatternSet) -> Self {
        let detected = faults.count(FaultState::Detected);
        let untestable = faults.count(FaultState::Untestable);
        let aborted = faults.count(FaultState::Aborted);
        Self {
            faults: faults.len(),
            detected,
            untestable,
            aborted,
            undetected: faults.len() - detected - untestable - aborted,
            patterns: patterns.len(),
        }
    }

    /// Detected faults relative to all faults.
    pub fn fault_coverage(&self) -> f64 {
        ratio(self.detected, self.faults)
    }

    /// Detected faults relative to all faults that are not untestable.
    pub fn test_coverage(&self) -> f64 {
        ratio(self.detected, self.faults - self.untestable)
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        count as f64 / total as f64
    }
}

impl Display for AtpgReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            faults,
            detected,
            untestable,
            aborted,
            undetected,
            patterns,
        } = *self;
        write!(f, "faults: {faults}")?;
        write!(f, " DT: {detected} AU: {untestable} AB: {aborted} UD: {undetected}")?;
        write!(f, " patterns: {patterns}")?;
        write!(
            f,
            " fault coverage: {:.2}% test coverage: {:.2}%",
            100.0 * self.fault_coverage(),
            100.0 * self.test_coverage()
        )?;
        Ok(())
    }
}

/// Runs test generation over the whole fault list.
pub fn run_atpg(
    circuit: &Circuit,
    faults: FaultStore,
    options: AtpgOptions,
) -> Result<(FaultStore, PatternSet), InvariantViolation> {
    let mut atpg = Atpg::new(circuit, faults, options);
    atpg.run()?;
    Ok(atpg.into_parts())
}
