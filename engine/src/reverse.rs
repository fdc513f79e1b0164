//! Reverse order fault simulation.
use std::collections::VecDeque;

use atpg_circuit::Circuit;

use crate::{
    error::InvariantViolation,
    fault::{FaultId, FaultState, FaultStore},
    fault_sim::FaultSim,
    pattern::PatternSet,
};

/// Removes patterns that detect no fault beyond those detected by later patterns.
///
/// Detection counts are recomputed and detected faults are reset to
/// [`FaultState::Undetected`] before the patterns are simulated from last to first. A pattern is
/// kept only when it detects at least one remaining fault. The kept patterns stay in their
/// chronological order. Returns the number of removed patterns.
pub fn reverse_fault_simulation(
    circuit: &Circuit,
    faults: &mut FaultStore,
    patterns: &mut PatternSet,
) -> Result<usize, InvariantViolation> {
    let mut list: VecDeque<FaultId> = VecDeque::new();
    for id in faults.ids() {
        let fault = &mut faults[id];
        fault.detections = 0;
        if fault.state == FaultState::Detected {
            fault.state = FaultState::Undetected;
        }
        if fault.state != FaultState::Untestable {
            list.push_back(id);
        }
    }

    let mut sim = FaultSim::new(circuit);
    let before_total = patterns.len();
    let mut kept = Vec::with_capacity(before_total);

    for pattern in std::mem::take(&mut patterns.patterns).into_iter().rev() {
        let before = list.len();
        sim.simulate(circuit, &pattern, faults, &mut list);
        let after = list.len();
        if after > before {
            return Err(InvariantViolation::FaultListGrew { before, after });
        }
        if after < before {
            kept.push(pattern);
        }
    }
    kept.reverse();
    patterns.patterns = kept;

    let removed = before_total - patterns.len();
    log::info!(
        "reverse fault simulation kept {} of {before_total} patterns",
        patterns.len()
    );
    Ok(removed)
}
