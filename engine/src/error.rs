//! Internal consistency errors.
use std::fmt;

use atpg_circuit::GateId;

use crate::fault::FaultId;

/// An internal invariant of the engine was found to be violated.
///
/// These never result from the input circuit or the fault list. They indicate a defect in the
/// engine's state handling and abort the run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InvariantViolation {
    /// A gate was still marked as queued when the event queues were expected to be empty.
    StaleEventMarker {
        /// The marked gate.
        gate: GateId,
    },
    /// Storing the value snapshot changed values that were already assigned.
    SnapshotChanged {
        /// Number of assigned values that changed.
        count: usize,
    },
    /// The active fault list grew during reverse fault simulation.
    FaultListGrew {
        /// Length before simulating the pattern.
        before: usize,
        /// Length after simulating the pattern.
        after: usize,
    },
    /// A fault a pattern was generated for is not detected by the finalized pattern.
    TargetNotDetected {
        /// The target fault.
        fault: FaultId,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::StaleEventMarker { gate } => {
                write!(f, "event marker of {gate:?} is set while the queues are empty")
            }
            InvariantViolation::SnapshotChanged { count } => {
                write!(f, "storing the value snapshot changed {count} assigned values")
            }
            InvariantViolation::FaultListGrew { before, after } => {
                write!(
                    f,
                    "fault list grew from {before} to {after} during reverse fault simulation"
                )
            }
            InvariantViolation::TargetNotDetected { fault } => {
                write!(f, "generated pattern does not detect its target {fault:?}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}
