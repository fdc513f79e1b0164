//! Level distance from every gate to the nearest output.
use atpg_ids::IdVec;

use crate::{
    error::CircuitError,
    gate::{Gate, GateId},
};

/// Computes the depth from output of every gate in a single pass in descending level order.
///
/// Outputs have depth 0, every other gate one more than the smallest depth among its fanouts.
/// Gates without a path to an output get `sentinel`, and fanouts carrying the sentinel are
/// ignored so that the sentinel propagates to everything that only reaches unobservable gates.
///
/// Fails when any gate already carries a depth, as the pass must run exactly once.
pub(crate) fn compute_depth_from_po(
    gates: &mut IdVec<GateId, Gate>,
    sentinel: u32,
) -> Result<(), CircuitError> {
    if let Some(gate) = gates.values().iter().find(|gate| gate.depth_from_po.is_some()) {
        return Err(CircuitError::DepthAlreadyComputed {
            name: gate.name.clone(),
        });
    }

    let ids: Vec<GateId> = gates.keys().iter().collect();
    for &id in ids.iter().rev() {
        let depth = if gates[id].kind.is_output() {
            0
        } else {
            gates[id]
                .fanouts
                .iter()
                .filter_map(|&fanout| gates[fanout].depth_from_po)
                .filter(|&depth| depth < sentinel)
                .min()
                .map_or(sentinel, |depth| depth + 1)
        };
        gates[id].depth_from_po = Some(depth);
    }

    Ok(())
}
