//! The levelized circuit graph.
use atpg_ids::{Id, IdRange, IdVec};
use zwohash::HashMap;

use crate::gate::{Gate, GateId, GateKind};

/// Extra distance added to the level count to obtain the depth of gates without a path to an
/// output.
pub const DEPTH_SENTINEL_OFFSET: u32 = 100;

/// An immutable, levelized gate-level circuit.
///
/// Gates are stored in non-decreasing level order. Primary inputs come first, followed by the
/// pseudo primary inputs, so both input categories occupy contiguous id ranges.
#[derive(Clone, Debug)]
pub struct Circuit {
    pub(crate) gates: IdVec<GateId, Gate>,
    pub(crate) primary_input_count: usize,
    pub(crate) pseudo_input_count: usize,
    pub(crate) primary_outputs: Vec<GateId>,
    pub(crate) pseudo_outputs: Vec<GateId>,
    pub(crate) level_count: u32,
    pub(crate) by_name: HashMap<String, GateId>,
}

impl Circuit {
    /// All gates in level order.
    pub fn gates(&self) -> &IdVec<GateId, Gate> {
        &self.gates
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns `true` for a circuit without gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Returns the gate with the given id.
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id]
    }

    /// Ids of the primary inputs.
    pub fn primary_inputs(&self) -> IdRange<GateId> {
        IdRange::from_index_range(0..self.primary_input_count)
    }

    /// Ids of the pseudo primary inputs.
    pub fn pseudo_inputs(&self) -> IdRange<GateId> {
        IdRange::from_index_range(
            self.primary_input_count..self.primary_input_count + self.pseudo_input_count,
        )
    }

    /// Ids of all primary and pseudo primary inputs.
    pub fn inputs(&self) -> IdRange<GateId> {
        IdRange::from_index_range(0..self.primary_input_count + self.pseudo_input_count)
    }

    /// Ids of the primary outputs in declaration order.
    pub fn primary_outputs(&self) -> &[GateId] {
        &self.primary_outputs
    }

    /// Ids of the pseudo primary outputs, the `n`-th one captures the `n`-th pseudo input.
    pub fn pseudo_outputs(&self) -> &[GateId] {
        &self.pseudo_outputs
    }

    /// Iterates over all primary and pseudo primary outputs.
    pub fn outputs(&self) -> impl Iterator<Item = GateId> + '_ {
        self.primary_outputs
            .iter()
            .chain(&self.pseudo_outputs)
            .copied()
    }

    /// One past the largest gate level.
    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// Depth from output of gates without any path to an output.
    pub fn depth_sentinel(&self) -> u32 {
        self.level_count + DEPTH_SENTINEL_OFFSET
    }

    /// Depth from output of a gate, the sentinel for unobservable gates.
    pub fn depth_from_po(&self, id: GateId) -> u32 {
        self.gates[id]
            .depth_from_po()
            .unwrap_or_else(|| self.depth_sentinel())
    }

    /// Returns whether some output can be reached from the gate.
    pub fn is_observable(&self, id: GateId) -> bool {
        self.depth_from_po(id) < self.depth_sentinel()
    }

    /// Looks up a gate by its netlist name.
    pub fn gate_by_name(&self, name: &str) -> Option<GateId> {
        self.by_name.get(name).copied()
    }

    /// Names of the gates in `ids`.
    pub fn names<'a>(
        &'a self,
        ids: impl IntoIterator<Item = GateId> + 'a,
    ) -> impl Iterator<Item = &'a str> + 'a {
        ids.into_iter().map(|id| self.gates[id].name.as_str())
    }

    /// Number of gates of each kind, in order of first appearance.
    pub fn kind_histogram(&self) -> Vec<(GateKind, usize)> {
        let mut histogram: Vec<(GateKind, usize)> = vec![];
        for gate in self.gates.values() {
            match histogram.iter_mut().find(|(kind, _)| *kind == gate.kind) {
                Some((_, count)) => *count += 1,
                None => histogram.push((gate.kind, 1)),
            }
        }
        histogram
    }

    /// Position of an input among all primary and pseudo primary inputs.
    pub fn input_index(&self, id: GateId) -> Option<usize> {
        self.inputs().contains(id).then(|| id.id_index())
    }
}
