//! Construction and levelization of circuits.
use atpg_ids::{define_id, Id, IdVec};
use zwohash::HashMap;

use crate::{
    circuit::{Circuit, DEPTH_SENTINEL_OFFSET},
    depth::compute_depth_from_po,
    error::CircuitError,
    gate::{Gate, GateId, GateKind},
    testability::compute_scoap,
};

define_id! {
    /// A named net of a circuit under construction.
    pub struct NetId;
}

#[derive(Clone, Debug)]
struct Net {
    name: String,
    driver: Option<(GateKind, Vec<NetId>)>,
}

/// Incrementally collects a netlist and builds a levelized [`Circuit`] from it.
///
/// Nets are identified by name and may be referenced before they are driven. Errors are
/// collected and reported by [`build`][Self::build].
#[derive(Default, Debug)]
pub struct CircuitBuilder {
    nets: IdVec<NetId, Net>,
    by_name: HashMap<String, NetId>,
    primary_inputs: Vec<NetId>,
    scan_cells: Vec<(NetId, NetId)>,
    primary_outputs: Vec<(String, NetId)>,
    constraints: Vec<(NetId, bool)>,
    errors: Vec<CircuitError>,
}

/// A node of the netlist before levelization, either a net's driver or an output.
struct Node {
    name: String,
    kind: GateKind,
    fanins: Vec<usize>,
    order: (u8, usize),
}

impl CircuitBuilder {
    /// Returns the net with the given name, creating an undriven net if necessary.
    pub fn net(&mut self, name: &str) -> NetId {
        if let Some(&net) = self.by_name.get(name) {
            return net;
        }
        let net = self.nets.push(Net {
            name: name.to_owned(),
            driver: None,
        });
        self.by_name.insert(name.to_owned(), net);
        net
    }

    /// Returns the name of a net.
    pub fn net_name(&self, net: NetId) -> &str {
        &self.nets[net].name
    }

    /// Drives an existing net by a gate of the given kind.
    ///
    /// Outputs and pseudo inputs cannot drive nets, use [`output`][Self::output] and
    /// [`scan_cell`][Self::scan_cell] for them.
    pub fn define(&mut self, net: NetId, kind: GateKind, fanins: impl IntoIterator<Item = NetId>) {
        let entry = &mut self.nets[net];
        if entry.driver.is_some() {
            self.errors.push(CircuitError::RedefinedNet {
                name: entry.name.clone(),
            });
            return;
        }
        if kind.is_output() || kind == GateKind::PseudoInput {
            self.errors.push(CircuitError::NotANetDriver {
                name: entry.name.clone(),
                kind,
            });
            return;
        }
        entry.driver = Some((kind, fanins.into_iter().collect()));
        if kind == GateKind::PrimaryInput {
            self.primary_inputs.push(net);
        }
    }

    /// Adds a gate driving the net `name`.
    pub fn gate(
        &mut self,
        name: &str,
        kind: GateKind,
        fanins: impl IntoIterator<Item = NetId>,
    ) -> NetId {
        let net = self.net(name);
        self.define(net, kind, fanins);
        net
    }

    /// Adds a primary input.
    pub fn input(&mut self, name: &str) -> NetId {
        self.gate(name, GateKind::PrimaryInput, [])
    }

    /// Adds a scan flip-flop.
    ///
    /// The returned net is the pseudo primary input holding the scanned in state. A pseudo
    /// primary output capturing `next_state` is added alongside it.
    pub fn scan_cell(&mut self, name: &str, next_state: NetId) -> NetId {
        let net = self.net(name);
        let entry = &mut self.nets[net];
        if entry.driver.is_some() {
            self.errors.push(CircuitError::RedefinedNet {
                name: entry.name.clone(),
            });
            return net;
        }
        entry.driver = Some((GateKind::PseudoInput, vec![]));
        self.scan_cells.push((net, next_state));
        net
    }

    /// Adds a primary output observing `driver`.
    pub fn output(&mut self, name: &str, driver: NetId) {
        self.primary_outputs.push((name.to_owned(), driver));
    }

    /// Ties an input to a constant value.
    pub fn constrain(&mut self, net: NetId, value: bool) {
        self.constraints.push((net, value));
    }

    /// Validates and levelizes the collected netlist.
    pub fn build(self) -> Result<Circuit, CircuitError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut nodes = Vec::with_capacity(
            self.nets.len() + self.primary_outputs.len() + self.scan_cells.len(),
        );
        let mut input_position: HashMap<NetId, (u8, usize)> = HashMap::default();
        for (position, &net) in self.primary_inputs.iter().enumerate() {
            input_position.insert(net, (0, position));
        }
        for (position, &(net, _)) in self.scan_cells.iter().enumerate() {
            input_position.insert(net, (1, position));
        }

        for (net, entry) in self.nets.iter() {
            let Some((kind, fanins)) = &entry.driver else {
                return Err(CircuitError::UndefinedNet {
                    name: entry.name.clone(),
                });
            };
            if !kind.arity().accepts(fanins.len()) {
                return Err(CircuitError::ArityMismatch {
                    name: entry.name.clone(),
                    kind: *kind,
                    expected: kind.arity(),
                    found: fanins.len(),
                });
            }
            nodes.push(Node {
                name: entry.name.clone(),
                kind: *kind,
                fanins: fanins.iter().map(|fanin| fanin.id_index()).collect(),
                order: input_position
                    .get(&net)
                    .copied()
                    .unwrap_or((2, net.id_index())),
            });
        }
        for (name, driver) in &self.primary_outputs {
            let index = nodes.len();
            nodes.push(Node {
                name: name.clone(),
                kind: GateKind::PrimaryOutput,
                fanins: vec![driver.id_index()],
                order: (2, index),
            });
        }
        for (net, next_state) in &self.scan_cells {
            let index = nodes.len();
            nodes.push(Node {
                name: format!("{}.next", self.nets[*net].name),
                kind: GateKind::PseudoOutput,
                fanins: vec![next_state.id_index()],
                order: (2, index),
            });
        }

        let levels = levelize(&nodes)?;

        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by_key(|&node| (levels[node], nodes[node].order));
        let mut gate_of_node = vec![GateId::MIN_ID; nodes.len()];
        for (position, &node) in order.iter().enumerate() {
            gate_of_node[node] = GateId::from_id_index(position);
        }

        let mut gates: IdVec<GateId, Gate> = order
            .iter()
            .map(|&index| {
                let node = &nodes[index];
                let fanins = node.fanins.iter().map(|&f| gate_of_node[f]).collect();
                Gate::new(node.name.clone(), node.kind, levels[index], fanins)
            })
            .collect();

        let ids: Vec<GateId> = gates.keys().iter().collect();
        for &id in &ids {
            for k in 0..gates[id].fanins.len() {
                let fanin = gates[id].fanins[k];
                let fanouts = &mut gates[fanin].fanouts;
                if fanouts.last() != Some(&id) {
                    fanouts.push(id);
                }
            }
        }

        for &(net, value) in &self.constraints {
            let gate = &mut gates[gate_of_node[net.id_index()]];
            if !gate.kind.is_input() {
                return Err(CircuitError::ConstraintOnNonInput {
                    name: gate.name.clone(),
                });
            }
            gate.constraint = Some(value);
        }

        let level_count = gates.values().iter().map(|gate| gate.level + 1).max().unwrap_or(0);

        let mut by_name: HashMap<String, GateId> = HashMap::default();
        for (id, gate) in gates.iter() {
            if !gate.kind.is_output() {
                by_name.insert(gate.name.clone(), id);
            }
        }
        // outputs named like the net they observe resolve to the driving gate
        for (id, gate) in gates.iter() {
            if gate.kind.is_output() {
                by_name.entry(gate.name.clone()).or_insert(id);
            }
        }

        let primary_outputs = ids
            .iter()
            .copied()
            .filter(|&id| gates[id].kind == GateKind::PrimaryOutput)
            .collect::<Vec<_>>();
        let pseudo_outputs = ids
            .iter()
            .copied()
            .filter(|&id| gates[id].kind == GateKind::PseudoOutput)
            .collect::<Vec<_>>();

        compute_scoap(&mut gates);
        compute_depth_from_po(&mut gates, level_count + DEPTH_SENTINEL_OFFSET)?;

        let circuit = Circuit {
            gates,
            primary_input_count: self.primary_inputs.len(),
            pseudo_input_count: self.scan_cells.len(),
            primary_outputs,
            pseudo_outputs,
            level_count,
            by_name,
        };

        log::debug!(
            "built circuit with {} gates, {} inputs, {} pseudo inputs, {} levels",
            circuit.len(),
            circuit.primary_inputs().len(),
            circuit.pseudo_inputs().len(),
            circuit.level_count(),
        );

        Ok(circuit)
    }
}

/// Assigns each node one more than the largest level among its fanins, inputs and constants
/// get level 0.
fn levelize(nodes: &[Node]) -> Result<Vec<u32>, CircuitError> {
    let mut pending: Vec<usize> = nodes.iter().map(|node| node.fanins.len()).collect();
    let mut fanouts: Vec<Vec<usize>> = vec![vec![]; nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        for &fanin in &node.fanins {
            fanouts[fanin].push(index);
        }
    }

    let mut levels = vec![0u32; nodes.len()];
    let mut ready: Vec<usize> = (0..nodes.len()).filter(|&n| pending[n] == 0).collect();
    let mut done = 0;
    while let Some(node) = ready.pop() {
        done += 1;
        for &fanout in &fanouts[node] {
            levels[fanout] = levels[fanout].max(levels[node] + 1);
            pending[fanout] -= 1;
            if pending[fanout] == 0 {
                ready.push(fanout);
            }
        }
    }

    if done < nodes.len() {
        let stuck = pending
            .iter()
            .position(|&count| count > 0)
            .unwrap_or_default();
        return Err(CircuitError::CombinationalCycle {
            name: nodes[stuck].name.clone(),
        });
    }

    Ok(levels)
}
