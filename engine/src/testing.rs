//! Circuits shared by the unit tests.
use atpg_circuit::{gate::Arity, Circuit, CircuitBuilder, GateKind, NetId};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng};

/// Two inputs `A` and `B` driving the AND gate `G` observed at output `O`.
pub fn and_circuit() -> Circuit {
    let mut builder = CircuitBuilder::default();
    let a = builder.input("A");
    let b = builder.input("B");
    let g = builder.gate("G", GateKind::And, [a, b]);
    builder.output("O", g);
    builder.build().unwrap()
}

/// A random acyclic circuit with the given number of scan cells.
///
/// About a fifth of the gates drive a primary output, the last gate always does. Scan cells
/// capture randomly chosen gates.
pub fn random_circuit(
    rng: &mut SmallRng,
    inputs: usize,
    gate_count: usize,
    scan_cells: usize,
) -> Circuit {
    const KINDS: [GateKind; 10] = [
        GateKind::And,
        GateKind::Nand,
        GateKind::Or,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
        GateKind::Inv,
        GateKind::Buf,
        GateKind::Mux,
        GateKind::And,
    ];
    let mut builder = CircuitBuilder::default();
    let mut nets: Vec<NetId> = (0..inputs)
        .map(|i| builder.input(&format!("i{i}")))
        .collect();
    let states: Vec<NetId> = (0..scan_cells)
        .map(|i| builder.net(&format!("q{i}")))
        .collect();
    nets.extend(&states);

    for g in 0..gate_count {
        let kind = *KINDS.choose(rng).unwrap();
        let arity = match kind.arity() {
            Arity::Exactly(n) => n,
            Arity::AtLeast(_) => rng.gen_range(2..=3),
        };
        // prefer recent nets to get deeper circuits
        let fanins: Vec<NetId> = (0..arity)
            .map(|_| {
                let window = nets.len().min(12);
                nets[nets.len() - 1 - rng.gen_range(0..window)]
            })
            .collect();
        let net = builder.gate(&format!("g{g}"), kind, fanins);
        if rng.gen_bool(0.2) || g + 1 == gate_count {
            builder.output(&format!("o{g}"), net);
        }
        nets.push(net);
    }

    let gates = &nets[inputs + scan_cells..];
    for (i, _) in states.iter().enumerate() {
        let next_state = *gates.choose(rng).unwrap();
        builder.scan_cell(&format!("q{i}"), next_state);
    }

    builder.build().unwrap()
}
