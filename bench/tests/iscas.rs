use atpg_bench::{parse_bench, read_bench, BenchError};
use atpg_circuit::GateKind;

const S27: &str = "\
# s27
INPUT(G0)
INPUT(G1)
INPUT(G2)
INPUT(G3)

OUTPUT(G17)

G5 = DFF(G10)
G6 = DFF(G11)
G7 = DFF(G13)

G14 = NOT(G0)
G17 = NOT(G11)
G8 = AND(G14, G6)
G15 = OR(G12, G8)
G16 = OR(G3, G8)
G9 = NAND(G16, G15)
G10 = NOR(G14, G11)
G11 = NOR(G5, G9)
G12 = NOR(G1, G7)
G13 = NOR(G2, G12)
";

#[test]
fn s27_structure() {
    atpg_logger::test_setup("debug");
    let circuit = parse_bench(S27.as_bytes()).unwrap();

    assert_eq!(circuit.primary_inputs().len(), 4);
    assert_eq!(circuit.pseudo_inputs().len(), 3);
    assert_eq!(circuit.primary_outputs().len(), 1);
    assert_eq!(circuit.pseudo_outputs().len(), 3);
    assert_eq!(circuit.len(), 7 + 10 + 1 + 3);
    assert_eq!(circuit.level_count(), 8);

    let names: Vec<&str> = circuit.names(circuit.inputs()).collect();
    assert_eq!(names, ["G0", "G1", "G2", "G3", "G5", "G6", "G7"]);

    let g17 = circuit.gate_by_name("G17").unwrap();
    assert_eq!(circuit.gate(g17).kind, GateKind::Inv);
    assert_eq!(circuit.gate(circuit.primary_outputs()[0]).fanins, [g17]);

    for (id, gate) in circuit.gates().iter() {
        for &fanin in &gate.fanins {
            assert!(circuit.gate(fanin).level < gate.level);
            assert!(circuit.gate(fanin).fanouts.contains(&id));
        }
        if gate.kind.is_output() {
            assert_eq!(circuit.depth_from_po(id), 0);
        }
        assert!(circuit.is_observable(id), "{}", gate.name);
    }
}

#[test]
fn read_from_file() {
    let path = std::env::temp_dir().join(format!("atpg-bench-{}.bench", std::process::id()));
    std::fs::write(&path, S27).unwrap();
    let circuit = read_bench(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(circuit.unwrap().pseudo_outputs().len(), 3);

    let missing = read_bench(path.with_extension("missing"));
    assert!(matches!(missing, Err(BenchError::Io(_))));
}
