//! Command line test pattern generator for `.bench` netlists.
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use atpg_engine::{
    reverse_fault_simulation, run_atpg, write_patterns, AtpgOptions, AtpgReport, CaptureMode,
    FaultState, FaultStore,
};
use clap::Parser;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Netlist in ISCAS bench format.
    input: PathBuf,

    /// Generate one pattern per targeted fault.
    #[clap(long)]
    no_compression: bool,
    /// Assign random values to inputs left unassigned.
    #[clap(long)]
    random_fill: bool,
    #[clap(short = 'b', long, default_value = "500")]
    backtrack_limit: usize,
    #[clap(short = 's', long, default_value = "0")]
    seed: u64,
    /// Keep patterns that reverse fault simulation would remove.
    #[clap(long)]
    no_reverse: bool,
    #[clap(long, value_enum, default_value_t = CaptureMode::BasicScan)]
    capture_mode: CaptureMode,

    /// Write the patterns to this file instead of stdout.
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    #[clap(long)]
    jsonl_output: bool,
}

fn main() -> color_eyre::Result<()> {
    let args = Args::parse();

    color_eyre::install()?;
    atpg_logger::setup();

    let circuit = atpg_bench::read_bench(&args.input)?;

    log::info!("# Stats");
    for (kind, count) in circuit.kind_histogram() {
        log::info!("{}: {}", kind.name(), count);
    }
    log::info!("levels: {}", circuit.level_count());

    let faults = FaultStore::all_stuck_at(&circuit);
    log::info!("faults: {}", faults.len());

    let options = AtpgOptions {
        dynamic_compression: !args.no_compression,
        random_fill: args.random_fill,
        backtrack_limit: args.backtrack_limit,
        seed: args.seed,
        capture_mode: args.capture_mode,
    };

    let (mut faults, mut patterns) = run_atpg(&circuit, faults, options)?;
    let generated = patterns.len();

    if !args.no_reverse {
        reverse_fault_simulation(&circuit, &mut faults, &mut patterns)?;
    }

    match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            write_patterns(&mut out, &circuit, &patterns)?;
            out.flush()?;
        }
        None => {
            let mut out = io::stdout().lock();
            write_patterns(&mut out, &circuit, &patterns)?;
            out.flush()?;
        }
    }

    let report = AtpgReport::new(&faults, &patterns);
    log::info!("# Faults");
    for state in FaultState::ALL {
        log::info!("{state}: {}", faults.count(state));
    }
    log::info!("patterns: {generated} generated, {} kept", patterns.len());
    log::info!("{report}");
    log::info!("memory: {}", atpg_logger::memory_usage());

    if args.jsonl_output {
        println!(
            "{}",
            serde_json::to_string(&json!({
                "faults": report.faults,
                "detected": report.detected,
                "untestable": report.untestable,
                "aborted": report.aborted,
                "undetected": report.undetected,
                "generated_patterns": generated,
                "patterns": report.patterns,
                "fault_coverage": report.fault_coverage(),
                "test_coverage": report.test_coverage(),
            }))?
        );
    }

    Ok(())
}
