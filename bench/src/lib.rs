//! Import of ISCAS-85/89 `.bench` netlists.
//!
//! ```text
//! # comment
//! INPUT(a)
//! OUTPUT(y)
//! q = DFF(n)
//! n = NAND(a, q)
//! y = NOT(n)
//! ```
//!
//! Nets may be used before the line driving them. Flip-flops become scan cells, their output
//! is a pseudo primary input and their data input is captured by a pseudo primary output.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use atpg_circuit::{Circuit, CircuitBuilder, GateKind, NetId};

mod error;

pub use error::BenchError;

/// Parses a bench netlist.
pub fn parse_bench(reader: impl BufRead) -> Result<Circuit, BenchError> {
    let mut builder = CircuitBuilder::default();
    let mut lines = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        parse_line(&mut builder, index + 1, &line)?;
        lines = index + 1;
    }
    log::debug!("read {lines} netlist lines");
    Ok(builder.build()?)
}

/// Reads a bench netlist from a file.
pub fn read_bench(path: impl AsRef<Path>) -> Result<Circuit, BenchError> {
    let file = File::open(path)?;
    parse_bench(BufReader::new(file))
}

enum Function {
    Gate(GateKind),
    FlipFlop,
}

fn function(name: &str) -> Option<Function> {
    let kind = match name.to_ascii_uppercase().as_str() {
        "AND" => GateKind::And,
        "NAND" => GateKind::Nand,
        "OR" => GateKind::Or,
        "NOR" => GateKind::Nor,
        "XOR" => GateKind::Xor,
        "XNOR" => GateKind::Xnor,
        "NOT" | "INV" => GateKind::Inv,
        "BUF" | "BUFF" => GateKind::Buf,
        "MUX" => GateKind::Mux,
        "TIE0" => GateKind::Tie0,
        "TIE1" => GateKind::Tie1,
        "TIEX" => GateKind::TieX,
        "DFF" => return Some(Function::FlipFlop),
        _ => return None,
    };
    Some(Function::Gate(kind))
}

fn syntax(line: usize, message: &str) -> BenchError {
    BenchError::Syntax {
        line,
        message: message.to_owned(),
    }
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '=' | '#'))
}

/// Splits `FUNC(arg, ...)` into the function name and its arguments.
fn split_call(text: &str) -> Option<(&str, Vec<&str>)> {
    let open = text.find('(')?;
    let inner = text[open + 1..].strip_suffix(')')?;
    let name = text[..open].trim();
    if !is_name(name) {
        return None;
    }
    if inner.trim().is_empty() {
        return Some((name, vec![]));
    }
    let args: Vec<&str> = inner.split(',').map(str::trim).collect();
    args.iter().all(|arg| is_name(arg)).then_some((name, args))
}

fn parse_line(builder: &mut CircuitBuilder, line: usize, text: &str) -> Result<(), BenchError> {
    let text = text.split('#').next().unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(());
    }

    let Some((target, call)) = text.split_once('=') else {
        let (keyword, args) =
            split_call(text).ok_or_else(|| syntax(line, "expected `INPUT(..)` or `OUTPUT(..)`"))?;
        let [name] = args[..] else {
            return Err(syntax(line, "expected exactly one net name"));
        };
        match keyword.to_ascii_uppercase().as_str() {
            "INPUT" => {
                builder.input(name);
            }
            "OUTPUT" => {
                let net = builder.net(name);
                builder.output(name, net);
            }
            _ => return Err(syntax(line, "expected `INPUT` or `OUTPUT`")),
        }
        return Ok(());
    };

    let target = target.trim();
    if !is_name(target) {
        return Err(syntax(line, "expected a net name before `=`"));
    }
    let (name, args) = split_call(call.trim())
        .ok_or_else(|| syntax(line, "expected a gate function call after `=`"))?;
    let fanins: Vec<NetId> = args.iter().map(|arg| builder.net(arg)).collect();

    match function(name) {
        Some(Function::Gate(kind)) => {
            builder.gate(target, kind, fanins);
        }
        Some(Function::FlipFlop) => {
            let [next_state] = fanins[..] else {
                return Err(syntax(line, "DFF takes exactly one input"));
            };
            builder.scan_cell(target, next_state);
        }
        None => {
            return Err(BenchError::UnknownFunction {
                line,
                name: name.to_owned(),
            })
        }
    }
    Ok(())
}
