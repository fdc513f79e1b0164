use std::fmt;

use super::{fold_gate, Logic};
use crate::gate::GateKind;

/// Five-valued logic used during pattern generation.
///
/// [`D`][Value::D] and [`B`][Value::B] mark lines where the good and the faulty circuit disagree.
/// They only exist while a target fault is being processed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Value {
    /// Logic 0 in both circuits.
    Zero,
    /// Logic 1 in both circuits.
    One,
    /// Unknown.
    #[default]
    X,
    /// Good 1, faulty 0.
    D,
    /// Good 0, faulty 1.
    B,
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn xor3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    Some(a? ^ b?)
}

/// Good and faulty circuit values kept apart while a gate is evaluated.
///
/// Folding [`Value`]s directly loses the known part of a half unknown intermediate result, e.g.
/// `B & X` has a known good value 0 but collapses to `X`.
#[derive(Clone, Copy, PartialEq, Debug)]
struct Split {
    good: Option<bool>,
    faulty: Option<bool>,
}

impl Split {
    fn of(value: Value) -> Self {
        Split {
            good: value.good(),
            faulty: value.faulty(),
        }
    }

    fn join(self) -> Value {
        Value::from_parts(self.good, self.faulty)
    }

    fn map2(self, other: Self, op: fn(Option<bool>, Option<bool>) -> Option<bool>) -> Self {
        Split {
            good: op(self.good, other.good),
            faulty: op(self.faulty, other.faulty),
        }
    }
}

impl Logic for Split {
    fn zero() -> Self {
        Split::of(Value::Zero)
    }

    fn one() -> Self {
        Split::of(Value::One)
    }

    fn unknown() -> Self {
        Split::of(Value::X)
    }

    fn and(self, other: Self) -> Self {
        self.map2(other, and3)
    }

    fn or(self, other: Self) -> Self {
        self.map2(other, or3)
    }

    fn xor(self, other: Self) -> Self {
        self.map2(other, xor3)
    }

    fn not(self) -> Self {
        Split {
            good: self.good.map(|v| !v),
            faulty: self.faulty.map(|v| !v),
        }
    }
}

impl Value {
    /// The binary value for a `bool`.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Value::One
        } else {
            Value::Zero
        }
    }

    /// The binary value for a known `bool`, unknown otherwise.
    pub fn from_option(value: Option<bool>) -> Self {
        value.map_or(Value::X, Value::from_bool)
    }

    /// Combines a good and a faulty circuit value.
    ///
    /// The result is unknown when either part is unknown.
    pub fn from_parts(good: Option<bool>, faulty: Option<bool>) -> Self {
        match (good, faulty) {
            (Some(true), Some(true)) => Value::One,
            (Some(false), Some(false)) => Value::Zero,
            (Some(true), Some(false)) => Value::D,
            (Some(false), Some(true)) => Value::B,
            _ => Value::X,
        }
    }

    /// The value in the fault free circuit.
    pub fn good(self) -> Option<bool> {
        match self {
            Value::Zero | Value::B => Some(false),
            Value::One | Value::D => Some(true),
            Value::X => None,
        }
    }

    /// The value in the faulty circuit.
    pub fn faulty(self) -> Option<bool> {
        match self {
            Value::Zero | Value::D => Some(false),
            Value::One | Value::B => Some(true),
            Value::X => None,
        }
    }

    /// Returns `true` for [`D`][Value::D] and [`B`][Value::B].
    pub fn is_fault_effect(self) -> bool {
        matches!(self, Value::D | Value::B)
    }

    /// Returns `true` unless the value is [`X`][Value::X].
    pub fn is_assigned(self) -> bool {
        self != Value::X
    }

    /// Replaces a fault effect by its good circuit value.
    pub fn without_fault_effect(self) -> Self {
        Value::from_option(self.good())
    }

    /// The value seen through a line stuck at `stuck`.
    pub fn with_stuck_at(self, stuck: bool) -> Self {
        Value::from_parts(self.good(), Some(stuck))
    }

    /// Renders the value as a single character.
    pub fn as_char(self) -> char {
        match self {
            Value::Zero => '0',
            Value::One => '1',
            Value::X => 'X',
            Value::D => 'D',
            Value::B => 'B',
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Logic for Value {
    fn zero() -> Self {
        Value::Zero
    }

    fn one() -> Self {
        Value::One
    }

    fn unknown() -> Self {
        Value::X
    }

    fn and(self, other: Self) -> Self {
        Split::of(self).and(Split::of(other)).join()
    }

    fn or(self, other: Self) -> Self {
        Split::of(self).or(Split::of(other)).join()
    }

    fn xor(self, other: Self) -> Self {
        Split::of(self).xor(Split::of(other)).join()
    }

    fn not(self) -> Self {
        Split::of(self).not().join()
    }

    fn mux(select: Self, d0: Self, d1: Self) -> Self {
        Split::mux(Split::of(select), Split::of(d0), Split::of(d1)).join()
    }

    fn eval_gate(kind: GateKind, inputs: impl IntoIterator<Item = Self>) -> Self {
        fold_gate(kind, inputs.into_iter().map(Split::of)).join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuck_at_composition() {
        assert_eq!(Value::One.with_stuck_at(false), Value::D);
        assert_eq!(Value::Zero.with_stuck_at(true), Value::B);
        assert_eq!(Value::Zero.with_stuck_at(false), Value::Zero);
        assert_eq!(Value::X.with_stuck_at(true), Value::X);
        assert_eq!(Value::D.with_stuck_at(false), Value::D);
    }

    #[test]
    fn fault_effect_cleanup() {
        assert_eq!(Value::D.without_fault_effect(), Value::One);
        assert_eq!(Value::B.without_fault_effect(), Value::Zero);
        assert_eq!(Value::X.without_fault_effect(), Value::X);
    }

    #[test]
    fn mux_keeps_fault_effect_of_selected_input() {
        use Value::*;
        assert_eq!(Value::mux(Zero, D, X), D);
        assert_eq!(Value::mux(One, X, B), B);
        assert_eq!(Value::mux(X, D, D), D);
        assert_eq!(Value::mux(Zero, X, D), X);
    }

    #[test]
    fn negation_swaps_fault_effects() {
        assert_eq!(Value::D.not(), Value::B);
        assert_eq!(Value::B.not(), Value::D);
        assert_eq!(Value::X.not(), Value::X);
    }
}
