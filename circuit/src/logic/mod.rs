//! Logic value algebra shared by scalar and bit-parallel simulation.
//!
//! Gate evaluation is written once, generic over the [`Logic`] trait, and instantiated for the
//! five-valued scalar [`Value`] used during pattern generation and for the bit-parallel
//! [`ParaValue`][para::ParaValue] used during fault simulation.
use std::fmt::Debug;

use crate::gate::GateKind;

pub mod para;
mod value;

pub use value::Value;

/// A logic value algebra.
pub trait Logic: Copy + PartialEq + Debug {
    /// Logic 0.
    fn zero() -> Self;
    /// Logic 1.
    fn one() -> Self;
    /// Unknown.
    fn unknown() -> Self;

    /// Conjunction.
    fn and(self, other: Self) -> Self;
    /// Disjunction.
    fn or(self, other: Self) -> Self;
    /// Exclusive or.
    fn xor(self, other: Self) -> Self;
    /// Negation.
    fn not(self) -> Self;

    /// Two-way multiplexer selecting `d1` when `select` is 1.
    ///
    /// The consensus term `d0 & d1` keeps the output known when both data inputs agree on a known
    /// value while the select input is unknown.
    fn mux(select: Self, d0: Self, d1: Self) -> Self {
        select
            .not()
            .and(d0)
            .or(select.and(d1))
            .or(d0.and(d1))
    }

    /// Evaluates a gate of the given kind from its ordered fanin values.
    ///
    /// The default combines the inputs with the operations above. Algebras whose operations lose
    /// information when chained override this.
    fn eval_gate(kind: GateKind, inputs: impl IntoIterator<Item = Self>) -> Self {
        fold_gate(kind, inputs)
    }

    /// Returns `value` when `invert` is false and its negation otherwise.
    fn invert_if(self, invert: bool) -> Self {
        if invert {
            self.not()
        } else {
            self
        }
    }
}

/// Evaluates a gate of the given kind from its ordered fanin values.
///
/// Inputs have no fanins and evaluate to unknown, their value has to be provided by the caller.
pub fn eval<L: Logic>(kind: GateKind, inputs: impl IntoIterator<Item = L>) -> L {
    L::eval_gate(kind, inputs)
}

fn fold_gate<L: Logic>(kind: GateKind, inputs: impl IntoIterator<Item = L>) -> L {
    let mut inputs = inputs.into_iter();
    match kind {
        GateKind::PrimaryInput | GateKind::PseudoInput | GateKind::TieX => L::unknown(),
        GateKind::Tie0 => L::zero(),
        GateKind::Tie1 => L::one(),
        GateKind::PrimaryOutput | GateKind::PseudoOutput | GateKind::Buf | GateKind::Inv => inputs
            .next()
            .unwrap_or_else(L::unknown)
            .invert_if(kind.is_inverting()),
        GateKind::And | GateKind::Nand => inputs
            .fold(L::one(), L::and)
            .invert_if(kind.is_inverting()),
        GateKind::Or | GateKind::Nor => inputs
            .fold(L::zero(), L::or)
            .invert_if(kind.is_inverting()),
        GateKind::Xor | GateKind::Xnor => inputs
            .fold(L::zero(), L::xor)
            .invert_if(kind.is_inverting()),
        GateKind::Mux => {
            let (Some(d0), Some(d1), Some(select)) = (inputs.next(), inputs.next(), inputs.next())
            else {
                return L::unknown();
            };
            L::mux(select, d0, d1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{para::ParaValue, *};

    const KINDS: [GateKind; 9] = [
        GateKind::Buf,
        GateKind::Inv,
        GateKind::And,
        GateKind::Nand,
        GateKind::Or,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
        GateKind::Mux,
    ];

    fn three_valued() -> [Value; 3] {
        [Value::Zero, Value::One, Value::X]
    }

    #[test]
    fn dominant_values() {
        use Value::*;
        assert_eq!(eval(GateKind::And, [Zero, X, One]), Zero);
        assert_eq!(eval(GateKind::Nand, [Zero, X]), One);
        assert_eq!(eval(GateKind::Or, [X, One]), One);
        assert_eq!(eval(GateKind::Nor, [X, One]), Zero);
        assert_eq!(eval(GateKind::Xor, [X, One]), X);
        assert_eq!(eval(GateKind::And, [One, One, X]), X);
        assert_eq!(eval(GateKind::Mux, [One, One, X]), One);
        assert_eq!(eval(GateKind::Mux, [Zero, One, X]), X);
        assert_eq!(eval(GateKind::Mux, [Zero, One, One]), One);
    }

    #[test]
    fn fault_effects_propagate() {
        use Value::*;
        assert_eq!(eval(GateKind::And, [D, One]), D);
        assert_eq!(eval(GateKind::Nand, [D, One]), B);
        assert_eq!(eval(GateKind::And, [D, B]), Zero);
        assert_eq!(eval(GateKind::Or, [D, B]), One);
        assert_eq!(eval(GateKind::Xor, [D, D]), Zero);
        assert_eq!(eval(GateKind::Xor, [D, B]), One);
        assert_eq!(eval(GateKind::Or, [D, X]), X);
        assert_eq!(eval(GateKind::Mux, [D, Zero, Zero]), D);
        assert_eq!(eval(GateKind::Mux, [Zero, One, D]), D);
        assert_eq!(eval(GateKind::Mux, [D, X, Zero]), D);
        assert_eq!(eval(GateKind::Mux, [X, B, One]), B);
        assert_eq!(eval(GateKind::And, [B, X, D]), Zero);
        assert_eq!(eval(GateKind::Or, [D, X, B]), One);
    }

    #[test]
    fn fault_effects_follow_good_and_faulty_circuit() {
        use Value::*;
        let five_valued = [Zero, One, X, D, B];

        for kind in KINDS {
            for a in five_valued {
                for b in five_valued {
                    for c in five_valued {
                        let combo = [a, b, c];
                        let good = eval(kind, combo.map(|v| Value::from_option(v.good())));
                        let faulty = eval(kind, combo.map(|v| Value::from_option(v.faulty())));
                        let expected = Value::from_parts(good.good(), faulty.faulty());
                        assert_eq!(eval(kind, combo), expected, "{kind:?} {combo:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn parallel_lanes_match_scalar() {
        // every lane carries one combination of three three-valued inputs
        let combos: Vec<[Value; 3]> = three_valued()
            .into_iter()
            .flat_map(|a| {
                three_valued()
                    .into_iter()
                    .flat_map(move |b| three_valued().into_iter().map(move |c| [a, b, c]))
            })
            .collect();

        let mut packed = [ParaValue::unknown(); 3];
        for (lane, combo) in combos.iter().enumerate() {
            for (input, value) in combo.iter().enumerate() {
                packed[input].set_lane(lane, value.good());
            }
        }

        for kind in KINDS {
            let arity = match kind {
                GateKind::Buf | GateKind::Inv => 1,
                _ => 3,
            };
            let result = eval(kind, packed[..arity].iter().copied());
            for (lane, combo) in combos.iter().enumerate() {
                let expected = eval(kind, combo[..arity].iter().copied());
                assert_eq!(result.lane(lane), expected.good(), "{kind:?} {combo:?}");
            }
        }
    }
}
