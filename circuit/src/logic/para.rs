//! Bit-parallel three-valued logic.
//!
//! A [`ParaValue`] holds one three-valued signal for each of [`LANES`] independent simulations
//! using two bit vectors. A set `low` bit marks a 0, a set `high` bit marks a 1 and a lane with
//! neither bit set is unknown. Both bits are never set at the same time.
use std::fmt;

use super::{Logic, Value};

/// Machine word used for bit-parallel values.
pub type Word = u64;
/// Vector of machine words processed together.
pub type WordVec = wide::u64x4;

const WORD_BITS: usize = Word::BITS as usize;

/// Number of independent simulations carried by a [`ParaValue`].
pub const LANES: usize = WordVec::BITS as usize;

fn lane_bit(lane: usize) -> (usize, Word) {
    debug_assert!(lane < LANES);
    (lane / WORD_BITS, 1 << (lane % WORD_BITS))
}

/// Returns whether no bit of `vec` is set.
pub fn is_zero(vec: WordVec) -> bool {
    vec.as_array_ref().iter().all(|&word| word == 0)
}

/// A vector with only the bit of the given lane set.
pub fn lane_mask(lane: usize) -> WordVec {
    let (word, bit) = lane_bit(lane);
    let mut mask = WordVec::ZERO;
    mask.as_array_mut()[word] = bit;
    mask
}

/// Iterates over the lanes whose bit is set in `vec`.
pub fn set_lanes(vec: WordVec) -> impl Iterator<Item = usize> {
    let words = *vec.as_array_ref();
    words.into_iter().enumerate().flat_map(|(index, mut word)| {
        std::iter::from_fn(move || {
            if word == 0 {
                return None;
            }
            let bit = word.trailing_zeros() as usize;
            word &= word - 1;
            Some(index * WORD_BITS + bit)
        })
    })
}

/// Three-valued signal for [`LANES`] parallel simulations.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct ParaValue {
    /// Lanes where the signal is 0.
    pub low: WordVec,
    /// Lanes where the signal is 1.
    pub high: WordVec,
}

impl fmt::Debug for ParaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // lanes are printed most significant first, like a binary literal
        for lane in (0..LANES).rev() {
            let c = match self.lane(lane) {
                Some(false) => '0',
                Some(true) => '1',
                None => 'X',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl ParaValue {
    /// Broadcasts a scalar value to every lane.
    ///
    /// Fault effects are reduced to their good circuit value.
    pub fn splat(value: Value) -> Self {
        match value.good() {
            Some(false) => Self::zero(),
            Some(true) => Self::one(),
            None => Self::unknown(),
        }
    }

    /// The value of a single lane.
    pub fn lane(&self, lane: usize) -> Option<bool> {
        let (word, bit) = lane_bit(lane);
        if self.high.as_array_ref()[word] & bit != 0 {
            Some(true)
        } else if self.low.as_array_ref()[word] & bit != 0 {
            Some(false)
        } else {
            None
        }
    }

    /// Assigns a single lane.
    pub fn set_lane(&mut self, lane: usize, value: Option<bool>) {
        let (word, bit) = lane_bit(lane);
        let low = &mut self.low.as_array_mut()[word];
        *low &= !bit;
        if value == Some(false) {
            *low |= bit;
        }
        let high = &mut self.high.as_array_mut()[word];
        *high &= !bit;
        if value == Some(true) {
            *high |= bit;
        }
    }

    /// Forces the lanes selected by `mask` to a constant, leaving the other lanes unchanged.
    pub fn force(self, mask: WordVec, value: bool) -> Self {
        if value {
            Self {
                low: self.low & !mask,
                high: self.high | mask,
            }
        } else {
            Self {
                low: self.low | mask,
                high: self.high & !mask,
            }
        }
    }

    /// Lanes where both values are known and differ.
    pub fn differs(self, other: Self) -> WordVec {
        (self.low & other.high) | (self.high & other.low)
    }

    /// Lanes where the value is unknown.
    pub fn unknown_lanes(self) -> WordVec {
        !(self.low | self.high)
    }
}

impl Logic for ParaValue {
    fn zero() -> Self {
        Self {
            low: !WordVec::ZERO,
            high: WordVec::ZERO,
        }
    }

    fn one() -> Self {
        Self {
            low: WordVec::ZERO,
            high: !WordVec::ZERO,
        }
    }

    fn unknown() -> Self {
        Self {
            low: WordVec::ZERO,
            high: WordVec::ZERO,
        }
    }

    fn and(self, other: Self) -> Self {
        Self {
            low: self.low | other.low,
            high: self.high & other.high,
        }
    }

    fn or(self, other: Self) -> Self {
        Self {
            low: self.low & other.low,
            high: self.high | other.high,
        }
    }

    fn xor(self, other: Self) -> Self {
        Self {
            low: (self.low & other.low) | (self.high & other.high),
            high: (self.low & other.high) | (self.high & other.low),
        }
    }

    fn not(self) -> Self {
        Self {
            low: self.high,
            high: self.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_are_independent() {
        let mut value = ParaValue::unknown();
        value.set_lane(0, Some(true));
        value.set_lane(70, Some(false));
        value.set_lane(255, Some(true));
        assert_eq!(value.lane(0), Some(true));
        assert_eq!(value.lane(70), Some(false));
        assert_eq!(value.lane(255), Some(true));
        assert_eq!(value.lane(1), None);

        value.set_lane(70, None);
        assert_eq!(value.lane(70), None);
        assert!(is_zero(value.low));
    }

    #[test]
    fn forcing_a_lane() {
        let good = ParaValue::splat(Value::One);
        let faulty = good.force(lane_mask(130), false);
        assert_eq!(faulty.lane(130), Some(false));
        assert_eq!(faulty.lane(129), Some(true));
        assert_eq!(set_lanes(good.differs(faulty)).collect::<Vec<_>>(), vec![130]);
    }

    #[test]
    fn unknown_never_differs() {
        let unknown = ParaValue::unknown();
        assert!(is_zero(unknown.differs(ParaValue::one())));
        assert!(is_zero(unknown.differs(ParaValue::zero())));
        assert_eq!(set_lanes(unknown.unknown_lanes()).count(), LANES);
    }

    #[test]
    fn set_lane_iteration() {
        let mask = lane_mask(3) | lane_mask(64) | lane_mask(200);
        assert_eq!(set_lanes(mask).collect::<Vec<_>>(), vec![3, 64, 200]);
        assert_eq!(set_lanes(WordVec::ZERO).count(), 0);
    }
}
