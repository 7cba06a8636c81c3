//! Exact trajectory values.
//!
//! Most steps stay inside `i64`, but under the carry-coupled map a large
//! share of trajectories grow without bound. A value lives in `Small` while
//! it fits and moves to `Big` only when `3w + 1 + carry` leaves `i64`. Halving
//! a `Big` value moves it back as soon as it fits again, so the two variants
//! never hold the same number.

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// A trajectory value `w`, exact at any magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trajectory {
    Small(i64),
    Big(BigInt),
}

impl Trajectory {
    /// Normalizing constructor: values that fit in `i64` become `Small`.
    pub fn from_big(value: BigInt) -> Self {
        match value.to_i64() {
            Some(v) => Self::Small(v),
            None => Self::Big(value),
        }
    }

    /// The value, if it fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Small(v) => Some(*v),
            Self::Big(_) => None,
        }
    }

    pub fn is_big(&self) -> bool {
        matches!(self, Self::Big(_))
    }

    pub fn is_even(&self) -> bool {
        match self {
            Self::Small(v) => v % 2 == 0,
            Self::Big(b) => !b.bit(0),
        }
    }

    /// Bit length of `|w|`.
    pub fn bits(&self) -> u64 {
        match self {
            Self::Small(v) => u64::from(64 - v.unsigned_abs().leading_zeros()),
            Self::Big(b) => b.bits(),
        }
    }

    /// `w / 2` for even `w`.
    pub fn halve(&mut self) {
        match self {
            Self::Small(v) => *v /= 2,
            Self::Big(b) => {
                *b >>= 1u32;
                if let Some(v) = b.to_i64() {
                    *self = Self::Small(v);
                }
            }
        }
    }

    /// `3w + 1 + carry`, promoting to `Big` when `i64` runs out.
    pub fn triple_plus_one(&mut self, carry: i64) {
        match self {
            Self::Small(v) => {
                match v.checked_mul(3).and_then(|t| t.checked_add(1 + carry)) {
                    Some(next) => *v = next,
                    None => {
                        log::trace!("promoting w={v} past i64");
                        *self = Self::from_big(BigInt::from(*v) * 3u32 + (1 + carry));
                    }
                }
            }
            Self::Big(b) => {
                *b *= 3u32;
                *b += 1 + carry;
                // Negative starting values can shrink back toward zero.
                if let Some(v) = b.to_i64() {
                    *self = Self::Small(v);
                }
            }
        }
    }
}

impl From<i64> for Trajectory {
    fn from(v: i64) -> Self {
        Self::Small(v)
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small(v) => fmt::Display::fmt(v, f),
            Self::Big(b) => fmt::Display::fmt(b, f),
        }
    }
}
