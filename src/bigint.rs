//! Arbitrary-precision signed integer, the codec's `Int` value type.
//!
//! A small value type implementing the usual numeric traits by hand, with
//! a fast `i64`/`u64` path plumbed through `From`/`TryFrom`. The backing
//! store is `num_bigint::BigInt` since the binary format requires true
//! arbitrary precision — coefficients and symbol-adjacent integers can
//! exceed 64 bits.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

/// A signed, arbitrary-precision integer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Int(BigInt);

impl Int {
    /// The integer zero.
    pub fn zero() -> Self {
        Int(BigInt::from(0))
    }

    /// Returns `true` if this integer is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this integer is negative.
    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }

    /// Returns the value as an `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    /// Returns the value as a `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    /// Big-endian two's-complement-free sign-magnitude bytes: `(is_negative,
    /// magnitude)`, matching the binary format's `Int`/`Decimal` coefficient
    /// payload encoding.
    pub fn to_sign_magnitude_be(&self) -> (bool, Vec<u8>) {
        let (sign, bytes) = self.0.to_bytes_be();
        (sign == Sign::Minus, bytes)
    }

    /// Reconstruct an `Int` from a sign flag and a big-endian magnitude, as
    /// read from the binary stream. `neg_zero` requests a zero magnitude be
    /// treated as the "negative zero" sentinel coefficient used by
    /// [`crate::decimal::Decimal`]; plain `Int`s never carry that flag (spec
    /// invariant: integer zero is never represented with the negative-int
    /// type code).
    pub fn from_sign_magnitude_be(negative: bool, magnitude: &[u8]) -> Self {
        let sign = if magnitude.iter().all(|&b| b == 0) {
            Sign::NoSign
        } else if negative {
            Sign::Minus
        } else {
            Sign::Plus
        };
        Int(BigInt::from_bytes_be(sign, magnitude))
    }
}

impl fmt::Debug for Int {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl PartialOrd for Int {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Default for Int {
    fn default() -> Self {
        Int::zero()
    }
}

impl From<BigInt> for Int {
    fn from(v: BigInt) -> Self {
        Int(v)
    }
}

impl From<&Int> for BigInt {
    fn from(v: &Int) -> Self {
        v.0.clone()
    }
}

macro_rules! impl_from_primitive {
    ($t:ty) => {
        impl From<$t> for Int {
            fn from(n: $t) -> Self {
                Int(BigInt::from(n))
            }
        }
    };
}

impl_from_primitive!(i8);
impl_from_primitive!(i16);
impl_from_primitive!(i32);
impl_from_primitive!(i64);
impl_from_primitive!(isize);
impl_from_primitive!(u8);
impl_from_primitive!(u16);
impl_from_primitive!(u32);
impl_from_primitive!(u64);
impl_from_primitive!(usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(Int::zero().is_zero());
        assert!(!Int::zero().is_negative());
    }

    #[test]
    fn sign_magnitude_round_trip() {
        for n in [0i64, 1, -1, 42, -42, i64::MIN + 1, i64::MAX] {
            let int = Int::from(n);
            let (neg, mag) = int.to_sign_magnitude_be();
            let back = Int::from_sign_magnitude_be(neg, &mag);
            assert_eq!(int, back, "round trip of {n}");
        }
    }

    #[test]
    fn zero_magnitude_ignores_sign_flag() {
        let a = Int::from_sign_magnitude_be(true, &[]);
        let b = Int::from_sign_magnitude_be(false, &[]);
        assert_eq!(a, Int::zero());
        assert_eq!(b, Int::zero());
        assert!(!a.is_negative());
    }

    #[test]
    fn orders_like_a_normal_integer() {
        assert!(Int::from(-5i64) < Int::from(5i64));
        assert!(Int::from(5i64) < Int::from(6i64));
    }
}
