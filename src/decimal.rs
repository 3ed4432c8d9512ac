//! Arbitrary-precision decimal: `coefficient * 10^exponent`, with a sidecar
//! flag for the "negative zero" coefficient the binary format distinguishes
//! from ordinary zero.
//!
//! Follows the same small-value-type pattern as [`Int`][crate::bigint::Int]
//! (hand-written `Display`/`Ord`/`From`), but the coefficient is a
//! [`BigInt`] because decimal coefficients are not bounded to 64 bits.

use std::fmt;

use num_bigint::{BigInt, Sign};
use num_traits::Zero;

/// A signed decimal value, `coefficient * 10^exponent`.
///
/// Negative zero (`coefficient == 0` but written with an explicit sign byte)
/// is a distinct, legal representation per spec: it is preserved through
/// encode/decode and compares unequal to ordinary zero under [`PartialEq`].
#[derive(Clone, Debug)]
pub struct Decimal {
    coefficient: BigInt,
    exponent: i64,
    neg_zero: bool,
}

impl Decimal {
    /// Construct a decimal from a coefficient and exponent. If `coefficient`
    /// is zero, the value is ordinary (non-negative) zero; use
    /// [`Decimal::negative_zero`] for the negative-zero sentinel.
    pub fn new(coefficient: BigInt, exponent: i64) -> Self {
        Decimal {
            coefficient,
            exponent,
            neg_zero: false,
        }
    }

    /// The decimal `-0 * 10^exponent`: zero coefficient, negative sign
    /// preserved.
    pub fn negative_zero(exponent: i64) -> Self {
        Decimal {
            coefficient: BigInt::zero(),
            exponent,
            neg_zero: true,
        }
    }

    /// The coefficient.
    pub fn coefficient(&self) -> &BigInt {
        &self.coefficient
    }

    /// The power-of-ten exponent.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Whether this value is the negative-zero sentinel.
    pub fn is_negative_zero(&self) -> bool {
        self.neg_zero
    }

    /// Whether the coefficient is (ordinary or negative) zero.
    pub fn is_zero(&self) -> bool {
        self.coefficient.is_zero()
    }

    /// Encode the exponent + coefficient payload: a `VarInt` exponent
    /// followed by a big-endian signed-magnitude coefficient. An empty
    /// coefficient field means zero; `[0x80]` means negative zero.
    pub(crate) fn encode_payload(&self, buf: &mut Vec<u8>) {
        crate::varint::write_varint(buf, self.exponent);
        if self.neg_zero {
            buf.push(0x80);
            return;
        }
        if self.coefficient.is_zero() {
            return;
        }
        let (sign, mut bytes) = self.coefficient.to_bytes_be();
        if bytes[0] & 0x80 != 0 {
            bytes.insert(0, 0);
        }
        if sign == Sign::Minus {
            bytes[0] |= 0x80;
        }
        buf.extend_from_slice(&bytes);
    }

    /// Decode the exponent + coefficient payload, returning the value and
    /// the number of bytes consumed.
    pub(crate) fn decode_payload(buf: &[u8], offset: usize) -> crate::error::Result<(Self, usize)> {
        let (exponent, exp_len) = crate::varint::read_varint(buf, offset)?;
        let coeff_bytes = &buf[exp_len..];
        if coeff_bytes.is_empty() {
            return Ok((Decimal::new(BigInt::zero(), exponent), exp_len));
        }
        if coeff_bytes == [0x80] {
            return Ok((Decimal::negative_zero(exponent), exp_len + 1));
        }
        let negative = coeff_bytes[0] & 0x80 != 0;
        let mut magnitude = coeff_bytes.to_vec();
        magnitude[0] &= 0x7F;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        let coefficient = BigInt::from_bytes_be(sign, &magnitude);
        Ok((Decimal::new(coefficient, exponent), exp_len + coeff_bytes.len()))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.neg_zero == other.neg_zero
            && self.exponent == other.exponent
            && self.coefficient == other.coefficient
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.neg_zero {
            write!(f, "-0d{}", self.exponent)
        } else {
            write!(f, "{}d{}", self.coefficient, self.exponent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_zero_round_trips() {
        let d = Decimal::new(BigInt::zero(), 0);
        let mut buf = Vec::new();
        d.encode_payload(&mut buf);
        assert_eq!(buf, vec![0x80]); // VarInt(0) is a single 0x80 byte, empty coefficient
        let (back, len) = Decimal::decode_payload(&buf, 0).unwrap();
        assert_eq!(len, buf.len());
        assert_eq!(back, d);
        assert!(!back.is_negative_zero());
    }

    #[test]
    fn negative_zero_round_trips_and_differs_from_zero() {
        let neg = Decimal::negative_zero(0);
        let pos = Decimal::new(BigInt::zero(), 0);
        assert_ne!(neg, pos);
        let mut buf = Vec::new();
        neg.encode_payload(&mut buf);
        assert_eq!(buf, vec![0x80, 0x80]);
        let (back, len) = Decimal::decode_payload(&buf, 0).unwrap();
        assert_eq!(len, buf.len());
        assert!(back.is_negative_zero());
    }

    #[test]
    fn nonzero_round_trip() {
        for (coeff, exp) in [(1234i64, -2i64), (-1, 0), (-128, 5), (255, 0)] {
            let d = Decimal::new(BigInt::from(coeff), exp);
            let mut buf = Vec::new();
            d.encode_payload(&mut buf);
            let (back, len) = Decimal::decode_payload(&buf, 0).unwrap();
            assert_eq!(len, buf.len());
            assert_eq!(back, d, "round trip of {coeff}e{exp}");
        }
    }
}
