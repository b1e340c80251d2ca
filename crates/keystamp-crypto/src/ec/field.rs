//! Prime-field arithmetic.
//!
//! Variable-time. Used for public-key derivation, point (de)compression and
//! the X448 ladder; never for long-lived secrets held across calls.

use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigUint;

use crate::error::CryptoError;

/// An integer modulo `prime`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FieldElement<'p> {
    value: BigUint,
    prime: &'p BigUint,
}

impl<'p> FieldElement<'p> {
    /// Canonical element. Rejects values outside `[0, prime)`.
    pub(crate) fn new(value: BigUint, prime: &'p BigUint) -> Result<Self, CryptoError> {
        if &value >= prime {
            return Err(CryptoError::invalid_point("coordinate is not in [0, p)"));
        }
        Ok(Self { value, prime })
    }

    /// Element from an arbitrary integer, reduced modulo `prime`.
    pub(crate) fn reduce(value: &BigUint, prime: &'p BigUint) -> Self {
        Self { value: value % prime, prime }
    }

    pub(crate) fn from_u32(value: u32, prime: &'p BigUint) -> Self {
        Self::reduce(&BigUint::from(value), prime)
    }

    pub(crate) fn zero(prime: &'p BigUint) -> Self {
        Self { value: BigUint::default(), prime }
    }

    pub(crate) fn one(prime: &'p BigUint) -> Self {
        Self::from_u32(1, prime)
    }

    pub(crate) fn value(&self) -> &BigUint {
        &self.value
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.value.bits() == 0
    }

    pub(crate) fn is_odd(&self) -> bool {
        self.value.bit(0)
    }

    /// `self^exponent` by left-to-right square-and-multiply.
    pub(crate) fn pow(&self, exponent: &BigUint) -> Self {
        let mut result = BigUint::from(1u32) % self.prime;
        for i in (0..exponent.bits()).rev() {
            result = (&result * &result) % self.prime;
            if exponent.bit(i) {
                result = (&result * &self.value) % self.prime;
            }
        }
        Self { value: result, prime: self.prime }
    }

    /// Multiplicative inverse via Fermat's little theorem (`self^(p-2)`).
    pub(crate) fn inverse(&self) -> Result<Self, CryptoError> {
        if self.is_zero() {
            return Err(CryptoError::invalid_point("inverse of zero"));
        }
        let exponent = self.prime - BigUint::from(2u32);
        Ok(self.pow(&exponent))
    }

    /// `self / rhs`, failing when `rhs` is zero.
    pub(crate) fn checked_div(&self, rhs: &Self) -> Result<Self, CryptoError> {
        Ok(self * &rhs.inverse()?)
    }

    /// Square root for primes with `p ≡ 3 (mod 4)`: `self^((p+1)/4)`,
    /// verified by squaring.
    pub(crate) fn sqrt(&self) -> Result<Self, CryptoError> {
        let exponent = (self.prime + BigUint::from(1u32)) / BigUint::from(4u32);
        let root = self.pow(&exponent);
        if &(&root * &root) != self {
            return Err(CryptoError::invalid_point("value is not a quadratic residue"));
        }
        Ok(root)
    }

    /// Fixed-width big-endian encoding.
    pub(crate) fn to_be_bytes(&self, len: usize) -> Vec<u8> {
        let raw = self.value.to_bytes_be();
        let raw = &raw[raw.len().saturating_sub(len)..];
        let mut out = vec![0u8; len];
        out[len - raw.len()..].copy_from_slice(raw);
        out
    }

    /// Fixed-width little-endian encoding.
    pub(crate) fn to_le_bytes(&self, len: usize) -> Vec<u8> {
        let mut out = self.value.to_bytes_le();
        out.resize(len, 0);
        out
    }
}

impl<'p> Add for &FieldElement<'p> {
    type Output = FieldElement<'p>;

    fn add(self, rhs: Self) -> FieldElement<'p> {
        debug_assert_eq!(self.prime, rhs.prime);
        FieldElement { value: (&self.value + &rhs.value) % self.prime, prime: self.prime }
    }
}

impl<'p> Sub for &FieldElement<'p> {
    type Output = FieldElement<'p>;

    fn sub(self, rhs: Self) -> FieldElement<'p> {
        debug_assert_eq!(self.prime, rhs.prime);
        FieldElement {
            value: (&self.value + self.prime - &rhs.value) % self.prime,
            prime: self.prime,
        }
    }
}

impl<'p> Mul for &FieldElement<'p> {
    type Output = FieldElement<'p>;

    fn mul(self, rhs: Self) -> FieldElement<'p> {
        debug_assert_eq!(self.prime, rhs.prime);
        FieldElement { value: (&self.value * &rhs.value) % self.prime, prime: self.prime }
    }
}

impl<'p> Neg for &FieldElement<'p> {
    type Output = FieldElement<'p>;

    fn neg(self) -> FieldElement<'p> {
        &FieldElement::zero(self.prime) - self
    }
}
