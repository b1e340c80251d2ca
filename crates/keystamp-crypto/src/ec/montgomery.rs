//! RFC 7748 Montgomery ladder for X25519 and X448.
//!
//! Shares the field arithmetic with the Weierstrass code. Variable-time;
//! `DhKemX448` is the production user, X25519 exists here so the ladder can
//! be cross-checked against x25519-dalek.

use std::{mem, sync::LazyLock};

use num_bigint::BigUint;

use super::field::FieldElement;

/// Montgomery curve parameters for the ladder.
#[derive(Debug)]
pub(crate) struct MontgomeryCurve {
    p: BigUint,
    a24: u32,
    /// Scalar bits processed by the ladder
    bits: u64,
    /// Encoded scalar and coordinate width
    pub(crate) size: usize,
}

#[cfg(test)]
static CURVE25519: LazyLock<MontgomeryCurve> = LazyLock::new(|| MontgomeryCurve {
    p: (BigUint::from(1u32) << 255usize) - BigUint::from(19u32),
    a24: 121_665,
    bits: 255,
    size: 32,
});

static CURVE448: LazyLock<MontgomeryCurve> = LazyLock::new(|| MontgomeryCurve {
    p: (BigUint::from(1u32) << 448usize) - (BigUint::from(1u32) << 224usize) - BigUint::from(1u32),
    a24: 39_081,
    bits: 448,
    size: 56,
});

/// u-coordinate of the X448 base point.
pub(crate) const X448_BASE_POINT: u8 = 5;

/// u-coordinate of the X25519 base point.
#[cfg(test)]
pub(crate) const X25519_BASE_POINT: u8 = 9;

/// X25519 scalar multiplication.
#[cfg(test)]
pub(crate) fn x25519(scalar: &[u8; 32], u: &[u8; 32]) -> [u8; 32] {
    let mut k = *scalar;
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;

    let mut u = *u;
    u[31] &= 127;

    let out = ladder(&CURVE25519, &k, &u);
    let mut result = [0u8; 32];
    result.copy_from_slice(&out);
    result
}

/// X448 scalar multiplication.
pub(crate) fn x448(scalar: &[u8; 56], u: &[u8; 56]) -> [u8; 56] {
    let mut k = *scalar;
    k[0] &= 252;
    k[55] |= 128;

    let out = ladder(&CURVE448, &k, u);
    let mut result = [0u8; 56];
    result.copy_from_slice(&out);
    result
}

/// Base-point encoding for a curve: the single-byte u-coordinate, little-endian.
pub(crate) fn base_point<const N: usize>(u: u8) -> [u8; N] {
    let mut out = [0u8; N];
    out[0] = u;
    out
}

fn ladder(curve: &MontgomeryCurve, clamped_scalar: &[u8], u: &[u8]) -> Vec<u8> {
    let p = &curve.p;
    let k = BigUint::from_bytes_le(clamped_scalar);
    let x1 = FieldElement::reduce(&BigUint::from_bytes_le(u), p);
    let a24 = FieldElement::from_u32(curve.a24, p);

    let mut x2 = FieldElement::one(p);
    let mut z2 = FieldElement::zero(p);
    let mut x3 = x1.clone();
    let mut z3 = FieldElement::one(p);
    let mut swap = false;

    for t in (0..curve.bits).rev() {
        let bit = k.bit(t);
        swap ^= bit;
        if swap {
            mem::swap(&mut x2, &mut x3);
            mem::swap(&mut z2, &mut z3);
        }
        swap = bit;

        let a = &x2 + &z2;
        let aa = &a * &a;
        let b = &x2 - &z2;
        let bb = &b * &b;
        let e = &aa - &bb;
        let c = &x3 + &z3;
        let d = &x3 - &z3;
        let da = &d * &a;
        let cb = &c * &b;

        let sum = &da + &cb;
        let diff = &da - &cb;
        x3 = &sum * &sum;
        z3 = &x1 * &(&diff * &diff);
        x2 = &aa * &bb;
        z2 = &e * &(&aa + &(&a24 * &e));
    }
    if swap {
        mem::swap(&mut x2, &mut x3);
        mem::swap(&mut z2, &mut z3);
    }

    // z2 = 0 (low-order input) maps to the all-zero output, as RFC 7748 expects.
    let exponent = p - BigUint::from(2u32);
    (&x2 * &z2.pow(&exponent)).to_le_bytes(curve.size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<const N: usize>(hex_str: &str) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&hex::decode(hex_str).unwrap());
        out
    }

    #[test]
    fn x25519_matches_dalek() {
        for seed in [1u8, 7, 0x42, 0xFF] {
            let scalar = [seed; 32];
            let public = x25519(&scalar, &base_point(X25519_BASE_POINT));
            let reference = x25519_dalek::x25519(scalar, x25519_dalek::X25519_BASEPOINT_BYTES);
            assert_eq!(public, reference, "seed {seed}");
        }
    }

    #[test]
    fn x448_public_key_vector() {
        let mut scalar = [0u8; 56];
        for (i, byte) in scalar.iter_mut().enumerate() {
            *byte = i as u8;
        }

        let public = x448(&scalar, &base_point(X448_BASE_POINT));
        let expected: [u8; 56] = decode(
            "3c6fd1d02960e0d9e93308fc65736141c30db307977f81b7b10996e51e53f573\
             e5c86621205ff491209d3b7cd7933428177ba4defae14dc1",
        );
        assert_eq!(public, expected);
    }

    #[test]
    fn x448_shared_secret_is_symmetric() {
        let alice = [0x11u8; 56];
        let bob = [0x5Au8; 56];
        let base = base_point(X448_BASE_POINT);

        let alice_public = x448(&alice, &base);
        let bob_public = x448(&bob, &base);

        assert_eq!(x448(&alice, &bob_public), x448(&bob, &alice_public));
    }

    #[test]
    fn low_order_input_yields_zero() {
        let zero = [0u8; 56];
        assert_eq!(x448(&[0x33; 56], &zero), [0u8; 56]);
    }
}
