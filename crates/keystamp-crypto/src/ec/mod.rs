//! Elliptic-curve primitive library.
//!
//! Finite-field and affine point arithmetic over the NIST prime curves, used
//! where a platform provider cannot do the job itself: deriving the public key
//! for a raw private scalar, and converting between compressed and
//! uncompressed SEC1 point encodings.
//!
//! Field elements and curve points never leave this module. The public surface
//! is byte-oriented: scalars and coordinates are fixed-width big-endian,
//! uncompressed points are `0x04 ‖ x ‖ y`, compressed points are
//! `(0x02 | 0x03) ‖ x`.
//!
//! # Security
//!
//! The arithmetic here is variable-time. It runs once per credential import on
//! the scalar being imported, never in a loop an attacker can time.

mod curve;
mod field;
pub(crate) mod montgomery;
mod point;

use num_bigint::BigUint;

use self::{curve::params, field::FieldElement, point::CurvePoint};
use crate::error::CryptoError;

/// SEC1 prefix of an uncompressed point.
pub const UNCOMPRESSED_PREFIX: u8 = 0x04;

/// SEC1 prefix of a compressed point with even `y`.
pub const COMPRESSED_EVEN_PREFIX: u8 = 0x02;

/// SEC1 prefix of a compressed point with odd `y`.
pub const COMPRESSED_ODD_PREFIX: u8 = 0x03;

/// Named short Weierstrass curves supported by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
    /// NIST P-521 (secp521r1)
    P521,
}

impl NamedCurve {
    /// Width of a field element or scalar in bytes.
    pub fn field_size(self) -> usize {
        params(self).field_size
    }

    /// Length of an uncompressed SEC1 point.
    pub fn uncompressed_len(self) -> usize {
        1 + 2 * self.field_size()
    }

    /// Length of a compressed SEC1 point.
    pub fn compressed_len(self) -> usize {
        1 + self.field_size()
    }
}

/// Public key `d·G` for the raw private scalar `d`, in uncompressed form.
///
/// # Errors
///
/// - `InvalidParam` if `scalar` is not exactly `field_size` bytes
/// - `InvalidKey` if `d` is zero or not below the group order
pub fn derive_public_key(curve: NamedCurve, scalar: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let params = params(curve);
    if scalar.len() != params.field_size {
        return Err(CryptoError::invalid_param(format!(
            "scalar must be {} bytes, got {}",
            params.field_size,
            scalar.len()
        )));
    }

    let d = BigUint::from_bytes_be(scalar);
    if d.bits() == 0 || d >= params.n {
        return Err(CryptoError::invalid_private_key("scalar out of range"));
    }

    let public = CurvePoint::generator(params)?.multiply(&d)?;
    encode_uncompressed(&public, params.field_size)
}

/// Compress the point `(x, y)`.
///
/// # Errors
///
/// - `InvalidParam` if a coordinate is not `field_size` bytes
/// - `InvalidPoint` if a coordinate is outside `[0, p)`
/// - `NotOnCurve` if `(x, y)` is not a curve point
pub fn compress_point(curve: NamedCurve, x: &[u8], y: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let params = params(curve);
    check_coordinate_len(x, params.field_size)?;
    check_coordinate_len(y, params.field_size)?;

    let point = CurvePoint::new(params, BigUint::from_bytes_be(x), BigUint::from_bytes_be(y))?;
    let Some((x, y)) = point.coordinates() else {
        unreachable!("affine construction never yields the identity");
    };

    let prefix = if y.is_odd() { COMPRESSED_ODD_PREFIX } else { COMPRESSED_EVEN_PREFIX };
    let mut out = Vec::with_capacity(1 + params.field_size);
    out.push(prefix);
    out.extend_from_slice(&x.to_be_bytes(params.field_size));
    Ok(out)
}

/// Compress an uncompressed SEC1 point.
///
/// # Errors
///
/// - `InvalidParam` if the length is wrong
/// - `InvalidPoint` if the prefix is not `0x04` or a coordinate is out of
///   range
/// - `NotOnCurve` if the coordinates are not a curve point
pub fn compress_public_key(curve: NamedCurve, uncompressed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let field_size = curve.field_size();
    if uncompressed.len() != curve.uncompressed_len() {
        return Err(CryptoError::invalid_param(format!(
            "uncompressed point must be {} bytes, got {}",
            curve.uncompressed_len(),
            uncompressed.len()
        )));
    }
    if uncompressed[0] != UNCOMPRESSED_PREFIX {
        return Err(CryptoError::invalid_point(format!(
            "expected prefix 0x04, got {:#04x}",
            uncompressed[0]
        )));
    }

    let (x, y) = uncompressed[1..].split_at(field_size);
    compress_point(curve, x, y)
}

/// Recover the uncompressed point from a compression prefix and `x`.
///
/// `y` is the square root of `x^3 + ax + b` whose parity matches `prefix`.
///
/// # Errors
///
/// - `InvalidParam` if `x` is not `field_size` bytes
/// - `InvalidPoint` if the prefix is not `0x02`/`0x03`, `x` is outside
///   `[0, p)`, or `x^3 + ax + b` has no square root
pub fn decompress_point(curve: NamedCurve, prefix: u8, x: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let params = params(curve);
    check_coordinate_len(x, params.field_size)?;

    let want_odd = match prefix {
        COMPRESSED_EVEN_PREFIX => false,
        COMPRESSED_ODD_PREFIX => true,
        other => {
            return Err(CryptoError::invalid_point(format!(
                "compression prefix must be 0x02 or 0x03, got {other:#04x}"
            )));
        },
    };

    let x = FieldElement::new(BigUint::from_bytes_be(x), &params.p)?;
    let root = point::curve_rhs(params, &x).sqrt()?;
    let y = if root.is_odd() == want_odd { root } else { -&root };

    let point = CurvePoint::new(params, x.value().clone(), y.value().clone())?;
    encode_uncompressed(&point, params.field_size)
}

/// Decompress a compressed SEC1 point.
///
/// # Errors
///
/// Same as [`decompress_point`], plus `InvalidParam` for an empty input.
pub fn decompress_public_key(curve: NamedCurve, compressed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let Some((&prefix, x)) = compressed.split_first() else {
        return Err(CryptoError::invalid_param("compressed point is empty"));
    };
    decompress_point(curve, prefix, x)
}

fn check_coordinate_len(coordinate: &[u8], field_size: usize) -> Result<(), CryptoError> {
    if coordinate.len() != field_size {
        return Err(CryptoError::invalid_param(format!(
            "coordinate must be {field_size} bytes, got {}",
            coordinate.len()
        )));
    }
    Ok(())
}

fn encode_uncompressed(point: &CurvePoint<'_>, field_size: usize) -> Result<Vec<u8>, CryptoError> {
    let Some((x, y)) = point.coordinates() else {
        return Err(CryptoError::invalid_point("point at infinity has no encoding"));
    };

    let mut out = Vec::with_capacity(1 + 2 * field_size);
    out.push(UNCOMPRESSED_PREFIX);
    out.extend_from_slice(&x.to_be_bytes(field_size));
    out.extend_from_slice(&y.to_be_bytes(field_size));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    use super::*;

    fn scalar(fill: u8, len: usize) -> Vec<u8> {
        let mut bytes = vec![fill; len];
        bytes[0] = 0x01;
        bytes
    }

    #[test]
    fn derive_matches_p256() {
        for fill in [0x01, 0x42, 0x7F, 0xEE] {
            let d = scalar(fill, 32);
            let derived = derive_public_key(NamedCurve::P256, &d).unwrap();

            let secret = p256::SecretKey::from_slice(&d).unwrap();
            let reference = secret.public_key().to_encoded_point(false);
            assert_eq!(derived, reference.as_bytes(), "fill {fill:#04x}");
        }
    }

    #[test]
    fn derive_matches_p384() {
        let d = scalar(0x5A, 48);
        let derived = derive_public_key(NamedCurve::P384, &d).unwrap();

        let secret = p384::SecretKey::from_slice(&d).unwrap();
        let reference = p384::elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(
            &secret.public_key(),
            false,
        );
        assert_eq!(derived, reference.as_bytes());
    }

    #[test]
    fn derive_of_one_is_generator() {
        let mut d = vec![0u8; 32];
        d[31] = 1;
        let derived = derive_public_key(NamedCurve::P256, &d).unwrap();

        let params = params(NamedCurve::P256);
        assert_eq!(&derived[1..33], params.gx.to_bytes_be().as_slice());
        assert_eq!(&derived[33..], params.gy.to_bytes_be().as_slice());
    }

    #[test]
    fn derive_rejects_zero_and_order() {
        let zero = vec![0u8; 32];
        assert!(matches!(
            derive_public_key(NamedCurve::P256, &zero),
            Err(CryptoError::InvalidKey { kind: "private", .. })
        ));

        let order = params(NamedCurve::P256).n.to_bytes_be();
        assert!(matches!(
            derive_public_key(NamedCurve::P256, &order),
            Err(CryptoError::InvalidKey { kind: "private", .. })
        ));
    }

    #[test]
    fn derive_rejects_wrong_length() {
        assert!(matches!(
            derive_public_key(NamedCurve::P256, &[1u8; 31]),
            Err(CryptoError::InvalidParam { .. })
        ));
    }

    #[test]
    fn compress_then_decompress_recovers_point() {
        let public = derive_public_key(NamedCurve::P256, &scalar(0x33, 32)).unwrap();
        let compressed = compress_public_key(NamedCurve::P256, &public).unwrap();

        assert_eq!(compressed.len(), 33);
        assert!(matches!(compressed[0], COMPRESSED_EVEN_PREFIX | COMPRESSED_ODD_PREFIX));
        assert_eq!(decompress_public_key(NamedCurve::P256, &compressed).unwrap(), public);
    }

    #[test]
    fn compression_matches_p256() {
        let d = scalar(0x21, 32);
        let secret = p256::SecretKey::from_slice(&d).unwrap();
        let reference = secret.public_key().to_encoded_point(true);

        let public = derive_public_key(NamedCurve::P256, &d).unwrap();
        assert_eq!(compress_public_key(NamedCurve::P256, &public).unwrap(), reference.as_bytes());
    }

    #[test]
    fn decompress_rejects_bad_prefix() {
        let x = params(NamedCurve::P256).gx.to_bytes_be();
        assert!(matches!(
            decompress_point(NamedCurve::P256, 0x04, &x),
            Err(CryptoError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn decompress_rejects_non_residue() {
        // x = 1 gives a quadratic non-residue on P-256.
        let mut x = vec![0u8; 32];
        x[31] = 1;
        assert!(matches!(
            decompress_point(NamedCurve::P256, COMPRESSED_EVEN_PREFIX, &x),
            Err(CryptoError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn decompress_rejects_x_out_of_range() {
        let p = params(NamedCurve::P256).p.to_bytes_be();
        assert!(matches!(
            decompress_point(NamedCurve::P256, COMPRESSED_EVEN_PREFIX, &p),
            Err(CryptoError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn compress_rejects_off_curve_point() {
        let params = params(NamedCurve::P256);
        let x = params.gx.to_bytes_be();
        let y = (&params.gy + BigUint::from(1u32)).to_bytes_be();
        assert_eq!(compress_point(NamedCurve::P256, &x, &y), Err(CryptoError::NotOnCurve));
    }

    #[test]
    fn p521_roundtrip_uses_66_byte_coordinates() {
        let public = derive_public_key(NamedCurve::P521, &scalar(0x09, 66)).unwrap();
        assert_eq!(public.len(), NamedCurve::P521.uncompressed_len());

        let compressed = compress_public_key(NamedCurve::P521, &public).unwrap();
        assert_eq!(compressed.len(), 67);
        assert_eq!(decompress_public_key(NamedCurve::P521, &compressed).unwrap(), public);
    }
}
