//! Short Weierstrass domain parameters (`y^2 = x^3 + ax + b`, `a = -3`).

use std::sync::LazyLock;

use num_bigint::BigUint;

use super::NamedCurve;

/// Domain parameters for one named curve.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CurveParams {
    /// Field prime
    pub(crate) p: BigUint,
    pub(crate) a: BigUint,
    pub(crate) b: BigUint,
    /// Generator
    pub(crate) gx: BigUint,
    pub(crate) gy: BigUint,
    /// Group order
    pub(crate) n: BigUint,
    /// Coordinate width in bytes
    pub(crate) field_size: usize,
}

impl CurveParams {
    fn from_hex(p: &str, b: &str, gx: &str, gy: &str, n: &str, field_size: usize) -> Self {
        let p = parse_hex(p);
        let a = &p - BigUint::from(3u32);
        Self { a, b: parse_hex(b), gx: parse_hex(gx), gy: parse_hex(gy), n: parse_hex(n), p, field_size }
    }
}

fn parse_hex(hex: &str) -> BigUint {
    let Some(value) = BigUint::parse_bytes(hex.as_bytes(), 16) else {
        unreachable!("curve constants are valid hexadecimal");
    };
    value
}

static P256: LazyLock<CurveParams> = LazyLock::new(|| {
    CurveParams::from_hex(
        "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
        "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b",
        "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
        "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
        "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551",
        32,
    )
});

static P384: LazyLock<CurveParams> = LazyLock::new(|| {
    CurveParams::from_hex(
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe\
         ffffffff0000000000000000ffffffff",
        "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875a\
         c656398d8a2ed19d2a85c8edd3ec2aef",
        "aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a38\
         5502f25dbf55296c3a545e3872760ab7",
        "3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c0\
         0a60b1ce1d7e819d7a431d7c90ea0e5f",
        "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf\
         581a0db248b0a77aecec196accc52973",
        48,
    )
});

static P521: LazyLock<CurveParams> = LazyLock::new(|| {
    CurveParams::from_hex(
        "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\
         ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\
         ffff",
        "0051953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef1\
         09e156193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b50\
         3f00",
        "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d\
         3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5\
         bd66",
        "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e\
         662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd1\
         6650",
        "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff\
         fffa51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e9138\
         6409",
        66,
    )
});

pub(crate) fn params(curve: NamedCurve) -> &'static CurveParams {
    match curve {
        NamedCurve::P256 => &*P256,
        NamedCurve::P384 => &*P384,
        NamedCurve::P521 => &*P521,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primes_are_three_mod_four() {
        let four = BigUint::from(4u32);
        for curve in [NamedCurve::P256, NamedCurve::P384, NamedCurve::P521] {
            assert_eq!(&params(curve).p % &four, BigUint::from(3u32), "{curve:?}");
        }
    }

    #[test]
    fn field_sizes_cover_the_prime() {
        for curve in [NamedCurve::P256, NamedCurve::P384, NamedCurve::P521] {
            let params = params(curve);
            let bits = params.p.bits() as usize;
            assert_eq!(params.field_size, bits.div_ceil(8), "{curve:?}");
        }
    }
}
