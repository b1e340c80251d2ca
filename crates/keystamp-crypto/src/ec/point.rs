//! Affine point arithmetic on short Weierstrass curves.

use num_bigint::BigUint;

use super::{curve::CurveParams, field::FieldElement};
use crate::error::CryptoError;

/// A point on `curve`, or the point at infinity when `coords` is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CurvePoint<'c> {
    curve: &'c CurveParams,
    coords: Option<(FieldElement<'c>, FieldElement<'c>)>,
}

impl<'c> CurvePoint<'c> {
    pub(crate) fn identity(curve: &'c CurveParams) -> Self {
        Self { curve, coords: None }
    }

    /// Affine point from integer coordinates.
    ///
    /// # Errors
    ///
    /// - `InvalidPoint` if a coordinate is outside `[0, p)`
    /// - `NotOnCurve` if `(x, y)` does not satisfy the curve equation
    pub(crate) fn new(curve: &'c CurveParams, x: BigUint, y: BigUint) -> Result<Self, CryptoError> {
        let x = FieldElement::new(x, &curve.p)?;
        let y = FieldElement::new(y, &curve.p)?;
        if &y * &y != curve_rhs(curve, &x) {
            return Err(CryptoError::NotOnCurve);
        }
        Ok(Self { curve, coords: Some((x, y)) })
    }

    pub(crate) fn generator(curve: &'c CurveParams) -> Result<Self, CryptoError> {
        Self::new(curve, curve.gx.clone(), curve.gy.clone())
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.coords.is_none()
    }

    pub(crate) fn coordinates(&self) -> Option<(&FieldElement<'c>, &FieldElement<'c>)> {
        self.coords.as_ref().map(|(x, y)| (x, y))
    }

    /// Group law: identity, inverse, tangent (doubling) and secant cases.
    pub(crate) fn add_point(&self, other: &Self) -> Result<Self, CryptoError> {
        let (Some((x1, y1)), Some((x2, y2))) = (&self.coords, &other.coords) else {
            return Ok(if self.is_identity() { other.clone() } else { self.clone() });
        };

        let lambda = if x1 == x2 {
            if (y1 + y2).is_zero() {
                return Ok(Self::identity(self.curve));
            }
            let a = FieldElement::reduce(&self.curve.a, &self.curve.p);
            let three = FieldElement::from_u32(3, &self.curve.p);
            let numerator = &(&three * &(x1 * x1)) + &a;
            numerator.checked_div(&(y1 + y1))?
        } else {
            (y2 - y1).checked_div(&(x2 - x1))?
        };

        let x3 = &(&(&lambda * &lambda) - x1) - x2;
        let y3 = &(&lambda * &(x1 - &x3)) - y1;
        Ok(Self { curve: self.curve, coords: Some((x3, y3)) })
    }

    /// `scalar · self` by left-to-right double-and-add.
    pub(crate) fn multiply(&self, scalar: &BigUint) -> Result<Self, CryptoError> {
        let mut acc = Self::identity(self.curve);
        for i in (0..scalar.bits()).rev() {
            acc = acc.add_point(&acc)?;
            if scalar.bit(i) {
                acc = acc.add_point(self)?;
            }
        }
        Ok(acc)
    }
}

/// `x^3 + ax + b`
pub(crate) fn curve_rhs<'c>(curve: &'c CurveParams, x: &FieldElement<'c>) -> FieldElement<'c> {
    let a = FieldElement::reduce(&curve.a, &curve.p);
    let b = FieldElement::reduce(&curve.b, &curve.p);
    &(&(&(x * x) * x) + &(&a * x)) + &b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::{NamedCurve, curve::params};

    #[test]
    fn generator_is_on_curve() {
        for curve in [NamedCurve::P256, NamedCurve::P384, NamedCurve::P521] {
            assert!(CurvePoint::generator(params(curve)).is_ok(), "{curve:?}");
        }
    }

    #[test]
    fn off_curve_point_is_rejected() {
        let curve = params(NamedCurve::P256);
        let y = &curve.gy + BigUint::from(1u32);
        assert_eq!(CurvePoint::new(curve, curve.gx.clone(), y), Err(CryptoError::NotOnCurve));
    }

    #[test]
    fn out_of_range_coordinate_is_invalid() {
        let curve = params(NamedCurve::P256);
        let result = CurvePoint::new(curve, curve.p.clone(), curve.gy.clone());
        assert!(matches!(result, Err(CryptoError::InvalidPoint { .. })));
    }

    #[test]
    fn identity_is_neutral() {
        let curve = params(NamedCurve::P256);
        let g = CurvePoint::generator(curve).unwrap();
        let o = CurvePoint::identity(curve);

        assert_eq!(g.add_point(&o).unwrap(), g);
        assert_eq!(o.add_point(&g).unwrap(), g);
        assert!(o.add_point(&o).unwrap().is_identity());
    }

    #[test]
    fn point_plus_inverse_is_identity() {
        let curve = params(NamedCurve::P256);
        let g = CurvePoint::generator(curve).unwrap();
        let neg_y = &curve.p - &curve.gy;
        let neg_g = CurvePoint::new(curve, curve.gx.clone(), neg_y).unwrap();

        assert!(g.add_point(&neg_g).unwrap().is_identity());
    }

    #[test]
    fn doubling_agrees_with_scalar_two() {
        let curve = params(NamedCurve::P256);
        let g = CurvePoint::generator(curve).unwrap();
        let doubled = g.add_point(&g).unwrap();

        assert_eq!(g.multiply(&BigUint::from(2u32)).unwrap(), doubled);
        let tripled = doubled.add_point(&g).unwrap();
        assert_eq!(g.multiply(&BigUint::from(3u32)).unwrap(), tripled);
    }

    #[test]
    fn order_times_generator_is_identity() {
        let curve = params(NamedCurve::P256);
        let g = CurvePoint::generator(curve).unwrap();
        assert!(g.multiply(&curve.n).unwrap().is_identity());
    }
}
