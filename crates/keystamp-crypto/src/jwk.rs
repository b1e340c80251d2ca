//! JSON Web Key (RFC 7517/7518/8037) representation for EC and OKP keys.
//!
//! Only the members needed for key import are modelled. Coordinates and
//! private values are unpadded Base64url, fixed-width big-endian for EC and
//! raw little-endian strings for OKP, as the RFCs define them.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{ec::UNCOMPRESSED_PREFIX, error::CryptoError, secret::SecretBytes};

/// `kty` for elliptic-curve keys.
pub const KTY_EC: &str = "EC";

/// `kty` for octet key pairs (X25519, X448).
pub const KTY_OKP: &str = "OKP";

/// A JWK. `d` is present only for private keys and is wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Jwk {
    /// Key type, `"EC"` or `"OKP"`
    pub kty: String,
    /// Curve name, e.g. `"P-256"` or `"X25519"`
    pub crv: String,
    /// X coordinate (EC) or public key (OKP)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate (EC only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Private scalar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl Jwk {
    /// Public EC JWK from an uncompressed SEC1 point.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `point` is not `0x04 ‖ x ‖ y` with `field_size`
    ///   coordinates
    pub fn ec_public(crv: &str, field_size: usize, point: &[u8]) -> Result<Self, CryptoError> {
        if point.len() != 1 + 2 * field_size || point[0] != UNCOMPRESSED_PREFIX {
            return Err(CryptoError::invalid_param("expected an uncompressed SEC1 point"));
        }
        let (x, y) = point[1..].split_at(field_size);
        Ok(Self {
            kty: KTY_EC.to_string(),
            crv: crv.to_string(),
            x: Some(URL_SAFE_NO_PAD.encode(x)),
            y: Some(URL_SAFE_NO_PAD.encode(y)),
            d: None,
        })
    }

    /// Private EC JWK: the public point plus the scalar `d`.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `point` is malformed or `d` is not `field_size`
    ///   bytes
    pub fn ec_private(
        crv: &str,
        field_size: usize,
        point: &[u8],
        d: &SecretBytes,
    ) -> Result<Self, CryptoError> {
        if d.len() != field_size {
            return Err(CryptoError::invalid_param(format!(
                "private scalar must be {field_size} bytes, got {}",
                d.len()
            )));
        }
        let mut jwk = Self::ec_public(crv, field_size, point)?;
        jwk.d = Some(URL_SAFE_NO_PAD.encode(d.as_bytes()));
        Ok(jwk)
    }

    /// Parse from JSON text.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if the text is not a JWK object
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::invalid_param(format!("malformed JWK: {e}")))
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        let Ok(json) = serde_json::to_string(self) else {
            unreachable!("a struct of strings always serializes");
        };
        json
    }

    /// Check `kty` and `crv`.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` on mismatch
    pub fn expect_curve(&self, kty: &str, crv: &str) -> Result<(), CryptoError> {
        if self.kty != kty || self.crv != crv {
            return Err(CryptoError::invalid_param(format!(
                "expected {kty}/{crv} JWK, got {}/{}",
                self.kty, self.crv
            )));
        }
        Ok(())
    }

    /// Uncompressed SEC1 point `0x04 ‖ x ‖ y` from an EC JWK.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `x` or `y` is missing, not Base64url, or not
    ///   `field_size` bytes
    pub fn ec_point(&self, field_size: usize) -> Result<Vec<u8>, CryptoError> {
        let x = decode_member("x", self.x.as_deref(), field_size)?;
        let y = decode_member("y", self.y.as_deref(), field_size)?;

        let mut point = Vec::with_capacity(1 + 2 * field_size);
        point.push(UNCOMPRESSED_PREFIX);
        point.extend_from_slice(&x);
        point.extend_from_slice(&y);
        Ok(point)
    }

    /// Public key bytes (`x`) from an OKP JWK.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `x` is missing, not Base64url, or not `size` bytes
    pub fn okp_public(&self, size: usize) -> Result<Vec<u8>, CryptoError> {
        decode_member("x", self.x.as_deref(), size)
    }

    /// Private value `d`.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `d` is missing, not Base64url, or not `size` bytes
    pub fn private_value(&self, size: usize) -> Result<SecretBytes, CryptoError> {
        decode_member("d", self.d.as_deref(), size).map(SecretBytes::new)
    }

    /// True if the key carries a private value.
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &self.d.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn decode_member(name: &str, value: Option<&str>, len: usize) -> Result<Vec<u8>, CryptoError> {
    let Some(value) = value else {
        return Err(CryptoError::invalid_param(format!("JWK is missing \"{name}\"")));
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| CryptoError::invalid_param(format!("JWK \"{name}\" is not base64url: {e}")))?;
    if bytes.len() != len {
        return Err(CryptoError::invalid_param(format!(
            "JWK \"{name}\" must be {len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
