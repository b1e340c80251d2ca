//! Platform cryptographic provider boundary.
//!
//! The stamper never signs by itself. It hands the provider a JWK (private
//! scalar plus the public point derived by the EC library) and asks for a
//! raw IEEE-P1363 signature. Providers model platform keystores that can
//! import a JWK but not a bare scalar, which is why the public point has to
//! be computed first.
//!
//! The provider is also the stamper's only source of randomness, so tests
//! can substitute a seeded one and get reproducible recipient keys.

use keystamp_crypto::{Jwk, NamedCurve};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use rand::{RngCore, rngs::OsRng};

use crate::error::StamperError;

/// JWK `crv` for P-256.
pub const P256_CRV: &str = "P-256";

/// Signing and randomness capabilities the stamper depends on.
///
/// # Invariants
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `sign()` hashes the message with SHA-256 and returns `r ‖ s`, each
///   32 bytes big-endian
pub trait CryptoProvider {
    /// Provider-side handle for an imported signing key.
    type SigningKey;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Import a private P-256 JWK for ECDSA signing.
    ///
    /// # Errors
    ///
    /// - `Provider` if the key is malformed or its public point does not
    ///   match the scalar
    fn import_signing_key(&self, jwk: &Jwk) -> Result<Self::SigningKey, StamperError>;

    /// ECDSA-sign `message` with SHA-256, returning an IEEE-P1363 signature.
    ///
    /// # Errors
    ///
    /// - `Provider` if signing fails
    fn sign(&self, key: &Self::SigningKey, message: &[u8]) -> Result<Vec<u8>, StamperError>;
}

/// Default provider backed by the OS RNG and the RustCrypto `p256` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    /// Create a new provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for RustCryptoProvider {
    type SigningKey = SigningKey;

    fn random_bytes(&self, buffer: &mut [u8]) {
        OsRng.fill_bytes(buffer);
    }

    fn import_signing_key(&self, jwk: &Jwk) -> Result<SigningKey, StamperError> {
        let field_size = NamedCurve::P256.field_size();
        jwk.expect_curve(keystamp_crypto::jwk::KTY_EC, P256_CRV)
            .map_err(|e| StamperError::provider(e.to_string()))?;
        let d = jwk.private_value(field_size).map_err(|e| StamperError::provider(e.to_string()))?;
        let point = jwk.ec_point(field_size).map_err(|e| StamperError::provider(e.to_string()))?;

        let key = SigningKey::from_slice(d.as_bytes())
            .map_err(|_| StamperError::provider("private scalar out of range"))?;
        if key.verifying_key().to_encoded_point(false).as_bytes() != point.as_slice() {
            return Err(StamperError::provider("public point does not match private scalar"));
        }
        Ok(key)
    }

    fn sign(&self, key: &SigningKey, message: &[u8]) -> Result<Vec<u8>, StamperError> {
        let signature: Signature =
            key.try_sign(message).map_err(|e| StamperError::provider(format!("signing failed: {e}")))?;
        Ok(signature.to_bytes().to_vec())
    }
}
