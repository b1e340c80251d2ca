//! Stamper state machine.
//!
//! Holds an ephemeral recipient key, opens credential bundles sealed to it,
//! and signs request payloads with the loaded credential.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  init   ┌─────────────┐  inject_credential_bundle  ┌──────────────────┐
//! │ Uninitialized │────────>│ Initialized │───────────────────────────>│ CredentialLoaded │
//! └───────────────┘         └─────────────┘                            └──────────────────┘
//!                                  ↑           clear_credential                │  │
//!                                  └───────────────────────────────────────────┘  │
//!                                                                    inject / stamp
//! ```
//!
//! A failed call never changes state: a bundle that does not open leaves any
//! previously loaded credential in place.

use std::fmt;

use keystamp_crypto::{
    Jwk, KeyPair, NamedCurve, SecretBytes,
    ec::{compress_public_key, derive_public_key},
    signature::p1363_to_der,
};
use tracing::debug;
use zeroize::Zeroize;

use crate::{
    bundle::{CredentialBundle, credential_suite},
    config::StamperConfig,
    error::StamperError,
    provider::{CryptoProvider, P256_CRV, RustCryptoProvider},
    stamp::{SIGNATURE_SCHEME, Stamp, StampEnvelope},
};

/// Stamper lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StamperState {
    /// No recipient key yet
    Uninitialized,
    /// Recipient key held, no credential
    Initialized,
    /// Credential loaded, ready to stamp
    CredentialLoaded,
}

/// Request stamper.
///
/// Generic over the [`CryptoProvider`] so tests can run with seeded
/// randomness. Calls take `&mut self`; one instance serves one caller at a
/// time.
pub struct Stamper<P: CryptoProvider = RustCryptoProvider> {
    state: StamperState,
    config: StamperConfig,
    provider: P,
    /// HPKE recipient key pair (DHKEM P-256)
    recipient: Option<KeyPair>,
    /// Uncompressed recipient public key, hex
    public_key_hex: Option<String>,
    /// Raw P-256 scalar opened from the last bundle
    credential: Option<SecretBytes>,
}

impl Stamper<RustCryptoProvider> {
    /// Create an uninitialized stamper using the default provider.
    pub fn new(config: StamperConfig) -> Self {
        Self::with_provider(config, RustCryptoProvider::new())
    }
}

impl<P: CryptoProvider> Stamper<P> {
    /// Create an uninitialized stamper using `provider`.
    pub fn with_provider(config: StamperConfig, provider: P) -> Self {
        Self {
            state: StamperState::Uninitialized,
            config,
            provider,
            recipient: None,
            public_key_hex: None,
            credential: None,
        }
    }

    /// Create an initialized stamper around an existing recipient private
    /// key (32-byte P-256 scalar) instead of a fresh one.
    ///
    /// # Errors
    ///
    /// - `Crypto(InvalidParam)` / `Crypto(InvalidKey)` if the scalar is not
    ///   a valid P-256 private key
    pub fn with_recipient_key(
        config: StamperConfig,
        provider: P,
        private_key: &[u8],
    ) -> Result<Self, StamperError> {
        let suite = credential_suite();
        let public = derive_public_key(NamedCurve::P256, private_key)?;
        let recipient = KeyPair {
            private_key: suite.kem().deserialize_private_key(private_key)?,
            public_key: suite.kem().deserialize_public_key(&public)?,
        };

        let mut stamper = Self::with_provider(config, provider);
        stamper.set_recipient(recipient);
        Ok(stamper)
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> StamperState {
        self.state
    }

    /// Configuration this stamper was built with
    pub fn config(&self) -> &StamperConfig {
        &self.config
    }

    /// Generate the recipient key pair and return its public half (hex,
    /// uncompressed).
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless the stamper is Uninitialized
    /// - `Crypto(DeriveKeyPair)` if key derivation fails
    pub fn init(&mut self) -> Result<&str, StamperError> {
        if self.state != StamperState::Uninitialized {
            return Err(StamperError::InvalidState { state: self.state, operation: "initialize" });
        }

        let suite = credential_suite();
        let mut ikm = SecretBytes::new(vec![0; suite.kem().private_key_size()]);
        self.provider.random_bytes(ikm.as_mut_bytes());
        let recipient = suite.kem().derive_key_pair(ikm.as_bytes())?;

        Ok(self.set_recipient(recipient))
    }

    /// Recipient public key, hex-encoded uncompressed SEC1.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stamper is Uninitialized
    pub fn public_key(&self) -> Result<&str, StamperError> {
        self.public_key_hex.as_deref().ok_or(StamperError::InvalidState {
            state: self.state,
            operation: "read public key before init",
        })
    }

    /// Decode and open a credential bundle sealed to this stamper's public
    /// key. On success any previous credential is wiped and replaced.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stamper is Uninitialized
    /// - `Decode` / `InvalidParam` / `Crypto(InvalidPoint)` for a malformed
    ///   bundle
    /// - `Crypto(Open)` if the bundle was not sealed to this key
    /// - `InvalidParam` if the opened credential is not a P-256 scalar
    pub fn inject_credential_bundle(&mut self, bundle: &str) -> Result<(), StamperError> {
        let Some(recipient) = &self.recipient else {
            return Err(StamperError::InvalidState {
                state: self.state,
                operation: "inject credential bundle",
            });
        };

        let bundle = CredentialBundle::decode(bundle, self.config.bundle_format)?;
        let credential = bundle.open(recipient, &self.config.hpke_info)?;
        derive_public_key(NamedCurve::P256, credential.as_bytes()).map_err(|e| {
            StamperError::invalid_param(format!("credential is not a P-256 private key: {e}"))
        })?;

        if let Some(mut previous) = self.credential.replace(credential) {
            previous.zeroize();
        }
        self.transition(StamperState::CredentialLoaded);
        Ok(())
    }

    /// Sign `payload` with the loaded credential.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless a credential is loaded
    /// - `Provider` if the provider rejects the key or fails to sign
    pub fn stamp(&self, payload: &str) -> Result<Stamp, StamperError> {
        let (StamperState::CredentialLoaded, Some(credential)) = (self.state, &self.credential) else {
            return Err(StamperError::InvalidState {
                state: self.state,
                operation: "sign payload without credential",
            });
        };

        let public = derive_public_key(NamedCurve::P256, credential.as_bytes())?;
        let key = {
            let jwk = Jwk::ec_private(P256_CRV, NamedCurve::P256.field_size(), &public, credential)?;
            self.provider.import_signing_key(&jwk)?
        };

        let signature = self.provider.sign(&key, payload.as_bytes())?;
        let der = p1363_to_der(&signature)?;
        let compressed = compress_public_key(NamedCurve::P256, &public)?;

        debug!(payload_len = payload.len(), "stamped payload");
        Stamp::from_envelope(&StampEnvelope {
            public_key: hex::encode(compressed),
            scheme: SIGNATURE_SCHEME.to_string(),
            signature: hex::encode(der),
        })
    }

    /// Wipe the loaded credential, returning to Initialized. No-op in other
    /// states.
    pub fn clear_credential(&mut self) {
        if let Some(mut credential) = self.credential.take() {
            credential.zeroize();
            self.transition(StamperState::Initialized);
        }
    }

    fn set_recipient(&mut self, recipient: KeyPair) -> &str {
        let public_key_hex = hex::encode(recipient.public_key.as_bytes());
        self.recipient = Some(recipient);
        self.transition(StamperState::Initialized);
        self.public_key_hex.insert(public_key_hex).as_str()
    }

    fn transition(&mut self, to: StamperState) {
        debug!(from = ?self.state, ?to, "stamper state transition");
        self.state = to;
    }
}

impl<P: CryptoProvider> fmt::Debug for Stamper<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stamper")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("public_key", &self.public_key_hex)
            .finish_non_exhaustive()
    }
}
