//! Error types for the Keystamp cryptographic primitives.
//!
//! Every variant is terminal for the operation that produced it. Nothing in
//! this crate retries internally; callers decide whether a fresh attempt
//! (with fresh inputs) makes sense.

use thiserror::Error;

/// Errors produced by the EC library, the HPKE engines and the signature
/// codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Unknown algorithm identifier, bad length, or otherwise malformed
    /// argument
    #[error("invalid parameter: {reason}")]
    InvalidParam {
        /// What was wrong with the parameter
        reason: String,
    },

    /// Coordinates do not satisfy the curve equation
    #[error("point is not on the curve")]
    NotOnCurve,

    /// Coordinate out of range, bad compression prefix, or no square root
    #[error("invalid point: {reason}")]
    InvalidPoint {
        /// Why the point was rejected
        reason: String,
    },

    /// Key bytes rejected by the KEM group
    #[error("invalid {kind} key: {reason}")]
    InvalidKey {
        /// `"public"` or `"private"`
        kind: &'static str,
        /// Why the key was rejected
        reason: String,
    },

    /// Deterministic key derivation exhausted its candidate counter
    #[error("key pair derivation failed")]
    DeriveKeyPair,

    /// KEM encapsulation failed
    #[error("encapsulation failed: {reason}")]
    Encap {
        /// Underlying failure
        reason: String,
    },

    /// KEM decapsulation failed
    #[error("decapsulation failed: {reason}")]
    Decap {
        /// Underlying failure
        reason: String,
    },

    /// AEAD seal failed
    #[error("seal error: {reason}")]
    Seal {
        /// Underlying failure
        reason: String,
    },

    /// AEAD open failed (tag mismatch, wrong key, truncated input)
    #[error("open error: {reason}")]
    Open {
        /// Underlying failure
        reason: String,
    },

    /// The context's sequence counter reached its nonce-derived limit
    #[error("message limit reached")]
    MessageLimitReached,

    /// Operation not available for this engine (export-only AEAD)
    #[error("not supported: {operation}")]
    NotSupported {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Secret export failed
    #[error("export error: {reason}")]
    Export {
        /// Underlying failure
        reason: String,
    },

    /// Signature bytes are not a valid P1363 or DER encoding
    #[error("invalid signature encoding: {reason}")]
    InvalidSignature {
        /// Why the encoding was rejected
        reason: String,
    },
}

impl CryptoError {
    pub(crate) fn invalid_param(reason: impl Into<String>) -> Self {
        Self::InvalidParam { reason: reason.into() }
    }

    pub(crate) fn invalid_point(reason: impl Into<String>) -> Self {
        Self::InvalidPoint { reason: reason.into() }
    }

    pub(crate) fn invalid_public_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey { kind: "public", reason: reason.into() }
    }

    pub(crate) fn invalid_private_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey { kind: "private", reason: reason.into() }
    }
}
