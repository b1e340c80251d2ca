//! Error types for the stamper and the bundle codec.
//!
//! Cryptographic failures from `keystamp-crypto` pass through unchanged in
//! [`StamperError::Crypto`], so callers can still tell an `Open` failure
//! from a `MessageLimitReached`.

use keystamp_crypto::CryptoError;
use thiserror::Error;

use crate::stamper::StamperState;

/// Errors that can occur while loading a credential or producing a stamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StamperError {
    /// Operation not valid in the current lifecycle state
    #[error("invalid state: cannot {operation} in {state:?}")]
    InvalidState {
        /// Current state when the operation was attempted
        state: StamperState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Malformed argument (bundle length, compression prefix, key length)
    #[error("invalid parameter: {reason}")]
    InvalidParam {
        /// What was wrong with the parameter
        reason: String,
    },

    /// Bundle text is not valid Base58Check or Base64url
    #[error("decode error: {reason}")]
    Decode {
        /// Why decoding failed
        reason: String,
    },

    /// Failure in the HPKE, EC or signature primitives
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The signing provider rejected a key or failed to sign
    #[error("provider error: {reason}")]
    Provider {
        /// What the provider reported
        reason: String,
    },

    /// Stamp envelope could not be serialized or parsed
    #[error("serialization error: {reason}")]
    Serialization {
        /// Underlying serializer message
        reason: String,
    },
}

impl StamperError {
    pub(crate) fn invalid_param(reason: impl Into<String>) -> Self {
        Self::InvalidParam { reason: reason.into() }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode { reason: reason.into() }
    }

    pub(crate) fn provider(reason: impl Into<String>) -> Self {
        Self::Provider { reason: reason.into() }
    }
}
