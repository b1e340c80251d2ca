//! Stamp envelope and header.
//!
//! The header value is Base64url (no padding) over compact JSON:
//!
//! ```json
//! {"publicKey":"02…","scheme":"SIGNATURE_SCHEME_TK_API_P256","signature":"3045…"}
//! ```
//!
//! `publicKey` is the compressed signing key in hex and `signature` is the
//! DER-encoded ECDSA signature in hex.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::error::StamperError;

/// Header the stamp is attached under.
pub const STAMP_HEADER_NAME: &str = "X-Stamp";

/// Signature scheme identifier carried in every envelope.
pub const SIGNATURE_SCHEME: &str = "SIGNATURE_SCHEME_TK_API_P256";

/// JSON body of a stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampEnvelope {
    /// Compressed signing public key, hex
    pub public_key: String,
    /// Signature scheme identifier
    pub scheme: String,
    /// DER signature, hex
    pub signature: String,
}

/// A header name/value pair ready to attach to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// Always [`STAMP_HEADER_NAME`]
    pub header_name: String,
    /// Base64url-encoded JSON envelope
    pub header_value: String,
}

impl Stamp {
    /// Encode `envelope` into a header.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the envelope cannot be written as JSON
    pub fn from_envelope(envelope: &StampEnvelope) -> Result<Self, StamperError> {
        let json = serde_json::to_vec(envelope)
            .map_err(|e| StamperError::Serialization { reason: e.to_string() })?;
        Ok(Self {
            header_name: STAMP_HEADER_NAME.to_string(),
            header_value: URL_SAFE_NO_PAD.encode(json),
        })
    }

    /// Parse the header value back into its envelope.
    ///
    /// # Errors
    ///
    /// - `Decode` if the value is not Base64url
    /// - `Serialization` if the JSON is malformed
    pub fn decode_envelope(&self) -> Result<StampEnvelope, StamperError> {
        let json = URL_SAFE_NO_PAD
            .decode(&self.header_value)
            .map_err(|e| StamperError::decode(format!("invalid stamp encoding: {e}")))?;
        serde_json::from_slice(&json).map_err(|e| StamperError::Serialization { reason: e.to_string() })
    }
}
