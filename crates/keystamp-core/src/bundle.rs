//! Credential bundle codec.
//!
//! A bundle carries a credential's raw private-key bytes from the custodian
//! to this client, sealed with HPKE to the stamper's recipient key:
//!
//! ```text
//! ┌─────────────────────────────┬─────────────────────────────┐
//! │ compressed enc (33 bytes)   │ AES-256-GCM ciphertext + tag│
//! └─────────────────────────────┴─────────────────────────────┘
//!            Base58Check or Base64url on the wire
//! ```
//!
//! The suite is fixed: DHKEM(P-256, HKDF-SHA256), HKDF-SHA256, AES-256-GCM.
//! The associated data binds both parties' keys: `enc ‖ pkR`, each as an
//! uncompressed SEC1 point.
//!
//! # Format detection
//!
//! [`BundleFormat::Auto`] guesses the encoding: text with none of
//! `-`, `_`, `O`, `I`, `l`, `0` is read as Base58Check, anything else as
//! Base64url. A Base64url bundle that happens to avoid all six characters is
//! misread as Base58Check and then fails its checksum. For bundles of
//! realistic length the chance is about 3.4×10⁻⁴. Callers that know the
//! encoding should set it in [`crate::StamperConfig`].

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE_NO_PAD},
};
use keystamp_crypto::{
    CipherSuite, KeyPair, NamedCurve, PublicKey, SecretBytes,
    ec::{compress_public_key, decompress_public_key},
    hpke::{AeadId, KdfId, KemId, SenderContext},
};
use tracing::warn;

use crate::error::StamperError;

/// Length of the compressed encapsulated key at the front of a bundle.
pub const COMPRESSED_KEY_LEN: usize = 33;

/// Characters whose presence marks bundle text as Base64url.
pub const BASE64URL_MARKERS: &[char] = &['-', '_', 'O', 'I', 'l', '0'];

const URL_SAFE_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Text encoding of a credential bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BundleFormat {
    /// Pick by character set when decoding; encode as Base58Check
    #[default]
    Auto,
    /// Base58 with a 4-byte double-SHA-256 checksum suffix
    Base58Check,
    /// URL-safe Base64, padding optional
    Base64Url,
}

impl BundleFormat {
    /// The concrete format to use for `text`.
    pub fn resolve(self, text: &str) -> BundleFormat {
        match self {
            Self::Auto => detect_format(text),
            explicit => explicit,
        }
    }
}

/// Guess the encoding of `text`.
pub fn detect_format(text: &str) -> BundleFormat {
    if text.contains(BASE64URL_MARKERS) { BundleFormat::Base64Url } else { BundleFormat::Base58Check }
}

/// The fixed ciphersuite credentials are sealed under.
pub fn credential_suite() -> CipherSuite {
    CipherSuite::new(KemId::DhKemP256, KdfId::HkdfSha256, AeadId::Aes256Gcm)
}

/// AAD for a bundle: encapsulated key ‖ recipient public key.
pub fn associated_data(encapsulated_key: &[u8], recipient_public_key: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(encapsulated_key.len() + recipient_public_key.len());
    aad.extend_from_slice(encapsulated_key);
    aad.extend_from_slice(recipient_public_key);
    aad
}

/// A decoded credential bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    /// Uncompressed sender encapsulated key
    encapsulated_key: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl CredentialBundle {
    /// Decode bundle text.
    ///
    /// # Errors
    ///
    /// - `Decode` for bad characters, a failed checksum or an empty payload
    /// - `InvalidParam` if the payload is 33 bytes or shorter, or the key
    ///   prefix is not `0x02`/`0x03`
    /// - `Crypto(InvalidPoint)` if the key does not decompress
    pub fn decode(text: &str, format: BundleFormat) -> Result<Self, StamperError> {
        let format = format.resolve(text.trim());
        let result = decode_text(text.trim(), format).and_then(|bytes| Self::from_bytes(&bytes));
        if let Err(error) = &result {
            warn!(?format, len = text.len(), %error, "rejected credential bundle");
        }
        result
    }

    /// Parse `compressed enc ‖ ciphertext`.
    ///
    /// # Errors
    ///
    /// Same as [`CredentialBundle::decode`] minus `Decode`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StamperError> {
        if bytes.len() <= COMPRESSED_KEY_LEN {
            return Err(StamperError::invalid_param(format!(
                "bundle length {} too low: expected more than {COMPRESSED_KEY_LEN} bytes",
                bytes.len()
            )));
        }

        let (compressed, ciphertext) = bytes.split_at(COMPRESSED_KEY_LEN);
        if !matches!(compressed[0], 0x02 | 0x03) {
            return Err(StamperError::invalid_param(format!(
                "bundle key prefix {:#04x} is not a compressed point",
                compressed[0]
            )));
        }

        let encapsulated_key = decompress_public_key(NamedCurve::P256, compressed)?;
        Ok(Self { encapsulated_key, ciphertext: ciphertext.to_vec() })
    }

    /// `compressed enc ‖ ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        let Ok(compressed) = compress_public_key(NamedCurve::P256, &self.encapsulated_key) else {
            unreachable!("encapsulated key was validated on construction");
        };
        let mut bytes = compressed;
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Encode as text. `Auto` encodes as Base58Check.
    pub fn encode(&self, format: BundleFormat) -> String {
        let bytes = self.to_bytes();
        match format {
            BundleFormat::Auto | BundleFormat::Base58Check => {
                bs58::encode(bytes).with_check().into_string()
            },
            BundleFormat::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Uncompressed sender encapsulated key.
    pub fn encapsulated_key(&self) -> &[u8] {
        &self.encapsulated_key
    }

    /// Sealed credential.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Open the credential with the recipient key pair.
    ///
    /// # Errors
    ///
    /// - `Crypto(Decap)` if the encapsulated key is rejected
    /// - `Crypto(Open)` if authentication fails (wrong recipient, wrong
    ///   `info`, or tampered ciphertext)
    pub fn open(&self, recipient: &KeyPair, info: &[u8]) -> Result<SecretBytes, StamperError> {
        let suite = credential_suite();
        let mut context =
            suite.create_recipient_context(&recipient.private_key, &self.encapsulated_key, info)?;
        let aad = associated_data(&self.encapsulated_key, recipient.public_key.as_bytes());
        Ok(SecretBytes::new(context.open(&self.ciphertext, &aad)?))
    }
}

/// Seal `credential` to `recipient_public_key` (uncompressed P-256) and
/// encode the bundle. Custodian side of [`CredentialBundle::open`].
///
/// # Errors
///
/// - `Crypto(InvalidKey)` if the recipient key is not a P-256 point
/// - `Crypto(InvalidParam)` if `info` is too long
pub fn seal_credential(
    recipient_public_key: &[u8],
    credential: &[u8],
    info: &[u8],
    format: BundleFormat,
) -> Result<String, StamperError> {
    let suite = credential_suite();
    let recipient = suite.kem().deserialize_public_key(recipient_public_key)?;
    let sender = suite.create_sender_context(&recipient, info)?;
    Ok(seal_with(sender, &recipient, credential)?.encode(format))
}

/// Like [`seal_credential`] with the ephemeral key derived from `ikm_e`.
///
/// # Errors
///
/// Same as [`seal_credential`], plus `Crypto(DeriveKeyPair)` for a bad
/// `ikm_e`.
pub fn seal_credential_with_ephemeral_ikm(
    recipient_public_key: &[u8],
    credential: &[u8],
    info: &[u8],
    format: BundleFormat,
    ikm_e: &[u8],
) -> Result<String, StamperError> {
    let suite = credential_suite();
    let recipient = suite.kem().deserialize_public_key(recipient_public_key)?;
    let sender = suite.create_sender_context_with_ephemeral_ikm(&recipient, info, ikm_e)?;
    Ok(seal_with(sender, &recipient, credential)?.encode(format))
}

fn seal_with(
    mut sender: SenderContext,
    recipient: &PublicKey,
    credential: &[u8],
) -> Result<CredentialBundle, StamperError> {
    let aad = associated_data(sender.enc(), recipient.as_bytes());
    let ciphertext = sender.seal(credential, &aad)?;
    Ok(CredentialBundle { encapsulated_key: sender.enc().to_vec(), ciphertext })
}

fn decode_text(text: &str, format: BundleFormat) -> Result<Vec<u8>, StamperError> {
    let bytes = match format {
        BundleFormat::Base64Url => URL_SAFE_ANY_PADDING
            .decode(text)
            .map_err(|e| StamperError::decode(format!("invalid base64url: {e}")))?,
        BundleFormat::Auto | BundleFormat::Base58Check => bs58::decode(text)
            .with_check(None)
            .into_vec()
            .map_err(|e| StamperError::decode(format!("invalid base58check: {e}")))?,
    };
    if bytes.is_empty() {
        return Err(StamperError::decode("empty bundle payload"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use keystamp_crypto::CryptoError;

    use super::*;

    fn recipient() -> KeyPair {
        credential_suite().kem().derive_key_pair(b"bundle test recipient").unwrap()
    }

    fn sealed(format: BundleFormat) -> String {
        seal_credential_with_ephemeral_ikm(
            recipient().public_key.as_bytes(),
            &[0x42; 32],
            b"",
            format,
            b"bundle test ephemeral",
        )
        .unwrap()
    }

    #[test]
    fn detects_format_by_character_set() {
        assert_eq!(detect_format("3mJr7AoUXx2Wqd"), BundleFormat::Base58Check);
        for text in ["ab-c", "ab_c", "abOc", "abIc", "ablc", "ab0c"] {
            assert_eq!(detect_format(text), BundleFormat::Base64Url, "{text}");
        }
    }

    #[test]
    fn explicit_format_skips_detection() {
        assert_eq!(BundleFormat::Base64Url.resolve("abc"), BundleFormat::Base64Url);
        assert_eq!(BundleFormat::Auto.resolve("abc"), BundleFormat::Base58Check);
    }

    #[test]
    fn sealed_bundle_opens_in_both_encodings() {
        let recipient = recipient();
        for format in [BundleFormat::Base58Check, BundleFormat::Base64Url] {
            let bundle = CredentialBundle::decode(&sealed(format), BundleFormat::Auto).unwrap();
            assert_eq!(bundle.encapsulated_key().len(), 65);
            assert_eq!(bundle.ciphertext().len(), 32 + 16);
            assert_eq!(bundle.open(&recipient, b"").unwrap().as_bytes(), &[0x42; 32]);
        }
    }

    #[test]
    fn base64url_accepts_padding() {
        let bundle = CredentialBundle::decode(&sealed(BundleFormat::Base64Url), BundleFormat::Base64Url)
            .unwrap();
        let padded = base64::engine::general_purpose::URL_SAFE.encode(bundle.to_bytes());
        assert_eq!(CredentialBundle::decode(&padded, BundleFormat::Base64Url).unwrap(), bundle);
    }

    #[test]
    fn thirty_three_bytes_is_too_low() {
        let mut bytes = vec![0x02];
        bytes.extend_from_slice(&[0x11; 32]);
        let text = bs58::encode(&bytes).with_check().into_string();

        let err = CredentialBundle::decode(&text, BundleFormat::Base58Check).unwrap_err();
        assert!(matches!(&err, StamperError::InvalidParam { reason } if reason.contains("too low")));
    }

    #[test]
    fn rejects_uncompressed_prefix() {
        let mut bytes = vec![0x04];
        bytes.extend_from_slice(&[0x11; 40]);
        let err = CredentialBundle::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, StamperError::InvalidParam { .. }));
    }

    #[test]
    fn rejects_key_off_the_curve() {
        // x = 1 has no square root modulo the P-256 prime
        let mut bytes = vec![0x02];
        bytes.extend_from_slice(&[0; 31]);
        bytes.push(1);
        bytes.extend_from_slice(&[0xAA; 16]);
        let err = CredentialBundle::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, StamperError::Crypto(CryptoError::InvalidPoint { .. })));
    }

    #[test]
    fn corrupted_checksum_is_a_decode_error() {
        let bundle = CredentialBundle::decode(&sealed(BundleFormat::Base58Check), BundleFormat::Auto)
            .unwrap();
        let checked = bundle.encode(BundleFormat::Base58Check);
        let mut raw = bs58::decode(&checked).into_vec().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let text = bs58::encode(raw).into_string();
        let err = CredentialBundle::decode(&text, BundleFormat::Base58Check).unwrap_err();
        assert!(matches!(err, StamperError::Decode { .. }));
    }

    #[test]
    fn invalid_characters_are_decode_errors() {
        assert!(matches!(
            CredentialBundle::decode("not base58!", BundleFormat::Base58Check),
            Err(StamperError::Decode { .. })
        ));
        assert!(matches!(
            CredentialBundle::decode("a+b/c", BundleFormat::Base64Url),
            Err(StamperError::Decode { .. })
        ));
    }

    #[test]
    fn wrong_recipient_cannot_open() {
        let bundle = CredentialBundle::decode(&sealed(BundleFormat::Auto), BundleFormat::Auto).unwrap();
        let other = credential_suite().kem().derive_key_pair(b"someone else").unwrap();
        assert!(matches!(
            bundle.open(&other, b""),
            Err(StamperError::Crypto(CryptoError::Open { .. }))
        ));
    }

    #[test]
    fn mismatched_info_cannot_open() {
        let recipient = recipient();
        let text = seal_credential(recipient.public_key.as_bytes(), b"secret", b"ctx", BundleFormat::Auto)
            .unwrap();
        let bundle = CredentialBundle::decode(&text, BundleFormat::Auto).unwrap();
        assert!(bundle.open(&recipient, b"other ctx").is_err());
        assert_eq!(bundle.open(&recipient, b"ctx").unwrap().as_bytes(), b"secret");
    }

    #[test]
    fn aad_is_enc_then_recipient() {
        assert_eq!(associated_data(&[1, 2], &[3]), vec![1, 2, 3]);
    }
}
