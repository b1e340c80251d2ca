//! Ciphersuite composition and the base-mode key schedule.

use std::sync::Arc;

use zeroize::Zeroize;

use super::{
    MAX_INFO_LEN,
    aead::{self, Aead},
    context::{EncryptionContext, RecipientContext, SenderContext},
    ids::{AeadId, KdfId, KemId, hpke_suite_id},
    kdf::{self, Kdf},
    kem::{self, Encapsulation, Kem, PrivateKey, PublicKey},
};
use crate::{error::CryptoError, secret::SecretBytes};

/// Mode byte for base mode (no PSK, no sender authentication).
const MODE_BASE: u8 = 0x00;

/// One KEM, one KDF and one AEAD bound together.
#[derive(Debug, Clone)]
pub struct CipherSuite {
    kem: Arc<dyn Kem>,
    kdf: Arc<dyn Kdf>,
    aead: Arc<dyn Aead>,
    suite_id: [u8; 10],
}

impl CipherSuite {
    /// Suite from typed identifiers.
    pub fn new(kem: KemId, kdf: KdfId, aead: AeadId) -> Self {
        Self::from_engines(kem::engine(kem), kdf::engine(kdf), aead::engine(aead))
    }

    /// Suite from wire identifiers.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if any identifier is unknown
    pub fn from_ids(kem: u16, kdf: u16, aead: u16) -> Result<Self, CryptoError> {
        Ok(Self::new(KemId::try_from(kem)?, KdfId::try_from(kdf)?, AeadId::try_from(aead)?))
    }

    /// Suite from concrete engines.
    pub fn from_engines(kem: Arc<dyn Kem>, kdf: Arc<dyn Kdf>, aead: Arc<dyn Aead>) -> Self {
        let suite_id = hpke_suite_id(kem.id(), kdf.id(), aead.id());
        Self { kem, kdf, aead, suite_id }
    }

    /// KEM engine.
    pub fn kem(&self) -> &dyn Kem {
        self.kem.as_ref()
    }

    /// KDF engine.
    pub fn kdf(&self) -> &dyn Kdf {
        self.kdf.as_ref()
    }

    /// AEAD engine.
    pub fn aead(&self) -> &dyn Aead {
        self.aead.as_ref()
    }

    /// `"HPKE" ‖ kem_id ‖ kdf_id ‖ aead_id`
    pub fn suite_id(&self) -> &[u8; 10] {
        &self.suite_id
    }

    /// Encapsulate to `recipient` and derive a sender context.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `info` exceeds 64 KiB
    /// - `Encap` if encapsulation fails
    pub fn create_sender_context(
        &self,
        recipient: &PublicKey,
        info: &[u8],
    ) -> Result<SenderContext, CryptoError> {
        check_info(info)?;
        let encapsulation = self.kem.encap(recipient)?;
        self.sender_context(encapsulation, info)
    }

    /// Like [`CipherSuite::create_sender_context`] with the ephemeral key
    /// derived from `ikm_e`.
    ///
    /// # Errors
    ///
    /// Same as [`CipherSuite::create_sender_context`], plus `DeriveKeyPair`
    /// and `InvalidParam` for a bad `ikm_e`.
    pub fn create_sender_context_with_ephemeral_ikm(
        &self,
        recipient: &PublicKey,
        info: &[u8],
        ikm_e: &[u8],
    ) -> Result<SenderContext, CryptoError> {
        check_info(info)?;
        let encapsulation = self.kem.encap_with_ephemeral_ikm(recipient, ikm_e)?;
        self.sender_context(encapsulation, info)
    }

    /// Decapsulate `enc` and derive the matching recipient context.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `info` exceeds 64 KiB
    /// - `Decap` if `enc` or the private key is invalid
    pub fn create_recipient_context(
        &self,
        recipient: &PrivateKey,
        enc: &[u8],
        info: &[u8],
    ) -> Result<RecipientContext, CryptoError> {
        check_info(info)?;
        let shared_secret = self.kem.decap(enc, recipient)?;
        let context = self.key_schedule(&shared_secret, info)?;
        Ok(RecipientContext::new(context))
    }

    /// Single-shot seal: returns `(enc, ciphertext)`.
    ///
    /// # Errors
    ///
    /// Those of [`CipherSuite::create_sender_context`] and
    /// [`SenderContext::seal`].
    pub fn seal(
        &self,
        recipient: &PublicKey,
        info: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let mut sender = self.create_sender_context(recipient, info)?;
        let ciphertext = sender.seal(plaintext, aad)?;
        Ok((sender.enc().to_vec(), ciphertext))
    }

    /// Single-shot open.
    ///
    /// # Errors
    ///
    /// Those of [`CipherSuite::create_recipient_context`] and
    /// [`RecipientContext::open`].
    pub fn open(
        &self,
        recipient: &PrivateKey,
        enc: &[u8],
        info: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.create_recipient_context(recipient, enc, info)?.open(ciphertext, aad)
    }

    fn sender_context(
        &self,
        encapsulation: Encapsulation,
        info: &[u8],
    ) -> Result<SenderContext, CryptoError> {
        let context = self.key_schedule(&encapsulation.shared_secret, info)?;
        Ok(SenderContext::new(context, encapsulation.enc))
    }

    /// RFC 9180 §5.1 `KeySchedule` for base mode.
    fn key_schedule(
        &self,
        shared_secret: &SecretBytes,
        info: &[u8],
    ) -> Result<EncryptionContext, CryptoError> {
        let suite_id = &self.suite_id;
        let kdf = self.kdf.as_ref();

        let psk_id_hash = kdf.labeled_extract(suite_id, b"", b"psk_id_hash", b"");
        let info_hash = kdf.labeled_extract(suite_id, b"", b"info_hash", info);

        let mut key_schedule_context = Vec::with_capacity(1 + psk_id_hash.len() + info_hash.len());
        key_schedule_context.push(MODE_BASE);
        key_schedule_context.extend_from_slice(psk_id_hash.as_bytes());
        key_schedule_context.extend_from_slice(info_hash.as_bytes());

        let secret = kdf.labeled_extract(suite_id, shared_secret.as_bytes(), b"secret", b"");
        let expand = |label: &[u8], length: usize| {
            kdf.labeled_expand(suite_id, secret.as_bytes(), label, &key_schedule_context, length)
        };

        let (key, base_nonce) = if self.aead.id() == AeadId::ExportOnly {
            (SecretBytes::default(), SecretBytes::default())
        } else {
            (expand(b"key", self.aead.key_size())?, expand(b"base_nonce", self.aead.nonce_size())?)
        };
        let exporter_secret = expand(b"exp", kdf.hash_size())?;
        key_schedule_context.zeroize();

        let aead_context = self.aead.create_encryption_context(key.as_bytes())?;
        Ok(EncryptionContext::new(
            aead_context,
            base_nonce,
            exporter_secret,
            Arc::clone(&self.kdf),
            self.suite_id,
        ))
    }

    #[cfg(test)]
    pub(crate) fn key_schedule_for_test(
        &self,
        shared_secret: &SecretBytes,
        info: &[u8],
    ) -> Result<EncryptionContext, CryptoError> {
        self.key_schedule(shared_secret, info)
    }
}

fn check_info(info: &[u8]) -> Result<(), CryptoError> {
    if info.len() > MAX_INFO_LEN {
        return Err(CryptoError::invalid_param(format!(
            "info must be at most {MAX_INFO_LEN} bytes, got {}",
            info.len()
        )));
    }
    Ok(())
}
