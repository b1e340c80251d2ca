//! HPKE encryption contexts (RFC 9180 §5.2, §5.3).
//!
//! A context owns the AEAD key, the base nonce and the sequence counter. The
//! nonce for message `seq` is `base_nonce XOR I2OSP(seq, Nn)`; reusing a
//! `(key, nonce)` pair would break AEAD confidentiality, so the counter only
//! moves forward and a context refuses to wrap it.

use std::{fmt, sync::Arc};

use super::{MAX_INFO_LEN, aead::AeadContext, kdf::Kdf};
use crate::{error::CryptoError, secret::SecretBytes};

/// AEAD key, base nonce and sequence counter.
struct KeyInfo {
    key: Box<dyn AeadContext>,
    base_nonce: SecretBytes,
    seq: u64,
}

/// State shared by sender and recipient contexts.
pub struct EncryptionContext {
    key_info: KeyInfo,
    exporter_secret: SecretBytes,
    kdf: Arc<dyn Kdf>,
    suite_id: [u8; 10],
}

impl EncryptionContext {
    pub(crate) fn new(
        key: Box<dyn AeadContext>,
        base_nonce: SecretBytes,
        exporter_secret: SecretBytes,
        kdf: Arc<dyn Kdf>,
        suite_id: [u8; 10],
    ) -> Self {
        Self { key_info: KeyInfo { key, base_nonce, seq: 0 }, exporter_secret, kdf, suite_id }
    }

    /// Messages sealed or opened so far.
    pub fn seq(&self) -> u64 {
        self.key_info.seq
    }

    /// Largest sequence number the nonce length allows: `2^(8·Nn) − 1`,
    /// saturating at `u64::MAX`.
    pub fn message_limit(&self) -> u64 {
        let bits = 8 * self.key_info.base_nonce.len() as u64;
        if bits >= u64::from(u64::BITS) { u64::MAX } else { (1u64 << bits) - 1 }
    }

    /// Secret export: `LabeledExpand(exporter_secret, "sec", exporter_context, length)`.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `exporter_context` exceeds 64 KiB or `length`
    ///   exceeds `255·Nh`
    /// - `Export` if the expansion itself fails
    pub fn export(&self, exporter_context: &[u8], length: usize) -> Result<SecretBytes, CryptoError> {
        if exporter_context.len() > MAX_INFO_LEN {
            return Err(CryptoError::invalid_param(format!(
                "exporter context must be at most {MAX_INFO_LEN} bytes"
            )));
        }
        let max = 255 * self.kdf.hash_size();
        if length > max {
            return Err(CryptoError::invalid_param(format!(
                "export length {length} exceeds {max}"
            )));
        }

        self.kdf
            .labeled_expand(
                &self.suite_id,
                self.exporter_secret.as_bytes(),
                b"sec",
                exporter_context,
                length,
            )
            .map_err(|e| CryptoError::Export { reason: e.to_string() })
    }

    /// `base_nonce XOR I2OSP(seq, Nn)`.
    pub(crate) fn compute_nonce(&self) -> Vec<u8> {
        let mut nonce = self.key_info.base_nonce.as_bytes().to_vec();
        let seq = self.key_info.seq.to_be_bytes();
        for (n, s) in nonce.iter_mut().rev().zip(seq.iter().rev()) {
            *n ^= s;
        }
        nonce
    }

    /// Advance the counter.
    ///
    /// # Errors
    ///
    /// - `MessageLimitReached` if `seq` is already at the limit; the counter
    ///   is left unchanged
    pub(crate) fn increment_seq(&mut self) -> Result<(), CryptoError> {
        if self.key_info.seq >= self.message_limit() {
            return Err(CryptoError::MessageLimitReached);
        }
        self.key_info.seq += 1;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_seq(&mut self, seq: u64) {
        self.key_info.seq = seq;
    }
}

impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("seq", &self.key_info.seq)
            .field("kdf", &self.kdf.id())
            .finish_non_exhaustive()
    }
}

/// Sender side: seals messages and carries the encapsulated key.
#[derive(Debug)]
pub struct SenderContext {
    inner: EncryptionContext,
    enc: Vec<u8>,
}

impl SenderContext {
    pub(crate) fn new(inner: EncryptionContext, enc: Vec<u8>) -> Self {
        Self { inner, enc }
    }

    /// Encapsulated key to transmit to the recipient.
    pub fn enc(&self) -> &[u8] {
        &self.enc
    }

    /// Seal under the current nonce, then advance the counter.
    ///
    /// # Errors
    ///
    /// - `Seal` if the AEAD fails
    /// - `NotSupported` under the export-only AEAD
    /// - `MessageLimitReached` once the counter is exhausted
    pub fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = self.inner.compute_nonce();
        let ciphertext = self.inner.key_info.key.seal(&nonce, plaintext, aad).map_err(|e| match e {
            CryptoError::Seal { .. } | CryptoError::NotSupported { .. } => e,
            other => CryptoError::Seal { reason: other.to_string() },
        })?;
        self.inner.increment_seq()?;
        Ok(ciphertext)
    }

    /// Messages sealed so far.
    pub fn seq(&self) -> u64 {
        self.inner.seq()
    }

    /// See [`EncryptionContext::export`].
    ///
    /// # Errors
    ///
    /// Same as [`EncryptionContext::export`].
    pub fn export(&self, exporter_context: &[u8], length: usize) -> Result<SecretBytes, CryptoError> {
        self.inner.export(exporter_context, length)
    }

    /// Shared context state.
    pub fn context(&self) -> &EncryptionContext {
        &self.inner
    }
}

/// Recipient side: opens messages in order.
#[derive(Debug)]
pub struct RecipientContext {
    inner: EncryptionContext,
}

impl RecipientContext {
    pub(crate) fn new(inner: EncryptionContext) -> Self {
        Self { inner }
    }

    /// Open under the current nonce. The counter advances only on success.
    ///
    /// # Errors
    ///
    /// - `Open` on authentication failure
    /// - `NotSupported` under the export-only AEAD
    /// - `MessageLimitReached` once the counter is exhausted
    pub fn open(&mut self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = self.inner.compute_nonce();
        let plaintext = self.inner.key_info.key.open(&nonce, ciphertext, aad).map_err(|e| match e {
            CryptoError::Open { .. } | CryptoError::NotSupported { .. } => e,
            other => CryptoError::Open { reason: other.to_string() },
        })?;
        self.inner.increment_seq()?;
        Ok(plaintext)
    }

    /// Messages opened so far.
    pub fn seq(&self) -> u64 {
        self.inner.seq()
    }

    /// See [`EncryptionContext::export`].
    ///
    /// # Errors
    ///
    /// Same as [`EncryptionContext::export`].
    pub fn export(&self, exporter_context: &[u8], length: usize) -> Result<SecretBytes, CryptoError> {
        self.inner.export(exporter_context, length)
    }

    /// Shared context state.
    pub fn context(&self) -> &EncryptionContext {
        &self.inner
    }
}
