//! AEAD engines: AES-GCM, ChaCha20-Poly1305 and export-only.

use std::{fmt, marker::PhantomData, sync::Arc};

use aes_gcm::{
    Aes128Gcm, Aes256Gcm,
    aead::{
        Aead as RawAead, AeadCore, KeyInit, Nonce, Payload, generic_array::typenum::Unsigned,
    },
};
use chacha20poly1305::ChaCha20Poly1305;

use super::ids::AeadId;
use crate::error::CryptoError;

/// An AEAD engine: sizes plus a factory for keyed contexts.
pub trait Aead: Send + Sync + fmt::Debug {
    /// Algorithm identifier.
    fn id(&self) -> AeadId;

    /// Key length (`Nk`).
    fn key_size(&self) -> usize;

    /// Nonce length (`Nn`).
    fn nonce_size(&self) -> usize;

    /// Authentication tag length (`Nt`).
    fn tag_size(&self) -> usize;

    /// Bind `key` into a context that can seal and open.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `key` is not `key_size` bytes
    fn create_encryption_context(&self, key: &[u8]) -> Result<Box<dyn AeadContext>, CryptoError>;
}

/// A keyed AEAD.
pub trait AeadContext: Send + Sync {
    /// Encrypt and authenticate. Output is `ciphertext ‖ tag`.
    ///
    /// # Errors
    ///
    /// - `Seal` on a bad nonce length or cipher failure
    /// - `NotSupported` for the export-only engine
    fn seal(&self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Verify and decrypt.
    ///
    /// # Errors
    ///
    /// - `Open` on authentication failure or a bad nonce length
    /// - `NotSupported` for the export-only engine
    fn open(&self, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Engine backed by a RustCrypto AEAD cipher.
pub struct RustCryptoAead<C> {
    id: AeadId,
    _cipher: PhantomData<fn() -> C>,
}

impl<C> fmt::Debug for RustCryptoAead<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustCryptoAead").field("id", &self.id).finish()
    }
}

/// AES-128-GCM engine.
pub type Aes128GcmAead = RustCryptoAead<Aes128Gcm>;
/// AES-256-GCM engine.
pub type Aes256GcmAead = RustCryptoAead<Aes256Gcm>;
/// ChaCha20-Poly1305 engine.
pub type ChaCha20Poly1305Aead = RustCryptoAead<ChaCha20Poly1305>;

impl Aes128GcmAead {
    /// AES-128-GCM.
    pub fn new() -> Self {
        Self { id: AeadId::Aes128Gcm, _cipher: PhantomData }
    }
}

impl Aes256GcmAead {
    /// AES-256-GCM.
    pub fn new() -> Self {
        Self { id: AeadId::Aes256Gcm, _cipher: PhantomData }
    }
}

impl ChaCha20Poly1305Aead {
    /// ChaCha20-Poly1305.
    pub fn new() -> Self {
        Self { id: AeadId::ChaCha20Poly1305, _cipher: PhantomData }
    }
}

impl<C> Aead for RustCryptoAead<C>
where
    C: RawAead + KeyInit + Send + Sync + 'static,
{
    fn id(&self) -> AeadId {
        self.id
    }

    fn key_size(&self) -> usize {
        C::KeySize::USIZE
    }

    fn nonce_size(&self) -> usize {
        <C as AeadCore>::NonceSize::USIZE
    }

    fn tag_size(&self) -> usize {
        <C as AeadCore>::TagSize::USIZE
    }

    fn create_encryption_context(&self, key: &[u8]) -> Result<Box<dyn AeadContext>, CryptoError> {
        let cipher = C::new_from_slice(key).map_err(|_| {
            CryptoError::invalid_param(format!(
                "AEAD key must be {} bytes, got {}",
                C::KeySize::USIZE,
                key.len()
            ))
        })?;
        Ok(Box::new(CipherContext { cipher }))
    }
}

struct CipherContext<C> {
    cipher: C,
}

impl<C> CipherContext<C>
where
    C: RawAead,
{
    fn nonce<'a>(nonce: &'a [u8]) -> Option<&'a Nonce<C>> {
        (nonce.len() == <C as AeadCore>::NonceSize::USIZE).then(|| Nonce::<C>::from_slice(nonce))
    }
}

impl<C> AeadContext for CipherContext<C>
where
    C: RawAead + Send + Sync,
{
    fn seal(&self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let Some(nonce) = Self::nonce(nonce) else {
            return Err(CryptoError::Seal { reason: format!("bad nonce length {}", nonce.len()) });
        };
        self.cipher
            .encrypt(nonce, Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::Seal { reason: "encryption failed".to_string() })
    }

    fn open(&self, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let Some(nonce) = Self::nonce(nonce) else {
            return Err(CryptoError::Open { reason: format!("bad nonce length {}", nonce.len()) });
        };
        self.cipher
            .decrypt(nonce, Payload { msg: ciphertext, aad })
            .map_err(|_| CryptoError::Open { reason: "authentication failed".to_string() })
    }
}

/// Export-only "AEAD": contexts derive an exporter secret and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOnlyAead;

impl Aead for ExportOnlyAead {
    fn id(&self) -> AeadId {
        AeadId::ExportOnly
    }

    fn key_size(&self) -> usize {
        0
    }

    fn nonce_size(&self) -> usize {
        0
    }

    fn tag_size(&self) -> usize {
        0
    }

    fn create_encryption_context(&self, _key: &[u8]) -> Result<Box<dyn AeadContext>, CryptoError> {
        Ok(Box::new(ExportOnlyContext))
    }
}

struct ExportOnlyContext;

impl AeadContext for ExportOnlyContext {
    fn seal(&self, _nonce: &[u8], _plaintext: &[u8], _aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::NotSupported { operation: "seal" })
    }

    fn open(&self, _nonce: &[u8], _ciphertext: &[u8], _aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::NotSupported { operation: "open" })
    }
}

/// Engine for `id`.
pub fn engine(id: AeadId) -> Arc<dyn Aead> {
    match id {
        AeadId::Aes128Gcm => Arc::new(Aes128GcmAead::new()),
        AeadId::Aes256Gcm => Arc::new(Aes256GcmAead::new()),
        AeadId::ChaCha20Poly1305 => Arc::new(ChaCha20Poly1305Aead::new()),
        AeadId::ExportOnly => Arc::new(ExportOnlyAead),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_rfc9180() {
        let expected = [
            (AeadId::Aes128Gcm, 16, 12, 16),
            (AeadId::Aes256Gcm, 32, 12, 16),
            (AeadId::ChaCha20Poly1305, 32, 12, 16),
            (AeadId::ExportOnly, 0, 0, 0),
        ];
        for (id, nk, nn, nt) in expected {
            let aead = engine(id);
            assert_eq!(aead.id(), id);
            assert_eq!((aead.key_size(), aead.nonce_size(), aead.tag_size()), (nk, nn, nt), "{id:?}");
        }
    }

    #[test]
    fn seal_open_roundtrip_for_each_cipher() {
        for id in [AeadId::Aes128Gcm, AeadId::Aes256Gcm, AeadId::ChaCha20Poly1305] {
            let aead = engine(id);
            let key = vec![0x24; aead.key_size()];
            let nonce = vec![0x07; aead.nonce_size()];
            let ctx = aead.create_encryption_context(&key).unwrap();

            let ciphertext = ctx.seal(&nonce, b"payload", b"aad").unwrap();
            assert_eq!(ciphertext.len(), 7 + aead.tag_size());
            assert_eq!(ctx.open(&nonce, &ciphertext, b"aad").unwrap(), b"payload");
        }
    }

    #[test]
    fn open_with_wrong_aad_fails() {
        let aead = engine(AeadId::Aes256Gcm);
        let ctx = aead.create_encryption_context(&[1u8; 32]).unwrap();
        let nonce = [0u8; 12];

        let ciphertext = ctx.seal(&nonce, b"payload", b"aad").unwrap();
        assert!(matches!(ctx.open(&nonce, &ciphertext, b"other"), Err(CryptoError::Open { .. })));
    }

    #[test]
    fn wrong_key_length_is_invalid_param() {
        let aead = engine(AeadId::Aes128Gcm);
        assert!(matches!(
            aead.create_encryption_context(&[0u8; 32]),
            Err(CryptoError::InvalidParam { .. })
        ));
    }

    #[test]
    fn wrong_nonce_length_is_rejected() {
        let ctx = engine(AeadId::ChaCha20Poly1305).create_encryption_context(&[0u8; 32]).unwrap();
        assert!(matches!(ctx.seal(&[0u8; 8], b"m", b""), Err(CryptoError::Seal { .. })));
        assert!(matches!(ctx.open(&[0u8; 8], &[0u8; 20], b""), Err(CryptoError::Open { .. })));
    }

    #[test]
    fn export_only_refuses_seal_and_open() {
        let ctx = engine(AeadId::ExportOnly).create_encryption_context(&[]).unwrap();
        assert_eq!(ctx.seal(&[], b"m", b""), Err(CryptoError::NotSupported { operation: "seal" }));
        assert_eq!(ctx.open(&[], b"c", b""), Err(CryptoError::NotSupported { operation: "open" }));
    }
}
