//! HKDF engines with RFC 9180 labeled extract/expand.

use std::{fmt, sync::Arc};

use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroize;

use super::ids::KdfId;
use crate::{error::CryptoError, secret::SecretBytes};

/// Version label prefixed to every labeled input.
const HPKE_VERSION: &[u8] = b"HPKE-v1";

/// A KDF engine.
///
/// `extract`/`expand` are plain HKDF; the `labeled_*` helpers add the
/// `"HPKE-v1" ‖ suite_id ‖ label` framing from RFC 9180 §4.
pub trait Kdf: Send + Sync + fmt::Debug {
    /// Algorithm identifier.
    fn id(&self) -> KdfId;

    /// Output size of the underlying hash (`Nh`).
    fn hash_size(&self) -> usize;

    /// HKDF-Extract.
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> SecretBytes;

    /// HKDF-Expand.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `prk` is shorter than `Nh` or `length > 255·Nh`
    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<SecretBytes, CryptoError>;

    /// `Extract(salt, "HPKE-v1" ‖ suite_id ‖ label ‖ ikm)`
    fn labeled_extract(&self, suite_id: &[u8], salt: &[u8], label: &[u8], ikm: &[u8]) -> SecretBytes {
        let mut labeled_ikm =
            Vec::with_capacity(HPKE_VERSION.len() + suite_id.len() + label.len() + ikm.len());
        labeled_ikm.extend_from_slice(HPKE_VERSION);
        labeled_ikm.extend_from_slice(suite_id);
        labeled_ikm.extend_from_slice(label);
        labeled_ikm.extend_from_slice(ikm);

        let prk = self.extract(salt, &labeled_ikm);
        labeled_ikm.zeroize();
        prk
    }

    /// `Expand(prk, I2OSP(length, 2) ‖ "HPKE-v1" ‖ suite_id ‖ label ‖ info, length)`
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `length` does not fit in two bytes or exceeds the
    ///   HKDF output limit
    fn labeled_expand(
        &self,
        suite_id: &[u8],
        prk: &[u8],
        label: &[u8],
        info: &[u8],
        length: usize,
    ) -> Result<SecretBytes, CryptoError> {
        let Ok(encoded_length) = u16::try_from(length) else {
            return Err(CryptoError::invalid_param(format!("expand length {length} exceeds 65535")));
        };

        let mut labeled_info = Vec::with_capacity(
            2 + HPKE_VERSION.len() + suite_id.len() + label.len() + info.len(),
        );
        labeled_info.extend_from_slice(&encoded_length.to_be_bytes());
        labeled_info.extend_from_slice(HPKE_VERSION);
        labeled_info.extend_from_slice(suite_id);
        labeled_info.extend_from_slice(label);
        labeled_info.extend_from_slice(info);

        self.expand(prk, &labeled_info, length)
    }

    /// DHKEM shared-secret derivation (RFC 9180 §4.1):
    /// `eae_prk = LabeledExtract("", "eae_prk", dh)`, then
    /// `LabeledExpand(eae_prk, "shared_secret", kem_context, length)`.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `length` exceeds the HKDF output limit
    fn extract_and_expand(
        &self,
        suite_id: &[u8],
        dh: &[u8],
        kem_context: &[u8],
        length: usize,
    ) -> Result<SecretBytes, CryptoError> {
        let eae_prk = self.labeled_extract(suite_id, b"", b"eae_prk", dh);
        self.labeled_expand(suite_id, eae_prk.as_bytes(), b"shared_secret", kem_context, length)
    }
}

macro_rules! hkdf_engine {
    ($(#[$doc:meta])* $name:ident, $hash:ty, $id:expr, $size:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Kdf for $name {
            fn id(&self) -> KdfId {
                $id
            }

            fn hash_size(&self) -> usize {
                $size
            }

            fn extract(&self, salt: &[u8], ikm: &[u8]) -> SecretBytes {
                let (prk, _) = Hkdf::<$hash>::extract(Some(salt), ikm);
                SecretBytes::from_slice(prk.as_slice())
            }

            fn expand(
                &self,
                prk: &[u8],
                info: &[u8],
                length: usize,
            ) -> Result<SecretBytes, CryptoError> {
                let hk = Hkdf::<$hash>::from_prk(prk).map_err(|_| {
                    CryptoError::invalid_param(format!(
                        "pseudorandom key must be at least {} bytes, got {}",
                        $size,
                        prk.len()
                    ))
                })?;

                let mut okm = SecretBytes::new(vec![0u8; length]);
                hk.expand(info, okm.as_mut_bytes()).map_err(|_| {
                    CryptoError::invalid_param(format!(
                        "expand length {length} exceeds {}",
                        255 * $size
                    ))
                })?;
                Ok(okm)
            }
        }
    };
}

hkdf_engine!(
    /// HKDF-SHA256
    HkdfSha256,
    Sha256,
    KdfId::HkdfSha256,
    32
);

hkdf_engine!(
    /// HKDF-SHA384
    HkdfSha384,
    Sha384,
    KdfId::HkdfSha384,
    48
);

hkdf_engine!(
    /// HKDF-SHA512
    HkdfSha512,
    Sha512,
    KdfId::HkdfSha512,
    64
);

/// Engine for `id`.
pub fn engine(id: KdfId) -> Arc<dyn Kdf> {
    match id {
        KdfId::HkdfSha256 => Arc::new(HkdfSha256),
        KdfId::HkdfSha384 => Arc::new(HkdfSha384),
        KdfId::HkdfSha512 => Arc::new(HkdfSha512),
    }
}
