//! RFC 9180 algorithm identifiers and suite-id encodings.

use crate::error::CryptoError;

/// KEM identifiers (RFC 9180 §7.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum KemId {
    /// DHKEM(P-256, HKDF-SHA256)
    DhKemP256 = 0x0010,
    /// DHKEM(P-384, HKDF-SHA384)
    DhKemP384 = 0x0011,
    /// DHKEM(P-521, HKDF-SHA512)
    DhKemP521 = 0x0012,
    /// DHKEM(X25519, HKDF-SHA256)
    DhKemX25519 = 0x0020,
    /// DHKEM(X448, HKDF-SHA512)
    DhKemX448 = 0x0021,
}

/// KDF identifiers (RFC 9180 §7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum KdfId {
    /// HKDF-SHA256
    HkdfSha256 = 0x0001,
    /// HKDF-SHA384
    HkdfSha384 = 0x0002,
    /// HKDF-SHA512
    HkdfSha512 = 0x0003,
}

/// AEAD identifiers (RFC 9180 §7.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AeadId {
    /// AES-128-GCM
    Aes128Gcm = 0x0001,
    /// AES-256-GCM
    Aes256Gcm = 0x0002,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305 = 0x0003,
    /// No encryption; contexts support secret export only
    ExportOnly = 0xFFFF,
}

impl KemId {
    /// Wire value.
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

impl KdfId {
    /// Wire value.
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

impl AeadId {
    /// Wire value.
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for KemId {
    type Error = CryptoError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0010 => Ok(Self::DhKemP256),
            0x0011 => Ok(Self::DhKemP384),
            0x0012 => Ok(Self::DhKemP521),
            0x0020 => Ok(Self::DhKemX25519),
            0x0021 => Ok(Self::DhKemX448),
            other => Err(CryptoError::invalid_param(format!("unknown KEM id {other:#06x}"))),
        }
    }
}

impl TryFrom<u16> for KdfId {
    type Error = CryptoError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::HkdfSha256),
            0x0002 => Ok(Self::HkdfSha384),
            0x0003 => Ok(Self::HkdfSha512),
            other => Err(CryptoError::invalid_param(format!("unknown KDF id {other:#06x}"))),
        }
    }
}

impl TryFrom<u16> for AeadId {
    type Error = CryptoError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Aes128Gcm),
            0x0002 => Ok(Self::Aes256Gcm),
            0x0003 => Ok(Self::ChaCha20Poly1305),
            0xFFFF => Ok(Self::ExportOnly),
            other => Err(CryptoError::invalid_param(format!("unknown AEAD id {other:#06x}"))),
        }
    }
}

/// `"KEM" ‖ I2OSP(kem_id, 2)`, the suite id used inside DHKEM.
pub(crate) fn kem_suite_id(kem: KemId) -> [u8; 5] {
    let mut id = [0u8; 5];
    id[..3].copy_from_slice(b"KEM");
    id[3..].copy_from_slice(&kem.to_u16().to_be_bytes());
    id
}

/// `"HPKE" ‖ I2OSP(kem_id, 2) ‖ I2OSP(kdf_id, 2) ‖ I2OSP(aead_id, 2)`
pub(crate) fn hpke_suite_id(kem: KemId, kdf: KdfId, aead: AeadId) -> [u8; 10] {
    let mut id = [0u8; 10];
    id[..4].copy_from_slice(b"HPKE");
    id[4..6].copy_from_slice(&kem.to_u16().to_be_bytes());
    id[6..8].copy_from_slice(&kdf.to_u16().to_be_bytes());
    id[8..].copy_from_slice(&aead.to_u16().to_be_bytes());
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_wire_values() {
        for kem in [
            KemId::DhKemP256,
            KemId::DhKemP384,
            KemId::DhKemP521,
            KemId::DhKemX25519,
            KemId::DhKemX448,
        ] {
            assert_eq!(KemId::try_from(kem.to_u16()).unwrap(), kem);
        }
        for kdf in [KdfId::HkdfSha256, KdfId::HkdfSha384, KdfId::HkdfSha512] {
            assert_eq!(KdfId::try_from(kdf.to_u16()).unwrap(), kdf);
        }
        for aead in [AeadId::Aes128Gcm, AeadId::Aes256Gcm, AeadId::ChaCha20Poly1305, AeadId::ExportOnly]
        {
            assert_eq!(AeadId::try_from(aead.to_u16()).unwrap(), aead);
        }
    }

    #[test]
    fn unknown_ids_are_invalid_params() {
        assert!(matches!(KemId::try_from(0x0099), Err(CryptoError::InvalidParam { .. })));
        assert!(matches!(KdfId::try_from(0x0000), Err(CryptoError::InvalidParam { .. })));
        assert!(matches!(AeadId::try_from(0x0004), Err(CryptoError::InvalidParam { .. })));
    }

    #[test]
    fn suite_ids_are_big_endian() {
        assert_eq!(kem_suite_id(KemId::DhKemP256), *b"KEM\x00\x10");
        assert_eq!(
            hpke_suite_id(KemId::DhKemP256, KdfId::HkdfSha256, AeadId::Aes128Gcm),
            *b"HPKE\x00\x10\x00\x01\x00\x01"
        );
    }
}
