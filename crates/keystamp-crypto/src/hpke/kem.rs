//! DHKEM (RFC 9180 §4.1) over the NIST curves, X25519 and X448.
//!
//! A [`DhKem`] is generic over a [`DhGroup`]: the group supplies the
//! Diffie-Hellman function, key validation and the `DeriveKeyPair` rule;
//! `DhKem` supplies encap/decap and the labeled shared-secret derivation with
//! the group's own KDF.

use std::{fmt, marker::PhantomData, sync::Arc};

use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::{RngCore, rngs::OsRng};

use super::{
    MAX_IKM_LEN,
    ids::{KemId, kem_suite_id},
    kdf::{HkdfSha256, HkdfSha384, HkdfSha512, Kdf},
};
use crate::{
    ec::montgomery,
    error::CryptoError,
    jwk::{Jwk, KTY_EC, KTY_OKP},
    secret::SecretBytes,
};

/// A serialized KEM public key (`SerializePublicKey` output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    kem: KemId,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// KEM this key belongs to.
    pub fn kem(&self) -> KemId {
        self.kem
    }

    /// Serialized form: uncompressed SEC1 for NIST curves, raw `u` for
    /// X25519/X448.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A serialized KEM private key. Wiped on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    kem: KemId,
    bytes: SecretBytes,
}

impl PrivateKey {
    /// KEM this key belongs to.
    pub fn kem(&self) -> KemId {
        self.kem
    }

    /// Serialized form: big-endian scalar for NIST curves, raw scalar for
    /// X25519/X448.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }
}

/// A matched private/public key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Private half
    pub private_key: PrivateKey,
    /// Public half
    pub public_key: PublicKey,
}

/// Input to [`Kem::import_key`].
#[derive(Debug, Clone, Copy)]
pub enum KeyMaterial<'a> {
    /// Serialized key bytes, as produced by `serialize_*_key`
    Raw(&'a [u8]),
    /// A JSON Web Key
    Jwk(&'a Jwk),
}

/// Output of [`Kem::import_key`].
#[derive(Debug, Clone)]
pub enum ImportedKey {
    /// A public key
    Public(PublicKey),
    /// A private key
    Private(PrivateKey),
}

/// Result of encapsulation.
#[derive(Debug, Clone)]
pub struct Encapsulation {
    /// KEM shared secret (`Nsecret` bytes)
    pub shared_secret: SecretBytes,
    /// Encapsulated key to send to the recipient (`Nenc` bytes)
    pub enc: Vec<u8>,
}

/// A key encapsulation mechanism.
pub trait Kem: Send + Sync + fmt::Debug {
    /// Algorithm identifier.
    fn id(&self) -> KemId;

    /// Shared secret length (`Nsecret`).
    fn secret_size(&self) -> usize;

    /// Encapsulated key length (`Nenc`).
    fn enc_size(&self) -> usize;

    /// Serialized public key length (`Npk`).
    fn public_key_size(&self) -> usize;

    /// Serialized private key length (`Nsk`).
    fn private_key_size(&self) -> usize;

    /// Fresh key pair from the operating-system RNG.
    ///
    /// # Errors
    ///
    /// - `DeriveKeyPair` in the astronomically unlikely case that no
    ///   candidate scalar is valid
    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError>;

    /// Deterministic key pair from input keying material.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if `ikm` exceeds 128 bytes
    /// - `DeriveKeyPair` if no valid scalar is found
    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, CryptoError>;

    /// Serialize a public key.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if the key belongs to another KEM
    fn serialize_public_key(&self, key: &PublicKey) -> Result<Vec<u8>, CryptoError>;

    /// Parse and validate a public key.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the bytes are not a valid public key for this group
    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, CryptoError>;

    /// Serialize a private key.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if the key belongs to another KEM
    fn serialize_private_key(&self, key: &PrivateKey) -> Result<SecretBytes, CryptoError>;

    /// Parse and validate a private key.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the bytes are not a valid private key for this group
    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, CryptoError>;

    /// Import a key from raw bytes or a JWK.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` if a JWK has the wrong type, curve or members
    /// - `InvalidKey` if the key material is invalid, or a private JWK's
    ///   public members disagree with its private value
    fn import_key(&self, material: KeyMaterial<'_>, is_public: bool)
    -> Result<ImportedKey, CryptoError>;

    /// Encapsulate to `recipient` with a fresh ephemeral key.
    ///
    /// # Errors
    ///
    /// - `Encap` if the key belongs to another KEM or Diffie-Hellman fails
    fn encap(&self, recipient: &PublicKey) -> Result<Encapsulation, CryptoError>;

    /// Encapsulate with the ephemeral key `DeriveKeyPair(ikm_e)`.
    ///
    /// # Errors
    ///
    /// Same as [`Kem::encap`], plus those of [`Kem::derive_key_pair`].
    fn encap_with_ephemeral_ikm(
        &self,
        recipient: &PublicKey,
        ikm_e: &[u8],
    ) -> Result<Encapsulation, CryptoError>;

    /// Recover the shared secret from `enc`.
    ///
    /// # Errors
    ///
    /// - `Decap` if `enc` is not a valid public key, the private key belongs
    ///   to another KEM, or Diffie-Hellman fails
    fn decap(&self, enc: &[u8], recipient: &PrivateKey) -> Result<SecretBytes, CryptoError>;
}

/// A Diffie-Hellman group usable by [`DhKem`].
pub trait DhGroup: Send + Sync + fmt::Debug + 'static {
    /// KEM built on this group.
    const KEM_ID: KemId;
    /// `Nsecret`
    const SECRET_SIZE: usize;
    /// `Npk` (and `Nenc`)
    const PUBLIC_KEY_SIZE: usize;
    /// `Nsk`
    const PRIVATE_KEY_SIZE: usize;
    /// JWK `kty`
    const JWK_KTY: &'static str;
    /// JWK `crv`
    const JWK_CRV: &'static str;

    /// KDF bound to the KEM (not the suite's KDF).
    type Kdf: Kdf + Default;

    /// `DeriveKeyPair` scalar selection from `dkp_prk`.
    ///
    /// # Errors
    ///
    /// - `DeriveKeyPair` if the candidate counter is exhausted
    fn derive_private_key(
        kdf: &Self::Kdf,
        suite_id: &[u8],
        dkp_prk: &[u8],
    ) -> Result<SecretBytes, CryptoError>;

    /// Public key for a validated private key.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if `private_key` is invalid
    fn public_key(private_key: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Validate a serialized public key.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the key is malformed or not on the curve
    fn validate_public_key(bytes: &[u8]) -> Result<(), CryptoError>;

    /// Validate a serialized private key.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the length is wrong or the scalar is out of range
    fn validate_private_key(bytes: &[u8]) -> Result<(), CryptoError>;

    /// Raw Diffie-Hellman output.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` on invalid inputs or an all-zero (low-order) result
    fn dh(private_key: &[u8], public_key: &[u8]) -> Result<SecretBytes, CryptoError>;

    /// Public key bytes from a JWK already checked for `kty`/`crv`.
    ///
    /// # Errors
    ///
    /// - `InvalidParam` on missing or malformed members
    fn public_key_from_jwk(jwk: &Jwk) -> Result<Vec<u8>, CryptoError>;
}

/// DHKEM over the group `G`.
pub struct DhKem<G: DhGroup> {
    kdf: G::Kdf,
    suite_id: [u8; 5],
    _group: PhantomData<G>,
}

/// DHKEM(P-256, HKDF-SHA256)
pub type DhKemP256 = DhKem<P256Group>;
/// DHKEM(P-384, HKDF-SHA384)
pub type DhKemP384 = DhKem<P384Group>;
/// DHKEM(P-521, HKDF-SHA512)
pub type DhKemP521 = DhKem<P521Group>;
/// DHKEM(X25519, HKDF-SHA256)
pub type DhKemX25519 = DhKem<X25519Group>;
/// DHKEM(X448, HKDF-SHA512)
pub type DhKemX448 = DhKem<X448Group>;

impl<G: DhGroup> DhKem<G> {
    /// KEM engine for `G`.
    pub fn new() -> Self {
        Self { kdf: G::Kdf::default(), suite_id: kem_suite_id(G::KEM_ID), _group: PhantomData }
    }

    fn check_kem(&self, kem: KemId) -> Result<(), CryptoError> {
        if kem != G::KEM_ID {
            return Err(CryptoError::invalid_param(format!(
                "key belongs to {kem:?}, engine is {:?}",
                G::KEM_ID
            )));
        }
        Ok(())
    }

    fn private_key(&self, bytes: SecretBytes) -> PrivateKey {
        PrivateKey { kem: G::KEM_ID, bytes }
    }

    fn public_key(&self, bytes: Vec<u8>) -> PublicKey {
        PublicKey { kem: G::KEM_ID, bytes }
    }

    fn key_pair(&self, private_key: SecretBytes) -> Result<KeyPair, CryptoError> {
        let public_key = G::public_key(private_key.as_bytes())?;
        Ok(KeyPair { private_key: self.private_key(private_key), public_key: self.public_key(public_key) })
    }

    fn encap_with_key_pair(
        &self,
        recipient: &PublicKey,
        ephemeral: &KeyPair,
    ) -> Result<Encapsulation, CryptoError> {
        let encap_error = |e: CryptoError| CryptoError::Encap { reason: e.to_string() };
        self.check_kem(recipient.kem).map_err(encap_error)?;

        let dh = G::dh(ephemeral.private_key.as_bytes(), recipient.as_bytes()).map_err(encap_error)?;
        let enc = ephemeral.public_key.as_bytes().to_vec();

        let mut kem_context = Vec::with_capacity(enc.len() + recipient.as_bytes().len());
        kem_context.extend_from_slice(&enc);
        kem_context.extend_from_slice(recipient.as_bytes());

        let shared_secret = self
            .kdf
            .extract_and_expand(&self.suite_id, dh.as_bytes(), &kem_context, G::SECRET_SIZE)
            .map_err(encap_error)?;
        Ok(Encapsulation { shared_secret, enc })
    }
}

impl<G: DhGroup> Default for DhKem<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: DhGroup> fmt::Debug for DhKem<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhKem").field("id", &G::KEM_ID).finish()
    }
}

impl<G: DhGroup> Kem for DhKem<G> {
    fn id(&self) -> KemId {
        G::KEM_ID
    }

    fn secret_size(&self) -> usize {
        G::SECRET_SIZE
    }

    fn enc_size(&self) -> usize {
        G::PUBLIC_KEY_SIZE
    }

    fn public_key_size(&self) -> usize {
        G::PUBLIC_KEY_SIZE
    }

    fn private_key_size(&self) -> usize {
        G::PRIVATE_KEY_SIZE
    }

    fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        let mut ikm = SecretBytes::new(vec![0u8; G::PRIVATE_KEY_SIZE]);
        OsRng.fill_bytes(ikm.as_mut_bytes());
        self.derive_key_pair(ikm.as_bytes())
    }

    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, CryptoError> {
        if ikm.len() > MAX_IKM_LEN {
            return Err(CryptoError::invalid_param(format!(
                "ikm must be at most {MAX_IKM_LEN} bytes, got {}",
                ikm.len()
            )));
        }

        let dkp_prk = self.kdf.labeled_extract(&self.suite_id, b"", b"dkp_prk", ikm);
        let private_key = G::derive_private_key(&self.kdf, &self.suite_id, dkp_prk.as_bytes())?;
        self.key_pair(private_key)
    }

    fn serialize_public_key(&self, key: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        self.check_kem(key.kem)?;
        Ok(key.bytes.clone())
    }

    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, CryptoError> {
        G::validate_public_key(bytes)?;
        Ok(self.public_key(bytes.to_vec()))
    }

    fn serialize_private_key(&self, key: &PrivateKey) -> Result<SecretBytes, CryptoError> {
        self.check_kem(key.kem)?;
        Ok(key.bytes.clone())
    }

    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, CryptoError> {
        G::validate_private_key(bytes)?;
        Ok(self.private_key(SecretBytes::from_slice(bytes)))
    }

    fn import_key(
        &self,
        material: KeyMaterial<'_>,
        is_public: bool,
    ) -> Result<ImportedKey, CryptoError> {
        match (material, is_public) {
            (KeyMaterial::Raw(bytes), true) => self.deserialize_public_key(bytes).map(ImportedKey::Public),
            (KeyMaterial::Raw(bytes), false) => {
                self.deserialize_private_key(bytes).map(ImportedKey::Private)
            },
            (KeyMaterial::Jwk(jwk), true) => {
                jwk.expect_curve(G::JWK_KTY, G::JWK_CRV)?;
                let bytes = G::public_key_from_jwk(jwk)?;
                self.deserialize_public_key(&bytes).map(ImportedKey::Public)
            },
            (KeyMaterial::Jwk(jwk), false) => {
                jwk.expect_curve(G::JWK_KTY, G::JWK_CRV)?;
                let private_value = jwk.private_value(G::PRIVATE_KEY_SIZE)?;
                let private_key = self.deserialize_private_key(private_value.as_bytes())?;

                if jwk.x.is_some() {
                    let claimed = G::public_key_from_jwk(jwk)?;
                    if claimed != G::public_key(private_key.as_bytes())? {
                        return Err(CryptoError::invalid_private_key(
                            "JWK public members do not match the private value",
                        ));
                    }
                }
                Ok(ImportedKey::Private(private_key))
            },
        }
    }

    fn encap(&self, recipient: &PublicKey) -> Result<Encapsulation, CryptoError> {
        let ephemeral = self
            .generate_key_pair()
            .map_err(|e| CryptoError::Encap { reason: e.to_string() })?;
        self.encap_with_key_pair(recipient, &ephemeral)
    }

    fn encap_with_ephemeral_ikm(
        &self,
        recipient: &PublicKey,
        ikm_e: &[u8],
    ) -> Result<Encapsulation, CryptoError> {
        let ephemeral = self.derive_key_pair(ikm_e)?;
        self.encap_with_key_pair(recipient, &ephemeral)
    }

    fn decap(&self, enc: &[u8], recipient: &PrivateKey) -> Result<SecretBytes, CryptoError> {
        let decap_error = |e: CryptoError| CryptoError::Decap { reason: e.to_string() };
        self.check_kem(recipient.kem).map_err(decap_error)?;
        G::validate_public_key(enc).map_err(decap_error)?;

        let dh = G::dh(recipient.as_bytes(), enc).map_err(decap_error)?;
        let recipient_public = G::public_key(recipient.as_bytes()).map_err(decap_error)?;

        let mut kem_context = Vec::with_capacity(enc.len() + recipient_public.len());
        kem_context.extend_from_slice(enc);
        kem_context.extend_from_slice(&recipient_public);

        self.kdf
            .extract_and_expand(&self.suite_id, dh.as_bytes(), &kem_context, G::SECRET_SIZE)
            .map_err(decap_error)
    }
}

macro_rules! nist_group {
    (
        $(#[$doc:meta])*
        $group:ident, $curve:ident, $kem:expr, $kdf:ty, $crv:literal,
        secret = $secret:expr, field = $field:expr, bitmask = $bitmask:expr
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $group;

        impl DhGroup for $group {
            const KEM_ID: KemId = $kem;
            const SECRET_SIZE: usize = $secret;
            const PUBLIC_KEY_SIZE: usize = 1 + 2 * $field;
            const PRIVATE_KEY_SIZE: usize = $field;
            const JWK_KTY: &'static str = KTY_EC;
            const JWK_CRV: &'static str = $crv;

            type Kdf = $kdf;

            fn derive_private_key(
                kdf: &Self::Kdf,
                suite_id: &[u8],
                dkp_prk: &[u8],
            ) -> Result<SecretBytes, CryptoError> {
                for counter in 0..=u8::MAX {
                    let mut candidate =
                        kdf.labeled_expand(suite_id, dkp_prk, b"candidate", &[counter], $field)?;
                    candidate.as_mut_bytes()[0] &= $bitmask;
                    if $curve::SecretKey::from_slice(candidate.as_bytes()).is_ok() {
                        return Ok(candidate);
                    }
                }
                Err(CryptoError::DeriveKeyPair)
            }

            fn public_key(private_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
                let secret = Self::secret_key(private_key)?;
                Ok(secret.public_key().to_encoded_point(false).as_bytes().to_vec())
            }

            fn validate_public_key(bytes: &[u8]) -> Result<(), CryptoError> {
                Self::parse_public_key(bytes).map(|_| ())
            }

            fn validate_private_key(bytes: &[u8]) -> Result<(), CryptoError> {
                Self::secret_key(bytes).map(|_| ())
            }

            fn dh(private_key: &[u8], public_key: &[u8]) -> Result<SecretBytes, CryptoError> {
                let secret = Self::secret_key(private_key)?;
                let public = Self::parse_public_key(public_key)?;
                let shared = $curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
                Ok(SecretBytes::from_slice(shared.raw_secret_bytes().as_slice()))
            }

            fn public_key_from_jwk(jwk: &Jwk) -> Result<Vec<u8>, CryptoError> {
                jwk.ec_point($field)
            }
        }

        impl $group {
            fn secret_key(bytes: &[u8]) -> Result<$curve::SecretKey, CryptoError> {
                if bytes.len() != $field {
                    return Err(CryptoError::invalid_private_key(format!(
                        "expected {} bytes, got {}",
                        $field,
                        bytes.len()
                    )));
                }
                $curve::SecretKey::from_slice(bytes)
                    .map_err(|_| CryptoError::invalid_private_key("scalar out of range"))
            }

            fn parse_public_key(bytes: &[u8]) -> Result<$curve::PublicKey, CryptoError> {
                if bytes.len() != 1 + 2 * $field || bytes[0] != crate::ec::UNCOMPRESSED_PREFIX {
                    return Err(CryptoError::invalid_public_key(format!(
                        "expected {}-byte uncompressed point",
                        1 + 2 * $field
                    )));
                }
                $curve::PublicKey::from_sec1_bytes(bytes)
                    .map_err(|_| CryptoError::invalid_public_key("point is not on the curve"))
            }
        }
    };
}

nist_group!(
    /// NIST P-256 for DHKEM.
    P256Group, p256, KemId::DhKemP256, HkdfSha256, "P-256",
    secret = 32, field = 32, bitmask = 0xFF
);

nist_group!(
    /// NIST P-384 for DHKEM.
    P384Group, p384, KemId::DhKemP384, HkdfSha384, "P-384",
    secret = 48, field = 48, bitmask = 0xFF
);

nist_group!(
    /// NIST P-521 for DHKEM.
    P521Group, p521, KemId::DhKemP521, HkdfSha512, "P-521",
    secret = 64, field = 66, bitmask = 0x01
);

/// X25519 for DHKEM, via x25519-dalek.
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519Group;

/// X448 for DHKEM, via the internal Montgomery ladder.
#[derive(Debug, Clone, Copy, Default)]
pub struct X448Group;

fn fixed<const N: usize>(bytes: &[u8], kind: &'static str) -> Result<[u8; N], CryptoError> {
    <[u8; N]>::try_from(bytes).map_err(|_| CryptoError::InvalidKey {
        kind,
        reason: format!("expected {N} bytes, got {}", bytes.len()),
    })
}

fn non_zero_shared(shared: &[u8]) -> Result<SecretBytes, CryptoError> {
    if shared.iter().all(|&b| b == 0) {
        return Err(CryptoError::invalid_public_key("low-order point"));
    }
    Ok(SecretBytes::from_slice(shared))
}

impl DhGroup for X25519Group {
    const KEM_ID: KemId = KemId::DhKemX25519;
    const SECRET_SIZE: usize = 32;
    const PUBLIC_KEY_SIZE: usize = 32;
    const PRIVATE_KEY_SIZE: usize = 32;
    const JWK_KTY: &'static str = KTY_OKP;
    const JWK_CRV: &'static str = "X25519";

    type Kdf = HkdfSha256;

    fn derive_private_key(
        kdf: &Self::Kdf,
        suite_id: &[u8],
        dkp_prk: &[u8],
    ) -> Result<SecretBytes, CryptoError> {
        kdf.labeled_expand(suite_id, dkp_prk, b"sk", b"", Self::PRIVATE_KEY_SIZE)
    }

    fn public_key(private_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let scalar = fixed::<32>(private_key, "private")?;
        Ok(x25519_dalek::x25519(scalar, x25519_dalek::X25519_BASEPOINT_BYTES).to_vec())
    }

    fn validate_public_key(bytes: &[u8]) -> Result<(), CryptoError> {
        fixed::<32>(bytes, "public").map(|_| ())
    }

    fn validate_private_key(bytes: &[u8]) -> Result<(), CryptoError> {
        fixed::<32>(bytes, "private").map(|_| ())
    }

    fn dh(private_key: &[u8], public_key: &[u8]) -> Result<SecretBytes, CryptoError> {
        let scalar = fixed::<32>(private_key, "private")?;
        let point = fixed::<32>(public_key, "public")?;
        non_zero_shared(&x25519_dalek::x25519(scalar, point))
    }

    fn public_key_from_jwk(jwk: &Jwk) -> Result<Vec<u8>, CryptoError> {
        jwk.okp_public(Self::PUBLIC_KEY_SIZE)
    }
}

impl DhGroup for X448Group {
    const KEM_ID: KemId = KemId::DhKemX448;
    const SECRET_SIZE: usize = 64;
    const PUBLIC_KEY_SIZE: usize = 56;
    const PRIVATE_KEY_SIZE: usize = 56;
    const JWK_KTY: &'static str = KTY_OKP;
    const JWK_CRV: &'static str = "X448";

    type Kdf = HkdfSha512;

    fn derive_private_key(
        kdf: &Self::Kdf,
        suite_id: &[u8],
        dkp_prk: &[u8],
    ) -> Result<SecretBytes, CryptoError> {
        kdf.labeled_expand(suite_id, dkp_prk, b"sk", b"", Self::PRIVATE_KEY_SIZE)
    }

    fn public_key(private_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let scalar = fixed::<56>(private_key, "private")?;
        let base = montgomery::base_point(montgomery::X448_BASE_POINT);
        Ok(montgomery::x448(&scalar, &base).to_vec())
    }

    fn validate_public_key(bytes: &[u8]) -> Result<(), CryptoError> {
        fixed::<56>(bytes, "public").map(|_| ())
    }

    fn validate_private_key(bytes: &[u8]) -> Result<(), CryptoError> {
        fixed::<56>(bytes, "private").map(|_| ())
    }

    fn dh(private_key: &[u8], public_key: &[u8]) -> Result<SecretBytes, CryptoError> {
        let scalar = fixed::<56>(private_key, "private")?;
        let point = fixed::<56>(public_key, "public")?;
        non_zero_shared(&montgomery::x448(&scalar, &point))
    }

    fn public_key_from_jwk(jwk: &Jwk) -> Result<Vec<u8>, CryptoError> {
        jwk.okp_public(Self::PUBLIC_KEY_SIZE)
    }
}

/// Engine for `id`.
pub fn engine(id: KemId) -> Arc<dyn Kem> {
    match id {
        KemId::DhKemP256 => Arc::new(DhKemP256::new()),
        KemId::DhKemP384 => Arc::new(DhKemP384::new()),
        KemId::DhKemP521 => Arc::new(DhKemP521::new()),
        KemId::DhKemX25519 => Arc::new(DhKemX25519::new()),
        KemId::DhKemX448 => Arc::new(DhKemX448::new()),
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::*;

    const ALL_KEMS: [KemId; 5] = [
        KemId::DhKemP256,
        KemId::DhKemP384,
        KemId::DhKemP521,
        KemId::DhKemX25519,
        KemId::DhKemX448,
    ];

    fn hex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    // RFC 9180 A.3.1
    #[test]
    fn p256_derive_key_pair_vector() {
        let kem = DhKemP256::new();
        let pair = kem
            .derive_key_pair(&hex("4270e54ffd08d79d5928020af4686d8f6b7d35dbe470265f1f5aa22816ce860e"))
            .unwrap();

        assert_eq!(
            pair.private_key.as_bytes(),
            hex("4995788ef4b9d6132b249ce59a77281493eb39af373d236a1fe415cb0c2d7beb")
        );
        assert_eq!(
            pair.public_key.as_bytes(),
            hex(
                "04a92719c6195d5085104f469a8b9814d5838ff72b60501e2c4466e5e67b325ac98536d7b61a1af4b78e5b7f951c0900be863c403ce65c9bfcb9382657222d18c4"
            )
        );
    }

    // RFC 9180 A.1.1
    #[test]
    fn x25519_derive_key_pair_vector() {
        let kem = DhKemX25519::new();
        let pair = kem
            .derive_key_pair(&hex("7268600d403fce431561aef583ee1613527cff655c1343f29812e66706df3234"))
            .unwrap();

        assert_eq!(
            pair.private_key.as_bytes(),
            hex("52c4a758a802cd8b936eceea314432798d5baf2d7e9235dc084ab1b9cfa2f736")
        );
        assert_eq!(
            pair.public_key.as_bytes(),
            hex("37fda3567bdbd628e88668c3c8d7e97d1d1253b6d4ea6d44c150f741f1bf4431")
        );
    }

    #[test]
    fn encap_decap_agree_for_every_kem() {
        for id in ALL_KEMS {
            let kem = engine(id);
            let recipient = kem.derive_key_pair(&[0x42; 32]).unwrap();

            let encapsulation = kem.encap(&recipient.public_key).unwrap();
            assert_eq!(encapsulation.enc.len(), kem.enc_size(), "{id:?}");
            assert_eq!(encapsulation.shared_secret.len(), kem.secret_size(), "{id:?}");

            let shared = kem.decap(&encapsulation.enc, &recipient.private_key).unwrap();
            assert_eq!(shared, encapsulation.shared_secret, "{id:?}");
        }
    }

    #[test]
    fn key_sizes_match_rfc9180() {
        let expected = [
            (KemId::DhKemP256, 32, 65, 32),
            (KemId::DhKemP384, 48, 97, 48),
            (KemId::DhKemP521, 64, 133, 66),
            (KemId::DhKemX25519, 32, 32, 32),
            (KemId::DhKemX448, 64, 56, 56),
        ];
        for (id, secret, pk, sk) in expected {
            let kem = engine(id);
            assert_eq!(kem.id(), id);
            assert_eq!(
                (kem.secret_size(), kem.public_key_size(), kem.private_key_size()),
                (secret, pk, sk),
                "{id:?}"
            );
        }
    }

    #[test]
    fn derive_key_pair_is_deterministic() {
        for id in ALL_KEMS {
            let kem = engine(id);
            let a = kem.derive_key_pair(b"same ikm").unwrap();
            let b = kem.derive_key_pair(b"same ikm").unwrap();
            assert_eq!(a.public_key, b.public_key, "{id:?}");
            assert_eq!(a.private_key, b.private_key, "{id:?}");
        }
    }

    #[test]
    fn oversized_ikm_is_rejected() {
        let kem = DhKemP256::new();
        assert!(kem.derive_key_pair(&[0u8; MAX_IKM_LEN]).is_ok());
        assert!(matches!(
            kem.derive_key_pair(&[0u8; MAX_IKM_LEN + 1]),
            Err(CryptoError::InvalidParam { .. })
        ));
    }

    #[test]
    fn deserialize_rejects_invalid_public_keys() {
        let kem = DhKemP256::new();
        let pair = kem.derive_key_pair(b"ikm").unwrap();

        let mut off_curve = pair.public_key.as_bytes().to_vec();
        off_curve[64] ^= 0x01;
        assert!(matches!(
            kem.deserialize_public_key(&off_curve),
            Err(CryptoError::InvalidKey { kind: "public", .. })
        ));

        let compressed = &pair.public_key.as_bytes()[..33];
        assert!(kem.deserialize_public_key(compressed).is_err());
    }

    #[test]
    fn deserialize_rejects_out_of_range_private_key() {
        let kem = DhKemP256::new();
        assert!(matches!(
            kem.deserialize_private_key(&[0u8; 32]),
            Err(CryptoError::InvalidKey { kind: "private", .. })
        ));
        assert!(kem.deserialize_private_key(&[0xFF; 32]).is_err());
        assert!(kem.deserialize_private_key(&[0x01; 31]).is_err());
    }

    #[test]
    fn serialization_roundtrips() {
        for id in ALL_KEMS {
            let kem = engine(id);
            let pair = kem.derive_key_pair(b"roundtrip").unwrap();

            let pk = kem.serialize_public_key(&pair.public_key).unwrap();
            assert_eq!(kem.deserialize_public_key(&pk).unwrap(), pair.public_key, "{id:?}");

            let sk = kem.serialize_private_key(&pair.private_key).unwrap();
            assert_eq!(kem.deserialize_private_key(sk.as_bytes()).unwrap(), pair.private_key);
        }
    }

    #[test]
    fn keys_from_another_kem_are_rejected() {
        let p256 = DhKemP256::new();
        let p384 = DhKemP384::new();
        let pair = p384.derive_key_pair(b"ikm").unwrap();

        assert!(matches!(p256.encap(&pair.public_key), Err(CryptoError::Encap { .. })));
        assert!(p256.serialize_public_key(&pair.public_key).is_err());
    }

    #[test]
    fn decap_rejects_malformed_enc() {
        let kem = DhKemP256::new();
        let pair = kem.derive_key_pair(b"ikm").unwrap();
        assert!(matches!(kem.decap(&[0x04; 10], &pair.private_key), Err(CryptoError::Decap { .. })));
    }

    #[test]
    fn x25519_rejects_low_order_public_key() {
        let kem = DhKemX25519::new();
        let zero = kem.deserialize_public_key(&[0u8; 32]).unwrap();
        assert!(matches!(kem.encap(&zero), Err(CryptoError::Encap { .. })));
    }

    #[test]
    fn import_ec_jwk_pair() {
        let kem = DhKemP256::new();
        let pair = kem.derive_key_pair(b"jwk").unwrap();

        let mut jwk = Jwk::ec_public("P-256", 32, pair.public_key.as_bytes()).unwrap();
        let ImportedKey::Public(public) = kem.import_key(KeyMaterial::Jwk(&jwk), true).unwrap() else {
            panic!("expected a public key");
        };
        assert_eq!(public, pair.public_key);

        jwk.d = Some(URL_SAFE_NO_PAD.encode(pair.private_key.as_bytes()));
        let ImportedKey::Private(private) = kem.import_key(KeyMaterial::Jwk(&jwk), false).unwrap() else {
            panic!("expected a private key");
        };
        assert_eq!(private, pair.private_key);
    }

    #[test]
    fn import_rejects_mismatched_jwk() {
        let kem = DhKemP256::new();
        let pair = kem.derive_key_pair(b"one").unwrap();
        let other = kem.derive_key_pair(b"two").unwrap();

        let mut jwk = Jwk::ec_public("P-256", 32, other.public_key.as_bytes()).unwrap();
        jwk.d = Some(URL_SAFE_NO_PAD.encode(pair.private_key.as_bytes()));
        assert!(matches!(
            kem.import_key(KeyMaterial::Jwk(&jwk), false),
            Err(CryptoError::InvalidKey { kind: "private", .. })
        ));

        jwk.crv = "P-384".to_string();
        assert!(matches!(
            kem.import_key(KeyMaterial::Jwk(&jwk), true),
            Err(CryptoError::InvalidParam { .. })
        ));
    }

    #[test]
    fn import_okp_jwk() {
        let kem = DhKemX25519::new();
        let pair = kem.derive_key_pair(b"okp").unwrap();
        let json = format!(
            r#"{{"kty":"OKP","crv":"X25519","x":"{}"}}"#,
            URL_SAFE_NO_PAD.encode(pair.public_key.as_bytes())
        );
        let jwk = Jwk::from_json(&json).unwrap();

        let ImportedKey::Public(public) = kem.import_key(KeyMaterial::Jwk(&jwk), true).unwrap() else {
            panic!("expected a public key");
        };
        assert_eq!(public, pair.public_key);
    }

    #[test]
    fn import_raw_keys() {
        let kem = DhKemX448::new();
        let pair = kem.derive_key_pair(b"raw").unwrap();

        let imported = kem.import_key(KeyMaterial::Raw(pair.private_key.as_bytes()), false).unwrap();
        assert!(matches!(imported, ImportedKey::Private(ref key) if *key == pair.private_key));
    }
}
