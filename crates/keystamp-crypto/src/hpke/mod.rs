//! Hybrid Public Key Encryption (RFC 9180), base mode.
//!
//! A [`CipherSuite`] binds a [`Kem`], a [`Kdf`] and an [`Aead`], each chosen
//! by identifier and resolved once into a trait object. The suite runs the
//! key schedule and hands out single-owner [`SenderContext`] and
//! [`RecipientContext`] values that enforce nonce/sequence discipline.
//!
//! ```text
//! sender                                   recipient
//!   encap(pkR) ──► (shared_secret, enc) ──enc──► decap(enc, skR)
//!        │                                          │
//!        ▼                                          ▼
//!   KeySchedule(shared_secret, info)         KeySchedule(...)
//!        │                                          │
//!        ▼                                          ▼
//!   seal(pt, aad) ──────────ct──────────────► open(ct, aad)
//! ```
//!
//! PSK and authenticated modes are not implemented.

pub mod aead;
pub mod context;
pub mod ids;
pub mod kdf;
pub mod kem;
pub mod suite;

pub use aead::{Aead, AeadContext};
pub use context::{EncryptionContext, RecipientContext, SenderContext};
pub use ids::{AeadId, KdfId, KemId};
pub use kdf::Kdf;
pub use kem::{Encapsulation, ImportedKey, Kem, KeyMaterial, KeyPair, PrivateKey, PublicKey};
pub use suite::CipherSuite;

/// Upper bound on `info` and exporter-context lengths.
pub const MAX_INFO_LEN: usize = 64 * 1024;

/// Upper bound on `DeriveKeyPair` input keying material.
pub const MAX_IKM_LEN: usize = 128;
