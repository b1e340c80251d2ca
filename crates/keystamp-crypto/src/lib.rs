//! Keystamp Cryptographic Primitives
//!
//! Building blocks for delivering a signing credential under HPKE and using
//! it to stamp requests. Everything here is a pure computation: no I/O, no
//! global state. The only randomness is `Kem::generate_key_pair` and
//! `Kem::encap`; deterministic variants take caller-provided keying material
//! so tests and vectors are reproducible.
//!
//! # Modules
//!
//! - [`hpke`]: RFC 9180 base mode with DHKEM over P-256/P-384/P-521, X25519
//!   and X448; HKDF-SHA256/384/512; AES-GCM, ChaCha20-Poly1305 and
//!   export-only AEADs.
//! - [`ec`]: prime-field and point arithmetic used to derive a public key
//!   from a raw private scalar and to (de)compress SEC1 points.
//! - [`signature`]: IEEE-P1363 ⇄ DER conversion for ECDSA signatures.
//! - [`jwk`]: JSON Web Key import format.
//! - [`secret`]: zeroize-on-drop container for key material.
//!
//! # Credential delivery
//!
//! ```text
//! custodian                                client
//!                                          skR, pkR ◄── generate / derive
//!      ◄──────────────── pkR ───────────────
//! encap(pkR) → enc, ctx
//! ct = ctx.seal(credential, enc ‖ pkR)
//!      ──── compress(enc) ‖ ct ───────────►
//!                                          enc = decompress(...)
//!                                          ctx = decap(enc, skR)
//!                                          credential = ctx.open(ct, enc ‖ pkR)
//! ```
//!
//! # Security
//!
//! - Private keys, shared secrets and derived keys live in
//!   [`SecretBytes`], which zeroes its buffer on drop.
//! - A context's sequence counter never wraps; reaching the nonce-derived
//!   limit is a terminal error.
//! - The [`ec`] arithmetic is variable-time and runs only on the scalar
//!   being imported.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ec;
pub mod error;
pub mod hpke;
pub mod jwk;
pub mod secret;
pub mod signature;

pub use ec::NamedCurve;
pub use error::CryptoError;
pub use hpke::{
    AeadId, CipherSuite, KdfId, KemId, KeyPair, PrivateKey, PublicKey, RecipientContext,
    SenderContext,
};
pub use jwk::Jwk;
pub use secret::SecretBytes;
pub use signature::{der_to_p1363, p1363_to_der};
