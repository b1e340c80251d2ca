//! Keystamp Core
//!
//! Loads a signing credential delivered as an HPKE-sealed bundle and uses it
//! to stamp outgoing API requests.
//!
//! # Architecture
//!
//! ```text
//! bundle text ─► bundle::CredentialBundle::decode ─► open (HPKE, P-256/SHA-256/AES-256-GCM)
//!                                                         │
//!                                                         ▼ raw scalar
//! payload ──────► Stamper::stamp ─► ec::derive_public_key ─► JWK ─► CryptoProvider::sign
//!                                                                        │ P1363
//!                                                                        ▼
//!                                     X-Stamp: base64url({publicKey, scheme, signature(DER)})
//! ```
//!
//! [`Stamper`] owns the lifecycle (see [`stamper`] for the state diagram).
//! Signing and randomness go through [`CryptoProvider`]; the default
//! [`RustCryptoProvider`] uses the OS RNG and the `p256` crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod provider;
pub mod stamp;
pub mod stamper;

pub use bundle::{BundleFormat, CredentialBundle, seal_credential};
pub use config::StamperConfig;
pub use error::StamperError;
pub use provider::{CryptoProvider, RustCryptoProvider};
pub use stamp::{SIGNATURE_SCHEME, STAMP_HEADER_NAME, Stamp, StampEnvelope};
pub use stamper::{Stamper, StamperState};
