//! Fuzz target for CredentialBundle::decode
//!
//! Arbitrary text in every format mode, plus the raw byte parser.
//!
//! # Invariants
//!
//! - NEVER panic on malformed bundle text
//! - A successfully decoded bundle has a 65-byte uncompressed key and a
//!   non-empty ciphertext
//! - Re-encoding a decoded bundle and decoding again yields the same bundle

#![no_main]

use keystamp_core::{BundleFormat, CredentialBundle};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = CredentialBundle::from_bytes(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for format in [BundleFormat::Auto, BundleFormat::Base58Check, BundleFormat::Base64Url] {
        let Ok(bundle) = CredentialBundle::decode(text, format) else {
            continue;
        };
        assert_eq!(bundle.encapsulated_key().len(), 65);
        assert!(!bundle.ciphertext().is_empty());

        let encoded = bundle.encode(format);
        let decoded = CredentialBundle::decode(&encoded, format).expect("re-encoded bundle decodes");
        assert_eq!(decoded, bundle);
    }
});
