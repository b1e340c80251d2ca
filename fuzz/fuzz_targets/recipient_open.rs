//! Fuzz target for HPKE recipient contexts
//!
//! Prevent forged or corrupted ciphertexts from opening and make sure a
//! rejected open never moves the sequence counter.
//!
//! # Strategy
//!
//! - Arbitrary `enc` bytes fed to decapsulation
//! - Bit flips in a genuine ciphertext
//! - Arbitrary ciphertext against a genuine context
//!
//! # Invariants
//!
//! - Genuine ciphertexts open to the original plaintext
//! - Any single bit flip MUST fail to open
//! - A failed open leaves `seq` unchanged
//! - NEVER panic on malformed `enc` or ciphertext

#![no_main]

use arbitrary::Arbitrary;
use keystamp_crypto::hpke::{AeadId, CipherSuite, KdfId, KemId};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    ikm_r: [u8; 32],
    ikm_e: [u8; 32],
    plaintext: Vec<u8>,
    aad: Vec<u8>,
    attack: Attack,
}

#[derive(Debug, Arbitrary)]
enum Attack {
    ArbitraryEnc(Vec<u8>),
    BitFlip { byte_offset: u16, bit_offset: u8 },
    ArbitraryCiphertext(Vec<u8>),
}

fuzz_target!(|input: FuzzInput| {
    let suite = CipherSuite::new(KemId::DhKemP256, KdfId::HkdfSha256, AeadId::Aes256Gcm);
    let recipient = suite.kem().derive_key_pair(&input.ikm_r).expect("derive recipient");
    let mut sender = suite
        .create_sender_context_with_ephemeral_ikm(&recipient.public_key, b"", &input.ikm_e)
        .expect("sender context");
    let ciphertext = sender.seal(&input.plaintext, &input.aad).expect("seal");

    match input.attack {
        Attack::ArbitraryEnc(enc) => {
            let _ = suite.open(&recipient.private_key, &enc, b"", &input.aad, &ciphertext);
        },
        Attack::BitFlip { byte_offset, bit_offset } => {
            let mut context = suite
                .create_recipient_context(&recipient.private_key, sender.enc(), b"")
                .expect("recipient context");

            let mut tampered = ciphertext.clone();
            let index = usize::from(byte_offset) % tampered.len();
            tampered[index] ^= 1 << (bit_offset % 8);
            assert!(context.open(&tampered, &input.aad).is_err());
            assert_eq!(context.seq(), 0);

            let opened = context.open(&ciphertext, &input.aad).expect("genuine ciphertext opens");
            assert_eq!(opened, input.plaintext);
            assert_eq!(context.seq(), 1);
        },
        Attack::ArbitraryCiphertext(bytes) => {
            let mut context = suite
                .create_recipient_context(&recipient.private_key, sender.enc(), b"")
                .expect("recipient context");
            if bytes != ciphertext && context.open(&bytes, &input.aad).is_err() {
                assert_eq!(context.seq(), 0);
            }
        },
    }
});
