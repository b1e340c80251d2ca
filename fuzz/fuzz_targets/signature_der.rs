//! Fuzz target for IEEE-P1363 ⇄ DER conversion
//!
//! # Invariants
//!
//! - `p1363_to_der` accepts exactly the even lengths 2..=132
//! - `der_to_p1363(p1363_to_der(sig))` recovers `sig`
//! - `der_to_p1363` NEVER panics on arbitrary DER input

#![no_main]

use arbitrary::Arbitrary;
use keystamp_crypto::signature::{MAX_P1363_LEN, der_to_p1363, p1363_to_der};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    signature: Vec<u8>,
    der: Vec<u8>,
    scalar_size: u8,
}

fuzz_target!(|input: FuzzInput| {
    let len = input.signature.len();
    match p1363_to_der(&input.signature) {
        Ok(der) => {
            assert!(len > 0 && len % 2 == 0 && len <= MAX_P1363_LEN);
            let recovered = der_to_p1363(&der, len / 2).expect("own DER parses");
            assert_eq!(recovered, input.signature);
        },
        Err(_) => assert!(len == 0 || len % 2 == 1 || len > MAX_P1363_LEN),
    }

    if let Ok(p1363) = der_to_p1363(&input.der, usize::from(input.scalar_size)) {
        assert_eq!(p1363.len(), 2 * usize::from(input.scalar_size));
    }
});
