//! Zeroize-on-drop byte container for key material.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Owned secret bytes that are wiped when dropped.
///
/// Private keys, shared secrets, pseudorandom keys and decrypted credential
/// bytes all live in this type. Replacing a value (assignment, `Option`
/// overwrite) drops the previous one, which zeroes it.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    /// Take ownership of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Copy `bytes` into a new container.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Borrow the secret.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Mutable view, for filling in place.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SecretBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let secret = SecretBytes::from_slice(&[0xAA; 32]);
        let rendered = format!("{secret:?}");

        assert_eq!(rendered, "SecretBytes([REDACTED; 32])");
        assert!(!rendered.contains("aa"));
        assert!(!rendered.contains("170"));
    }

    #[test]
    fn zeroize_clears_contents() {
        let mut secret = SecretBytes::new(vec![0x42; 16]);
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
