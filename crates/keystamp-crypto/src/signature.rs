//! ECDSA signature encodings: IEEE-P1363 (`r ‖ s`) and ASN.1 DER.
//!
//! ```text
//! SEQUENCE {            30 len
//!   r INTEGER,          02 len r
//!   s INTEGER,          02 len s
//! }
//! ```
//!
//! INTEGERs are minimal two's complement: leading zero bytes are stripped and
//! a single `0x00` is prepended when the high bit would otherwise mark the
//! value negative. Lengths of 128 or more use the long form (`0x81 len`).

use crate::error::CryptoError;

/// Largest P1363 signature accepted (P-521: two 66-byte scalars).
pub const MAX_P1363_LEN: usize = 132;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Convert `r ‖ s` to DER.
///
/// # Errors
///
/// - `InvalidSignature` if the length is zero, odd, or above
///   [`MAX_P1363_LEN`]
pub fn p1363_to_der(signature: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if signature.is_empty() || signature.len() % 2 != 0 || signature.len() > MAX_P1363_LEN {
        return Err(invalid(format!(
            "P1363 signature must have even length in 2..={MAX_P1363_LEN}, got {}",
            signature.len()
        )));
    }

    let (r, s) = signature.split_at(signature.len() / 2);
    let r = encode_integer(r);
    let s = encode_integer(s);

    let mut der = Vec::with_capacity(3 + r.len() + s.len());
    der.push(TAG_SEQUENCE);
    encode_length(r.len() + s.len(), &mut der);
    der.extend_from_slice(&r);
    der.extend_from_slice(&s);
    Ok(der)
}

/// Convert DER back to fixed-width `r ‖ s`, each half `scalar_size` bytes.
///
/// # Errors
///
/// - `InvalidSignature` on any structural problem: wrong tags, bad lengths,
///   negative or oversized integers, trailing bytes
pub fn der_to_p1363(der: &[u8], scalar_size: usize) -> Result<Vec<u8>, CryptoError> {
    let mut reader = DerReader { input: der };
    let body = reader.read_tlv(TAG_SEQUENCE)?;
    if !reader.input.is_empty() {
        return Err(invalid("trailing bytes after SEQUENCE"));
    }

    let mut body = DerReader { input: body };
    let r = body.read_tlv(TAG_INTEGER)?;
    let s = body.read_tlv(TAG_INTEGER)?;
    if !body.input.is_empty() {
        return Err(invalid("trailing bytes inside SEQUENCE"));
    }

    let mut out = vec![0u8; 2 * scalar_size];
    decode_integer(r, &mut out[..scalar_size])?;
    decode_integer(s, &mut out[scalar_size..])?;
    Ok(out)
}

fn invalid(reason: impl Into<String>) -> CryptoError {
    CryptoError::InvalidSignature { reason: reason.into() }
}

fn encode_integer(magnitude: &[u8]) -> Vec<u8> {
    let first_nonzero = magnitude.iter().position(|&b| b != 0).unwrap_or(magnitude.len());
    let trimmed = &magnitude[first_nonzero..];

    let mut content = Vec::with_capacity(trimmed.len() + 1);
    match trimmed.first() {
        None => content.push(0x00),
        Some(&b) if b & 0x80 != 0 => {
            content.push(0x00);
            content.extend_from_slice(trimmed);
        },
        Some(_) => content.extend_from_slice(trimmed),
    }

    let mut out = Vec::with_capacity(content.len() + 3);
    out.push(TAG_INTEGER);
    encode_length(content.len(), &mut out);
    out.extend_from_slice(&content);
    out
}

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let significant = &bytes[first..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// Strip the sign byte and left-pad into `out`.
fn decode_integer(content: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
    let Some(&first) = content.first() else {
        return Err(invalid("empty INTEGER"));
    };
    if first & 0x80 != 0 {
        return Err(invalid("negative INTEGER"));
    }

    let first_nonzero = content.iter().position(|&b| b != 0).unwrap_or(content.len());
    let magnitude = &content[first_nonzero..];
    if magnitude.len() > out.len() {
        return Err(invalid(format!(
            "INTEGER of {} bytes exceeds scalar size {}",
            magnitude.len(),
            out.len()
        )));
    }
    let offset = out.len() - magnitude.len();
    out[offset..].copy_from_slice(magnitude);
    Ok(())
}

struct DerReader<'a> {
    input: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn read_tlv(&mut self, tag: u8) -> Result<&'a [u8], CryptoError> {
        let [actual, rest @ ..] = self.input else {
            return Err(invalid("truncated DER"));
        };
        if *actual != tag {
            return Err(invalid(format!("expected tag {tag:#04x}, got {actual:#04x}")));
        }

        let (len, rest) = read_length(rest)?;
        if rest.len() < len {
            return Err(invalid("DER length exceeds input"));
        }
        let (value, rest) = rest.split_at(len);
        self.input = rest;
        Ok(value)
    }
}

fn read_length(input: &[u8]) -> Result<(usize, &[u8]), CryptoError> {
    let [first, rest @ ..] = input else {
        return Err(invalid("missing DER length"));
    };
    if first & 0x80 == 0 {
        return Ok((usize::from(*first), rest));
    }

    let count = usize::from(first & 0x7F);
    if count == 0 || count > 2 || rest.len() < count {
        return Err(invalid("unsupported DER length encoding"));
    }
    let (bytes, rest) = rest.split_at(count);
    let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
    if len < 0x80 {
        return Err(invalid("non-minimal DER length"));
    }
    Ok((len, rest))
}
