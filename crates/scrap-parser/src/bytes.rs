//! Bytes-literal payload decoding.
//!
//! The lexer carries the payload as text plus a base; the parser decodes
//! it here. Base 64 is the default, bases 16 and 32 follow RFC 4648 with
//! strict padding, and base 85 follows RFC 1924.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ParseError;

/// Decode a bytes-literal payload in the given base.
pub fn decode_bytes(value: &str, base: u32) -> Result<Vec<u8>, ParseError> {
    let payload = |message: String| ParseError::InvalidBytesPayload { base, message };
    match base {
        85 => b85_decode(value).map_err(payload),
        64 => STANDARD.decode(value).map_err(|e| payload(e.to_string())),
        32 => data_encoding::BASE32
            .decode(value.as_bytes())
            .map_err(|e| payload(e.to_string())),
        16 => data_encoding::HEXUPPER
            .decode(value.as_bytes())
            .map_err(|e| payload(e.to_string())),
        _ => Err(ParseError::UnknownBytesBase(base)),
    }
}

/// RFC 1924 base-85 alphabet, in value order.
const B85_ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Decode RFC 1924 base 85: groups of five characters become four bytes,
/// with a short final group padded by the highest-valued character.
fn b85_decode(input: &str) -> Result<Vec<u8>, String> {
    let mut table = [255u8; 256];
    for (value, byte) in B85_ALPHABET.iter().enumerate() {
        table[*byte as usize] = value as u8;
    }

    let bytes = input.as_bytes();
    if bytes.len() % 5 == 1 {
        return Err("base85 input has a trailing single character".to_string());
    }
    let mut out = Vec::with_capacity(bytes.len() / 5 * 4 + 4);
    for chunk in bytes.chunks(5) {
        let pad = 5 - chunk.len();
        let mut group: u64 = 0;
        for i in 0..5 {
            let byte = if i < chunk.len() { chunk[i] } else { b'~' };
            let value = table[byte as usize];
            if value == 255 {
                return Err(format!("invalid base85 character {:?}", byte as char));
            }
            group = group * 85 + value as u64;
        }
        if group > u32::MAX as u64 {
            return Err("base85 group out of range".to_string());
        }
        let quad = (group as u32).to_be_bytes();
        out.extend_from_slice(&quad[..4 - pad]);
    }
    Ok(out)
}
