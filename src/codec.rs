//! Transport string codec
//!
//! A transport string is standard base64 over a byte payload. Exports written
//! by the automation tool start with the four ASCII bytes `SBAE` before the gzip
//! stream; older exports carry the gzip stream directly.
//!
//! Script payloads inside the tree are base64 of UTF-8 text. Some older
//! encoders wrote one byte per UTF-16 code unit instead, so decoding can fall
//! back to reading the bytes as Latin-1.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use thiserror::Error;

use crate::error::Result;

/// Marker prepended to the gzip stream
pub const MAGIC: &[u8; 4] = b"SBAE";

/// Encode window, a multiple of 3 so chunks never emit inner padding
const ENCODE_CHUNK: usize = 3 * 10_922;

/// Decode a base64 string to raw bytes
///
/// Surrounding whitespace and embedded line breaks are ignored, since pasted
/// transport strings are often wrapped.
pub fn decode_base64(input: &str) -> Result<Vec<u8>> {
    Ok(decode_raw(input)?)
}

fn decode_raw(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let trimmed = input.trim();
    if trimmed.contains(['\r', '\n']) {
        let joined: String = trimmed
            .chars()
            .filter(|&c| c != '\r' && c != '\n')
            .collect();
        STANDARD.decode(joined)
    } else {
        STANDARD.decode(trimmed)
    }
}

/// Encode bytes as base64, processing the input in bounded windows
pub fn encode_base64(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(ENCODE_CHUNK) {
        STANDARD.encode_string(chunk, &mut output);
    }
    output
}

/// Encode text as base64 of its UTF-8 bytes
pub fn utf8_safe_encode(text: &str) -> String {
    encode_base64(text.as_bytes())
}

/// Failure to decode a single script payload
///
/// Never fatal for a whole export: the slot is skipped.
#[derive(Debug, Error)]
pub enum ScriptDecodeError {
    /// Payload is not valid base64
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Payload bytes are not UTF-8 and the Latin-1 fallback is disabled
    #[error("payload is not UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// Decode base64 to UTF-8 text
pub fn utf8_safe_decode(input: &str) -> std::result::Result<String, ScriptDecodeError> {
    decode_script(input, false)
}

/// Decode a script payload, optionally falling back to Latin-1 when the
/// bytes are not UTF-8
pub fn decode_script(
    input: &str,
    legacy_fallback: bool,
) -> std::result::Result<String, ScriptDecodeError> {
    let bytes = decode_raw(input)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) if legacy_fallback => Ok(latin1_to_string(e.as_bytes())),
        Err(e) => Err(e.utf8_error().into()),
    }
}

/// Map each byte to the Unicode scalar with the same value
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Strip the magic marker if present, reporting whether it was found
pub fn strip_magic(bytes: &[u8]) -> (&[u8], bool) {
    match bytes.strip_prefix(MAGIC.as_slice()) {
        Some(rest) => (rest, true),
        None => (bytes, false),
    }
}

/// Prepend the magic marker to a gzip stream
pub fn with_magic(compressed: Vec<u8>) -> Vec<u8> {
    let mut output = Vec::with_capacity(MAGIC.len() + compressed.len());
    output.extend_from_slice(MAGIC);
    output.extend(compressed);
    output
}
