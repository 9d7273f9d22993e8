//! Gzip adapter for the JSON payload

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Gzip the UTF-8 bytes of `text`
pub fn compress(text: &str, level: Compression) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), level);
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Inflate a gzip stream into UTF-8 text
pub fn decompress(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(Error::Decompress("empty payload".to_string()));
    }

    let mut decoder = GzDecoder::new(bytes);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| Error::Decompress(e.to_string()))?;

    String::from_utf8(inflated)
        .map_err(|e| Error::Decompress(format!("inflated data is not UTF-8: {}", e.utf8_error())))
}
