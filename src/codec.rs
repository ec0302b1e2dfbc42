/// Token codec: gzip compression plus base64 text encoding
use crate::error::{DecodeStage, Result, ShareError};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use flate2::Compression as Level;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Byte-level compression primitive
pub trait Compression {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>>;
    /// Fails instead of producing more than `limit` bytes
    fn decompress(&self, bytes: &[u8], limit: usize) -> Result<Vec<u8>>;
}

/// gzip framing, compatible with the browser's `CompressionStream("gzip")`
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip;

impl Compression for Gzip {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Level::default());
        encoder
            .write_all(bytes)
            .map_err(|e| ShareError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| ShareError::Compression(e.to_string()))
    }

    fn decompress(&self, bytes: &[u8], limit: usize) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(bytes).take((limit as u64).saturating_add(1));
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| ShareError::malformed(DecodeStage::Inflate, e))?;
        if out.len() > limit {
            return Err(too_large(limit));
        }
        Ok(out)
    }
}

fn too_large(limit: usize) -> ShareError {
    ShareError::malformed(
        DecodeStage::Inflate,
        format!("payload too large (over {} bytes)", limit),
    )
}

const DECODE_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, DECODE_CONFIG);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, DECODE_CONFIG);

pub fn encode_text(bytes: &[u8], url_safe: bool) -> String {
    if url_safe {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    } else {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }
}

/// Decode base64 in either alphabet, with or without padding
pub fn decode_text(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let engine = if text.contains(['-', '_']) {
        &URL_SAFE_LENIENT
    } else {
        &STANDARD_LENIENT
    };
    engine
        .decode(text)
        .map_err(|e| ShareError::malformed(DecodeStage::Base64, e))
}

/// Compress, encode and prefix a JSON text
pub fn seal(
    json: &str,
    prefix: &str,
    url_safe: bool,
    compression: &dyn Compression,
) -> Result<String> {
    let compressed = compression.compress(json.as_bytes())?;
    log::debug!(
        "Share payload {} bytes, compressed to {} bytes",
        json.len(),
        compressed.len()
    );
    Ok(format!("{}{}", prefix, encode_text(&compressed, url_safe)))
}

/// Result of opening a token: the JSON text and whether it came from a legacy token
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedToken {
    pub json: String,
    pub legacy: bool,
}

/// Reverse of [`seal`]; unprefixed tokens are read as legacy base64-only JSON
///
/// `max_bytes` caps the JSON text, so a small token cannot expand into an
/// arbitrarily large payload.
pub fn open(
    token: &str,
    prefix: &str,
    compression: &dyn Compression,
    max_bytes: usize,
) -> Result<OpenedToken> {
    let (body, legacy) = match token.strip_prefix(prefix) {
        Some(body) => (body, false),
        None => (token, true),
    };

    let mut bytes = decode_text(body)?;
    if legacy {
        if bytes.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
    } else {
        bytes = compression.decompress(&bytes, max_bytes)?;
    }

    let json = String::from_utf8(bytes).map_err(|e| ShareError::malformed(DecodeStage::Utf8, e))?;
    Ok(OpenedToken { json, legacy })
}
