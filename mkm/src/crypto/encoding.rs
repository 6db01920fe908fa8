//! # Text Encodings
//!
//! - **Base58** (Bitcoin alphabet) for addresses. No `0`, `O`, `I` or `l`,
//!   no padding, nothing a human can confuse when reading one out loud.
//! - **Base64** (standard alphabet, padded) for key bytes, IVs and
//!   fingerprints inside JSON configs and meta records.
//!
//! Decoding failures are hard errors. Whether the *decoded* bytes mean
//! anything is the caller's problem.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Errors from decoding text into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("invalid base58 string: {0}")]
    InvalidBase58(String),

    #[error("invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Encode bytes with the Bitcoin Base58 alphabet.
pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Decode a Base58 string. Fails on characters outside the alphabet.
pub fn base58_decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| EncodingError::InvalidBase58(e.to_string()))
}

/// Encode bytes as standard padded Base64.
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard padded Base64.
pub fn base64_decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    STANDARD
        .decode(s)
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}
