//! # AES-CBC Symmetric Keys
//!
//! Config shape:
//!
//! ```json
//! { "algorithm": "AES", "data": "<base64 key>", "iv": "<base64, 16 bytes>" }
//! ```
//!
//! Key length follows `data`: 16, 24 or 32 bytes select AES-128/192/256.
//! Generation honours an optional `size` (bytes, default 32).
//!
//! ## Padding
//!
//! Plaintext is padded with PKCS#7. Older clients padded with zero bytes and
//! stripped *every* trailing zero on decrypt, which silently ate any
//! plaintext that genuinely ended in `0x00`. PKCS#7 is length-tagged, so the
//! exact input comes back out, and a bad pad is reported as
//! [`KeyError::DecryptionError`] instead of being trimmed into garbage.
//!
//! ## The zero IV
//!
//! A config imported without `iv` gets sixteen zero bytes, written back into
//! the config so the key still round-trips. That is a compatibility
//! placeholder, not a secure default: reusing one IV under one key leaks
//! equal plaintext prefixes. Generated keys always get a random IV.

use std::fmt;
use std::sync::Arc;

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AES_BLOCK_SIZE, DEFAULT_AES_KEY_SIZE, FIELD_DATA, FIELD_IV, FIELD_SIZE};
use crate::crypto::encoding::{base64_decode, base64_encode};
use crate::crypto::keys::{KeyConfig, KeyError, SymmetricKey};
use crate::crypto::registry::SymmetricKeyFactory;

/// An AES key in CBC mode with a fixed IV.
pub struct AesKey {
    config: KeyConfig,
    algorithm: String,
    data: Vec<u8>,
    iv: [u8; AES_BLOCK_SIZE],
}

impl AesKey {
    /// Import a key from its config.
    pub fn from_config(config: &KeyConfig) -> Result<Self, KeyError> {
        let algorithm = config.algorithm()?.to_string();
        let data = decode_field(config, FIELD_DATA)?;
        check_key_length(data.len())?;

        let mut config = config.clone();
        let iv = match config.as_map().get(FIELD_IV) {
            Some(Value::String(_)) => {
                let bytes = decode_field(&config, FIELD_IV)?;
                <[u8; AES_BLOCK_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
                    KeyError::MalformedKeyMaterial(format!(
                        "iv must be {} bytes, got {}",
                        AES_BLOCK_SIZE,
                        bytes.len()
                    ))
                })?
            }
            Some(Value::Null) | None => {
                warn!("AES key imported without an iv; falling back to the all-zero IV");
                let iv = [0u8; AES_BLOCK_SIZE];
                config.set(FIELD_IV, base64_encode(&iv));
                iv
            }
            Some(_) => {
                return Err(KeyError::MalformedKeyMaterial(format!(
                    "field '{}' must be a string",
                    FIELD_IV
                )))
            }
        };

        Ok(Self {
            config,
            algorithm,
            data,
            iv,
        })
    }

    /// Generate a key with fresh random `data` and `iv`.
    ///
    /// Both are written into the returned key's config.
    pub fn generate(config: &KeyConfig) -> Result<Self, KeyError> {
        let size = config.get_usize(FIELD_SIZE)?.unwrap_or(DEFAULT_AES_KEY_SIZE);
        check_key_length(size)?;

        let mut data = vec![0u8; size];
        OsRng.fill_bytes(&mut data);
        let mut iv = [0u8; AES_BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);

        let config = config
            .clone()
            .with(FIELD_DATA, base64_encode(&data))
            .with(FIELD_IV, base64_encode(&iv));
        debug!(key_bytes = size, "generated AES key");
        Self::from_config(&config)
    }

    /// Key length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl SymmetricKey for AesKey {
    fn algorithm(&self) -> &str {
        &self.algorithm
    }

    fn to_config(&self) -> KeyConfig {
        self.config.clone()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeyError> {
        let invalid = |e: cbc::cipher::InvalidLength| KeyError::EncryptionFailed(e.to_string());
        let ciphertext = match self.data.len() {
            16 => cbc::Encryptor::<Aes128>::new_from_slices(&self.data, &self.iv)
                .map_err(invalid)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            24 => cbc::Encryptor::<Aes192>::new_from_slices(&self.data, &self.iv)
                .map_err(invalid)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            _ => cbc::Encryptor::<Aes256>::new_from_slices(&self.data, &self.iv)
                .map_err(invalid)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        };
        Ok(ciphertext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyError> {
        if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
            return Err(KeyError::DecryptionError);
        }
        let plaintext = match self.data.len() {
            16 => cbc::Decryptor::<Aes128>::new_from_slices(&self.data, &self.iv)
                .map_err(|_| KeyError::DecryptionError)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            24 => cbc::Decryptor::<Aes192>::new_from_slices(&self.data, &self.iv)
                .map_err(|_| KeyError::DecryptionError)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            _ => cbc::Decryptor::<Aes256>::new_from_slices(&self.data, &self.iv)
                .map_err(|_| KeyError::DecryptionError)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        plaintext.map_err(|_| KeyError::DecryptionError)
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AesKey(AES-{})", self.data.len() * 8)
    }
}

fn decode_field(config: &KeyConfig, field: &str) -> Result<Vec<u8>, KeyError> {
    let encoded = config.require_str(field)?;
    base64_decode(encoded)
        .map_err(|e| KeyError::MalformedKeyMaterial(format!("field '{}': {}", field, e)))
}

fn check_key_length(len: usize) -> Result<(), KeyError> {
    match len {
        16 | 24 | 32 => Ok(()),
        other => Err(KeyError::MalformedKeyMaterial(format!(
            "AES key must be 16, 24 or 32 bytes, got {}",
            other
        ))),
    }
}

/// Registry entry for AES.
pub struct AesKeyFactory;

impl SymmetricKeyFactory for AesKeyFactory {
    fn parse_key(&self, config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError> {
        Ok(Arc::new(AesKey::from_config(config)?))
    }

    fn generate_key(&self, config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError> {
        Ok(Arc::new(AesKey::generate(config)?))
    }
}
