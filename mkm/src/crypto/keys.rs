//! # Key Abstraction
//!
//! Three capability sets, one wire format:
//!
//! - [`SymmetricKey`]: encrypt/decrypt with a shared secret (AES).
//! - [`PublicKey`]: encrypt to, and verify signatures from, a key owner.
//! - [`PrivateKey`]: decrypt, sign, and hand out the matching public half.
//!
//! Every key travels as a [`KeyConfig`]: a JSON object whose `algorithm`
//! field picks the implementation and whose other fields are whatever that
//! implementation needs (`data`, `iv`, `keySizeInBits`, ...). The
//! [`KeyRegistry`](super::registry::KeyRegistry) turns a config into a typed
//! key; `to_config()` turns it back.
//!
//! Keys are immutable. They are handed around as `Arc<dyn Trait>`, so
//! "wrapping an existing key" is just cloning the `Arc`.
//!
//! ## Security considerations
//!
//! - Key bytes are never logged and never appear in `Debug` output.
//! - `verify` and `matches` return `false` on any malformed input. They are
//!   called with attacker-supplied bytes and must not be a way to crash us.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{FIELD_ALGORITHM, KEY_MATCH_PROMISE};
use crate::crypto::registry;

/// Errors that can occur while building or using keys.
///
/// Messages describe *which field* was wrong, never its contents.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed key material: {0}")]
    MalformedKeyMaterial(String),

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptionError,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("signing failed")]
    SigningFailed,

    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),
}

// ---------------------------------------------------------------------------
// KeyConfig
// ---------------------------------------------------------------------------

/// The serialized form of a key: a string-keyed JSON object.
///
/// Fields this crate doesn't understand are kept as-is, so a config that
/// passes through us comes out the other side unchanged.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyConfig(Map<String, Value>);

impl KeyConfig {
    /// A config carrying only an algorithm name. Enough for a generation
    /// request.
    pub fn new(algorithm: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(FIELD_ALGORITHM.to_string(), Value::String(algorithm.into()));
        Self(map)
    }

    /// Parse a config from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, KeyError> {
        serde_json::from_str(json).map_err(|e| KeyError::MalformedKeyMaterial(e.to_string()))
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// The `algorithm` field.
    pub fn algorithm(&self) -> Result<&str, KeyError> {
        self.require_str(FIELD_ALGORITHM)
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub(crate) fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// A string field, if present and actually a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// A string field that must be present.
    pub fn require_str(&self, field: &str) -> Result<&str, KeyError> {
        match self.0.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(KeyError::MalformedKeyMaterial(format!(
                "field '{}' must be a string",
                field
            ))),
            None => Err(KeyError::MalformedKeyMaterial(format!(
                "missing field '{}'",
                field
            ))),
        }
    }

    /// An optional non-negative integer field.
    ///
    /// Older clients wrote sizes as strings (`"keySizeInBits": "2048"`), so
    /// numeric strings are accepted too.
    pub fn get_usize(&self, field: &str) -> Result<Option<usize>, KeyError> {
        let invalid = || KeyError::MalformedKeyMaterial(format!("field '{}' must be an integer", field));
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .map(Some)
                .ok_or_else(invalid),
            Some(Value::String(s)) => s.trim().parse::<usize>().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    /// Whether a field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for KeyConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field names only. `data` may be a private key.
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        f.debug_struct("KeyConfig")
            .field("algorithm", &self.get_str(FIELD_ALGORITHM))
            .field("fields", &fields)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// A shared-secret key.
pub trait SymmetricKey: Send + Sync {
    /// The algorithm name this key was built under.
    fn algorithm(&self) -> &str;

    /// Serialized form, including every field filled in at generation time.
    fn to_config(&self) -> KeyConfig;

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Fails with [`KeyError::DecryptionError`] rather than returning
    /// damaged plaintext.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Whether `other` decrypts what `self` encrypts.
    fn matches(&self, other: &dyn SymmetricKey) -> bool {
        let Ok(ciphertext) = self.encrypt(KEY_MATCH_PROMISE) else {
            return false;
        };
        matches!(other.decrypt(&ciphertext), Ok(plaintext) if plaintext == KEY_MATCH_PROMISE)
    }
}

/// The shareable half of a key pair.
pub trait PublicKey: Send + Sync {
    fn algorithm(&self) -> &str;

    fn to_config(&self) -> KeyConfig;

    /// Canonical binary encoding of the key (DER for RSA). Two configs that
    /// spell the same key differently yield the same `data`.
    fn data(&self) -> &[u8];

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Returns `false` for any signature that doesn't check out, including
    /// ones that are the wrong length or otherwise garbage.
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;

    /// Whether `private_key` is the other half of this key.
    ///
    /// Signs a fixed plaintext and verifies it here, so no raw key bytes are
    /// compared.
    fn matches(&self, private_key: &dyn PrivateKey) -> bool {
        match private_key.sign(KEY_MATCH_PROMISE) {
            Ok(signature) => self.verify(KEY_MATCH_PROMISE, &signature),
            Err(_) => false,
        }
    }

    /// Whether `other` encodes the same key material.
    fn same_key(&self, other: &dyn PublicKey) -> bool {
        self.data() == other.data()
    }
}

/// The secret half of a key pair.
pub trait PrivateKey: Send + Sync {
    fn algorithm(&self) -> &str;

    fn to_config(&self) -> KeyConfig;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyError>;

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// The matching public key. Pure and deterministic.
    fn public_key(&self) -> Arc<dyn PublicKey>;

    /// Whether `other` belongs to the same key pair.
    fn matches(&self, other: &dyn PrivateKey) -> bool {
        self.public_key().matches(other)
    }
}

impl fmt::Debug for dyn SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({})", self.algorithm())
    }
}

impl fmt::Debug for dyn PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        let tail = &data[data.len().saturating_sub(8)..];
        write!(f, "PublicKey({}, ..{})", self.algorithm(), hex::encode(tail))
    }
}

impl fmt::Debug for dyn PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, pub={:?})", self.algorithm(), self.public_key())
    }
}

// ---------------------------------------------------------------------------
// Entry points against the shared registry
// ---------------------------------------------------------------------------
//
// The read guard covers only the factory lookup. Factories run unlocked.

/// Import a symmetric key from its config using the shared registry.
pub fn symmetric_key_from(config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError> {
    let factory = registry::shared().read().symmetric_factory(config)?;
    factory.parse_key(config)
}

/// Generate a fresh symmetric key using the shared registry.
///
/// `config` needs only an `algorithm`; the returned key's config carries the
/// generated `data` and `iv`.
pub fn generate_symmetric_key(config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError> {
    let factory = registry::shared().read().symmetric_factory(config)?;
    factory.generate_key(config)
}

/// Import a public key from its config using the shared registry.
pub fn public_key_from(config: &KeyConfig) -> Result<Arc<dyn PublicKey>, KeyError> {
    let factory = registry::shared().read().public_factory(config)?;
    factory.parse_key(config)
}

/// Import a private key from its config using the shared registry.
pub fn private_key_from(config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError> {
    let factory = registry::shared().read().private_factory(config)?;
    factory.parse_key(config)
}

/// Generate a fresh private key using the shared registry.
pub fn generate_private_key(config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError> {
    let factory = registry::shared().read().private_factory(config)?;
    factory.generate_key(config)
}
