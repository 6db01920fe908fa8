//! # Meta: the Seed/Key Binding
//!
//! A Meta ties a human-chosen seed to a public key with a signature:
//!
//! ```text
//! fingerprint = sign(utf8(seed), SK)
//! ```
//!
//! Anyone holding the Meta can check the signature and re-derive the
//! entity's addresses from the fingerprint, which is what makes an
//! identifier self-certifying.
//!
//! There are two ways to get one:
//!
//! - **Verification** ([`Meta::new`], [`Meta::from_record`]): the fingerprint
//!   comes from outside and is checked. A bad signature does not fail
//!   construction; it produces a Meta with `is_valid() == false`, which
//!   refuses to derive anything and matches nothing.
//! - **Generation** ([`Meta::generate`]): we hold the private key, so we sign
//!   the seed ourselves and the result is valid by construction.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::META_VERSION_MKM;
use crate::crypto::encoding::{base64_decode, base64_encode};
use crate::crypto::keys::{self, KeyConfig, KeyError, PrivateKey, PublicKey};
use crate::crypto::registry::KeyRegistry;
use crate::identity::address::{Address, AddressError};
use crate::identity::identifier::{Identifier, IdentifierError};
use crate::identity::network::NetworkType;

/// Errors from building or using a [`Meta`].
#[derive(Debug, Error)]
pub enum MetaError {
    /// The fingerprint didn't verify, so nothing may be derived from it.
    #[error("meta is not valid: fingerprint does not verify against seed and key")]
    InvalidMeta,

    #[error("unsupported meta version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed meta record: {0}")]
    MalformedRecord(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("meta serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Wire form of a [`Meta`].
///
/// ```json
/// { "version": 1, "seed": "moki", "key": { "algorithm": "RSA", ... },
///   "fingerprint": "<base64 signature>" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub version: u8,
    pub seed: String,
    pub key: KeyConfig,
    pub fingerprint: String,
}

/// A verified (or knowingly unverified) seed/key binding. Immutable.
#[derive(Clone)]
pub struct Meta {
    version: u8,
    seed: String,
    key: Arc<dyn PublicKey>,
    fingerprint: Vec<u8>,
    valid: bool,
}

impl Meta {
    /// Wrap a supplied fingerprint and verify it.
    ///
    /// Never fails. The result is valid only for version 1 with a
    /// fingerprint that verifies over `seed` under `key`.
    pub fn new(
        version: u8,
        seed: impl Into<String>,
        key: Arc<dyn PublicKey>,
        fingerprint: Vec<u8>,
    ) -> Self {
        let seed = seed.into();
        let valid = version == META_VERSION_MKM && key.verify(seed.as_bytes(), &fingerprint);
        if !valid {
            warn!(seed = %seed, version, "meta fingerprint does not verify");
        }
        Self {
            version,
            seed,
            key,
            fingerprint,
            valid,
        }
    }

    /// Sign `seed` with `private_key` and build a valid Meta around it.
    pub fn generate(
        version: u8,
        seed: impl Into<String>,
        private_key: &dyn PrivateKey,
    ) -> Result<Self, MetaError> {
        if version != META_VERSION_MKM {
            return Err(MetaError::UnsupportedVersion(version));
        }
        let seed = seed.into();
        let fingerprint = private_key.sign(seed.as_bytes())?;
        Ok(Self {
            version,
            seed,
            key: private_key.public_key(),
            fingerprint,
            valid: true,
        })
    }

    /// Rebuild from the wire form, resolving the key through `registry`.
    ///
    /// Errors only on structural problems (unknown algorithm, bad key
    /// material, fingerprint that isn't Base64). Signature trouble yields an
    /// invalid Meta instead.
    pub fn from_record(record: &MetaRecord, registry: &KeyRegistry) -> Result<Self, MetaError> {
        let key = registry.public_key_from(&record.key)?;
        Self::from_record_with_key(record, key)
    }

    /// Parse a JSON record using the shared registry.
    pub fn from_json(json: &str) -> Result<Self, MetaError> {
        let record: MetaRecord = serde_json::from_str(json)?;
        let key = keys::public_key_from(&record.key)?;
        Self::from_record_with_key(&record, key)
    }

    fn from_record_with_key(
        record: &MetaRecord,
        key: Arc<dyn PublicKey>,
    ) -> Result<Self, MetaError> {
        let fingerprint = base64_decode(&record.fingerprint)
            .map_err(|e| MetaError::MalformedRecord(format!("fingerprint: {}", e)))?;
        Ok(Self::new(record.version, record.seed.clone(), key, fingerprint))
    }

    pub fn to_record(&self) -> MetaRecord {
        MetaRecord {
            version: self.version,
            seed: self.seed.clone(),
            key: self.key.to_config(),
            fingerprint: base64_encode(&self.fingerprint),
        }
    }

    pub fn to_json(&self) -> Result<String, MetaError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn key(&self) -> &Arc<dyn PublicKey> {
        &self.key
    }

    pub fn fingerprint(&self) -> &[u8] {
        &self.fingerprint
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The address this Meta owns on `network`.
    pub fn derive_address(&self, network: NetworkType) -> Result<Address, MetaError> {
        if !self.valid {
            return Err(MetaError::InvalidMeta);
        }
        Ok(Address::derive(&self.fingerprint, network, self.version)?)
    }

    /// `seed@address` on `network`.
    pub fn derive_identifier(&self, network: NetworkType) -> Result<Identifier, MetaError> {
        let address = self.derive_address(network)?;
        Ok(Identifier::new(self.seed.clone(), address)?)
    }

    /// Whether `address` is this Meta's address on the address's own
    /// network.
    pub fn match_address(&self, address: &Address) -> bool {
        if !self.valid || address.is_broadcast() {
            return false;
        }
        match Address::derive(&self.fingerprint, address.network(), self.version) {
            Ok(derived) => derived == *address,
            Err(_) => false,
        }
    }

    /// Whether `id` names this Meta's seed at one of its addresses.
    /// The terminal is ignored.
    pub fn match_identifier(&self, id: &Identifier) -> bool {
        id.name() == self.seed && self.match_address(id.address())
    }

    /// Whether `key` is this Meta's key, or at least one that verifies the
    /// fingerprint.
    pub fn match_public_key(&self, key: &dyn PublicKey) -> bool {
        if !self.valid {
            return false;
        }
        self.key.same_key(key) || key.verify(self.seed.as_bytes(), &self.fingerprint)
    }
}

/// Two Metas are equal when both are valid and derive the same main-net
/// identifier.
impl PartialEq for Meta {
    fn eq(&self, other: &Self) -> bool {
        match (
            self.derive_identifier(NetworkType::MAIN),
            other.derive_identifier(NetworkType::MAIN),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meta")
            .field("version", &self.version)
            .field("seed", &self.seed)
            .field("key", &self.key)
            .field("valid", &self.valid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{
        hulk_public_key_config, moki_private_key_config, moki_public_key_config, HULK_FINGERPRINT,
        MOKI_ADDRESS, MOKI_FINGERPRINT, MOKI_ID,
    };

    fn registry() -> KeyRegistry {
        KeyRegistry::with_builtin_algorithms()
    }

    fn moki_record() -> MetaRecord {
        MetaRecord {
            version: 1,
            seed: "moki".to_string(),
            key: moki_public_key_config(),
            fingerprint: MOKI_FINGERPRINT.to_string(),
        }
    }

    fn moki_meta() -> Meta {
        Meta::from_record(&moki_record(), &registry()).unwrap()
    }

    fn fresh_meta(seed: &str) -> Meta {
        let sk = registry()
            .generate_private_key(&KeyConfig::new("RSA").with("keySizeInBits", 512))
            .unwrap();
        Meta::generate(1, seed, sk.as_ref()).unwrap()
    }

    #[test]
    fn moki_record_verifies_and_matches() {
        let meta = moki_meta();
        assert!(meta.is_valid());
        assert!(meta.match_identifier(&Identifier::parse(MOKI_ID).unwrap()));
        assert_eq!(
            meta.derive_address(NetworkType::MAIN).unwrap().as_str(),
            MOKI_ADDRESS
        );
        assert_eq!(
            meta.derive_identifier(NetworkType::MAIN).unwrap().to_string(),
            MOKI_ID
        );
    }

    #[test]
    fn generation_reproduces_moki_fingerprint() {
        let sk = registry().private_key_from(&moki_private_key_config()).unwrap();
        let meta = Meta::generate(1, "moki", sk.as_ref()).unwrap();
        assert!(meta.is_valid());
        assert_eq!(meta.to_record().fingerprint, MOKI_FINGERPRINT);
        assert_eq!(meta, moki_meta());
    }

    #[test]
    fn wrong_seed_is_invalid_not_an_error() {
        let mut record = moki_record();
        record.seed = "hulk".to_string();
        let meta = Meta::from_record(&record, &registry()).unwrap();
        assert!(!meta.is_valid());
        assert!(matches!(
            meta.derive_address(NetworkType::MAIN),
            Err(MetaError::InvalidMeta)
        ));
        assert!(matches!(
            meta.derive_identifier(NetworkType::MAIN),
            Err(MetaError::InvalidMeta)
        ));
        assert!(!meta.match_address(&Address::parse(MOKI_ADDRESS).unwrap()));
    }

    #[test]
    fn foreign_fingerprint_is_invalid() {
        let mut record = moki_record();
        record.fingerprint = HULK_FINGERPRINT.to_string();
        assert!(!Meta::from_record(&record, &registry()).unwrap().is_valid());
    }

    #[test]
    fn unknown_version_is_invalid() {
        let mut record = moki_record();
        record.version = 2;
        let meta = Meta::from_record(&record, &registry()).unwrap();
        assert!(!meta.is_valid());
    }

    #[test]
    fn generate_rejects_unknown_version() {
        let sk = registry().private_key_from(&moki_private_key_config()).unwrap();
        assert!(matches!(
            Meta::generate(3, "moki", sk.as_ref()),
            Err(MetaError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn malformed_fingerprint_is_an_error() {
        let mut record = moki_record();
        record.fingerprint = "!!not base64!!".to_string();
        assert!(matches!(
            Meta::from_record(&record, &registry()),
            Err(MetaError::MalformedRecord(_))
        ));
    }

    #[test]
    fn unknown_key_algorithm_is_an_error() {
        let mut record = moki_record();
        record.key = KeyConfig::new("ECC").with("data", "x");
        assert!(matches!(
            Meta::from_record(&record, &registry()),
            Err(MetaError::Key(KeyError::UnsupportedAlgorithm(_)))
        ));
    }

    #[test]
    fn generated_meta_matches_its_own_identifiers() {
        let meta = fresh_meta("alice");
        for network in NetworkType::KNOWN {
            let id = meta.derive_identifier(network).unwrap();
            assert!(meta.match_identifier(&id), "network {}", network);
            assert_eq!(id.network(), network);
        }
    }

    #[test]
    fn match_identifier_checks_the_name() {
        let meta = moki_meta();
        let address = Address::parse(MOKI_ADDRESS).unwrap();
        let impostor = Identifier::new("hulk", address).unwrap();
        assert!(!meta.match_identifier(&impostor));
    }

    #[test]
    fn terminal_does_not_affect_matching() {
        let meta = moki_meta();
        let id = Identifier::parse(MOKI_ID)
            .unwrap()
            .with_terminal("laptop")
            .unwrap();
        assert!(meta.match_identifier(&id));
    }

    #[test]
    fn match_public_key() {
        let meta = moki_meta();
        let moki = registry().public_key_from(&moki_public_key_config()).unwrap();
        let hulk = registry().public_key_from(&hulk_public_key_config()).unwrap();
        assert!(meta.match_public_key(moki.as_ref()));
        assert!(!meta.match_public_key(hulk.as_ref()));
    }

    #[test]
    fn broadcast_addresses_never_match() {
        let meta = moki_meta();
        assert!(!meta.match_address(&Address::anywhere()));
        assert!(!meta.match_identifier(&Identifier::anyone()));
    }

    #[test]
    fn distinct_metas_are_not_equal() {
        assert_ne!(fresh_meta("alice"), fresh_meta("alice"));
        let mut record = moki_record();
        record.seed = "hulk".to_string();
        let invalid = Meta::from_record(&record, &registry()).unwrap();
        assert_ne!(invalid.clone(), invalid);
    }

    #[test]
    fn json_roundtrip() {
        let meta = moki_meta();
        let json = meta.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["seed"], "moki");
        assert_eq!(value["key"]["algorithm"], "RSA");
        assert_eq!(value["fingerprint"], MOKI_FINGERPRINT);

        let back = Meta::from_json(&json).unwrap();
        assert!(back.is_valid());
        assert_eq!(back, meta);
        assert_eq!(back.to_record(), meta.to_record());
    }

    #[test]
    fn garbage_json_is_a_serialization_error() {
        assert!(matches!(
            Meta::from_json("{\"seed\": 1}"),
            Err(MetaError::Serialization(_))
        ));
    }
}
