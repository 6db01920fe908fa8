//! # Algorithm Registry
//!
//! Maps algorithm names to factories. A config's `algorithm` field is looked
//! up exactly once, at construction; after that callers hold a typed key and
//! never dispatch on strings again.
//!
//! There are two ways to use it:
//!
//! - Own a [`KeyRegistry`] and pass it around. Cheapest, most explicit, and
//!   the right call for libraries that want to restrict algorithms.
//! - Use the process-wide instance from [`shared`], which starts with the
//!   built-in algorithms. Registering into it takes a write lock and is meant
//!   to happen once at startup, before the lookups start.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::config::{
    ALGORITHM_AES, ALGORITHM_AES_CBC, ALGORITHM_RSA, ALGORITHM_RSA_ECB, ALGORITHM_SHA256_WITH_RSA,
};
use crate::crypto::aes::AesKeyFactory;
use crate::crypto::keys::{KeyConfig, KeyError, PrivateKey, PublicKey, SymmetricKey};
use crate::crypto::rsa::RsaKeyFactory;

/// Builds symmetric keys for one algorithm.
pub trait SymmetricKeyFactory: Send + Sync {
    /// Import a key from existing material.
    fn parse_key(&self, config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError>;

    /// Create a key from fresh CSPRNG output.
    fn generate_key(&self, config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError>;
}

/// Builds public keys for one algorithm.
pub trait PublicKeyFactory: Send + Sync {
    fn parse_key(&self, config: &KeyConfig) -> Result<Arc<dyn PublicKey>, KeyError>;
}

/// Builds private keys for one algorithm.
pub trait PrivateKeyFactory: Send + Sync {
    fn parse_key(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError>;

    fn generate_key(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError>;
}

/// Name → factory tables for the three key kinds.
#[derive(Clone, Default)]
pub struct KeyRegistry {
    symmetric: HashMap<String, Arc<dyn SymmetricKeyFactory>>,
    public: HashMap<String, Arc<dyn PublicKeyFactory>>,
    private: HashMap<String, Arc<dyn PrivateKeyFactory>>,
}

impl KeyRegistry {
    /// A registry with no algorithms at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with AES and RSA under their canonical names and the
    /// aliases older clients write into configs.
    pub fn with_builtin_algorithms() -> Self {
        let mut registry = Self::empty();

        let aes = Arc::new(AesKeyFactory);
        for name in [ALGORITHM_AES, ALGORITHM_AES_CBC] {
            registry.register_symmetric(name, aes.clone());
        }

        let rsa = Arc::new(RsaKeyFactory);
        for name in [ALGORITHM_RSA, ALGORITHM_SHA256_WITH_RSA, ALGORITHM_RSA_ECB] {
            registry.register_public(name, rsa.clone());
            registry.register_private(name, rsa.clone());
        }

        registry
    }

    /// Register (or replace) a symmetric algorithm.
    pub fn register_symmetric(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn SymmetricKeyFactory>,
    ) {
        let name = name.into();
        debug!(algorithm = %name, "registering symmetric key factory");
        self.symmetric.insert(name, factory);
    }

    /// Register (or replace) a public-key algorithm.
    pub fn register_public(&mut self, name: impl Into<String>, factory: Arc<dyn PublicKeyFactory>) {
        let name = name.into();
        debug!(algorithm = %name, "registering public key factory");
        self.public.insert(name, factory);
    }

    /// Register (or replace) a private-key algorithm.
    pub fn register_private(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn PrivateKeyFactory>,
    ) {
        let name = name.into();
        debug!(algorithm = %name, "registering private key factory");
        self.private.insert(name, factory);
    }

    pub fn supports_symmetric(&self, name: &str) -> bool {
        self.symmetric.contains_key(name)
    }

    pub fn supports_asymmetric(&self, name: &str) -> bool {
        self.public.contains_key(name) && self.private.contains_key(name)
    }

    /// The factory `config`'s algorithm resolves to, detached from the table.
    pub fn symmetric_factory(
        &self,
        config: &KeyConfig,
    ) -> Result<Arc<dyn SymmetricKeyFactory>, KeyError> {
        lookup(&self.symmetric, config).cloned()
    }

    pub fn public_factory(&self, config: &KeyConfig) -> Result<Arc<dyn PublicKeyFactory>, KeyError> {
        lookup(&self.public, config).cloned()
    }

    pub fn private_factory(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKeyFactory>, KeyError> {
        lookup(&self.private, config).cloned()
    }

    pub fn symmetric_key_from(&self, config: &KeyConfig) -> Result<Arc<dyn SymmetricKey>, KeyError> {
        lookup(&self.symmetric, config)?.parse_key(config)
    }

    pub fn generate_symmetric_key(
        &self,
        config: &KeyConfig,
    ) -> Result<Arc<dyn SymmetricKey>, KeyError> {
        lookup(&self.symmetric, config)?.generate_key(config)
    }

    pub fn public_key_from(&self, config: &KeyConfig) -> Result<Arc<dyn PublicKey>, KeyError> {
        lookup(&self.public, config)?.parse_key(config)
    }

    pub fn private_key_from(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError> {
        lookup(&self.private, config)?.parse_key(config)
    }

    pub fn generate_private_key(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError> {
        lookup(&self.private, config)?.generate_key(config)
    }
}

fn lookup<'a, F: ?Sized>(
    table: &'a HashMap<String, Arc<F>>,
    config: &KeyConfig,
) -> Result<&'a Arc<F>, KeyError> {
    let algorithm = config.algorithm()?;
    table
        .get(algorithm)
        .ok_or_else(|| KeyError::UnsupportedAlgorithm(algorithm.to_string()))
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut symmetric: Vec<&String> = self.symmetric.keys().collect();
        let mut public: Vec<&String> = self.public.keys().collect();
        let mut private: Vec<&String> = self.private.keys().collect();
        symmetric.sort();
        public.sort();
        private.sort();
        f.debug_struct("KeyRegistry")
            .field("symmetric", &symmetric)
            .field("public", &public)
            .field("private", &private)
            .finish()
    }
}

static SHARED: OnceLock<RwLock<KeyRegistry>> = OnceLock::new();

/// The process-wide registry, built with the built-in algorithms on first
/// use.
pub fn shared() -> &'static RwLock<KeyRegistry> {
    SHARED.get_or_init(|| RwLock::new(KeyRegistry::with_builtin_algorithms()))
}
