//! # RSA Key Pairs
//!
//! Signatures are PKCS#1 v1.5 over SHA-256 of the message; encryption is
//! PKCS#1 v1.5 padding.
//!
//! Config `data` is PEM text, with or without line breaks. Public keys are
//! accepted as SubjectPublicKeyInfo or bare PKCS#1 (older clients put a
//! PKCS#1 body under a `PUBLIC KEY` header); private keys as PKCS#1 or
//! PKCS#8. Generated private keys are written out as PKCS#1, their public
//! halves as SubjectPublicKeyInfo.
//!
//! The default modulus is 1024 bits for compatibility with existing
//! identities. Pass `keySizeInBits` (2048 or more) for anything new.

use std::fmt;
use std::sync::Arc;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use sha2::Sha256;
use tracing::debug;

use crate::config::{
    ALGORITHM_RSA, DEFAULT_RSA_KEY_BITS, FIELD_DATA, FIELD_DIGEST, FIELD_KEY_SIZE_IN_BITS,
    FIELD_MODE, FIELD_PADDING, RSA_DIGEST_SHA256, RSA_MODE_ECB, RSA_PADDING_PKCS1,
};
use crate::crypto::encoding::base64_decode;
use crate::crypto::hash::sha256;
use crate::crypto::keys::{KeyConfig, KeyError, PrivateKey, PublicKey};
use crate::crypto::registry::{PrivateKeyFactory, PublicKeyFactory};

/// An RSA public key.
pub struct RsaPublicKey {
    config: KeyConfig,
    algorithm: String,
    inner: rsa::RsaPublicKey,
    der: Vec<u8>,
}

impl RsaPublicKey {
    /// Import from a config whose `data` is PEM.
    pub fn from_config(config: &KeyConfig) -> Result<Self, KeyError> {
        let der = pem_body(config.require_str(FIELD_DATA)?)?;
        let inner = rsa::RsaPublicKey::from_public_key_der(&der)
            .or_else(|_| rsa::RsaPublicKey::from_pkcs1_der(&der))
            .map_err(|_| {
                KeyError::MalformedKeyMaterial("data is not an RSA public key".to_string())
            })?;
        Self::new(config.clone(), inner)
    }

    fn new(config: KeyConfig, inner: rsa::RsaPublicKey) -> Result<Self, KeyError> {
        let algorithm = config.algorithm()?.to_string();
        let der = inner
            .to_public_key_der()
            .map_err(|e| KeyError::MalformedKeyMaterial(e.to_string()))?
            .as_bytes()
            .to_vec();
        Ok(Self {
            config,
            algorithm,
            inner,
            der,
        })
    }

    /// Modulus length in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }
}

impl PublicKey for RsaPublicKey {
    fn algorithm(&self) -> &str {
        &self.algorithm
    }

    fn to_config(&self) -> KeyConfig {
        self.config.clone()
    }

    fn data(&self) -> &[u8] {
        &self.der
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.inner
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| KeyError::EncryptionFailed(e.to_string()))
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let digest = sha256(data);
        self.inner
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .is_ok()
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = &self.der[self.der.len().saturating_sub(8)..];
        write!(f, "RsaPublicKey({} bits, ..{})", self.bits(), hex::encode(tail))
    }
}

/// An RSA private key, carrying its public half.
pub struct RsaPrivateKey {
    config: KeyConfig,
    algorithm: String,
    inner: rsa::RsaPrivateKey,
    public: Arc<RsaPublicKey>,
}

impl RsaPrivateKey {
    /// Import from a config whose `data` is PEM.
    pub fn from_config(config: &KeyConfig) -> Result<Self, KeyError> {
        let der = pem_body(config.require_str(FIELD_DATA)?)?;
        let inner = rsa::RsaPrivateKey::from_pkcs1_der(&der)
            .or_else(|_| rsa::RsaPrivateKey::from_pkcs8_der(&der))
            .map_err(|_| {
                KeyError::MalformedKeyMaterial("data is not an RSA private key".to_string())
            })?;
        Self::new(config.clone(), inner)
    }

    /// Generate a fresh key pair.
    ///
    /// Honours `keySizeInBits`, defaulting to 1024.
    pub fn generate(config: &KeyConfig) -> Result<Self, KeyError> {
        let bits = config
            .get_usize(FIELD_KEY_SIZE_IN_BITS)?
            .unwrap_or(DEFAULT_RSA_KEY_BITS);
        let inner = rsa::RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| KeyError::KeyGenerationFailed(e.to_string()))?;
        let pem = inner
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::KeyGenerationFailed(e.to_string()))?;
        let config = with_scheme(config.clone()).with(FIELD_DATA, pem.as_str());
        debug!(bits, "generated RSA key pair");
        Self::new(config, inner)
    }

    fn new(config: KeyConfig, inner: rsa::RsaPrivateKey) -> Result<Self, KeyError> {
        let algorithm = config.algorithm()?.to_string();
        let public_inner = inner.to_public_key();
        let public_pem = public_inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::MalformedKeyMaterial(e.to_string()))?;
        let public_config =
            with_scheme(KeyConfig::new(ALGORITHM_RSA)).with(FIELD_DATA, public_pem);
        let public = Arc::new(RsaPublicKey::new(public_config, public_inner)?);
        Ok(Self {
            config,
            algorithm,
            inner,
            public,
        })
    }

    /// Modulus length in bits.
    pub fn bits(&self) -> usize {
        self.public.bits()
    }
}

impl PrivateKey for RsaPrivateKey {
    fn algorithm(&self) -> &str {
        &self.algorithm
    }

    fn to_config(&self) -> KeyConfig {
        self.config.clone()
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.inner
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map_err(|_| KeyError::DecryptionError)
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let digest = sha256(data);
        self.inner
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|_| KeyError::SigningFailed)
    }

    fn public_key(&self) -> Arc<dyn PublicKey> {
        self.public.clone()
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPrivateKey(pub={:?})", self.public)
    }
}

/// Label a config with the padding and digest this module signs with.
fn with_scheme(config: KeyConfig) -> KeyConfig {
    config
        .with(FIELD_MODE, RSA_MODE_ECB)
        .with(FIELD_PADDING, RSA_PADDING_PKCS1)
        .with(FIELD_DIGEST, RSA_DIGEST_SHA256)
}

/// Strip PEM armour and decode the base64 body.
///
/// Text without a `-----BEGIN ` header is taken as bare base64.
fn pem_body(pem: &str) -> Result<Vec<u8>, KeyError> {
    let mut body = pem;
    if let Some(begin) = body.find("-----BEGIN ") {
        let rest = &body[begin + "-----BEGIN ".len()..];
        let header_end = rest.find("-----").ok_or_else(|| {
            KeyError::MalformedKeyMaterial("unterminated PEM header".to_string())
        })?;
        body = &rest[header_end + "-----".len()..];
    }
    if let Some(end) = body.find("-----END ") {
        body = &body[..end];
    }
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    base64_decode(&compact)
        .map_err(|e| KeyError::MalformedKeyMaterial(format!("field '{}': {}", FIELD_DATA, e)))
}

/// Registry entry for RSA, serving both halves of the pair.
pub struct RsaKeyFactory;

impl PublicKeyFactory for RsaKeyFactory {
    fn parse_key(&self, config: &KeyConfig) -> Result<Arc<dyn PublicKey>, KeyError> {
        Ok(Arc::new(RsaPublicKey::from_config(config)?))
    }
}

impl PrivateKeyFactory for RsaKeyFactory {
    fn parse_key(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError> {
        Ok(Arc::new(RsaPrivateKey::from_config(config)?))
    }

    fn generate_key(&self, config: &KeyConfig) -> Result<Arc<dyn PrivateKey>, KeyError> {
        Ok(Arc::new(RsaPrivateKey::generate(config)?))
    }
}
