//! # Cryptographic Building Blocks
//!
//! Everything the identity layer needs from cryptography, and nothing more:
//!
//! - **hash**: SHA-256, double SHA-256, RIPEMD-160 and the address check
//!   code built from them.
//! - **encoding**: Base58 (addresses) and Base64 (key material, fingerprints).
//! - **keys**: The polymorphic key traits and the `KeyConfig` wire mapping.
//! - **aes** / **rsa**: The built-in algorithm implementations.
//! - **registry**: Name → factory tables that pick an implementation from a
//!   config's `algorithm` field.
//!
//! None of the primitives are implemented here. RustCrypto does the math;
//! this module only decides which math to call and how to label the bytes.

pub mod aes;
pub mod encoding;
pub mod hash;
pub mod keys;
pub mod registry;
pub mod rsa;

pub use encoding::{base58_decode, base58_encode, base64_decode, base64_encode, EncodingError};
pub use hash::{check_code, double_sha256, hash160, ripemd160, sha256};
pub use keys::{
    generate_private_key, generate_symmetric_key, private_key_from, public_key_from,
    symmetric_key_from, KeyConfig, KeyError, PrivateKey, PublicKey, SymmetricKey,
};
