// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MKM: Self-Certifying Identity Core
//!
//! An identifier that proves itself. Every MKM identity is derived from a
//! signature over a human-chosen name, so anyone holding the public key can
//! recompute the address and check it without asking a registry.
//!
//! The derivation chain, end to end:
//!
//! ```text
//! fingerprint = sign(seed, SK)
//! digest      = ripemd160(sha256(fingerprint))
//! check_code  = sha256(sha256(network || digest))[..4]
//! address     = base58(network || digest || check_code)
//! identifier  = seed "@" address ["/" terminal]
//! ```
//!
//! ## Architecture
//!
//! - **crypto**: Hashing, Base58/Base64 codecs, and the pluggable key layer
//!   (AES symmetric keys, RSA key pairs, and the algorithm registry that maps
//!   names like `"RSA"` to concrete implementations).
//! - **identity**: Network tags, addresses, the Meta binding record, and
//!   the `name@address/terminal` identifier.
//! - **config**: Every constant the derivation depends on.
//! - **logging**: Optional `tracing` subscriber setup for host applications.
//!
//! ## Design Philosophy
//!
//! 1. Derivation is bit-exact. Change a byte here and every address ever
//!    issued stops verifying.
//! 2. Parsing can fail hard; verification never does. A forged signature is
//!    a `false`, not an error.
//! 3. Values are immutable. Once a Meta or Address exists, it is what it is.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod logging;

#[cfg(test)]
mod test_fixtures;

pub use crypto::keys::{KeyConfig, KeyError, PrivateKey, PublicKey, SymmetricKey};
pub use crypto::registry::KeyRegistry;
pub use identity::{
    Address, AddressError, Identifier, IdentifierError, Meta, MetaError, MetaRecord, NetworkType,
};
