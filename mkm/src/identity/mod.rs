//! # Identity Module
//!
//! The identity stack is layered:
//!
//! 1. **Network**: The one-byte tag saying what kind of entity owns an
//!    address (user, group, station, ...).
//! 2. **Address**: `base58(network || hash160(fingerprint) || check_code)`.
//!    Checksummed, so a mistyped address is caught before anyone trusts it.
//! 3. **Meta**: Seed, public key, and the fingerprint binding them. The
//!    thing you hand someone so they can verify your addresses themselves.
//! 4. **Identifier**: `name@address[/terminal]`, what users actually see.
//!
//! ## Design Decisions
//!
//! - Derivation is defined for meta version 1 only. Other versions parse
//!   but never validate.
//! - A bad checksum or a bad fingerprint is a `valid == false` value, not an
//!   error. Hard errors are reserved for input that isn't structurally an
//!   address or identifier at all.
//! - Addresses and identifiers serialize as their canonical strings.

pub mod address;
pub mod identifier;
pub mod meta;
pub mod network;

pub use address::{Address, AddressError};
pub use identifier::{Identifier, IdentifierError};
pub use meta::{Meta, MetaError, MetaRecord};
pub use network::NetworkType;
