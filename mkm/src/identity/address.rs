//! # Addresses
//!
//! An address is the Base58 form of 25 bytes:
//!
//! ```text
//! network (1) || ripemd160(sha256(fingerprint)) (20) || check_code (4)
//! check_code = sha256(sha256(network || digest))[..4]
//! ```
//!
//! Parsing is split into two kinds of failure. A string that isn't Base58,
//! or doesn't decode to 25 bytes, is not an address at all and is an error.
//! A string with the right shape but a wrong check code *is* an address, just
//! not a valid one; it parses with [`Address::is_valid`] returning `false` so
//! callers can show it, log it, and refuse it on their own terms.
//!
//! Two reserved words, `anywhere` and `everywhere`, stand for broadcast
//! addresses and bypass Base58 entirely.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{
    ADDRESS_PAYLOAD_LENGTH, ANYWHERE, BROADCAST_NUMBER, CHECK_CODE_LENGTH, DIGEST_LENGTH,
    EVERYWHERE, META_VERSION_MKM, NETWORK_LENGTH,
};
use crate::crypto::encoding::{base58_decode, base58_encode, EncodingError};
use crate::crypto::hash::{check_code, hash160};
use crate::identity::network::NetworkType;

/// Errors from building or parsing an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Not Base58.
    #[error("address encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Decodes, but to the wrong number of bytes.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Always 25.
        expected: usize,
        /// What the string actually decoded to.
        got: usize,
    },

    /// Only meta version 1 has a defined derivation.
    #[error("unsupported meta version for address derivation: {0}")]
    UnsupportedVersion(u8),
}

/// A network-tagged, checksummed address.
///
/// Equality and hashing use the encoded string.
#[derive(Clone)]
pub struct Address {
    encoded: String,
    network: NetworkType,
    check_code: [u8; CHECK_CODE_LENGTH],
    valid: bool,
}

impl Address {
    /// Derive the address for `fingerprint` on `network`.
    ///
    /// The result is always valid. Fails only for a `version` with no
    /// derivation rule.
    pub fn derive(
        fingerprint: &[u8],
        network: NetworkType,
        version: u8,
    ) -> Result<Self, AddressError> {
        if version != META_VERSION_MKM {
            return Err(AddressError::UnsupportedVersion(version));
        }

        let digest = hash160(fingerprint);
        let mut payload = Vec::with_capacity(ADDRESS_PAYLOAD_LENGTH);
        payload.push(network.as_byte());
        payload.extend_from_slice(&digest);
        let code = check_code(&payload);
        payload.extend_from_slice(&code);

        Ok(Self {
            encoded: base58_encode(&payload),
            network,
            check_code: code,
            valid: true,
        })
    }

    /// Parse an address string.
    ///
    /// Broadcast words match case-insensitively. Everything else must be
    /// Base58 decoding to exactly 25 bytes; a bad check code yields an
    /// address with `is_valid() == false`, not an error.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.eq_ignore_ascii_case(ANYWHERE) {
            return Ok(Self::anywhere());
        }
        if s.eq_ignore_ascii_case(EVERYWHERE) {
            return Ok(Self::everywhere());
        }

        let payload = base58_decode(s)?;
        if payload.len() != ADDRESS_PAYLOAD_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_PAYLOAD_LENGTH,
                got: payload.len(),
            });
        }

        let split = NETWORK_LENGTH + DIGEST_LENGTH;
        let (body, tail) = payload.split_at(split);
        let mut stored = [0u8; CHECK_CODE_LENGTH];
        stored.copy_from_slice(tail);
        let valid = check_code(body) == stored;
        if !valid {
            debug!(address = %s, "address check code mismatch");
        }

        Ok(Self {
            encoded: s.to_string(),
            network: NetworkType::from_byte(payload[0]),
            check_code: stored,
            valid,
        })
    }

    /// The broadcast address for users.
    pub fn anywhere() -> Self {
        Self::broadcast(ANYWHERE, NetworkType::MAIN)
    }

    /// The broadcast address for groups.
    pub fn everywhere() -> Self {
        Self::broadcast(EVERYWHERE, NetworkType::GROUP)
    }

    fn broadcast(word: &str, network: NetworkType) -> Self {
        Self {
            encoded: word.to_string(),
            network,
            check_code: BROADCAST_NUMBER.to_le_bytes(),
            valid: true,
        }
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    pub fn check_code(&self) -> [u8; CHECK_CODE_LENGTH] {
        self.check_code
    }

    /// The check code read as a little-endian `u32`. For sharding and
    /// search only; it says nothing about validity.
    pub fn number(&self) -> u32 {
        u32::from_le_bytes(self.check_code)
    }

    /// Whether the stored check code matches the payload.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_broadcast(&self) -> bool {
        self.encoded == ANYWHERE || self.encoded == EVERYWHERE
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "Address({})", self.encoded)
        } else {
            write!(f, "Address({}, invalid)", self.encoded)
        }
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encoding::base64_decode;
    use crate::test_fixtures::{MOKI_ADDRESS, MOKI_FINGERPRINT, MOKI_NUMBER};

    fn moki_fingerprint() -> Vec<u8> {
        base64_decode(MOKI_FINGERPRINT).unwrap()
    }

    #[test]
    fn derives_moki_address() {
        let address = Address::derive(&moki_fingerprint(), NetworkType::MAIN, 1).unwrap();
        assert_eq!(address.as_str(), MOKI_ADDRESS);
        assert_eq!(address.number(), MOKI_NUMBER);
        assert_eq!(address.network(), NetworkType::MAIN);
        assert!(address.is_valid());
    }

    #[test]
    fn derives_every_network_tag() {
        let fingerprint = moki_fingerprint();
        let expected = [
            (NetworkType::GROUP, "7ivVWvNrjtppMiZQF4siCj5kpWMHhVnLBS"),
            (NetworkType::CHATROOM, "Lbjo2Pv5TferXb2B2VXuijnvxebUNfwWAc"),
            (NetworkType::PROVIDER, "pmQ1wznFAJ6BmvnEjrrDfWr11xdWBACP4s"),
            (NetworkType::STATION, "x1Usfx9RwYRxVjHoBQqxPmkAM3GUwNZZKd"),
            (NetworkType::THING, "tnn3o5m8G6iwxGB6z4BQWmZsK1CwF715cy"),
            (NetworkType::ROBOT, "2Pm7UguDsP662qUDLkGAMRoAWdKkrRzUESX"),
        ];
        for (network, encoded) in expected {
            let address = Address::derive(&fingerprint, network, 1).unwrap();
            assert_eq!(address.as_str(), encoded, "network {}", network);
            let parsed = Address::parse(encoded).unwrap();
            assert_eq!(parsed.network(), network);
            assert!(parsed.is_valid());
        }
    }

    #[test]
    fn unsupported_version_rejected() {
        for version in [0u8, 2, 3] {
            assert_eq!(
                Address::derive(b"fp", NetworkType::MAIN, version).unwrap_err(),
                AddressError::UnsupportedVersion(version)
            );
        }
    }

    #[test]
    fn parse_roundtrip_matches_derivation() {
        let derived = Address::derive(b"any fingerprint", NetworkType::MAIN, 1).unwrap();
        let parsed = Address::parse(derived.as_str()).unwrap();
        assert_eq!(parsed, derived);
        assert_eq!(parsed.check_code(), derived.check_code());
        assert_eq!(parsed.number(), derived.number());
    }

    #[test]
    fn bad_alphabet_is_an_error() {
        // '0', 'O', 'I' and 'l' are not Base58.
        assert!(matches!(
            Address::parse("0OIl"),
            Err(AddressError::Encoding(_))
        ));
    }

    #[test]
    fn wrong_length_is_an_error() {
        let short = base58_encode(&[0x08; 24]);
        assert_eq!(
            Address::parse(&short).unwrap_err(),
            AddressError::InvalidLength {
                expected: 25,
                got: 24
            }
        );
    }

    #[test]
    fn bad_check_code_parses_as_invalid() {
        let mut payload = base58_decode(MOKI_ADDRESS).unwrap();
        payload[24] ^= 0x01;
        let tampered = base58_encode(&payload);

        let address = Address::parse(&tampered).unwrap();
        assert!(!address.is_valid());
        assert_eq!(address.network(), NetworkType::MAIN);
        assert_ne!(address, Address::parse(MOKI_ADDRESS).unwrap());
    }

    #[test]
    fn unknown_network_byte_survives_parse() {
        let address = Address::derive(b"fp", NetworkType::from_byte(0x42), 1).unwrap();
        let parsed = Address::parse(address.as_str()).unwrap();
        assert_eq!(parsed.network().as_byte(), 0x42);
        assert!(parsed.is_valid());
    }

    #[test]
    fn broadcast_words() {
        let anywhere = Address::parse("AnyWhere").unwrap();
        assert_eq!(anywhere, Address::anywhere());
        assert_eq!(anywhere.as_str(), "anywhere");
        assert_eq!(anywhere.network(), NetworkType::MAIN);
        assert_eq!(anywhere.number(), 9527);
        assert!(anywhere.is_broadcast());
        assert!(anywhere.is_valid());

        let everywhere = Address::parse("EVERYWHERE").unwrap();
        assert_eq!(everywhere.network(), NetworkType::GROUP);
        assert_eq!(everywhere.number(), 9527);
        assert!(everywhere.is_broadcast());

        assert!(!Address::parse(MOKI_ADDRESS).unwrap().is_broadcast());
    }

    #[test]
    fn serde_as_string() {
        let address = Address::parse(MOKI_ADDRESS).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", MOKI_ADDRESS));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
        assert!(serde_json::from_str::<Address>("\"not-base58-0\"").is_err());
    }

    #[test]
    fn from_str_and_display_agree() {
        let address: Address = MOKI_ADDRESS.parse().unwrap();
        assert_eq!(address.to_string(), MOKI_ADDRESS);
        assert_eq!(format!("{:?}", address), format!("Address({})", MOKI_ADDRESS));
    }
}
