//! # Hashing Utilities
//!
//! The two hash functions the address algorithm is built from, plus the
//! compositions it actually uses:
//!
//! - **SHA-256**: first stage of the digest, and (doubled) the check code.
//! - **RIPEMD-160**: second stage of the digest. 20 bytes keeps addresses
//!   short enough to read aloud, barely.
//!
//! The composition is Bitcoin's `hash160` / `checksum` pair. Same reasons,
//! same tradeoffs: two unrelated hash families so a break in one doesn't
//! immediately collapse the whole address space.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::config::{CHECK_CODE_LENGTH, DIGEST_LENGTH};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use mkm::crypto::sha256;
///
/// let hash = sha256(b"moki");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; DIGEST_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// `RIPEMD-160(SHA-256(data))`, the 20-byte digest embedded in an address.
pub fn hash160(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    ripemd160(&sha256(data))
}

/// The first four bytes of `double_sha256(data)`.
///
/// For addresses, `data` is `network || digest`. Four bytes catches every
/// single-character typo and all but one in four billion random ones.
pub fn check_code(data: &[u8]) -> [u8; CHECK_CODE_LENGTH] {
    let hash = double_sha256(data);
    let mut code = [0u8; CHECK_CODE_LENGTH];
    code.copy_from_slice(&hash[..CHECK_CODE_LENGTH]);
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_ripemd160_known_vector() {
        // RIPEMD-160 reference vector for the empty string.
        let hash = ripemd160(b"");
        let expected = hex::decode("9c1185a5c5e9fc54612808977ee8f548b2258d31").unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_ripemd160_abc_vector() {
        let hash = ripemd160(b"abc");
        let expected = hex::decode("8eb208f7e05d987a9b044a8e98c6b087f15a0bfc").unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn double_sha256_is_sha256_of_sha256() {
        let single = sha256(b"mkm");
        assert_eq!(double_sha256(b"mkm"), sha256(&single));
        assert_ne!(double_sha256(b"mkm"), single);
    }

    #[test]
    fn hash160_composes_sha256_then_ripemd160() {
        let data = b"fingerprint bytes";
        assert_eq!(hash160(data), ripemd160(&sha256(data)));
    }

    #[test]
    fn check_code_is_prefix_of_double_sha256() {
        let data = [0x08u8; 21];
        let full = double_sha256(&data);
        assert_eq!(check_code(&data), [full[0], full[1], full[2], full[3]]);
    }

    #[test]
    fn test_check_code_sensitive_to_every_byte() {
        let base = [0u8; 21];
        let reference = check_code(&base);
        for i in 0..base.len() {
            let mut tweaked = base;
            tweaked[i] ^= 0x01;
            assert_ne!(check_code(&tweaked), reference, "byte {} ignored", i);
        }
    }
}
