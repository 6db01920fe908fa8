//! # Protocol Constants
//!
//! Every magic number MKM depends on lives here. Most of them are baked into
//! addresses that already exist in the wild, so "tweaking" one of these is
//! the same as invalidating every identity ever derived. Don't.

// ---------------------------------------------------------------------------
// Meta & Address Layout
// ---------------------------------------------------------------------------

/// Meta version 1: sign the seed, hash the signature. The only version this
/// crate derives addresses for.
pub const META_VERSION_MKM: u8 = 0x01;

/// Network tag prefix length in a decoded address.
pub const NETWORK_LENGTH: usize = 1;

/// RIPEMD-160 digest length.
pub const DIGEST_LENGTH: usize = 20;

/// Truncated double-SHA-256 check code length.
pub const CHECK_CODE_LENGTH: usize = 4;

/// Decoded address payload: `network || digest || check_code`.
pub const ADDRESS_PAYLOAD_LENGTH: usize = NETWORK_LENGTH + DIGEST_LENGTH + CHECK_CODE_LENGTH;

// ---------------------------------------------------------------------------
// Broadcast Addresses
// ---------------------------------------------------------------------------

/// Reserved address for "any user".
pub const ANYWHERE: &str = "anywhere";

/// Reserved address for "every group".
pub const EVERYWHERE: &str = "everywhere";

/// Search number shared by both broadcast addresses.
pub const BROADCAST_NUMBER: u32 = 9527;

/// Name half of the broadcast user identifier.
pub const ANYONE: &str = "anyone";

/// Name half of the broadcast group identifier.
pub const EVERYONE: &str = "everyone";

// ---------------------------------------------------------------------------
// Identifier Syntax
// ---------------------------------------------------------------------------

/// Separates the name from the address.
pub const NAME_SEPARATOR: char = '@';

/// Separates the address from the terminal.
pub const TERMINAL_SEPARATOR: char = '/';

// ---------------------------------------------------------------------------
// Key Parameters
// ---------------------------------------------------------------------------

/// Canonical symmetric algorithm name.
pub const ALGORITHM_AES: &str = "AES";

/// Alias kept for configs written by JVM-style clients.
pub const ALGORITHM_AES_CBC: &str = "AES/CBC/PKCS5Padding";

/// Canonical asymmetric algorithm name.
pub const ALGORITHM_RSA: &str = "RSA";

/// Signature-flavoured alias for RSA.
pub const ALGORITHM_SHA256_WITH_RSA: &str = "SHA256withRSA";

/// Cipher-flavoured alias for RSA.
pub const ALGORITHM_RSA_ECB: &str = "RSA/ECB/PKCS1Padding";

/// Default AES key length in bytes when a generation request omits `size`.
pub const DEFAULT_AES_KEY_SIZE: usize = 32;

/// AES block size, which is also the CBC IV length.
pub const AES_BLOCK_SIZE: usize = 16;

/// Default RSA modulus size when a generation request omits `keySizeInBits`.
///
/// 1024 bits is weak by modern standards. It is kept because existing
/// identities were minted with it; pass `keySizeInBits` for new deployments.
pub const DEFAULT_RSA_KEY_BITS: usize = 1024;

/// Known plaintext used by `matches` checks on key pairs and symmetric keys.
pub const KEY_MATCH_PROMISE: &[u8] = b"Moky loves May Lee forever!";

// ---------------------------------------------------------------------------
// Key Config Field Names
// ---------------------------------------------------------------------------

pub const FIELD_ALGORITHM: &str = "algorithm";
pub const FIELD_DATA: &str = "data";
pub const FIELD_IV: &str = "iv";
pub const FIELD_SIZE: &str = "size";
pub const FIELD_KEY_SIZE_IN_BITS: &str = "keySizeInBits";
pub const FIELD_MODE: &str = "mode";
pub const FIELD_PADDING: &str = "padding";
pub const FIELD_DIGEST: &str = "digest";

/// Scheme labels written into generated RSA configs.
pub const RSA_MODE_ECB: &str = "ECB";
pub const RSA_PADDING_PKCS1: &str = "PKCS1";
pub const RSA_DIGEST_SHA256: &str = "SHA256";
