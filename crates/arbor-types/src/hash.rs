use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width of a [`Hash`] in bytes.
pub const HASH_LEN: usize = 32;

/// Content hash of a chunk.
///
/// A `Hash` is the BLAKE3 digest of a value's canonical encoding. Identical
/// encodings always produce the same `Hash`, so chunks are deduplicated and
/// values compared by hash alone. The width never changes: a different digest
/// would invalidate every stored chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// Digest raw bytes without domain separation.
    ///
    /// Chunk hashing goes through `arbor_crypto::ContentHasher`; this is for
    /// fixtures and low-level use.
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed digest.
    pub const fn from_digest(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy a digest out of a slice that must be exactly [`HASH_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != HASH_LEN {
            return Err(TypeError::InvalidLength {
                expected: HASH_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// The all-zero hash. Never produced by the hasher in practice.
    pub const fn zero() -> Self {
        Self([0u8; HASH_LEN])
    }

    /// Returns `true` for the all-zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a full-length hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; HASH_LEN] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(Hash::digest(b"hello world"), Hash::digest(b"hello world"));
    }

    #[test]
    fn different_data_produces_different_hashes() {
        assert_ne!(Hash::digest(b"hello"), Hash::digest(b"world"));
    }

    #[test]
    fn zero_is_all_zeros() {
        let zero = Hash::zero();
        assert!(zero.is_zero());
        assert_eq!(zero.as_bytes(), &[0u8; HASH_LEN]);
        assert!(!Hash::digest(b"x").is_zero());
    }

    #[test]
    fn hex_roundtrip() {
        let hash = Hash::digest(b"test");
        let parsed: Hash = hash.to_hex().parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Hash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: HASH_LEN,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            Hash::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn display_is_full_hex() {
        let hash = Hash::digest(b"test");
        let display = format!("{hash}");
        assert_eq!(display.len(), HASH_LEN * 2);
        assert_eq!(display, hash.to_hex());
        assert_eq!(hash.short_hex().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let hash = Hash::digest(b"serde test");
        let json = serde_json::to_string(&hash).unwrap();
        let parsed: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn ordering_follows_bytes() {
        assert!(Hash::from_digest([0; HASH_LEN]) < Hash::from_digest([1; HASH_LEN]));
    }
}
