use arbor_types::Hash;

/// BLAKE3 hasher that names chunks.
///
/// A domain tag is hashed ahead of the data, so a chunk name never equals a
/// plain BLAKE3 digest of the same bytes. The tag is part of the storage
/// format: changing it renames every chunk.
pub struct ContentHasher {
    domain: &'static [u8],
}

impl ContentHasher {
    /// Hasher for encoded value chunks.
    pub const CHUNK: Self = Self {
        domain: b"arbor-chunk-v1:",
    };

    /// Name `data`.
    pub fn hash(&self, data: &[u8]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain);
        hasher.update(data);
        Hash::from_digest(*hasher.finalize().as_bytes())
    }

    /// Whether `data` is named by `expected`.
    pub fn verify(&self, data: &[u8], expected: &Hash) -> bool {
        self.hash(data) == *expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_name_is_tagged_blake3() {
        let expected = Hash::from_digest(*blake3::hash(b"arbor-chunk-v1:[1,2]").as_bytes());
        assert_eq!(ContentHasher::CHUNK.hash(b"[1,2]"), expected);
    }

    #[test]
    fn chunk_name_differs_from_plain_digest() {
        let encoded = [4u8, 1, b'a'];
        assert_ne!(ContentHasher::CHUNK.hash(&encoded), Hash::digest(&encoded));
    }

    #[test]
    fn empty_chunk_has_a_stable_name() {
        let empty = ContentHasher::CHUNK.hash(b"");
        assert_eq!(empty, ContentHasher::CHUNK.hash(&[]));
        assert_ne!(empty, ContentHasher::CHUNK.hash(&[0]));
    }

    #[test]
    fn verify_catches_a_flipped_byte() {
        let mut chunk = vec![7u8, 0, 2, 2, 2, 2, 4];
        let name = ContentHasher::CHUNK.hash(&chunk);
        assert!(ContentHasher::CHUNK.verify(&chunk, &name));
        chunk[3] ^= 1;
        assert!(!ContentHasher::CHUNK.verify(&chunk, &name));
    }
}
