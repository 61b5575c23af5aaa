use arbor_crypto::ContentHasher;
use arbor_types::Hash;

/// The unit of storage: encoded bytes plus the hash that names them.
///
/// A `Chunk` built with [`Chunk::new`] always carries the hash of its data.
/// [`Chunk::with_hash`] trusts the caller and is meant for backends that have
/// already verified (or are about to verify) the pairing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    hash: Hash,
    data: Vec<u8>,
}

impl Chunk {
    /// Create a chunk, hashing its data.
    pub fn new(data: Vec<u8>) -> Self {
        let hash = ContentHasher::CHUNK.hash(&data);
        Self { hash, data }
    }

    /// Pair data with a known hash without rehashing.
    pub fn with_hash(hash: Hash, data: Vec<u8>) -> Self {
        Self { hash, data }
    }

    /// The content hash of this chunk.
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// The encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the encoded bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the chunk holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Recompute the hash and compare it with the stored one.
    pub fn verify(&self) -> bool {
        ContentHasher::CHUNK.verify(&self.data, &self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_hashes_data() {
        let chunk = Chunk::new(b"deterministic".to_vec());
        assert_eq!(*chunk.hash(), ContentHasher::CHUNK.hash(b"deterministic"));
        assert!(chunk.verify());
        assert_eq!(chunk.len(), 13);
    }

    #[test]
    fn with_hash_can_be_detected_as_wrong() {
        let chunk = Chunk::with_hash(Hash::zero(), b"data".to_vec());
        assert!(!chunk.verify());
    }

    #[test]
    fn identical_data_identical_hash() {
        assert_eq!(Chunk::new(vec![1, 2, 3]).hash(), Chunk::new(vec![1, 2, 3]).hash());
        assert_ne!(Chunk::new(vec![1, 2, 3]).hash(), Chunk::new(vec![3, 2, 1]).hash());
    }
}
