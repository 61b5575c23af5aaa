use std::collections::HashMap;
use std::sync::RwLock;

use arbor_types::Hash;

use crate::chunk::Chunk;
use crate::error::StoreResult;
use crate::traits::ChunkStore;

/// In-memory, HashMap-based chunk store.
///
/// Intended for tests and embedding. All chunks are held in memory behind a
/// `RwLock` for safe concurrent access. Chunks are cloned on read/write.
pub struct InMemoryChunkStore {
    chunks: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl InMemoryChunkStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of chunks currently stored.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored chunks.
    pub fn total_bytes(&self) -> u64 {
        self.chunks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Drop a single chunk. Used to simulate data loss in tests.
    pub fn remove(&self, hash: &Hash) -> bool {
        self.chunks
            .write()
            .expect("lock poisoned")
            .remove(hash)
            .is_some()
    }

    /// Overwrite a chunk's bytes without rehashing. Used to simulate
    /// corruption in tests.
    pub fn corrupt(&self, hash: &Hash, data: Vec<u8>) {
        self.chunks
            .write()
            .expect("lock poisoned")
            .insert(*hash, data);
    }
}

impl Default for InMemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkStore for InMemoryChunkStore {
    fn get(&self, hash: &Hash) -> StoreResult<Option<Chunk>> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.get(hash).map(|data| Chunk::with_hash(*hash, data.clone())))
    }

    fn put(&self, chunk: &Chunk) -> StoreResult<()> {
        let mut map = self.chunks.write().expect("lock poisoned");
        // The same hash always names the same bytes, so the first write wins.
        map.entry(*chunk.hash())
            .or_insert_with(|| chunk.data().to_vec());
        Ok(())
    }

    fn has(&self, hash: &Hash) -> StoreResult<bool> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.contains_key(hash))
    }

    fn put_many(&self, chunks: &[Chunk]) -> StoreResult<()> {
        let mut map = self.chunks.write().expect("lock poisoned");
        for chunk in chunks {
            map.entry(*chunk.hash())
                .or_insert_with(|| chunk.data().to_vec());
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryChunkStore")
            .field("chunk_count", &count)
            .finish()
    }
}
