use arbor_types::Hash;

use crate::chunk::Chunk;
use crate::error::StoreResult;

/// Content-addressed chunk store.
///
/// All implementations must satisfy these invariants:
/// - Chunks are immutable once written: the same hash always names the same
///   bytes.
/// - `put` is idempotent; storing a chunk that is already present succeeds
///   without rewriting it.
/// - A successful `put` is visible to subsequent `get` and `has` calls.
/// - The store never interprets chunk contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait ChunkStore: Send + Sync {
    /// Read a chunk by hash.
    ///
    /// Returns `Ok(None)` if the chunk does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn get(&self, hash: &Hash) -> StoreResult<Option<Chunk>>;

    /// Store a chunk under its hash.
    fn put(&self, chunk: &Chunk) -> StoreResult<()>;

    /// Check whether a chunk exists in the store.
    fn has(&self, hash: &Hash) -> StoreResult<bool>;

    /// Store multiple chunks in a batch.
    ///
    /// Default implementation calls `put()` for each chunk. Backends may
    /// override for fewer round-trips.
    fn put_many(&self, chunks: &[Chunk]) -> StoreResult<()> {
        chunks.iter().try_for_each(|chunk| self.put(chunk))
    }
}
