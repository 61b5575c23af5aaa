//! Content-addressed chunk storage for Arbor.
//!
//! A chunk store is a pure key-value store keyed by content hash. The value
//! layer above it hands over canonically encoded chunks and asks for them back
//! by hash; the store never interprets chunk contents.
//!
//! # Storage Backends
//!
//! All backends implement the [`ChunkStore`] trait:
//!
//! - [`InMemoryChunkStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsChunkStore`] -- one file per chunk under a root directory
//!
//! # Design Rules
//!
//! 1. Chunks are immutable once written (content-addressing guarantees this).
//! 2. `put` is idempotent: re-putting identical content is a no-op success.
//! 3. A successful `put` is visible to every later `get` on the same store.
//! 4. Concurrent reads are always safe.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod chunk;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use chunk::Chunk;
pub use error::{StoreError, StoreResult};
pub use fs::FsChunkStore;
pub use memory::InMemoryChunkStore;
pub use traits::ChunkStore;
