use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use arbor_crypto::ContentHasher;
use arbor_types::Hash;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::chunk::Chunk;
use crate::error::{StoreError, StoreResult};
use crate::traits::ChunkStore;

/// Filesystem chunk store: one file per chunk.
///
/// Chunks live at `<root>/<first 2 hex chars>/<remaining 62 hex chars>`.
/// Writes go to a temporary file in the root and are renamed into place, so a
/// reader never observes a partially written chunk. Every read is verified
/// against its hash.
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
}

impl FsChunkStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Open a store that must already exist. Nothing is created, so a
    /// mistyped root is reported as [`StoreError::MissingRoot`].
    pub fn open_existing(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::MissingRoot(root));
        }
        Ok(Self { root })
    }

    /// The directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chunk_path(&self, hash: &Hash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

}

impl ChunkStore for FsChunkStore {
    fn get(&self, hash: &Hash) -> StoreResult<Option<Chunk>> {
        let path = self.chunk_path(hash);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let computed = ContentHasher::CHUNK.hash(&data);
        if computed != *hash {
            warn!(chunk = %hash.short_hex(), path = %path.display(), "chunk failed hash verification");
            return Err(StoreError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        Ok(Some(Chunk::with_hash(*hash, data)))
    }

    fn put(&self, chunk: &Chunk) -> StoreResult<()> {
        let path = self.chunk_path(chunk.hash());
        if path.exists() {
            return Ok(());
        }
        if let Some(shard) = path.parent() {
            std::fs::create_dir_all(shard)?;
        }
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(chunk.data())?;
        tmp.as_file().sync_data()?;
        // Concurrent writers of one hash write identical bytes.
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(chunk = %chunk.hash().short_hex(), len = chunk.len(), "chunk written");
        Ok(())
    }

    fn has(&self, hash: &Hash) -> StoreResult<bool> {
        Ok(self.chunk_path(hash).is_file())
    }
}
