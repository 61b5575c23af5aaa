use arbor_types::Hash;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for chunk {expected}: computed {computed}")]
    HashMismatch { expected: Hash, computed: Hash },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A store opened for reading has no directory at its root.
    #[error("no store at {}", .0.display())]
    MissingRoot(std::path::PathBuf),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
