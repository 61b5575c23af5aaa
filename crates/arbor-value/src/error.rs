use arbor_store::StoreError;
use arbor_types::Hash;
use thiserror::Error;

use crate::value::ValueKind;

/// Errors from value encoding, tree traversal, and editing.
///
/// None of these are recovered internally: each one is either caller misuse
/// or data loss below the value layer.
#[derive(Debug, Error)]
pub enum ValueError {
    /// Decode-time structural violation: truncated bytes, bad tag, length
    /// mismatch, or a tree node that breaks its shape invariants.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// A value nests deeper than the codec allows, so it cannot be written.
    #[error("value nests {depth} levels deep, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },

    /// A Ref's target chunk is not in the store.
    #[error("dangling ref: chunk {0} not found")]
    DanglingRef(Hash),

    /// A mutation was attempted on an editor that already materialized.
    #[error("editor already materialized")]
    EditorFinalized,

    /// An operation was applied to a value of the wrong kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A positional access past the end of a sequence.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: u64, len: u64 },

    /// Failure in the underlying chunk store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Failure writing rendered output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValueError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEncoding(reason.into())
    }
}

/// Result alias for value operations.
pub type ValueResult<T> = Result<T, ValueError>;
