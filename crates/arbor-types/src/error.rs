use thiserror::Error;

/// Errors from parsing hashes out of text or bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("hash is not valid hex: {0}")]
    InvalidHex(String),

    #[error("hash must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
