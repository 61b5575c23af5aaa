//! Foundation types for Arbor.
//!
//! Every other Arbor crate depends on `arbor-types`. It holds the one type the
//! whole system agrees on: the content hash that names a chunk.
//!
//! # Key Types
//!
//! - [`Hash`] -- 32-byte BLAKE3 digest of a chunk's canonical encoding

pub mod error;
pub mod hash;

pub use error::TypeError;
pub use hash::{Hash, HASH_LEN};
