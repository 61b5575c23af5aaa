//! Hashing primitives for Arbor.
//!
//! Provides the domain-separated BLAKE3 hasher that names every chunk and the
//! buzhash rolling checksum that decides where sequence chunks end.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.
//! The rolling checksum is not cryptographic; it only needs to be
//! deterministic and well distributed.

pub mod hasher;
pub mod rolling;

pub use hasher::ContentHasher;
pub use rolling::RollingHasher;
