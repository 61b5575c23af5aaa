use serde::{Deserialize, Serialize};

/// Parameters of the content-defined chunk boundary predicate.
///
/// After each entry is appended to a chunk, the chunk closes when it holds at
/// least two entries and either its size reached `max_chunk_bytes`, or its
/// size reached `min_chunk_bytes` and the low `boundary_bits` bits of the
/// rolling checksum are all ones.
///
/// These values shape every collection tree, and so every collection hash.
/// Stores that must agree on hashes must use the same chunker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Rolling checksum window in bytes.
    pub window: usize,
    /// Number of low checksum bits that must be set to cut a boundary. The
    /// expected distance between boundaries past the minimum is
    /// `2^boundary_bits` bytes.
    pub boundary_bits: u32,
    /// No boundary is cut before a chunk reaches this many bytes.
    pub min_chunk_bytes: usize,
    /// A boundary is forced once a chunk reaches this many bytes.
    pub max_chunk_bytes: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window: 64,
            boundary_bits: 12,
            min_chunk_bytes: 256,
            max_chunk_bytes: 16 * 1024,
        }
    }
}

impl ChunkerConfig {
    /// Small chunks: trees get several levels deep after a few thousand
    /// small entries.
    pub fn fine() -> Self {
        Self {
            window: 16,
            boundary_bits: 4,
            min_chunk_bytes: 32,
            max_chunk_bytes: 512,
        }
    }
}

/// Configuration for a [`ValueStore`](crate::ValueStore) session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueStoreConfig {
    /// Boundary predicate used by every collection built through the store.
    pub chunker: ChunkerConfig,
    /// Maximum number of decoded chunks kept in the decode cache. Zero
    /// disables caching.
    pub cache_capacity: usize,
}

impl Default for ValueStoreConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            cache_capacity: 16 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ValueStoreConfig::default();
        assert_eq!(c.chunker.window, 64);
        assert_eq!(c.chunker.boundary_bits, 12);
        assert!(c.chunker.min_chunk_bytes < c.chunker.max_chunk_bytes);
        assert_eq!(c.cache_capacity, 16 * 1024);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: ValueStoreConfig =
            serde_json::from_str(r#"{"chunker": {"boundary_bits": 8}}"#).unwrap();
        assert_eq!(c.chunker.boundary_bits, 8);
        assert_eq!(c.chunker.window, 64);
        assert_eq!(c.cache_capacity, 16 * 1024);
    }
}
