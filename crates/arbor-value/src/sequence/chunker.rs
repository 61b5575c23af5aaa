use std::sync::Arc;

use arbor_crypto::RollingHasher;

use crate::codec;
use crate::config::ChunkerConfig;
use crate::sequence::node::{Item, Node, SeqKind};

/// Groups a stream of items into nodes of one level.
///
/// After each item the chunker decides whether the current node ends there.
/// The decision depends only on the items pushed since the last boundary, so
/// two chunkers fed the same items from the same boundary cut the same nodes.
pub(crate) struct SequenceChunker {
    config: ChunkerConfig,
    kind: SeqKind,
    level: u64,
    hasher: RollingHasher,
    items: Vec<Item>,
    bytes: usize,
    scratch: Vec<u8>,
}

impl SequenceChunker {
    pub(crate) fn new(config: &ChunkerConfig, kind: SeqKind, level: u64) -> Self {
        Self {
            config: config.clone(),
            kind,
            level,
            hasher: RollingHasher::new(config.window),
            items: Vec::new(),
            bytes: 0,
            scratch: Vec::new(),
        }
    }

    /// Append one item, returning the node it completes, if any.
    pub(crate) fn push(&mut self, item: Item) -> Option<Arc<Node>> {
        self.scratch.clear();
        codec::encode_item(&mut self.scratch, &item);
        self.hasher.roll_all(&self.scratch);
        self.bytes += self.scratch.len();
        self.items.push(item);

        if self.at_boundary() {
            Some(self.cut())
        } else {
            None
        }
    }

    /// Close the partial node at the end of the sequence.
    pub(crate) fn finish(mut self) -> Option<Arc<Node>> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.cut())
        }
    }

    // At least two items per node, so every level above the leaves is
    // smaller than the one below it.
    fn at_boundary(&self) -> bool {
        if self.items.len() < 2 {
            return false;
        }
        self.bytes >= self.config.max_chunk_bytes
            || (self.bytes >= self.config.min_chunk_bytes
                && self.hasher.matches_pattern(self.config.boundary_bits))
    }

    fn cut(&mut self) -> Arc<Node> {
        let items = std::mem::take(&mut self.items);
        self.bytes = 0;
        self.hasher.reset();
        Arc::new(Node::new(self.kind, self.level, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn chunk(values: impl IntoIterator<Item = i64>, config: &ChunkerConfig) -> Vec<Arc<Node>> {
        let mut chunker = SequenceChunker::new(config, SeqKind::List, 0);
        let mut nodes = Vec::new();
        for v in values {
            nodes.extend(chunker.push(Item::Value(Value::Int(v))));
        }
        nodes.extend(chunker.finish());
        nodes
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(chunk([], &ChunkerConfig::fine()).is_empty());
    }

    #[test]
    fn nodes_cover_every_item_in_order() {
        let nodes = chunk(0..2000, &ChunkerConfig::fine());
        assert!(nodes.len() > 1);
        let flat: Vec<Item> = nodes.iter().flat_map(|n| n.items().to_vec()).collect();
        let expected: Vec<Item> = (0..2000).map(|v| Item::Value(Value::Int(v))).collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn chunks_respect_size_bounds() {
        let config = ChunkerConfig::fine();
        let nodes = chunk(0..5000, &config);
        for node in &nodes[..nodes.len() - 1] {
            assert!(node.len() >= 2);
            let bytes: usize = node
                .items()
                .iter()
                .map(|item| {
                    let mut out = Vec::new();
                    codec::encode_item(&mut out, item);
                    out.len()
                })
                .sum();
            assert!(bytes >= config.min_chunk_bytes, "chunk of {bytes} bytes");
            assert!(bytes < config.max_chunk_bytes + 16, "chunk of {bytes} bytes");
        }
    }

    #[test]
    fn boundaries_are_content_local() {
        // Chunking a suffix that starts on a boundary reproduces the tail.
        let config = ChunkerConfig::fine();
        let nodes = chunk(0..3000, &config);
        let skip: usize = nodes[..3].iter().map(|n| n.len()).sum();
        let tail = chunk(skip as i64..3000, &config);
        let hashes: Vec<_> = nodes[3..].iter().map(|n| n.hash()).collect();
        let tail_hashes: Vec<_> = tail.iter().map(|n| n.hash()).collect();
        assert_eq!(hashes, tail_hashes);
    }

    #[test]
    fn max_bytes_forces_a_cut() {
        let config = ChunkerConfig {
            window: 16,
            boundary_bits: 31,
            min_chunk_bytes: 8,
            max_chunk_bytes: 64,
        };
        let nodes = chunk(0..200, &config);
        assert!(nodes.len() > 5);
    }
}
