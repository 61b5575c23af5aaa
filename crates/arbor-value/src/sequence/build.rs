use std::sync::Arc;

use crate::error::ValueResult;
use crate::sequence::chunker::SequenceChunker;
use crate::sequence::cursor::load_child;
use crate::sequence::node::{Item, Node, SeqKind};
use crate::store::ValueStore;

/// Build a tree from leaf items already in collection order.
pub(crate) fn build(vs: &ValueStore, kind: SeqKind, items: Vec<Item>) -> ValueResult<Arc<Node>> {
    let mut chunker = SequenceChunker::new(&vs.config().chunker, kind, 0);
    let mut nodes = Vec::new();
    for item in items {
        nodes.extend(chunker.push(item));
    }
    nodes.extend(chunker.finish());
    grow(vs, kind, nodes, 0)
}

/// Group `nodes` of one level into parents until a single root remains.
/// Every non-root node is written to the store.
pub(crate) fn grow(
    vs: &ValueStore,
    kind: SeqKind,
    mut nodes: Vec<Arc<Node>>,
    mut level: u64,
) -> ValueResult<Arc<Node>> {
    while nodes.len() > 1 {
        let mut chunker = SequenceChunker::new(&vs.config().chunker, kind, level + 1);
        let mut parents = Vec::new();
        vs.write_nodes(&nodes)?;
        for node in &nodes {
            parents.extend(chunker.push(Item::Tuple(node.to_tuple())));
        }
        parents.extend(chunker.finish());
        nodes = parents;
        level += 1;
    }
    Ok(nodes
        .pop()
        .unwrap_or_else(|| Arc::new(Node::empty(kind))))
}

/// Replace a meta root with a single child by that child, repeatedly.
pub(crate) fn collapse(vs: &ValueStore, mut root: Arc<Node>) -> ValueResult<Arc<Node>> {
    while !root.is_leaf() && root.len() == 1 {
        root = load_child(vs, &root, 0)?;
    }
    Ok(root)
}
