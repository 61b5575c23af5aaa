use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ValueError, ValueResult};
use crate::key::compare_values;
use crate::sequence::build::{collapse, grow};
use crate::sequence::chunker::SequenceChunker;
use crate::sequence::cursor::{load_child, LevelCursor};
use crate::sequence::node::{Item, Node};
use crate::store::ValueStore;
use crate::value::Value;

/// Replace `removed` leaves starting at leaf offset `start` with `inserted`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Splice {
    pub start: u64,
    pub removed: u64,
    pub inserted: Vec<Item>,
}

/// New nodes replacing the old nodes covering `removed` leaves at `start`.
struct Run {
    start: u64,
    removed: u64,
    nodes: Vec<Arc<Node>>,
}

/// Merge touching splices and drop empty ones. Input must be sorted by start
/// and non-overlapping.
pub(crate) fn coalesce(splices: Vec<Splice>) -> Vec<Splice> {
    let mut out: Vec<Splice> = Vec::with_capacity(splices.len());
    for splice in splices {
        if splice.removed == 0 && splice.inserted.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(prev) if prev.start + prev.removed == splice.start => {
                prev.removed += splice.removed;
                prev.inserted.extend(splice.inserted);
            }
            _ => out.push(splice),
        }
    }
    out
}

/// Apply sorted, disjoint leaf splices to the tree under `root`.
///
/// Each level is rechunked only around the splices, starting at the old node
/// boundary before each one and stopping where a new boundary lands on an old
/// one. The result is the tree a fresh build of the new content produces.
pub(crate) fn apply(vs: &ValueStore, root: &Arc<Node>, splices: Vec<Splice>) -> ValueResult<Arc<Node>> {
    let mut splices = coalesce(splices);
    if splices.is_empty() {
        return Ok(Arc::clone(root));
    }
    let mut level = 0;
    loop {
        let runs = rechunk_level(vs, root, level, &splices)?;
        if level == root.level() {
            let mut nodes: Vec<Arc<Node>> = runs.into_iter().flat_map(|run| run.nodes).collect();
            debug!(level, nodes = nodes.len(), "rechunked root level");
            return match nodes.len() {
                0 => Ok(Arc::new(Node::empty(root.kind()))),
                1 => collapse(vs, nodes.remove(0)),
                _ => grow(vs, root.kind(), nodes, level),
            };
        }
        splices = runs
            .into_iter()
            .map(|run| {
                let mut inserted = Vec::with_capacity(run.nodes.len());
                for node in &run.nodes {
                    vs.write_node(node)?;
                    inserted.push(Item::Tuple(node.to_tuple()));
                }
                Ok(Splice {
                    start: run.start,
                    removed: run.removed,
                    inserted,
                })
            })
            .collect::<ValueResult<Vec<_>>>()?;
        level += 1;
    }
}

fn rechunk_level(
    vs: &ValueStore,
    root: &Arc<Node>,
    level: u64,
    splices: &[Splice],
) -> ValueResult<Vec<Run>> {
    let mut runs = Vec::new();
    let mut next = 0;
    while next < splices.len() {
        let mut cursor = LevelCursor::seek(vs, root, level, splices[next].start)?;
        let start = cursor.node_start();
        let mut pos = start;
        let mut chunker = SequenceChunker::new(&vs.config().chunker, root.kind(), level);
        let mut nodes = Vec::new();
        let mut synced = false;

        loop {
            if let Some(splice) = splices.get(next) {
                if splice.start < pos {
                    return Err(ValueError::malformed(format!(
                        "splice at {} not aligned to level {level} entries",
                        splice.start
                    )));
                }
                if splice.start == pos {
                    let mut remaining = splice.removed;
                    while remaining > 0 {
                        let old = cursor.next()?.ok_or_else(|| {
                            ValueError::malformed("splice removes past the end")
                        })?;
                        if old.span > remaining {
                            return Err(ValueError::malformed(format!(
                                "splice end not aligned to level {level} entries"
                            )));
                        }
                        remaining -= old.span;
                        pos += old.span;
                    }
                    for item in splice.inserted.iter().cloned() {
                        nodes.extend(chunker.push(item));
                    }
                    next += 1;
                    continue;
                }
            }

            let Some(old) = cursor.next()? else {
                break;
            };
            pos += old.span;
            if let Some(node) = chunker.push(old.item) {
                nodes.push(node);
                let pending = splices.get(next).is_some_and(|s| s.start <= pos);
                if old.ends_node && !pending {
                    synced = true;
                    break;
                }
            }
        }
        if !synced {
            if next < splices.len() {
                return Err(ValueError::malformed(format!(
                    "splice at {} starts past the end",
                    splices[next].start
                )));
            }
            nodes.extend(chunker.finish());
        }
        runs.push(Run {
            start,
            removed: pos - start,
            nodes,
        });
    }
    Ok(runs)
}

/// The leaf entry at offset `index`, which must be in range.
pub(crate) fn get_at(vs: &ValueStore, root: &Arc<Node>, mut index: u64) -> ValueResult<Item> {
    let mut node = Arc::clone(root);
    while !node.is_leaf() {
        let mut idx = 0;
        while idx + 1 < node.len() && index >= node.items()[idx].leaf_span() {
            index -= node.items()[idx].leaf_span();
            idx += 1;
        }
        node = load_child(vs, &node, idx)?;
    }
    node.items()
        .get(index as usize)
        .cloned()
        .ok_or_else(|| ValueError::malformed(format!("leaf has no entry {index}")))
}

/// Locate `key` in an ordered tree: the leaf offset where it is or would be
/// inserted, and its entry if present.
pub(crate) fn find(vs: &ValueStore, root: &Arc<Node>, key: &Value) -> ValueResult<(u64, Option<Item>)> {
    let mut node = Arc::clone(root);
    let mut offset = 0;
    while !node.is_leaf() {
        let mut chosen = None;
        for (idx, item) in node.items().iter().enumerate() {
            let Item::Tuple(tuple) = item else {
                return Err(ValueError::malformed("leaf entry in meta node"));
            };
            let boundary = tuple
                .key
                .as_ref()
                .ok_or_else(|| ValueError::malformed("ordered meta tuple without key"))?;
            if boundary.cmp_value(key) != Ordering::Less {
                chosen = Some(idx);
                break;
            }
            offset += tuple.num_leaves;
        }
        let Some(idx) = chosen else {
            return Ok((offset, None));
        };
        node = load_child(vs, &node, idx)?;
    }
    let found = node.items().binary_search_by(|item| match item.leaf_key() {
        Some(k) => compare_values(k, key),
        None => Ordering::Less,
    });
    Ok(match found {
        Ok(idx) => (offset + idx as u64, Some(node.items()[idx].clone())),
        Err(idx) => (offset + idx as u64, None),
    })
}
