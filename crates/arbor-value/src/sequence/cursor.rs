use std::sync::Arc;

use crate::error::{ValueError, ValueResult};
use crate::sequence::node::{Item, Node};
use crate::store::ValueStore;

struct Frame {
    node: Arc<Node>,
    /// Ancestors: index of the child being visited. Bottom: next item.
    idx: usize,
    /// Leaf offset of the node's first entry.
    start: u64,
}

/// An item yielded by [`LevelCursor`].
pub(crate) struct CursorItem {
    pub item: Item,
    pub span: u64,
    /// This was the last item of its node.
    pub ends_node: bool,
}

/// Streams the items of one tree level in order, loading nodes on demand.
pub(crate) struct LevelCursor {
    vs: ValueStore,
    level: u64,
    frames: Vec<Frame>,
    done: bool,
}

impl LevelCursor {
    /// Position at the first item of the `level` node containing leaf offset
    /// `pos`. An offset at or past the end selects the last node.
    pub(crate) fn seek(vs: &ValueStore, root: &Arc<Node>, level: u64, pos: u64) -> ValueResult<Self> {
        if level > root.level() {
            return Err(ValueError::malformed(format!(
                "level {level} above root level {}",
                root.level()
            )));
        }
        let mut frames = Vec::new();
        let mut node = Arc::clone(root);
        let mut start = 0;
        while node.level() > level {
            let last = node.len().saturating_sub(1);
            let mut idx = 0;
            let mut offset = start;
            while idx < last && pos >= offset + node.items()[idx].leaf_span() {
                offset += node.items()[idx].leaf_span();
                idx += 1;
            }
            let child = load_child(vs, &node, idx)?;
            frames.push(Frame { node, idx, start });
            node = child;
            start = offset;
        }
        frames.push(Frame {
            node,
            idx: 0,
            start,
        });
        Ok(Self {
            vs: vs.clone(),
            level,
            frames,
            done: false,
        })
    }

    /// Leaf offset where the current node starts.
    pub(crate) fn node_start(&self) -> u64 {
        self.frames.last().map_or(0, |f| f.start)
    }

    pub(crate) fn next(&mut self) -> ValueResult<Option<CursorItem>> {
        loop {
            if self.done {
                return Ok(None);
            }
            if let Some(bottom) = self.frames.last_mut() {
                if bottom.idx < bottom.node.len() {
                    let item = bottom.node.items()[bottom.idx].clone();
                    bottom.idx += 1;
                    return Ok(Some(CursorItem {
                        span: item.leaf_span(),
                        ends_node: bottom.idx == bottom.node.len(),
                        item,
                    }));
                }
            }
            self.advance()?;
        }
    }

    /// Move to the first item of the next node at this level.
    fn advance(&mut self) -> ValueResult<()> {
        let Some(bottom) = self.frames.pop() else {
            self.done = true;
            return Ok(());
        };
        let start = bottom.start + bottom.node.num_leaves();
        loop {
            match self.frames.last_mut() {
                None => {
                    self.done = true;
                    return Ok(());
                }
                Some(parent) if parent.idx + 1 < parent.node.len() => {
                    parent.idx += 1;
                    break;
                }
                Some(_) => {
                    self.frames.pop();
                }
            }
        }
        while let Some(parent) = self.frames.last() {
            if parent.node.level() == self.level {
                break;
            }
            let child = load_child(&self.vs, &parent.node, parent.idx)?;
            let bottom = child.level() == self.level;
            self.frames.push(Frame {
                node: child,
                idx: 0,
                start,
            });
            if bottom {
                break;
            }
        }
        Ok(())
    }
}

/// Load the child behind item `idx` of a meta node, checking its level.
pub(crate) fn load_child(vs: &ValueStore, node: &Node, idx: usize) -> ValueResult<Arc<Node>> {
    let Some(Item::Tuple(tuple)) = node.items().get(idx) else {
        return Err(ValueError::malformed(format!(
            "level {} node has no child at {idx}",
            node.level()
        )));
    };
    let child = vs.read_node(&tuple.child, node.kind())?;
    if child.level() + 1 != node.level() {
        return Err(ValueError::malformed(format!(
            "child at level {} under node at level {}",
            child.level(),
            node.level()
        )));
    }
    Ok(child)
}
