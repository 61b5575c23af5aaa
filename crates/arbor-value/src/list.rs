use std::sync::Arc;

use arbor_types::Hash;

use crate::editor::ListEditor;
use crate::error::{ValueError, ValueResult};
use crate::sequence::{self, Item, LevelCursor, Node, SeqKind};
use crate::store::ValueStore;
use crate::value::Value;

/// An ordered sequence of values stored as a chunked tree.
///
/// Read operations take the [`ValueStore`] that holds the tree's chunks.
#[derive(Clone, Debug)]
pub struct List {
    root: Arc<Node>,
}

impl List {
    /// The empty list.
    pub fn new() -> Self {
        Self::from_root(Arc::new(Node::empty(SeqKind::List)))
    }

    pub(crate) fn from_root(root: Arc<Node>) -> Self {
        Self { root }
    }

    /// Build a list from `values`, writing its non-root chunks to `vs`.
    pub fn from_values(vs: &ValueStore, values: impl IntoIterator<Item = Value>) -> ValueResult<Self> {
        let items = values.into_iter().map(Item::Value).collect();
        Ok(Self::from_root(sequence::build(vs, SeqKind::List, items)?))
    }

    pub(crate) fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn len(&self) -> u64 {
        self.root.num_leaves()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hash(&self) -> Hash {
        self.root.hash()
    }

    /// Height of the tree; 0 when the whole list is one leaf.
    pub fn level(&self) -> u64 {
        self.root.level()
    }

    pub fn get(&self, vs: &ValueStore, index: u64) -> ValueResult<Value> {
        if index >= self.len() {
            return Err(ValueError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        match sequence::get_at(vs, &self.root, index)? {
            Item::Value(v) => Ok(v),
            _ => Err(ValueError::malformed("list leaf holds a non-value entry")),
        }
    }

    /// Iterate the elements in order, loading chunks as needed.
    pub fn iter(&self, vs: &ValueStore) -> ValueResult<ListIter> {
        Ok(ListIter {
            cursor: LevelCursor::seek(vs, &self.root, 0, 0)?,
        })
    }

    pub fn to_vec(&self, vs: &ValueStore) -> ValueResult<Vec<Value>> {
        self.iter(vs)?.collect()
    }

    /// Start a batch of edits against this list.
    pub fn edit(&self) -> ListEditor {
        ListEditor::new(self.clone())
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for List {}

/// Iterator over list elements.
pub struct ListIter {
    cursor: LevelCursor,
}

impl Iterator for ListIter {
    type Item = ValueResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next() {
            Ok(Some(c)) => match c.item {
                Item::Value(v) => Some(Ok(v)),
                _ => Some(Err(ValueError::malformed("list leaf holds a non-value entry"))),
            },
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
