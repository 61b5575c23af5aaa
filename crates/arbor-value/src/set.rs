use std::collections::BTreeSet;
use std::sync::Arc;

use arbor_types::Hash;

use crate::editor::SetEditor;
use crate::error::{ValueError, ValueResult};
use crate::sequence::{self, Item, LevelCursor, Node, SeqKind};
use crate::store::ValueStore;
use crate::value::Value;

/// A set of distinct values kept in the total value order.
#[derive(Clone, Debug)]
pub struct Set {
    root: Arc<Node>,
}

impl Set {
    pub fn new() -> Self {
        Self::from_root(Arc::new(Node::empty(SeqKind::Set)))
    }

    pub(crate) fn from_root(root: Arc<Node>) -> Self {
        Self { root }
    }

    /// Build a set from `values` in any order; duplicates collapse.
    pub fn from_values(vs: &ValueStore, values: impl IntoIterator<Item = Value>) -> ValueResult<Self> {
        let sorted: BTreeSet<Value> = values.into_iter().collect();
        let items = sorted.into_iter().map(Item::Value).collect();
        Ok(Self::from_root(sequence::build(vs, SeqKind::Set, items)?))
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

    pub fn level(&self) -> u64 {
        self.root.level()
    }

    pub fn has(&self, vs: &ValueStore, value: &Value) -> ValueResult<bool> {
        Ok(sequence::find(vs, &self.root, value)?.1.is_some())
    }

    /// Smallest element.
    pub fn first(&self, vs: &ValueStore) -> ValueResult<Option<Value>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.at(vs, 0).map(Some)
    }

    /// Largest element.
    pub fn last(&self, vs: &ValueStore) -> ValueResult<Option<Value>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.at(vs, self.len() - 1).map(Some)
    }

    /// The element at position `index` in sorted order.
    pub fn at(&self, vs: &ValueStore, index: u64) -> ValueResult<Value> {
        if index >= self.len() {
            return Err(ValueError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        match sequence::get_at(vs, &self.root, index)? {
            Item::Value(v) => Ok(v),
            _ => Err(ValueError::malformed("set leaf holds a non-value entry")),
        }
    }

    pub fn iter(&self, vs: &ValueStore) -> ValueResult<SetIter> {
        Ok(SetIter {
            cursor: LevelCursor::seek(vs, &self.root, 0, 0)?,
        })
    }

    pub fn edit(&self) -> SetEditor {
        SetEditor::new(self.clone())
    }
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Set {}

/// Iterator over set elements in order.
pub struct SetIter {
    cursor: LevelCursor,
}

impl Iterator for SetIter {
    type Item = ValueResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next() {
            Ok(Some(c)) => match c.item {
                Item::Value(v) => Some(Ok(v)),
                _ => Some(Err(ValueError::malformed("set leaf holds a non-value entry"))),
            },
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
