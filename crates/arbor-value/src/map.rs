use std::collections::BTreeMap;
use std::sync::Arc;

use arbor_types::Hash;

use crate::editor::MapEditor;
use crate::error::{ValueError, ValueResult};
use crate::sequence::{self, Item, LevelCursor, Node, SeqKind};
use crate::store::ValueStore;
use crate::value::Value;

/// A map with keys kept in the total value order.
#[derive(Clone, Debug)]
pub struct Map {
    root: Arc<Node>,
}

impl Map {
    pub fn new() -> Self {
        Self::from_root(Arc::new(Node::empty(SeqKind::Map)))
    }

    pub(crate) fn from_root(root: Arc<Node>) -> Self {
        Self { root }
    }

    /// Build a map from `entries`; a repeated key keeps its last value.
    pub fn from_entries(
        vs: &ValueStore,
        entries: impl IntoIterator<Item = (Value, Value)>,
    ) -> ValueResult<Self> {
        let sorted: BTreeMap<Value, Value> = entries.into_iter().collect();
        let items = sorted.into_iter().map(|(k, v)| Item::Entry(k, v)).collect();
        Ok(Self::from_root(sequence::build(vs, SeqKind::Map, items)?))
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

    pub fn get(&self, vs: &ValueStore, key: &Value) -> ValueResult<Option<Value>> {
        match sequence::find(vs, &self.root, key)?.1 {
            Some(Item::Entry(_, v)) => Ok(Some(v)),
            Some(_) => Err(ValueError::malformed("map leaf holds a non-entry item")),
            None => Ok(None),
        }
    }

    pub fn has(&self, vs: &ValueStore, key: &Value) -> ValueResult<bool> {
        Ok(sequence::find(vs, &self.root, key)?.1.is_some())
    }

    /// Entry with the smallest key.
    pub fn first(&self, vs: &ValueStore) -> ValueResult<Option<(Value, Value)>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.entry_at(vs, 0).map(Some)
    }

    /// Entry with the largest key.
    pub fn last(&self, vs: &ValueStore) -> ValueResult<Option<(Value, Value)>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.entry_at(vs, self.len() - 1).map(Some)
    }

    fn entry_at(&self, vs: &ValueStore, index: u64) -> ValueResult<(Value, Value)> {
        into_entry(sequence::get_at(vs, &self.root, index)?)
    }

    /// Iterate entries in key order.
    pub fn iter(&self, vs: &ValueStore) -> ValueResult<MapIter> {
        Ok(MapIter {
            cursor: LevelCursor::seek(vs, &self.root, 0, 0)?,
        })
    }

    /// Iterate keys in order.
    pub fn keys(&self, vs: &ValueStore) -> ValueResult<impl Iterator<Item = ValueResult<Value>>> {
        Ok(self.iter(vs)?.map(|entry| entry.map(|(k, _)| k)))
    }

    pub fn edit(&self) -> MapEditor {
        MapEditor::new(self.clone())
    }
}

fn into_entry(item: Item) -> ValueResult<(Value, Value)> {
    match item {
        Item::Entry(k, v) => Ok((k, v)),
        _ => Err(ValueError::malformed("map leaf holds a non-entry item")),
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Map {}

/// Iterator over map entries in key order.
pub struct MapIter {
    cursor: LevelCursor,
}

impl Iterator for MapIter {
    type Item = ValueResult<(Value, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next() {
            Ok(Some(c)) => Some(into_entry(c.item)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
