//! Batch mutators for collections.
//!
//! An editor stages edits against a base collection and applies all of them
//! in one pass when materialized. The base is never modified. After a
//! successful materialize the editor is spent and every further call returns
//! [`ValueError::EditorFinalized`]; a failed materialize leaves it usable.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ValueError, ValueResult};
use crate::list::List;
use crate::map::Map;
use crate::sequence::{self, Item, Splice};
use crate::set::Set;
use crate::store::ValueStore;
use crate::value::Value;

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Pending replacement of `removed` base elements at base offset `at`.
#[derive(Debug)]
struct ListSplice {
    at: u64,
    removed: u64,
    inserted: Vec<Value>,
}

impl ListSplice {
    fn delta(&self) -> i64 {
        self.inserted.len() as i64 - self.removed as i64
    }
}

/// Positional edits against a [`List`].
///
/// Positions always refer to the list as edited so far. Edits are kept as
/// sorted, disjoint splices over the base list.
#[derive(Debug)]
pub struct ListEditor {
    base: List,
    splices: Vec<ListSplice>,
    len: u64,
    finalized: bool,
}

impl ListEditor {
    pub fn new(base: List) -> Self {
        Self {
            len: base.len(),
            base,
            splices: Vec::new(),
            finalized: false,
        }
    }

    /// Length of the list with the staged edits applied.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, value: impl Into<Value>) -> ValueResult<&mut Self> {
        let at = self.len;
        self.insert(at, value)
    }

    /// Insert before position `index`; `index == len()` appends.
    pub fn insert(&mut self, index: u64, value: impl Into<Value>) -> ValueResult<&mut Self> {
        self.check_open()?;
        if index > self.len {
            return Err(ValueError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let value = value.into();
        let mut delta = 0i64;
        let mut slot = self.splices.len();
        for (i, s) in self.splices.iter_mut().enumerate() {
            let begin = (s.at as i64 + delta) as u64;
            if index < begin {
                slot = i;
                break;
            }
            if index <= begin + s.inserted.len() as u64 {
                s.inserted.insert((index - begin) as usize, value);
                self.len += 1;
                return Ok(self);
            }
            delta += s.delta();
        }
        self.splices.insert(
            slot,
            ListSplice {
                at: (index as i64 - delta) as u64,
                removed: 0,
                inserted: vec![value],
            },
        );
        self.len += 1;
        Ok(self)
    }

    /// Remove the element at `index`.
    pub fn remove(&mut self, index: u64) -> ValueResult<&mut Self> {
        self.check_open()?;
        if index >= self.len {
            return Err(ValueError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let mut delta = 0i64;
        let mut slot = self.splices.len();
        for (i, s) in self.splices.iter_mut().enumerate() {
            let begin = (s.at as i64 + delta) as u64;
            if index < begin {
                slot = i;
                break;
            }
            if index < begin + s.inserted.len() as u64 {
                s.inserted.remove((index - begin) as usize);
                self.len -= 1;
                self.normalize();
                return Ok(self);
            }
            delta += s.delta();
        }
        self.splices.insert(
            slot,
            ListSplice {
                at: (index as i64 - delta) as u64,
                removed: 1,
                inserted: Vec::new(),
            },
        );
        self.len -= 1;
        self.normalize();
        Ok(self)
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: u64, value: impl Into<Value>) -> ValueResult<&mut Self> {
        self.check_open()?;
        if index >= self.len {
            return Err(ValueError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        self.remove(index)?;
        self.insert(index, value)
    }

    /// Apply every staged edit and return the new list.
    pub fn materialize(&mut self, vs: &ValueStore) -> ValueResult<List> {
        self.check_open()?;
        let splices: Vec<Splice> = self
            .splices
            .iter()
            .map(|s| Splice {
                start: s.at,
                removed: s.removed,
                inserted: s.inserted.iter().cloned().map(Item::Value).collect(),
            })
            .collect();
        let count = splices.len();
        let root = sequence::apply(vs, self.base.root(), splices)?;
        self.finalized = true;
        let list = List::from_root(root);
        debug!(splices = count, len = list.len(), level = list.level(), "list materialized");
        Ok(list)
    }

    fn check_open(&self) -> ValueResult<()> {
        if self.finalized {
            Err(ValueError::EditorFinalized)
        } else {
            Ok(())
        }
    }

    /// Merge splices that touch in base coordinates and drop empty ones.
    fn normalize(&mut self) {
        let mut merged: Vec<ListSplice> = Vec::with_capacity(self.splices.len());
        for s in self.splices.drain(..) {
            if s.removed == 0 && s.inserted.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(prev) if prev.at + prev.removed == s.at => {
                    prev.removed += s.removed;
                    prev.inserted.extend(s.inserted);
                }
                _ => merged.push(s),
            }
        }
        self.splices = merged;
    }
}

// ---------------------------------------------------------------------------
// Set
// ---------------------------------------------------------------------------

/// Membership edits against a [`Set`]. The last edit of an element wins.
#[derive(Debug)]
pub struct SetEditor {
    base: Set,
    edits: BTreeMap<Value, bool>,
    finalized: bool,
}

impl SetEditor {
    pub fn new(base: Set) -> Self {
        Self {
            base,
            edits: BTreeMap::new(),
            finalized: false,
        }
    }

    pub fn insert(&mut self, value: impl Into<Value>) -> ValueResult<&mut Self> {
        self.check_open()?;
        self.edits.insert(value.into(), true);
        Ok(self)
    }

    pub fn remove(&mut self, value: impl Into<Value>) -> ValueResult<&mut Self> {
        self.check_open()?;
        self.edits.insert(value.into(), false);
        Ok(self)
    }

    pub fn materialize(&mut self, vs: &ValueStore) -> ValueResult<Set> {
        self.check_open()?;
        let mut splices = Vec::new();
        for (value, present) in &self.edits {
            let (at, found) = sequence::find(vs, self.base.root(), value)?;
            match (present, found) {
                (true, None) => splices.push(Splice {
                    start: at,
                    removed: 0,
                    inserted: vec![Item::Value(value.clone())],
                }),
                (false, Some(_)) => splices.push(Splice {
                    start: at,
                    removed: 1,
                    inserted: Vec::new(),
                }),
                _ => {}
            }
        }
        let count = splices.len();
        let root = sequence::apply(vs, self.base.root(), splices)?;
        self.finalized = true;
        let set = Set::from_root(root);
        debug!(splices = count, len = set.len(), "set materialized");
        Ok(set)
    }

    fn check_open(&self) -> ValueResult<()> {
        if self.finalized {
            Err(ValueError::EditorFinalized)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Key edits against a [`Map`]. The last edit of a key wins.
#[derive(Debug)]
pub struct MapEditor {
    base: Map,
    edits: BTreeMap<Value, Option<Value>>,
    finalized: bool,
}

impl MapEditor {
    pub fn new(base: Map) -> Self {
        Self {
            base,
            edits: BTreeMap::new(),
            finalized: false,
        }
    }

    pub fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> ValueResult<&mut Self> {
        self.check_open()?;
        self.edits.insert(key.into(), Some(value.into()));
        Ok(self)
    }

    pub fn remove(&mut self, key: impl Into<Value>) -> ValueResult<&mut Self> {
        self.check_open()?;
        self.edits.insert(key.into(), None);
        Ok(self)
    }

    pub fn materialize(&mut self, vs: &ValueStore) -> ValueResult<Map> {
        self.check_open()?;
        let mut splices = Vec::new();
        for (key, edit) in &self.edits {
            let (at, found) = sequence::find(vs, self.base.root(), key)?;
            match (edit, found) {
                (Some(value), Some(Item::Entry(_, old))) if old == *value => {}
                (Some(value), found) => splices.push(Splice {
                    start: at,
                    removed: u64::from(found.is_some()),
                    inserted: vec![Item::Entry(key.clone(), value.clone())],
                }),
                (None, Some(_)) => splices.push(Splice {
                    start: at,
                    removed: 1,
                    inserted: Vec::new(),
                }),
                (None, None) => {}
            }
        }
        let count = splices.len();
        let root = sequence::apply(vs, self.base.root(), splices)?;
        self.finalized = true;
        let map = Map::from_root(root);
        debug!(splices = count, len = map.len(), "map materialized");
        Ok(map)
    }

    fn check_open(&self) -> ValueResult<()> {
        if self.finalized {
            Err(ValueError::EditorFinalized)
        } else {
            Ok(())
        }
    }
}
