use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use arbor_types::Hash;

use crate::value::Value;

/// Bounded hash-to-value cache with first-in first-out eviction.
pub(crate) struct DecodeCache {
    capacity: usize,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Hash, Value>,
    order: VecDeque<Hash>,
}

impl DecodeCache {
    /// A cache holding at most `capacity` values. Zero disables it.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub(crate) fn get(&self, hash: &Hash) -> Option<Value> {
        let state = self.state.read().expect("lock poisoned");
        state.entries.get(hash).cloned()
    }

    pub(crate) fn insert(&self, hash: Hash, value: Value) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.write().expect("lock poisoned");
        if state.entries.contains_key(&hash) {
            return;
        }
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }
        state.entries.insert(hash, value);
        state.order.push_back(hash);
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: i64) -> (Hash, Value) {
        let v = Value::Int(i);
        (v.hash(), v)
    }

    #[test]
    fn get_after_insert() {
        let cache = DecodeCache::new(4);
        let (h, v) = entry(1);
        cache.insert(h, v.clone());
        assert_eq!(cache.get(&h), Some(v));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_oldest_first() {
        let cache = DecodeCache::new(2);
        let (h1, v1) = entry(1);
        let (h2, v2) = entry(2);
        let (h3, v3) = entry(3);
        cache.insert(h1, v1);
        cache.insert(h2, v2);
        cache.insert(h3, v3);
        assert!(cache.get(&h1).is_none());
        assert!(cache.get(&h2).is_some());
        assert!(cache.get(&h3).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinsert_is_a_no_op() {
        let cache = DecodeCache::new(2);
        let (h1, v1) = entry(1);
        cache.insert(h1, v1.clone());
        cache.insert(h1, v1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_disables() {
        let cache = DecodeCache::new(0);
        let (h, v) = entry(1);
        cache.insert(h, v);
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&h).is_none());
    }
}
