use std::fmt;
use std::sync::Arc;

use arbor_crypto::ContentHasher;
use arbor_store::{Chunk, ChunkStore, InMemoryChunkStore, StoreError};
use arbor_types::Hash;
use tracing::{debug, warn};

use crate::cache::DecodeCache;
use crate::codec;
use crate::config::ValueStoreConfig;
use crate::error::{ValueError, ValueResult};
use crate::list::List;
use crate::map::Map;
use crate::reference::Ref;
use crate::sequence::{Node, SeqKind};
use crate::set::Set;
use crate::value::Value;

/// Reads and writes values through a chunk store.
///
/// Writes encode the value, name it by hash, and store it once. Reads fetch
/// the chunk, check its hash, and decode it, keeping decoded chunks in a
/// bounded cache. Cloning the handle shares the store and the cache.
#[derive(Clone)]
pub struct ValueStore {
    inner: Arc<Inner>,
}

struct Inner {
    chunks: Arc<dyn ChunkStore>,
    cache: DecodeCache,
    config: ValueStoreConfig,
}

impl ValueStore {
    pub fn new(chunks: Arc<dyn ChunkStore>) -> Self {
        Self::with_config(chunks, ValueStoreConfig::default())
    }

    pub fn with_config(chunks: Arc<dyn ChunkStore>, config: ValueStoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: DecodeCache::new(config.cache_capacity),
                chunks,
                config,
            }),
        }
    }

    /// A store over a fresh [`InMemoryChunkStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryChunkStore::new()))
    }

    pub fn config(&self) -> &ValueStoreConfig {
        &self.inner.config
    }

    pub fn chunk_store(&self) -> &Arc<dyn ChunkStore> {
        &self.inner.chunks
    }

    /// Number of decoded values currently cached.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Persist `value` and return a ref to it. Writing a value that is
    /// already stored changes nothing; one nested past
    /// [`codec::MAX_DEPTH`] is refused with [`ValueError::TooDeep`].
    pub fn write_value(&self, value: &Value) -> ValueResult<Ref> {
        codec::check_value_depth(value)?;
        let data = codec::encode_value(value);
        let hash = ContentHasher::CHUNK.hash(&data);
        self.put_chunk(hash, data)?;
        self.inner.cache.insert(hash, value.clone());
        Ok(Ref::new(hash, value.height() + 1, value.type_desc()))
    }

    pub fn read_value(&self, r: &Ref) -> ValueResult<Value> {
        self.read_hash(&r.target_hash())
    }

    /// Read the value stored under `hash`; [`ValueError::DanglingRef`] when
    /// the store has no such chunk.
    pub fn read_hash(&self, hash: &Hash) -> ValueResult<Value> {
        self.find_hash(hash)?.ok_or(ValueError::DanglingRef(*hash))
    }

    /// Like [`read_hash`](Self::read_hash), but absence is `Ok(None)`.
    pub fn find_hash(&self, hash: &Hash) -> ValueResult<Option<Value>> {
        if let Some(value) = self.inner.cache.get(hash) {
            return Ok(Some(value));
        }
        let chunk = match self.inner.chunks.get(hash) {
            Ok(Some(chunk)) => chunk,
            Ok(None) => return Ok(None),
            Err(StoreError::HashMismatch { expected, computed }) => {
                return Err(ValueError::malformed(format!(
                    "chunk {expected} hashes to {computed}"
                )))
            }
            Err(e) => return Err(e.into()),
        };
        let computed = ContentHasher::CHUNK.hash(chunk.data());
        if computed != *hash {
            warn!(chunk = %hash.short_hex(), computed = %computed.short_hex(), "chunk failed hash verification");
            return Err(ValueError::malformed(format!(
                "chunk {hash} hashes to {computed}"
            )));
        }
        let value = codec::decode_value(chunk.data())?;
        match &value {
            Value::List(l) => l.root().prime_hash(*hash),
            Value::Set(s) => s.root().prime_hash(*hash),
            Value::Map(m) => m.root().prime_hash(*hash),
            _ => {}
        }
        debug!(chunk = %hash.short_hex(), kind = %value.kind(), len = chunk.len(), "decoded chunk");
        self.inner.cache.insert(*hash, value.clone());
        Ok(Some(value))
    }

    /// Refs held directly in `value`'s chunk. Nothing is loaded.
    pub fn direct_children(&self, value: &Value) -> Vec<Ref> {
        value.direct_refs()
    }

    /// Encoded size of the chunk stored under `hash`.
    pub fn chunk_size(&self, hash: &Hash) -> ValueResult<Option<usize>> {
        Ok(self.inner.chunks.get(hash)?.map(|chunk| chunk.len()))
    }

    /// Persist a non-root tree node.
    pub(crate) fn write_node(&self, node: &Arc<Node>) -> ValueResult<()> {
        self.write_nodes(std::slice::from_ref(node))
    }

    /// Persist non-root tree nodes with one batched store write. Nodes
    /// already stored are skipped.
    pub(crate) fn write_nodes(&self, nodes: &[Arc<Node>]) -> ValueResult<()> {
        let mut batch = Vec::new();
        let mut written = Vec::new();
        for node in nodes {
            let hash = node.hash();
            if self.inner.chunks.has(&hash)? {
                continue;
            }
            codec::check_node_depth(node)?;
            batch.push(Chunk::with_hash(hash, codec::encode_node(node)));
            written.push(node);
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.inner.chunks.put_many(&batch)?;
        let len: usize = batch.iter().map(Chunk::len).sum();
        debug!(nodes = batch.len(), len, "nodes stored");
        for node in written {
            let value = match node.kind() {
                SeqKind::List => Value::List(List::from_root(Arc::clone(node))),
                SeqKind::Set => Value::Set(Set::from_root(Arc::clone(node))),
                SeqKind::Map => Value::Map(Map::from_root(Arc::clone(node))),
            };
            self.inner.cache.insert(node.hash(), value);
        }
        Ok(())
    }

    /// Load the tree node a meta tuple points at.
    pub(crate) fn read_node(&self, r: &Ref, kind: SeqKind) -> ValueResult<Arc<Node>> {
        let node = match (kind, self.read_value(r)?) {
            (SeqKind::List, Value::List(l)) => Arc::clone(l.root()),
            (SeqKind::Set, Value::Set(s)) => Arc::clone(s.root()),
            (SeqKind::Map, Value::Map(m)) => Arc::clone(m.root()),
            (_, other) => {
                return Err(ValueError::malformed(format!(
                    "expected a {} node at {r}, found {}",
                    kind.value_kind(),
                    other.kind()
                )))
            }
        };
        Ok(node)
    }

    fn put_chunk(&self, hash: Hash, data: Vec<u8>) -> ValueResult<()> {
        if self.inner.chunks.has(&hash)? {
            return Ok(());
        }
        let len = data.len();
        self.inner.chunks.put(&Chunk::with_hash(hash, data))?;
        debug!(chunk = %hash.short_hex(), len, "chunk stored");
        Ok(())
    }
}

impl fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStore")
            .field("config", &self.inner.config)
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arbor_store::StoreResult;

    use crate::config::ChunkerConfig;
    use crate::types::TypeDesc;
    use crate::value::Struct;

    /// Counts puts that reach the backend.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryChunkStore,
        puts: AtomicUsize,
    }

    impl ChunkStore for CountingStore {
        fn get(&self, hash: &Hash) -> StoreResult<Option<Chunk>> {
            self.inner.get(hash)
        }

        fn put(&self, chunk: &Chunk) -> StoreResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(chunk)
        }

        fn has(&self, hash: &Hash) -> StoreResult<bool> {
            self.inner.has(hash)
        }
    }

    fn fine_config() -> ValueStoreConfig {
        ValueStoreConfig {
            chunker: ChunkerConfig::fine(),
            ..Default::default()
        }
    }

    fn memory_store() -> (Arc<InMemoryChunkStore>, ValueStore) {
        let chunks = Arc::new(InMemoryChunkStore::new());
        let vs = ValueStore::with_config(chunks.clone(), fine_config());
        (chunks, vs)
    }

    // -----------------------------------------------------------------------
    // Write / read
    // -----------------------------------------------------------------------

    #[test]
    fn write_then_read_primitive() {
        let (_chunks, vs) = memory_store();
        let r = vs.write_value(&Value::from("hello")).unwrap();
        assert_eq!(r.height(), 1);
        assert_eq!(r.target_type(), &TypeDesc::String);
        assert_eq!(vs.read_value(&r).unwrap(), Value::from("hello"));
    }

    #[test]
    fn write_returns_ref_of() {
        let (_chunks, vs) = memory_store();
        let v = Value::Struct(Struct::new("S", [("n", Value::Int(1))]));
        assert_eq!(vs.write_value(&v).unwrap(), Ref::of(&v));
    }

    #[test]
    fn writes_are_idempotent() {
        let backend = Arc::new(CountingStore::default());
        let vs = ValueStore::with_config(backend.clone(), fine_config());
        let list = List::from_values(&vs, (0..2000).map(Value::Int)).unwrap();
        let value = Value::List(list);

        let first = vs.write_value(&value).unwrap();
        let puts = backend.puts.load(Ordering::SeqCst);
        let chunks = backend.inner.len();

        let second = vs.write_value(&value).unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.puts.load(Ordering::SeqCst), puts);
        assert_eq!(backend.inner.len(), chunks);
    }

    #[test]
    fn read_from_cold_cache_decodes_from_chunks() {
        let (chunks, vs) = memory_store();
        let list = List::from_values(&vs, (0..1000).map(Value::Int)).unwrap();
        let r = vs.write_value(&Value::List(list.clone())).unwrap();

        let cold = ValueStore::with_config(chunks, fine_config());
        assert_eq!(cold.cache_len(), 0);
        let read = cold.read_value(&r).unwrap();
        assert_eq!(read.hash(), r.target_hash());
        assert_eq!(read.as_list().unwrap().to_vec(&cold).unwrap(), list.to_vec(&vs).unwrap());
        assert!(cold.cache_len() > 1);
    }

    #[test]
    fn find_hash_reports_absence() {
        let (_chunks, vs) = memory_store();
        assert!(vs.find_hash(&Hash::digest(b"nothing")).unwrap().is_none());
    }

    #[test]
    fn long_commit_chain_reads_back_cold() {
        let (chunks, vs) = memory_store();
        let mut parent = vs.write_value(&Value::Null).unwrap();
        let mut sizes = Vec::new();
        for n in 0..1200 {
            let commit = Value::Struct(Struct::new(
                "Commit",
                [("n", Value::Int(n)), ("parent", Value::Ref(parent.clone()))],
            ));
            let r = vs.write_value(&commit).unwrap();
            let cold = ValueStore::with_config(chunks.clone(), fine_config());
            assert_eq!(cold.read_value(&r).unwrap(), commit);
            sizes.push(vs.chunk_size(&r.target_hash()).unwrap().unwrap());
            parent = r;
        }
        assert_eq!(parent.height(), 1201);
        // the chunk size stays put once the parent type settles
        assert!(sizes[2..].iter().all(|len| *len <= sizes[2] + 8));

        let cold = ValueStore::with_config(chunks, fine_config());
        let mut walked = 0;
        let mut at = cold.read_value(&parent).unwrap();
        while let Value::Struct(commit) = at {
            walked += 1;
            let next = commit.get("parent").unwrap().as_reference().unwrap().clone();
            at = cold.read_value(&next).unwrap();
        }
        assert_eq!(walked, 1200);
        assert_eq!(at, Value::Null);
    }

    #[test]
    fn nesting_at_the_limit_round_trips() {
        let (chunks, vs) = memory_store();
        let mut v = Value::Int(0);
        for _ in 1..codec::MAX_DEPTH {
            v = Value::Struct(Struct::new("N", [("next", v)]));
        }
        let r = vs.write_value(&v).unwrap();
        let cold = ValueStore::with_config(chunks, fine_config());
        assert_eq!(cold.read_value(&r).unwrap(), v);
    }

    #[test]
    fn nesting_past_the_limit_is_refused() {
        let (chunks, vs) = memory_store();
        let mut v = Value::Int(0);
        for _ in 0..codec::MAX_DEPTH {
            v = Value::Struct(Struct::new("N", [("next", v)]));
        }
        let err = vs.write_value(&v).unwrap_err();
        assert!(matches!(
            err,
            ValueError::TooDeep { depth, limit } if depth == codec::MAX_DEPTH + 1 && limit == codec::MAX_DEPTH
        ));
        assert!(chunks.is_empty());
    }

    #[test]
    fn deep_list_items_are_refused_in_leaf_chunks() {
        let (_chunks, vs) = memory_store();
        let mut deep = Value::Int(0);
        for _ in 0..codec::MAX_DEPTH {
            deep = Value::Struct(Struct::new("N", [("next", deep)]));
        }
        let items = (0..2000).map(|i| if i == 0 { deep.clone() } else { Value::Int(i) });
        let err = List::from_values(&vs, items).unwrap_err();
        assert!(matches!(err, ValueError::TooDeep { .. }));
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[test]
    fn missing_chunk_is_dangling() {
        let (_chunks, vs) = memory_store();
        let r = Ref::of(&Value::Int(5));
        let err = vs.read_value(&r).unwrap_err();
        assert!(matches!(err, ValueError::DanglingRef(h) if h == r.target_hash()));
    }

    #[test]
    fn removed_child_chunk_is_dangling() {
        let (chunks, vs) = memory_store();
        let list = List::from_values(&vs, (0..1000).map(Value::Int)).unwrap();
        let child = Value::List(list.clone()).direct_refs()[0].clone();
        assert!(chunks.remove(&child.target_hash()));

        let cold = ValueStore::with_config(chunks, fine_config());
        let err = list.to_vec(&cold).unwrap_err();
        assert!(matches!(err, ValueError::DanglingRef(_)));
    }

    #[test]
    fn corrupt_chunk_is_malformed() {
        let (chunks, vs) = memory_store();
        let r = vs.write_value(&Value::from("pristine")).unwrap();
        chunks.corrupt(&r.target_hash(), b"garbage".to_vec());

        let cold = ValueStore::with_config(chunks, fine_config());
        let err = cold.read_value(&r).unwrap_err();
        assert!(matches!(err, ValueError::MalformedEncoding(_)));
    }

    #[test]
    fn truncated_encoding_is_malformed() {
        let (chunks, _vs) = memory_store();
        let data = codec::encode_value(&Value::from("truncate me"));
        let truncated = data[..data.len() - 3].to_vec();
        let chunk = Chunk::new(truncated);
        chunks.put(&chunk).unwrap();

        let vs = ValueStore::with_config(chunks, fine_config());
        let err = vs.read_hash(chunk.hash()).unwrap_err();
        assert!(matches!(err, ValueError::MalformedEncoding(_)));
    }

    #[test]
    fn wrong_node_kind_is_malformed() {
        let (_chunks, vs) = memory_store();
        let r = vs.write_value(&Value::Int(1)).unwrap();
        let err = vs.read_node(&r, SeqKind::List).unwrap_err();
        assert!(matches!(err, ValueError::MalformedEncoding(_)));
    }

    // -----------------------------------------------------------------------
    // Children and sizes
    // -----------------------------------------------------------------------

    #[test]
    fn direct_children_of_small_struct() {
        let (_chunks, vs) = memory_store();
        let a = vs.write_value(&Value::from("a")).unwrap();
        let b = vs.write_value(&Value::from("b")).unwrap();
        let s = Value::Struct(Struct::new(
            "Pair",
            [("left", Value::Ref(a.clone())), ("right", Value::Ref(b.clone()))],
        ));
        assert_eq!(vs.direct_children(&s), vec![a, b]);
    }

    #[test]
    fn direct_children_of_list_with_one_ref() {
        let (_chunks, vs) = memory_store();
        let r = vs.write_value(&Value::Bool(true)).unwrap();
        let list = List::from_values(&vs, [Value::Ref(r.clone())]).unwrap();
        let children = vs.direct_children(&Value::List(list));
        assert_eq!(children.len(), 1);
        assert_eq!(children, vec![r]);
    }

    #[test]
    fn chunk_size_matches_encoding() {
        let (_chunks, vs) = memory_store();
        let v = Value::Bytes(vec![7; 100]);
        let r = vs.write_value(&v).unwrap();
        assert_eq!(
            vs.chunk_size(&r.target_hash()).unwrap(),
            Some(codec::encode_value(&v).len())
        );
        assert_eq!(vs.chunk_size(&Hash::digest(b"absent")).unwrap(), None);
    }

    #[test]
    fn disabled_cache_still_reads() {
        let chunks = Arc::new(InMemoryChunkStore::new());
        let vs = ValueStore::with_config(
            chunks,
            ValueStoreConfig {
                cache_capacity: 0,
                ..fine_config()
            },
        );
        let r = vs.write_value(&Value::Int(9)).unwrap();
        assert_eq!(vs.read_value(&r).unwrap(), Value::Int(9));
        assert_eq!(vs.cache_len(), 0);
    }
}
