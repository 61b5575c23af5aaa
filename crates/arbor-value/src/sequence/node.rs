use std::sync::OnceLock;

use arbor_crypto::ContentHasher;
use arbor_types::Hash;

use crate::codec;
use crate::key::OrderedKey;
use crate::reference::Ref;
use crate::types::TypeDesc;
use crate::value::{Value, ValueKind};

/// Which collection a tree belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeqKind {
    List,
    Set,
    Map,
}

impl SeqKind {
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::List => ValueKind::List,
            Self::Set => ValueKind::Set,
            Self::Map => ValueKind::Map,
        }
    }

    /// Set and map trees are ordered and carry boundary keys.
    pub fn is_ordered(self) -> bool {
        !matches!(self, Self::List)
    }
}

/// Pointer from a meta node to one child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaTuple {
    pub child: Ref,
    /// Largest key in the child subtree; `None` for lists.
    pub key: Option<OrderedKey>,
    /// Leaf entries in the child subtree.
    pub num_leaves: u64,
}

/// One entry of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    /// List or set element.
    Value(Value),
    /// Map entry.
    Entry(Value, Value),
    /// Child pointer of a meta node.
    Tuple(MetaTuple),
}

impl Item {
    /// Number of leaf entries this item stands for.
    pub fn leaf_span(&self) -> u64 {
        match self {
            Self::Tuple(t) => t.num_leaves,
            _ => 1,
        }
    }

    /// The ordering key of a leaf entry (set element or map key).
    pub fn leaf_key(&self) -> Option<&Value> {
        match self {
            Self::Value(v) | Self::Entry(v, _) => Some(v),
            Self::Tuple(_) => None,
        }
    }

    pub(crate) fn collect_refs(&self, out: &mut Vec<Ref>) {
        match self {
            Self::Value(v) => v.collect_refs(out),
            Self::Entry(k, v) => {
                k.collect_refs(out);
                v.collect_refs(out);
            }
            Self::Tuple(t) => out.push(t.child.clone()),
        }
    }
}

/// An immutable tree node. Level 0 is a leaf.
#[derive(Debug)]
pub struct Node {
    kind: SeqKind,
    level: u64,
    items: Vec<Item>,
    hash: OnceLock<Hash>,
}

impl Node {
    pub fn new(kind: SeqKind, level: u64, items: Vec<Item>) -> Self {
        Self {
            kind,
            level,
            items,
            hash: OnceLock::new(),
        }
    }

    pub fn empty(kind: SeqKind) -> Self {
        Self::new(kind, 0, Vec::new())
    }

    pub fn kind(&self) -> SeqKind {
        self.kind
    }

    pub fn level(&self) -> u64 {
        self.level
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Leaf entries under this node.
    pub fn num_leaves(&self) -> u64 {
        self.items.iter().map(Item::leaf_span).sum()
    }

    /// Hash of this node's encoding, computed once.
    pub fn hash(&self) -> Hash {
        *self
            .hash
            .get_or_init(|| ContentHasher::CHUNK.hash(&codec::encode_node(self)))
    }

    /// Record a hash already known to match this node's encoding.
    pub(crate) fn prime_hash(&self, hash: Hash) {
        let _ = self.hash.set(hash);
    }

    /// Largest leaf key under this node.
    pub fn last_key(&self) -> Option<OrderedKey> {
        match self.items.last()? {
            Item::Tuple(t) => t.key.clone(),
            item => item.leaf_key().map(OrderedKey::of),
        }
    }

    /// The meta tuple a parent uses to point at this node.
    pub fn to_tuple(&self) -> MetaTuple {
        MetaTuple {
            child: Ref::to_node(self.hash(), self.height() + 1, self.type_desc()),
            key: if self.kind.is_ordered() {
                self.last_key()
            } else {
                None
            },
            num_leaves: self.num_leaves(),
        }
    }

    /// Type of the collection this node roots.
    pub fn type_desc(&self) -> TypeDesc {
        if !self.is_leaf() {
            return TypeDesc::union(self.items.iter().filter_map(|item| match item {
                Item::Tuple(t) => Some(t.child.target_type().clone()),
                _ => None,
            }));
        }
        match self.kind {
            SeqKind::List => TypeDesc::List(Box::new(self.element_type())),
            SeqKind::Set => TypeDesc::Set(Box::new(self.element_type())),
            SeqKind::Map => {
                let keys = TypeDesc::union(self.items.iter().filter_map(|item| match item {
                    Item::Entry(k, _) => Some(k.type_desc()),
                    _ => None,
                }));
                let values = TypeDesc::union(self.items.iter().filter_map(|item| match item {
                    Item::Entry(_, v) => Some(v.type_desc()),
                    _ => None,
                }));
                TypeDesc::Map(Box::new(keys), Box::new(values))
            }
        }
    }

    fn element_type(&self) -> TypeDesc {
        TypeDesc::union(self.items.iter().filter_map(|item| match item {
            Item::Value(v) => Some(v.type_desc()),
            _ => None,
        }))
    }

    pub(crate) fn collect_refs(&self, out: &mut Vec<Ref>) {
        self.items.iter().for_each(|item| item.collect_refs(out));
    }

    /// Largest height among refs in this node's own encoding.
    pub fn height(&self) -> u64 {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs.iter().map(Ref::height).max().unwrap_or(0)
    }
}
