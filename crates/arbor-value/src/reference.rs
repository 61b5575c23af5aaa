use std::fmt;

use arbor_types::Hash;

use crate::types::TypeDesc;
use crate::value::Value;

/// Typed pointer to a stored value.
///
/// A `Ref` carries the target's hash, its height, and its type, so walkers
/// can reason about a subgraph without loading it. Height is one more than
/// the largest height among the refs directly inside the target, so a ref to
/// a value holding no refs has height 1. A ref value records the target's
/// type in [`TypeDesc::ref_target`] form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ref {
    target: Hash,
    height: u64,
    target_type: TypeDesc,
}

impl Ref {
    pub fn new(target: Hash, height: u64, target_type: TypeDesc) -> Self {
        Self {
            target,
            height,
            target_type: target_type.ref_target(),
        }
    }

    /// Pointer from a meta tuple to a child node. The node's type is kept
    /// whole, so a collection's type does not depend on its tree shape.
    pub(crate) fn to_node(target: Hash, height: u64, node_type: TypeDesc) -> Self {
        Self {
            target,
            height,
            target_type: node_type,
        }
    }

    /// The ref that [`ValueStore::write_value`](crate::ValueStore::write_value)
    /// returns for `value`.
    pub fn of(value: &Value) -> Self {
        Self::new(value.hash(), value.height() + 1, value.type_desc())
    }

    pub fn target_hash(&self) -> Hash {
        self.target
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn target_type(&self) -> &TypeDesc {
        &self.target_type
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.target.to_hex())
    }
}
