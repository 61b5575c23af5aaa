//! Total order over values.
//!
//! Primitives sort first, ranked by kind and then by value. Every other value
//! sorts after all primitives by the bytes of its hash. Set elements and map
//! keys are kept in this order, and meta nodes of set and map trees carry the
//! [`OrderedKey`] of the last key in their subtree.

use std::cmp::Ordering;

use arbor_types::Hash;

use crate::value::{canonical_float, Value};

/// A value reduced to what the total order needs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OrderedKey {
    /// A primitive value, compared by value.
    Primitive(Value),
    /// Hash of a non-primitive value.
    Digest(Hash),
}

impl OrderedKey {
    pub fn of(value: &Value) -> Self {
        if value.kind().is_primitive() {
            Self::Primitive(value.clone())
        } else {
            Self::Digest(value.hash())
        }
    }

    /// Compare this key against a value without building the value's key.
    pub fn cmp_value(&self, value: &Value) -> Ordering {
        match self {
            Self::Primitive(p) => compare_values(p, value),
            Self::Digest(h) => {
                if value.kind().is_primitive() {
                    Ordering::Greater
                } else {
                    h.cmp(&value.hash())
                }
            }
        }
    }
}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => compare_primitives(a, b),
            (Self::Primitive(_), Self::Digest(_)) => Ordering::Less,
            (Self::Digest(_), Self::Primitive(_)) => Ordering::Greater,
            (Self::Digest(a), Self::Digest(b)) => a.cmp(b),
        }
    }
}

/// The total value order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.kind().is_primitive(), b.kind().is_primitive()) {
        (true, true) => compare_primitives(a, b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.hash().cmp(&b.hash()),
    }
}

fn compare_primitives(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => canonical_float(*x).total_cmp(&canonical_float(*y)),
        (Value::String(x), Value::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        _ => a.kind().cmp(&b.kind()),
    }
}
