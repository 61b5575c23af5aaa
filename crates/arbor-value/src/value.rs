use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use arbor_crypto::ContentHasher;
use arbor_types::Hash;

use crate::codec;
use crate::error::{ValueError, ValueResult};
use crate::key;
use crate::list::List;
use crate::map::Map;
use crate::reference::Ref;
use crate::set::Set;
use crate::types::{StructType, TypeDesc};

/// The kind tag of a [`Value`]. The discriminant is the wire tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Null = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Bytes = 5,
    Ref = 6,
    List = 7,
    Set = 8,
    Map = 9,
    Struct = 10,
}

impl ValueKind {
    /// Wire tag for this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Null,
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::String,
            5 => Self::Bytes,
            6 => Self::Ref,
            7 => Self::List,
            8 => Self::Set,
            9 => Self::Map,
            10 => Self::Struct,
            _ => return None,
        })
    }

    /// Primitives are ordered by value; everything else by hash.
    pub fn is_primitive(self) -> bool {
        self.tag() <= Self::Bytes.tag()
    }

    /// Collections are chunked into trees.
    pub fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Ref => "ref",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Struct => "struct",
        };
        f.write_str(name)
    }
}

/// An immutable, canonically encodable value.
///
/// Two values are equal iff their canonical encodings are identical. Floats
/// are canonicalized first, so `-0.0 == 0.0` and all NaNs are equal to each
/// other.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Ref(Ref),
    List(List),
    Set(Set),
    Map(Map),
    Struct(Struct),
}

/// Map `-0.0` to `0.0` and every NaN to the one canonical NaN.
pub fn canonical_float(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Ref(_) => ValueKind::Ref,
            Self::List(_) => ValueKind::List,
            Self::Set(_) => ValueKind::Set,
            Self::Map(_) => ValueKind::Map,
            Self::Struct(_) => ValueKind::Struct,
        }
    }

    /// Hash of the canonical encoding. Memoized for collections.
    pub fn hash(&self) -> Hash {
        match self {
            Self::List(l) => l.hash(),
            Self::Set(s) => s.hash(),
            Self::Map(m) => m.hash(),
            other => ContentHasher::CHUNK.hash(&codec::encode_value(other)),
        }
    }

    /// Declared type of this value.
    pub fn type_desc(&self) -> TypeDesc {
        match self {
            Self::Null => TypeDesc::Null,
            Self::Bool(_) => TypeDesc::Bool,
            Self::Int(_) => TypeDesc::Int,
            Self::Float(_) => TypeDesc::Float,
            Self::String(_) => TypeDesc::String,
            Self::Bytes(_) => TypeDesc::Bytes,
            Self::Ref(r) => TypeDesc::Ref(Box::new(r.target_type().clone())),
            Self::List(l) => l.root().type_desc(),
            Self::Set(s) => s.root().type_desc(),
            Self::Map(m) => m.root().type_desc(),
            Self::Struct(s) => TypeDesc::Struct(StructType::new(
                s.name.clone(),
                s.fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.type_desc())),
            )),
        }
    }

    /// Every Ref present in this value's own encoding, in order of first
    /// appearance. Does not dereference anything.
    pub fn direct_refs(&self) -> Vec<Ref> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        dedup_refs(out)
    }

    pub(crate) fn collect_refs(&self, out: &mut Vec<Ref>) {
        match self {
            Self::Ref(r) => out.push(r.clone()),
            Self::List(l) => l.root().collect_refs(out),
            Self::Set(s) => s.root().collect_refs(out),
            Self::Map(m) => m.root().collect_refs(out),
            Self::Struct(s) => s.fields.values().for_each(|v| v.collect_refs(out)),
            _ => {}
        }
    }

    /// Maximum height among the Refs directly in this value; 0 when it holds
    /// none.
    pub fn height(&self) -> u64 {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs.iter().map(Ref::height).max().unwrap_or(0)
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_bool(&self) -> ValueResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_int(&self) -> ValueResult<i64> {
        match self {
            Self::Int(i) => Ok(*i),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    pub fn as_float(&self) -> ValueResult<f64> {
        match self {
            Self::Float(f) => Ok(*f),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_str(&self) -> ValueResult<&str> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    pub fn as_bytes(&self) -> ValueResult<&[u8]> {
        match self {
            Self::Bytes(b) => Ok(b),
            other => Err(other.mismatch(ValueKind::Bytes)),
        }
    }

    pub fn as_reference(&self) -> ValueResult<&Ref> {
        match self {
            Self::Ref(r) => Ok(r),
            other => Err(other.mismatch(ValueKind::Ref)),
        }
    }

    pub fn as_list(&self) -> ValueResult<&List> {
        match self {
            Self::List(l) => Ok(l),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    pub fn as_set(&self) -> ValueResult<&Set> {
        match self {
            Self::Set(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Set)),
        }
    }

    pub fn as_map(&self) -> ValueResult<&Map> {
        match self {
            Self::Map(m) => Ok(m),
            other => Err(other.mismatch(ValueKind::Map)),
        }
    }

    pub fn as_struct(&self) -> ValueResult<&Struct> {
        match self {
            Self::Struct(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Struct)),
        }
    }
}

fn dedup_refs(refs: Vec<Ref>) -> Vec<Ref> {
    let mut seen = std::collections::HashSet::new();
    refs.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                canonical_float(*a).to_bits() == canonical_float(*b).to_bits()
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The total value order used by sets and maps.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        key::compare_values(self, other)
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => canonical_float(*f).to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            other => Value::hash(other).hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Self::List(l)
    }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Self::Set(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Self::Struct(s)
    }
}

/// A named record. Fields are kept sorted by name and stored inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Struct {
    name: String,
    fields: BTreeMap<String, Value>,
}

impl Struct {
    /// Build a struct; a repeated field name keeps the last value.
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub(crate) fn from_sorted(name: String, fields: BTreeMap<String, Value>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A copy with one field replaced or added.
    pub fn with_field(&self, field: impl Into<String>, value: Value) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(field.into(), value);
        Self {
            name: self.name.clone(),
            fields,
        }
    }
}
