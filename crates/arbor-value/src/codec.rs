//! Canonical binary encoding.
//!
//! Every value has exactly one encoding, and decoding accepts exactly the
//! encodings the encoder produces. Integers are unsigned LEB128 varints in
//! minimal form; signed integers are zigzag mapped first.
//!
//! | Kind   | Tag | Payload                                          |
//! |--------|-----|--------------------------------------------------|
//! | Null   | 0   | none                                             |
//! | Bool   | 1   | one byte, 0 or 1                                 |
//! | Int    | 2   | zigzag varint                                    |
//! | Float  | 3   | 8-byte big-endian IEEE-754 bits, canonical       |
//! | String | 4   | varint length, UTF-8                             |
//! | Bytes  | 5   | varint length, bytes                             |
//! | Ref    | 6   | 32-byte hash, varint height, type descriptor     |
//! | List   | 7   | varint level, varint count, entries              |
//! | Set    | 8   | varint level, varint count, entries              |
//! | Map    | 9   | varint level, varint count, entries              |
//! | Struct | 10  | name, varint field count, (name, value) sorted   |
//!
//! Leaf entries are encoded values (map entries are key then value). Meta
//! entries are a ref payload, then for sets and maps a boundary key (marker
//! `0` and an encoded primitive, or marker `1` and 32 hash bytes), then the
//! varint leaf count. Type descriptors share the tag numbering and add
//! `11` = Union and `12` = Value. A union lists two or more members sorted
//! by encoding. A Ref value carries its type in [`TypeDesc::ref_target`]
//! form; a meta tuple carries its child node's full type.
//!
//! Nesting is capped at [`MAX_DEPTH`] levels, counting each value and each
//! type descriptor level. Writes that would exceed it are refused, so every
//! stored chunk decodes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use arbor_types::{Hash, HASH_LEN};

use crate::error::{ValueError, ValueResult};
use crate::key::{compare_values, OrderedKey};
use crate::list::List;
use crate::map::Map;
use crate::reference::Ref;
use crate::sequence::{Item, MetaTuple, Node, SeqKind};
use crate::set::Set;
use crate::types::{StructType, TypeDesc};
use crate::value::{canonical_float, Struct, Value, ValueKind};

/// Nesting limit for values and type descriptors.
pub const MAX_DEPTH: usize = 128;

const TYPE_UNION: u8 = 11;
const TYPE_VALUE: u8 = 12;

const KEY_PRIMITIVE: u8 = 0;
const KEY_DIGEST: u8 = 1;

// ---------------------------------------------------------------------------
// Varints
// ---------------------------------------------------------------------------

/// Append `value` as a minimal LEB128 varint.
pub fn encode_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Decode a minimal LEB128 varint, returning the value and bytes consumed.
pub fn decode_varint(data: &[u8]) -> ValueResult<(u64, usize)> {
    let mut result = 0u64;
    for (i, &byte) in data.iter().enumerate().take(10) {
        if i == 9 && byte > 1 {
            return Err(ValueError::malformed("varint overflows u64"));
        }
        result |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(ValueError::malformed("overlong varint"));
            }
            return Ok((result, i + 1));
        }
    }
    Err(ValueError::malformed("truncated varint"))
}

fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn unzigzag(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Canonical encoding of `value`.
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

/// The exact bytes stored for `value`; what `arbor show --raw` prints.
pub fn raw_encode(value: &Value) -> Vec<u8> {
    encode_value(value)
}

/// Canonical encoding of a type descriptor.
pub fn encode_type(ty: &TypeDesc) -> Vec<u8> {
    let mut out = Vec::new();
    write_type(&mut out, ty);
    out
}

pub(crate) fn encode_node(node: &Node) -> Vec<u8> {
    let mut out = Vec::new();
    write_node(&mut out, node);
    out
}

/// Append the encoding of one node entry.
pub(crate) fn encode_item(out: &mut Vec<u8>, item: &Item) {
    match item {
        Item::Value(v) => write_value(out, v),
        Item::Entry(k, v) => {
            write_value(out, k);
            write_value(out, v);
        }
        Item::Tuple(t) => {
            write_ref_payload(out, &t.child);
            match &t.key {
                Some(OrderedKey::Primitive(v)) => {
                    out.push(KEY_PRIMITIVE);
                    write_value(out, v);
                }
                Some(OrderedKey::Digest(h)) => {
                    out.push(KEY_DIGEST);
                    out.extend_from_slice(h.as_bytes());
                }
                None => {}
            }
            encode_varint(out, t.num_leaves);
        }
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    encode_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    let tag = value.kind().tag();
    match value {
        Value::Null => out.push(tag),
        Value::Bool(b) => out.extend_from_slice(&[tag, u8::from(*b)]),
        Value::Int(i) => {
            out.push(tag);
            encode_varint(out, zigzag(*i));
        }
        Value::Float(f) => {
            out.push(tag);
            out.extend_from_slice(&canonical_float(*f).to_bits().to_be_bytes());
        }
        Value::String(s) => {
            out.push(tag);
            write_bytes(out, s.as_bytes());
        }
        Value::Bytes(b) => {
            out.push(tag);
            write_bytes(out, b);
        }
        Value::Ref(r) => {
            out.push(tag);
            write_ref_payload(out, r);
        }
        Value::List(l) => write_node(out, l.root()),
        Value::Set(s) => write_node(out, s.root()),
        Value::Map(m) => write_node(out, m.root()),
        Value::Struct(s) => {
            out.push(tag);
            write_bytes(out, s.name().as_bytes());
            encode_varint(out, s.len() as u64);
            for (name, field) in s.fields() {
                write_bytes(out, name.as_bytes());
                write_value(out, field);
            }
        }
    }
}

fn write_ref_payload(out: &mut Vec<u8>, r: &Ref) {
    out.extend_from_slice(r.target_hash().as_bytes());
    encode_varint(out, r.height());
    write_type(out, r.target_type());
}

fn write_node(out: &mut Vec<u8>, node: &Node) {
    out.push(node.kind().value_kind().tag());
    encode_varint(out, node.level());
    encode_varint(out, node.len() as u64);
    for item in node.items() {
        encode_item(out, item);
    }
}

fn write_type(out: &mut Vec<u8>, ty: &TypeDesc) {
    match ty {
        TypeDesc::Null => out.push(ValueKind::Null.tag()),
        TypeDesc::Bool => out.push(ValueKind::Bool.tag()),
        TypeDesc::Int => out.push(ValueKind::Int.tag()),
        TypeDesc::Float => out.push(ValueKind::Float.tag()),
        TypeDesc::String => out.push(ValueKind::String.tag()),
        TypeDesc::Bytes => out.push(ValueKind::Bytes.tag()),
        TypeDesc::Value => out.push(TYPE_VALUE),
        TypeDesc::Ref(t) => {
            out.push(ValueKind::Ref.tag());
            write_type(out, t);
        }
        TypeDesc::List(t) => {
            out.push(ValueKind::List.tag());
            write_type(out, t);
        }
        TypeDesc::Set(t) => {
            out.push(ValueKind::Set.tag());
            write_type(out, t);
        }
        TypeDesc::Map(k, v) => {
            out.push(ValueKind::Map.tag());
            write_type(out, k);
            write_type(out, v);
        }
        TypeDesc::Struct(s) => {
            out.push(ValueKind::Struct.tag());
            write_bytes(out, s.name().as_bytes());
            encode_varint(out, s.fields().len() as u64);
            for (name, field) in s.fields() {
                write_bytes(out, name.as_bytes());
                write_type(out, field);
            }
        }
        TypeDesc::Union(members) => {
            out.push(TYPE_UNION);
            encode_varint(out, members.len() as u64);
            for member in members {
                write_type(out, member);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Depth
// ---------------------------------------------------------------------------

/// Refuse `value` when its encoding would nest past [`MAX_DEPTH`].
pub(crate) fn check_value_depth(value: &Value) -> ValueResult<()> {
    check_limit(value_depth(value))
}

/// Like [`check_value_depth`] for a tree node stored as its own chunk.
pub(crate) fn check_node_depth(node: &Node) -> ValueResult<()> {
    check_limit(1 + node_depth(node))
}

fn check_limit(depth: usize) -> ValueResult<()> {
    if depth > MAX_DEPTH {
        return Err(ValueError::TooDeep {
            depth,
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}

// Each level here is one `Decoder::enter` on the way down.
fn value_depth(value: &Value) -> usize {
    1 + match value {
        Value::Ref(r) => type_depth(r.target_type()),
        Value::List(l) => node_depth(l.root()),
        Value::Set(s) => node_depth(s.root()),
        Value::Map(m) => node_depth(m.root()),
        Value::Struct(s) => s.fields().map(|(_, v)| value_depth(v)).max().unwrap_or(0),
        _ => 0,
    }
}

fn node_depth(node: &Node) -> usize {
    node.items()
        .iter()
        .map(|item| match item {
            Item::Value(v) => value_depth(v),
            Item::Entry(k, v) => value_depth(k).max(value_depth(v)),
            Item::Tuple(t) => {
                let key = match &t.key {
                    Some(OrderedKey::Primitive(v)) => value_depth(v),
                    _ => 0,
                };
                type_depth(t.child.target_type()).max(key)
            }
        })
        .max()
        .unwrap_or(0)
}

fn type_depth(ty: &TypeDesc) -> usize {
    1 + match ty {
        TypeDesc::Ref(t) | TypeDesc::List(t) | TypeDesc::Set(t) => type_depth(t),
        TypeDesc::Map(k, v) => type_depth(k).max(type_depth(v)),
        TypeDesc::Struct(s) => s.fields().iter().map(|(_, t)| type_depth(t)).max().unwrap_or(0),
        TypeDesc::Union(members) => members.iter().map(type_depth).max().unwrap_or(0),
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a complete canonical encoding.
pub fn decode_value(data: &[u8]) -> ValueResult<Value> {
    let mut decoder = Decoder::new(data);
    let value = decoder.value()?;
    decoder.finish()?;
    Ok(value)
}

/// Decode a complete type descriptor encoding.
pub fn decode_type(data: &[u8]) -> ValueResult<TypeDesc> {
    let mut decoder = Decoder::new(data);
    let ty = decoder.type_desc()?;
    decoder.finish()?;
    Ok(ty)
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn finish(&self) -> ValueResult<()> {
        if self.pos != self.data.len() {
            return Err(ValueError::malformed(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }

    fn byte(&mut self) -> ValueResult<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| ValueError::malformed("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, n: usize) -> ValueResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(ValueError::malformed(format!(
                "needed {n} bytes, {} remain",
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn varint(&mut self) -> ValueResult<u64> {
        let (value, used) = decode_varint(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    /// A length or count; every counted element takes at least one byte.
    fn count(&mut self) -> ValueResult<usize> {
        let n = self.varint()?;
        if n > self.remaining() as u64 {
            return Err(ValueError::malformed(format!(
                "count {n} exceeds {} remaining bytes",
                self.remaining()
            )));
        }
        Ok(n as usize)
    }

    fn string(&mut self) -> ValueResult<String> {
        let len = self.count()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ValueError::malformed("invalid UTF-8"))
    }

    fn hash(&mut self) -> ValueResult<Hash> {
        let bytes = self.take(HASH_LEN)?;
        Hash::from_slice(bytes).map_err(|e| ValueError::malformed(e.to_string()))
    }

    fn enter(&mut self) -> ValueResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ValueError::malformed("nesting too deep"));
        }
        Ok(())
    }

    fn value(&mut self) -> ValueResult<Value> {
        self.enter()?;
        let value = self.value_inner();
        self.depth -= 1;
        value
    }

    fn value_inner(&mut self) -> ValueResult<Value> {
        let tag = self.byte()?;
        let kind = ValueKind::from_tag(tag)
            .ok_or_else(|| ValueError::malformed(format!("unknown value tag {tag}")))?;
        Ok(match kind {
            ValueKind::Null => Value::Null,
            ValueKind::Bool => match self.byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(ValueError::malformed(format!("invalid bool byte {b}"))),
            },
            ValueKind::Int => Value::Int(unzigzag(self.varint()?)),
            ValueKind::Float => {
                let mut bits = [0u8; 8];
                bits.copy_from_slice(self.take(8)?);
                let bits = u64::from_be_bytes(bits);
                let f = f64::from_bits(bits);
                if canonical_float(f).to_bits() != bits {
                    return Err(ValueError::malformed("non-canonical float"));
                }
                Value::Float(f)
            }
            ValueKind::String => Value::String(self.string()?),
            ValueKind::Bytes => {
                let len = self.count()?;
                Value::Bytes(self.take(len)?.to_vec())
            }
            ValueKind::Ref => Value::Ref(self.ref_payload()?),
            ValueKind::List => Value::List(List::from_root(Arc::new(self.node(SeqKind::List)?))),
            ValueKind::Set => Value::Set(Set::from_root(Arc::new(self.node(SeqKind::Set)?))),
            ValueKind::Map => Value::Map(Map::from_root(Arc::new(self.node(SeqKind::Map)?))),
            ValueKind::Struct => Value::Struct(self.struct_fields()?),
        })
    }

    fn struct_fields(&mut self) -> ValueResult<Struct> {
        let name = self.string()?;
        let count = self.count()?;
        let mut fields = BTreeMap::new();
        let mut prev: Option<String> = None;
        for _ in 0..count {
            let field = self.string()?;
            if prev.as_deref().is_some_and(|p| p >= field.as_str()) {
                return Err(ValueError::malformed(format!(
                    "struct field {field:?} out of order"
                )));
            }
            let value = self.value()?;
            prev = Some(field.clone());
            fields.insert(field, value);
        }
        Ok(Struct::from_sorted(name, fields))
    }

    fn ref_payload(&mut self) -> ValueResult<Ref> {
        let target = self.hash()?;
        let height = self.varint()?;
        let target_type = self.type_desc()?;
        if target_type.ref_target() != target_type {
            return Err(ValueError::malformed(format!(
                "ref type {target_type} nests a ref target"
            )));
        }
        Ok(Ref::new(target, height, target_type))
    }

    fn node(&mut self, kind: SeqKind) -> ValueResult<Node> {
        let level = self.varint()?;
        let count = self.count()?;
        if level > 0 && count == 0 {
            return Err(ValueError::malformed("empty meta node"));
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let item = if level == 0 {
                match kind {
                    SeqKind::List | SeqKind::Set => Item::Value(self.value()?),
                    SeqKind::Map => Item::Entry(self.value()?, self.value()?),
                }
            } else {
                Item::Tuple(self.tuple(kind)?)
            };
            items.push(item);
        }
        if kind.is_ordered() {
            check_ascending(&items)?;
        }
        Ok(Node::new(kind, level, items))
    }

    fn tuple(&mut self, kind: SeqKind) -> ValueResult<MetaTuple> {
        let target = self.hash()?;
        let height = self.varint()?;
        let child = Ref::to_node(target, height, self.type_desc()?);
        let key = if kind.is_ordered() {
            Some(match self.byte()? {
                KEY_PRIMITIVE => {
                    let v = self.value()?;
                    if !v.kind().is_primitive() {
                        return Err(ValueError::malformed("boundary key is not a primitive"));
                    }
                    OrderedKey::Primitive(v)
                }
                KEY_DIGEST => OrderedKey::Digest(self.hash()?),
                m => return Err(ValueError::malformed(format!("unknown key marker {m}"))),
            })
        } else {
            None
        };
        let num_leaves = self.varint()?;
        if num_leaves == 0 {
            return Err(ValueError::malformed("meta tuple spans no leaves"));
        }
        Ok(MetaTuple {
            child,
            key,
            num_leaves,
        })
    }

    fn type_desc(&mut self) -> ValueResult<TypeDesc> {
        self.enter()?;
        let ty = self.type_inner();
        self.depth -= 1;
        ty
    }

    fn type_inner(&mut self) -> ValueResult<TypeDesc> {
        let tag = self.byte()?;
        if tag == TYPE_UNION {
            let count = self.count()?;
            let mut members = Vec::with_capacity(count);
            for _ in 0..count {
                members.push(self.type_desc()?);
            }
            let canonical = TypeDesc::union(members.clone());
            let ty = TypeDesc::Union(members);
            if canonical != ty {
                return Err(ValueError::malformed(format!("non-canonical union {ty}")));
            }
            return Ok(ty);
        }
        if tag == TYPE_VALUE {
            return Ok(TypeDesc::Value);
        }
        let kind = ValueKind::from_tag(tag)
            .ok_or_else(|| ValueError::malformed(format!("unknown type tag {tag}")))?;
        Ok(match kind {
            ValueKind::Null => TypeDesc::Null,
            ValueKind::Bool => TypeDesc::Bool,
            ValueKind::Int => TypeDesc::Int,
            ValueKind::Float => TypeDesc::Float,
            ValueKind::String => TypeDesc::String,
            ValueKind::Bytes => TypeDesc::Bytes,
            ValueKind::Ref => TypeDesc::Ref(Box::new(self.type_desc()?)),
            ValueKind::List => TypeDesc::List(Box::new(self.type_desc()?)),
            ValueKind::Set => TypeDesc::Set(Box::new(self.type_desc()?)),
            ValueKind::Map => {
                let k = self.type_desc()?;
                let v = self.type_desc()?;
                TypeDesc::Map(Box::new(k), Box::new(v))
            }
            ValueKind::Struct => {
                let name = self.string()?;
                let count = self.count()?;
                let mut fields = Vec::with_capacity(count);
                for _ in 0..count {
                    let field = self.string()?;
                    fields.push((field, self.type_desc()?));
                }
                if fields.windows(2).any(|w| w[0].0 >= w[1].0) {
                    return Err(ValueError::malformed("struct type fields out of order"));
                }
                TypeDesc::Struct(StructType::new(name, fields))
            }
        })
    }
}

/// Set and map entries, and their boundary keys, strictly ascend.
fn check_ascending(items: &[Item]) -> ValueResult<()> {
    for pair in items.windows(2) {
        let order = match (&pair[0], &pair[1]) {
            (Item::Tuple(a), Item::Tuple(b)) => a.key.cmp(&b.key),
            (a, b) => match (a.leaf_key(), b.leaf_key()) {
                (Some(x), Some(y)) => compare_values(x, y),
                _ => Ordering::Less,
            },
        };
        if order != Ordering::Less {
            return Err(ValueError::malformed("ordered entries not strictly ascending"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_malformed(data: &[u8]) {
        match decode_value(data) {
            Err(ValueError::MalformedEncoding(_)) => {}
            other => panic!("expected malformed for {data:?}, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Varints
    // -----------------------------------------------------------------------

    #[test]
    fn varint_known_encodings() {
        let cases: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (300, &[0xac, 0x02]),
        ];
        for (value, bytes) in cases {
            let mut out = Vec::new();
            encode_varint(&mut out, *value);
            assert_eq!(&out, bytes);
            assert_eq!(decode_varint(bytes).unwrap(), (*value, bytes.len()));
        }
    }

    #[test]
    fn varint_max() {
        let mut out = Vec::new();
        encode_varint(&mut out, u64::MAX);
        assert_eq!(out.len(), 10);
        assert_eq!(decode_varint(&out).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn varint_rejects_overlong_and_overflow() {
        assert!(decode_varint(&[0x80, 0x00]).is_err());
        assert!(decode_varint(&[0xff; 10]).is_err());
        assert!(decode_varint(&[0x80]).is_err());
        assert!(decode_varint(&[]).is_err());
    }

    #[test]
    fn zigzag_roundtrip() {
        for n in [0i64, -1, 1, i64::MIN, i64::MAX, 12345, -98765] {
            assert_eq!(unzigzag(zigzag(n)), n);
        }
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
    }

    // -----------------------------------------------------------------------
    // Known values
    // -----------------------------------------------------------------------

    #[test]
    fn primitive_encodings() {
        assert_eq!(encode_value(&Value::Null), vec![0]);
        assert_eq!(encode_value(&Value::Bool(true)), vec![1, 1]);
        assert_eq!(encode_value(&Value::Int(-1)), vec![2, 1]);
        assert_eq!(encode_value(&Value::from("a")), vec![4, 1, b'a']);
        assert_eq!(encode_value(&Value::Bytes(vec![9, 8])), vec![5, 2, 9, 8]);
        assert_eq!(encode_value(&List::new().into()), vec![7, 0, 0]);
        assert_eq!(encode_value(&Set::new().into()), vec![8, 0, 0]);
        assert_eq!(encode_value(&Map::new().into()), vec![9, 0, 0]);
    }

    #[test]
    fn negative_zero_encodes_as_zero() {
        assert_eq!(encode_value(&Value::Float(-0.0)), encode_value(&Value::Float(0.0)));
        assert_eq!(
            encode_value(&Value::Float(f64::from_bits(0x7ff8_0000_0000_0001))),
            encode_value(&Value::Float(f64::NAN))
        );
    }

    #[test]
    fn ref_roundtrip() {
        let inner = Ref::of(&Value::from("x"));
        let outer = Value::Ref(Ref::of(&Value::Ref(inner)));
        let bytes = encode_value(&outer);
        assert_eq!(decode_value(&bytes).unwrap(), outer);
    }

    #[test]
    fn struct_roundtrip() {
        let s = Value::Struct(Struct::new(
            "Commit",
            [
                ("message", Value::from("init")),
                ("parents", Value::Set(Set::new())),
                ("value", Value::Int(42)),
            ],
        ));
        let bytes = encode_value(&s);
        let back = decode_value(&bytes).unwrap();
        assert_eq!(back, s);
        assert_eq!(encode_value(&back), bytes);
    }

    #[test]
    fn type_roundtrip() {
        let ty = TypeDesc::Map(
            Box::new(TypeDesc::String),
            Box::new(TypeDesc::union([
                TypeDesc::Int,
                TypeDesc::List(Box::new(TypeDesc::Value)),
                TypeDesc::Struct(StructType::new("S", [("f".to_string(), TypeDesc::Bool)])),
            ])),
        );
        assert_eq!(decode_type(&encode_type(&ty)).unwrap(), ty);
    }

    // -----------------------------------------------------------------------
    // Rejections
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_truncation() {
        let bytes = encode_value(&Value::from("hello world"));
        for len in 0..bytes.len() {
            assert_malformed(&bytes[..len]);
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert_malformed(&[0, 0]);
    }

    #[test]
    fn rejects_unknown_tag() {
        assert_malformed(&[11]);
        assert_malformed(&[0xff]);
    }

    #[test]
    fn rejects_bad_bool_and_utf8() {
        assert_malformed(&[1, 2]);
        assert_malformed(&[4, 2, 0xc3, 0x28]);
    }

    #[test]
    fn rejects_overlong_int() {
        assert_malformed(&[2, 0x80, 0x00]);
    }

    #[test]
    fn rejects_non_canonical_float() {
        let mut bytes = vec![3];
        bytes.extend_from_slice(&(-0.0f64).to_bits().to_be_bytes());
        assert_malformed(&bytes);
    }

    #[test]
    fn rejects_unsorted_struct_fields() {
        let mut bytes = vec![10, 1, b'S', 2];
        bytes.extend_from_slice(&[1, b'b', 0]);
        bytes.extend_from_slice(&[1, b'a', 0]);
        assert_malformed(&bytes);
    }

    #[test]
    fn rejects_unsorted_or_duplicate_set() {
        // set leaf: tag 8, level 0, count 2, Int(2), Int(1)
        assert_malformed(&[8, 0, 2, 2, 4, 2, 2]);
        assert_malformed(&[8, 0, 2, 2, 2, 2, 2]);
        assert!(decode_value(&[8, 0, 2, 2, 2, 2, 4]).is_ok());
    }

    #[test]
    fn rejects_huge_count() {
        assert_malformed(&[7, 0, 0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn rejects_empty_meta_node() {
        assert_malformed(&[7, 1, 0]);
    }

    #[test]
    fn rejects_deep_nesting() {
        let mut bytes = vec![6];
        bytes.extend_from_slice(&[0u8; HASH_LEN]);
        bytes.push(1);
        bytes.extend(std::iter::repeat(6u8).take(4096));
        bytes.push(0);
        assert_malformed(&bytes);
    }

    fn nested_lists(depth: usize) -> Vec<u8> {
        // single-element list leaves around a Null
        let mut bytes = [7u8, 0, 1].repeat(depth);
        bytes.push(0);
        bytes
    }

    /// `Struct S { f: Ref<List<...<Null>>> }` with `lists` list types.
    fn struct_with_deep_ref_type(lists: usize) -> Vec<u8> {
        let mut bytes = vec![10, 1, b'S', 1, 1, b'f', 6];
        bytes.extend_from_slice(&[0u8; HASH_LEN]);
        bytes.push(1);
        bytes.extend(std::iter::repeat(7u8).take(lists));
        bytes.push(0);
        bytes
    }

    #[test]
    fn nested_lists_decode_up_to_the_limit() {
        assert!(decode_value(&nested_lists(MAX_DEPTH - 1)).is_ok());
        assert_malformed(&nested_lists(MAX_DEPTH));
    }

    #[test]
    fn deeply_nested_lists_fail_without_overflow() {
        assert_malformed(&nested_lists(500));
        assert_malformed(&nested_lists(100_000));
    }

    #[test]
    fn ref_type_inside_struct_counts_toward_the_limit() {
        // struct, ref, then one level per list type plus the Null type
        assert!(decode_value(&struct_with_deep_ref_type(MAX_DEPTH - 3)).is_ok());
        assert_malformed(&struct_with_deep_ref_type(MAX_DEPTH - 2));
        assert_malformed(&struct_with_deep_ref_type(50_000));
    }

    #[test]
    fn rejects_ref_type_with_nested_ref_target() {
        let mut bytes = vec![6];
        bytes.extend_from_slice(&[0u8; HASH_LEN]);
        bytes.extend_from_slice(&[2, 6, 2]);
        assert_malformed(&bytes);

        let mut summary = vec![6];
        summary.extend_from_slice(&[0u8; HASH_LEN]);
        summary.extend_from_slice(&[2, 6, TYPE_VALUE]);
        assert!(decode_value(&summary).is_ok());
    }

    #[test]
    fn rejects_non_canonical_unions() {
        let malformed = |bytes: &[u8]| {
            assert!(
                matches!(decode_type(bytes), Err(ValueError::MalformedEncoding(_))),
                "accepted {bytes:?}"
            );
        };
        malformed(&[TYPE_UNION, 1, 2]);
        malformed(&[TYPE_UNION, 2, 4, 2]);
        malformed(&[TYPE_UNION, 2, 2, 2]);
        malformed(&[TYPE_UNION, 2, 0, TYPE_UNION, 2, 1, 2]);
        malformed(&[TYPE_UNION, 2, 7, 2, 7, 4]);

        assert_eq!(
            decode_type(&[TYPE_UNION, 2, 2, 4]).unwrap(),
            TypeDesc::Union(vec![TypeDesc::Int, TypeDesc::String])
        );
        assert_eq!(decode_type(&[TYPE_UNION, 0]).unwrap(), TypeDesc::empty());
    }

    #[test]
    fn canonical_union_encodings_decode() {
        let ty = TypeDesc::union([
            TypeDesc::List(Box::new(TypeDesc::Int)),
            TypeDesc::Null,
            TypeDesc::List(Box::new(TypeDesc::String)),
            TypeDesc::Map(Box::new(TypeDesc::Bool), Box::new(TypeDesc::empty())),
        ]);
        assert_eq!(decode_type(&encode_type(&ty)).unwrap(), ty);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn primitive_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            any::<f64>().prop_map(Value::Float),
            ".{0,24}".prop_map(Value::String),
            proptest::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        ]
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        primitive_strategy().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                inner.clone().prop_map(|v| Value::Ref(Ref::of(&v))),
                (
                    "[A-Za-z]{1,8}",
                    proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                )
                    .prop_map(|(name, fields)| Value::Struct(Struct::new(name, fields))),
            ]
        })
    }

    proptest! {
        #[test]
        fn encoding_roundtrips(value in value_strategy()) {
            let bytes = encode_value(&value);
            let decoded = decode_value(&bytes).unwrap();
            prop_assert_eq!(&decoded, &value);
            prop_assert_eq!(encode_value(&decoded), bytes);
        }

        #[test]
        fn encoding_is_deterministic(value in value_strategy()) {
            prop_assert_eq!(encode_value(&value), encode_value(&value.clone()));
            prop_assert_eq!(value.hash(), value.clone().hash());
        }

        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode_value(&bytes);
        }
    }
}
