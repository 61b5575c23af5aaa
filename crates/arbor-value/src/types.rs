use std::fmt;

use crate::codec;

/// Declared type of a value.
///
/// Collection element types are the union of the types of their elements, so
/// an empty collection has the empty union as its element type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    /// Any value.
    Value,
    Ref(Box<TypeDesc>),
    List(Box<TypeDesc>),
    Set(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Struct(StructType),
    Union(Vec<TypeDesc>),
}

/// Name and field types of a struct, fields sorted by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructType {
    name: String,
    fields: Vec<(String, TypeDesc)>,
}

impl StructType {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (String, TypeDesc)>,
    ) -> Self {
        let mut fields: Vec<(String, TypeDesc)> = fields.into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        fields.dedup_by(|a, b| a.0 == b.0);
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, TypeDesc)] {
        &self.fields
    }
}

impl TypeDesc {
    /// The empty union.
    pub fn empty() -> Self {
        Self::Union(Vec::new())
    }

    /// Canonical union of `members`.
    ///
    /// Nested unions are flattened, list/set/ref/map members of the same kind
    /// are merged by unioning their element types, and the rest are sorted by
    /// their encoding with duplicates removed. A single member is returned as
    /// itself.
    pub fn union(members: impl IntoIterator<Item = TypeDesc>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            flatten_into(member, &mut flat);
        }

        let mut lists = Vec::new();
        let mut sets = Vec::new();
        let mut refs = Vec::new();
        let mut map_keys = Vec::new();
        let mut map_values = Vec::new();
        let mut has_map = false;
        let mut rest = Vec::new();
        for member in flat {
            match member {
                Self::List(t) => lists.push(*t),
                Self::Set(t) => sets.push(*t),
                Self::Ref(t) => refs.push(*t),
                Self::Map(k, v) => {
                    has_map = true;
                    map_keys.push(*k);
                    map_values.push(*v);
                }
                other => rest.push(other),
            }
        }
        if !lists.is_empty() {
            rest.push(Self::List(Box::new(Self::union(lists))));
        }
        if !sets.is_empty() {
            rest.push(Self::Set(Box::new(Self::union(sets))));
        }
        if !refs.is_empty() {
            rest.push(Self::Ref(Box::new(Self::union(refs))));
        }
        if has_map {
            rest.push(Self::Map(
                Box::new(Self::union(map_keys)),
                Box::new(Self::union(map_values)),
            ));
        }

        let mut keyed: Vec<(Vec<u8>, TypeDesc)> = rest
            .into_iter()
            .map(|t| (codec::encode_type(&t), t))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.0 == b.0);

        let mut members: Vec<TypeDesc> = keyed.into_iter().map(|(_, t)| t).collect();
        if members.len() == 1 {
            members.remove(0)
        } else {
            Self::Union(members)
        }
    }

    /// The form of this type a ref records for its target.
    ///
    /// Every ref type inside it becomes `Ref<Value>`, so the type held by a
    /// ref has the same depth however long the chain of refs behind it is.
    pub fn ref_target(&self) -> Self {
        match self {
            Self::Ref(_) => Self::Ref(Box::new(Self::Value)),
            Self::List(t) => Self::List(Box::new(t.ref_target())),
            Self::Set(t) => Self::Set(Box::new(t.ref_target())),
            Self::Map(k, v) => Self::Map(Box::new(k.ref_target()), Box::new(v.ref_target())),
            Self::Struct(s) => Self::Struct(StructType::new(
                s.name.clone(),
                s.fields.iter().map(|(name, ty)| (name.clone(), ty.ref_target())),
            )),
            Self::Union(members) => Self::union(members.iter().map(Self::ref_target)),
            other => other.clone(),
        }
    }
}

fn flatten_into(t: TypeDesc, out: &mut Vec<TypeDesc>) {
    match t {
        TypeDesc::Union(members) => members.into_iter().for_each(|m| flatten_into(m, out)),
        other => out.push(other),
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool => f.write_str("Bool"),
            Self::Int => f.write_str("Int"),
            Self::Float => f.write_str("Float"),
            Self::String => f.write_str("String"),
            Self::Bytes => f.write_str("Bytes"),
            Self::Value => f.write_str("Value"),
            Self::Ref(t) => write!(f, "Ref<{t}>"),
            Self::List(t) => write!(f, "List<{t}>"),
            Self::Set(t) => write!(f, "Set<{t}>"),
            Self::Map(k, v) => write!(f, "Map<{k}, {v}>"),
            Self::Struct(s) => {
                write!(f, "struct {} {{", s.name)?;
                for (i, (name, ty)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {name}: {ty}")?;
                }
                f.write_str(" }")
            }
            Self::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
        }
    }
}
