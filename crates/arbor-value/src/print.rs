//! Human-readable rendering of values.

use std::io::Write;

use crate::error::ValueResult;
use crate::store::ValueStore;
use crate::value::Value;

const INDENT: &str = "  ";

/// Write an indented rendering of `value` followed by a newline.
///
/// Collections are walked through `vs`. Refs print as `#<hex>` and are not
/// followed.
pub fn write_encoded_value(w: &mut impl Write, value: &Value, vs: &ValueStore) -> ValueResult<()> {
    write_value(w, value, vs, 0)?;
    writeln!(w)?;
    Ok(())
}

fn write_value(w: &mut impl Write, value: &Value, vs: &ValueStore, depth: usize) -> ValueResult<()> {
    match value {
        Value::Null => write!(w, "null")?,
        Value::Bool(b) => write!(w, "{b}")?,
        Value::Int(i) => write!(w, "{i}")?,
        Value::Float(f) => write!(w, "{f:?}")?,
        Value::String(s) => write!(w, "{}", serde_json::to_string(s).map_err(std::io::Error::from)?)?,
        Value::Bytes(b) => write!(w, "0x{}", hex::encode(b))?,
        Value::Ref(r) => write!(w, "{r}")?,
        Value::List(list) => {
            if list.is_empty() {
                write!(w, "[]")?;
            } else {
                writeln!(w, "[")?;
                for item in list.iter(vs)? {
                    pad(w, depth + 1)?;
                    write_value(w, &item?, vs, depth + 1)?;
                    writeln!(w, ",")?;
                }
                pad(w, depth)?;
                write!(w, "]")?;
            }
        }
        Value::Set(set) => {
            if set.is_empty() {
                write!(w, "set {{}}")?;
            } else {
                writeln!(w, "set {{")?;
                for item in set.iter(vs)? {
                    pad(w, depth + 1)?;
                    write_value(w, &item?, vs, depth + 1)?;
                    writeln!(w, ",")?;
                }
                pad(w, depth)?;
                write!(w, "}}")?;
            }
        }
        Value::Map(map) => {
            if map.is_empty() {
                write!(w, "map {{}}")?;
            } else {
                writeln!(w, "map {{")?;
                for entry in map.iter(vs)? {
                    let (k, v) = entry?;
                    pad(w, depth + 1)?;
                    write_value(w, &k, vs, depth + 1)?;
                    write!(w, ": ")?;
                    write_value(w, &v, vs, depth + 1)?;
                    writeln!(w, ",")?;
                }
                pad(w, depth)?;
                write!(w, "}}")?;
            }
        }
        Value::Struct(s) => {
            if s.is_empty() {
                write!(w, "{} {{}}", s.name())?;
            } else {
                writeln!(w, "{} {{", s.name())?;
                for (name, field) in s.fields() {
                    pad(w, depth + 1)?;
                    write!(w, "{name}: ")?;
                    write_value(w, field, vs, depth + 1)?;
                    writeln!(w, ",")?;
                }
                pad(w, depth)?;
                write!(w, "}}")?;
            }
        }
    }
    Ok(())
}

fn pad(w: &mut impl Write, depth: usize) -> std::io::Result<()> {
    for _ in 0..depth {
        w.write_all(INDENT.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::List;
    use crate::map::Map;
    use crate::set::Set;
    use crate::value::Struct;

    fn render(value: &Value, vs: &ValueStore) -> String {
        let mut out = Vec::new();
        write_encoded_value(&mut out, value, vs).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn primitives() {
        let vs = ValueStore::in_memory();
        assert_eq!(render(&Value::Null, &vs), "null\n");
        assert_eq!(render(&Value::Bool(false), &vs), "false\n");
        assert_eq!(render(&Value::Int(-42), &vs), "-42\n");
        assert_eq!(render(&Value::Float(1.0), &vs), "1.0\n");
        assert_eq!(render(&Value::from("a \"q\"\n"), &vs), "\"a \\\"q\\\"\\n\"\n");
        assert_eq!(render(&Value::Bytes(vec![0xde, 0xad]), &vs), "0xdead\n");
    }

    #[test]
    fn refs_are_not_followed() {
        let vs = ValueStore::in_memory();
        let r = vs.write_value(&Value::from("target")).unwrap();
        let text = render(&Value::Ref(r.clone()), &vs);
        assert_eq!(text, format!("#{}\n", r.target_hash().to_hex()));
        assert!(!text.contains("target"));
    }

    #[test]
    fn nested_collections_indent() {
        let vs = ValueStore::in_memory();
        let inner = List::from_values(&vs, [Value::Int(1), Value::Int(2)]).unwrap();
        let map = Map::from_entries(&vs, [(Value::from("xs"), Value::List(inner))]).unwrap();
        let s = Struct::new(
            "Doc",
            [
                ("body", Value::Map(map)),
                ("tags", Value::Set(Set::new())),
            ],
        );
        let expected = "\
Doc {
  body: map {
    \"xs\": [
      1,
      2,
    ],
  },
  tags: set {},
}
";
        assert_eq!(render(&Value::Struct(s), &vs), expected);
    }

    #[test]
    fn empty_collections() {
        let vs = ValueStore::in_memory();
        assert_eq!(render(&Value::List(List::new()), &vs), "[]\n");
        assert_eq!(render(&Value::Map(Map::new()), &vs), "map {}\n");
        assert_eq!(render(&Value::Struct(Struct::new("E", Vec::<(String, Value)>::new())), &vs), "E {}\n");
    }
}
