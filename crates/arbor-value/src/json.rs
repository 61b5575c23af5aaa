//! Import of JSON documents as values.

use serde_json::Value as Json;

use crate::error::ValueResult;
use crate::list::List;
use crate::map::Map;
use crate::store::ValueStore;
use crate::value::Value;

/// Convert a JSON document into a value, building collections through `vs`.
///
/// Numbers that fit an `i64` become `Int`; every other number becomes
/// `Float`. Arrays become lists and objects become maps with string keys.
pub fn from_json(vs: &ValueStore, json: &Json) -> ValueResult<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => {
            let values = items
                .iter()
                .map(|item| from_json(vs, item))
                .collect::<ValueResult<Vec<_>>>()?;
            Value::List(List::from_values(vs, values)?)
        }
        Json::Object(fields) => {
            let entries = fields
                .iter()
                .map(|(k, v)| Ok((Value::String(k.clone()), from_json(vs, v)?)))
                .collect::<ValueResult<Vec<_>>>()?;
            Value::Map(Map::from_entries(vs, entries)?)
        }
    })
}
