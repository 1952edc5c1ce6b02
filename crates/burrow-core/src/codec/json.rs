use serde_json::Number;

use super::{EncodeOpts, Error, Format};
use crate::value::{Key, Value};

pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    let raw: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(Value::from(raw))
}

pub fn encode(value: &Value, opts: EncodeOpts) -> Result<String, Error> {
    let raw = to_json(value)?;
    let s = if opts.pretty {
        serde_json::to_string_pretty(&raw)?
    } else {
        serde_json::to_string(&raw)?
    };
    Ok(s)
}

/// Integers that fit `i64` stay integers; every other number is a float.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (Key::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Convert for encoding. Timestamps become RFC 3339 strings and non-finite
/// floats become `null`. Two keys that print the same (`1` and `"1"`) cannot
/// both be kept and are an error.
pub fn to_json(v: &Value) -> Result<serde_json::Value, Error> {
    Ok(match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
        Value::Sequence(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect::<Result<_, _>>()?)
        }
        Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                if object.insert(k.to_string(), to_json(v)?).is_some() {
                    return Err(Error::Unrepresentable {
                        format: Format::Json,
                        what: "mapping keys that collide as text",
                    });
                }
            }
            serde_json::Value::Object(object)
        }
    })
}
