//! Payload serialization formats

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use cutelog_core::prelude::*;
use cutelog_core::Fields;

/// Serialization format of record payloads on one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Python `pickle` (what `logging.handlers.SocketHandler` sends)
    #[default]
    Pickle,
    Json,
    Msgpack,
    Cbor,
}

impl SerializationFormat {
    pub const ALL: [SerializationFormat; 4] = [
        SerializationFormat::Pickle,
        SerializationFormat::Json,
        SerializationFormat::Msgpack,
        SerializationFormat::Cbor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationFormat::Pickle => "pickle",
            SerializationFormat::Json => "json",
            SerializationFormat::Msgpack => "msgpack",
            SerializationFormat::Cbor => "cbor",
        }
    }

    /// Whether a decoder for this format was compiled in
    pub fn is_available(&self) -> bool {
        match self {
            SerializationFormat::Pickle | SerializationFormat::Json => true,
            SerializationFormat::Msgpack => cfg!(feature = "msgpack"),
            SerializationFormat::Cbor => cfg!(feature = "cbor"),
        }
    }

    /// Formats this build can decode
    pub fn available() -> Vec<SerializationFormat> {
        Self::ALL.into_iter().filter(|f| f.is_available()).collect()
    }

    /// Decode a payload into a field mapping.
    ///
    /// The payload must decode to a mapping with string keys.
    pub fn deserialize(&self, payload: &[u8]) -> Result<Fields> {
        let value = match self {
            SerializationFormat::Pickle => decode_pickle(payload)?,
            SerializationFormat::Json => {
                serde_json::from_slice(payload).map_err(|e| Error::decode(e.to_string()))?
            }
            SerializationFormat::Msgpack => decode_msgpack(payload)?,
            SerializationFormat::Cbor => decode_cbor(payload)?,
        };
        match value {
            Value::Object(fields) => Ok(fields),
            other => Err(Error::decode(format!(
                "{} payload is not a mapping (got {})",
                self,
                kind_of(&other)
            ))),
        }
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializationFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::unsupported_format(s))
    }
}

fn decode_pickle(payload: &[u8]) -> Result<Value> {
    let options = serde_pickle::DeOptions::new().replace_unresolved_globals();
    let field: PickleField =
        serde_pickle::from_slice(payload, options).map_err(|e| Error::decode(e.to_string()))?;
    Ok(field.0.unwrap_or(Value::Null))
}

/// A pickled value with byte strings dropped.
///
/// `None` marks a `bytes` value: it is skipped inside mappings and sequences.
struct PickleField(Option<Value>);

impl<'de> Deserialize<'de> for PickleField {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PickleVisitor).map(PickleField)
    }
}

struct PickleVisitor;

impl<'de> Visitor<'de> for PickleVisitor {
    type Value = Option<Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a pickled value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::from(v)))
    }

    // Python ints beyond 64 bits
    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(Some(Number::from_f64(v).map_or(Value::Null, Value::Number)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::String(v)))
    }

    fn visit_bytes<E: de::Error>(self, _v: &[u8]) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_byte_buf<E: de::Error>(self, _v: Vec<u8>) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::Null))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Some(Value::Null))
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PickleVisitor)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(PickleField(item)) = seq.next_element()? {
            items.extend(item);
        }
        Ok(Some(Value::Array(items)))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = Map::new();
        while let Some((key, PickleField(value))) = map.next_entry::<String, PickleField>()? {
            if let Some(value) = value {
                fields.insert(key, value);
            }
        }
        Ok(Some(Value::Object(fields)))
    }
}

#[cfg(feature = "msgpack")]
fn decode_msgpack(payload: &[u8]) -> Result<Value> {
    rmp_serde::from_slice(payload).map_err(|e| Error::decode(e.to_string()))
}

#[cfg(not(feature = "msgpack"))]
fn decode_msgpack(_payload: &[u8]) -> Result<Value> {
    Err(Error::unsupported_format("msgpack"))
}

#[cfg(feature = "cbor")]
fn decode_cbor(payload: &[u8]) -> Result<Value> {
    ciborium::from_reader(payload).map_err(|e| Error::decode(e.to_string()))
}

#[cfg(not(feature = "cbor"))]
fn decode_cbor(_payload: &[u8]) -> Result<Value> {
    Err(Error::unsupported_format("cbor"))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
