use bytes::Bytes;
use serde_json::{Map, Value};

use super::{text::kind, Codec, SerializationError};

/// `application/x-www-form-urlencoded` for flat objects of strings.
///
/// The wire format carries no types, so only string fields are encodable
/// and a key may appear once.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormCodec;

impl Codec for FormCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, SerializationError> {
        let map = value.as_object().ok_or_else(|| {
            SerializationError::NotEncodable(format!(
                "form body must be an object, got {}",
                kind(value)
            ))
        })?;
        let mut pairs = Vec::with_capacity(map.len());
        for (key, value) in map {
            let value = match value {
                Value::String(text) => text.as_str(),
                other => {
                    return Err(SerializationError::NotEncodable(format!(
                        "form field `{}` must be a string, got {}",
                        key,
                        kind(other)
                    )))
                }
            };
            pairs.push((key.as_str(), value));
        }
        serde_urlencoded::to_string(pairs)
            .map(Bytes::from)
            .map_err(|e| SerializationError::NotEncodable(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<Value, SerializationError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(data)
            .map_err(|e| SerializationError::Malformed(e.to_string()))?;
        let mut map = Map::with_capacity(pairs.len());
        for (key, value) in pairs {
            if map.contains_key(&key) {
                return Err(SerializationError::Malformed(format!(
                    "form field `{}` appears more than once",
                    key
                )));
            }
            map.insert(key, Value::String(value));
        }
        Ok(Value::Object(map))
    }
}
