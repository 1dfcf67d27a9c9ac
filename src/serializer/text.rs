use bytes::Bytes;
use serde_json::Value;

use super::{Codec, SerializationError};

/// Passes strings through as UTF-8. Used for `text/html` and `text/plain`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, SerializationError> {
        match value {
            Value::String(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            other => Err(SerializationError::NotEncodable(format!(
                "text body must be a string, got {}",
                kind(other)
            ))),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Value, SerializationError> {
        std::str::from_utf8(data)
            .map(|text| Value::String(text.to_owned()))
            .map_err(|e| SerializationError::Malformed(e.to_string()))
    }
}

pub(super) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
