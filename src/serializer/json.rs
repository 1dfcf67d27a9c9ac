use bytes::Bytes;
use serde_json::Value;

use super::{Codec, SerializationError};

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, SerializationError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| SerializationError::NotEncodable(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<Value, SerializationError> {
        serde_json::from_slice(data).map_err(|e| SerializationError::Malformed(e.to_string()))
    }
}
