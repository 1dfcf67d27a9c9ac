use bytes::Bytes;
use serde_json::Value;

use super::{Codec, SerializationError};

#[derive(Clone, Copy, Debug, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, SerializationError> {
        serde_yaml::to_string(value)
            .map(Bytes::from)
            .map_err(|e| SerializationError::NotEncodable(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<Value, SerializationError> {
        serde_yaml::from_slice(data).map_err(|e| SerializationError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_document() {
        let value = YamlCodec
            .decode(b"name: leaf1\nactions:\n  - install_image\n  - add_config\n")
            .unwrap();
        assert_eq!(
            value,
            json!({"name": "leaf1", "actions": ["install_image", "add_config"]})
        );
    }
}
