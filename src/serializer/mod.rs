//! Content-type keyed encoding of structured values.
//!
//! A [`Serializer`] owns a table of [`Codec`]s indexed by mime essence
//! (`type/subtype`, parameters ignored). Values are `serde_json::Value`
//! so every codec agrees on one in-memory shape.

mod form;
mod json;
mod text;
mod yaml;

use std::{collections::HashMap, fmt, sync::Arc};

use bytes::Bytes;
use mime::Mime;
use serde_json::Value;
use thiserror::Error;

pub use form::FormCodec;
pub use json::JsonCodec;
pub use text::TextCodec;
pub use yaml::YamlCodec;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SerializationError {
    /// No codec is registered for the content type, or it does not parse.
    #[error("unsupported content type `{0}`")]
    Unsupported(String),
    /// The codec cannot represent the value.
    #[error("value is not encodable: {0}")]
    NotEncodable(String),
    /// The input bytes are not valid for the codec.
    #[error("malformed input: {0}")]
    Malformed(String),
}

pub trait Codec: Send + Sync + 'static {
    fn encode(&self, value: &Value) -> Result<Bytes, SerializationError>;
    fn decode(&self, data: &[u8]) -> Result<Value, SerializationError>;
}

#[derive(Clone)]
pub struct Serializer {
    codecs: Arc<HashMap<String, Arc<dyn Codec>>>,
    default_content_type: Mime,
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types = self.codecs.keys().collect::<Vec<_>>();
        types.sort();
        f.debug_struct("Serializer")
            .field("content_types", &types)
            .field("default_content_type", &self.default_content_type.essence_str())
            .finish()
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// A serializer with the built-in codecs and `text/html` as default.
    pub fn new() -> Serializer {
        let text: Arc<dyn Codec> = Arc::new(TextCodec);
        let json: Arc<dyn Codec> = Arc::new(JsonCodec);
        let yaml: Arc<dyn Codec> = Arc::new(YamlCodec);
        let form: Arc<dyn Codec> = Arc::new(FormCodec);

        let mut codecs = HashMap::with_capacity(8);
        codecs.insert("text/html".to_owned(), Arc::clone(&text));
        codecs.insert("text/plain".to_owned(), text);
        codecs.insert("application/json".to_owned(), json);
        codecs.insert("application/yaml".to_owned(), Arc::clone(&yaml));
        codecs.insert("application/x-yaml".to_owned(), Arc::clone(&yaml));
        codecs.insert("text/yaml".to_owned(), yaml);
        codecs.insert("application/x-www-form-urlencoded".to_owned(), form);

        Serializer {
            codecs: Arc::new(codecs),
            default_content_type: mime::TEXT_HTML,
        }
    }

    pub fn register(mut self, content_type: &Mime, codec: impl Codec) -> Self {
        Arc::make_mut(&mut self.codecs)
            .insert(content_type.essence_str().to_owned(), Arc::new(codec));
        self
    }
    pub fn with_default_content_type(mut self, content_type: Mime) -> Self {
        self.default_content_type = content_type;
        self
    }
    pub fn default_content_type(&self) -> &Mime {
        &self.default_content_type
    }
    pub fn supports(&self, content_type: &Mime) -> bool {
        self.codecs.contains_key(content_type.essence_str())
    }

    /// Parses `content_type`, falling back to the default when `None`.
    pub fn resolve(&self, content_type: Option<&str>) -> Result<Mime, SerializationError> {
        match content_type {
            None => Ok(self.default_content_type.clone()),
            Some(raw) => raw
                .parse()
                .map_err(|_| SerializationError::Unsupported(raw.to_owned())),
        }
    }

    pub fn serialize(
        &self,
        value: &Value,
        content_type: Option<&str>,
    ) -> Result<Bytes, SerializationError> {
        let content_type = self.resolve(content_type)?;
        self.encode(value, &content_type)
    }
    pub fn deserialize(
        &self,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<Value, SerializationError> {
        let content_type = self.resolve(content_type)?;
        self.decode(data, &content_type)
    }

    pub fn encode(&self, value: &Value, content_type: &Mime) -> Result<Bytes, SerializationError> {
        self.codec(content_type)?.encode(value)
    }
    pub fn decode(&self, data: &[u8], content_type: &Mime) -> Result<Value, SerializationError> {
        self.codec(content_type)?.decode(data)
    }

    fn codec(&self, content_type: &Mime) -> Result<&dyn Codec, SerializationError> {
        self.codecs
            .get(content_type.essence_str())
            .map(|codec| codec.as_ref())
            .ok_or_else(|| SerializationError::Unsupported(content_type.to_string()))
    }
}
