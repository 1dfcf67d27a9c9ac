use serde_json::Value;
use thiserror::Error;

use crate::http::Response;

/// What an action hands back for normalization.
#[derive(Debug)]
pub enum Reply {
    /// Success with nothing to say; becomes `204 No Content`.
    Empty,
    /// A body to serialize plus optional status and content type.
    Payload(Payload),
    /// A finished response, returned as is.
    PassThrough(Response),
}

/// Body, status and content type of a [`Reply::Payload`].
///
/// `status` stays a raw number until normalization so a bad code is a
/// dispatch fault rather than a panic at the call site.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub body: Option<Value>,
    pub status: Option<u16>,
    pub content_type: Option<String>,
}

impl Payload {
    pub fn new() -> Payload {
        Payload::default()
    }
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl Reply {
    /// A payload carrying `body`, with default status and content type.
    pub fn body(body: impl Into<Value>) -> Reply {
        Reply::Payload(Payload::new().body(body))
    }
    /// A payload carrying `body` as `application/json`.
    pub fn json(body: impl Into<Value>) -> Reply {
        Reply::Payload(Payload::new().body(body).content_type("application/json"))
    }
}

impl From<Payload> for Reply {
    fn from(payload: Payload) -> Self {
        Reply::Payload(payload)
    }
}

impl From<Response> for Reply {
    fn from(res: Response) -> Self {
        Reply::PassThrough(res)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ReplyShapeError {
    #[error("unrecognized action result of kind {0}")]
    Unrecognized(&'static str),
    #[error("`status` must be an integer in 0..=65535, got {0}")]
    Status(Value),
    #[error("`content_type` must be a string, got {0}")]
    ContentType(Value),
    #[error("unexpected key `{0}` in action result")]
    UnknownKey(String),
}

/// Mapping-style results: `null` is empty, an object with optional
/// `body`, `status` and `content_type` keys is a payload, anything else
/// is rejected.
impl TryFrom<Value> for Reply {
    type Error = ReplyShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut map = match value {
            Value::Null => return Ok(Reply::Empty),
            Value::Object(map) => map,
            Value::Bool(_) => return Err(ReplyShapeError::Unrecognized("bool")),
            Value::Number(_) => return Err(ReplyShapeError::Unrecognized("number")),
            Value::String(_) => return Err(ReplyShapeError::Unrecognized("string")),
            Value::Array(_) => return Err(ReplyShapeError::Unrecognized("array")),
        };

        let body = map.remove("body");
        let status = match map.remove("status") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|code| u16::try_from(code).ok())
                    .ok_or(ReplyShapeError::Status(value))?,
            ),
        };
        let content_type = match map.remove("content_type") {
            None | Some(Value::Null) => None,
            Some(Value::String(content_type)) => Some(content_type),
            Some(other) => return Err(ReplyShapeError::ContentType(other)),
        };
        if let Some(key) = map.keys().next() {
            return Err(ReplyShapeError::UnknownKey(key.clone()));
        }

        Ok(Reply::Payload(Payload {
            body,
            status,
            content_type,
        }))
    }
}
