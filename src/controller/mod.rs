//! Resource controllers and the action dispatch around them.
//!
//! A [`Controller`] exposes the seven conventional actions plus any number
//! of service specific ones through [`Controller::custom`]. Every action
//! returns an [`ActionResult`]; [`ActionHandler`] turns that into a
//! [`Response`](crate::http::Response) and keeps every failure behind a
//! generic 500.

mod fault;
mod handler;
mod reply;

use std::fmt;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::http::{header::CONTENT_TYPE, Request};
use crate::serializer::{SerializationError, Serializer};

pub use fault::{DispatchFault, FaultReport, FaultSink, TracingSink};
pub use handler::ActionHandler;
pub use reply::{Payload, Reply, ReplyShapeError};

pub type ActionResult = Result<Reply, anyhow::Error>;

/// Action identifiers a controller can be dispatched on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Index,
    Create,
    New,
    Show,
    Update,
    Delete,
    Edit,
    /// Anything else, resolved through [`Controller::custom`].
    Custom(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Index => "index",
            Action::Create => "create",
            Action::New => "new",
            Action::Show => "show",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Edit => "edit",
            Action::Custom(name) => name,
        }
    }

    /// Actions that operate on a single member and take the `id` variable.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            Action::Show | Action::Update | Action::Delete | Action::Edit
        )
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        match name {
            "index" => Action::Index,
            "create" => Action::Create,
            "new" => Action::New,
            "show" => Action::Show,
            "update" => Action::Update,
            "delete" => Action::Delete,
            "edit" => Action::Edit,
            other => Action::Custom(other.to_owned()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension contract for resource handlers.
///
/// Every action defaults to an empty success, so a controller only
/// overrides what it serves. Request bodies are decoded with
/// [`RequestExt::decode_body`], which uses the serializer of the
/// [`ActionHandler`] running the action.
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn index(&self, _req: &mut Request) -> ActionResult {
        Ok(Reply::Empty)
    }
    async fn create(&self, _req: &mut Request) -> ActionResult {
        Ok(Reply::Empty)
    }
    async fn new(&self, _req: &mut Request) -> ActionResult {
        Ok(Reply::Empty)
    }
    async fn show(&self, _req: &mut Request, _id: &str) -> ActionResult {
        Ok(Reply::Empty)
    }
    async fn update(&self, _req: &mut Request, _id: &str) -> ActionResult {
        Ok(Reply::Empty)
    }
    async fn delete(&self, _req: &mut Request, _id: &str) -> ActionResult {
        Ok(Reply::Empty)
    }
    async fn edit(&self, _req: &mut Request, _id: &str) -> ActionResult {
        Ok(Reply::Empty)
    }

    /// Service specific actions. `None` means the controller has no action
    /// called `name`.
    async fn custom(&self, _name: &str, _req: &mut Request) -> Option<ActionResult> {
        None
    }
}

static DEFAULT_SERIALIZER: Lazy<Serializer> = Lazy::new(Serializer::new);

/// Body access for actions.
pub trait RequestExt {
    /// The serializer of the dispatching [`ActionHandler`], or a default one
    /// outside of dispatch.
    fn serializer(&self) -> &Serializer;

    /// Decodes the body by its `Content-Type`. Without one, the serializer's
    /// default content type applies.
    fn decode_body(&self) -> Result<Value, SerializationError>;
}

impl RequestExt for Request {
    fn serializer(&self) -> &Serializer {
        self.extensions()
            .get::<Serializer>()
            .unwrap_or(&DEFAULT_SERIALIZER)
    }

    fn decode_body(&self) -> Result<Value, SerializationError> {
        let content_type = match self.headers().get(CONTENT_TYPE) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| SerializationError::Unsupported(format!("{:?}", value)))?,
            ),
            None => None,
        };
        self.serializer().deserialize(self.body(), content_type)
    }
}
