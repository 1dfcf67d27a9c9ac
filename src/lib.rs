//! Request dispatch for resource-oriented HTTP services.
//!
//! A [`RequestRouter`](routing::RequestRouter) matches a request against a
//! tree of [`Router`](routing::Router) rules and hands it to the bound
//! [`Handler`](handler::Handler). [`ActionHandler`](controller::ActionHandler)
//! is the handler for [`Controller`](controller::Controller)s: it picks the
//! action named by the `action` route variable, serializes what the action
//! returns and turns every failure into a generic 500.

pub mod catcher;
pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod http;
pub mod listener;
pub mod routing;
pub mod serializer;
pub mod server;
pub mod service;
pub mod test;
pub mod writer;

pub use async_trait::async_trait;

pub use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use async_trait::async_trait;

    pub use crate::catcher::{Catcher, DefaultCatcher};
    pub use crate::config::DispatchConfig;
    pub use crate::controller::{
        Action, ActionHandler, ActionResult, Controller, DispatchFault, FaultReport, FaultSink,
        Payload, Reply, RequestExt, TracingSink,
    };
    pub use crate::handler::{FnHandler, Handler};
    pub use crate::http::{Request, Response, StatusCode, StatusError};
    pub use crate::listener::TcpListener;
    pub use crate::routing::{filter, RequestRouter, Router};
    pub use crate::serializer::{Codec, SerializationError, Serializer};
    pub use crate::server::Server;
    pub use crate::service::Service;
    pub use crate::writer::{Piece, Redirect, Text};
}
