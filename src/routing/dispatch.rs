use std::sync::Arc;

use thiserror::Error;

use crate::{
    handler::Handler,
    http::{Method, Request, Response, StatusError},
};

use super::{PathState, Router};

/// No rule matched the request, or the matching rule bound no handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no route matches {method} {path}")]
pub struct RouteNotFound {
    pub method: Method,
    pub path: String,
}

/// Resolves a request against an immutable rule table and hands it to the
/// handler bound to the matching rule.
#[derive(Clone)]
pub struct RequestRouter {
    router: Arc<Router>,
}

impl std::fmt::Debug for RequestRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RequestRouter\n{:?}", self.router)
    }
}

impl From<Router> for RequestRouter {
    fn from(router: Router) -> Self {
        RequestRouter::new(router)
    }
}

impl RequestRouter {
    pub fn new<T>(router: T) -> RequestRouter
    where
        T: Into<Arc<Router>>,
    {
        RequestRouter {
            router: router.into(),
        }
    }

    pub fn router(&self) -> Arc<Router> {
        Arc::clone(&self.router)
    }

    /// Finds the handler for `req` and stores the matched route variables on it.
    pub fn resolve(&self, req: &mut Request) -> Result<Arc<dyn Handler>, RouteNotFound> {
        let mut path_state = PathState::new(req.uri().path());
        match self.router.detect(req, &mut path_state) {
            Some(dm) => {
                req.params = path_state.params;
                Ok(dm.handler)
            }
            None => Err(RouteNotFound {
                method: req.method().clone(),
                path: req.uri().path().to_owned(),
            }),
        }
    }

    pub async fn dispatch(&self, req: &mut Request) -> Response {
        match self.resolve(req) {
            Ok(handler) => {
                tracing::trace!(handler = handler.type_name(), "route matched");
                handler.handle(req).await
            }
            Err(e) => {
                tracing::debug!(method = %e.method, path = %e.path, "route not found");
                let mut res = Response::new();
                res.set_status_error(StatusError::not_found());
                res
            }
        }
    }
}
