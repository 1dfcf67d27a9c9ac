use std::convert::Infallible;
use std::future::Future;
use std::io::Error as IoError;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future;
use hyper::server::conn::AddrStream;

use crate::catcher::{Catcher, DefaultCatcher};
use crate::http::{Method, Request, Response, StatusCode, StatusError};
use crate::routing::RequestRouter;

/// Transport adapter: owns the request router and the catchers that
/// render error pages.
#[derive(Clone)]
pub struct Service {
    pub(crate) router: Arc<RequestRouter>,
    pub(crate) catchers: Arc<Vec<Box<dyn Catcher>>>,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("router", &self.router)
            .field("catchers", &self.catchers.len())
            .finish()
    }
}

impl Service {
    pub fn new<T>(router: T) -> Service
    where
        T: Into<RequestRouter>,
    {
        Service {
            router: Arc::new(router.into()),
            catchers: Arc::new(vec![]),
        }
    }
    pub fn router(&self) -> Arc<RequestRouter> {
        self.router.clone()
    }
    /// Catchers tried in order before the default one.
    pub fn with_catchers<T>(mut self, catchers: T) -> Self
    where
        T: Into<Arc<Vec<Box<dyn Catcher>>>>,
    {
        self.catchers = catchers.into();
        self
    }
    pub fn catchers(&self) -> Arc<Vec<Box<dyn Catcher>>> {
        self.catchers.clone()
    }
    pub fn hyper_handler(&self, remote_addr: Option<SocketAddr>) -> HyperHandler {
        HyperHandler {
            remote_addr,
            router: self.router.clone(),
            catchers: self.catchers.clone(),
        }
    }
    /// Handles an already buffered request.
    pub async fn handle(&self, request: Request) -> Response {
        self.hyper_handler(None).handle(request).await
    }
}

impl<T> From<T> for Service
where
    T: Into<RequestRouter>,
{
    fn from(router: T) -> Self {
        Service::new(router)
    }
}

#[derive(Clone)]
pub struct HyperHandler {
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) router: Arc<RequestRouter>,
    pub(crate) catchers: Arc<Vec<Box<dyn Catcher>>>,
}

impl HyperHandler {
    pub fn handle(&self, mut req: Request) -> impl Future<Output = Response> {
        let catchers = self.catchers.clone();
        let router = self.router.clone();
        if self.remote_addr.is_some() {
            req.remote_addr = self.remote_addr;
        }

        async move {
            let mut res = router.dispatch(&mut req).await;

            let status = match res.status_code() {
                Some(status) => status,
                None => {
                    let status = if res.body().is_none() {
                        StatusCode::NOT_FOUND
                    } else {
                        StatusCode::OK
                    };
                    res.set_status_code(status);
                    status
                }
            };
            let has_error = status.is_client_error() || status.is_server_error();
            if res.body().is_none() && has_error {
                catch(&catchers, &req, &mut res);
            }
            if req.method() == Method::HEAD && !res.body().is_none() {
                tracing::warn!(uri = %req.uri(), "response to HEAD request has a body");
            }

            tracing::debug!(
                method = %req.method(),
                uri = %req.uri(),
                status = status.as_u16(),
                "request handled"
            );
            res
        }
    }
}

fn catch(catchers: &[Box<dyn Catcher>], req: &Request, res: &mut Response) {
    if !catchers.iter().any(|catcher| catcher.catch(req, res)) {
        DefaultCatcher.catch(req, res);
    }
}

impl hyper::service::Service<hyper::Request<hyper::body::Body>> for HyperHandler {
    type Response = hyper::Response<hyper::body::Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
    fn call(&mut self, req: hyper::Request<hyper::body::Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move {
            let res = match Request::from_hyper(req).await {
                Ok(req) => handler.handle(req).await,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read request body");
                    let mut res = Response::new();
                    res.set_status_error(StatusError::bad_request());
                    catch(&handler.catchers, &Request::new(), &mut res);
                    res
                }
            };
            Ok(res.into_hyper())
        })
    }
}

impl<'t> hyper::service::Service<&'t AddrStream> for Service {
    type Response = HyperHandler;
    type Error = IoError;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        Ok(()).into()
    }
    fn call(&mut self, conn: &'t AddrStream) -> Self::Future {
        future::ok(self.hyper_handler(Some(conn.remote_addr())))
    }
}
