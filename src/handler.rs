use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{request::Request, response::Response};

/// Something a rule can be bound to. The router hands it the matched
/// request, with route variables filled in.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
    async fn handle(&self, req: &mut Request) -> Response;
}

/// Adapts a plain closure into a [`Handler`].
#[derive(Copy, Clone)]
#[allow(missing_debug_implementations)]
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    async fn handle(&self, req: &mut Request) -> Response {
        (self.0)(&*req)
    }
}

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
    async fn handle(&self, req: &mut Request) -> Response {
        (**self).handle(req).await
    }
}
