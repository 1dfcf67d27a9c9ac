use core::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};

use hyper::Server as HyperServer;

use crate::listener::TcpListener;
use crate::service::Service;

/// Serves a [`Service`] over TCP.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub fn new(listener: TcpListener) -> Self {
        Server { listener }
    }
    pub fn try_bind(addr: impl ToSocketAddrs) -> crate::Result<Self> {
        TcpListener::try_bind(addr).map(Server::new)
    }
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Runs until the underlying hyper server fails.
    pub async fn serve<S>(self, service: S) -> crate::Result<()>
    where
        S: Into<Service>,
    {
        tracing::info!(addr = %self.local_addr(), "listening");
        HyperServer::builder(self.listener)
            .serve(service.into())
            .await?;
        Ok(())
    }

    /// Stops accepting connections once `signal` completes and waits for
    /// in-flight requests.
    pub async fn serve_with_graceful_shutdown<S, G>(self, service: S, signal: G) -> crate::Result<()>
    where
        S: Into<Service>,
        G: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(addr = %self.local_addr(), "listening");
        let server = HyperServer::builder(self.listener).serve(service.into());
        if let Err(err) = server.with_graceful_shutdown(signal).await {
            tracing::error!(error = %err, "server error");
            return Err(err.into());
        }
        tracing::info!("server stopped");
        Ok(())
    }
}
