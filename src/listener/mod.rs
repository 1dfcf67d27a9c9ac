use std::io::{Error as IoError, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs};
use std::pin::Pin;
use std::task::{Context, Poll};

use hyper::server::accept::Accept;
use hyper::server::conn::{AddrIncoming, AddrStream};

use crate::error::Error;

/// Accepts TCP connections for [`Server`](crate::server::Server).
pub struct TcpListener {
    incoming: AddrIncoming,
}

impl std::fmt::Debug for TcpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpListener")
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

impl TcpListener {
    /// Binds the first address `addr` resolves to that accepts a bind.
    pub fn try_bind(addr: impl ToSocketAddrs) -> crate::Result<Self> {
        let mut last_err = None;
        for addr in addr.to_socket_addrs().map_err(Error::other)? {
            match AddrIncoming::bind(&addr) {
                Ok(mut incoming) => {
                    incoming.set_nodelay(true);
                    return Ok(TcpListener { incoming });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) => Error::Hyper(e),
            None => Error::other(IoError::new(
                ErrorKind::AddrNotAvailable,
                "address resolved to nothing",
            )),
        })
    }
    pub fn local_addr(&self) -> SocketAddr {
        self.incoming.local_addr()
    }
}

impl Accept for TcpListener {
    type Conn = AddrStream;
    type Error = IoError;

    fn poll_accept(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Self::Conn, Self::Error>>> {
        Pin::new(&mut self.get_mut().incoming).poll_accept(cx)
    }
}
