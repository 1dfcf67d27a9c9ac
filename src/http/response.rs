use std::{collections::VecDeque, fmt, pin::Pin, task::Poll};

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use hyper::{
    header::{IntoHeaderName, CONTENT_TYPE},
    http::HeaderValue,
    HeaderMap, StatusCode, Version,
};
use mime::Mime;

use crate::{
    error::{BoxedError, Error},
    writer::Piece,
};

use super::errors::StatusError;

#[allow(clippy::type_complexity)]
#[non_exhaustive]
pub enum ResBody {
    /// None body.
    None,
    /// Once bytes body.
    Once(Bytes),
    /// Chunks body.
    Chunks(VecDeque<Bytes>),
    /// Stream body.
    Stream(Pin<Box<dyn Stream<Item = Result<Bytes, BoxedError>> + Send>>),
}

impl ResBody {
    pub fn is_none(&self) -> bool {
        matches!(*self, ResBody::None)
    }
    pub fn is_once(&self) -> bool {
        matches!(*self, ResBody::Once(_))
    }
    pub fn is_chunks(&self) -> bool {
        matches!(*self, ResBody::Chunks(_))
    }
    pub fn is_stream(&self) -> bool {
        matches!(*self, ResBody::Stream(_))
    }
    pub fn size(&self) -> Option<u64> {
        match self {
            ResBody::None => Some(0),
            ResBody::Once(bytes) => Some(bytes.len() as u64),
            ResBody::Chunks(chunks) => Some(chunks.iter().map(|bytes| bytes.len() as u64).sum()),
            ResBody::Stream(_) => None,
        }
    }
}

impl fmt::Debug for ResBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResBody::None => write!(f, "ResBody::None"),
            ResBody::Once(bytes) => write!(f, "ResBody::Once({} bytes)", bytes.len()),
            ResBody::Chunks(chunks) => write!(f, "ResBody::Chunks({} chunks)", chunks.len()),
            ResBody::Stream(_) => write!(f, "ResBody::Stream"),
        }
    }
}

impl Stream for ResBody {
    type Item = Result<Bytes, BoxedError>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        match self.get_mut() {
            ResBody::None => Poll::Ready(None),
            ResBody::Once(bytes) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    let bytes = std::mem::replace(bytes, Bytes::new());
                    Poll::Ready(Some(Ok(bytes)))
                }
            }
            ResBody::Chunks(chunks) => Poll::Ready(chunks.pop_front().map(Ok)),
            ResBody::Stream(stream) => stream.as_mut().poll_next(cx),
        }
    }
}

/// The outbound unit handed back to the transport.
///
/// A `None` status code means no stage has decided one yet; the service
/// fills it in before writing back.
pub struct Response {
    status_code: Option<StatusCode>,
    pub(crate) status_error: Option<StatusError>,
    headers: HeaderMap,
    version: Version,
    pub(crate) body: ResBody,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

impl Response {
    pub fn new() -> Response {
        Response {
            status_code: None,
            status_error: None,
            body: ResBody::None,
            version: Version::default(),
            headers: HeaderMap::new(),
        }
    }
    pub fn with_status_code(code: StatusCode) -> Response {
        let mut res = Response::new();
        res.set_status_code(code);
        res
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
    pub fn set_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }
    pub fn add_header<N, V>(&mut self, name: N, value: V, overwrite: bool) -> crate::Result<()>
    where
        N: IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        let value = value
            .try_into()
            .map_err(|_| Error::other("invalid header value"))?;
        if overwrite {
            self.headers.insert(name, value);
        } else {
            self.headers.append(name, value);
        }
        Ok(())
    }
    pub fn with_header<N, V>(
        &mut self,
        name: N,
        value: V,
        overwrite: bool,
    ) -> crate::Result<&mut Self>
    where
        N: IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        self.add_header(name, value, overwrite)?;
        Ok(self)
    }
    pub fn content_type(&self) -> Option<Mime> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    pub fn version(&self) -> Version {
        self.version
    }
    pub fn version_mut(&mut self) -> &mut Version {
        &mut self.version
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }
    pub fn set_status_code(&mut self, code: StatusCode) {
        self.status_code = Some(code);
        if !code.is_client_error() && !code.is_server_error() {
            self.status_error = None;
        }
    }
    pub fn status_error(&self) -> Option<&StatusError> {
        self.status_error.as_ref()
    }
    pub fn set_status_error(&mut self, err: StatusError) {
        self.status_code = Some(err.code);
        self.status_error = Some(err);
    }

    pub fn body(&self) -> &ResBody {
        &self.body
    }
    pub fn set_body(&mut self, body: ResBody) {
        self.body = body;
    }
    pub fn replace_body(&mut self, body: ResBody) -> ResBody {
        std::mem::replace(&mut self.body, body)
    }
    pub fn take_body(&mut self) -> ResBody {
        self.replace_body(ResBody::None)
    }
    pub fn set_stream<S>(&mut self, stream: S)
    where
        S: Stream<Item = Result<Bytes, BoxedError>> + Send + 'static,
    {
        self.body = ResBody::Stream(Box::pin(stream));
    }
    /// Appends to the body; fails if the body is already a stream.
    pub fn write_body(&mut self, data: impl Into<Bytes>) -> crate::Result<()> {
        match self.body_mut() {
            ResBody::None => {
                self.body = ResBody::Once(data.into());
            }
            ResBody::Once(bytes) => {
                let mut chunks = VecDeque::with_capacity(2);
                chunks.push_back(std::mem::take(bytes));
                chunks.push_back(data.into());
                self.body = ResBody::Chunks(chunks);
            }
            ResBody::Chunks(chunks) => chunks.push_back(data.into()),
            ResBody::Stream(_) => {
                tracing::error!("current body kind is stream, try to write bytes to it");
                return Err(Error::other("current body kind is stream"));
            }
        }
        Ok(())
    }
    fn body_mut(&mut self) -> &mut ResBody {
        &mut self.body
    }

    pub fn render<P>(&mut self, piece: P)
    where
        P: Piece,
    {
        piece.render(self);
    }

    /// Converts into a hyper response. A missing status is written as 404.
    pub fn into_hyper(self) -> hyper::Response<hyper::Body> {
        let Response {
            status_code,
            headers,
            version,
            body,
            ..
        } = self;
        let body = match body {
            ResBody::None => hyper::Body::empty(),
            ResBody::Once(bytes) => hyper::Body::from(bytes),
            ResBody::Chunks(chunks) => {
                let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in chunks {
                    buf.extend_from_slice(&chunk);
                }
                hyper::Body::from(buf.freeze())
            }
            ResBody::Stream(stream) => hyper::Body::wrap_stream(stream),
        };
        let mut res = hyper::Response::new(body);
        *res.status_mut() = status_code.unwrap_or(StatusCode::NOT_FOUND);
        *res.headers_mut() = headers;
        *res.version_mut() = version;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_body_grows_into_chunks() {
        let mut res = Response::new();
        assert!(res.body().is_none());
        res.write_body("hello").unwrap();
        assert!(res.body().is_once());
        res.write_body(" world").unwrap();
        assert!(res.body().is_chunks());
        assert_eq!(res.body().size(), Some(11));
    }

    #[test]
    fn test_write_body_refuses_stream() {
        let mut res = Response::new();
        res.set_stream(futures_util::stream::iter(vec![Ok::<_, BoxedError>(
            Bytes::from_static(b"x"),
        )]));
        assert!(res.write_body("y").is_err());
    }

    #[test]
    fn test_status_error_sets_code() {
        let mut res = Response::new();
        res.set_status_error(StatusError::not_found());
        assert_eq!(res.status_code(), Some(StatusCode::NOT_FOUND));
        res.set_status_code(StatusCode::OK);
        assert!(res.status_error().is_none());
    }

    #[tokio::test]
    async fn test_into_hyper() {
        let mut res = Response::with_status_code(StatusCode::CREATED);
        res.add_header(CONTENT_TYPE, "text/plain", true).unwrap();
        res.write_body("a").unwrap();
        res.write_body("b").unwrap();
        let hres = res.into_hyper();
        assert_eq!(hres.status(), StatusCode::CREATED);
        assert_eq!(hres.headers()[CONTENT_TYPE], "text/plain");
        let body = hyper::body::to_bytes(hres.into_body()).await.unwrap();
        assert_eq!(&body[..], b"ab");
    }
}
