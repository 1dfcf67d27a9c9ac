use std::{collections::HashMap, fmt, net::SocketAddr, str::FromStr};

use bytes::Bytes;
use hyper::{
    header::{AsHeaderName, IntoHeaderName, ACCEPT, CONTENT_TYPE},
    http::{Extensions, HeaderValue},
    HeaderMap, Method, Uri, Version,
};
use mime::Mime;
use multimap::MultiMap;
use once_cell::sync::OnceCell;

use crate::error::Error;

/// An inbound request with its body already buffered.
///
/// `params` holds the route variables bound by the rule table; they are
/// empty until the request has been matched.
pub struct Request {
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    extensions: Extensions,
    method: Method,
    pub(crate) params: HashMap<String, String>,
    pub(crate) queries: OnceCell<MultiMap<String, String>>,
    version: Version,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("params", &self.params)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Request {
        Request {
            uri: Uri::default(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            extensions: Extensions::default(),
            method: Method::default(),
            params: HashMap::new(),
            queries: OnceCell::new(),
            version: Version::default(),
            remote_addr: None,
        }
    }

    /// Reads the whole hyper body and converts the request.
    pub async fn from_hyper(req: hyper::Request<hyper::Body>) -> Result<Request, Error> {
        let (parts, body) = req.into_parts();
        let body = hyper::body::to_bytes(body).await?;
        Ok(Request {
            uri: parts.uri,
            headers: parts.headers,
            body,
            extensions: parts.extensions,
            method: parts.method,
            version: parts.version,
            ..Request::new()
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
    pub fn uri_mut(&mut self) -> &mut Uri {
        &mut self.uri
    }
    pub fn method(&self) -> &Method {
        &self.method
    }
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }
    pub fn version(&self) -> Version {
        self.version
    }
    pub fn remote_addr(&self) -> Option<&SocketAddr> {
        self.remote_addr.as_ref()
    }
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
    pub fn header<T>(&self, key: impl AsHeaderName) -> Option<T>
    where
        T: FromStr,
    {
        self.headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
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

    pub fn content_type(&self) -> Option<Mime> {
        self.header(CONTENT_TYPE)
    }
    /// Media types listed in `Accept`, in the order the client sent them.
    pub fn accept(&self) -> Vec<Mime> {
        let mut list = Vec::new();
        for value in self.headers.get_all(ACCEPT) {
            if let Ok(value) = value.to_str() {
                list.extend(value.split(',').filter_map(|v| v.trim().parse().ok()));
            }
        }
        list
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
    pub fn params_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.params
    }
    pub fn param<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
    {
        self.params.get(key).and_then(|v| v.parse().ok())
    }

    pub fn queries(&self) -> &MultiMap<String, String> {
        self.queries.get_or_init(|| {
            form_urlencoded::parse(self.uri.query().unwrap_or_default().as_bytes())
                .into_owned()
                .collect()
        })
    }
    pub fn query<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
    {
        self.queries().get(key).and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_order() {
        let mut req = Request::new();
        req.add_header(ACCEPT, "application/json, text/html;q=0.9", true)
            .unwrap();
        let accept = req.accept();
        assert_eq!(accept.len(), 2);
        assert_eq!(accept[0], mime::APPLICATION_JSON);
        assert_eq!(accept[1].essence_str(), "text/html");
    }

    #[test]
    fn test_queries_and_params() {
        let mut req = Request::new();
        *req.uri_mut() = "http://localhost/nodes?limit=10&tag=a&tag=b".parse().unwrap();
        req.params_mut().insert("id".into(), "42".into());
        assert_eq!(req.query::<u32>("limit"), Some(10));
        assert_eq!(req.queries().get_vec("tag").map(Vec::len), Some(2));
        assert_eq!(req.param::<u64>("id"), Some(42));
        assert_eq!(req.param::<u64>("missing"), None);
    }

    #[tokio::test]
    async fn test_from_hyper_buffers_body() {
        let hreq = hyper::Request::post("http://localhost/nodes")
            .header(CONTENT_TYPE, "application/json")
            .body(hyper::Body::from("{\"a\":1}"))
            .unwrap();
        let req = Request::from_hyper(hreq).await.unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.content_type(), Some(mime::APPLICATION_JSON));
        assert_eq!(&req.body()[..], b"{\"a\":1}");
    }
}
