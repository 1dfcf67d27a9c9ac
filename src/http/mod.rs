pub mod errors;
pub mod request;
pub mod response;

pub use hyper::header::{self, HeaderMap, HeaderValue};
pub use hyper::http::uri;
pub use hyper::{Method, StatusCode, Uri, Version};
pub use mime::{self, Mime};

pub use errors::StatusError;
pub use request::Request;
pub use response::{ResBody, Response};

/// Picks the first media type listed in `Accept`, or `default_type` (html when `None`).
pub(crate) fn guess_accept_mime(req: &Request, default_type: Option<Mime>) -> Mime {
    let dmime = default_type.unwrap_or(mime::TEXT_HTML);
    req.accept().into_iter().next().unwrap_or(dmime)
}
