use std::fmt;

use hyper::StatusCode;

use crate::{http::response::Response, writer::Piece};

/// Client-facing description of an error status.
///
/// Everything in here may be rendered to the client by a catcher, so it
/// must never carry internal fault detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusError {
    pub code: StatusCode,
    pub name: String,
    pub summary: Option<String>,
    pub detail: Option<String>,
}

impl std::error::Error for StatusError {}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_u16(), self.name)?;
        if let Some(summary) = &self.summary {
            write!(f, " ({})", summary)?;
        }
        Ok(())
    }
}

macro_rules! default_errors {
    ($($name:ident, $code:expr);+ $(;)?) => {
        $(
            pub fn $name() -> StatusError {
                StatusError::new($code)
            }
        )+
    };
}

impl StatusError {
    fn new(code: StatusCode) -> StatusError {
        StatusError {
            code,
            name: code.canonical_reason().unwrap_or("Unknown").to_owned(),
            summary: None,
            detail: None,
        }
    }

    default_errors! {
        bad_request, StatusCode::BAD_REQUEST;
        not_found, StatusCode::NOT_FOUND;
        method_not_allowed, StatusCode::METHOD_NOT_ALLOWED;
        not_acceptable, StatusCode::NOT_ACCEPTABLE;
        unsupported_media_type, StatusCode::UNSUPPORTED_MEDIA_TYPE;
        internal_server_error, StatusCode::INTERNAL_SERVER_ERROR;
        not_implemented, StatusCode::NOT_IMPLEMENTED;
        service_unavailable, StatusCode::SERVICE_UNAVAILABLE;
    }

    /// Only client and server error codes have a `StatusError`.
    pub fn from_code(code: StatusCode) -> Option<StatusError> {
        if code.is_client_error() || code.is_server_error() {
            Some(StatusError::new(code))
        } else {
            None
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl Piece for StatusError {
    fn render(self, res: &mut Response) {
        res.set_status_error(self);
    }
}
