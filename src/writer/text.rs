use hyper::{header::CONTENT_TYPE, http::HeaderValue};

use crate::http::response::Response;

use super::Piece;

#[non_exhaustive]
pub enum Text<C> {
    /// It will set `content-type` to `text/plain; charset=utf-8`.
    Plain(C),
    /// It will set `content-type` to `text/html; charset=utf-8`.
    Html(C),
}

impl<C> Text<C>
where
    C: AsRef<str>,
{
    fn set_header(self, res: &mut Response) -> C {
        let (ctype, content) = match self {
            Self::Plain(content) => (
                HeaderValue::from_static("text/plain; charset=utf-8"),
                content,
            ),
            Self::Html(content) => (
                HeaderValue::from_static("text/html; charset=utf-8"),
                content,
            ),
        };
        res.headers_mut().insert(CONTENT_TYPE, ctype);
        content
    }
}

impl<C> Piece for Text<C>
where
    C: AsRef<str>,
{
    fn render(self, res: &mut Response) {
        let content = self.set_header(res);
        res.write_body(content.as_ref().as_bytes().to_vec()).ok();
    }
}
