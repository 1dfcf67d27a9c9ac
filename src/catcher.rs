//! Error pages for responses that carry an error status but no body.

use hyper::{header, StatusCode};
use mime::Mime;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::http::{guess_accept_mime, HeaderValue, Request, Response, StatusError};

static SUPPORTED_FORMATS: Lazy<Vec<mime::Name>> =
    Lazy::new(|| vec![mime::JSON, mime::HTML, mime::XML, mime::PLAIN]);
const EMPTY_DETAIL_MSG: &str = "there is no more detailed explanation";

/// Gets a chance to write an error page. Returns `true` once it has.
pub trait Catcher: Send + Sync + 'static {
    fn catch(&self, req: &Request, res: &mut Response) -> bool;
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn status_error_html(err: &StatusError) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width">
    <title>{0}: {1}</title>
    <style>
    body {{
        background: #fff;
        color: #222;
        text-align: center;
    }}
    @media (prefers-color-scheme: dark) {{
        body {{
            background: #222;
            color: #ddd;
        }}
    }}
    </style>
</head>
<body>
    <div>
        <h1>{0}: {1}</h1>{2}<p>{3}</p>
    </div>
</body>
</html>"#,
        err.code.as_u16(),
        escape(&err.name),
        err.summary
            .as_deref()
            .map(|summary| format!("<h3>{}</h3>", escape(summary)))
            .unwrap_or_default(),
        escape(err.detail.as_deref().unwrap_or(EMPTY_DETAIL_MSG)),
    )
}
fn status_error_json(err: &StatusError) -> String {
    json!({
        "error": {
            "code": err.code.as_u16(),
            "name": err.name,
            "summary": err.summary.as_deref().unwrap_or(&err.name),
            "detail": err.detail.as_deref().unwrap_or(EMPTY_DETAIL_MSG),
        }
    })
    .to_string()
}
fn status_error_plain(err: &StatusError) -> String {
    format!(
        "code: {}\nname: {}\nsummary: {}\ndetail: {}",
        err.code.as_u16(),
        err.name,
        err.summary.as_deref().unwrap_or(&err.name),
        err.detail.as_deref().unwrap_or(EMPTY_DETAIL_MSG)
    )
}
fn status_error_xml(err: &StatusError) -> String {
    format!(
        "<error><code>{}</code><name>{}</name><summary>{}</summary><detail>{}</detail></error>",
        err.code.as_u16(),
        escape(&err.name),
        escape(err.summary.as_deref().unwrap_or(&err.name)),
        escape(err.detail.as_deref().unwrap_or(EMPTY_DETAIL_MSG))
    )
}

/// Renders `err` in `prefer_format` when it is one of html, json, xml or
/// plain text, falling back to html.
pub fn status_error_bytes(err: &StatusError, prefer_format: &Mime) -> (Mime, Vec<u8>) {
    let format = if SUPPORTED_FORMATS.contains(&prefer_format.subtype()) {
        prefer_format.clone()
    } else {
        mime::TEXT_HTML_UTF_8
    };
    let content = match format.subtype().as_ref() {
        "plain" => status_error_plain(err),
        "json" => status_error_json(err),
        "xml" => status_error_xml(err),
        _ => status_error_html(err),
    };
    (format, content.into_bytes())
}

/// Writes the response's [`StatusError`], or a generic one for its status
/// code, in the format the client accepts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCatcher;

impl Catcher for DefaultCatcher {
    fn catch(&self, req: &Request, res: &mut Response) -> bool {
        let status = res.status_code().unwrap_or(StatusCode::NOT_FOUND);
        if !status.is_server_error() && !status.is_client_error() {
            return false;
        }
        let err = match res.status_error() {
            Some(err) => err.clone(),
            None => match StatusError::from_code(status) {
                Some(err) => err,
                None => return false,
            },
        };
        let format = guess_accept_mime(req, None);
        let (format, data) = status_error_bytes(&err, &format);
        match HeaderValue::from_str(format.as_ref()) {
            Ok(value) => {
                res.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Err(e) => tracing::warn!(error = %e, "invalid error page content type"),
        }
        res.write_body(data).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::handler::FnHandler;
    use crate::routing::Router;
    use crate::service::Service;
    use crate::test::{ResponseExt, TestClient};

    struct Handle404;
    impl Catcher for Handle404 {
        fn catch(&self, _req: &Request, res: &mut Response) -> bool {
            if let Some(StatusCode::NOT_FOUND) = res.status_code() {
                res.render("Custom 404 Error Page");
                true
            } else {
                false
            }
        }
    }

    fn failing(_req: &Request) -> Response {
        let mut res = Response::new();
        res.set_status_error(StatusError::internal_server_error());
        res
    }

    #[test]
    fn test_formats() {
        let err = StatusError::bad_request().with_summary("<bad>");
        let (format, body) = status_error_bytes(&err, &mime::APPLICATION_JSON);
        assert_eq!(format, mime::APPLICATION_JSON);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(body["error"]["summary"], "<bad>");

        let (format, body) = status_error_bytes(&err, &mime::IMAGE_PNG);
        assert_eq!(format, mime::TEXT_HTML_UTF_8);
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("<h3>&lt;bad&gt;</h3>"));

        let (_, body) = status_error_bytes(&err, &mime::TEXT_XML);
        assert!(String::from_utf8(body).unwrap().starts_with("<error><code>400</code>"));
    }

    #[tokio::test]
    async fn test_default_catcher_by_accept() {
        let service = Service::new(Router::new().push(Router::with_path("fail").get(FnHandler(failing))));

        let mut res = TestClient::get("http://127.0.0.1:7878/fail")
            .add_header("accept", "application/json", true)
            .send(&service)
            .await;
        assert_eq!(res.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(res.content_type(), Some(mime::APPLICATION_JSON));
        let body: Value = res.take_json().await.unwrap();
        assert_eq!(body["error"]["name"], "Internal Server Error");

        let mut res = TestClient::get("http://127.0.0.1:7878/fail")
            .add_header("accept", "text/plain", true)
            .send(&service)
            .await;
        assert!(res.take_string().await.unwrap().starts_with("code: 500\n"));
    }

    #[tokio::test]
    async fn test_custom_catcher() {
        let catchers: Vec<Box<dyn Catcher>> = vec![Box::new(Handle404)];
        let service = Service::new(Router::new()).with_catchers(catchers);

        let mut res = TestClient::get("http://127.0.0.1:7878/notfound")
            .send(&service)
            .await;
        assert_eq!(res.take_string().await.unwrap(), "Custom 404 Error Page");

        let mut res = TestClient::get("http://127.0.0.1:7878/notfound")
            .send(&Service::new(Router::new()))
            .await;
        assert!(res.take_string().await.unwrap().contains("<h1>404: Not Found</h1>"));
    }
}
