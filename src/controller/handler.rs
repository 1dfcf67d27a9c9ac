use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::config::DispatchConfig;
use crate::error::Error;
use crate::handler::Handler;
use crate::http::{
    header::CONTENT_TYPE, HeaderValue, Mime, Request, ResBody, Response, StatusCode, StatusError,
};
use crate::serializer::{SerializationError, Serializer};

use super::{Action, Controller, DispatchFault, FaultReport, FaultSink, Payload, Reply, TracingSink};

/// Binds a [`Controller`] to the rule table.
///
/// The `action` route variable selects the controller method; its result is
/// normalized into a [`Response`]. Faults are reported to the configured
/// [`FaultSink`] and answered with a bare `500 Internal Server Error`.
pub struct ActionHandler<C> {
    controller: C,
    serializer: Serializer,
    sink: Arc<dyn FaultSink>,
}

impl<C> std::fmt::Debug for ActionHandler<C>
where
    C: Controller,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("controller", &self.controller.type_name())
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl<C> ActionHandler<C>
where
    C: Controller,
{
    pub fn new(controller: C) -> Self {
        ActionHandler {
            controller,
            serializer: Serializer::new(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }
    pub fn with_fault_sink(mut self, sink: impl FaultSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }
    pub fn with_shared_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Applies `config`, failing when its default content type has no codec.
    pub fn with_config(mut self, config: &DispatchConfig) -> crate::Result<Self> {
        let unsupported = || SerializationError::Unsupported(config.default_content_type.clone());
        let content_type: Mime = config
            .default_content_type
            .parse()
            .map_err(|_| unsupported())?;
        if !self.serializer.supports(&content_type) {
            return Err(Error::Serialization(unsupported()));
        }
        self.serializer = self.serializer.with_default_content_type(content_type);
        Ok(self)
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    #[inline]
    pub fn serialize(
        &self,
        value: &Value,
        content_type: Option<&str>,
    ) -> Result<Bytes, SerializationError> {
        self.serializer.serialize(value, content_type)
    }
    #[inline]
    pub fn deserialize(
        &self,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<Value, SerializationError> {
        self.serializer.deserialize(data, content_type)
    }

    /// Runs the action named by the request's route variables. The handler's
    /// serializer is stored in the request extensions for
    /// [`RequestExt::decode_body`](super::RequestExt::decode_body).
    ///
    /// Never fails: a fault is reported to the sink and turned into a 500
    /// carrying [`StatusError::internal_server_error`] and no detail.
    pub async fn dispatch(&self, req: &mut Request) -> Response {
        let action = req.params().get("action").map(|name| Action::from(name.as_str()));
        req.extensions_mut().insert(self.serializer.clone());
        let outcome = match &action {
            None => Err(DispatchFault::MissingAction),
            Some(action) => match self.invoke(action, req).await {
                Ok(reply) => self.normalize(reply),
                Err(fault) => Err(fault),
            },
        };

        match outcome {
            Ok(res) => res,
            Err(fault) => {
                self.sink.report(&FaultReport {
                    fault: &fault,
                    controller: self.controller.type_name(),
                    action: action.as_ref().map(Action::as_str),
                    method: req.method(),
                    uri: req.uri(),
                });
                let mut res = Response::new();
                res.set_status_error(StatusError::internal_server_error());
                res
            }
        }
    }

    async fn invoke(&self, action: &Action, req: &mut Request) -> Result<Reply, DispatchFault> {
        let controller = &self.controller;
        let result = match action {
            Action::Index => controller.index(req).await,
            Action::Create => controller.create(req).await,
            Action::New => controller.new(req).await,
            Action::Show => {
                let id = member_id(req)?;
                controller.show(req, &id).await
            }
            Action::Update => {
                let id = member_id(req)?;
                controller.update(req, &id).await
            }
            Action::Delete => {
                let id = member_id(req)?;
                controller.delete(req, &id).await
            }
            Action::Edit => {
                let id = member_id(req)?;
                controller.edit(req, &id).await
            }
            Action::Custom(name) => controller
                .custom(name, req)
                .await
                .ok_or_else(|| DispatchFault::UnknownAction(name.clone()))?,
        };
        result.map_err(DispatchFault::Action)
    }

    /// Turns a [`Reply`] into a response.
    pub fn normalize(&self, reply: Reply) -> Result<Response, DispatchFault> {
        match reply {
            Reply::Empty => Ok(Response::with_status_code(StatusCode::NO_CONTENT)),
            Reply::PassThrough(res) => Ok(res),
            Reply::Payload(payload) => self.render_payload(payload),
        }
    }

    fn render_payload(&self, payload: Payload) -> Result<Response, DispatchFault> {
        let Payload {
            body,
            status,
            content_type,
        } = payload;

        let status = match status {
            Some(code) => StatusCode::from_u16(code).map_err(|_| DispatchFault::InvalidStatus(code))?,
            None => StatusCode::OK,
        };
        let content_type = self.serializer.resolve(content_type.as_deref())?;
        let header = HeaderValue::from_str(content_type.as_ref())
            .map_err(|_| SerializationError::Unsupported(content_type.to_string()))?;

        let mut res = Response::with_status_code(status);
        if let Some(body) = body {
            let bytes = self.serializer.encode(&body, &content_type)?;
            res.set_body(ResBody::Once(bytes));
        }
        res.headers_mut().insert(CONTENT_TYPE, header);
        Ok(res)
    }
}

fn member_id(req: &Request) -> Result<String, DispatchFault> {
    req.params()
        .get("id")
        .cloned()
        .ok_or(DispatchFault::MissingParam("id"))
}

#[async_trait]
impl<C> Handler for ActionHandler<C>
where
    C: Controller,
{
    fn type_name(&self) -> &'static str {
        self.controller.type_name()
    }
    async fn handle(&self, req: &mut Request) -> Response {
        self.dispatch(req).await
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::controller::{ActionResult, RequestExt};
    use crate::test::{ResponseExt, TestClient};

    #[derive(Clone, Default)]
    struct CaptureSink(Arc<Mutex<Vec<String>>>);

    impl CaptureSink {
        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    impl FaultSink for CaptureSink {
        fn report(&self, report: &FaultReport<'_>) {
            self.0.lock().push(format!(
                "{} {} {}: {}",
                report.action.unwrap_or("-"),
                report.method,
                report.uri,
                report.fault
            ));
        }
    }

    struct Nodes;

    #[async_trait]
    impl Controller for Nodes {
        async fn index(&self, _req: &mut Request) -> ActionResult {
            Ok(Reply::json(json!([{"id": "2B4C"}])))
        }
        async fn create(&self, _req: &mut Request) -> ActionResult {
            Ok(Reply::body("<p>created</p>"))
        }
        async fn show(&self, _req: &mut Request, id: &str) -> ActionResult {
            Ok(Payload::new()
                .body(json!({"id": id}))
                .status(203)
                .content_type("application/yaml")
                .into())
        }
        async fn update(&self, _req: &mut Request, _id: &str) -> ActionResult {
            Err(anyhow::anyhow!("disk full: /var/lib/nodes"))
        }
        async fn delete(&self, _req: &mut Request, _id: &str) -> ActionResult {
            let mut res = Response::with_status_code(StatusCode::ACCEPTED);
            res.headers_mut()
                .insert("x-queue", HeaderValue::from_static("nodes"));
            res.render("queued");
            Ok(Reply::PassThrough(res))
        }
        async fn edit(&self, _req: &mut Request, _id: &str) -> ActionResult {
            Ok(Payload::new().status(1000).into())
        }
        async fn custom(&self, name: &str, req: &mut Request) -> Option<ActionResult> {
            match name {
                "import" => Some(
                    req.decode_body()
                        .map(Reply::json)
                        .map_err(anyhow::Error::from),
                ),
                "shape" => Some(Reply::try_from(json!(42)).map_err(anyhow::Error::from)),
                "object" => Some(Ok(Reply::body(json!({"a": 1})))),
                _ => None,
            }
        }
    }

    fn handler() -> (ActionHandler<Nodes>, CaptureSink) {
        let sink = CaptureSink::default();
        (ActionHandler::new(Nodes).with_fault_sink(sink.clone()), sink)
    }

    fn request(action: Option<&str>, id: Option<&str>) -> Request {
        let mut req = TestClient::get("http://localhost/nodes").build();
        if let Some(action) = action {
            req.params_mut().insert("action".into(), action.into());
        }
        if let Some(id) = id {
            req.params_mut().insert("id".into(), id.into());
        }
        req
    }

    fn assert_internal_error(res: &Response) {
        assert_eq!(res.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(res.status_error(), Some(&StatusError::internal_server_error()));
        assert!(res.body().is_none());
    }

    #[tokio::test]
    async fn test_missing_action() {
        let (handler, sink) = handler();
        let res = handler.dispatch(&mut request(None, None)).await;
        assert_internal_error(&res);
        assert_eq!(sink.entries(), ["- GET http://localhost/nodes: no `action` route variable"]);
    }

    #[tokio::test]
    async fn test_unknown_action_looks_like_missing_action() {
        let (handler, sink) = handler();
        let missing = handler.dispatch(&mut request(None, None)).await;
        let unknown = handler.dispatch(&mut request(Some("reboot"), None)).await;
        assert_internal_error(&unknown);
        assert_eq!(missing.status_error(), unknown.status_error());
        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].contains("controller has no action `reboot`"));
    }

    #[tokio::test]
    async fn test_default_action_is_empty() {
        let (handler, sink) = handler();
        let res = handler.dispatch(&mut request(Some("new"), None)).await;
        assert_eq!(res.status_code(), Some(StatusCode::NO_CONTENT));
        assert!(res.body().is_none());
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_payload_with_content_type() {
        let (handler, _) = handler();
        let mut res = handler.dispatch(&mut request(Some("index"), None)).await;
        assert_eq!(res.status_code(), Some(StatusCode::OK));
        assert_eq!(res.content_type(), Some(mime::APPLICATION_JSON));
        let expected = handler
            .serialize(&json!([{"id": "2B4C"}]), Some("application/json"))
            .unwrap();
        assert_eq!(res.take_bytes().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_payload_uses_default_content_type() {
        let (handler, _) = handler();
        let mut res = handler.dispatch(&mut request(Some("create"), None)).await;
        assert_eq!(res.status_code(), Some(StatusCode::OK));
        assert_eq!(res.content_type(), Some(mime::TEXT_HTML));
        assert_eq!(res.take_string().await.unwrap(), "<p>created</p>");
    }

    #[tokio::test]
    async fn test_configured_default_content_type() {
        let config = DispatchConfig {
            default_content_type: "application/json".into(),
        };
        let handler = ActionHandler::new(Nodes).with_config(&config).unwrap();
        let mut res = handler.dispatch(&mut request(Some("object"), None)).await;
        assert_eq!(res.content_type(), Some(mime::APPLICATION_JSON));
        assert_eq!(res.take_json::<Value>().await.unwrap(), json!({"a": 1}));

        let config = DispatchConfig {
            default_content_type: "image/png".into(),
        };
        assert!(ActionHandler::new(Nodes).with_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_member_action_gets_id() {
        let (handler, _) = handler();
        let mut res = handler.dispatch(&mut request(Some("show"), Some("2B4C"))).await;
        assert_eq!(res.status_code(), Some(StatusCode::NON_AUTHORITATIVE_INFORMATION));
        let body = res.take_bytes().await.unwrap();
        assert_eq!(
            handler.deserialize(&body, Some("application/yaml")).unwrap(),
            json!({"id": "2B4C"})
        );
    }

    #[tokio::test]
    async fn test_member_action_without_id() {
        let (handler, sink) = handler();
        let res = handler.dispatch(&mut request(Some("show"), None)).await;
        assert_internal_error(&res);
        assert!(sink.entries()[0].contains("missing `id` route variable"));
    }

    #[tokio::test]
    async fn test_pass_through_is_unchanged() {
        let (handler, _) = handler();
        let mut res = handler.dispatch(&mut request(Some("delete"), Some("2B4C"))).await;
        assert_eq!(res.status_code(), Some(StatusCode::ACCEPTED));
        assert_eq!(res.headers().get("x-queue").unwrap(), "nodes");
        assert_eq!(res.content_type().unwrap().essence_str(), "text/plain");
        assert_eq!(res.take_string().await.unwrap(), "queued");
    }

    fn import(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = TestClient::post("http://localhost/nodes/import");
        if let Some(content_type) = content_type {
            builder = builder.add_header(CONTENT_TYPE, content_type, true);
        }
        let mut req = builder.body(body).build();
        req.params_mut().insert("action".into(), "import".into());
        req
    }

    #[tokio::test]
    async fn test_action_decodes_body() {
        let (handler, sink) = handler();
        let mut req = import(Some("application/yaml"), "serialnumber: 2B4C\nports: [1, 2]\n");
        let mut res = handler.dispatch(&mut req).await;
        assert_eq!(res.content_type(), Some(mime::APPLICATION_JSON));
        assert_eq!(
            res.take_json::<Value>().await.unwrap(),
            json!({"serialnumber": "2B4C", "ports": [1, 2]})
        );

        let mut req = import(Some("application/json"), "{not json");
        assert_internal_error(&handler.dispatch(&mut req).await);
        assert!(sink.entries()[0].contains("malformed input"));
    }

    #[tokio::test]
    async fn test_decode_body_uses_default_content_type() {
        let (handler, _) = handler();
        let mut res = handler.dispatch(&mut import(None, "<p>leaf1</p>")).await;
        assert_eq!(res.take_json::<Value>().await.unwrap(), json!("<p>leaf1</p>"));

        let config = DispatchConfig {
            default_content_type: "application/yaml".into(),
        };
        let handler = ActionHandler::new(Nodes).with_config(&config).unwrap();
        let mut res = handler.dispatch(&mut import(None, "name: leaf1\n")).await;
        assert_eq!(res.take_json::<Value>().await.unwrap(), json!({"name": "leaf1"}));
    }

    #[tokio::test]
    async fn test_faults_are_sanitized() {
        let (handler, sink) = handler();
        let cases = [
            (Some("update"), "action failed: disk full: /var/lib/nodes"),
            (Some("edit"), "invalid status code 1000"),
            (Some("shape"), "unrecognized action result of kind number"),
            (Some("object"), "serialization failed: value is not encodable"),
        ];
        for (action, detail) in cases {
            let mut res = handler.dispatch(&mut request(action, Some("2B4C"))).await;
            assert_internal_error(&res);
            let status = res.status_error().cloned().unwrap();
            assert!(!status.to_string().contains(detail));
            assert!(res.take_string().await.unwrap().is_empty());
            let entries = sink.entries();
            assert!(
                entries.last().unwrap().contains(detail),
                "{:?} does not mention {}",
                entries,
                detail
            );
        }
        assert_eq!(sink.entries().len(), 4);
    }

    #[tokio::test]
    async fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let handler = ActionHandler::new(Nodes).with_fault_sink(move |_: &FaultReport<'_>| {
            *counter.lock() += 1;
        });
        handler.dispatch(&mut request(Some("reboot"), None)).await;
        assert_eq!(*seen.lock(), 1);
    }

    #[tokio::test]
    async fn test_as_bound_handler() {
        use crate::routing::{RequestRouter, Router};

        let (handler, _) = handler();
        let router = RequestRouter::new(Router::new().push(Router::resource("nodes", handler)));
        let mut req = TestClient::get("http://localhost/nodes/2B4C").build();
        let res = router.dispatch(&mut req).await;
        assert_eq!(res.status_code(), Some(StatusCode::NON_AUTHORITATIVE_INFORMATION));
        assert_eq!(req.params()["action"], "show");
    }
}
