use std::collections::BTreeMap;

use action_router::prelude::*;
use anyhow::Context;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// In-memory node registry.
#[derive(Default)]
struct Nodes {
    nodes: RwLock<BTreeMap<String, Value>>,
}

#[async_trait]
impl Controller for Nodes {
    async fn index(&self, _req: &mut Request) -> ActionResult {
        let ids = self.nodes.read().keys().cloned().collect::<Vec<_>>();
        Ok(Reply::json(ids))
    }

    async fn create(&self, req: &mut Request) -> ActionResult {
        let node = req.decode_body().context("decoding node")?;
        let id = node
            .get("serialnumber")
            .and_then(Value::as_str)
            .context("node has no serialnumber")?
            .to_owned();
        self.nodes.write().insert(id.clone(), node);
        Ok(Payload::new()
            .body(json!({"id": id}))
            .status(201)
            .content_type("application/json")
            .into())
    }

    async fn show(&self, _req: &mut Request, id: &str) -> ActionResult {
        match self.nodes.read().get(id) {
            Some(node) => Ok(Reply::json(node.clone())),
            None => {
                let mut res = Response::new();
                res.set_status_error(StatusError::not_found().with_summary("unknown node"));
                Ok(Reply::PassThrough(res))
            }
        }
    }

    async fn delete(&self, _req: &mut Request, id: &str) -> ActionResult {
        self.nodes.write().remove(id);
        Ok(Reply::Empty)
    }

    async fn custom(&self, name: &str, _req: &mut Request) -> Option<ActionResult> {
        match name {
            "count" => Some(Ok(Payload::new()
                .body(self.nodes.read().len().to_string())
                .content_type("text/plain")
                .into())),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "action_router=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            DispatchConfig::from_yaml(&source)?
        }
        None => DispatchConfig::default(),
    };

    let nodes = std::sync::Arc::new(ActionHandler::new(Nodes::default()).with_config(&config)?);
    let router = Router::new()
        .push(
            Router::with_path("nodes/count")
                .action("count")
                .get(nodes.clone()),
        )
        .push(Router::resource("nodes", nodes))
        .push(Router::new().get(FnHandler(|_: &Request| {
            let mut res = Response::new();
            match Redirect::found("/nodes") {
                Ok(redirect) => res.render(redirect),
                Err(e) => {
                    tracing::error!(error = %e, "bad redirect target");
                    res.set_status_error(StatusError::internal_server_error());
                }
            }
            res
        })));
    tracing::debug!("routes:\n{:?}", router);

    Server::try_bind(("0.0.0.0", 8080))?
        .serve_with_graceful_shutdown(router, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;
    Ok(())
}
