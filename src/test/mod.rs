//! Helpers for driving a [`Service`](crate::service::Service) without sockets.
//!
//! ```ignore
//! let mut res = TestClient::get("http://localhost/nodes/2B4C")
//!     .add_header("accept", "application/json", true)
//!     .send(&service)
//!     .await;
//! let node: serde_json::Value = res.take_json().await?;
//! ```

mod response;

pub use client::{RequestBuilder, TestClient};
pub use response::ResponseExt;
