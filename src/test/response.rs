use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::http::{ResBody, Response};

/// Reads back what a handler wrote.
#[async_trait]
pub trait ResponseExt {
    /// Takes the whole body, leaving the response empty.
    async fn take_bytes(&mut self) -> crate::Result<Bytes>;
    async fn take_string(&mut self) -> crate::Result<String>;
    async fn take_json<T: DeserializeOwned>(&mut self) -> crate::Result<T>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn take_bytes(&mut self) -> crate::Result<Bytes> {
        match self.take_body() {
            ResBody::None => Ok(Bytes::new()),
            ResBody::Once(bytes) => Ok(bytes),
            ResBody::Chunks(chunks) => {
                let mut buf = BytesMut::new();
                for chunk in chunks {
                    buf.extend_from_slice(&chunk);
                }
                Ok(buf.freeze())
            }
            ResBody::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk.map_err(Error::Other)?);
                }
                Ok(buf.freeze())
            }
        }
    }
    async fn take_string(&mut self) -> crate::Result<String> {
        let bytes = self.take_bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(Error::other)
    }
    async fn take_json<T: DeserializeOwned>(&mut self) -> crate::Result<T> {
        let bytes = self.take_bytes().await?;
        serde_json::from_slice(&bytes).map_err(Error::other)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    #[tokio::test]
    async fn test_take_from_stream() {
        let mut res = Response::new();
        res.set_stream(stream::iter(vec![
            Ok::<_, crate::error::BoxedError>(Bytes::from_static(b"{\"a\":")),
            Ok(Bytes::from_static(b"1}")),
        ]));
        let value: serde_json::Value = res.take_json().await.unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
        assert!(res.body().is_none());
    }
}
