use thiserror::Error;

use crate::serializer::SerializationError;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("hyper error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("http error: {0}")]
    Http(#[from] hyper::http::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
    #[error("{0}")]
    Other(BoxedError),
}

impl Error {
    pub fn other(error: impl Into<BoxedError>) -> Self {
        Self::Other(error.into())
    }
}
