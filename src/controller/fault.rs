use thiserror::Error;

use crate::http::{Method, Uri};
use crate::serializer::SerializationError;

/// Everything that can go wrong between a matched route and a response.
///
/// None of these ever reach the client; they are reported to a
/// [`FaultSink`] and replaced by a generic 500.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DispatchFault {
    #[error("no `action` route variable")]
    MissingAction,
    #[error("controller has no action `{0}`")]
    UnknownAction(String),
    #[error("missing `{0}` route variable")]
    MissingParam(&'static str),
    #[error("action failed: {0:#}")]
    Action(anyhow::Error),
    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),
    #[error("invalid status code {0}")]
    InvalidStatus(u16),
}

/// Full diagnostics of one contained fault.
#[derive(Debug)]
pub struct FaultReport<'a> {
    pub fault: &'a DispatchFault,
    pub controller: &'static str,
    pub action: Option<&'a str>,
    pub method: &'a Method,
    pub uri: &'a Uri,
}

/// Receives every fault an [`ActionHandler`](super::ActionHandler) contains.
pub trait FaultSink: Send + Sync + 'static {
    fn report(&self, report: &FaultReport<'_>);
}

/// Logs faults through `tracing` at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl FaultSink for TracingSink {
    fn report(&self, report: &FaultReport<'_>) {
        tracing::error!(
            controller = report.controller,
            action = report.action.unwrap_or("-"),
            method = %report.method,
            uri = %report.uri,
            "unable to dispatch request: {}",
            report.fault
        );
    }
}

impl<F> FaultSink for F
where
    F: Fn(&FaultReport<'_>) + Send + Sync + 'static,
{
    fn report(&self, report: &FaultReport<'_>) {
        self(report)
    }
}
