//! Transition notification interface.

use async_trait::async_trait;

use crate::dispatch::events::DispatchEvent;

/// Errors a sink may report. They are logged, never returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink failed: {0}")]
    Failed(String),
}

/// Receives committed transitions, after the store transaction.
///
/// Downstream collaborators (driver payouts, tracking views) hang off this;
/// the dispatch core only decides that a transition happened.
#[async_trait]
pub trait DispatchEventSink: Send + Sync {
    async fn publish(&self, event: &DispatchEvent) -> Result<(), SinkError>;
}
