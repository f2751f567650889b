//! Timeout behavior for time-limited execution.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Error returned when the pipeline times out.
#[derive(Debug, Clone, Copy, Error)]
#[error("request handling timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// A behavior that fails the dispatch when the rest of the pipeline takes
/// longer than a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutBehavior {
    duration: Duration,
}

impl TimeoutBehavior {
    /// Create a new timeout behavior.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<R: Request> PipelineBehavior<R> for TimeoutBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        match timeout(self.duration, next.run()).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(TimeoutError(self.duration))),
        }
    }
}
