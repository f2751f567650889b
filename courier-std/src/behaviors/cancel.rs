//! Cancellation guard.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use thiserror::Error;

/// Error returned when a dispatch is refused because its token is cancelled.
#[derive(Debug, Clone, Copy, Error)]
#[error("request was cancelled before it was handled")]
pub struct Cancelled;

/// A behavior that refuses to run the rest of the pipeline once the
/// dispatch's token is cancelled.
///
/// The engine itself never inspects the token. Register this guard to opt in
/// to early refusal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationGuard;

impl<R: Request> PipelineBehavior<R> for CancellationGuard {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        if cancel.is_cancelled() {
            return Err(Box::new(Cancelled));
        }
        next.run().await
    }
}
