//! Error observation behavior.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::any::type_name;

/// A behavior that logs failures of the rest of the pipeline and re-raises
/// them unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorObserverBehavior;

impl<R: Request> PipelineBehavior<R> for ErrorObserverBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        next.run().await.inspect_err(|error| {
            tracing::warn!(request = type_name::<R>(), %error, "Request raised an error");
        })
    }
}
