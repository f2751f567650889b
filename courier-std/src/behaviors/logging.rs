//! Logging behavior for dispatch observation.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::any::type_name;

/// A behavior that logs every dispatch and its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

impl<R: Request> PipelineBehavior<R> for LoggingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let request = type_name::<R>();
        tracing::info!(request, "Handling request");
        let result = next.run().await;
        match &result {
            Ok(_) => tracing::info!(request, "Request handled"),
            Err(error) => tracing::error!(request, %error, "Request failed"),
        }
        result
    }
}
