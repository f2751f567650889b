//! Span instrumentation behavior.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::any::type_name;
use tracing::Instrument;

/// A behavior that runs the rest of the pipeline inside a `tracing` span.
///
/// Events emitted by inner behaviors and the handler are attached to the
/// span, which carries the behavior name and the request type.
#[derive(Debug, Clone, Copy)]
pub struct TracingBehavior {
    name: &'static str,
}

impl TracingBehavior {
    /// Create a tracing behavior with the given span label.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for TracingBehavior {
    fn default() -> Self {
        Self::new("dispatch")
    }
}

impl<R: Request> PipelineBehavior<R> for TracingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let span = tracing::info_span!(
            "request_dispatch",
            behavior = %self.name,
            request = type_name::<R>()
        );
        next.run().instrument(span).await
    }
}
