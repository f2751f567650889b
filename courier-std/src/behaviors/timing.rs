//! Timing behavior.

use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
use std::{any::type_name, time::Instant};

/// A behavior that reports how long the rest of the pipeline took.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingBehavior;

impl<R: Request> PipelineBehavior<R> for TimingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let start = Instant::now();
        let result = next.run().await;
        tracing::debug!(
            request = type_name::<R>(),
            elapsed_us = start.elapsed().as_micros() as u64,
            ok = result.is_ok(),
            "Request timed"
        );
        result
    }
}
