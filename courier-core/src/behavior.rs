//! # Behaviors
//!
//! Ordered middleware around the handler invocation.
//!
//! Behaviors observe, short-circuit, or transform a dispatch. Each one
//! receives a [`Next`] continuation standing for the remainder of the
//! pipeline: inner behaviors followed by the handler.
//!
//! # Ordering
//!
//! For behaviors registered as `[B0, B1, B2]` around handler `H`, entry order
//! is `B0 -> B1 -> B2 -> H` and return order is `H -> B2 -> B1 -> B0`.
//!
//! # Short-circuit
//!
//! A behavior that returns without calling [`Next::run`] stops the pipeline.
//! Inner behaviors and the handler never run, and the behavior's own result
//! becomes the dispatch result.

use crate::{
    error::BoxError,
    handler::{DynRequestHandler, PipelineFuture},
    request::Request,
};
use std::{fmt, future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Middleware wrapped around the handler of request type `R`.
///
/// # Example
///
/// ```rust
/// use courier_core::{BoxError, CancellationToken, Next, PipelineBehavior, Request};
///
/// struct Audit;
///
/// impl<R: Request> PipelineBehavior<R> for Audit {
///     async fn handle(
///         &self,
///         _request: &R,
///         next: Next<'_, R>,
///         _cancel: &CancellationToken,
///     ) -> Result<R::Response, BoxError> {
///         println!("before");
///         let response = next.run().await;
///         println!("after");
///         response
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `PipelineBehavior<{R}>`",
    label = "missing `PipelineBehavior<{R}>` implementation",
    note = "Behaviors must implement `handle` for the request type `{R}`."
)]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Handle the request, optionally running the rest of the pipeline.
    fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Dynamic object-safe version of [`PipelineBehavior`].
pub trait DynPipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Handle the request (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> PipelineFuture<'a, R::Response>;
}

impl<R: Request, B: PipelineBehavior<R>> DynPipelineBehavior<R> for B {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> PipelineFuture<'a, R::Response> {
        Box::pin(self.handle(request, next, cancel))
    }
}

/// The remainder of a pipeline.
///
/// `Next` is a cursor over the behaviors that have not run yet, terminated
/// by the handler. It holds borrowed slots only, so building it allocates
/// nothing. Running it consumes it: a continuation can be invoked at most
/// once.
pub struct Next<'a, R: Request> {
    request: &'a R,
    cancel: &'a CancellationToken,
    behaviors: &'a [Arc<dyn DynPipelineBehavior<R>>],
    handler: &'a dyn DynRequestHandler<R>,
}

impl<'a, R: Request> Next<'a, R> {
    /// Create a continuation running `behaviors` in order, then `handler`.
    pub fn new(
        request: &'a R,
        cancel: &'a CancellationToken,
        behaviors: &'a [Arc<dyn DynPipelineBehavior<R>>],
        handler: &'a dyn DynRequestHandler<R>,
    ) -> Self {
        Self {
            request,
            cancel,
            behaviors,
            handler,
        }
    }

    /// Number of behaviors still ahead of the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }

    /// Run the rest of the pipeline.
    pub fn run(self) -> PipelineFuture<'a, R::Response> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Next {
                    request: self.request,
                    cancel: self.cancel,
                    behaviors: rest,
                    handler: self.handler,
                };
                behavior.handle_dyn(self.request, next, self.cancel)
            }
            None => self.handler.handle_dyn(self.request, self.cancel),
        }
    }
}

impl<R: Request> fmt::Debug for Next<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("request", &std::any::type_name::<R>())
            .field("remaining", &self.behaviors.len())
            .finish()
    }
}
