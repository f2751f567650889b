//! # Handlers
//!
//! The terminal point of a dispatch: given a request and a cancellation
//! token, eventually produce the request's response or fail.
//!
//! Exactly one handler is expected per request type. Which one wins when
//! several are registered is decided by the [`CapabilityProvider`], not by
//! the dispatch engine.
//!
//! [`CapabilityProvider`]: crate::CapabilityProvider

use crate::{error::BoxError, request::Request};
use std::{future::Future, pin::Pin};
use tokio_util::sync::CancellationToken;

/// A boxed, sendable future yielding a pipeline result.
pub type PipelineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send + 'a>>;

/// The single capability that services a request type.
///
/// The cancellation token is passed through unchanged from the dispatch
/// call. Observing it is the handler's responsibility.
///
/// # Static vs Dynamic Dispatch
///
/// This trait uses native `async fn` for zero-cost static dispatch.
/// Registries store handlers as [`DynRequestHandler`] trait objects.
///
/// # Example
///
/// ```rust
/// use courier_core::{BoxError, CancellationToken, Request, RequestHandler};
///
/// struct Ping;
/// impl Request for Ping {
///     type Response = String;
/// }
///
/// struct PingHandler;
///
/// impl RequestHandler<Ping> for PingHandler {
///     async fn handle(&self, _request: &Ping, _cancel: &CancellationToken) -> Result<String, BoxError> {
///         Ok("Pong".to_string())
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle requests of type `{R}`",
    label = "missing `RequestHandler<{R}>` implementation",
    note = "Handlers must implement `handle` for the request type `{R}`."
)]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Produce the response for `request`.
    fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send;
}

/// Dynamic object-safe version of [`RequestHandler`].
pub trait DynRequestHandler<R: Request>: Send + Sync + 'static {
    /// Produce the response for `request` (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> PipelineFuture<'a, R::Response>;
}

// Blanket implementation: Any type implementing RequestHandler implements DynRequestHandler automatically.
impl<R: Request, H: RequestHandler<R>> DynRequestHandler<R> for H {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a R,
        cancel: &'a CancellationToken,
    ) -> PipelineFuture<'a, R::Response> {
        Box::pin(self.handle(request, cancel))
    }
}
