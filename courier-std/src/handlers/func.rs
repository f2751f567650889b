//! Closure-backed handlers.

use courier_core::{BoxError, CancellationToken, Request, RequestHandler};
use std::{fmt, future::Future, marker::PhantomData};

/// A handler backed by a closure.
///
/// The closure receives the request by reference and an owned clone of the
/// cancellation token. The future it returns must not borrow the request:
/// copy out what the async part needs first.
///
/// # Example
///
/// ```rust,ignore
/// let handler = handler_fn(|request: &Add, _cancel| {
///     let sum = request.a + request.b;
///     async move { Ok(sum) }
/// });
/// ```
pub struct FnHandler<R, F> {
    func: F,
    _marker: PhantomData<fn(&R)>,
}

impl<R, F> FnHandler<R, F> {
    /// Wrap a closure as a handler.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

impl<R, F: Clone> Clone for FnHandler<R, F> {
    fn clone(&self) -> Self {
        Self::new(self.func.clone())
    }
}

impl<R, F> fmt::Debug for FnHandler<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("request", &std::any::type_name::<R>())
            .finish()
    }
}

/// Create a [`FnHandler`] from a closure.
pub fn handler_fn<R, F, Fut>(func: F) -> FnHandler<R, F>
where
    R: Request,
    F: Fn(&R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    FnHandler::new(func)
}

impl<R, F, Fut> RequestHandler<R> for FnHandler<R, F>
where
    R: Request,
    F: Fn(&R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<R::Response, BoxError>> + Send {
        (self.func)(request, cancel.clone())
    }
}
