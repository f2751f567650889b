//! Testing utilities for courier.
//!
//! This module provides handlers, behaviors and a provider wrapper that make
//! pipeline ordering, invocation counts and provider traffic observable.
//!
//! # Features
//!
//! - [`CallLog`]: A shared, ordered log of pipeline events
//! - [`RecordingBehavior`]: A behavior that logs before and after `next`
//! - [`ShortCircuitBehavior`]: A behavior that answers without calling `next`
//! - [`FlagBehavior`]: A behavior that raises a flag when it runs
//! - [`CountingHandler`]: A handler that counts its invocations
//! - [`FailingHandler`]: A handler that always fails
//! - [`CountingProvider`]: A provider wrapper counting every query

use courier_core::{
    BoxError, CancellationToken, CapabilityKey, CapabilityProvider, Instance, Next,
    PipelineBehavior, ProviderId, Request, RequestHandler, ResolveError,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use thiserror::Error;

// ============================================================================
// Call Log
// ============================================================================

/// A shared, ordered log of pipeline events.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// Get a copy of the recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Clear all recorded entries.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

// ============================================================================
// Recording Behavior
// ============================================================================

/// A behavior that records `"{name}:before"` and `"{name}:after"` around
/// the rest of the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// let registry = RegistryBuilder::new()
///     .behavior::<Ping, _>(RecordingBehavior::new("b0", &log))
///     .behavior::<Ping, _>(RecordingBehavior::new("b1", &log))
///     .handler::<Ping, _>(CountingHandler::new(Pong).with_log(&log))
///     .build();
///
/// // after a dispatch:
/// assert_eq!(log.entries(), ["b0:before", "b1:before", "handler", "b1:after", "b0:after"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingBehavior {
    name: &'static str,
    log: CallLog,
}

impl RecordingBehavior {
    /// Create a recording behavior writing to `log`.
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl<R: Request> PipelineBehavior<R> for RecordingBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        self.log.push(format!("{}:before", self.name));
        let result = next.run().await;
        self.log.push(format!("{}:after", self.name));
        result
    }
}

// ============================================================================
// Short-circuit Behavior
// ============================================================================

/// A behavior that returns a fixed response without calling `next`.
#[derive(Debug, Clone)]
pub struct ShortCircuitBehavior<T> {
    response: T,
}

impl<T> ShortCircuitBehavior<T> {
    /// Create a behavior answering with `response`.
    pub fn new(response: T) -> Self {
        Self { response }
    }
}

impl<R, T> PipelineBehavior<R> for ShortCircuitBehavior<T>
where
    R: Request<Response = T>,
    T: Clone + Send + Sync + 'static,
{
    async fn handle(
        &self,
        _request: &R,
        _next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<T, BoxError> {
        Ok(self.response.clone())
    }
}

// ============================================================================
// Flag Behavior
// ============================================================================

/// A pass-through behavior that raises a flag every time it runs.
#[derive(Debug, Clone, Default)]
pub struct FlagBehavior {
    flag: Arc<AtomicBool>,
}

impl FlagBehavior {
    /// Create a behavior with a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a behavior raising a flag shared with the caller.
    pub fn with_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Get a handle to the flag.
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }

    /// Check whether the behavior has run.
    pub fn was_called(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl<R: Request> PipelineBehavior<R> for FlagBehavior {
    async fn handle(
        &self,
        _request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        self.flag.store(true, Ordering::SeqCst);
        next.run().await
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that answers with a fixed response and counts its invocations.
#[derive(Debug, Clone)]
pub struct CountingHandler<T> {
    response: T,
    calls: Arc<AtomicUsize>,
    log: Option<CallLog>,
}

impl<T> CountingHandler<T> {
    /// Create a handler answering with `response`.
    pub fn new(response: T) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    /// Also record `"handler"` in `log` on every invocation.
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Get the number of invocations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Get a handle to the invocation counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl<R, T> RequestHandler<R> for CountingHandler<T>
where
    R: Request<Response = T>,
    T: Clone + Send + Sync + 'static,
{
    async fn handle(&self, _request: &R, _cancel: &CancellationToken) -> Result<T, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.push("handler");
        }
        Ok(self.response.clone())
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// Error raised by [`FailingHandler`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TestFailure(pub String);

/// A handler that always fails with [`TestFailure`].
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<R: Request> RequestHandler<R> for FailingHandler {
    async fn handle(&self, _request: &R, _cancel: &CancellationToken) -> Result<R::Response, BoxError> {
        Err(Box::new(TestFailure(self.message.clone())))
    }
}

// ============================================================================
// Counting Provider
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    resolve: AtomicUsize,
    resolve_all: AtomicUsize,
    contains: AtomicUsize,
    count: AtomicUsize,
}

/// A provider wrapper counting every query made against the inner provider.
///
/// Plan construction only uses `contains` and `count`; execution only uses
/// `resolve` and `resolve_all`. The two groups are reported separately.
#[derive(Debug)]
pub struct CountingProvider<P> {
    inner: P,
    counters: Arc<Counters>,
}

impl<P> CountingProvider<P> {
    /// Wrap a provider.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            counters: Arc::default(),
        }
    }

    /// Get the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of `resolve` calls.
    pub fn resolves(&self) -> usize {
        self.counters.resolve.load(Ordering::SeqCst)
    }

    /// Number of `resolve_all` calls.
    pub fn resolve_alls(&self) -> usize {
        self.counters.resolve_all.load(Ordering::SeqCst)
    }

    /// Number of `contains` and `count` calls.
    pub fn build_queries(&self) -> usize {
        self.counters.contains.load(Ordering::SeqCst) + self.counters.count.load(Ordering::SeqCst)
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        self.counters.resolve.store(0, Ordering::SeqCst);
        self.counters.resolve_all.store(0, Ordering::SeqCst);
        self.counters.contains.store(0, Ordering::SeqCst);
        self.counters.count.store(0, Ordering::SeqCst);
    }
}

impl<P: CapabilityProvider> CapabilityProvider for CountingProvider<P> {
    fn id(&self) -> ProviderId {
        self.inner.id()
    }

    fn resolve(&self, key: &CapabilityKey) -> Result<Instance, ResolveError> {
        self.counters.resolve.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(key)
    }

    fn resolve_all(&self, key: &CapabilityKey) -> Result<Vec<Instance>, ResolveError> {
        self.counters.resolve_all.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_all(key)
    }

    fn contains(&self, key: &CapabilityKey) -> bool {
        self.counters.contains.fetch_add(1, Ordering::SeqCst);
        self.inner.contains(key)
    }

    fn count(&self, key: &CapabilityKey) -> usize {
        self.counters.count.fetch_add(1, Ordering::SeqCst);
        self.inner.count(key)
    }
}
