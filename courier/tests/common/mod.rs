#![allow(dead_code)]

use courier::{
    BoxError, CancellationToken, CapabilityKey, CapabilityProvider, Dispatcher, Instance,
    PipelineBehavior, ProviderId, Registry, Request, RequestHandler, ResolveError,
    erase_behavior, erase_handler,
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc, time::Duration};

// ============================================================================
// Test Request Types
// ============================================================================

#[derive(Debug, Default)]
pub struct Ping;

impl Request for Ping {
    type Response = String;
}

#[derive(Debug)]
pub struct Add {
    pub a: i64,
    pub b: i64,
}

impl Request for Add {
    type Response = i64;
}

/// A request type nothing is registered for.
#[derive(Debug)]
pub struct Orphan;

impl Request for Orphan {
    type Response = ();
}

#[derive(Debug)]
pub struct Wait {
    pub millis: u64,
}

impl Request for Wait {
    type Response = bool;
}

// ============================================================================
// Test Handlers
// ============================================================================

pub struct PingHandler;

impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, _request: &Ping, _cancel: &CancellationToken) -> Result<String, BoxError> {
        Ok("Pong".to_string())
    }
}

pub struct AddHandler;

impl RequestHandler<Add> for AddHandler {
    async fn handle(&self, request: &Add, _cancel: &CancellationToken) -> Result<i64, BoxError> {
        tokio::task::yield_now().await;
        Ok(request.a + request.b)
    }
}

/// Waits until the token is cancelled or the delay elapses; answers whether
/// it was cancelled.
pub struct WaitHandler;

impl RequestHandler<Wait> for WaitHandler {
    async fn handle(&self, request: &Wait, cancel: &CancellationToken) -> Result<bool, BoxError> {
        tokio::select! {
            _ = cancel.cancelled() => Ok(true),
            _ = tokio::time::sleep(Duration::from_millis(request.millis)) => Ok(false),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn dispatcher_over(registry: Registry) -> Dispatcher {
    Dispatcher::new(Arc::new(registry))
}

/// A provider whose registrations can change after dispatchers are built.
#[derive(Default)]
pub struct MutableProvider {
    id: ProviderId,
    entries: RwLock<HashMap<CapabilityKey, Vec<Instance>>>,
}

impl MutableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler<R: Request, H: RequestHandler<R>>(&self, handler: H) {
        self.push(CapabilityKey::handler::<R>(), erase_handler::<R>(Arc::new(handler)));
    }

    pub fn add_behavior<R: Request, B: PipelineBehavior<R>>(&self, behavior: B) {
        self.push(CapabilityKey::behavior::<R>(), erase_behavior::<R>(Arc::new(behavior)));
    }

    pub fn clear_behaviors<R: Request>(&self) {
        self.entries.write().remove(&CapabilityKey::behavior::<R>());
    }

    fn push(&self, key: CapabilityKey, instance: Instance) {
        self.entries.write().entry(key).or_default().push(instance);
    }
}

impl CapabilityProvider for MutableProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn resolve(&self, key: &CapabilityKey) -> Result<Instance, ResolveError> {
        self.entries
            .read()
            .get(key)
            .and_then(|list| list.last().cloned())
            .ok_or_else(|| ResolveError::not_registered(key))
    }

    fn resolve_all(&self, key: &CapabilityKey) -> Result<Vec<Instance>, ResolveError> {
        Ok(self.entries.read().get(key).cloned().unwrap_or_default())
    }

    fn count(&self, key: &CapabilityKey) -> usize {
        self.entries.read().get(key).map_or(0, Vec::len)
    }
}
