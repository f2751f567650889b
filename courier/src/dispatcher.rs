//! The dispatcher: the public entry point of the engine.

use crate::{
    cache::PlanCache,
    erased::{AnyRequest, AnyResponse},
    executor,
    plan::InvocationPlan,
    warmup::WarmUp,
};
use courier_core::{
    CancellationToken, CapabilityProvider, DispatchError, Request, ResolveError,
};
use courier_std::Registry;
use std::{any::TypeId, fmt, sync::Arc};
use thiserror::Error;

/// Dispatches requests to their handlers through cached invocation plans.
///
/// The dispatcher holds no per-call state. It is cheap to clone and safe to
/// share across tasks; clones share the provider and the plan cache.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::builder()
///     .handler::<Ping, _>(PingHandler)
///     .build();
/// let dispatcher = Dispatcher::new(Arc::new(registry));
///
/// let pong = dispatcher.dispatch(Ping).await?;
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn CapabilityProvider>,
    cache: Arc<PlanCache>,
}

impl Dispatcher {
    /// Create a dispatcher over `provider` with an empty plan cache.
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(PlanCache::new()),
        }
    }

    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// A dispatcher over another provider sharing this dispatcher's plan
    /// cache.
    ///
    /// Typically used with a request [`Scope`](courier_std::Scope), which
    /// reuses the plans of its registry. A provider with a different
    /// [`ProviderId`](courier_core::ProviderId) builds its own plans.
    pub fn with_provider(&self, provider: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            provider,
            cache: Arc::clone(&self.cache),
        }
    }

    /// The provider handlers and behaviors are resolved from.
    pub fn provider(&self) -> &Arc<dyn CapabilityProvider> {
        &self.provider
    }

    /// The plan cache.
    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    /// The plan cached for `request` under this dispatcher's provider, if
    /// any.
    pub fn cached_plan(&self, request: TypeId) -> Option<Arc<InvocationPlan>> {
        self.cache.get(self.provider.id(), request)
    }

    /// Get the plan for `R`, building and caching it on first use.
    pub fn plan_for<R: Request>(&self) -> Result<Arc<InvocationPlan>, ResolveError> {
        self.cache
            .get_or_build(self.provider.id(), TypeId::of::<R>(), || {
                InvocationPlan::build::<R>(&*self.provider)
            })
    }

    /// Get the plan for a type-erased request, building it through the
    /// request's own plan builder on first use.
    pub fn plan_for_dyn(&self, request: &dyn AnyRequest) -> Result<Arc<InvocationPlan>, ResolveError> {
        self.cache.get_or_build(self.provider.id(), request.request_type(), || {
            request.build_plan(&*self.provider)
        })
    }

    /// Dispatch `request` with a token that is never cancelled.
    pub async fn dispatch<R: Request>(&self, request: R) -> Result<R::Response, DispatchError> {
        self.dispatch_cancellable(request, CancellationToken::new())
            .await
    }

    /// Dispatch `request`, passing `cancel` to every behavior and the
    /// handler.
    ///
    /// Handler and behavior failures are returned unchanged as
    /// [`DispatchError::Failed`]; a missing handler is reported as
    /// [`DispatchError::Unresolved`].
    pub async fn dispatch_cancellable<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<R::Response, DispatchError> {
        let plan = self.plan_for::<R>()?;
        executor::execute::<R>(&plan, &*self.provider, &request, &cancel).await
    }

    /// Dispatch `request` without consulting or filling the plan cache.
    ///
    /// Observably identical to [`Dispatcher::dispatch_cancellable`].
    pub async fn dispatch_uncached<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<R::Response, DispatchError> {
        executor::compose::<R>(&*self.provider, &request, &cancel).await
    }

    /// Dispatch a request known only as an [`AnyRequest`].
    ///
    /// The response is returned type-erased; recover it with
    /// [`AnyResponse::downcast`].
    pub async fn dispatch_dyn(
        &self,
        request: Box<dyn AnyRequest>,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, DispatchError> {
        let plan = self.plan_for_dyn(&*request)?;
        plan.invoke(&*self.provider, request, &cancel).await
    }

    /// Start a warm-up run pre-building plans.
    pub fn warm_up(&self) -> WarmUp<'_> {
        WarmUp::new(self)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DispatcherBuilder
// ============================================================================

/// Errors raised while configuring a dispatcher.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No provider (or registry) was configured.
    #[error("dispatcher has no capability provider configured")]
    MissingProvider,
}

/// Builder for a [`Dispatcher`].
///
/// # Example
/// ```ignore
/// let dispatcher = Dispatcher::builder()
///     .registry(registry)
///     .shared_cache(cache)
///     .build()?;
/// ```
#[derive(Default)]
pub struct DispatcherBuilder {
    provider: Option<Arc<dyn CapabilityProvider>>,
    cache: Option<Arc<PlanCache>>,
}

impl DispatcherBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve capabilities from `provider`.
    pub fn provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve capabilities from `registry`.
    pub fn registry(self, registry: Registry) -> Self {
        self.provider(Arc::new(registry))
    }

    /// Share an existing plan cache instead of creating a new one.
    ///
    /// Plans are kept apart per provider id, so the cache may be shared
    /// between dispatchers over unrelated registries.
    pub fn shared_cache(mut self, cache: Arc<PlanCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let provider = self.provider.ok_or(ConfigError::MissingProvider)?;
        Ok(Dispatcher {
            provider,
            cache: self.cache.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("provider", &self.provider.is_some())
            .field("cache", &self.cache)
            .finish()
    }
}
