//! Per-request-type plan cache.

use crate::plan::InvocationPlan;
use courier_core::ProviderId;
use dashmap::DashMap;
use std::{any::TypeId, fmt, sync::Arc};

/// Concurrent memo of invocation plans.
///
/// Plans are keyed by the [`ProviderId`] they were built against and the
/// request `TypeId`, so dispatchers over different registries may share one
/// cache without seeing each other's plans. A registry and its scopes share
/// an id and therefore share plans.
///
/// The cache only grows: plans are never evicted, so once a request type has
/// dispatched successfully its plan is never built again.
#[derive(Default)]
pub struct PlanCache {
    plans: DashMap<(ProviderId, TypeId), Arc<InvocationPlan>>,
}

impl PlanCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the plan cached for `request` under `provider`, if any.
    pub fn get(&self, provider: ProviderId, request: TypeId) -> Option<Arc<InvocationPlan>> {
        self.plans
            .get(&(provider, request))
            .map(|plan| Arc::clone(plan.value()))
    }

    /// Get the cached plan for `request` under `provider`, building it on a
    /// miss.
    ///
    /// The builder runs without any lock held, so concurrent misses may each
    /// build a plan. The first one committed wins and every caller receives
    /// it. A builder error is returned and nothing is cached.
    pub fn get_or_build<E>(
        &self,
        provider: ProviderId,
        request: TypeId,
        build: impl FnOnce() -> Result<InvocationPlan, E>,
    ) -> Result<Arc<InvocationPlan>, E> {
        if let Some(plan) = self.get(provider, request) {
            tracing::trace!(%provider, plan = ?plan, "Plan cache hit");
            return Ok(plan);
        }

        let built = Arc::new(build()?);
        let plan = self.plans.entry((provider, request)).or_insert(built);
        Ok(Arc::clone(plan.value()))
    }

    /// Check if a plan is cached for `request` under `provider`.
    pub fn contains(&self, provider: ProviderId, request: TypeId) -> bool {
        self.plans.contains_key(&(provider, request))
    }

    /// Number of cached plans.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop every cached plan.
    ///
    /// Meant for benchmarking cold builds; in normal operation the cache
    /// only grows.
    pub fn clear(&self) {
        self.plans.clear();
    }
}

impl fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanCache")
            .field("plans", &self.plans.len())
            .finish()
    }
}
