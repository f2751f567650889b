//! In-memory capability registry.
//!
//! This module provides a builder for registering handlers and behaviors,
//! a frozen [`Registry`] for thread-safe resolution, and request [`Scope`]s
//! owning the instances of `Scoped` registrations.
//!
//! # Lifetimes
//!
//! Instances registered directly are shared by every resolution. Factories
//! follow their [`Lifetime`]:
//!
//! - [`Lifetime::Transient`]: a new instance per resolution.
//! - [`Lifetime::Singleton`]: built on first resolution, then shared.
//!   Concurrent first resolutions wait for a single build.
//! - [`Lifetime::Scoped`]: built once per [`Scope`]. Resolving from the root
//!   registry fails with [`ResolveError::ScopeRequired`].
//!
//! When several handlers are registered for one request type, the last
//! registration wins.

use courier_core::{
    BoxError, CapabilityKey, CapabilityProvider, Instance, PipelineBehavior, ProviderId, Request,
    RequestHandler, ResolveError, erase_behavior, erase_handler,
};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::{collections::HashMap, fmt, sync::Arc};

/// How instances built by a registered factory are shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance for every resolution.
    #[default]
    Transient,
    /// One instance for the whole registry.
    Singleton,
    /// One instance per [`Scope`].
    Scoped,
}

type Factory = Arc<dyn Fn() -> Result<Instance, BoxError> + Send + Sync>;

enum Source {
    Instance(Instance),
    Factory {
        lifetime: Lifetime,
        build: Factory,
        cell: OnceCell<Instance>,
    },
}

type ScopeCells = DashMap<usize, Arc<OnceCell<Instance>>>;

struct Registration {
    id: usize,
    source: Source,
}

struct Pending {
    key: CapabilityKey,
    instance: Option<Instance>,
    factory: Option<(Option<Lifetime>, Factory)>,
}

// ============================================================================
// RegistryBuilder - for constructing registries
// ============================================================================

/// Builder for constructing a [`Registry`].
///
/// Register handlers and behaviors, then call `.build()` to freeze them into
/// an immutable, thread-safe registry. Behaviors run in registration order.
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .default_lifetime(Lifetime::Scoped)
///     .handler::<Ping, _>(PingHandler)
///     .behavior::<Ping, _>(LoggingBehavior::new())
///     .build();
/// ```
pub struct RegistryBuilder {
    entries: Vec<Pending>,
    default_lifetime: Lifetime,
}

impl RegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            default_lifetime: Lifetime::default(),
        }
    }

    /// Set the lifetime of factories registered without an explicit one.
    pub fn default_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.default_lifetime_mut(lifetime);
        self
    }

    /// Set the default factory lifetime (mutable version).
    pub fn default_lifetime_mut(&mut self, lifetime: Lifetime) {
        self.default_lifetime = lifetime;
    }

    /// Register a handler instance for `R`.
    pub fn handler<R: Request, H: RequestHandler<R>>(mut self, handler: H) -> Self {
        self.handler_mut::<R, H>(handler);
        self
    }

    /// Register a handler instance for `R` (mutable version).
    pub fn handler_mut<R: Request, H: RequestHandler<R>>(&mut self, handler: H) {
        self.entries.push(Pending {
            key: CapabilityKey::handler::<R>(),
            instance: Some(erase_handler::<R>(Arc::new(handler))),
            factory: None,
        });
    }

    /// Register a handler factory for `R` using the default lifetime.
    pub fn handler_factory<R, H, F>(mut self, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.push_handler::<R, H, _>(None, move || Ok(factory()));
        self
    }

    /// Register a handler factory for `R` with an explicit lifetime.
    pub fn handler_with<R, H, F>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.handler_with_mut::<R, H, F>(lifetime, factory);
        self
    }

    /// Register a handler factory for `R` (mutable version).
    pub fn handler_with_mut<R, H, F>(&mut self, lifetime: Lifetime, factory: F)
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.push_handler::<R, H, _>(Some(lifetime), move || Ok(factory()));
    }

    /// Register a fallible handler factory for `R`.
    ///
    /// A factory failure surfaces as [`ResolveError::Factory`].
    pub fn try_handler_with<R, H, F>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> Result<H, BoxError> + Send + Sync + 'static,
    {
        self.push_handler::<R, H, F>(Some(lifetime), factory);
        self
    }

    /// Register a behavior instance for `R`.
    pub fn behavior<R: Request, B: PipelineBehavior<R>>(mut self, behavior: B) -> Self {
        self.behavior_mut::<R, B>(behavior);
        self
    }

    /// Register a behavior instance for `R` (mutable version).
    pub fn behavior_mut<R: Request, B: PipelineBehavior<R>>(&mut self, behavior: B) {
        self.entries.push(Pending {
            key: CapabilityKey::behavior::<R>(),
            instance: Some(erase_behavior::<R>(Arc::new(behavior))),
            factory: None,
        });
    }

    /// Register a behavior factory for `R` using the default lifetime.
    pub fn behavior_factory<R, B, F>(mut self, factory: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.push_behavior::<R, B, _>(None, move || Ok(factory()));
        self
    }

    /// Register a behavior factory for `R` with an explicit lifetime.
    pub fn behavior_with<R, B, F>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.behavior_with_mut::<R, B, F>(lifetime, factory);
        self
    }

    /// Register a behavior factory for `R` (mutable version).
    pub fn behavior_with_mut<R, B, F>(&mut self, lifetime: Lifetime, factory: F)
    where
        R: Request,
        B: PipelineBehavior<R>,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.push_behavior::<R, B, _>(Some(lifetime), move || Ok(factory()));
    }

    /// Register a fallible behavior factory for `R`.
    pub fn try_behavior_with<R, B, F>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
        F: Fn() -> Result<B, BoxError> + Send + Sync + 'static,
    {
        self.push_behavior::<R, B, F>(Some(lifetime), factory);
        self
    }

    fn push_handler<R, H, F>(&mut self, lifetime: Option<Lifetime>, factory: F)
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> Result<H, BoxError> + Send + Sync + 'static,
    {
        let build: Factory = Arc::new(move || {
            factory().map(|handler| erase_handler::<R>(Arc::new(handler)))
        });
        self.entries.push(Pending {
            key: CapabilityKey::handler::<R>(),
            instance: None,
            factory: Some((lifetime, build)),
        });
    }

    fn push_behavior<R, B, F>(&mut self, lifetime: Option<Lifetime>, factory: F)
    where
        R: Request,
        B: PipelineBehavior<R>,
        F: Fn() -> Result<B, BoxError> + Send + Sync + 'static,
    {
        let build: Factory = Arc::new(move || {
            factory().map(|behavior| erase_behavior::<R>(Arc::new(behavior)))
        });
        self.entries.push(Pending {
            key: CapabilityKey::behavior::<R>(),
            instance: None,
            factory: Some((lifetime, build)),
        });
    }

    /// Number of registrations so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the registrations into a [`Registry`].
    pub fn build(self) -> Registry {
        let default_lifetime = self.default_lifetime;
        let mut entries: HashMap<CapabilityKey, Vec<Registration>> = HashMap::new();

        for (id, pending) in self.entries.into_iter().enumerate() {
            let source = match (pending.instance, pending.factory) {
                (Some(instance), _) => Source::Instance(instance),
                (None, Some((lifetime, build))) => Source::Factory {
                    lifetime: lifetime.unwrap_or(default_lifetime),
                    build,
                    cell: OnceCell::new(),
                },
                (None, None) => continue,
            };
            entries
                .entry(pending.key)
                .or_default()
                .push(Registration { id, source });
        }

        let id = ProviderId::unique();
        tracing::debug!(%id, keys = entries.len(), "capability registry built");
        Registry { id, entries }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Registry - frozen, thread-safe
// ============================================================================

/// A frozen capability registry.
///
/// Created via [`RegistryBuilder::build()`]. Implements
/// [`CapabilityProvider`] for use by a dispatcher.
pub struct Registry {
    id: ProviderId,
    entries: HashMap<CapabilityKey, Vec<Registration>>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Open a scope owning its own `Scoped` instances.
    pub fn create_scope(self: &Arc<Self>) -> Scope {
        Scope {
            registry: Arc::clone(self),
            instances: DashMap::new(),
        }
    }

    /// Number of distinct keys with at least one registration.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn materialize(
        &self,
        key: &CapabilityKey,
        registration: &Registration,
        scope: Option<&ScopeCells>,
    ) -> Result<Instance, ResolveError> {
        let (lifetime, build, cell) = match &registration.source {
            Source::Instance(instance) => return Ok(Arc::clone(instance)),
            Source::Factory {
                lifetime,
                build,
                cell,
            } => (*lifetime, build, cell),
        };

        let run = || build().map_err(|source| ResolveError::Factory { key: *key, source });

        match lifetime {
            Lifetime::Transient => run(),
            Lifetime::Singleton => cell.get_or_try_init(run).map(Arc::clone),
            Lifetime::Scoped => {
                let cells = scope.ok_or(ResolveError::ScopeRequired { key: *key })?;
                // Cloned out so the build runs without holding the shard lock.
                let cell = Arc::clone(cells.entry(registration.id).or_default().value());
                cell.get_or_try_init(run).map(Arc::clone)
            }
        }
    }

    fn resolve_in(
        &self,
        key: &CapabilityKey,
        scope: Option<&ScopeCells>,
    ) -> Result<Instance, ResolveError> {
        let registration = self
            .entries
            .get(key)
            .and_then(|list| list.last())
            .ok_or_else(|| ResolveError::not_registered(key))?;
        self.materialize(key, registration, scope)
    }

    fn resolve_all_in(
        &self,
        key: &CapabilityKey,
        scope: Option<&ScopeCells>,
    ) -> Result<Vec<Instance>, ResolveError> {
        match self.entries.get(key) {
            Some(list) => list
                .iter()
                .map(|registration| self.materialize(key, registration, scope))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn count_of(&self, key: &CapabilityKey) -> usize {
        self.entries.get(key).map_or(0, Vec::len)
    }
}

impl CapabilityProvider for Registry {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn resolve(&self, key: &CapabilityKey) -> Result<Instance, ResolveError> {
        self.resolve_in(key, None)
    }

    fn resolve_all(&self, key: &CapabilityKey) -> Result<Vec<Instance>, ResolveError> {
        self.resolve_all_in(key, None)
    }

    fn count(&self, key: &CapabilityKey) -> usize {
        self.count_of(key)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("keys", &self.entries.len())
            .finish()
    }
}

// ============================================================================
// Scope - one logical unit of work
// ============================================================================

/// A view of a [`Registry`] with its own cache of `Scoped` instances.
///
/// Transient and singleton registrations behave exactly as they do on the
/// root registry.
pub struct Scope {
    registry: Arc<Registry>,
    instances: ScopeCells,
}

impl Scope {
    /// The registry this scope was opened from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Number of scoped instances built so far.
    pub fn len(&self) -> usize {
        self.instances
            .iter()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    /// Check if no scoped instance has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CapabilityProvider for Scope {
    fn id(&self) -> ProviderId {
        self.registry.id
    }

    fn resolve(&self, key: &CapabilityKey) -> Result<Instance, ResolveError> {
        self.registry.resolve_in(key, Some(&self.instances))
    }

    fn resolve_all(&self, key: &CapabilityKey) -> Result<Vec<Instance>, ResolveError> {
        self.registry.resolve_all_in(key, Some(&self.instances))
    }

    fn count(&self, key: &CapabilityKey) -> usize {
        self.registry.count_of(key)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("registry", &self.registry)
            .field("instances", &self.len())
            .finish()
    }
}
