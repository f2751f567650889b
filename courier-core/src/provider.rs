//! # Capability Provider
//!
//! The seam between the dispatch engine and whatever registry owns handler
//! and behavior instances.
//!
//! The engine never caches instances. It keeps only [`CapabilityKey`]s and
//! asks the provider for live instances on every dispatch, because instances
//! may be scoped to a single request or unit of work.
//!
//! Instances cross the seam type-erased as [`Instance`] values holding an
//! `Arc<dyn DynRequestHandler<R>>` or `Arc<dyn DynPipelineBehavior<R>>`.
//! [`resolve_handler`] and [`resolve_behaviors`] recover the static type.

use crate::{
    behavior::DynPipelineBehavior, error::ResolveError, handler::DynRequestHandler,
    request::Request,
};
use std::{
    any::{Any, TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// A type-erased capability instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// What kind of capability a key looks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// The single handler of a request type.
    Handler,
    /// The ordered behaviors of a request type.
    Behavior,
}

/// Lookup key for a capability of a (request, response) pair.
///
/// Equality and hashing use the kind and the two `TypeId`s only. The type
/// names are carried for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityKey {
    kind: CapabilityKind,
    request: TypeId,
    response: TypeId,
    request_name: &'static str,
    response_name: &'static str,
}

impl CapabilityKey {
    /// Key of the handler for `R`.
    pub fn handler<R: Request>() -> Self {
        Self::of::<R>(CapabilityKind::Handler)
    }

    /// Key of the behaviors for `R`.
    pub fn behavior<R: Request>() -> Self {
        Self::of::<R>(CapabilityKind::Behavior)
    }

    fn of<R: Request>(kind: CapabilityKind) -> Self {
        Self {
            kind,
            request: TypeId::of::<R>(),
            response: TypeId::of::<R::Response>(),
            request_name: type_name::<R>(),
            response_name: type_name::<R::Response>(),
        }
    }

    /// The capability kind.
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// `TypeId` of the request.
    pub fn request(&self) -> TypeId {
        self.request
    }

    /// `TypeId` of the response.
    pub fn response(&self) -> TypeId {
        self.response
    }

    /// Type name of the request.
    pub fn request_name(&self) -> &'static str {
        self.request_name
    }

    /// Type name of the response.
    pub fn response_name(&self) -> &'static str {
        self.response_name
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.request == other.request && self.response == other.response
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.request.hash(state);
        self.response.hash(state);
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            CapabilityKind::Handler => "handler",
            CapabilityKind::Behavior => "behavior",
        };
        write!(
            f,
            "{kind} `{}` -> `{}`",
            self.request_name, self.response_name
        )
    }
}

/// Identity of the registration set behind a provider.
///
/// Plans are cached per `ProviderId`: providers reporting the same id must
/// report the same handler and behavior counts. A registry and every scope
/// opened from it share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

impl ProviderId {
    /// A fresh id, distinct from every other id in the process.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ProviderId {
    /// Same as [`ProviderId::unique`].
    fn default() -> Self {
        Self::unique()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider#{}", self.0)
    }
}

/// Supplies handler and behavior instances by key.
///
/// Implementations decide instance lifetimes and which handler wins when
/// several are registered for one key.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid CapabilityProvider",
    label = "missing `CapabilityProvider` implementation",
    note = "Implement `CapabilityProvider` to supply handlers and behaviors to a dispatcher."
)]
pub trait CapabilityProvider: Send + Sync {
    /// Identity of the registrations this provider serves.
    fn id(&self) -> ProviderId;

    /// Resolve the single instance registered for `key`.
    ///
    /// Fails with [`ResolveError::NotRegistered`] when nothing is registered.
    fn resolve(&self, key: &CapabilityKey) -> Result<Instance, ResolveError>;

    /// Resolve every instance registered for `key`, in registration order.
    ///
    /// An unknown key yields an empty list.
    fn resolve_all(&self, key: &CapabilityKey) -> Result<Vec<Instance>, ResolveError>;

    /// Whether anything is registered for `key`. Must not build instances.
    fn contains(&self, key: &CapabilityKey) -> bool {
        self.count(key) > 0
    }

    /// How many registrations exist for `key`. Must not build instances.
    fn count(&self, key: &CapabilityKey) -> usize;
}

impl<P: CapabilityProvider + ?Sized> CapabilityProvider for Arc<P> {
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn resolve(&self, key: &CapabilityKey) -> Result<Instance, ResolveError> {
        (**self).resolve(key)
    }

    fn resolve_all(&self, key: &CapabilityKey) -> Result<Vec<Instance>, ResolveError> {
        (**self).resolve_all(key)
    }

    fn contains(&self, key: &CapabilityKey) -> bool {
        (**self).contains(key)
    }

    fn count(&self, key: &CapabilityKey) -> usize {
        (**self).count(key)
    }
}

/// Erase a handler into an [`Instance`].
pub fn erase_handler<R: Request>(handler: Arc<dyn DynRequestHandler<R>>) -> Instance {
    Arc::new(handler)
}

/// Erase a behavior into an [`Instance`].
pub fn erase_behavior<R: Request>(behavior: Arc<dyn DynPipelineBehavior<R>>) -> Instance {
    Arc::new(behavior)
}

/// Resolve the handler for `R` and recover its static type.
pub fn resolve_handler<R, P>(
    provider: &P,
    key: &CapabilityKey,
) -> Result<Arc<dyn DynRequestHandler<R>>, ResolveError>
where
    R: Request,
    P: CapabilityProvider + ?Sized,
{
    let instance = provider.resolve(key)?;
    downcast(&instance, key)
}

/// Resolve the ordered behaviors for `R` and recover their static type.
pub fn resolve_behaviors<R, P>(
    provider: &P,
    key: &CapabilityKey,
) -> Result<Vec<Arc<dyn DynPipelineBehavior<R>>>, ResolveError>
where
    R: Request,
    P: CapabilityProvider + ?Sized,
{
    provider
        .resolve_all(key)?
        .iter()
        .map(|instance| downcast(instance, key))
        .collect()
}

fn downcast<T: Clone + 'static>(instance: &Instance, key: &CapabilityKey) -> Result<T, ResolveError> {
    instance
        .downcast_ref::<T>()
        .cloned()
        .ok_or(ResolveError::TypeMismatch { key: *key })
}
