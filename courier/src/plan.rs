//! Invocation plans.
//!
//! A plan is the immutable invocation shape of one request type: which keys
//! to resolve and whether behaviors wrap the handler. Plans hold keys only,
//! never resolved instances, so one plan serves every provider and scope.

use crate::{
    erased::{AnyRequest, AnyResponse},
    executor,
};
use courier_core::{
    CancellationToken, CapabilityKey, CapabilityProvider, DispatchError, Request, ResolveError,
};
use futures::future::BoxFuture;
use std::{any::TypeId, fmt};

/// Whether behaviors wrap the handler of a request type.
///
/// Decided once, when the plan is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPath {
    /// No behaviors were registered: the handler is called directly and
    /// behaviors are never queried.
    Direct,
    /// Behaviors were registered: they are resolved on every call and
    /// composed around the handler.
    Composed {
        /// Number of behaviors registered when the plan was built.
        slots: usize,
    },
}

/// Builds the plan of one concrete request type.
pub type PlanBuilder = fn(&dyn CapabilityProvider) -> Result<InvocationPlan, ResolveError>;

type ErasedInvoke = for<'a> fn(
    &'a InvocationPlan,
    &'a dyn CapabilityProvider,
    Box<dyn AnyRequest>,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<AnyResponse, DispatchError>>;

/// The compiled invocation shape of a request type.
pub struct InvocationPlan {
    request: TypeId,
    handler_key: CapabilityKey,
    behavior_key: CapabilityKey,
    path: PlanPath,
    invoke: ErasedInvoke,
}

impl InvocationPlan {
    /// Build the plan for `R`.
    ///
    /// Only `contains` and `count` are queried: no handler or behavior is
    /// instantiated. Fails with [`ResolveError::NotRegistered`] when the
    /// provider has no handler for `R`.
    pub fn build<R: Request>(provider: &dyn CapabilityProvider) -> Result<Self, ResolveError> {
        let handler_key = CapabilityKey::handler::<R>();
        if !provider.contains(&handler_key) {
            return Err(ResolveError::not_registered(&handler_key));
        }

        let behavior_key = CapabilityKey::behavior::<R>();
        let path = match provider.count(&behavior_key) {
            0 => PlanPath::Direct,
            slots => PlanPath::Composed { slots },
        };

        tracing::debug!(
            request = handler_key.request_name(),
            response = handler_key.response_name(),
            ?path,
            "Invocation plan built"
        );

        Ok(Self {
            request: TypeId::of::<R>(),
            handler_key,
            behavior_key,
            path,
            invoke: invoke_erased::<R>,
        })
    }

    /// `TypeId` of the request this plan serves.
    pub fn request_type(&self) -> TypeId {
        self.request
    }

    /// Type name of the request.
    pub fn request_name(&self) -> &'static str {
        self.handler_key.request_name()
    }

    /// Type name of the response.
    pub fn response_name(&self) -> &'static str {
        self.handler_key.response_name()
    }

    /// Key of the handler.
    pub fn handler_key(&self) -> &CapabilityKey {
        &self.handler_key
    }

    /// Key of the behaviors.
    pub fn behavior_key(&self) -> &CapabilityKey {
        &self.behavior_key
    }

    /// The path fixed at build time.
    pub fn path(&self) -> PlanPath {
        self.path
    }

    /// Whether the handler is called without behaviors.
    pub fn is_direct(&self) -> bool {
        self.path == PlanPath::Direct
    }

    /// Run the plan for a type-erased request.
    ///
    /// The request must be of the type this plan was built for.
    pub fn invoke<'a>(
        &'a self,
        provider: &'a dyn CapabilityProvider,
        request: Box<dyn AnyRequest>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<AnyResponse, DispatchError>> {
        (self.invoke)(self, provider, request, cancel)
    }
}

fn invoke_erased<'a, R: Request>(
    plan: &'a InvocationPlan,
    provider: &'a dyn CapabilityProvider,
    request: Box<dyn AnyRequest>,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<AnyResponse, DispatchError>> {
    Box::pin(async move {
        let request = request
            .into_any()
            .downcast::<R>()
            .map_err(|_| ResolveError::TypeMismatch {
                key: plan.handler_key,
            })?;
        let response = executor::execute::<R>(plan, provider, &request, cancel).await?;
        Ok::<_, DispatchError>(AnyResponse::new(response))
    })
}

impl PartialEq for InvocationPlan {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request
            && self.handler_key == other.handler_key
            && self.behavior_key == other.behavior_key
            && self.path == other.path
    }
}

impl Eq for InvocationPlan {}

impl fmt::Debug for InvocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationPlan")
            .field("request", &self.request_name())
            .field("response", &self.response_name())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
