//! Type-erased requests and responses.
//!
//! [`AnyRequest`] lets a caller dispatch a request known only by an abstract
//! marker. Every [`Request`] implements it, and its [`AnyRequest::plan_builder`]
//! is the monomorphized re-entry point that recovers the concrete type.

use crate::plan::{InvocationPlan, PlanBuilder};
use courier_core::{CapabilityProvider, DispatchError, Request, ResolveError};
use std::{
    any::{Any, TypeId, type_name},
    fmt,
};

mod sealed {
    pub trait Sealed {}

    impl<R: courier_core::Request> Sealed for R {}
}

/// A request whose concrete type is only known at runtime.
///
/// Implemented for every [`Request`]; cannot be implemented otherwise.
///
/// Use [`AnyRequest::request_type`] rather than `Any::type_id` to identify
/// the request: on a `Box<dyn AnyRequest>` the latter reports the box.
pub trait AnyRequest: Any + Send + Sync + sealed::Sealed {
    /// `TypeId` of the concrete request.
    fn request_type(&self) -> TypeId;

    /// Type name of the concrete request.
    fn request_name(&self) -> &'static str;

    /// Type name of the response the request produces.
    fn response_name(&self) -> &'static str;

    /// Borrow as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Convert into `Box<dyn Any>` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    /// The plan builder of the concrete request type.
    fn plan_builder(&self) -> PlanBuilder;

    /// Build the plan of the concrete request type.
    fn build_plan(&self, provider: &dyn CapabilityProvider) -> Result<InvocationPlan, ResolveError> {
        (self.plan_builder())(provider)
    }
}

impl<R: Request> AnyRequest for R {
    fn request_type(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn request_name(&self) -> &'static str {
        type_name::<R>()
    }

    fn response_name(&self) -> &'static str {
        type_name::<R::Response>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn plan_builder(&self) -> PlanBuilder {
        InvocationPlan::build::<R>
    }
}

impl fmt::Debug for dyn AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyRequest")
            .field("request", &self.request_name())
            .field("response", &self.response_name())
            .finish()
    }
}

/// The response of a type-erased dispatch.
pub struct AnyResponse {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl AnyResponse {
    pub(crate) fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Type name of the contained response.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the response is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Recover the typed response.
    ///
    /// Fails with [`DispatchError::ResponseType`] when the response is not a
    /// `T`.
    pub fn downcast<T: 'static>(self) -> Result<T, DispatchError> {
        let actual = self.type_name;
        self.value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| DispatchError::ResponseType {
                expected: type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for AnyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyResponse")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
