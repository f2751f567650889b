//! Error types for courier.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`BoxError`] - Failure raised by a handler or behavior
//! - [`ResolveError`] - A capability could not be supplied by the provider
//! - [`DispatchError`] - Top-level error type for dispatch operations

use crate::provider::CapabilityKey;
use thiserror::Error;

/// A boxed error type for handler and behavior failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while resolving a capability from a provider.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No handler is registered for the request/response pair.
    #[error("no handler registered for `{request}` -> `{response}`")]
    NotRegistered {
        /// Type name of the request.
        request: &'static str,
        /// Type name of the response.
        response: &'static str,
    },

    /// A registration exists but holds an instance of the wrong type.
    #[error("capability registered for {key} has an unexpected type")]
    TypeMismatch {
        /// The key that was resolved.
        key: CapabilityKey,
    },

    /// A scoped capability was resolved outside of a scope.
    #[error("{key} is scoped and cannot be resolved outside a scope")]
    ScopeRequired {
        /// The key that was resolved.
        key: CapabilityKey,
    },

    /// A registered factory failed to build an instance.
    #[error("factory for {key} failed")]
    Factory {
        /// The key that was resolved.
        key: CapabilityKey,
        /// The factory's failure.
        #[source]
        source: BoxError,
    },
}

impl ResolveError {
    /// Build a [`ResolveError::NotRegistered`] for the given key.
    pub fn not_registered(key: &CapabilityKey) -> Self {
        Self::NotRegistered {
            request: key.request_name(),
            response: key.response_name(),
        }
    }
}

/// Top-level error returned by dispatch operations.
///
/// Both variants are transparent: resolution and handler failures reach the
/// caller with their original message and source chain.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The handler (or a behavior) could not be resolved.
    #[error(transparent)]
    Unresolved(#[from] ResolveError),

    /// A handler or behavior failed.
    #[error(transparent)]
    Failed(#[from] BoxError),

    /// A type-erased response was downcast to the wrong type.
    #[error("response type mismatch: expected `{expected}`, dispatch produced `{actual}`")]
    ResponseType {
        /// The requested type.
        expected: &'static str,
        /// The type actually produced.
        actual: &'static str,
    },
}

impl DispatchError {
    /// Whether this error reports a capability that could not be resolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }

    /// Borrow the handler failure as a concrete error type, if it is one.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Unwrap into the underlying error.
    pub fn into_source(self) -> BoxError {
        match self {
            Self::Failed(err) => err,
            other => Box::new(other),
        }
    }
}
