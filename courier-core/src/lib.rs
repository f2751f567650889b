//! # courier-core
//!
//! Core traits for the courier request dispatch engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! crates that define requests, handlers or behaviors without pulling in the
//! dispatch engine itself.
//!
//! # Building Blocks
//!
//! ## Requests ([`Request`])
//!
//! A request is a typed unit of work. Its response type is a static property
//! of the request type, so a single request type always maps to a single
//! response type.
//!
//! ## Handlers ([`RequestHandler`])
//!
//! The single capability that turns a request into its response. This is the
//! terminal point of every dispatch.
//!
//! ## Behaviors ([`PipelineBehavior`])
//!
//! Ordered middleware wrapped around the handler. A behavior receives the
//! request together with a [`Next`] continuation and decides whether to run
//! the rest of the pipeline, short-circuit it, or transform its result.
//!
//! ## Capabilities ([`CapabilityProvider`])
//!
//! The registry seam. The dispatch engine never owns handler or behavior
//! instances; it asks a provider for them by [`CapabilityKey`] on every call.
//!
//! # Error Types
//!
//! - [`BoxError`] - Failure raised by a handler or behavior
//! - [`ResolveError`] - A capability could not be supplied
//! - [`DispatchError`] - Top-level error returned by dispatch operations

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod behavior;
mod error;
mod handler;
mod provider;
mod request;

// Re-exports
pub use behavior::{DynPipelineBehavior, Next, PipelineBehavior};
pub use error::{BoxError, DispatchError, ResolveError};
pub use handler::{DynRequestHandler, PipelineFuture, RequestHandler};
pub use provider::{
    CapabilityKey, CapabilityKind, CapabilityProvider, Instance, ProviderId, erase_behavior,
    erase_handler, resolve_behaviors, resolve_handler,
};
pub use request::Request;
pub use tokio_util::sync::CancellationToken;
