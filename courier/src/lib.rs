//! # courier - In-Process Request Dispatch
//!
//! `courier` routes a typed request to the single handler registered for its
//! type and returns the handler's typed response, optionally wrapping the
//! call in an ordered chain of behaviors (middleware).
//!
//! The invocation shape of each request type is compiled once into an
//! [`InvocationPlan`] and memoized in a [`PlanCache`]. Handler and behavior
//! instances are never cached by the engine: they are resolved from the
//! [`CapabilityProvider`] on every call.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! struct Ping;
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, _: &Ping, _: &CancellationToken) -> Result<String, BoxError> {
//!         Ok("Pong".into())
//!     }
//! }
//!
//! let registry = Registry::builder()
//!     .handler::<Ping, _>(PingHandler)
//!     .behavior::<Ping, _>(LoggingBehavior)
//!     .build();
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! assert_eq!(dispatcher.dispatch(Ping).await?, "Pong");
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod cache;
mod dispatcher;
mod erased;
pub mod executor;
mod plan;
mod warmup;

pub use cache::PlanCache;
pub use dispatcher::{ConfigError, Dispatcher, DispatcherBuilder};
pub use erased::{AnyRequest, AnyResponse};
pub use plan::{InvocationPlan, PlanBuilder, PlanPath};
pub use warmup::{WarmUp, WarmUpPolicy, WarmUpReport};

pub use courier_core::{
    // Error types
    BoxError,
    CancellationToken,
    // Capabilities
    CapabilityKey,
    CapabilityKind,
    CapabilityProvider,
    DispatchError,
    // Behavior
    DynPipelineBehavior,
    // Handler
    DynRequestHandler,
    Instance,
    Next,
    PipelineBehavior,
    PipelineFuture,
    ProviderId,
    // Request
    Request,
    RequestHandler,
    ResolveError,
    erase_behavior,
    erase_handler,
    resolve_behaviors,
    resolve_handler,
};

// Registry
pub use courier_std::{FnHandler, Lifetime, Registry, RegistryBuilder, Scope, handler_fn};

/// Standard behavior implementations.
pub mod behaviors {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::behaviors::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use courier_std::testing::*;
}

/// Prelude module - common imports for courier.
///
/// # Usage
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        CancellationToken,
        DispatchError,
        // Engine
        Dispatcher,
        Lifetime,
        Next,
        // Core traits
        PipelineBehavior,
        Registry,
        Request,
        RequestHandler,
        behaviors::{ErrorObserverBehavior, LoggingBehavior, TimingBehavior, TracingBehavior},
    };
    pub use std::sync::Arc;
}

#[cfg(feature = "macros")]
pub use courier_macros::{Request, handler};
