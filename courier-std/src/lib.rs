//! # courier-std
//!
//! Standard implementations for the courier dispatch engine.
//!
//! This crate provides:
//! - **Capability registry**: [`Registry`], [`RegistryBuilder`], [`Scope`] with [`Lifetime`]s
//! - **Function handlers**: [`handler_fn`]
//! - **Standard behaviors**: Logging, Timing, ErrorObserver, Tracing, CancellationGuard, Timeout
//! - **Testing utilities**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use courier_core;

// Modules
pub mod behaviors;
pub mod handlers;
pub mod registry;
pub mod testing;

pub use handlers::{FnHandler, handler_fn};
pub use registry::{Lifetime, Registry, RegistryBuilder, Scope};
