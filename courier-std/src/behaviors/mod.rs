//! Standard pipeline behaviors.
//!
//! Every behavior here is generic over the request type and can be
//! registered for any [`Request`](courier_core::Request).

mod cancel;
mod error;
mod logging;
mod span;
#[cfg(feature = "timeout")]
mod timeout;
mod timing;

pub use cancel::{CancellationGuard, Cancelled};
pub use error::ErrorObserverBehavior;
pub use logging::LoggingBehavior;
pub use span::TracingBehavior;
#[cfg(feature = "timeout")]
pub use timeout::{TimeoutBehavior, TimeoutError};
pub use timing::TimingBehavior;
