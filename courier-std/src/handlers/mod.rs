//! Standard handler implementations.

mod func;

pub use func::{FnHandler, handler_fn};
