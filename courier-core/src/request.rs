//! Request trait.

/// A typed unit of work submitted for dispatch.
///
/// Requests must be `Send + Sync + 'static` so they can be borrowed across
/// await points by handlers and behaviors running on any executor thread.
///
/// # Example
///
/// ```rust
/// use courier_core::Request;
///
/// struct Ping;
///
/// impl Request for Ping {
///     type Response = String;
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Request",
    label = "missing `Request` implementation",
    note = "Requests must be `Send + Sync + 'static` and declare their `Response` type."
)]
pub trait Request: Send + Sync + 'static {
    /// The response produced by the handler of this request.
    type Response: Send + 'static;
}
