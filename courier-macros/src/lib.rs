//! Procedural macros for courier.
//!
//! - `#[derive(Request)]` - Implement `Request`, declaring the response type
//! - `#[handler]` - Turn an async fn into a `RequestHandler`
//!
//! Generated code refers to the `courier` facade crate by absolute path.

use proc_macro::TokenStream;

mod handler;
mod request;

/// Derive macro for implementing the `Request` trait.
///
/// The response type is declared with `#[request(response = Type)]` and
/// defaults to `()`.
///
/// ```rust,ignore
/// #[derive(Request)]
/// #[request(response = String)]
/// struct Ping;
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    request::derive_request_impl(input)
}

/// Attribute macro that turns an async fn into a request handler.
///
/// The function takes the request by reference and optionally the
/// cancellation token as a second argument. A unit struct named after the
/// function (or `name = "..."`) is generated in its place.
///
/// ```rust,ignore
/// #[handler(name = "PingHandler")]
/// async fn ping(_request: &Ping, cancel: &CancellationToken) -> Result<String, BoxError> {
///     Ok("Pong".to_string())
/// }
/// ```
#[proc_macro_attribute]
pub fn handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    handler::handler_impl(attr, item)
}
