//! HTTP transport for the protocol server.
//!
//! The transport binds a TCP listener and serves an axum router whose single
//! fallback handler forwards every request to [`crate::server::Server`] on the
//! blocking thread pool, then maps the protocol response onto HTTP.

mod errors;
mod http;
mod listener;

pub use self::errors::ListenerError;
pub use self::http::{into_http_response, router};
pub use self::listener::{HttpListener, bind_tcp};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
