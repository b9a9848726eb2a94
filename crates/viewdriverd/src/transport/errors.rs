//! Error types for the HTTP listener.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the HTTP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Name resolution of the configured host failed.
    #[error("cannot resolve listen address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The host resolved to no address at all.
    #[error("listen address {host}:{port} resolved to nothing")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// The port is taken or the address is not local.
    #[error("cannot bind HTTP listener to {addr}: {source}")]
    BindTcp {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// OS error.
        #[source]
        source: io::Error,
    },
    /// Switching the socket to non-blocking mode or reading its address failed.
    #[error("cannot prepare HTTP listener socket: {source}")]
    NonBlocking {
        /// OS error.
        #[source]
        source: io::Error,
    },
    /// The socket could not be handed to the tokio reactor.
    #[error("cannot register HTTP listener with the runtime: {source}")]
    Register {
        /// Reactor error.
        #[source]
        source: io::Error,
    },
    /// The accept loop stopped with an error.
    #[error("HTTP server stopped: {source}")]
    Serve {
        /// Accept-loop error.
        #[source]
        source: io::Error,
    },
}
