//! TCP listener binding and the serve loop.

use std::future::Future;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;

use tracing::info;

use super::{LISTENER_TARGET, ListenerError, router};
use crate::server::Server;

/// A bound listener, ready to be handed to the async runtime.
#[derive(Debug)]
pub struct HttpListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpListener {
    /// Binds `host:port` in non-blocking mode. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when resolution or binding fails.
    pub fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::NonBlocking { source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves `server` until `shutdown` resolves. Must run inside a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] if the socket cannot be registered with
    /// the runtime or the server loop fails.
    pub async fn serve<F>(self, server: Arc<Server>, shutdown: F) -> Result<(), ListenerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::from_std(self.listener)
            .map_err(|source| ListenerError::Register { source })?;
        info!(
            target: LISTENER_TARGET,
            addr = %self.local_addr,
            "http listener active"
        );
        axum::serve(listener, router(server))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ListenerError::Serve { source })
    }
}

/// Resolves `host:port` and binds the first address.
///
/// # Errors
///
/// Returns a [`ListenerError`] when resolution yields nothing or binding
/// fails.
pub fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_string(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
