//! Defines the unified error surface for server launch and supervision.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

/// Errors surfaced while launching or supervising the server process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the server failed.
    #[error("server bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The async runtime could not be built.
    #[error("failed to build async runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Binding or running the HTTP listener failed.
    #[error("listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}
