use std::future::Future;
use std::io;

use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + 'static {
    /// Resolves once shutdown should proceed.
    fn wait(self) -> impl Future<Output = Result<(), ShutdownError>> + Send;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for SIGINT or SIGTERM.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    async fn wait(self) -> Result<(), ShutdownError> {
        let signal = wait_for_signal().await?;
        info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str, ShutdownError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())
        .map_err(|source| ShutdownError::Install { source })?;
    let mut interrupt = signal(SignalKind::interrupt())
        .map_err(|source| ShutdownError::Install { source })?;
    tokio::select! {
        _ = terminate.recv() => Ok("SIGTERM"),
        _ = interrupt.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str, ShutdownError> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|source| ShutdownError::Install { source })?;
    Ok("ctrl-c")
}

/// Resolves when the paired sender fires or is dropped.
#[cfg(test)]
impl ShutdownSignal for tokio::sync::oneshot::Receiver<()> {
    async fn wait(self) -> Result<(), ShutdownError> {
        drop(self.await);
        Ok(())
    }
}
