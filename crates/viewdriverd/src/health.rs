//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::bootstrap::BootstrapError;

use viewdriver_config::Config;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the HTTP listener accepts connections.
    fn listener_ready(&self, address: SocketAddr);

    /// Invoked after shutdown terminated the remaining sessions.
    fn shutdown(&self, terminated_sessions: usize);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, address: SocketAddr) {
        (**self).listener_ready(address);
    }

    fn shutdown(&self, terminated_sessions: usize) {
        (**self).shutdown(terminated_sessions);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            host = %config.host(),
            port = config.port(),
            max_sessions = config.max_sessions(),
            http_threads = config.http_threads(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn listener_ready(&self, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            %address,
            "accepting WebDriver connections"
        );
    }

    fn shutdown(&self, terminated_sessions: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown",
            terminated_sessions,
            "server stopped"
        );
    }
}
