//! Supervises server launch sequencing and runtime orchestration.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::headless::HeadlessEngine;
use crate::health::HealthReporter;
use crate::transport::HttpListener;

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Collaborators required to launch the server.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) engine: HeadlessEngine,
    pub(crate) shutdown: S,
}

/// Runs the server using the production collaborators until SIGINT or
/// SIGTERM arrives.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap, runtime construction or the
/// listener fails.
pub fn run_server() -> Result<(), LaunchError> {
    run_server_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        engine: HeadlessEngine::new(),
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the server with injected collaborators.
pub(crate) fn run_server_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        engine,
        shutdown,
    } = plan;

    let driver = bootstrap_with(&loader, Arc::clone(&reporter), engine)?;
    let config = driver.config();
    info!(
        target: PROCESS_TARGET,
        host = %config.host(),
        port = config.port(),
        http_threads = config.http_threads(),
        "starting server runtime"
    );
    let runtime = build_runtime(config.http_threads())?;
    let listener = HttpListener::bind(config.host(), config.port())?;
    reporter.listener_ready(listener.local_addr());

    let server = Arc::clone(driver.server());
    let served = runtime.block_on(listener.serve(Arc::clone(&server), async move {
        if let Err(error) = shutdown.wait().await {
            error!(target: PROCESS_TARGET, %error, "shutdown listener failed; stopping");
        }
    }));

    let terminated = server.shutdown();
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    reporter.shutdown(terminated);
    served.map_err(LaunchError::from)
}

fn build_runtime(http_threads: usize) -> Result<Runtime, LaunchError> {
    Builder::new_multi_thread()
        .enable_all()
        .thread_name("viewdriver-http")
        .max_blocking_threads(http_threads.max(1))
        .build()
        .map_err(|source| LaunchError::Runtime { source })
}
