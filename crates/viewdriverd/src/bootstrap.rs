//! Server bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use viewdriver_config::{Config, ConfigError};

use crate::headless::HeadlessEngine;
use crate::health::HealthReporter;
use crate::server::{Server, ServerContext};
use crate::session::SessionManager;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::view::ViewBackends;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be produced.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out an already resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The loaded configuration is unusable.
    #[error("invalid configuration: {source}")]
    InvalidConfiguration {
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct ViewDriver {
    config: Config,
    server: Arc<Server>,
    engine: HeadlessEngine,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl ViewDriver {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Protocol server shared with the transport.
    #[must_use]
    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    /// Backend registered for every view role.
    #[must_use]
    pub fn engine(&self) -> &HeadlessEngine {
        &self.engine
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Health reporter supplied at bootstrap.
    #[must_use]
    pub fn reporter(&self) -> &Arc<dyn HealthReporter> {
        &self.reporter
    }
}

impl std::fmt::Debug for ViewDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDriver")
            .field("config", &self.config)
            .field("server", &self.server)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// Loads and validates the configuration, installs telemetry, registers
/// `engine` for every view role and builds the protocol server. Each failure
/// is reported through `reporter` before it is returned.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the stage that failed.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    engine: HeadlessEngine,
) -> Result<ViewDriver, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let url_base = match config
        .validate()
        .and_then(|()| config.url_base().map_err(ConfigError::from))
    {
        Ok(url_base) => url_base,
        Err(source) => {
            let error = BootstrapError::InvalidConfiguration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let mut backends = ViewBackends::new();
    engine.register(&mut backends);
    let sessions = Arc::new(SessionManager::new(
        config.max_sessions(),
        config.task_timeout(),
    ));
    let server = Arc::new(Server::new(ServerContext::new(
        sessions,
        Arc::new(backends),
        url_base,
    )));
    reporter.bootstrap_succeeded(&config);

    Ok(ViewDriver {
        config,
        server,
        engine,
        telemetry,
        reporter,
    })
}
