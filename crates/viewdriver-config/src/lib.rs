//! Shared configuration for the view driver server.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a
//! `viewdriver.toml` file (or the file named by `--config-path`), then
//! `VIEWDRIVER_*` environment variables, then command-line flags. The server
//! reads it once at startup and hands the validated values to its components.

mod defaults;
mod logging;
mod url_base;

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_HOST, DEFAULT_HTTP_THREADS, DEFAULT_LOG_FILTER, DEFAULT_MAX_SESSIONS, DEFAULT_PORT,
    default_host, default_http_threads, default_log_filter, default_log_filter_string,
    default_log_format, default_max_sessions, default_port,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use url_base::{UrlBaseError, normalise_url_base};

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "VIEWDRIVER")]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[serde(default = "defaults::default_host")]
    #[ortho_config(default = defaults::default_host())]
    pub host: String,
    /// Port the HTTP listener binds to.
    #[serde(default = "defaults::default_port")]
    #[ortho_config(default = defaults::default_port())]
    pub port: u16,
    /// Path prefix for every WebDriver route, as written by the operator.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub url_base: String,
    /// Worker threads available for dispatching HTTP requests.
    #[serde(default = "defaults::default_http_threads")]
    #[ortho_config(default = defaults::default_http_threads())]
    pub http_threads: usize,
    /// Upper bound on concurrently live sessions.
    #[serde(default = "defaults::default_max_sessions")]
    #[ortho_config(default = defaults::default_max_sessions())]
    pub max_sessions: usize,
    /// Maximum time a caller waits for a session task, in milliseconds.
    /// Zero waits indefinitely.
    #[serde(default)]
    #[ortho_config(default = 0)]
    pub task_timeout_ms: u64,
    /// Tracing filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Log file; events go to stderr when unset.
    #[serde(default)]
    pub log_path: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            url_base: String::new(),
            http_threads: DEFAULT_HTTP_THREADS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            task_timeout_ms: 0,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_path: None,
        }
    }
}

/// Errors raised when a loaded configuration is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The server needs at least one dispatch thread.
    #[error("http_threads must be at least 1")]
    NoHttpThreads,
    /// A session limit of zero would reject every client.
    #[error("max_sessions must be at least 1")]
    NoSessions,
    /// The URL base is not a valid path prefix.
    #[error(transparent)]
    UrlBase(#[from] UrlBaseError),
}

impl Config {
    /// Checks the values that cannot be expressed through types alone.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_threads == 0 {
            return Err(ConfigError::NoHttpThreads);
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::NoSessions);
        }
        normalise_url_base(&self.url_base)?;
        Ok(())
    }

    /// Listen address.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Listen port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL base with one leading slash and no trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`UrlBaseError`] when the configured prefix is invalid.
    pub fn url_base(&self) -> Result<String, UrlBaseError> {
        normalise_url_base(&self.url_base)
    }

    /// Dispatch thread count.
    #[must_use]
    pub fn http_threads(&self) -> usize {
        self.http_threads
    }

    /// Session limit.
    #[must_use]
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Maximum wait for a session task, `None` when unbounded.
    #[must_use]
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_ms > 0).then(|| Duration::from_millis(self.task_timeout_ms))
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Log file, when configured.
    #[must_use]
    pub fn log_path(&self) -> Option<&camino::Utf8Path> {
        self.log_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.port(), 9517);
        assert_eq!(config.http_threads(), 4);
        assert_eq!(config.max_sessions(), 1);
        assert_eq!(config.task_timeout(), None);
        assert_eq!(config.url_base().expect("base"), "");
        config.validate().expect("defaults validate");
    }

    #[rstest]
    #[case(Config { http_threads: 0, ..Config::default() }, ConfigError::NoHttpThreads)]
    #[case(Config { max_sessions: 0, ..Config::default() }, ConfigError::NoSessions)]
    #[case(
        Config { url_base: "/wd#frag".to_owned(), ..Config::default() },
        ConfigError::UrlBase(UrlBaseError::InvalidCharacter("/wd#frag".to_owned()))
    )]
    fn rejects_unusable_values(#[case] config: Config, #[case] expected: ConfigError) {
        assert_eq!(config.validate().expect_err("invalid config"), expected);
    }

    #[test]
    fn task_timeout_converts_milliseconds() {
        let config = Config {
            task_timeout_ms: 1500,
            ..Config::default()
        };
        assert_eq!(config.task_timeout(), Some(Duration::from_millis(1500)));
    }
}
