//! Structured telemetry initialisation for the server.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use camino::Utf8Path;
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use viewdriver_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The configured log file could not be opened for appending.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        /// Configured log path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the global
/// state, so the configuration of the first caller wins.
///
/// # Examples
///
/// ```rust
/// use viewdriver_config::Config;
/// use viewdriverd::telemetry;
///
/// # fn main() -> Result<(), viewdriverd::telemetry::TelemetryError> {
/// let config = Config::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// drop(first);
/// drop(second);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid, the log file cannot
/// be opened, or another subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let (writer, ansi) = match config.log_path() {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn open_log_file(path: &Utf8Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::io::Write;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 temp path")
    }

    #[test]
    fn log_file_is_created_and_appended() {
        let dir = TempDir::new().expect("temp dir");
        let path = temp_path(&dir, "viewdriverd.log");

        let mut first = open_log_file(&path).expect("open log");
        writeln!(first, "one").expect("write");
        let mut second = open_log_file(&path).expect("reopen log");
        writeln!(second, "two").expect("write");

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "one\ntwo\n");
    }

    #[test]
    fn missing_log_directory_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = temp_path(&dir, "missing/viewdriverd.log");

        let error = open_log_file(&path).expect_err("open must fail");
        assert!(matches!(error, TelemetryError::LogFile { .. }));
        assert!(error.to_string().contains("missing"));
    }
}
