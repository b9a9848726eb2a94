use crate::logging::LogFormat;

/// Default listen address for the HTTP server.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 9517;

/// Default number of worker threads dispatching HTTP requests.
pub const DEFAULT_HTTP_THREADS: usize = 4;

/// Default upper bound on concurrently live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1;

/// Default log filter expression used by the server.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default listen address as an owned value (e.g. for serde defaults).
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default TCP port.
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default HTTP worker thread count.
pub const fn default_http_threads() -> usize {
    DEFAULT_HTTP_THREADS
}

/// Default session limit.
pub const fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

/// Default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the server.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
