//! A WebDriver (JSON wire protocol) server core.
//!
//! Every client session owns one dedicated thread. Commands received over
//! HTTP are routed by the [`dispatch`] layer, which either answers from the
//! session registry or ships view work to the session's thread through its
//! task queue and blocks for the result. View operations go through
//! plug-in traits in [`view`], so the core never depends on a particular
//! browser engine; [`headless`] is the in-process engine registered by
//! default.
//!
//! Startup follows a fixed sequence: load configuration via
//! [`viewdriver_config`], install structured telemetry, register the view
//! backends, bind the listener, then serve until SIGINT or SIGTERM. On
//! shutdown every live session is terminated and its views are released.
//! Health hooks emit a structured event at each stage.

pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod headless;
pub mod health;
mod process;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod view;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, ViewDriver,
    bootstrap_with,
};
pub use error::{StatusCode, WebDriverError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_server};
pub use server::{Server, ServerContext};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
