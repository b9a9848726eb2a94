//! Process supervision: runtime construction, serving and shutdown.

use std::time::Duration;

mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_server;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
