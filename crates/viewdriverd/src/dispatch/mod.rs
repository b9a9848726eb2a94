//! Command dispatch for the JSON wire protocol.
//!
//! A request is resolved against a static route table to a [`Command`] bound
//! to the request's path segments and body parameters. Commands either talk
//! to the session registry directly or ship view work to the addressed
//! session's thread, and always produce a [`Response`].
//!
//! ## Routes
//!
//! | Method(s)    | Path                        |
//! |--------------|-----------------------------|
//! | GET          | `/status`                   |
//! | POST         | `/session`                  |
//! | GET          | `/sessions`                 |
//! | GET, DELETE  | `/session/*`                |
//! | GET          | `/session/*/window_handle`  |
//! | GET          | `/session/*/window_handles` |
//! | POST, DELETE | `/session/*/window`         |
//! | GET          | `/session/*/title`          |
//! | GET          | `/session/*/url`            |

mod command;
mod commands;
mod request;
mod response;
mod router;

pub use self::command::{Command, CommandArgs};
pub use self::request::{HttpMethod, parse_parameters, path_segments};
pub use self::response::Response;
pub use self::router::Dispatcher;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
