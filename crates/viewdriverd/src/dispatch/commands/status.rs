use serde_json::json;

use crate::dispatch::{Command, Response};
use crate::error::WebDriverError;
use crate::server::ServerContext;

command! {
    /// `GET /status`: build and readiness information.
    StatusCommand, ignores_args
}

impl Command for StatusCommand {
    fn does_get(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let sessions = context.sessions();
        let ready = sessions.len() < sessions.max_sessions();
        let message = if ready {
            "ready to create a session"
        } else {
            "session limit reached"
        };
        Ok(Response::success(json!({
            "ready": ready,
            "message": message,
            "build": { "version": env!("CARGO_PKG_VERSION") },
            "os": {
                "name": std::env::consts::OS,
                "arch": std::env::consts::ARCH,
            },
        })))
    }
}
