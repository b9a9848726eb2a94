//! The command abstraction shared by every endpoint.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::request::HttpMethod;
use super::response::Response;
use crate::error::{StatusCode, WebDriverError};
use crate::server::ServerContext;
use crate::session::Session;

/// Path segments and parsed parameters of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    segments: Vec<String>,
    parameters: Map<String, Value>,
}

impl CommandArgs {
    /// Bundles the request's path segments and body parameters.
    #[must_use]
    pub fn new(segments: Vec<String>, parameters: Map<String, Value>) -> Self {
        Self {
            segments,
            parameters,
        }
    }

    /// All path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path segment at `index`.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Session id addressed by `/session/{id}/…` paths.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self.segment(0) {
            Some("session") => self.segment(1),
            _ => None,
        }
    }

    /// Body parameters.
    #[must_use]
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Object-valued parameter; `None` when absent or of another type.
    #[must_use]
    pub fn dictionary(&self, key: &str) -> Option<&Map<String, Value>> {
        self.parameters.get(key).and_then(Value::as_object)
    }

    /// String-valued parameter; `None` when absent or of another type.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Required string parameter.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when the parameter is missing or not a string.
    pub fn require_string(&self, key: &str) -> Result<&str, WebDriverError> {
        self.string(key)
            .ok_or_else(|| WebDriverError::bad_request(format!("Missing or invalid '{key}'")))
    }

    /// Resolves the addressed session through the manager.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when the path names no live session.
    pub fn session(&self, context: &ServerContext) -> Result<Arc<Session>, WebDriverError> {
        let session_id = self
            .session_id()
            .ok_or_else(|| WebDriverError::session_not_found(""))?;
        context.sessions().lookup(session_id)
    }
}

/// A protocol endpoint bound to one request.
///
/// Implementations declare the methods they answer and implement the
/// matching `execute_*` operation. Parameter validation must happen before
/// any session or view is touched.
pub trait Command: Send {
    /// Answers `GET`.
    fn does_get(&self) -> bool {
        false
    }

    /// Answers `POST`.
    fn does_post(&self) -> bool {
        false
    }

    /// Answers `DELETE`.
    fn does_delete(&self) -> bool {
        false
    }

    /// Handles `GET`.
    ///
    /// # Errors
    ///
    /// Any protocol failure of the command.
    fn execute_get(&self, _context: &ServerContext) -> Result<Response, WebDriverError> {
        Err(unsupported(HttpMethod::Get))
    }

    /// Handles `POST`.
    ///
    /// # Errors
    ///
    /// Any protocol failure of the command.
    fn execute_post(&self, _context: &ServerContext) -> Result<Response, WebDriverError> {
        Err(unsupported(HttpMethod::Post))
    }

    /// Handles `DELETE`.
    ///
    /// # Errors
    ///
    /// Any protocol failure of the command.
    fn execute_delete(&self, _context: &ServerContext) -> Result<Response, WebDriverError> {
        Err(unsupported(HttpMethod::Delete))
    }

    /// Methods this command answers, in GET/POST/DELETE order.
    fn allowed_methods(&self) -> Vec<HttpMethod> {
        [
            (HttpMethod::Get, self.does_get()),
            (HttpMethod::Post, self.does_post()),
            (HttpMethod::Delete, self.does_delete()),
        ]
        .into_iter()
        .filter_map(|(method, supported)| supported.then_some(method))
        .collect()
    }

    /// Returns `true` when the command answers `method`.
    fn supports(&self, method: HttpMethod) -> bool {
        match method {
            HttpMethod::Get => self.does_get(),
            HttpMethod::Post => self.does_post(),
            HttpMethod::Delete => self.does_delete(),
        }
    }

    /// Runs the operation matching `method`.
    ///
    /// # Errors
    ///
    /// Any protocol failure of the command.
    fn execute(
        &self,
        method: HttpMethod,
        context: &ServerContext,
    ) -> Result<Response, WebDriverError> {
        match method {
            HttpMethod::Get => self.execute_get(context),
            HttpMethod::Post => self.execute_post(context),
            HttpMethod::Delete => self.execute_delete(context),
        }
    }
}

fn unsupported(method: HttpMethod) -> WebDriverError {
    WebDriverError::new(
        StatusCode::MethodNotAllowed,
        format!("command does not implement {method}"),
    )
}
