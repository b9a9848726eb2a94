//! The protocol server: shared context plus the dispatcher.
//!
//! [`Server::handle`] is transport-agnostic; the HTTP layer calls it from a
//! blocking worker thread with the raw method, path and body.

use std::sync::Arc;

use crate::dispatch::{Dispatcher, Response};
use crate::error::WebDriverError;
use crate::session::SessionManager;
use crate::view::ViewBackends;

/// State shared by every command.
#[derive(Debug, Clone)]
pub struct ServerContext {
    sessions: Arc<SessionManager>,
    backends: Arc<ViewBackends>,
    url_base: String,
}

impl ServerContext {
    /// Bundles the registry, the backends and the normalised URL base
    /// (`""` or `/prefix`).
    #[must_use]
    pub fn new(
        sessions: Arc<SessionManager>,
        backends: Arc<ViewBackends>,
        url_base: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            backends,
            url_base: url_base.into(),
        }
    }

    /// Session registry.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Registered view backends.
    #[must_use]
    pub fn backends(&self) -> &Arc<ViewBackends> {
        &self.backends
    }

    /// URL path prefix of every route.
    #[must_use]
    pub fn url_base(&self) -> &str {
        &self.url_base
    }
}

/// Serves protocol requests against one [`ServerContext`].
#[derive(Debug)]
pub struct Server {
    context: ServerContext,
    dispatcher: Dispatcher,
}

impl Server {
    /// Creates a server over the given context.
    #[must_use]
    pub fn new(context: ServerContext) -> Self {
        Self {
            context,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Shared context.
    #[must_use]
    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    /// Handles one request; `path` is the full request path including the URL
    /// base.
    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> Response {
        match self.strip_url_base(path) {
            Some(relative) => self
                .dispatcher
                .dispatch(&self.context, method, relative, body),
            None => WebDriverError::unknown_command(method, path).into(),
        }
    }

    /// Terminates every live session. Returns how many were terminated.
    pub fn shutdown(&self) -> usize {
        self.context.sessions.terminate_all()
    }

    fn strip_url_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        let base = self.context.url_base();
        if base.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(base)?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}
