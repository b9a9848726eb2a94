//! Method and path routing for protocol commands.
//!
//! Routes are matched segment by segment against a static table; `*` in a
//! pattern matches any single segment. An unmatched path is an unknown
//! command, while a matched path that does not answer the request method is
//! reported with the list of methods it does answer. The body is only parsed
//! once the method is known to be answered.

use serde_json::Map;
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::command::{Command, CommandArgs};
use super::commands::{
    CreateSession, GetTitle, GetUrl, GetWindowHandle, GetWindowHandles, ListSessions,
    SessionWithId, StatusCommand, WindowCommand,
};
use super::request::{HttpMethod, parse_parameters, path_segments};
use super::response::Response;
use crate::error::{StatusCode, WebDriverError};
use crate::server::ServerContext;

type CommandBuilder = fn(CommandArgs) -> Box<dyn Command>;

fn build<C>(args: CommandArgs) -> Box<dyn Command>
where
    C: Command + From<CommandArgs> + 'static,
{
    Box::new(C::from(args))
}

struct Route {
    pattern: &'static str,
    build: CommandBuilder,
}

impl Route {
    fn matches(&self, segments: &[String]) -> bool {
        let pattern: Vec<&str> = self
            .pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        pattern.len() == segments.len()
            && pattern
                .iter()
                .zip(segments)
                .all(|(expected, actual)| *expected == "*" || expected == actual)
    }
}

const ROUTES: &[Route] = &[
    Route {
        pattern: "/status",
        build: build::<StatusCommand>,
    },
    Route {
        pattern: "/session",
        build: build::<CreateSession>,
    },
    Route {
        pattern: "/sessions",
        build: build::<ListSessions>,
    },
    Route {
        pattern: "/session/*",
        build: build::<SessionWithId>,
    },
    Route {
        pattern: "/session/*/window_handle",
        build: build::<GetWindowHandle>,
    },
    Route {
        pattern: "/session/*/window_handles",
        build: build::<GetWindowHandles>,
    },
    Route {
        pattern: "/session/*/window",
        build: build::<WindowCommand>,
    },
    Route {
        pattern: "/session/*/title",
        build: build::<GetTitle>,
    },
    Route {
        pattern: "/session/*/url",
        build: build::<GetUrl>,
    },
];

/// Resolves requests to commands and runs them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dispatcher;

impl Dispatcher {
    /// Creates a dispatcher over the built-in route table.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Patterns of every registered route, in table order.
    #[must_use]
    pub fn patterns(&self) -> Vec<&'static str> {
        ROUTES.iter().map(|route| route.pattern).collect()
    }

    /// Dispatches one request. `path` is relative to the URL base.
    pub fn dispatch(
        &self,
        context: &ServerContext,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Response {
        let segments = path_segments(path);
        let Some(route) = ROUTES.iter().find(|route| route.matches(&segments)) else {
            debug!(target: DISPATCH_TARGET, method, path, "no route matched");
            return WebDriverError::unknown_command(method, path).into();
        };

        // Answered methods depend only on the command type.
        let declared = (route.build)(CommandArgs::new(segments.clone(), Map::new()));
        let supported = HttpMethod::parse(method).filter(|parsed| declared.supports(*parsed));
        let Some(method) = supported else {
            debug!(target: DISPATCH_TARGET, method, path, "method not allowed");
            return Response::method_not_allowed(method, declared.allowed_methods());
        };

        let parameters = match parse_parameters(body) {
            Ok(parameters) => parameters,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = method.as_str(),
                    path,
                    %error,
                    "rejected request body"
                );
                return error.into();
            }
        };

        let args = CommandArgs::new(segments, parameters);
        let session_id = args.session_id().map(str::to_owned);
        let command = (route.build)(args);

        debug!(
            target: DISPATCH_TARGET,
            method = method.as_str(),
            route = route.pattern,
            "dispatching command"
        );
        let response = command
            .execute(method, context)
            .unwrap_or_else(|error| {
                if error.status() == StatusCode::UnknownError {
                    warn!(target: DISPATCH_TARGET, route = route.pattern, %error, "command failed");
                } else {
                    debug!(target: DISPATCH_TARGET, route = route.pattern, %error, "command failed");
                }
                Response::from(error)
            });

        match session_id {
            Some(session_id) if response.session_id().is_none() => {
                response.with_session_id(session_id)
            }
            _ => response,
        }
    }
}

#[cfg(test)]
mod tests;
