//! Protocol status taxonomy and the error type shared by the core.
//!
//! Every failure that reaches a client is a [`WebDriverError`]: a protocol
//! [`StatusCode`] plus a human-readable message. Status codes follow the JSON
//! wire protocol numbering; the 3xx/4xx/5xx members are transport-level
//! outcomes which the HTTP layer maps onto HTTP statuses rather than embedding
//! them in a JSON envelope.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Protocol-level result code carried in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The command completed.
    Success,
    /// No element matched the locator.
    NoSuchElement,
    /// The path does not name a known command.
    UnknownCommand,
    /// Internal or backend failure.
    UnknownError,
    /// A session task did not finish within the configured wait.
    Timeout,
    /// The referenced view is not open.
    NoSuchWindow,
    /// The session could not be initialised.
    SessionNotCreated,
    /// The client should follow the returned location.
    SeeOther,
    /// Parameters were missing or malformed.
    BadRequest,
    /// The referenced session does not exist (or no longer exists).
    SessionNotFound,
    /// The command exists but does not answer this HTTP method.
    MethodNotAllowed,
}

impl StatusCode {
    /// Numeric code placed in the `status` field.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Success => 0,
            Self::NoSuchElement => 7,
            Self::UnknownCommand => 9,
            Self::UnknownError => 13,
            Self::Timeout => 21,
            Self::NoSuchWindow => 23,
            Self::SessionNotCreated => 33,
            Self::SeeOther => 303,
            Self::BadRequest => 400,
            Self::SessionNotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }

    /// Returns `true` for [`StatusCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoSuchElement => "no such element",
            Self::UnknownCommand => "unknown command",
            Self::UnknownError => "unknown error",
            Self::Timeout => "timeout",
            Self::NoSuchWindow => "no such window",
            Self::SessionNotCreated => "session not created",
            Self::SeeOther => "see other",
            Self::BadRequest => "bad request",
            Self::SessionNotFound => "session not found",
            Self::MethodNotAllowed => "method not allowed",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// Failure surfaced to a client as a protocol response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct WebDriverError {
    status: StatusCode,
    message: String,
}

impl WebDriverError {
    /// Builds an error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Missing or malformed request parameters.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadRequest, message)
    }

    /// Internal or backend failure.
    pub fn unknown_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UnknownError, message)
    }

    /// Session initialisation failure.
    pub fn session_not_created(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SessionNotCreated, message)
    }

    /// Stale, unknown, or terminated session id.
    pub fn session_not_found(session_id: &str) -> Self {
        Self::new(
            StatusCode::SessionNotFound,
            format!("session {session_id} not found"),
        )
    }

    /// The referenced view is not open.
    pub fn no_such_window(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NoSuchWindow, message)
    }

    /// A session task outlived the configured wait.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Timeout, message)
    }

    /// The path did not match any route.
    pub fn unknown_command(method: &str, path: &str) -> Self {
        Self::new(
            StatusCode::UnknownCommand,
            format!("unknown command: {method} {path}"),
        )
    }

    /// Protocol status of the failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::Success, 0)]
    #[case(StatusCode::NoSuchElement, 7)]
    #[case(StatusCode::UnknownError, 13)]
    #[case(StatusCode::SessionNotCreated, 33)]
    #[case(StatusCode::SeeOther, 303)]
    #[case(StatusCode::BadRequest, 400)]
    #[case(StatusCode::SessionNotFound, 404)]
    fn status_codes_use_wire_numbering(#[case] status: StatusCode, #[case] code: u16) {
        assert_eq!(status.code(), code);
        assert_eq!(
            serde_json::to_value(status).expect("serialise status"),
            serde_json::json!(code)
        );
    }

    #[test]
    fn display_includes_status_and_message() {
        let error = WebDriverError::bad_request("Missing or invalid 'desiredCapabilities'");
        assert_eq!(
            error.to_string(),
            "bad request: Missing or invalid 'desiredCapabilities'"
        );
    }

    #[test]
    fn session_not_found_names_the_session() {
        let error = WebDriverError::session_not_found("abc");
        assert_eq!(error.status(), StatusCode::SessionNotFound);
        assert!(error.message().contains("abc"));
    }
}
