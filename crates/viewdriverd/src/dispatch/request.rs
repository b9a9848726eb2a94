//! Request parsing for command dispatch.
//!
//! Requests arrive as an HTTP method, a path relative to the URL base and an
//! optional JSON body. Bodies must be JSON objects; an empty body is treated
//! as an empty parameter object.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::WebDriverError;

/// HTTP methods a command may answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Parses a method name; anything other than GET, POST or DELETE yields
    /// `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Splits a path into its non-empty segments.
#[must_use]
pub fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parses a request body into a parameter object.
///
/// # Errors
///
/// Returns `BadRequest` when the body is not valid JSON or not an object.
pub fn parse_parameters(body: &[u8]) -> Result<Map<String, Value>, WebDriverError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|error| WebDriverError::bad_request(format!("invalid JSON body: {error}")))?;
    match value {
        Value::Object(parameters) => Ok(parameters),
        _ => Err(WebDriverError::bad_request(
            "request body must be a JSON object",
        )),
    }
}
