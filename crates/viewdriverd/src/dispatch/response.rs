//! Protocol responses produced by commands.

use serde::Serialize;
use serde_json::{Value, json};

use super::request::HttpMethod;
use crate::error::{StatusCode, WebDriverError};

/// Outcome of a command: protocol status, optional session id and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    session_id: Option<String>,
    value: Value,
    allowed_methods: Vec<HttpMethod>,
}

/// Wire envelope: `{"sessionId": …, "status": …, "value": …}`.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(rename = "sessionId")]
    session_id: Option<&'a str>,
    status: StatusCode,
    value: &'a Value,
}

impl Response {
    /// Successful response carrying `value`.
    #[must_use]
    pub fn success(value: Value) -> Self {
        Self {
            status: StatusCode::Success,
            session_id: None,
            value,
            allowed_methods: Vec::new(),
        }
    }

    /// Redirect to `location`.
    #[must_use]
    pub fn see_other(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SeeOther,
            session_id: None,
            value: Value::String(location.into()),
            allowed_methods: Vec::new(),
        }
    }

    /// The path is known but does not answer the request method.
    #[must_use]
    pub fn method_not_allowed(method: &str, allowed: Vec<HttpMethod>) -> Self {
        let listed: Vec<&str> = allowed.iter().map(|method| method.as_str()).collect();
        Self {
            status: StatusCode::MethodNotAllowed,
            session_id: None,
            value: json!({
                "message": format!("method {method} not allowed; use {}", listed.join(", ")),
            }),
            allowed_methods: allowed,
        }
    }

    /// Attaches the session id the response refers to.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Protocol status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Session the response refers to, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Response payload.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Methods to advertise in an `Allow` header.
    #[must_use]
    pub fn allowed_methods(&self) -> &[HttpMethod] {
        &self.allowed_methods
    }

    /// Error message for failed responses.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.value {
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Serialises the JSON envelope.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialisation failures.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Envelope {
            session_id: self.session_id.as_deref(),
            status: self.status,
            value: &self.value,
        })
    }
}

impl From<WebDriverError> for Response {
    fn from(error: WebDriverError) -> Self {
        Self {
            status: error.status(),
            session_id: None,
            value: json!({ "message": error.message() }),
            allowed_methods: Vec::new(),
        }
    }
}
