//! Capability maps negotiated at session creation.

use serde_json::{Map, Value};


/// Name of an existing window to attach to; `"*"` matches any.
pub const BROWSER_START_WINDOW: &str = "browserStartWindow";
/// Class of a window to create when nothing is attached by name.
pub const BROWSER_CLASS: &str = "browserClass";
/// Start-window name matching the first enumerated view.
pub const ANY_WINDOW: &str = "*";

/// Desired and optional required capabilities, as sent by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    desired: Map<String, Value>,
    required: Option<Map<String, Value>>,
}

/// One way of obtaining the session's starting view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartView {
    /// Attach to an open view whose window name matches.
    AttachByName(String),
    /// Ask the factories for a new view of this class.
    CreateByClass(String),
}

impl Capabilities {
    /// Wraps the request's capability objects.
    #[must_use]
    pub fn new(desired: Map<String, Value>, required: Option<Map<String, Value>>) -> Self {
        Self { desired, required }
    }

    /// Capabilities the client would like.
    #[must_use]
    pub fn desired(&self) -> &Map<String, Value> {
        &self.desired
    }

    /// Capabilities the client insists on, when given.
    #[must_use]
    pub fn required(&self) -> Option<&Map<String, Value>> {
        self.required.as_ref()
    }

    /// Ordered strategies for resolving the starting view.
    ///
    /// A required start window or class is authoritative and suppresses the
    /// desired keys. Keys whose value is not a string count as absent. Otherwise the desired start window is tried first, then
    /// the desired class, falling back to the default class `""`.
    #[must_use]
    pub fn start_view_attempts(&self) -> Vec<StartView> {
        if let Some(required) = &self.required {
            if let Some(name) = string_value(required, BROWSER_START_WINDOW) {
                return vec![StartView::AttachByName(name.to_owned())];
            }
            if let Some(class) = string_value(required, BROWSER_CLASS) {
                return vec![StartView::CreateByClass(class.to_owned())];
            }
        }

        let mut attempts = Vec::with_capacity(2);
        if let Some(name) = string_value(&self.desired, BROWSER_START_WINDOW) {
            attempts.push(StartView::AttachByName(name.to_owned()));
        }
        let class = string_value(&self.desired, BROWSER_CLASS).unwrap_or_default();
        attempts.push(StartView::CreateByClass(class.to_owned()));
        attempts
    }

    /// Effective capability object: desired keys overridden by required ones.
    #[must_use]
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = self.desired.clone();
        if let Some(required) = &self.required {
            merged.extend(required.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        merged
    }
}

fn string_value<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}
