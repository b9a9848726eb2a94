use std::fmt;

use serde::Serialize;

/// Opaque identifier of a view within a session.
///
/// The empty id means "no view"; [`ViewId::is_valid`] tells the two apart.
/// Ids are minted by the session when a view is attached and double as the
/// window handles returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    /// Wraps an existing identifier, for example one sent back by a client.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns `true` unless this is the empty "no view" id.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Borrowed string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
