//! Normalisation of the URL path prefix under which commands are served.
//!
//! Operators may write the prefix with or without surrounding slashes
//! (`wd/hub`, `/wd/hub/`, `wd/hub/`). Internally the prefix always carries a
//! single leading slash and no trailing slash, and the empty prefix stands for
//! "serve from the root". This keeps `format!("{base}/session/{id}")` correct
//! for every spelling.

use thiserror::Error;

/// Errors raised when a URL base cannot be used as a path prefix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlBaseError {
    /// Query strings and fragments cannot appear in a path prefix.
    #[error("url base '{0}' must not contain '?' or '#'")]
    InvalidCharacter(String),
}

/// Normalises a configured URL base.
///
/// # Errors
///
/// Returns [`UrlBaseError::InvalidCharacter`] when the value contains a query
/// or fragment delimiter.
pub fn normalise_url_base(raw: &str) -> Result<String, UrlBaseError> {
    if raw.contains(['?', '#']) {
        return Err(UrlBaseError::InvalidCharacter(raw.to_owned()));
    }

    let segments: Vec<&str> = raw
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("/{}", segments.join("/")))
}
