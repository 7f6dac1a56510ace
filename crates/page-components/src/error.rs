// Error types for page-components

use thiserror::Error;

/// Result type alias for page-components operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when resolving or verifying page elements
#[derive(Debug, Error)]
pub enum Error {
    /// Element not found before its timeout expired
    ///
    /// Carries the full composite description of the handle (name, locator, list index,
    /// frame and container chain) so the failure can be diagnosed without reading the page object.
    #[error("{description} was not found after {timeout_ms}ms")]
    ElementNotFound {
        description: String,
        timeout_ms: u64,
    },

    /// A native element reference no longer points at a live DOM node
    ///
    /// Drivers return this for detached references. The locator layer absorbs it and
    /// re-resolves, so callers of `Element`/`Elements` never observe it.
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// A verification never matched its expected condition before the timeout
    #[error("Assertion timeout: {0}")]
    AssertionTimeout(String),

    /// Missing or malformed configuration (e.g. no base URL for a page object)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The configured browser name is not known to the session provider
    #[error("Unsupported driver: '{0}'. Expected one of: chrome, firefox, edge, ie, safari, remote")]
    UnsupportedDriver(String),

    /// Transport-level error reported by the native driver (e.g. session disconnected)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error reported by the native driver
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid argument provided to method
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns true if this error (or the error it wraps) signals a stale reference
    pub fn is_stale(&self) -> bool {
        match self {
            Error::StaleElement(_) => true,
            Error::Context(_, inner) => inner.is_stale(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_description() {
        let err = Error::ElementNotFound {
            description: "Element 'By.CssSelector: #login' with container 'Element 'By.Id: form''"
                .to_string(),
            timeout_ms: 500,
        };
        let message = err.to_string();
        assert!(message.contains("By.CssSelector: #login"));
        assert!(message.contains("By.Id: form"));
        assert!(message.contains("500ms"));
    }

    #[test]
    fn test_stale_detection_through_context() {
        let err = Error::StaleElement("node-1".to_string()).context("reading text");
        assert!(err.is_stale());
        assert!(!Error::Transport("closed".to_string()).is_stale());
    }
}
