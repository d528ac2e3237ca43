//! Result and error types for Wardprobe.
//!
//! Driver failures are wrapped once at the `CommonEvents` boundary
//! ([`UiError::Interaction`]) and again by each workflow
//! ([`UiError::Workflow`]), so a report shows the business step first and the
//! locator/timeout last.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Wardprobe operations
pub type UiResult<T> = Result<T, UiError>;

/// Errors that can occur while driving the UI
#[derive(Debug, Error)]
pub enum UiError {
    /// Locator matched nothing within the wait bound
    #[error("Element {locator} not found within {timeout_ms}ms")]
    NotFound {
        /// Locator description
        locator: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// Condition never became true
    #[error("Timed out after {timeout_ms}ms waiting for {waited_for}")]
    Timeout {
        /// What was waited for
        waited_for: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
        /// Last transient error observed while polling
        #[source]
        last_error: Option<Box<UiError>>,
    },

    /// Element reference invalidated by navigation or DOM mutation
    #[error("Stale element reference: {element}")]
    Stale {
        /// Element description
        element: String,
    },

    /// Actual value did not match expected
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Screenshot could not be persisted
    #[error("Failed to write screenshot {}", path.display())]
    Screenshot {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Driver refused an interaction
    #[error("Failed to {action} {target}")]
    Interaction {
        /// Action name (click, type, hover, ...)
        action: &'static str,
        /// Target description
        target: String,
        /// Driver error
        #[source]
        source: Box<UiError>,
    },

    /// Workflow-level context
    #[error("{workflow}: {message}")]
    Workflow {
        /// Workflow name
        workflow: &'static str,
        /// Human-readable step description
        message: String,
        /// Cause
        #[source]
        source: Box<UiError>,
    },

    /// Required key absent from fixture or expectation map
    #[error("Required key '{key}' not present")]
    MissingKey {
        /// Dotted key path
        key: String,
    },

    /// Test data file could not be read or parsed
    #[error("Fixture error in {}: {message}", path.display())]
    Fixture {
        /// Fixture file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Low-level driver failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Script execution failure
    #[error("Script execution failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Coarse classification used by reports and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Locator never matched
    NotFound,
    /// Condition never satisfied
    Timeout,
    /// Element handle invalidated
    Stale,
    /// Value mismatch
    AssertionFailed,
    /// Persistence failure
    IoFailure,
    /// Everything else
    Other,
}

impl UiError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing-key error
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Adapter for `map_err` that adds workflow context
    ///
    /// ```ignore
    /// events.click(&tab).map_err(UiError::in_workflow("open_tab", "Failed to open tab"))?;
    /// ```
    pub fn in_workflow(
        workflow: &'static str,
        message: impl Into<String>,
    ) -> impl FnOnce(UiError) -> UiError {
        let message = message.into();
        move |source| Self::Workflow {
            workflow,
            message,
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping context wrappers.
    ///
    /// A `Timeout` is its own root; its last transient error stays reachable
    /// through `source()`.
    #[must_use]
    pub fn root_cause(&self) -> &UiError {
        match self {
            Self::Interaction { source, .. } | Self::Workflow { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Classify the root cause
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Stale { .. } => ErrorKind::Stale,
            Self::AssertionFailed { .. } => ErrorKind::AssertionFailed,
            Self::Screenshot { .. } | Self::Io(_) => ErrorKind::IoFailure,
            _ => ErrorKind::Other,
        }
    }

    /// Root cause is a timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Root cause is a not-found
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Root cause is a stale handle
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.kind() == ErrorKind::Stale
    }

    /// Errors that a polling wait should retry through
    #[must_use]
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Stale { .. })
    }

    /// Errors worth retrying while polling a handle the caller already holds.
    ///
    /// A stale handle never comes back, so only `NotFound` qualifies.
    #[must_use]
    pub(crate) fn is_retryable_for_handle(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Render the full cause chain on one line: `outer: middle: inner`
    #[must_use]
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut current: Option<&(dyn std::error::Error + 'static)> =
            std::error::Error::source(self);
        while let Some(err) = current {
            out.push_str(": ");
            out.push_str(&err.to_string());
            current = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> UiError {
        UiError::Timeout {
            waited_for: "URL to contain 'WardSupply'".to_string(),
            timeout_ms: 5000,
            last_error: None,
        }
    }

    #[test]
    fn test_root_cause_unwraps_workflow_and_interaction() {
        let err = UiError::Workflow {
            workflow: "navigation",
            message: "Navigation failed".to_string(),
            source: Box::new(UiError::Interaction {
                action: "click",
                target: "Stock link".to_string(),
                source: Box::new(timeout()),
            }),
        };
        assert!(err.is_timeout());
        assert!(matches!(err.root_cause(), UiError::Timeout { .. }));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            UiError::NotFound {
                locator: "x".into(),
                timeout_ms: 1
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            UiError::Stale {
                element: "x".into()
            }
            .kind(),
            ErrorKind::Stale
        );
        assert_eq!(UiError::assertion("x").kind(), ErrorKind::AssertionFailed);
        assert_eq!(
            UiError::Screenshot {
                path: PathBuf::from("a.png"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro"),
            }
            .kind(),
            ErrorKind::IoFailure
        );
        assert_eq!(UiError::driver("x").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_chain_contains_every_level() {
        let err = UiError::in_workflow("tab", "Failed to click Substore tab")(timeout());
        let chain = err.chain();
        assert!(chain.starts_with("tab: Failed to click Substore tab"));
        assert!(chain.contains("5000ms"));
        assert!(chain.contains("WardSupply"));
    }

    #[test]
    fn test_timeout_keeps_last_error_as_source() {
        let err = UiError::Timeout {
            waited_for: "x".into(),
            timeout_ms: 10,
            last_error: Some(Box::new(UiError::Stale {
                element: "row".into(),
            })),
        };
        assert!(err.chain().contains("Stale element reference: row"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_transient() {
        assert!(UiError::Stale { element: "x".into() }.is_transient());
        assert!(!UiError::driver("boom").is_transient());
    }
}
