//! Error types for the scenario runner
//!
//! Error messages are meant to be actionable for whoever is staring at a red
//! run, with hints on how to fix the environment where that makes sense.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use thirtyfour::error::WebDriverError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === WebDriver process errors ===
    #[error("WebDriver not reachable at {0}. Start chromedriver or set browser.spawn_driver = true")]
    DriverNotRunning(String),

    #[error("Failed to start WebDriver: not ready after {0} seconds")]
    DriverSpawnTimeout(u64),

    #[error("WebDriver binary '{name}' not found. Searched: {searched}")]
    DriverNotFound { name: String, searched: String },

    #[error("Browser driver error: {0}")]
    Driver(String),

    // === Page errors ===
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page did not reach '{state}' within {timeout_ms} ms")]
    LoadStateTimeout { state: String, timeout_ms: u64 },

    // === Element errors ===
    #[error("Element {locator} was not actionable within {timeout_ms} ms")]
    LocatorTimeout { locator: String, timeout_ms: u64 },

    #[error("{message}")]
    AssertionTimeout {
        locator: String,
        timeout_ms: u64,
        message: String,
    },

    #[error("Element is not actionable: {0}")]
    NotActionable(String),

    #[error("Element handle {0} is no longer known to the session")]
    StaleHandle(u64),

    #[error("Script returned an unexpected value: {0}")]
    UnexpectedScriptValue(String),

    // === Scenario errors ===
    #[error("Unknown scenario '{0}'. Use 'storefront-e2e list' to see available scenarios")]
    ScenarioNotFound(String),

    #[error("Invalid scenario: {0}")]
    ScenarioParse(String),

    // === Configuration errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a driver not found error with search paths
    pub fn driver_not_found<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self::DriverNotFound {
            name: name.to_string(),
            searched: paths.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a navigation error
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error into the failure taxonomy reported to users
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Navigation { .. } | Error::LoadStateTimeout { .. } => FailureKind::Navigation,
            Error::LocatorTimeout { .. } | Error::NotActionable(_) | Error::StaleHandle(_) => {
                FailureKind::LocatorTimeout
            }
            Error::AssertionTimeout { .. } => FailureKind::AssertionTimeout,
            _ => FailureKind::Driver,
        }
    }
}

/// Element-level rejections blame the page; everything else is the driver's
impl From<WebDriverError> for Error {
    fn from(e: WebDriverError) -> Self {
        match e {
            WebDriverError::ElementClickIntercepted(info) => {
                Error::NotActionable(format!("click intercepted: {}", info.value.message))
            }
            WebDriverError::ElementNotInteractable(info) => {
                Error::NotActionable(format!("not interactable: {}", info.value.message))
            }
            WebDriverError::StaleElementReference(info) => {
                Error::NotActionable(format!("detached from the page: {}", info.value.message))
            }
            WebDriverError::NoSuchElement(info) => {
                Error::NotActionable(format!("no such element: {}", info.value.message))
            }
            other => Error::Driver(other.to_string()),
        }
    }
}

/// Failure taxonomy carried by a failed or errored run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Target unreachable or page never loaded
    #[serde(rename = "NAVIGATION_ERROR")]
    Navigation,
    /// Element not found or not actionable within its budget
    LocatorTimeout,
    /// Expected post-condition never observed
    AssertionTimeout,
    /// Automation backend fault
    #[serde(rename = "DRIVER_ERROR")]
    Driver,
}

impl FailureKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::Navigation => "NAVIGATION_ERROR",
            FailureKind::LocatorTimeout => "LOCATOR_TIMEOUT",
            FailureKind::AssertionTimeout => "ASSERTION_TIMEOUT",
            FailureKind::Driver => "DRIVER_ERROR",
        }
    }

    /// Whether this kind blames the application under test rather than the
    /// environment running it
    pub fn is_application_failure(&self) -> bool {
        matches!(self, FailureKind::LocatorTimeout | FailureKind::AssertionTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirtyfour::error::WebDriverErrorInfo;

    #[test]
    fn test_assertion_timeout_displays_caller_message() {
        let err = Error::AssertionTimeout {
            locator: "text=Success".to_string(),
            timeout_ms: 1000,
            message: "expected success banner".to_string(),
        };
        assert_eq!(err.to_string(), "expected success banner");
        assert_eq!(err.kind(), FailureKind::AssertionTimeout);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::navigation("http://localhost:5173", "refused").kind(),
            FailureKind::Navigation
        );
        assert_eq!(
            Error::LoadStateTimeout {
                state: "load".to_string(),
                timeout_ms: 3000
            }
            .kind(),
            FailureKind::Navigation
        );
        assert_eq!(Error::Driver("crashed".into()).kind(), FailureKind::Driver);
        assert_eq!(Error::Internal("oops".into()).kind(), FailureKind::Driver);
        assert!(FailureKind::LocatorTimeout.is_application_failure());
        assert!(!FailureKind::Driver.is_application_failure());
    }

    fn info(message: &str) -> WebDriverErrorInfo {
        WebDriverErrorInfo::new(message.to_string())
    }

    #[test]
    fn test_click_intercepted_is_not_actionable() {
        let err = Error::from(WebDriverError::ElementClickIntercepted(info(
            "element <div class=\"overlay\"> would receive the click",
        )));
        assert!(matches!(err, Error::NotActionable(_)));
        assert_eq!(err.kind(), FailureKind::LocatorTimeout);
        assert!(err.to_string().contains("overlay"));
    }

    #[test]
    fn test_not_interactable_is_not_actionable() {
        let err = Error::from(WebDriverError::ElementNotInteractable(info("element not visible")));
        assert_eq!(err.kind(), FailureKind::LocatorTimeout);
    }

    #[test]
    fn test_stale_element_is_not_actionable() {
        let err = Error::from(WebDriverError::StaleElementReference(info("node detached")));
        assert_eq!(err.kind(), FailureKind::LocatorTimeout);
    }

    #[test]
    fn test_no_such_element_is_not_actionable() {
        let err = Error::from(WebDriverError::NoSuchElement(info("#cart")));
        assert_eq!(err.kind(), FailureKind::LocatorTimeout);
    }

    #[test]
    fn test_transport_errors_stay_driver_errors() {
        let err = Error::from(WebDriverError::HttpError("connection reset".to_string()));
        assert!(matches!(err, Error::Driver(_)));
        assert_eq!(err.kind(), FailureKind::Driver);
        let err = Error::from(WebDriverError::Timeout("session".to_string()));
        assert_eq!(err.kind(), FailureKind::Driver);
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&FailureKind::LocatorTimeout).unwrap();
        assert_eq!(json, "\"LOCATOR_TIMEOUT\"");
        assert_eq!(FailureKind::LocatorTimeout.code(), "LOCATOR_TIMEOUT");
    }
}
