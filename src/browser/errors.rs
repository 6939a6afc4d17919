//! Browser error types

use thiserror::Error;

/// Browser-related errors
///
/// `LaunchFailed` is the session-acquisition case; everything else happens
/// inside an open session and is downgraded to a failed outcome per account.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Input failed: {0}")]
    InputFailed(String),

    #[error("JavaScript error: {0}")]
    JavaScriptError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}
