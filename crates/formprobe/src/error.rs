//! Error types for form probing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Driver failed to start: {0}")]
    DriverStartup(String),

    #[error("Driver health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No alert is open")]
    NoAlert,

    #[error("WebDriver error: {error} - {message}")]
    WebDriver { error: String, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid suite: {0}")]
    InvalidSuite(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProbeError {
    /// Lookup failures: a named field or the submit control is missing.
    pub fn is_lookup(&self) -> bool {
        matches!(self, ProbeError::ElementNotFound(_))
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
