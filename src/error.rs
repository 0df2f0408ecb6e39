// src/error.rs
//! Error taxonomy surfaced by the extraction pipeline

use thiserror::Error;

/// User-visible extraction failures. Login sub-step failures and AI
/// degradation never reach this type; they are logged and absorbed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid or missing URL")]
    InvalidInput { url: Option<String> },

    #[error("Failed to retrieve page content after all attempts.")]
    RetrievalFailure { url: String },

    #[error("Not enough readable job info found on the page.")]
    InsufficientContent { url: String, text_len: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ExtractError {
    /// HTTP status the inbound API answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } | Self::InsufficientContent { .. } => 400,
            Self::RetrievalFailure { .. } | Self::Configuration(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_URL",
            Self::RetrievalFailure { .. } => "RETRIEVAL_FAILED",
            Self::InsufficientContent { .. } => "INSUFFICIENT_CONTENT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Failures raised by a browser session. Only navigation and content capture
/// failures abort a rendered fetch; everything else is best-effort.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} timed out")]
    NavigationTimeout { url: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),
}
