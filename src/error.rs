//! Error types
//!
//! Render failures come from user views and layouts and travel up the
//! middleware chain untouched; the app turns them into a 500 at the top.

use std::error::Error as StdError;
use thiserror::Error;

/// Failure raised by a view or layout while producing markup
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it reachable through `source()`
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfacing from request dispatch
#[derive(Debug, Error)]
pub enum AppError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("failed to read request body: {0}")]
    Body(#[source] Box<dyn StdError + Send + Sync>),

    #[error("request body too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: u64, max: u64 },
}

/// Startup errors for the server binary
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid address: {0}")]
    Addr(String),
}
