use thiserror::Error;

/// Result type alias for urlinfo operations
pub type Result<T> = std::result::Result<T, UrlinfoError>;

/// Errors that can surface from a URL check
#[derive(Error, Debug)]
pub enum UrlinfoError {
    /// The submitted URL is malformed or has no usable hostname
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A check arrived before the loaders finished bootstrapping
    #[error("URL checker is not initialized")]
    NotReady,

    /// A source failed to initialize
    #[error("source {source_id} failed: {message}")]
    Source {
        /// Identifier of the failing source
        source_id: String,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UrlinfoError {
    /// Returns true if the caller sent bad input
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUrl(_))
    }

    /// Returns true if the service cannot answer yet
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// HTTP status a routing layer should answer with
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUrl(_) => 400,
            Self::NotReady => 503,
            _ => 500,
        }
    }
}
