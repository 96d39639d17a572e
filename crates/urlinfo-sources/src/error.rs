use thiserror::Error;

/// Result type alias for source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Errors from a single threat intelligence source.
///
/// During a check these are indeterminate outcomes: the source could not say
/// whether the URL is clean.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Request could not be sent or the connection failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Remote endpoint answered with a non-success status
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// The per-request deadline passed before an answer arrived
    #[error("query deadline exceeded")]
    Timeout,

    /// The source was queried before it finished initializing
    #[error("source not initialized")]
    NotReady,

    /// Source data or response body could not be understood
    #[error("parse error: {0}")]
    Parse(String),

    /// Reading source data failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    /// Returns true if the source ran out of time rather than failing
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Convert into the service error, tagged with the failing source
    #[must_use]
    pub fn into_service_error(self, source_id: &str) -> urlinfo_core::UrlinfoError {
        match self {
            Self::NotReady => urlinfo_core::UrlinfoError::NotReady,
            other => urlinfo_core::UrlinfoError::Source {
                source_id: source_id.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Http(err.to_string())
        }
    }
}
