use thiserror::Error;

/// Typed error enum for remote progress API operations
///
/// Differentiates failure modes so the synchronizer can decide between
/// retrying, falling back to the local mirror, or treating the record as absent.
#[derive(Error, Debug, Clone)]
pub enum ProgressApiError {
    /// Bearer token rejected (401, 403). Not retried; the session is treated as lost.
    #[error("Authentication failed: {message} (status: {status})")]
    Authentication { status: u16, message: String },

    /// No progress stored for the requested content (404)
    #[error("Progress not found")]
    NotFound,

    /// Rate limiting (429), retried with backoff
    #[error("Rate limited: {message} (retry after: {retry_after:?}s)")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Server error (500+), retried
    #[error("Server error: {message} (status: {status})")]
    ServerError { status: u16, message: String },

    /// Remaining 4xx responses, not retried
    #[error("Client error: {message} (status: {status})")]
    ClientError { status: u16, message: String },

    /// Timeouts, refused connections and other transport failures, retried
    #[error("Network error: {0}")]
    Network(String),

    /// Payload did not match the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    Other(String),
}

impl ProgressApiError {
    /// Check if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProgressApiError::Network(_)
                | ProgressApiError::ServerError { .. }
                | ProgressApiError::RateLimit { .. }
        )
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ProgressApiError::Authentication { .. })
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProgressApiError::RateLimit { .. })
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ProgressApiError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProgressApiError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ProgressApiError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() {
            ProgressApiError::Network(format!("Request error: {}", error))
        } else if error.is_decode() {
            ProgressApiError::ParseError(error.to_string())
        } else {
            ProgressApiError::Other(error.to_string())
        }
    }

    /// Map an HTTP status, body and optional `Retry-After` value to an error
    pub fn from_status(status: u16, body: String, retry_after: Option<u64>) -> Self {
        match status {
            401 | 403 => ProgressApiError::Authentication {
                status,
                message: body,
            },
            404 => ProgressApiError::NotFound,
            429 => ProgressApiError::RateLimit {
                message: body,
                retry_after,
            },
            400..=499 => ProgressApiError::ClientError {
                status,
                message: body,
            },
            500..=599 => ProgressApiError::ServerError {
                status,
                message: body,
            },
            _ => ProgressApiError::Other(format!("HTTP {}: {}", status, body)),
        }
    }
}
