use thiserror::Error;

use crate::backends::ProgressApiError;

/// Internal failure taxonomy of the synchronizer.
///
/// None of these reach callers of the public progress operations; they decide
/// how a failed lookup or write degrades.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Local storage unavailable: {0}")]
    LocalStorage(String),

    #[error("Remote progress store error: {0}")]
    Remote(#[from] ProgressApiError),

    #[error("Malformed progress record for {content_id}: {source}")]
    MalformedRecord {
        content_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SyncError {
    pub fn local(error: anyhow::Error) -> Self {
        SyncError::LocalStorage(format!("{:#}", error))
    }

    /// The bearer token was rejected; remote calls should stop until it changes
    pub fn is_auth_loss(&self) -> bool {
        matches!(self, SyncError::Remote(e) if e.is_auth_failure())
    }

    /// The stored or returned payload is unusable and counts as "no record"
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SyncError::MalformedRecord { .. } | SyncError::Remote(ProgressApiError::ParseError(_))
        )
    }
}
