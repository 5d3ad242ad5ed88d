use async_trait::async_trait;

use super::remote::{ProgressApiError, ProgressUpdate, RemoteProgress};
use crate::models::ContentId;

/// Authoritative progress storage for signed-in users
#[async_trait]
pub trait RemoteProgressStore: Send + Sync + std::fmt::Debug {
    /// Stored progress for one piece of content, `None` when the server has none
    async fn fetch_progress(
        &self,
        bearer_token: &str,
        content_id: &ContentId,
    ) -> Result<Option<RemoteProgress>, ProgressApiError>;

    /// Replace the stored progress for one piece of content
    async fn save_progress(
        &self,
        bearer_token: &str,
        content_id: &ContentId,
        update: &ProgressUpdate,
    ) -> Result<(), ProgressApiError>;

    /// The server's "continue watching" set
    async fn list_in_progress(
        &self,
        bearer_token: &str,
    ) -> Result<Vec<RemoteProgress>, ProgressApiError>;
}
