pub mod api;


use async_trait::async_trait;

pub use api::{
    ProgressApi, ProgressApiError, ProgressUpdate, RemoteProgress, RetryPolicy,
    create_standard_headers,
};

use super::traits::RemoteProgressStore;
use crate::models::ContentId;

#[async_trait]
impl RemoteProgressStore for ProgressApi {
    async fn fetch_progress(
        &self,
        bearer_token: &str,
        content_id: &ContentId,
    ) -> Result<Option<RemoteProgress>, ProgressApiError> {
        self.get_progress(bearer_token, content_id).await
    }

    async fn save_progress(
        &self,
        bearer_token: &str,
        content_id: &ContentId,
        update: &ProgressUpdate,
    ) -> Result<(), ProgressApiError> {
        self.put_progress(bearer_token, content_id, update).await
    }

    async fn list_in_progress(
        &self,
        bearer_token: &str,
    ) -> Result<Vec<RemoteProgress>, ProgressApiError> {
        self.get_in_progress(bearer_token).await
    }
}
