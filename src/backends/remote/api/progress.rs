use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::ProgressApi;
use super::errors::ProgressApiError;
use super::types::{ProgressUpdate, RemoteProgress};
use crate::models::ContentId;

impl ProgressApi {
    fn progress_url(&self, content_id: &ContentId) -> String {
        let encoded = utf8_percent_encode(content_id.as_str(), NON_ALPHANUMERIC);
        self.build_url(&format!("/progress/{}", encoded))
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProgressApiError> {
        let bytes = response
            .bytes()
            .await
            .map_err(ProgressApiError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| ProgressApiError::ParseError(e.to_string()))
    }

    /// `GET /progress/{contentId}`; a 404 is `Ok(None)`
    pub async fn get_progress(
        &self,
        bearer_token: &str,
        content_id: &ContentId,
    ) -> Result<Option<RemoteProgress>, ProgressApiError> {
        let url = self.progress_url(content_id);

        match self
            .execute(Method::GET, &url, bearer_token, None, "get_progress")
            .await
        {
            Ok(response) => Ok(Some(Self::parse_json(response).await?)),
            Err(ProgressApiError::NotFound) => {
                debug!("No remote progress for content {}", content_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `PUT /progress/{contentId}`
    pub async fn put_progress(
        &self,
        bearer_token: &str,
        content_id: &ContentId,
        update: &ProgressUpdate,
    ) -> Result<(), ProgressApiError> {
        let url = self.progress_url(content_id);

        self.execute(Method::PUT, &url, bearer_token, Some(update), "put_progress")
            .await?;

        debug!(
            "Saved remote progress for {} at {:.1}s",
            content_id, update.position
        );
        Ok(())
    }

    /// `GET /progress?status=in-progress`
    pub async fn get_in_progress(
        &self,
        bearer_token: &str,
    ) -> Result<Vec<RemoteProgress>, ProgressApiError> {
        let url = self.build_url("/progress?status=in-progress");

        let response = self
            .execute(Method::GET, &url, bearer_token, None, "get_in_progress")
            .await?;

        Self::parse_json(response).await
    }
}
