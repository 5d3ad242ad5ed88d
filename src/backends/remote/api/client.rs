use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, Response};
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::ProgressApiError;
use super::retry::RetryPolicy;
use super::types::ProgressUpdate;
use crate::constants::{CLIENT_PRODUCT, CLIENT_VERSION};

/// Create the headers every progress API request carries.
///
/// A token that cannot be expressed as a header value is reported as an
/// authentication failure, since the server would reject it anyway.
pub fn create_standard_headers(bearer_token: &str) -> Result<HeaderMap, ProgressApiError> {
    let mut headers = HeaderMap::new();

    let auth = HeaderValue::from_str(&format!("Bearer {}", bearer_token)).map_err(|_| {
        ProgressApiError::Authentication {
            status: 0,
            message: "bearer token is not a valid header value".to_string(),
        }
    })?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let agent = format!("{}/{}", CLIENT_PRODUCT, CLIENT_VERSION);
    if let Ok(value) = HeaderValue::from_str(&agent) {
        headers.insert(USER_AGENT, value);
    }

    Ok(headers)
}

/// HTTP client for the Madifa progress endpoints
#[derive(Clone, Debug)]
pub struct ProgressApi {
    pub(super) client: reqwest::Client,
    pub(super) base_url: String,
    pub(super) retry_policy: RetryPolicy,
}

impl ProgressApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProgressApiError> {
        Self::with_retry_policy(base_url, timeout, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        base_url: impl Into<String>,
        timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Result<Self, ProgressApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProgressApiError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(super) fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Execute a request with retry logic, turning non-success statuses into typed errors
    pub(super) async fn execute(
        &self,
        method: Method,
        url: &str,
        bearer_token: &str,
        body: Option<&ProgressUpdate>,
        operation_name: &str,
    ) -> Result<Response, ProgressApiError> {
        let headers = create_standard_headers(bearer_token)?;

        self.retry_policy
            .execute(operation_name, || async {
                debug!("[{}] {} {}", operation_name, method, url);

                let mut request = self
                    .client
                    .request(method.clone(), url)
                    .headers(headers.clone());
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await.map_err(ProgressApiError::from_reqwest)?;
                let status = response.status();

                debug!("[{}] Response: {}", operation_name, status);

                if status.is_success() {
                    return Ok(response);
                }

                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());

                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response body>".to_string());

                let error = ProgressApiError::from_status(status.as_u16(), body, retry_after);
                if !matches!(error, ProgressApiError::NotFound) {
                    warn!(
                        "[{}] Error response - Status: {}, Error: {}",
                        operation_name,
                        status.as_u16(),
                        error
                    );
                }

                Err(error)
            })
            .await
    }
}
