use async_trait::async_trait;
use chrono::Utc;
use madifa_progress::backends::remote::{ProgressUpdate, RemoteProgress};
use madifa_progress::{ContentId, ProgressApiError, RemoteProgressStore};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Server-side progress table for a single signed-in user
#[derive(Debug, Default)]
pub struct MockRemote {
    pub records: Mutex<HashMap<String, RemoteProgress>>,
    pub error_mode: Mutex<Option<ProgressApiError>>,
    pub calls: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject_error(&self, error: ProgressApiError) {
        *self.error_mode.lock().unwrap() = Some(error);
    }

    pub fn clear_error(&self) {
        *self.error_mode.lock().unwrap() = None;
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ProgressApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.error_mode.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteProgressStore for MockRemote {
    async fn fetch_progress(
        &self,
        _bearer_token: &str,
        content_id: &ContentId,
    ) -> Result<Option<RemoteProgress>, ProgressApiError> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(content_id.as_str())
            .cloned()
            .map(|mut record| {
                record.content_id = None;
                record
            }))
    }

    async fn save_progress(
        &self,
        _bearer_token: &str,
        content_id: &ContentId,
        update: &ProgressUpdate,
    ) -> Result<(), ProgressApiError> {
        self.check()?;
        self.records.lock().unwrap().insert(
            content_id.to_string(),
            RemoteProgress {
                content_id: Some(content_id.clone()),
                position: update.position,
                duration_hint: update.duration_hint,
                updated_at: Utc::now(),
                device_id: update.device_id.clone(),
            },
        );
        Ok(())
    }

    async fn list_in_progress(
        &self,
        _bearer_token: &str,
    ) -> Result<Vec<RemoteProgress>, ProgressApiError> {
        self.check()?;
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }
}
