use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::device::DeviceRegistry;
use super::identity::IdentityProvider;
use super::resume::ResumePolicy;
use crate::backends::remote::{ProgressUpdate, RetryPolicy};
use crate::backends::{ProgressApi, ProgressApiError, RemoteProgressStore};
use crate::config::Config;
use crate::db::Database;
use crate::db::repository::{LocalEntryRepository, LocalEntryRepositoryImpl};
use crate::models::{ContentId, DeviceId, ProgressRecord, ResumePoint, SubjectKey};
use crate::utils::SyncError;

/// Where a progress write ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Accepted by the remote store (the local mirror is best-effort)
    Remote,
    /// Stored locally only: guest subject, no session, or remote unavailable
    LocalOnly,
    /// Nothing could be stored
    Failed,
}

impl ReportOutcome {
    pub fn is_stored(&self) -> bool {
        !matches!(self, ReportOutcome::Failed)
    }
}

enum Route {
    Local,
    Remote {
        store: Arc<dyn RemoteProgressStore>,
        token: String,
    },
}

/// Keeps the furthest-known playback position per (subject, content) pair and
/// answers resume and device-change questions.
///
/// Guests are served from local storage only. Signed-in users go to the remote
/// store first, with a local mirror used when the remote cannot be reached.
/// None of the public operations return errors: failures are logged and
/// degrade to "no resume data".
#[derive(Debug)]
pub struct WatchProgressSync {
    local: Arc<dyn LocalEntryRepository>,
    remote: Option<Arc<dyn RemoteProgressStore>>,
    identity: Arc<dyn IdentityProvider>,
    devices: DeviceRegistry,
    policy: ResumePolicy,
    guest_record_limit: Option<u64>,
    /// Bearer token last rejected by the remote store
    rejected_token: Mutex<Option<String>>,
}

impl WatchProgressSync {
    pub fn new(local: Arc<dyn LocalEntryRepository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            devices: DeviceRegistry::new(local.clone()),
            local,
            remote: None,
            identity,
            policy: ResumePolicy::default(),
            guest_record_limit: None,
            rejected_token: Mutex::new(None),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteProgressStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_policy(mut self, policy: ResumePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_guest_record_limit(mut self, limit: Option<u64>) -> Self {
        self.guest_record_limit = limit;
        self
    }

    /// Open the local store, migrate it, and attach the remote API when configured
    pub async fn from_config(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        config.validate()?;

        let db_path = match &config.storage.database_path {
            Some(path) => path.clone(),
            None => Database::default_path()?,
        };
        let db = Database::open(&db_path).await?;
        let local: Arc<dyn LocalEntryRepository> =
            Arc::new(LocalEntryRepositoryImpl::new(db.get_connection()));

        let mut sync = Self::new(local, identity)
            .with_policy(ResumePolicy::new(
                config.playback.completion_ratio,
                config.playback.continue_watching_ratio,
            ))
            .with_guest_record_limit(config.storage.guest_limit());

        match &config.remote.base_url {
            Some(base_url) => {
                let retry_policy = RetryPolicy {
                    max_attempts: config.remote.max_retries,
                    ..Default::default()
                }
                .with_total_timeout(config.remote.total_timeout());
                let api = ProgressApi::with_retry_policy(
                    base_url.clone(),
                    config.remote.request_timeout(),
                    retry_policy,
                )?;
                info!("Remote progress store at {}", api.base_url());
                sync = sync.with_remote(Arc::new(api));
            }
            None => info!("No remote progress store configured, progress stays local"),
        }

        Ok(sync)
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn policy(&self) -> &ResumePolicy {
        &self.policy
    }

    pub async fn device_id(&self) -> DeviceId {
        self.devices.device_id().await
    }

    /// Subject for the current actor according to the identity provider
    pub async fn current_subject(&self) -> SubjectKey {
        match self.identity.current_subject_key() {
            Some(user_id) => SubjectKey::User(user_id),
            None => SubjectKey::Guest(self.devices.guest_id().await),
        }
    }

    /// Upsert progress for (subject, content). Fire-and-forget: failures are
    /// logged and reflected only in the returned outcome.
    pub async fn report_progress(
        &self,
        subject: &SubjectKey,
        content_id: &ContentId,
        position: f64,
        duration_hint: Option<f64>,
        device_id: &DeviceId,
    ) -> ReportOutcome {
        let record = ProgressRecord::new(
            subject.clone(),
            content_id.clone(),
            position,
            duration_hint,
            device_id.clone(),
        );

        let remote_saved = match self.route_for(subject).await {
            Route::Local => false,
            Route::Remote { store, token } => {
                let update = ProgressUpdate::from(&record);
                match store.save_progress(&token, content_id, &update).await {
                    Ok(()) => true,
                    Err(e) => {
                        self.note_remote_failure(&token, &e).await;
                        warn!(
                            "Remote progress write for {} failed, keeping local copy: {}",
                            content_id, e
                        );
                        false
                    }
                }
            }
        };

        let local_saved = match self.write_local(&record).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Local progress write for {} failed: {}", content_id, e);
                false
            }
        };

        if local_saved && subject.is_guest() {
            self.enforce_guest_limit(subject).await;
        }

        let outcome = match (remote_saved, local_saved) {
            (true, _) => ReportOutcome::Remote,
            (false, true) => ReportOutcome::LocalOnly,
            (false, false) => ReportOutcome::Failed,
        };

        if outcome.is_stored() {
            self.devices.remember_last_seen(device_id).await;
        } else {
            error!("Progress for {} at {:.1}s was not stored", content_id, position);
        }

        debug!(
            "Reported {:.1}s of {} for {} ({:?})",
            position, content_id, subject, outcome
        );
        outcome
    }

    /// Where playback of `content_id` should start. Read-only.
    pub async fn get_resume_position(
        &self,
        subject: &SubjectKey,
        content_id: &ContentId,
    ) -> ResumePoint {
        let record = self.lookup(subject, content_id).await;
        self.policy.resume_point(record.as_ref())
    }

    /// True when a record exists and was last written by another device
    pub async fn is_different_device_than_last_write(
        &self,
        subject: &SubjectKey,
        content_id: &ContentId,
        current_device_id: &DeviceId,
    ) -> bool {
        self.lookup(subject, content_id)
            .await
            .is_some_and(|record| &record.device_id != current_device_id)
    }

    /// Cheap "new device?" hint from the local cache, no remote round trip
    pub async fn last_seen_device_differs(&self, current_device_id: &DeviceId) -> bool {
        self.devices.last_seen_differs(current_device_id).await
    }

    /// Records with `threshold_low < ratio < threshold_high`, newest first
    pub async fn list_in_progress(
        &self,
        subject: &SubjectKey,
        threshold_low: f64,
        threshold_high: f64,
    ) -> Vec<ProgressRecord> {
        let records = match self.route_for(subject).await {
            Route::Remote { store, token } => match store.list_in_progress(&token).await {
                Ok(items) => {
                    let records: Vec<ProgressRecord> = items
                        .into_iter()
                        .filter_map(|item| item.into_record(subject.clone(), None))
                        .collect();
                    if let Some(newest) = records.iter().max_by_key(|r| r.updated_at) {
                        self.devices.remember_last_seen(&newest.device_id).await;
                    }
                    records
                }
                Err(e) => {
                    self.note_remote_failure(&token, &e).await;
                    warn!("Remote continue-watching list failed, using local mirror: {}", e);
                    self.list_local_or_empty(subject).await
                }
            },
            Route::Local => self.list_local_or_empty(subject).await,
        };

        Self::select_window(records, threshold_low, threshold_high)
    }

    /// `list_in_progress` with the default "continue watching" window
    pub async fn continue_watching(&self, subject: &SubjectKey) -> Vec<ProgressRecord> {
        self.list_in_progress(subject, 0.0, self.policy.continue_watching_ratio)
            .await
    }

    fn select_window(records: Vec<ProgressRecord>, low: f64, high: f64) -> Vec<ProgressRecord> {
        let mut records: Vec<_> = records
            .into_iter()
            .filter(|record| ResumePolicy::in_window(record, low, high))
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records
    }

    async fn route_for(&self, subject: &SubjectKey) -> Route {
        let SubjectKey::User(user_id) = subject else {
            return Route::Local;
        };
        let Some(store) = &self.remote else {
            return Route::Local;
        };
        if self.identity.current_subject_key().as_ref() != Some(user_id) {
            debug!("{} is not the signed-in user, serving locally", subject);
            return Route::Local;
        }
        let Some(token) = self.identity.bearer_token() else {
            return Route::Local;
        };

        let mut rejected = self.rejected_token.lock().await;
        match rejected.as_deref() {
            Some(stale) if stale == token => return Route::Local,
            Some(_) => {
                info!("New credentials for {}, resuming remote progress sync", subject);
                *rejected = None;
            }
            None => {}
        }

        Route::Remote {
            store: store.clone(),
            token,
        }
    }

    async fn note_remote_failure(&self, token: &str, error: &ProgressApiError) {
        if error.is_auth_failure() {
            self.reject_token(token).await;
        }
    }

    async fn reject_token(&self, token: &str) {
        warn!("Progress API rejected the session token, falling back to local storage");
        *self.rejected_token.lock().await = Some(token.to_string());
    }

    /// Find the current record, remote first for signed-in users
    async fn lookup(&self, subject: &SubjectKey, content_id: &ContentId) -> Option<ProgressRecord> {
        if let Route::Remote { store, token } = self.route_for(subject).await {
            match store.fetch_progress(&token, content_id).await {
                Ok(found) => {
                    let record =
                        found.and_then(|item| item.into_record(subject.clone(), Some(content_id)));
                    if let Some(record) = &record {
                        self.devices.remember_last_seen(&record.device_id).await;
                    }
                    return record;
                }
                Err(e) => {
                    let error = SyncError::from(e);
                    if error.is_malformed() {
                        warn!("Unreadable remote progress for {}: {}", content_id, error);
                        return None;
                    }
                    if error.is_auth_loss() {
                        self.reject_token(&token).await;
                    }
                    warn!(
                        "Remote progress lookup for {} failed, using local mirror: {}",
                        content_id, error
                    );
                }
            }
        }

        match self.read_local(subject, content_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Local progress for {} unavailable: {}", content_id, e);
                None
            }
        }
    }

    async fn read_local(
        &self,
        subject: &SubjectKey,
        content_id: &ContentId,
    ) -> Result<Option<ProgressRecord>, SyncError> {
        let entry = self
            .local
            .get(&subject.storage_scope(), content_id.as_str())
            .await
            .map_err(SyncError::local)?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        let record = ProgressRecord::from_json(&entry.value).map_err(|source| {
            SyncError::MalformedRecord {
                content_id: content_id.to_string(),
                source,
            }
        })?;

        if &record.subject_key != subject || &record.content_id != content_id {
            warn!(
                "Local entry {} in scope {} belongs to {}/{}, ignoring",
                content_id, subject, record.subject_key, record.content_id
            );
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn write_local(&self, record: &ProgressRecord) -> Result<(), SyncError> {
        let value = record
            .to_json()
            .map_err(|source| SyncError::MalformedRecord {
                content_id: record.content_id.to_string(),
                source,
            })?;

        self.local
            .put(
                &record.subject_key.storage_scope(),
                record.content_id.as_str(),
                &value,
                record.updated_at.naive_utc(),
            )
            .await
            .map_err(SyncError::local)
    }

    async fn list_local_or_empty(&self, subject: &SubjectKey) -> Vec<ProgressRecord> {
        let entries = match self.local.list_scope(&subject.storage_scope()).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Local progress for {} unavailable: {}", subject, SyncError::local(e));
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match ProgressRecord::from_json(&entry.value) {
                Ok(record) if &record.subject_key == subject => Some(record),
                Ok(_) => None,
                Err(e) => {
                    debug!("Skipping malformed local entry {}: {}", entry.entry_key, e);
                    None
                }
            })
            .collect()
    }

    async fn enforce_guest_limit(&self, subject: &SubjectKey) {
        let Some(limit) = self.guest_record_limit else {
            return;
        };
        match self.local.evict_oldest(&subject.storage_scope(), limit).await {
            Ok(0) => {}
            Ok(removed) => debug!("Evicted {} old guest progress records", removed),
            Err(e) => debug!("Guest eviction skipped: {:#}", e),
        }
    }
}
