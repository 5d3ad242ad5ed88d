use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContentId, DeviceId, ProgressRecord, SubjectKey};

/// Progress row as returned by `GET /progress/{contentId}` and `GET /progress?status=in-progress`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProgress {
    /// Present in list responses; single-record responses omit it
    #[serde(default)]
    pub content_id: Option<ContentId>,
    pub position: f64,
    #[serde(default)]
    pub duration_hint: Option<f64>,
    pub updated_at: DateTime<Utc>,
    pub device_id: DeviceId,
}

impl RemoteProgress {
    /// Attach the owning subject. `requested` fills in the content id when the
    /// server omitted it.
    pub fn into_record(self, subject: SubjectKey, requested: Option<&ContentId>) -> Option<ProgressRecord> {
        let content_id = self.content_id.or_else(|| requested.cloned())?;
        Some(ProgressRecord {
            subject_key: subject,
            content_id,
            position: self.position,
            duration_hint: self.duration_hint,
            updated_at: self.updated_at,
            device_id: self.device_id,
        })
    }
}

/// Body of `PUT /progress/{contentId}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub position: f64,
    pub duration_hint: Option<f64>,
    pub device_id: DeviceId,
}

impl From<&ProgressRecord> for ProgressUpdate {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            position: record.position,
            duration_hint: record.duration_hint,
            device_id: record.device_id.clone(),
        }
    }
}
