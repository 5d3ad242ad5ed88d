use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::identifiers::{ContentId, DeviceId, GuestId, UserId};

/// Owner of a progress record: either the local guest scope or a signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SubjectKey {
    Guest(GuestId),
    User(UserId),
}

impl SubjectKey {
    pub fn is_guest(&self) -> bool {
        matches!(self, SubjectKey::Guest(_))
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            SubjectKey::User(id) => Some(id),
            SubjectKey::Guest(_) => None,
        }
    }

    /// Local storage scope holding this subject's records
    pub fn storage_scope(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKey::Guest(id) => write!(f, "guest:{}", id),
            SubjectKey::User(id) => write!(f, "user:{}", id),
        }
    }
}

impl From<SubjectKey> for String {
    fn from(key: SubjectKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for SubjectKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once(':') {
            Some(("guest", id)) if !id.is_empty() => Ok(SubjectKey::Guest(GuestId::new(id))),
            Some(("user", id)) if !id.is_empty() => Ok(SubjectKey::User(UserId::new(id))),
            _ => Err(format!("invalid subject key: {value}")),
        }
    }
}

/// Furthest-known playback position for one (subject, content) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub subject_key: SubjectKey,
    pub content_id: ContentId,
    /// Seconds into the asset at the last report
    pub position: f64,
    /// Total duration in seconds, if known at the last report
    #[serde(default)]
    pub duration_hint: Option<f64>,
    pub updated_at: DateTime<Utc>,
    pub device_id: DeviceId,
}

impl ProgressRecord {
    pub fn new(
        subject_key: SubjectKey,
        content_id: ContentId,
        position: f64,
        duration_hint: Option<f64>,
        device_id: DeviceId,
    ) -> Self {
        Self {
            subject_key,
            content_id,
            position,
            duration_hint,
            updated_at: Utc::now(),
            device_id,
        }
    }

    /// `position / duration_hint`, or `None` when the duration is unknown or not positive
    pub fn watch_ratio(&self) -> Option<f64> {
        match self.duration_hint {
            Some(duration) if duration > 0.0 && duration.is_finite() => {
                Some(self.position / duration)
            }
            _ => None,
        }
    }

    /// Decode a record from its local JSON form
    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Where playback should start for a piece of content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResumePoint {
    /// Nothing recorded, or the record could not be read
    NoRecord,
    /// Watched past the completion threshold; start over
    Completed,
    /// Resume at the stored position (seconds)
    Resume(f64),
}

impl ResumePoint {
    /// Position the player should seek to before starting
    pub fn start_position(&self) -> f64 {
        match self {
            ResumePoint::Resume(position) => *position,
            ResumePoint::NoRecord | ResumePoint::Completed => 0.0,
        }
    }

    pub fn is_resumable(&self) -> bool {
        matches!(self, ResumePoint::Resume(_))
    }
}

/// Clamp a reported position into `[0, duration]`.
///
/// Non-finite positions collapse to zero; a missing or non-positive duration
/// only enforces the lower bound.
pub fn clamp_position(position: f64, duration: Option<f64>) -> f64 {
    if !position.is_finite() {
        return 0.0;
    }
    let position = position.max(0.0);
    match duration {
        Some(duration) if duration > 0.0 && duration.is_finite() => position.min(duration),
        _ => position,
    }
}
