use crate::constants::{COMPLETION_RATIO, CONTINUE_WATCHING_RATIO};
use crate::models::{ProgressRecord, ResumePoint};

/// Classifies records into resumable, completed or in-progress.
///
/// Completion is always derived from `position / duration_hint` at read time so
/// a corrected duration reclassifies old records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumePolicy {
    pub completion_ratio: f64,
    pub continue_watching_ratio: f64,
}

impl Default for ResumePolicy {
    fn default() -> Self {
        Self {
            completion_ratio: COMPLETION_RATIO,
            continue_watching_ratio: CONTINUE_WATCHING_RATIO,
        }
    }
}

impl ResumePolicy {
    pub fn new(completion_ratio: f64, continue_watching_ratio: f64) -> Self {
        Self {
            completion_ratio,
            continue_watching_ratio,
        }
    }

    pub fn resume_point(&self, record: Option<&ProgressRecord>) -> ResumePoint {
        let Some(record) = record else {
            return ResumePoint::NoRecord;
        };

        if !record.position.is_finite() || record.position <= 0.0 {
            return ResumePoint::NoRecord;
        }

        match record.watch_ratio() {
            Some(ratio) if ratio >= self.completion_ratio => ResumePoint::Completed,
            Some(_) => ResumePoint::Resume(record.position),
            // Unknown duration: completion cannot be judged, trust the position
            None => ResumePoint::Resume(record.position),
        }
    }

    /// Whether the record belongs in a `(low, high)` exclusive ratio window
    pub fn in_window(record: &ProgressRecord, low: f64, high: f64) -> bool {
        record
            .watch_ratio()
            .is_some_and(|ratio| ratio > low && ratio < high)
    }
}
