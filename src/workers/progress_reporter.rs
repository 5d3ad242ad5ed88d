use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::{ContentId, SubjectKey, clamp_position};
use crate::services::{ReportOutcome, WatchProgressSync};

/// Read side of whatever is playing the content
pub trait PlaybackSurface: Send + Sync {
    /// Current playhead in seconds, `None` while nothing is loaded
    fn current_time(&self) -> Option<f64>;

    /// Total length in seconds, `None` until known
    fn duration(&self) -> Option<f64>;
}

struct ReportSession {
    sync: Arc<WatchProgressSync>,
    surface: Arc<dyn PlaybackSurface>,
    subject: SubjectKey,
    content_id: ContentId,
    last_position: Mutex<Option<f64>>,
    reports_sent: AtomicUsize,
}

impl ReportSession {
    async fn report(&self, force: bool) -> Option<ReportOutcome> {
        let current = self.surface.current_time()?;
        let duration = self
            .surface
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0);
        let position = clamp_position(current, duration);

        let mut last = self.last_position.lock().await;
        if !force && *last == Some(position) {
            return None;
        }

        let device_id = self.sync.device_id().await;
        let outcome = self
            .sync
            .report_progress(&self.subject, &self.content_id, position, duration, &device_id)
            .await;

        *last = Some(position);
        self.reports_sent.fetch_add(1, Ordering::SeqCst);
        Some(outcome)
    }
}

/// Periodically pushes the playhead of one playback session to the synchronizer.
///
/// Unchanged positions (paused playback) are not re-sent. `stop` sends a final
/// report; dropping the reporter just cancels the loop.
pub struct ProgressReporter {
    session: Arc<ReportSession>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    pub fn start(
        sync: Arc<WatchProgressSync>,
        surface: Arc<dyn PlaybackSurface>,
        subject: SubjectKey,
        content_id: ContentId,
        interval: Duration,
    ) -> Self {
        let session = Arc::new(ReportSession {
            sync,
            surface,
            subject,
            content_id,
            last_position: Mutex::new(None),
            reports_sent: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();

        info!(
            "Reporting progress of {} every {:?}",
            session.content_id, interval
        );

        let task_session = session.clone();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        task_session.report(false).await;
                    }
                }
            }
            debug!("Progress reporter for {} stopped", task_session.content_id);
        });

        Self {
            session,
            cancel,
            handle: Some(handle),
        }
    }

    /// Number of reports handed to the synchronizer so far
    pub fn reports_sent(&self) -> usize {
        self.session.reports_sent.load(Ordering::SeqCst)
    }

    /// Stop the loop and send one last report of the current position
    pub async fn stop(mut self) -> Option<ReportOutcome> {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
        }
        self.session.report(true).await
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
