// Cross-device watch-progress synchronization for the Madifa player

pub mod backends;
pub mod config;
pub mod constants;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;
pub mod workers;


pub use backends::{ProgressApi, ProgressApiError, RemoteProgressStore, RetryPolicy};
pub use config::Config;
pub use models::{ContentId, DeviceId, GuestId, ProgressRecord, ResumePoint, SubjectKey, UserId};
pub use services::{
    DeviceRegistry, IdentityProvider, ReportOutcome, ResumePolicy, SessionIdentity,
    WatchProgressSync,
};
pub use utils::SyncError;
pub use workers::{PlaybackSurface, ProgressReporter};

/// Install the global tracing subscriber. `RUST_LOG` wins over `default_filter`.
/// Calling it twice is harmless.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
