/// Background tasks driven by playback
pub mod progress_reporter;

pub use progress_reporter::{PlaybackSurface, ProgressReporter};
