pub mod identifiers;
pub mod progress;

pub use identifiers::{ContentId, DeviceId, GuestId, UserId};
pub use progress::{ProgressRecord, ResumePoint, SubjectKey, clamp_position};
