pub mod device;
pub mod identity;
pub mod resume;
pub mod synchronizer;

pub use device::{DeviceRegistry, generate_install_id};
pub use identity::{IdentityProvider, SessionIdentity};
pub use resume::ResumePolicy;
pub use synchronizer::{ReportOutcome, WatchProgressSync};
