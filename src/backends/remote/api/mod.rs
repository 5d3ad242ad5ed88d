mod client;
mod errors;
mod progress;
mod retry;
mod types;

pub use client::{ProgressApi, create_standard_headers};
pub use errors::ProgressApiError;
pub use retry::RetryPolicy;
pub use types::{ProgressUpdate, RemoteProgress};
