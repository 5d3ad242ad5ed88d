pub mod remote;
pub mod traits;

pub use remote::{ProgressApi, ProgressApiError, RetryPolicy};
pub use traits::RemoteProgressStore;
