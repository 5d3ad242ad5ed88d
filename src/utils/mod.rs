pub mod errors;

pub use errors::SyncError;
