// Progress policy and storage constants shared across the crate

// === Resume policy ===
/// Watch ratio at or above which content counts as finished
pub const COMPLETION_RATIO: f64 = 0.95;
/// Default upper bound for the "continue watching" row
pub const CONTINUE_WATCHING_RATIO: f64 = 0.9;

// === Periodic reporting ===
pub const MIN_REPORT_INTERVAL_SECS: u64 = 5;
pub const MAX_REPORT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 10;

// === Local storage ===
/// Scope holding per-install identity entries
pub const DEVICE_SCOPE: &str = "device";
pub const DEVICE_ID_KEY: &str = "madifa.device_id";
pub const GUEST_ID_KEY: &str = "madifa.guest_id";
pub const LAST_SEEN_DEVICE_KEY: &str = "madifa.last_seen_device_id";
pub const DEFAULT_GUEST_RECORD_LIMIT: u64 = 500;

// === Remote API ===
pub const CLIENT_PRODUCT: &str = "Madifa";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
