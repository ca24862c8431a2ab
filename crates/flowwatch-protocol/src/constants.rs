/// Flow records, newest first.
pub const FLOWS_PATH: &str = "/flows";
/// Currently blocked addresses.
pub const BLOCKED_PATH: &str = "/blocked";
pub const BLOCK_PATH: &str = "/api/block";
pub const UNBLOCK_PATH: &str = "/api/unblock";

/// Origin used when the base URL input is left empty.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5001";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Entries shown in the "Top N" address charts.
pub const TOP_N_LIMIT: usize = 10;
