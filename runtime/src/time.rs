use std::time::{Duration, SystemTime};

/// Milliseconds since the UNIX epoch, saturating rather than panicking on clock skew.
pub fn unix_millis() -> u64 {
	SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Whether at least `timeout` has elapsed since `since` (in UNIX milliseconds).
pub fn elapsed_since(since: u64, timeout: Duration) -> bool {
	unix_millis().saturating_sub(since) >= timeout.as_millis() as u64
}
