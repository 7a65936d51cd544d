//! Time helpers
//!
//! Persisted state uses integer Unix timestamps (seconds). Core operations
//! never read the clock themselves; callers capture `now_unix()` once per
//! request and pass it down.

use chrono::{DateTime, Utc};

/// Current time as a Unix timestamp in seconds
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Format a Unix timestamp for display
///
/// Returns an empty string for zero/negative timestamps (unset fields).
pub fn format_unix(ts: i64) -> String {
    if ts <= 0 {
        return String::new();
    }
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_known_timestamp() {
        // 2021-01-01 00:00:00 UTC
        assert_eq!(format_unix(1609459200), "2021-01-01 00:00");
    }

    #[test]
    fn test_format_unset() {
        assert_eq!(format_unix(0), "");
        assert_eq!(format_unix(-5), "");
    }

    #[test]
    fn test_now_is_plausible() {
        // After 2020-01-01
        assert!(now_unix() > 1577836800);
    }
}
