//! Time utilities for todokeep.
//!
//! Token timestamps are Unix epoch seconds (i64), matching the JWT
//! `iat` / `exp` registered claims.

/// Return the current time as whole seconds since Unix epoch.
///
/// A clock set before the epoch reads as 0 rather than panicking.
pub fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
