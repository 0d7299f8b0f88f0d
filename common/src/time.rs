//! Time utilities and cache timing constants.

use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;

/// Timing constants shared by the caches and the rate client.
pub mod constants {
    use super::Duration;

    /// Exchange rates stay cached for an hour.
    pub fn rate_cache_ttl() -> Duration {
        Duration::from_secs(3600)
    }

    /// Order and user query results stay cached for a minute.
    pub fn query_cache_ttl() -> Duration {
        Duration::from_secs(60)
    }

    /// Outbound pricing API timeout.
    pub fn exchange_rate_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

/// A timestamp (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp truncated to microseconds, the precision
/// PostgreSQL stores.
pub fn now() -> Timestamp {
    let now = Utc::now();
    let nanos = now.nanosecond() / 1_000 * 1_000;
    now.with_nanosecond(nanos).unwrap_or(now)
}
