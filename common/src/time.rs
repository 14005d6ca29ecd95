//! Timing limits for cached exchange rates.

use chrono::Duration;

/// Cache timing constants.
pub mod constants {
    use super::Duration;

    /// Shortest time a fetched rate is trusted (30 minutes).
    pub fn min_cache_ttl() -> Duration {
        Duration::minutes(30)
    }

    /// Longest time a fetched rate is trusted (24 hours).
    pub fn max_cache_ttl() -> Duration {
        Duration::hours(24)
    }

    /// Default cache lifetime (1 hour).
    pub fn default_cache_ttl() -> Duration {
        Duration::hours(1)
    }
}

/// Convert a configured TTL in hours to a duration inside
/// [`constants::min_cache_ttl`], [`constants::max_cache_ttl`].
///
/// Non-finite input falls back to the default.
pub fn cache_ttl_from_hours(hours: f64) -> Duration {
    if !hours.is_finite() {
        return constants::default_cache_ttl();
    }

    let min_hours = constants::min_cache_ttl().num_minutes() as f64 / 60.0;
    let max_hours = constants::max_cache_ttl().num_minutes() as f64 / 60.0;
    let hours = hours.clamp(min_hours, max_hours);

    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}
