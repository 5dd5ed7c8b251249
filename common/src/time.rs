//! Time utilities and constants for fxgate.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Service timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate stays usable (1 hour).
    pub fn rate_freshness_window() -> Duration {
        Duration::seconds(3600)
    }

    /// Upper bound on a single upstream rate fetch (10 seconds).
    pub fn provider_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether something fetched at `fetched_at` is still inside `window` at `now`.
///
/// Entries stamped in the future (clock skew) count as fresh.
pub fn is_fresh_at(fetched_at: Timestamp, now: Timestamp, window: Duration) -> bool {
    now.signed_duration_since(fetched_at) < window
}

/// Render a timestamp the way API responses carry it: `2024-01-31T12:00:00Z`.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_as_std() {
        assert_eq!(
            constants::provider_timeout().as_std(),
            std::time::Duration::from_secs(10)
        );
        assert_eq!(Duration::seconds(-5).as_std(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_is_fresh_at() {
        let fetched = now();
        let window = constants::rate_freshness_window();

        assert!(is_fresh_at(fetched, fetched, window));
        assert!(is_fresh_at(fetched, fetched + Duration::seconds(3599), window));
        assert!(!is_fresh_at(fetched, fetched + Duration::seconds(3600), window));
        assert!(!is_fresh_at(fetched, fetched + Duration::hours(2), window));
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 5).unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-31T12:00:05Z");
    }
}
