//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from Unix milliseconds, the unit the ledger's
    /// clock arguments use. Returns `None` when out of chrono's range.
    pub fn from_unix_millis(millis: u64) -> Option<Self> {
        i64::try_from(millis)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(Self)
    }

    /// Returns the timestamp as Unix milliseconds (zero before the epoch).
    pub fn as_unix_millis(&self) -> u64 {
        u64::try_from(self.0.timestamp_millis()).unwrap_or(0)
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns the duration from another timestamp to this one.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn unix_millis_survive_conversion() {
        let ts = Timestamp::from_unix_millis(1_700_000_000_123).unwrap();
        assert_eq!(ts.as_unix_millis(), 1_700_000_000_123);
    }

    #[test]
    fn from_unix_millis_rejects_out_of_range() {
        assert!(Timestamp::from_unix_millis(u64::MAX).is_none());
    }

    #[test]
    fn ordering_follows_time() {
        let early = Timestamp::from_unix_millis(1_000).unwrap();
        let late = Timestamp::from_unix_millis(2_000).unwrap();
        assert!(early.is_before(&late));
        assert_eq!(late.duration_since(&early), Duration::milliseconds(1_000));
    }
}
