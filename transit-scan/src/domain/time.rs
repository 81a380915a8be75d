//! Timestamps for connections and journeys.
//!
//! Times are whole seconds since the Unix epoch. The value `0` is reserved
//! to mean "unset" and is never a valid departure time.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Error returned when a time cannot be represented as a [`Timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds since the Unix epoch, in UTC.
///
/// # Examples
///
/// ```
/// use transit_scan::domain::Timestamp;
///
/// let t = Timestamp::parse_utc("2024-03-15 16:20").unwrap();
/// assert_eq!(t.to_string(), "2024-03-15 16:20:00");
/// assert_eq!((t + 600).to_string(), "2024-03-15 16:30:00");
/// ```
///
/// The default is [`Timestamp::UNSET`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The "unset" value.
    pub const UNSET: Self = Self(0);

    /// Later than any real time. Used for stops that were never reached.
    pub const MAX: Self = Self(u64::MAX);

    /// Create a timestamp from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch.
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns true unless this is [`Timestamp::UNSET`].
    pub fn is_set(&self) -> bool {
        self.0 != 0
    }

    /// Convert from a chrono UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self, TimeError> {
        u64::try_from(dt.timestamp())
            .map(Self)
            .map_err(|_| TimeError::new("before the Unix epoch"))
    }

    /// Parse `YYYY-MM-DD HH:MM` or `YYYY-MM-DD HH:MM:SS`, read as UTC.
    pub fn parse_utc(s: &str) -> Result<Self, TimeError> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
            .map_err(|_| TimeError::new("expected YYYY-MM-DD HH:MM[:SS]"))?;
        Self::from_datetime(naive.and_utc())
    }

    /// Convert to a chrono UTC datetime, if it is in chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Add seconds, returning `None` on overflow.
    pub fn checked_add(&self, secs: u64) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Subtract seconds, returning `None` if the result would underflow.
    pub fn checked_sub(&self, secs: u64) -> Option<Self> {
        self.0.checked_sub(secs).map(Self)
    }

    /// Subtract seconds, clamping at [`Timestamp::UNSET`].
    pub fn saturating_sub(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Absolute number of seconds between two timestamps.
    pub fn abs_diff(&self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Signed duration from `other` to `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        let secs = if self.0 >= other.0 {
            i64::try_from(self.0 - other.0).unwrap_or(i64::MAX)
        } else {
            -i64::try_from(other.0 - self.0).unwrap_or(i64::MAX)
        };
        Duration::seconds(secs)
    }
}

impl Add<u64> for Timestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub<u64> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) if *self != Self::MAX => {
                write!(f, "Timestamp({})", dt.format("%Y-%m-%d %H:%M:%S"))
            }
            _ => write!(f, "Timestamp({})", self.0),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_minutes_and_seconds() {
        let a = Timestamp::parse_utc("2024-03-15 16:20").unwrap();
        let b = Timestamp::parse_utc("2024-03-15 16:20:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.as_secs(),
            Utc.with_ymd_and_hms(2024, 3, 15, 16, 20, 0).unwrap().timestamp() as u64
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse_utc("16:20").is_err());
        assert!(Timestamp::parse_utc("2024-13-01 00:00").is_err());
        assert!(Timestamp::parse_utc("1960-01-01 00:00").is_err());
    }

    #[test]
    fn unset_is_zero() {
        assert!(!Timestamp::UNSET.is_set());
        assert!(Timestamp::from_secs(1).is_set());
        assert_eq!(Timestamp::default(), Timestamp::UNSET);
    }

    #[test]
    fn arithmetic() {
        let t = Timestamp::from_secs(1_000);
        assert_eq!(t + 30, Timestamp::from_secs(1_030));
        assert_eq!(t - 30, Timestamp::from_secs(970));
        assert_eq!(t - 5_000, Timestamp::UNSET);
        assert_eq!(Timestamp::MAX + 1, Timestamp::MAX);
        assert_eq!(t.checked_sub(2_000), None);
        assert_eq!(t.abs_diff(Timestamp::from_secs(400)), 600);
    }

    #[test]
    fn signed_duration() {
        let a = Timestamp::from_secs(1_000);
        let b = Timestamp::from_secs(1_600);
        assert_eq!(b.signed_duration_since(a), Duration::minutes(10));
        assert_eq!(a.signed_duration_since(b), Duration::minutes(-10));
    }

    #[test]
    fn display_and_debug() {
        let t = Timestamp::parse_utc("2024-03-15 09:05").unwrap();
        assert_eq!(t.to_string(), "2024-03-15 09:05:00");
        assert_eq!(format!("{t:?}"), "Timestamp(2024-03-15 09:05:00)");
        assert_eq!(
            format!("{:?}", Timestamp::MAX),
            format!("Timestamp({})", u64::MAX)
        );
    }
}
