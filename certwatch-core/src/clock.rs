//! Time source capability and the `Z`-suffixed second-precision timestamp.
//!
//! Anything that stamps a record asks a [`Clock`] for the instant, so tests
//! and reproducible builds can pin "now" with a [`FixedClock`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constants::TIMESTAMP_FORMAT;

static UTC_Z: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").expect("timestamp pattern compiles")
});

/// True when `text` is a well-formed `YYYY-MM-DDTHH:MM:SSZ` instant.
pub fn is_utc_z(text: &str) -> bool {
    UTC_Z.is_match(text) && NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).is_ok()
}

// ============================================================================
// TIMESTAMP
// ============================================================================

/// UTC instant truncated to whole seconds, rendered with a trailing `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn from_epoch_seconds(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a YYYY-MM-DDTHH:MM:SSZ timestamp")]
pub struct TimestampParseError(pub String);

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !UTC_Z.is_match(s) {
            return Err(TimestampParseError(s.to_string()));
        }
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(|naive| Self(naive.and_utc()))
            .map_err(|_| TimestampParseError(s.to_string()))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// CLOCKS
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from(Utc::now())
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    pub fn new(instant: Timestamp) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_renders_with_z_suffix() {
        let ts = Timestamp::from_epoch_seconds(1_735_689_600).unwrap();
        assert_eq!(ts.to_string(), "2025-01-01T00:00:00Z");
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2025-01-01T00:00:00Z\"");
    }

    #[test]
    fn test_subseconds_are_truncated() {
        let instant = Utc.timestamp_opt(1_735_689_600, 999_000_000).unwrap();
        assert_eq!(Timestamp::from(instant).to_string(), "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_rejects_offsets_and_fractions() {
        assert!("2025-01-01T00:00:00Z".parse::<Timestamp>().is_ok());
        assert!("2025-01-01T00:00:00+00:00".parse::<Timestamp>().is_err());
        assert!("2025-01-01T00:00:00.5Z".parse::<Timestamp>().is_err());
        assert!("2025-13-01T00:00:00Z".parse::<Timestamp>().is_err());
        assert!(!is_utc_z("2025-02-30T00:00:00Z"));
    }

    #[test]
    fn test_parse_error_names_the_input() {
        let err = "yesterday".parse::<Timestamp>().unwrap_err();
        assert_eq!(err.to_string(), "`yesterday` is not a YYYY-MM-DDTHH:MM:SSZ timestamp");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_fixed_clock() {
        let ts = Timestamp::from_epoch_seconds(42).unwrap();
        let clock = FixedClock::new(ts);
        assert_eq!(clock.now(), ts);
        assert_eq!(clock.now(), clock.now());
    }
}
