//! Candle aggregation timeframe definitions.

use chrono::TimeDelta;
use chrono_tz::OffsetComponents;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Timestamp;

/// Candle aggregation timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    /// 1-minute candles (base resolution).
    #[default]
    #[serde(rename = "1m")]
    Minute1,
    /// 5-minute candles.
    #[serde(rename = "5m")]
    Minute5,
    /// 15-minute candles.
    #[serde(rename = "15m")]
    Minute15,
    /// 30-minute candles.
    #[serde(rename = "30m")]
    Minute30,
    /// 1-hour candles.
    #[serde(rename = "1h")]
    Hour1,
    /// 4-hour candles.
    #[serde(rename = "4h")]
    Hour4,
    /// Daily candles.
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    /// Resolution of the candles held by the store.
    pub const BASE: Self = Self::Minute1;

    /// Returns the duration in seconds.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        match self {
            Self::Minute1 => 60,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1800,
            Self::Hour1 => 3600,
            Self::Hour4 => 14400,
            Self::Day1 => 86400,
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub const fn milliseconds(&self) -> i64 {
        self.seconds() * 1000
    }

    /// Returns the bucket width as a [`TimeDelta`].
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.milliseconds())
    }

    /// Returns true if the resampler can produce this timeframe.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::Minute1 | Self::Minute15 | Self::Hour1 | Self::Hour4
        )
    }

    /// Returns the timeframe as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1d",
        }
    }

    /// Returns all known timeframes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Hour4,
            Self::Day1,
        ]
    }

    /// Returns the timeframes the resampler can produce.
    #[must_use]
    pub const fn supported() -> &'static [Self] {
        &[Self::Minute1, Self::Minute15, Self::Hour1, Self::Hour4]
    }

    /// Returns the start of the bucket containing `timestamp`.
    ///
    /// Buckets are aligned to the Unix epoch expressed in the zone's standard
    /// (non-DST) offset, so boundaries do not depend on which candles were
    /// seen first. In UTC+7 a 4h bucket starts at local 00:00, 04:00, ...
    #[must_use]
    pub fn bucket_start(&self, timestamp: Timestamp) -> Timestamp {
        let width = self.milliseconds();
        let offset = timestamp.offset().base_utc_offset().num_milliseconds();
        let local = timestamp.timestamp_millis() + offset;
        timestamp - TimeDelta::milliseconds(local.rem_euclid(width))
    }

    /// Returns the exclusive end of the bucket containing `timestamp`.
    #[must_use]
    pub fn bucket_end(&self, timestamp: Timestamp) -> Timestamp {
        self.bucket_start(timestamp) + self.duration()
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "m1" | "1min" | "minute" => Ok(Self::Minute1),
            "5m" | "m5" | "5min" => Ok(Self::Minute5),
            "15m" | "m15" | "15min" => Ok(Self::Minute15),
            "30m" | "m30" | "30min" => Ok(Self::Minute30),
            "1h" | "h1" | "hour" => Ok(Self::Hour1),
            "4h" | "h4" => Ok(Self::Hour4),
            "1d" | "d1" | "day" | "daily" => Ok(Self::Day1),
            _ => Err(TimeframeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid timeframe string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeParseError(String);

impl std::fmt::Display for TimeframeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid timeframe '{}', expected one of: 1m, 5m, 15m, 30m, 1h, 4h, 1d",
            self.0
        )
    }
}

impl std::error::Error for TimeframeParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use chrono_tz::{Asia::Ho_Chi_Minh, Tz};

    #[test]
    fn test_timeframe_seconds() {
        assert_eq!(Timeframe::Minute1.seconds(), 60);
        assert_eq!(Timeframe::Minute15.seconds(), 900);
        assert_eq!(Timeframe::Hour4.seconds(), 14400);
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("1m".parse::<Timeframe>().unwrap(), Timeframe::Minute1);
        assert_eq!("15Min".parse::<Timeframe>().unwrap(), Timeframe::Minute15);
        assert_eq!("1H".parse::<Timeframe>().unwrap(), Timeframe::Hour1);
        assert_eq!("h4".parse::<Timeframe>().unwrap(), Timeframe::Hour4);
        assert!("2w".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_supported_set() {
        let supported: Vec<_> = Timeframe::all()
            .iter()
            .filter(|tf| tf.is_supported())
            .copied()
            .collect();
        assert_eq!(supported, Timeframe::supported());
    }

    #[test]
    fn test_bucket_start_utc() {
        let ts = Tz::UTC.with_ymd_and_hms(2024, 1, 15, 14, 37, 45).unwrap();
        assert_eq!(Timeframe::Minute15.bucket_start(ts).minute(), 30);
        assert_eq!(Timeframe::Hour4.bucket_start(ts).hour(), 12);
        assert_eq!(Timeframe::Minute1.bucket_start(ts).second(), 0);
    }

    #[test]
    fn test_bucket_start_follows_local_standard_time() {
        let ts = Ho_Chi_Minh.with_ymd_and_hms(2024, 1, 15, 6, 59, 0).unwrap();
        let start = Timeframe::Hour4.bucket_start(ts);
        assert_eq!(start, Ho_Chi_Minh.with_ymd_and_hms(2024, 1, 15, 4, 0, 0).unwrap());
        assert_eq!(
            Timeframe::Hour4.bucket_end(ts),
            Ho_Chi_Minh.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bucket_start_is_stable() {
        let ts = Tz::UTC.with_ymd_and_hms(2024, 1, 15, 14, 37, 45).unwrap();
        let start = Timeframe::Hour1.bucket_start(ts);
        assert_eq!(Timeframe::Hour1.bucket_start(start), start);
    }
}
