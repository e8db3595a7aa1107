//! Raw kline to candle normalization.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use kandle_types::{Candle, CandleState, MalformedEventError, RawKline, Timeframe, Timestamp};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Converts raw kline ticks into validated candles in a canonical timezone.
///
/// The conversion is pure: the same raw tick always yields the same candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventNormalizer {
    timezone: Tz,
}

impl EventNormalizer {
    /// Creates a normalizer that emits timestamps in `timezone`.
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Returns the canonical timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Normalizes a raw kline into a candle.
    ///
    /// The event time is floored to its 1-minute bucket. Closed klines
    /// become [`CandleState::Finalized`] candles, open ones
    /// [`CandleState::Provisional`].
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field is not a decimal number, the OHLC
    /// values are inconsistent, the volume is negative, or the event time
    /// cannot be represented.
    pub fn normalize(&self, raw: &RawKline) -> Result<Candle, MalformedEventError> {
        let timestamp = self.timestamp(raw.event_time)?;
        let state = if raw.is_closed {
            CandleState::Finalized
        } else {
            CandleState::Provisional
        };

        let candle = Candle::new(
            timestamp,
            parse_decimal("open", &raw.open)?,
            parse_decimal("high", &raw.high)?,
            parse_decimal("low", &raw.low)?,
            parse_decimal("close", &raw.close)?,
            parse_decimal("volume", &raw.volume)?,
            state,
        );
        candle.validate()?;
        Ok(candle)
    }

    /// Converts epoch milliseconds into the start of the enclosing base
    /// bucket in the canonical timezone.
    fn timestamp(&self, event_time: i64) -> Result<Timestamp, MalformedEventError> {
        let bucket = event_time - event_time.rem_euclid(Timeframe::BASE.milliseconds());
        DateTime::<Utc>::from_timestamp_millis(bucket)
            .map(|utc| utc.with_timezone(&self.timezone))
            .ok_or(MalformedEventError::InvalidTimestamp(event_time))
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

/// Parses a decimal field, accepting plain and scientific notation.
fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, MalformedEventError> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| MalformedEventError::NonNumeric {
            field,
            value: value.to_string(),
        })
}
