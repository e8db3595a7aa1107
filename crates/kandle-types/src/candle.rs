//! OHLCV candle representation.

use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::MalformedEventError;

/// Timezone-aware instant used for candle bucket starts.
pub type Timestamp = DateTime<Tz>;

/// Whether a candle's bucket is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleState {
    /// The bucket has not closed yet; later ticks may change it.
    Provisional,
    /// The bucket is closed and the candle is frozen.
    Finalized,
}

impl CandleState {
    /// Returns the state as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Provisional => "provisional",
            Self::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for CandleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OHLCV candle for a single time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candle {
    /// Bucket start in the canonical timezone.
    pub timestamp: Timestamp,
    /// Opening price (first trade in the bucket).
    pub open: Decimal,
    /// Highest price during the bucket.
    pub high: Decimal,
    /// Lowest price during the bucket.
    pub low: Decimal,
    /// Closing price (last trade in the bucket).
    pub close: Decimal,
    /// Traded base-asset volume.
    pub volume: Decimal,
    /// Provisional or finalized.
    pub state: CandleState,
}

impl Candle {
    /// Creates a new candle without validating it.
    ///
    /// Use [`Candle::validate`] before handing candles built from untrusted
    /// input to the store.
    #[must_use]
    pub const fn new(
        timestamp: Timestamp,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
        state: CandleState,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            state,
        }
    }

    /// Checks the OHLC invariants: `low <= min(open, close)`,
    /// `high >= max(open, close)` and `volume >= 0`.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), MalformedEventError> {
        if self.high < self.low {
            return Err(MalformedEventError::HighBelowLow {
                high: self.high,
                low: self.low,
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(MalformedEventError::OutsideRange {
                    field,
                    value,
                    low: self.low,
                    high: self.high,
                });
            }
        }
        if self.volume < Decimal::ZERO {
            return Err(MalformedEventError::NegativeVolume(self.volume));
        }
        Ok(())
    }

    /// Returns true if the bucket is closed.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        matches!(self.state, CandleState::Finalized)
    }

    /// Returns true if the bucket is still open.
    #[must_use]
    pub const fn is_provisional(&self) -> bool {
        matches!(self.state, CandleState::Provisional)
    }

    /// Returns true if both candles carry the same bucket and OHLCV values,
    /// regardless of their state.
    #[must_use]
    pub fn same_values(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.open == other.open
            && self.high == other.high
            && self.low == other.low
            && self.close == other.close
            && self.volume == other.volume
    }

    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Returns true if this is a bullish (green) candle.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}
