//! Error types for kandle.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Symbol, Timeframe, TimeframeParseError, Timestamp};

/// Result type alias for kandle operations.
pub type Result<T> = std::result::Result<T, KandleError>;

/// Errors that can occur while ingesting, storing and aggregating candles.
#[derive(Error, Debug)]
pub enum KandleError {
    /// A raw tick could not be turned into a valid candle.
    #[error(transparent)]
    MalformedEvent(#[from] MalformedEventError),

    /// A finalized candle was re-delivered with different values.
    #[error("Finalized candle for {symbol} at {timestamp} cannot be changed")]
    ImmutableCandleConflict {
        /// The symbol whose history would have been rewritten.
        symbol: Symbol,
        /// Bucket start of the conflicting candle.
        timestamp: Timestamp,
    },

    /// The timeframe cannot be produced from 1-minute base candles.
    #[error("Unsupported timeframe '{0}', expected one of: 1m, 15m, 1h, 4h")]
    UnsupportedTimeframe(Timeframe),

    /// A timeframe string could not be parsed.
    #[error(transparent)]
    TimeframeParse(#[from] TimeframeParseError),

    /// A moving average window of zero periods was requested.
    #[error("Invalid moving average window: {0} (must be at least 1)")]
    InvalidWindow(usize),

    /// A sum left the representable decimal range.
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a raw kline tick is rejected during normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedEventError {
    /// A numeric field did not contain a finite decimal number.
    #[error("Field '{field}' is not numeric: {value:?}")]
    NonNumeric {
        /// Name of the offending field.
        field: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },

    /// The high price is below the low price.
    #[error("High {high} is below low {low}")]
    HighBelowLow {
        /// Reported high.
        high: Decimal,
        /// Reported low.
        low: Decimal,
    },

    /// Open or close lies outside the high/low range.
    #[error("Field '{field}' = {value} lies outside [{low}, {high}]")]
    OutsideRange {
        /// Name of the offending field.
        field: &'static str,
        /// The value outside the range.
        value: Decimal,
        /// Reported low.
        low: Decimal,
        /// Reported high.
        high: Decimal,
    },

    /// Volume is negative.
    #[error("Negative volume: {0}")]
    NegativeVolume(Decimal),

    /// The event time cannot be represented as a timestamp.
    #[error("Event time out of range: {0} ms")]
    InvalidTimestamp(i64),

    /// The stream payload could not be decoded.
    #[error("Undecodable kline payload: {0}")]
    Decode(String),
}
