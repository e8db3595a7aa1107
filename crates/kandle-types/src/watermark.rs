//! Incremental aggregation progress marker.

use serde::Serialize;

use crate::Timestamp;

/// Timestamp of the most recently consumed finalized base candle.
///
/// Callers carry one watermark per (symbol, timeframe) and hand it back on
/// every refresh. Ordering puts [`Watermark::origin`] before every instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Watermark(Option<Timestamp>);

impl Watermark {
    /// A watermark that has consumed nothing.
    #[must_use]
    pub const fn origin() -> Self {
        Self(None)
    }

    /// A watermark positioned at `timestamp`.
    #[must_use]
    pub const fn at(timestamp: Timestamp) -> Self {
        Self(Some(timestamp))
    }

    /// Returns the timestamp, or `None` for the origin.
    #[must_use]
    pub const fn timestamp(&self) -> Option<Timestamp> {
        self.0
    }

    /// Returns true if `timestamp` has not been consumed yet.
    #[must_use]
    pub fn is_behind(&self, timestamp: Timestamp) -> bool {
        self.0.is_none_or(|mark| timestamp > mark)
    }

    /// Moves the watermark forward to `timestamp`; never moves it back.
    #[must_use]
    pub fn advance(self, timestamp: Option<Timestamp>) -> Self {
        self.max(Self(timestamp))
    }
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(ts) => write!(f, "{}", ts.to_rfc3339()),
            None => f.write_str("origin"),
        }
    }
}
