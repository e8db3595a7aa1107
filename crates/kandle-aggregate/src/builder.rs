//! Incremental construction of a resampled candle.

use kandle_types::{Candle, CandleState, Decimal, KandleError, Result, Timestamp};

/// Folds base candles of one bucket into a single candle.
#[derive(Debug)]
pub(crate) struct CandleBuilder {
    pub(crate) timestamp: Timestamp,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    provisional: bool,
}

impl CandleBuilder {
    /// Starts a bucket from its first base candle.
    pub(crate) const fn new(timestamp: Timestamp, first: &Candle) -> Self {
        Self {
            timestamp,
            open: first.open,
            high: first.high,
            low: first.low,
            close: first.close,
            volume: first.volume,
            provisional: first.is_provisional(),
        }
    }

    /// Adds the next base candle of the bucket.
    ///
    /// Leaves the builder untouched if the bucket volume would overflow.
    pub(crate) fn update(&mut self, candle: &Candle) -> Result<()> {
        self.volume = self
            .volume
            .checked_add(candle.volume)
            .ok_or(KandleError::Overflow("bucket volume"))?;
        self.high = self.high.max(candle.high);
        self.low = self.low.min(candle.low);
        self.close = candle.close;
        self.provisional |= candle.is_provisional();
        Ok(())
    }

    /// Finishes the bucket. Any provisional member makes it provisional.
    pub(crate) const fn finish(self) -> Candle {
        let state = if self.provisional {
            CandleState::Provisional
        } else {
            CandleState::Finalized
        };
        Candle::new(
            self.timestamp,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            state,
        )
    }
}
