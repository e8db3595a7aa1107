//! Watermark-based incremental re-aggregation.

use std::collections::BTreeSet;
use std::sync::Arc;

use kandle_store::CandleStore;
use kandle_types::{CandleSeries, Result, Symbol, Timeframe, Timestamp, Watermark};
use tracing::debug;

use crate::{Resampler, resample};

/// Buckets that changed since a watermark, and the advanced watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    /// Changed buckets in timestamp order.
    pub series: CandleSeries,
    /// Watermark to pass to the next call.
    pub watermark: Watermark,
    /// Number of base candles newer than the input watermark.
    pub new_base_candles: usize,
}

impl Delta {
    /// Returns true if no bucket changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Computes changed buckets without re-aggregating the full history.
///
/// The tracker holds no per-caller state: the caller keeps the watermark for
/// each (symbol, timeframe) it polls and passes it back on every call.
#[derive(Debug, Clone)]
pub struct IncrementalUpdateTracker {
    store: Arc<CandleStore>,
}

impl IncrementalUpdateTracker {
    /// Creates a tracker reading from `store`.
    #[must_use]
    pub const fn new(store: Arc<CandleStore>) -> Self {
        Self { store }
    }

    /// Returns the buckets whose base candles changed since `watermark`.
    ///
    /// A bucket is included if it holds at least one base candle newer than
    /// the watermark or if it is still provisional. The returned watermark is
    /// the store's finalized frontier, so it never passes a provisional
    /// candle: once that candle finalizes, its bucket is newer than the
    /// watermark and is reported again. The watermark is never earlier than
    /// the one passed in.
    ///
    /// # Errors
    ///
    /// Returns [`kandle_types::KandleError::UnsupportedTimeframe`] for
    /// timeframes the resampler cannot produce, and
    /// [`kandle_types::KandleError::Overflow`] if a bucket volume leaves the
    /// decimal range.
    pub fn delta(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        watermark: Watermark,
    ) -> Result<Delta> {
        // Read the watermark target before the snapshot so that everything it
        // covers is part of the snapshot.
        let next = watermark.advance(self.store.finalized_frontier(symbol));

        let Some(start) = self.scan_start(symbol, watermark) else {
            // Validates the timeframe even when there is nothing to do.
            Resampler::new(timeframe)?;
            return Ok(Delta {
                series: CandleSeries::new(timeframe),
                watermark: next,
                new_base_candles: 0,
            });
        };

        let base = self.store.range_from(symbol, timeframe.bucket_start(start));
        let mut touched = BTreeSet::new();
        let mut new_base_candles = 0;
        for candle in &base {
            let is_new = watermark.is_behind(candle.timestamp);
            if is_new {
                new_base_candles += 1;
            }
            if is_new || candle.is_provisional() {
                touched.insert(timeframe.bucket_start(candle.timestamp));
            }
        }

        let buckets = resample(&base, timeframe)?
            .into_candles()
            .into_iter()
            .filter(|bucket| touched.contains(&bucket.timestamp))
            .collect();
        let series = CandleSeries::from_candles(timeframe, buckets);

        debug!(
            %symbol,
            %timeframe,
            from = %watermark,
            to = %next,
            buckets = series.len(),
            new_base_candles,
            "delta"
        );
        Ok(Delta {
            series,
            watermark: next,
            new_base_candles,
        })
    }

    /// Earliest base timestamp that may belong to a changed bucket.
    fn scan_start(&self, symbol: &Symbol, watermark: Watermark) -> Option<Timestamp> {
        let first_new = match watermark.timestamp() {
            Some(mark) => self
                .store
                .range_from(symbol, mark)
                .iter()
                .find(|c| c.timestamp > mark)
                .map(|c| c.timestamp),
            None => self.store.snapshot(symbol).first().map(|c| c.timestamp),
        };
        let first_provisional = self.store.earliest_provisional(symbol);
        first_new.into_iter().chain(first_provisional).min()
    }
}
