//! Streaming base-candle resampling.

use kandle_store::CandleRange;
use kandle_types::{Candle, CandleSeries, KandleError, Result, Timeframe};

use crate::builder::CandleBuilder;

/// Streaming resampler.
///
/// Folds time-ordered base candles into buckets of the configured timeframe.
/// Bucket boundaries come from [`Timeframe::bucket_start`], so they do not
/// depend on where the input starts.
#[derive(Debug)]
pub struct Resampler {
    timeframe: Timeframe,
    current: Option<CandleBuilder>,
}

impl Resampler {
    /// Creates a resampler for the given timeframe.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::UnsupportedTimeframe`] for timeframes other than
    /// 1m, 15m, 1h and 4h.
    pub fn new(timeframe: Timeframe) -> Result<Self> {
        if !timeframe.is_supported() {
            return Err(KandleError::UnsupportedTimeframe(timeframe));
        }
        Ok(Self {
            timeframe,
            current: None,
        })
    }

    /// Returns the timeframe being resampled to.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Processes the next base candle, potentially emitting a completed bucket.
    ///
    /// Candles must arrive in timestamp order. Returns `Some(candle)` when
    /// this candle starts a new bucket, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::Overflow`] if the bucket volume leaves the
    /// decimal range.
    pub fn process(&mut self, candle: &Candle) -> Result<Option<Candle>> {
        let bucket = self.timeframe.bucket_start(candle.timestamp);

        match self.current.take() {
            Some(mut builder) if builder.timestamp == bucket => {
                let updated = builder.update(candle);
                self.current = Some(builder);
                updated.map(|()| None)
            }
            Some(builder) => {
                self.current = Some(CandleBuilder::new(bucket, candle));
                Ok(Some(builder.finish()))
            }
            None => {
                self.current = Some(CandleBuilder::new(bucket, candle));
                Ok(None)
            }
        }
    }

    /// Finishes resampling, returning the trailing (possibly partial) bucket.
    #[must_use]
    pub fn finish(self) -> Option<Candle> {
        self.current.map(CandleBuilder::finish)
    }
}

/// Resamples a store view of 1-minute base candles into `timeframe` buckets.
///
/// Buckets without base candles are omitted.
///
/// # Errors
///
/// Returns [`KandleError::UnsupportedTimeframe`] for timeframes other than
/// 1m, 15m, 1h and 4h, and [`KandleError::Overflow`] if a bucket volume
/// leaves the decimal range.
pub fn resample(base: &CandleRange, timeframe: Timeframe) -> Result<CandleSeries> {
    fold(base, timeframe)
}

/// Resamples a series into a coarser timeframe.
///
/// # Errors
///
/// Returns [`KandleError::UnsupportedTimeframe`] if the target is not a
/// supported timeframe or is not a whole multiple of the series' own
/// timeframe, and [`KandleError::Overflow`] if a bucket volume leaves the
/// decimal range.
pub fn resample_series(series: &CandleSeries, timeframe: Timeframe) -> Result<CandleSeries> {
    let source = series.timeframe().seconds();
    if timeframe.seconds() < source || timeframe.seconds() % source != 0 {
        return Err(KandleError::UnsupportedTimeframe(timeframe));
    }
    fold(series, timeframe)
}

fn fold<'a, I>(candles: I, timeframe: Timeframe) -> Result<CandleSeries>
where
    I: IntoIterator<Item = &'a Candle>,
{
    let mut resampler = Resampler::new(timeframe)?;
    let mut buckets = Vec::new();

    for candle in candles {
        if let Some(bucket) = resampler.process(candle)? {
            buckets.push(bucket);
        }
    }
    if let Some(bucket) = resampler.finish() {
        buckets.push(bucket);
    }

    Ok(CandleSeries::from_candles(timeframe, buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Timelike};
    use kandle_store::CandleStore;
    use kandle_types::{CandleState, Decimal, Symbol, Timestamp, Tz};

    fn minute(m: i64) -> Timestamp {
        Tz::UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(m)
    }

    fn base(m: i64, close: i64, state: CandleState) -> Candle {
        let price = Decimal::from(close);
        Candle::new(minute(m), price, price, price, price, Decimal::ONE, state)
    }

    fn series(candles: Vec<Candle>) -> CandleSeries {
        CandleSeries::from_candles(Timeframe::Minute1, candles)
    }

    #[test]
    fn test_fifteen_minute_bucket() {
        let input = series(
            (0..15)
                .map(|m| base(m, 100 + m, CandleState::Finalized))
                .collect(),
        );
        let out = resample_series(&input, Timeframe::Minute15).unwrap();

        assert_eq!(out.len(), 1);
        let bucket = out.candles()[0];
        assert_eq!(bucket.timestamp, minute(0));
        assert_eq!(bucket.open, Decimal::from(100));
        assert_eq!(bucket.close, Decimal::from(114));
        assert_eq!(bucket.high, Decimal::from(114));
        assert_eq!(bucket.low, Decimal::from(100));
        assert_eq!(bucket.volume, Decimal::from(15));
        assert!(bucket.is_finalized());
    }

    #[test]
    fn test_buckets_align_to_epoch_not_first_candle() {
        let input = series(
            (7..37)
                .map(|m| base(m, 100, CandleState::Finalized))
                .collect(),
        );
        let out = resample_series(&input, Timeframe::Minute15).unwrap();

        let starts: Vec<_> = out.iter().map(|c| c.timestamp.minute()).collect();
        assert_eq!(starts, vec![0, 15, 30]);
        let volumes: Vec<_> = out.iter().map(|c| c.volume).collect();
        assert_eq!(
            volumes,
            vec![Decimal::from(8), Decimal::from(15), Decimal::from(7)]
        );
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        let input = series(vec![
            base(0, 100, CandleState::Finalized),
            base(95, 101, CandleState::Finalized),
        ]);
        let out = resample_series(&input, Timeframe::Minute15).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.candles()[1].timestamp, minute(90));
    }

    #[test]
    fn test_trailing_provisional_bucket() {
        let input = series(vec![
            base(0, 100, CandleState::Finalized),
            base(1, 101, CandleState::Finalized),
            base(15, 102, CandleState::Provisional),
        ]);
        let out = resample_series(&input, Timeframe::Minute15).unwrap();
        assert!(out.candles()[0].is_finalized());
        assert!(out.candles()[1].is_provisional());
    }

    #[test]
    fn test_resample_is_idempotent() {
        let input = series(
            (0..300)
                .map(|m| base(m, 100 + (m % 17), CandleState::Finalized))
                .collect(),
        );
        let first = resample_series(&input, Timeframe::Hour1).unwrap();
        let second = resample_series(&input, Timeframe::Hour1).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);

        let total: Decimal = first.iter().map(|c| c.volume).sum();
        assert_eq!(total, Decimal::from(300));
    }

    #[test]
    fn test_one_minute_is_identity() {
        let input = series(
            (0..5)
                .map(|m| base(m, 100 + m, CandleState::Finalized))
                .collect(),
        );
        let out = resample_series(&input, Timeframe::Minute1).unwrap();
        assert_eq!(out.candles(), input.candles());
    }

    #[test]
    fn test_unsupported_timeframe() {
        let input = series(vec![base(0, 100, CandleState::Finalized)]);
        let err = resample_series(&input, Timeframe::Minute5).unwrap_err();
        assert!(matches!(
            err,
            KandleError::UnsupportedTimeframe(Timeframe::Minute5)
        ));
        assert!(Resampler::new(Timeframe::Day1).is_err());
    }

    #[test]
    fn test_cannot_resample_to_finer_timeframe() {
        let hourly = CandleSeries::new(Timeframe::Hour1);
        assert!(resample_series(&hourly, Timeframe::Minute15).is_err());
        assert!(resample_series(&hourly, Timeframe::Hour4).is_ok());
    }

    #[test]
    fn test_volume_overflow_is_an_error() {
        let huge = Candle {
            volume: Decimal::MAX,
            ..base(0, 100, CandleState::Finalized)
        };
        let input = series(vec![
            huge,
            Candle {
                timestamp: minute(1),
                ..huge
            },
        ]);

        let err = resample_series(&input, Timeframe::Minute15).unwrap_err();
        assert!(matches!(err, KandleError::Overflow(_)));
        // Separate buckets never add the volumes together.
        assert_eq!(resample_series(&input, Timeframe::Minute1).unwrap().len(), 2);
    }

    #[test]
    fn test_resample_store_view() {
        let store = CandleStore::new();
        let symbol = Symbol::new("BTCUSDT");
        for m in 0..20 {
            store
                .append(&symbol, base(m, 100, CandleState::Finalized))
                .unwrap();
        }

        let out = resample(&store.snapshot(&symbol), Timeframe::Minute15).unwrap();
        let volumes: Vec<_> = out.iter().map(|c| c.volume).collect();
        assert_eq!(volumes, vec![Decimal::from(15), Decimal::from(5)]);
        assert!(resample(&store.snapshot(&symbol), Timeframe::Minute30).is_err());
    }

    #[test]
    fn test_resampled_candles_keep_ohlc_invariants() {
        let input = series(
            (0..240)
                .map(|m| {
                    let mid = 1000 + (m * 37 % 23) - 11;
                    let ts = minute(m);
                    Candle::new(
                        ts,
                        Decimal::from(mid),
                        Decimal::from(mid + 5),
                        Decimal::from(mid - 4),
                        Decimal::from(mid + 2),
                        Decimal::new(m, 2),
                        CandleState::Finalized,
                    )
                })
                .collect(),
        );
        for tf in Timeframe::supported() {
            let out = resample_series(&input, *tf).unwrap();
            assert!(out.iter().all(|c| c.validate().is_ok()));
        }
    }
}
