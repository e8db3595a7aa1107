//! Candle series and moving-average annotations.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{Candle, Timeframe};

/// Candles of one timeframe, strictly increasing by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandleSeries {
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Creates an empty series.
    #[must_use]
    pub const fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            candles: Vec::new(),
        }
    }

    /// Builds a series from candles in any order.
    ///
    /// Candles are sorted by timestamp; when several share a timestamp the
    /// one that appears last in the input wins.
    #[must_use]
    pub fn from_candles(timeframe: Timeframe, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by(|later, earlier| {
            if later.timestamp == earlier.timestamp {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        Self { timeframe, candles }
    }

    /// Returns the timeframe of the candles.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Returns the candles as a slice.
    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Consumes the series, returning its candles.
    #[must_use]
    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }

    /// Returns an iterator over the candles.
    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// Returns the number of candles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candles.len()
    }

    /// Returns true if the series holds no candles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Returns the most recent candle.
    #[must_use]
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Returns the closing prices in order.
    pub fn closes(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.candles.iter().map(|c| c.close)
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

/// Rolling mean of closing prices for one window size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovingAverage {
    /// Window size in periods.
    pub window: usize,
    /// One value per candle of the annotated series.
    pub values: Vec<Decimal>,
}

/// A candle series with moving averages aligned one-to-one to its candles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedSeries {
    /// The underlying candles.
    pub series: CandleSeries,
    /// Moving averages in the order the windows were requested.
    pub averages: Vec<MovingAverage>,
}

impl AnnotatedSeries {
    /// Returns the moving average for `window`, if it was computed.
    #[must_use]
    pub fn average(&self, window: usize) -> Option<&MovingAverage> {
        self.averages.iter().find(|ma| ma.window == window)
    }

    /// Returns the window sizes in output order.
    pub fn windows(&self) -> impl Iterator<Item = usize> + '_ {
        self.averages.iter().map(|ma| ma.window)
    }

    /// Returns the moving-average values for the candle at `index`.
    pub fn values_at(&self, index: usize) -> impl Iterator<Item = Decimal> + '_ {
        self.averages.iter().filter_map(move |ma| ma.values.get(index).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CandleState;
    use chrono::{TimeDelta, TimeZone};
    use chrono_tz::Tz;

    fn candle_at(minute: i64, close: i64) -> Candle {
        let timestamp = Tz::UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + TimeDelta::minutes(minute);
        let price = Decimal::from(close);
        Candle::new(
            timestamp,
            price,
            price,
            price,
            price,
            Decimal::ONE,
            CandleState::Finalized,
        )
    }

    #[test]
    fn test_from_candles_sorts_and_keeps_last_duplicate() {
        let series = CandleSeries::from_candles(
            Timeframe::Minute1,
            vec![candle_at(2, 3), candle_at(0, 1), candle_at(2, 4), candle_at(1, 2)],
        );

        let closes: Vec<_> = series.closes().collect();
        assert_eq!(
            closes,
            vec![Decimal::from(1), Decimal::from(2), Decimal::from(4)]
        );
        assert!(
            series
                .candles()
                .windows(2)
                .all(|w| w[0].timestamp < w[1].timestamp)
        );
    }

    #[test]
    fn test_annotated_lookup() {
        let series = CandleSeries::from_candles(Timeframe::Minute1, vec![candle_at(0, 1)]);
        let annotated = AnnotatedSeries {
            series,
            averages: vec![
                MovingAverage {
                    window: 7,
                    values: vec![Decimal::ONE],
                },
                MovingAverage {
                    window: 25,
                    values: vec![Decimal::TWO],
                },
            ],
        };

        assert_eq!(annotated.windows().collect::<Vec<_>>(), vec![7, 25]);
        assert_eq!(annotated.average(25).unwrap().values, vec![Decimal::TWO]);
        assert!(annotated.average(99).is_none());
        assert_eq!(
            annotated.values_at(0).collect::<Vec<_>>(),
            vec![Decimal::ONE, Decimal::TWO]
        );
    }
}
