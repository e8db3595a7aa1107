//! Rolling moving averages over candle closes.

use kandle_types::{AnnotatedSeries, CandleSeries, Decimal, KandleError, MovingAverage, Result};

/// Computes simple moving averages of closing prices.
///
/// Each window averages the trailing `w` closes, or every close seen so far
/// while fewer than `w` are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovingAverageEngine {
    windows: Vec<usize>,
}

impl MovingAverageEngine {
    /// Window sizes used by [`MovingAverageEngine::default`].
    pub const DEFAULT_WINDOWS: [usize; 3] = [7, 25, 99];

    /// Creates an engine for the given window sizes.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::InvalidWindow`] if any window is zero.
    pub fn new(windows: impl IntoIterator<Item = usize>) -> Result<Self> {
        let windows: Vec<usize> = windows.into_iter().collect();
        if let Some(&bad) = windows.iter().find(|&&w| w == 0) {
            return Err(KandleError::InvalidWindow(bad));
        }
        Ok(Self { windows })
    }

    /// Returns the configured window sizes.
    #[must_use]
    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// Annotates `series` with one moving average per window.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::Overflow`] if a window sum of closes leaves the
    /// decimal range.
    pub fn apply(&self, series: &CandleSeries) -> Result<AnnotatedSeries> {
        let closes: Vec<Decimal> = series.closes().collect();
        let averages = self
            .windows
            .iter()
            .map(|&window| {
                Ok(MovingAverage {
                    window,
                    values: rolling_mean(&closes, window)?,
                })
            })
            .collect::<Result<_>>()?;

        Ok(AnnotatedSeries {
            series: series.clone(),
            averages,
        })
    }
}

impl Default for MovingAverageEngine {
    fn default() -> Self {
        Self {
            windows: Self::DEFAULT_WINDOWS.to_vec(),
        }
    }
}

/// Rolling mean with a minimum of one period.
///
/// The output has one value per input value. A zero window yields an empty
/// output.
///
/// # Errors
///
/// Returns [`KandleError::Overflow`] if a running window sum leaves the
/// decimal range.
pub fn rolling_mean(values: &[Decimal], window: usize) -> Result<Vec<Decimal>> {
    if window == 0 {
        return Ok(Vec::new());
    }

    let overflow = || KandleError::Overflow("moving average");
    let mut sum = Decimal::ZERO;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            if i >= window {
                sum = sum.checked_sub(values[i - window]).ok_or_else(overflow)?;
            }
            sum = sum.checked_add(*value).ok_or_else(overflow)?;
            let periods = Decimal::from(window.min(i + 1));
            Ok((sum / periods).normalize())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use kandle_types::{Candle, CandleState, Timeframe, Tz};

    fn decimals(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    fn series_from_closes(closes: &[i64]) -> CandleSeries {
        let start = Tz::UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let price = Decimal::from(close);
                Candle::new(
                    start + TimeDelta::minutes(i as i64),
                    price,
                    price,
                    price,
                    price,
                    Decimal::ONE,
                    CandleState::Finalized,
                )
            })
            .collect();
        CandleSeries::from_candles(Timeframe::Minute1, candles)
    }

    #[test]
    fn test_window_seven_reference_sequence() {
        let values = rolling_mean(&decimals(&[1, 2, 3, 4, 5, 6, 7, 8]), 7).unwrap();
        let expected: Vec<Decimal> = ["1", "1.5", "2", "2.5", "3", "3.5", "4", "5"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_window_one_is_identity() {
        let input = decimals(&[5, 3, 9]);
        assert_eq!(rolling_mean(&input, 1).unwrap(), input);
    }

    #[test]
    fn test_window_larger_than_series() {
        let values = rolling_mean(&decimals(&[2, 4, 6]), 99).unwrap();
        assert_eq!(values, decimals(&[2, 3, 4]));
    }

    #[test]
    fn test_repeating_fraction() {
        let values = rolling_mean(&decimals(&[1, 1, 2]), 3).unwrap();
        let third = values[2];
        assert!((third - Decimal::new(13333, 4)).abs() < Decimal::new(1, 4));
    }

    #[test]
    fn test_apply_aligns_with_series() {
        let series = series_from_closes(&[10, 20, 30, 40]);
        let engine = MovingAverageEngine::new([2, 3]).unwrap();
        let annotated = engine.apply(&series).unwrap();

        assert_eq!(annotated.series, series);
        assert_eq!(annotated.averages.len(), 2);
        assert!(annotated.averages.iter().all(|ma| ma.values.len() == 4));
        assert_eq!(annotated.average(2).unwrap().values, decimals(&[10, 15, 25, 35]));
        assert_eq!(annotated.average(3).unwrap().values, decimals(&[10, 15, 20, 30]));
    }

    #[test]
    fn test_apply_is_deterministic() {
        let series = series_from_closes(&[3, 1, 4, 1, 5, 9, 2, 6]);
        let engine = MovingAverageEngine::default();
        assert_eq!(engine.apply(&series).unwrap(), engine.apply(&series).unwrap());
        assert_eq!(engine.windows(), &[7, 25, 99]);
    }

    #[test]
    fn test_window_sum_overflow_is_an_error() {
        let values = [Decimal::MAX, Decimal::MAX];
        let err = rolling_mean(&values, 2).unwrap_err();
        assert!(matches!(err, KandleError::Overflow(_)));

        // A window of one never sums two closes.
        assert_eq!(rolling_mean(&values, 1).unwrap(), values.to_vec());

        let engine = MovingAverageEngine::new([2]).unwrap();
        let series = series_from_closes(&[1, 2]);
        let mut candles = series.into_candles();
        for candle in &mut candles {
            candle.close = Decimal::MAX;
            candle.high = Decimal::MAX;
        }
        let series = CandleSeries::from_candles(Timeframe::Minute1, candles);
        assert!(matches!(engine.apply(&series), Err(KandleError::Overflow(_))));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let err = MovingAverageEngine::new([7, 0]).unwrap_err();
        assert!(matches!(err, KandleError::InvalidWindow(0)));
    }

    #[test]
    fn test_empty_series() {
        let annotated = MovingAverageEngine::default()
            .apply(&CandleSeries::new(Timeframe::Hour1))
            .unwrap();
        assert!(annotated.series.is_empty());
        assert!(annotated.averages.iter().all(|ma| ma.values.is_empty()));
    }
}
