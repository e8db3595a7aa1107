//! Ingestion and query boundary.

use std::sync::Arc;

use kandle_aggregate::{Delta, IncrementalUpdateTracker, MovingAverageEngine, resample};
use kandle_normalize::{EventNormalizer, decode_kline_message};
use kandle_store::{AppendOutcome, CandleStore};
use kandle_types::{
    AnnotatedSeries, CandleSeries, KandleError, RawKline, Result, Symbol, Timeframe, Watermark,
};
use tracing::{debug, warn};

use crate::EngineConfig;

/// Tally of a batch ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Candles stored at a new timestamp.
    pub inserted: usize,
    /// Provisional candles overwritten.
    pub replaced: usize,
    /// Re-deliveries that changed nothing.
    pub unchanged: usize,
    /// Messages dropped as malformed.
    pub malformed: usize,
    /// Messages that would have rewritten a finalized candle.
    pub conflicts: usize,
}

impl IngestReport {
    /// Returns the number of messages seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.replaced + self.unchanged + self.malformed + self.conflicts
    }

    /// Returns the number of messages that changed stored history.
    #[must_use]
    pub const fn changed(&self) -> usize {
        self.inserted + self.replaced
    }

    /// Returns the number of messages that were rejected.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.malformed + self.conflicts
    }

    fn record(&mut self, result: &Result<AppendOutcome>) {
        match result {
            Ok(AppendOutcome::Inserted) => self.inserted += 1,
            Ok(AppendOutcome::Replaced) => self.replaced += 1,
            Ok(AppendOutcome::Unchanged) => self.unchanged += 1,
            Err(KandleError::ImmutableCandleConflict { .. }) => self.conflicts += 1,
            Err(_) => self.malformed += 1,
        }
    }
}

/// Candle aggregation engine.
///
/// Normalizes raw kline ticks into 1-minute base candles, stores them per
/// symbol and serves resampled, moving-average annotated series. The engine
/// is `Send + Sync`; share it behind an [`Arc`] to ingest and query from
/// several threads.
#[derive(Debug)]
pub struct CandleEngine {
    config: EngineConfig,
    normalizer: EventNormalizer,
    store: Arc<CandleStore>,
    averages: MovingAverageEngine,
    tracker: IncrementalUpdateTracker,
}

impl CandleEngine {
    /// Creates an engine with an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let averages = MovingAverageEngine::new(config.ma_windows.iter().copied())?;
        Ok(Self::assemble(config, averages))
    }

    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::assemble(EngineConfig::default(), MovingAverageEngine::default())
    }

    fn assemble(config: EngineConfig, averages: MovingAverageEngine) -> Self {
        let store = Arc::new(CandleStore::new());
        Self {
            normalizer: EventNormalizer::new(config.timezone),
            tracker: IncrementalUpdateTracker::new(Arc::clone(&store)),
            store,
            averages,
            config,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the underlying base candle store.
    #[must_use]
    pub const fn store(&self) -> &Arc<CandleStore> {
        &self.store
    }

    /// Normalizes and stores one raw kline tick.
    ///
    /// Rejected ticks are logged and returned as errors; they leave the store
    /// untouched, so the caller can carry on with the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::MalformedEvent`] if the tick cannot be
    /// normalized and [`KandleError::ImmutableCandleConflict`] if it would
    /// change a finalized candle.
    pub fn ingest(&self, symbol: &Symbol, raw: &RawKline) -> Result<AppendOutcome> {
        let candle = self.normalizer.normalize(raw).map_err(|e| {
            warn!(%symbol, event_time = raw.event_time, error = %e, "dropping malformed kline");
            KandleError::from(e)
        })?;

        self.store.append(symbol, candle).inspect_err(|e| {
            warn!(%symbol, timestamp = %candle.timestamp, error = %e, "rejected kline");
        })
    }

    /// Decodes a kline stream message and ingests it.
    ///
    /// # Errors
    ///
    /// As [`CandleEngine::ingest`], plus [`KandleError::MalformedEvent`] for
    /// payloads that are not kline events.
    pub fn ingest_message(&self, payload: &str) -> Result<(Symbol, AppendOutcome)> {
        let (symbol, raw) = decode_kline_message(payload).map_err(|e| {
            warn!(error = %e, "dropping undecodable message");
            KandleError::from(e)
        })?;
        let outcome = self.ingest(&symbol, &raw)?;
        Ok((symbol, outcome))
    }

    /// Ingests stream messages one per line, skipping blank lines.
    ///
    /// A rejected message never stops the batch; it is counted in the report.
    pub fn ingest_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> IngestReport {
        let mut report = IngestReport::default();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            report.record(&self.ingest_message(line).map(|(_, outcome)| outcome));
        }
        debug!(?report, "ingested batch");
        report
    }

    /// Resamples the full base history of `symbol` into `timeframe` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::UnsupportedTimeframe`] for timeframes other than
    /// 1m, 15m, 1h and 4h, and [`KandleError::Overflow`] if a bucket volume
    /// leaves the decimal range.
    pub fn resample(&self, symbol: &Symbol, timeframe: Timeframe) -> Result<CandleSeries> {
        resample(&self.store.snapshot(symbol), timeframe)
    }

    /// Applies the configured moving averages to `series`.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::Overflow`] if a window sum of closes leaves the
    /// decimal range.
    pub fn annotate(&self, series: &CandleSeries) -> Result<AnnotatedSeries> {
        self.averages.apply(series)
    }

    /// Returns the buckets that changed since `watermark`.
    ///
    /// # Errors
    ///
    /// Returns [`KandleError::UnsupportedTimeframe`] for timeframes other than
    /// 1m, 15m, 1h and 4h.
    pub fn delta(&self, symbol: &Symbol, timeframe: Timeframe, watermark: Watermark) -> Result<Delta> {
        self.tracker.delta(symbol, timeframe, watermark)
    }
}
