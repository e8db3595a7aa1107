//! Incremental OHLCV candle aggregation.
//!
//! This is a facade crate that re-exports functionality from the kandle
//! workspace crates, plus [`CandleEngine`], which ties them together.
//!
//! # Quick Start
//!
//! ```
//! use kandle_lib::prelude::*;
//!
//! let engine = CandleEngine::new(EngineConfig::default().with_timezone(Tz::UTC))?;
//! let symbol = Symbol::new("BTCUSDT");
//!
//! for minute in 0..15 {
//!     let raw = RawKline::new(1_704_067_200_000 + minute * 60_000, "100", "101", "99", "100", "2", true);
//!     engine.ingest(&symbol, &raw)?;
//! }
//!
//! let series = engine.resample(&symbol, Timeframe::Minute15)?;
//! let annotated = engine.annotate(&series)?;
//! assert_eq!(annotated.series.len(), 1);
//!
//! let delta = engine.delta(&symbol, Timeframe::Hour1, Watermark::origin())?;
//! assert!(!delta.is_empty());
//! # Ok::<(), KandleError>(())
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kandle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod engine;

pub use config::EngineConfig;
pub use engine::{CandleEngine, IngestReport};

// Re-export core types
pub use kandle_types::*;

// Re-export the pipeline stages
pub use kandle_aggregate::{
    Delta, IncrementalUpdateTracker, MovingAverageEngine, Resampler, resample, resample_series,
    rolling_mean,
};
pub use kandle_normalize::{EventNormalizer, decode_kline_message};
pub use kandle_store::{AppendOutcome, CandleRange, CandleStore};

// Re-export formatters
#[cfg(feature = "format")]
pub use kandle_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat,
};

/// Prelude module for convenient imports.
///
/// ```
/// use kandle_lib::prelude::*;
/// ```
pub mod prelude {
    pub use kandle_types::{
        AnnotatedSeries, Candle, CandleSeries, CandleState, Decimal, KandleError, RawKline,
        Result, Symbol, Timeframe, Tz, Watermark,
    };

    pub use kandle_aggregate::Delta;
    pub use kandle_store::AppendOutcome;

    pub use crate::{CandleEngine, EngineConfig, IngestReport};

    #[cfg(feature = "format")]
    pub use kandle_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
