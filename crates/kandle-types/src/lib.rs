//! Core types for the kandle candle aggregation engine.
//!
//! This crate provides the fundamental data structures used throughout kandle:
//!
//! - [`Candle`] - A single OHLCV candle with its provisional/finalized state
//! - [`CandleSeries`] - Time-ordered candles for one timeframe
//! - [`AnnotatedSeries`] - A series with aligned moving averages
//! - [`RawKline`] - Raw kline tick as delivered by the exchange stream
//! - [`Symbol`] - Trading pair used as the partition key
//! - [`Timeframe`] - Candle aggregation timeframe
//! - [`Watermark`] - Incremental aggregation progress marker

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kandle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod candle;
mod error;
mod kline;
mod series;
mod symbol;
mod timeframe;
mod watermark;

pub use candle::{Candle, CandleState, Timestamp};
pub use error::{KandleError, MalformedEventError, Result};
pub use kline::RawKline;
pub use series::{AnnotatedSeries, CandleSeries, MovingAverage};
pub use symbol::Symbol;
pub use timeframe::{Timeframe, TimeframeParseError};
pub use watermark::Watermark;

// Downstream crates name these in their public signatures.
pub use chrono_tz::Tz;
pub use rust_decimal::Decimal;
