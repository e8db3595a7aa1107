//! Resampling, moving averages and incremental deltas for kandle.
//!
//! This crate turns stored base candles into chart-ready series:
//!
//! - [`Resampler`] / [`resample`] - Streaming base-candle to bucket aggregation
//! - [`MovingAverageEngine`] - Rolling means of closing prices
//! - [`IncrementalUpdateTracker`] - Watermark-based changed-bucket deltas

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kandle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod incremental;
mod moving_average;
mod resampler;

pub use incremental::{Delta, IncrementalUpdateTracker};
pub use moving_average::{MovingAverageEngine, rolling_mean};
pub use resampler::{Resampler, resample, resample_series};
