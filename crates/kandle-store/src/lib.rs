//! Per-symbol base candle store for the kandle candle aggregation engine.
//!
//! - [`CandleStore`] - Append-only, time-ordered 1-minute candle store
//! - [`CandleRange`] - Lazy snapshot view returned by range queries
//! - [`AppendOutcome`] - Result of an append

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kandle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod store;

pub use store::{AppendOutcome, CandleRange, CandleRangeIter, CandleStore};
