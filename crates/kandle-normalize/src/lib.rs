//! Kline tick normalization for the kandle candle aggregation engine.
//!
//! - [`EventNormalizer`] - Converts raw kline ticks into validated candles
//! - [`decode_kline_message`] - Decodes kline stream payloads

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kandle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decode;
mod normalizer;

pub use decode::decode_kline_message;
pub use normalizer::EventNormalizer;
