//! Benchmark utilities for kandle.

use kandle_lib::prelude::*;

/// 2024-01-01T00:00:00Z in milliseconds.
pub const START_MS: i64 = 1_704_067_200_000;

/// Deterministic kline stream messages for `minutes` consecutive minutes.
///
/// Every minute is delivered twice, provisional then closed, the way an
/// exchange stream reports a forming candle.
pub fn synthetic_messages(symbol: &str, minutes: i64) -> Vec<String> {
    (0..minutes)
        .flat_map(|m| {
            let close = 30_000 + (m * 7919) % 500;
            [false, true].map(|closed| {
                format!(
                    r#"{{"e":"kline","s":"{symbol}","k":{{"t":{},"i":"1m","o":"{close}","h":"{}","l":"{}","c":"{close}","v":"1.25","x":{closed}}}}}"#,
                    START_MS + m * 60_000,
                    close + 10,
                    close - 10,
                )
            })
        })
        .collect()
}

/// An engine holding `minutes` finalized base candles for `symbol`.
pub fn populated_engine(symbol: &str, minutes: i64) -> CandleEngine {
    let engine = CandleEngine::with_defaults();
    let messages = synthetic_messages(symbol, minutes);
    engine.ingest_lines(messages.iter().map(String::as_str));
    engine
}
