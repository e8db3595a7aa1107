//! Replay command implementation.
//!
//! Aggregates a captured kline stream in one pass and writes the annotated
//! series for one symbol.

use crate::display::{resolve_symbol, write_output};
use anyhow::{Context, Result};
use kandle_lib::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Ingest every message in `file` and write the resampled, annotated series.
pub(crate) async fn replay(
    engine: &CandleEngine,
    file: &Path,
    symbol: Option<&str>,
    timeframe: Timeframe,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let report = engine.ingest_lines(contents.lines());
    info!(
        messages = report.total(),
        changed = report.changed(),
        "replayed {}",
        file.display()
    );
    if report.rejected() > 0 {
        warn!(
            malformed = report.malformed,
            conflicts = report.conflicts,
            "skipped {} rejected messages",
            report.rejected()
        );
    }

    let symbol = resolve_symbol(engine, symbol)?;
    let series = engine
        .resample(&symbol, timeframe)
        .with_context(|| format!("Failed to aggregate {symbol} to {timeframe}"))?;
    let annotated = engine.annotate(&series)?;
    write_output(&annotated, output, format)?;

    if let Some(path) = output {
        println!(
            "Wrote {} {} candles for {} to: {}",
            annotated.series.len(),
            timeframe,
            symbol,
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const START_MS: i64 = 1_704_067_200_000;

    fn message(minute: i64, close: i64) -> String {
        format!(
            r#"{{"e":"kline","s":"BTCUSDT","k":{{"t":{},"i":"1m","o":"{close}","h":"{close}","l":"{close}","c":"{close}","v":"1","x":true}}}}"#,
            START_MS + minute * 60_000
        )
    }

    fn engine() -> CandleEngine {
        CandleEngine::new(EngineConfig::default().with_timezone(Tz::UTC).with_ma_windows([7])).unwrap()
    }

    #[tokio::test]
    async fn test_replay_writes_csv() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        for minute in 0..30 {
            writeln!(input, "{}", message(minute, 100 + minute)).unwrap();
        }
        writeln!(input, "garbage").unwrap();
        let output = tempfile::NamedTempFile::new().unwrap();

        replay(
            &engine(),
            input.path(),
            None,
            Timeframe::Minute15,
            Some(output.path()),
            OutputFormat::Csv,
        )
        .await
        .unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,open,high,low,close,volume,state,ma_7");
        assert!(lines[1].starts_with("2024-01-01T00:00:00+00:00,100,114,100,114,15,finalized,114"));
        assert!(lines[2].starts_with("2024-01-01T00:15:00+00:00,115,129,115,129,15,finalized,"));
    }

    #[tokio::test]
    async fn test_replay_unsupported_timeframe() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        writeln!(input, "{}", message(0, 100)).unwrap();

        let result = replay(
            &engine(),
            input.path(),
            Some("BTCUSDT"),
            Timeframe::Day1,
            None,
            OutputFormat::Csv,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let result = replay(
            &engine(),
            Path::new("/nonexistent/klines.ndjson"),
            None,
            Timeframe::Minute15,
            None,
            OutputFormat::Csv,
        )
        .await;
        assert!(result.is_err());
    }
}
