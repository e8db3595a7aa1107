//! Watch command implementation.
//!
//! Follows a growing kline capture file. Each refresh ingests the lines
//! appended since the last one and prints only the candles that changed.

use crate::display::{select_rows, write_series};
use anyhow::{Context, Result};
use kandle_lib::{Resampler, Timestamp};
use kandle_lib::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufWriter, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

/// Reads lines appended to a file since the previous read.
#[derive(Debug)]
struct FileTail {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
}

impl FileTail {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            offset: 0,
            partial: Vec::new(),
        }
    }

    /// Returns the complete lines appended since the last call.
    ///
    /// A trailing line without a newline is held back as raw bytes until it
    /// is completed, so a multibyte character split across reads survives.
    async fn read_new_lines(&mut self) -> Result<Vec<String>> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "waiting for file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", self.path.display()));
            }
        };

        let len = file.metadata().await?.len();
        if len < self.offset {
            warn!(path = %self.path.display(), "file truncated, reading from the start");
            self.offset = 0;
            self.partial.clear();
        }

        file.seek(SeekFrom::Start(self.offset)).await?;
        let read = file.read_to_end(&mut self.partial).await?;
        self.offset += read as u64;

        let Some(end) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let rest = self.partial.split_off(end + 1);
        let complete = std::mem::replace(&mut self.partial, rest);
        Ok(String::from_utf8_lossy(&complete)
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// Returns the held back trailing line, if any.
    fn take_partial(&mut self) -> Option<String> {
        let bytes = std::mem::take(&mut self.partial);
        let line = String::from_utf8_lossy(&bytes).into_owned();
        (!line.trim().is_empty()).then_some(line)
    }
}

/// Candles for one (symbol, timeframe) assembled from successive deltas.
#[derive(Debug)]
struct DeltaView {
    timeframe: Timeframe,
    watermark: Watermark,
    buckets: BTreeMap<Timestamp, Candle>,
}

impl DeltaView {
    const fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            watermark: Watermark::origin(),
            buckets: BTreeMap::new(),
        }
    }

    /// Pulls the next delta and returns the changed rows, annotated against
    /// the full view.
    fn refresh(&mut self, engine: &CandleEngine, symbol: &Symbol) -> Result<Option<AnnotatedSeries>> {
        let delta = engine.delta(symbol, self.timeframe, self.watermark)?;
        debug!(
            %symbol,
            from = %self.watermark,
            to = %delta.watermark,
            buckets = delta.series.len(),
            "refresh"
        );
        self.watermark = delta.watermark;
        if delta.is_empty() {
            return Ok(None);
        }

        let changed: BTreeSet<Timestamp> = delta.series.iter().map(|c| c.timestamp).collect();
        self.buckets
            .extend(delta.series.iter().map(|c| (c.timestamp, *c)));

        let view = CandleSeries::from_candles(self.timeframe, self.buckets.values().copied().collect());
        Ok(Some(select_rows(&engine.annotate(&view)?, &changed)))
    }
}

/// Follow `file`, printing changed candles every `interval_secs`.
pub(crate) async fn watch(
    engine: &CandleEngine,
    file: &Path,
    symbol: Option<&str>,
    timeframe: Timeframe,
    interval_secs: u64,
    format: OutputFormat,
    once: bool,
) -> Result<()> {
    // Fail on an unsupported timeframe before waiting for input.
    Resampler::new(timeframe)?;

    let mut tail = FileTail::new(file);
    let mut view = DeltaView::new(timeframe);
    let mut symbol = symbol.map(Symbol::new);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    if !once {
        info!(
            "watching {} (refresh every {}s, Ctrl+C to exit)",
            file.display(),
            interval_secs.max(1)
        );
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        }

        let mut lines = tail.read_new_lines().await?;
        if once {
            lines.extend(tail.take_partial());
        }
        let report = engine.ingest_lines(lines.iter().map(String::as_str));
        if report.rejected() > 0 {
            warn!(
                malformed = report.malformed,
                conflicts = report.conflicts,
                "skipped {} rejected messages",
                report.rejected()
            );
        }

        if symbol.is_none() {
            symbol = engine.store().symbols().into_iter().next();
        }
        if let Some(symbol) = &symbol
            && let Some(changed) = view.refresh(engine, symbol)?
        {
            let mut out = BufWriter::new(std::io::stdout());
            write_series(&changed, &mut out, format)?;
            out.flush()?;
        }

        if once {
            return Ok(());
        }
    }
}
