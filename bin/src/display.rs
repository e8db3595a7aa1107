//! Display utilities and output formatting for the kandle CLI.

use anyhow::{Result, bail};
use kandle_lib::prelude::*;
use kandle_lib::{MovingAverage, Timestamp};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write an annotated series in the given format.
pub(crate) fn write_series<W: Write + Send>(
    series: &AnnotatedSeries,
    writer: W,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => CsvFormatter::new().write_series(series, writer)?,
        OutputFormat::Tsv => CsvFormatter::tsv().write_series(series, writer)?,
        OutputFormat::Json => JsonFormatter::new().write_series(series, writer)?,
        OutputFormat::Ndjson => JsonFormatter::ndjson().write_series(series, writer)?,
    }
    Ok(())
}

/// Write an annotated series to a file, or to stdout when no path is given.
pub(crate) fn write_output(
    series: &AnnotatedSeries,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_series(series, &mut writer, format)?;
            writer.flush()?;
        }
        None => {
            let mut writer = BufWriter::new(std::io::stdout());
            write_series(series, &mut writer, format)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Keep only the rows of `annotated` whose candle starts at one of `timestamps`.
pub(crate) fn select_rows(
    annotated: &AnnotatedSeries,
    timestamps: &BTreeSet<Timestamp>,
) -> AnnotatedSeries {
    let keep: Vec<usize> = annotated
        .series
        .iter()
        .enumerate()
        .filter(|(_, c)| timestamps.contains(&c.timestamp))
        .map(|(i, _)| i)
        .collect();

    let candles = keep.iter().map(|&i| annotated.series.candles()[i]).collect();
    let averages = annotated
        .averages
        .iter()
        .map(|ma| MovingAverage {
            window: ma.window,
            values: keep.iter().filter_map(|&i| ma.values.get(i).copied()).collect(),
        })
        .collect();

    AnnotatedSeries {
        series: CandleSeries::from_candles(annotated.series.timeframe(), candles),
        averages,
    }
}

/// Pick the symbol to report on.
///
/// An explicit symbol always wins; otherwise the store must hold exactly one.
pub(crate) fn resolve_symbol(engine: &CandleEngine, symbol: Option<&str>) -> Result<Symbol> {
    if let Some(symbol) = symbol {
        return Ok(Symbol::new(symbol));
    }

    let mut symbols = engine.store().symbols();
    match symbols.len() {
        0 => bail!("No kline messages found"),
        1 => Ok(symbols.remove(0)),
        _ => {
            let names: Vec<String> = symbols.iter().map(ToString::to_string).collect();
            bail!(
                "Input holds several symbols ({}), choose one with --symbol",
                names.join(", ")
            )
        }
    }
}
