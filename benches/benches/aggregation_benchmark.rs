//! Aggregation benchmarks: ingestion, resampling, moving averages and deltas.
//!
//! Run with: `cargo bench --package kandle-bench`

use chrono::TimeDelta;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kandle_bench::{populated_engine, synthetic_messages};
use kandle_lib::prelude::*;
use std::hint::black_box;

/// History lengths in minutes: one day, one week, one month.
const HISTORY: [i64; 3] = [1_440, 10_080, 43_200];

fn ingest_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for minutes in HISTORY {
        let messages = synthetic_messages("BTCUSDT", minutes);
        group.throughput(Throughput::Elements(messages.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(minutes), &messages, |b, messages| {
            b.iter(|| {
                let engine = CandleEngine::with_defaults();
                black_box(engine.ingest_lines(messages.iter().map(String::as_str)))
            });
        });
    }
    group.finish();
}

fn resample_benchmark(c: &mut Criterion) {
    let symbol = Symbol::new("BTCUSDT");
    let mut group = c.benchmark_group("resample");

    for minutes in HISTORY {
        let engine = populated_engine("BTCUSDT", minutes);
        group.throughput(Throughput::Elements(minutes as u64));
        for timeframe in [Timeframe::Minute15, Timeframe::Hour4] {
            group.bench_with_input(
                BenchmarkId::new(timeframe.as_str(), minutes),
                &timeframe,
                |b, &timeframe| b.iter(|| black_box(engine.resample(&symbol, timeframe))),
            );
        }
    }
    group.finish();
}

fn moving_average_benchmark(c: &mut Criterion) {
    let symbol = Symbol::new("BTCUSDT");
    let mut group = c.benchmark_group("moving_average");

    for minutes in HISTORY {
        let engine = populated_engine("BTCUSDT", minutes);
        let Ok(series) = engine.resample(&symbol, Timeframe::Minute1) else {
            continue;
        };
        group.throughput(Throughput::Elements(series.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(minutes), &series, |b, series| {
            b.iter(|| black_box(engine.annotate(series)));
        });
    }
    group.finish();
}

/// A poll after one new minute, against a full resample of the same history.
fn delta_benchmark(c: &mut Criterion) {
    let symbol = Symbol::new("BTCUSDT");
    let mut group = c.benchmark_group("delta_vs_full");

    for minutes in HISTORY {
        let engine = populated_engine("BTCUSDT", minutes);
        let Some(previous) = engine.store().latest_finalized(&symbol) else {
            continue;
        };
        let watermark = Watermark::at(previous - TimeDelta::minutes(1));

        group.bench_with_input(BenchmarkId::new("delta", minutes), &watermark, |b, &watermark| {
            b.iter(|| black_box(engine.delta(&symbol, Timeframe::Hour1, watermark)));
        });
        group.bench_with_input(BenchmarkId::new("full", minutes), &minutes, |b, _| {
            b.iter(|| black_box(engine.resample(&symbol, Timeframe::Hour1)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    ingest_benchmark,
    resample_benchmark,
    moving_average_benchmark,
    delta_benchmark
);
criterion_main!(benches);
