//! kandle CLI - Incremental OHLCV candle aggregation from kline streams.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use kandle_lib::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "kandle")]
#[command(about = "Incremental OHLCV candle aggregation from kline streams", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Timezone for candle timestamps (e.g., Asia/Ho_Chi_Minh, UTC)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Moving average windows, comma separated (e.g., 7,25,99)
    #[arg(long, value_delimiter = ',', global = true)]
    ma: Option<Vec<usize>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a captured kline stream and write the annotated series
    Replay {
        /// NDJSON file of kline stream messages
        file: PathBuf,

        /// Symbol to aggregate. Defaults to the only symbol in the file.
        #[arg(short, long)]
        symbol: Option<String>,

        /// Target timeframe (1m, 15m, 1h, 4h)
        #[arg(short, long, default_value = "15m")]
        timeframe: Timeframe,

        /// Output file path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv, tsv, json, ndjson)
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Follow a growing kline capture file and print changed candles
    Watch {
        /// NDJSON file of kline stream messages
        file: PathBuf,

        /// Symbol to follow. Defaults to the first symbol seen.
        #[arg(short, long)]
        symbol: Option<String>,

        /// Target timeframe (1m, 15m, 1h, 4h)
        #[arg(short, long, default_value = "15m")]
        timeframe: Timeframe,

        /// Refresh interval in seconds
        #[arg(short, long, default_value = "5")]
        interval: u64,

        /// Output format (csv, tsv, json, ndjson)
        #[arg(short, long, default_value = "ndjson")]
        format: OutputFormat,

        /// Read the file once and exit
        #[arg(long)]
        once: bool,
    },

    /// List supported timeframes
    Timeframes,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the engine configuration from the config file and flag overrides.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(name) = &cli.timezone {
        let timezone: Tz = match name.parse() {
            Ok(tz) => tz,
            Err(_) => bail!("Unknown timezone: {name}"),
        };
        config = config.with_timezone(timezone);
    }
    if let Some(windows) = &cli.ma {
        config = config.with_ma_windows(windows.iter().copied());
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Show help if no command provided
    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Replay {
            file,
            symbol,
            timeframe,
            output,
            format,
        } => {
            let engine = CandleEngine::new(load_config(&cli)?)?;
            commands::replay::replay(
                &engine,
                file,
                symbol.as_deref(),
                *timeframe,
                output.as_deref(),
                *format,
            )
            .await
        }
        Commands::Watch {
            file,
            symbol,
            timeframe,
            interval,
            format,
            once,
        } => {
            let engine = CandleEngine::new(load_config(&cli)?)?;
            commands::watch::watch(
                &engine,
                file,
                symbol.as_deref(),
                *timeframe,
                *interval,
                *format,
                *once,
            )
            .await
        }
        Commands::Timeframes => commands::timeframes::list_timeframes(),
    }
}
