//! Timeframes command implementation.

use anyhow::Result;
use kandle_lib::prelude::*;

/// Print the timeframes candles can be aggregated to.
pub(crate) fn list_timeframes() -> Result<()> {
    println!("{:<6} {:<10} {:<8}", "ID", "SECONDS", "ALIASES");
    println!("{}", "-".repeat(30));

    for timeframe in Timeframe::supported() {
        println!(
            "{:<6} {:<10} {:<8}",
            timeframe.as_str(),
            timeframe.seconds(),
            aliases(*timeframe)
        );
    }

    println!("\nTotal: {} timeframes", Timeframe::supported().len());
    Ok(())
}

const fn aliases(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Minute1 => "m1, 1min",
        Timeframe::Minute15 => "m15, 15min",
        Timeframe::Hour1 => "h1, hour",
        Timeframe::Hour4 => "h4",
        _ => "",
    }
}
