//! Raw kline tick representation.

use serde::{Deserialize, Serialize};

/// Raw 1-minute kline as delivered by the exchange stream.
///
/// Field names follow the exchange payload (`t`, `o`, `h`, `l`, `c`, `v`,
/// `x`). Prices and volume arrive as decimal strings and are only parsed by
/// the normalizer, so a bad value surfaces as a per-tick error rather than a
/// decode failure of the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKline {
    /// Kline open time in epoch milliseconds.
    #[serde(rename = "t")]
    pub event_time: i64,
    /// Opening price.
    #[serde(rename = "o")]
    pub open: String,
    /// Highest price.
    #[serde(rename = "h")]
    pub high: String,
    /// Lowest price.
    #[serde(rename = "l")]
    pub low: String,
    /// Closing (latest) price.
    #[serde(rename = "c")]
    pub close: String,
    /// Base-asset volume.
    #[serde(rename = "v")]
    pub volume: String,
    /// Whether the kline's minute has closed.
    #[serde(rename = "x")]
    pub is_closed: bool,
}

impl RawKline {
    /// Creates a new raw kline.
    #[must_use]
    pub fn new(
        event_time: i64,
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
        volume: impl Into<String>,
        is_closed: bool,
    ) -> Self {
        Self {
            event_time,
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
            volume: volume.into(),
            is_closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_exchange_fields() {
        let json = r#"{"t":1704110400000,"o":"42000.10","h":"42010.00","l":"41990.5","c":"42005.0","v":"12.5","x":true,"n":310}"#;
        let kline: RawKline = serde_json::from_str(json).unwrap();

        assert_eq!(kline.event_time, 1_704_110_400_000);
        assert_eq!(kline.open, "42000.10");
        assert_eq!(kline.low, "41990.5");
        assert!(kline.is_closed);
    }
}
