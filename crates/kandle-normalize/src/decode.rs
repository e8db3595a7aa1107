//! Kline stream payload decoding.

use kandle_types::{MalformedEventError, RawKline, Symbol, Timeframe};
use serde::Deserialize;

/// Stream payload, either a bare event or wrapped by a combined stream.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Combined { data: KlineEvent },
    Direct(KlineEvent),
}

#[derive(Deserialize)]
struct KlineEvent {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    body: KlineBody,
}

#[derive(Deserialize)]
struct KlineBody {
    #[serde(rename = "i", default)]
    interval: Option<String>,
    #[serde(flatten)]
    kline: RawKline,
}

/// Decodes a kline stream message into its symbol and raw kline.
///
/// Accepts both `{"e":"kline","s":..,"k":{..}}` and the combined-stream
/// form `{"stream":..,"data":{..}}`.
///
/// # Errors
///
/// Returns [`MalformedEventError::Decode`] if the payload is not valid JSON,
/// is not a kline event, or carries an interval other than 1 minute.
pub fn decode_kline_message(payload: &str) -> Result<(Symbol, RawKline), MalformedEventError> {
    let envelope: Envelope = serde_json::from_str(payload)
        .map_err(|e| MalformedEventError::Decode(e.to_string()))?;
    let event = match envelope {
        Envelope::Combined { data } | Envelope::Direct(data) => data,
    };

    if event.event_type != "kline" {
        return Err(MalformedEventError::Decode(format!(
            "unexpected event type '{}'",
            event.event_type
        )));
    }
    if let Some(interval) = event.body.interval {
        let is_base = interval
            .parse::<Timeframe>()
            .is_ok_and(|tf| tf == Timeframe::BASE);
        if !is_base {
            return Err(MalformedEventError::Decode(format!(
                "unexpected kline interval '{interval}'"
            )));
        }
    }

    Ok((Symbol::new(event.symbol), event.body.kline))
}
