use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle from a broker export.
///
/// Price and volume fields are optional: exports occasionally carry gaps, and
/// a gap must surface as an undefined indicator rather than a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(rename = "Open", default)]
    pub open: Option<f64>,
    #[serde(rename = "High", default)]
    pub high: Option<f64>,
    #[serde(rename = "Low", default)]
    pub low: Option<f64>,
    #[serde(rename = "Close", default)]
    pub close: Option<f64>,
    #[serde(rename = "Volume", default)]
    pub volume: Option<f64>,
}

impl Candle {
    /// `(high + low + close) / 3`, undefined if any leg is missing.
    pub fn typical_price(&self) -> Option<f64> {
        Some((self.high? + self.low? + self.close?) / 3.0)
    }
}

// ---------------------------------------------------------------------------
// Timestamp handling
// ---------------------------------------------------------------------------

/// Output layout for every persisted timestamp, e.g. `2024-01-02T09:15:00+0530`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Layouts accepted on input besides RFC 3339, tried in order.
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse an ISO-8601 timestamp. Naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(ts) = DateTime::parse_from_str(raw, layout) {
            return Ok(ts);
        }
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    bail!("unrecognised timestamp {raw:?}")
}

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Reject a series whose timestamps are not strictly increasing.
///
/// Both engines rely on row adjacency meaning "the previous bar"; a
/// duplicate or out-of-order row would silently produce misleading signals.
pub fn ensure_chronological<'a, I>(timestamps: I) -> Result<()>
where
    I: IntoIterator<Item = &'a DateTime<FixedOffset>>,
{
    let mut prev: Option<&DateTime<FixedOffset>> = None;
    for (row, ts) in timestamps.into_iter().enumerate() {
        if let Some(prev) = prev {
            if ts <= prev {
                bail!(
                    "row {row}: timestamp {} does not follow {}",
                    format_timestamp(ts),
                    format_timestamp(prev)
                );
            }
        }
        prev = Some(ts);
    }
    Ok(())
}

/// Serde adapter so every `Timestamp` field shares one wire format.
pub mod timestamp_format {
    use chrono::{DateTime, FixedOffset};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Parse one candle row as exported by the broker.
///
/// Expected shapes:
/// ```json
/// ["2024-01-02T09:15:00+0530", 71.2, 71.5, 71.0, 71.4, 120034, 0]
/// { "Timestamp": "2024-01-02T09:15:00+0530", "Open": 71.2, ... }
/// ```
/// Trailing array elements (open interest) are ignored.
pub fn parse_candle_row(row: &serde_json::Value) -> Result<Candle> {
    match row {
        serde_json::Value::Array(fields) => {
            if fields.len() < 6 {
                bail!("candle row has {} fields, expected at least 6", fields.len());
            }
            let timestamp = fields[0]
                .as_str()
                .context("candle timestamp is not a string")?;
            Ok(Candle {
                timestamp: parse_timestamp(timestamp)?,
                open: parse_optional_f64(&fields[1], "open")?,
                high: parse_optional_f64(&fields[2], "high")?,
                low: parse_optional_f64(&fields[3], "low")?,
                close: parse_optional_f64(&fields[4], "close")?,
                volume: parse_optional_f64(&fields[5], "volume")?,
            })
        }
        serde_json::Value::Object(fields) => {
            let timestamp = fields
                .get("Timestamp")
                .and_then(serde_json::Value::as_str)
                .context("candle object has no string Timestamp")?;
            Ok(Candle {
                timestamp: parse_timestamp(timestamp)?,
                open: field_f64(fields, "Open")?,
                high: field_f64(fields, "High")?,
                low: field_f64(fields, "Low")?,
                close: field_f64(fields, "Close")?,
                volume: field_f64(fields, "Volume")?,
            })
        }
        _ => bail!("candle row has unexpected JSON type"),
    }
}

/// An absent key is a gap, same as an explicit null.
fn field_f64(
    fields: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<Option<f64>> {
    match fields.get(name) {
        Some(val) => parse_optional_f64(val, name),
        None => Ok(None),
    }
}

/// Numeric fields may arrive as numbers, numeric strings, or null.
fn parse_optional_f64(val: &serde_json::Value, name: &str) -> Result<Option<f64>> {
    match val {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Some)
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => bail!("field {name} has unexpected JSON type"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
