// =============================================================================
// Indicator columns and per-row snapshots
// =============================================================================
//
// Columns are named the way they appear in the persisted JSON (`SMA_5`,
// `RSI_14`, `VWAP`, `ATR_14`).  A snapshot keeps its columns in computation
// order and serialises as a flat map so it can be flattened into a row next
// to the raw candle fields.
// =============================================================================

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::market_data::Candle;

/// Identifies one indicator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Rsi(usize),
    Vwap,
    Atr(usize),
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sma(p) => write!(f, "SMA_{p}"),
            Self::Rsi(p) => write!(f, "RSI_{p}"),
            Self::Vwap => write!(f, "VWAP"),
            Self::Atr(p) => write!(f, "ATR_{p}"),
        }
    }
}

impl FromStr for IndicatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s == "VWAP" {
            return Ok(Self::Vwap);
        }
        let Some((prefix, period)) = s.split_once('_') else {
            bail!("not an indicator column: {s}");
        };
        let period: usize = period
            .parse()
            .with_context(|| format!("bad period in indicator column {s}"))?;
        match prefix {
            "SMA" => Ok(Self::Sma(period)),
            "RSI" => Ok(Self::Rsi(period)),
            "ATR" => Ok(Self::Atr(period)),
            _ => bail!("not an indicator column: {s}"),
        }
    }
}

/// The indicator values attached to one candle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    values: Vec<(IndicatorKind, Option<f64>)>,
}

impl IndicatorSnapshot {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a column, replacing any earlier value for the same kind.
    pub fn insert(&mut self, kind: IndicatorKind, value: Option<f64>) {
        match self.values.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = value,
            None => self.values.push((kind, value)),
        }
    }

    /// Value of `kind`, `None` when undefined or absent.
    pub fn get(&self, kind: IndicatorKind) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, v)| *v)
    }

    /// Whether the column exists at all (defined or not).
    pub fn contains(&self, kind: IndicatorKind) -> bool {
        self.values.iter().any(|(k, _)| *k == kind)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl Serialize for IndicatorSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (kind, value) in &self.values {
            map.serialize_entry(&kind.to_string(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IndicatorSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = IndicatorSnapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of indicator columns")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut snapshot = IndicatorSnapshot::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.parse::<IndicatorKind>() {
                        Ok(kind) => {
                            let value: Option<f64> = map.next_value()?;
                            snapshot.insert(kind, value);
                        }
                        // Row fields that are not indicators (Timestamp, Close, ...).
                        Err(_) => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(snapshot)
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

/// A candle together with its indicator snapshot, as persisted by the
/// indicator stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedCandle {
    #[serde(flatten)]
    pub candle: Candle,
    #[serde(flatten)]
    pub indicators: IndicatorSnapshot,
}
