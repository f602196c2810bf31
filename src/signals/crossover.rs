// =============================================================================
// Crossover detection
// =============================================================================
//
// A crossover is a *transition*: the value series moves from at-or-below the
// reference to strictly above it (Up), or from at-or-above to strictly below
// it (Down), between two adjacent rows.  Staying on one side is not a signal.
// =============================================================================

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Direction of a detected crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossover {
    Up,
    Down,
}

/// Detect a crossover of `value` against `reference` between the previous
/// and the current row.
///
/// Any undefined input yields `None`; undefined data never produces a signal.
pub fn detect_crossover(
    value: Option<f64>,
    prev_value: Option<f64>,
    reference: Option<f64>,
    prev_reference: Option<f64>,
) -> Option<Crossover> {
    let (v, pv, r, pr) = (value?, prev_value?, reference?, prev_reference?);

    if v > r && pv <= pr {
        Some(Crossover::Up)
    } else if v < r && pv >= pr {
        Some(Crossover::Down)
    } else {
        None
    }
}

/// Result of every comparison for one row, in comparison-set order.
///
/// Serialises as `{"Price_vs_SMA_5": "Up", "Price_vs_SMA_10": null, ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalVector {
    entries: Vec<(String, Option<Crossover>)>,
}

impl SignalVector {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, signal: Option<Crossover>) {
        self.entries.push((name.into(), signal));
    }

    /// Signal for `name`; `None` when it did not fire or is not present.
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<Crossover> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, s)| *s)
    }

    /// At least one comparison fired.
    pub fn is_actionable(&self) -> bool {
        self.entries.iter().any(|(_, s)| s.is_some())
    }

    /// Only the comparisons that fired.
    pub fn fired(&self) -> impl Iterator<Item = (&str, Crossover)> {
        self.entries
            .iter()
            .filter_map(|(n, s)| s.map(|s| (n.as_str(), s)))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for SignalVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, signal) in &self.entries {
            map.serialize_entry(name, signal)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SignalVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SignalVisitor;

        impl<'de> Visitor<'de> for SignalVisitor {
            type Value = SignalVector;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of comparison names to \"Up\", \"Down\" or null")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut signals = SignalVector::default();
                while let Some((name, signal)) = map.next_entry::<String, Option<Crossover>>()? {
                    signals.push(name, signal);
                }
                Ok(signals)
            }
        }

        deserializer.deserialize_map(SignalVisitor)
    }
}
