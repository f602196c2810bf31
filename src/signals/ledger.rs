// =============================================================================
// Actionable Ledger — accumulated actionable rows across chunk runs
// =============================================================================
//
// Records are keyed by timestamp, so scanning a range twice (or two
// overlapping ranges) replaces rows instead of duplicating them.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use super::engine::ActionableRecord;

/// Timestamp-ordered collection of actionable records.
#[derive(Debug, Clone, Default)]
pub struct ActionableLedger {
    records: BTreeMap<DateTime<FixedOffset>, ActionableRecord>,
}

/// Counts from one [`ActionableLedger::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub added: usize,
    pub replaced: usize,
}

impl ActionableLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from previously persisted records.
    pub fn from_records(records: Vec<ActionableRecord>) -> Self {
        let mut ledger = Self::new();
        ledger.merge(records);
        ledger
    }

    /// Insert `records`; a record whose timestamp is already present
    /// replaces the stored one.
    pub fn merge(&mut self, records: Vec<ActionableRecord>) -> MergeStats {
        let mut stats = MergeStats::default();
        for record in records {
            match self.records.insert(record.timestamp, record) {
                Some(_) => stats.replaced += 1,
                None => stats.added += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records in timestamp order.
    pub fn into_records(self) -> Vec<ActionableRecord> {
        self.records.into_values().collect()
    }
}
