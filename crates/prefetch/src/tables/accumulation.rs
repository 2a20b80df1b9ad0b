//! Accumulation Table.
//!
//! The accumulation table holds regions that have been touched in at least
//! two distinct blocks during the current generation and accumulates the
//! generation's access pattern. When the generation ends, the accumulated
//! pattern is taken out and written through to the pattern history table.

use crate::common::{AccessPattern, RegionBase};

use super::{InsertOutcome, PatternTable};

/// Result of applying one access to the accumulation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulationUpdate {
    /// The key is not tracked here.
    Absent,
    /// The touched block was already recorded; the pattern is unchanged.
    SameBlock,
    /// A new block bit was merged into the stored pattern.
    Extended,
}

/// Table of regions seen in two or more distinct blocks this generation.
pub struct AccumulationTable {
    table: PatternTable,
}

impl AccumulationTable {
    /// Creates an accumulation table of `capacity` directly-mapped entries.
    pub fn new(capacity: usize, region_bytes: u64) -> Self {
        Self {
            table: PatternTable::new(capacity, 1, region_bytes),
        }
    }

    /// Presence check without touching recency.
    pub fn contains(&self, key: RegionBase) -> bool {
        self.table.contains(key)
    }

    /// Copy of the accumulated pattern, if any.
    pub fn pattern(&self, key: RegionBase) -> Option<AccessPattern> {
        self.table.peek(key)
    }

    /// Starts accumulating a promoted region. Called only on promotion from
    /// the filter table, with the filter pattern merged with the promoting
    /// access's bit.
    pub fn insert(&mut self, key: RegionBase, pattern: AccessPattern) -> InsertOutcome {
        self.table.insert(key, pattern)
    }

    /// Applies one access to a tracked region, merging a new block bit into
    /// the stored pattern. Recency is refreshed either way.
    pub fn update(&mut self, key: RegionBase, bit: AccessPattern) -> AccumulationUpdate {
        match self.table.check(key) {
            None => AccumulationUpdate::Absent,
            Some(stored) => {
                if stored.contains(bit) {
                    AccumulationUpdate::SameBlock
                } else {
                    *stored = stored.merged(bit);
                    AccumulationUpdate::Extended
                }
            }
        }
    }

    /// Removes the entry for `key` and returns its accumulated pattern.
    /// This is the accumulation side of ending a generation.
    pub fn take(&mut self, key: RegionBase) -> Option<AccessPattern> {
        let pattern = self.table.check(key).map(|stored| *stored);
        if pattern.is_some() {
            self.table.invalidate(key);
        }
        pattern
    }
}
