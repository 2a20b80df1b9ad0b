//! Pattern History Table.
//!
//! The pattern history table persists access patterns across generations,
//! keyed by region base. Each completed generation of a region writes one
//! entry; a region whose earlier entries are still resident in the set
//! contributes all of them to a lookup, which returns their union. Capacity
//! pressure is resolved by LRU within each set.

use crate::common::{AccessPattern, RegionBase};

use super::{InsertOutcome, PatternTable};

/// Long-term store of learned per-region access patterns.
pub struct PatternHistoryTable {
    table: PatternTable,
}

impl PatternHistoryTable {
    /// Creates a pattern history table of `capacity` entries in `ways`-wide
    /// sets.
    pub fn new(capacity: usize, ways: usize, region_bytes: u64) -> Self {
        Self {
            table: PatternTable::new(capacity, ways, region_bytes),
        }
    }

    /// True when any way of the key's set holds the key.
    pub fn contains(&self, key: RegionBase) -> bool {
        self.table.contains(key)
    }

    /// Records a completed generation's pattern. A full set LRU-evicts; the
    /// outcome classifies the displaced pattern for diagnostics.
    pub fn insert(&mut self, key: RegionBase, pattern: AccessPattern) -> InsertOutcome {
        self.table.insert(key, pattern)
    }

    /// Union of every resident pattern learned for this region, refreshing
    /// the recency of each contributing way. Empty on a miss.
    pub fn lookup(&mut self, key: RegionBase) -> AccessPattern {
        self.table.lookup_merged(key)
    }

    /// Lookup without touching recency.
    pub fn peek(&self, key: RegionBase) -> AccessPattern {
        self.table.peek_merged(key)
    }

    /// Number of valid entries across the whole table.
    pub fn occupancy(&self) -> usize {
        self.table.occupancy()
    }
}
