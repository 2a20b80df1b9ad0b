//! Filter Table.
//!
//! The filter table keeps regions that have been touched in exactly one
//! block during the current generation, filtering single-use regions out of
//! the accumulation table. An entry stays here for as long as the region
//! keeps hitting the same block; the first access to a different block
//! removes the entry and hands the merged pattern to the caller for
//! promotion.

use crate::common::{AccessPattern, RegionBase};

use super::{InsertOutcome, PatternTable};

/// Result of updating a tracked first-touch region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterUpdate {
    /// The key is not tracked here.
    Absent,
    /// The already-recorded block was touched again; the entry is untouched.
    SameBlock,
    /// A new block was touched. The entry has been removed and the merged
    /// pattern is handed back for insertion into the accumulation table.
    Promote(AccessPattern),
}

/// Table of regions seen exactly once in the current generation.
pub struct FilterTable {
    table: PatternTable,
}

impl FilterTable {
    /// Creates a filter table of `capacity` directly-mapped entries.
    pub fn new(capacity: usize, region_bytes: u64) -> Self {
        Self {
            table: PatternTable::new(capacity, 1, region_bytes),
        }
    }

    /// Presence check without touching recency.
    pub fn contains(&self, key: RegionBase) -> bool {
        self.table.contains(key)
    }

    /// Copy of the tracked pattern, if any.
    pub fn pattern(&self, key: RegionBase) -> Option<AccessPattern> {
        self.table.peek(key)
    }

    /// Records a first touch. The caller has verified the key is absent
    /// from the whole active generation table; a capacity conflict silently
    /// drops the previously tracked region.
    pub fn insert(&mut self, key: RegionBase, pattern: AccessPattern) -> InsertOutcome {
        self.table.insert(key, pattern)
    }

    /// Applies one access to a tracked region.
    pub fn update(&mut self, key: RegionBase, bit: AccessPattern) -> FilterUpdate {
        let current = match self.table.check(key) {
            Some(stored) => *stored,
            None => return FilterUpdate::Absent,
        };

        if current.contains(bit) {
            return FilterUpdate::SameBlock;
        }

        self.table.invalidate(key);
        FilterUpdate::Promote(current.merged(bit))
    }

    /// Drops the entry for `key`, if any. Ends the region's generation on
    /// the filter side.
    pub fn invalidate(&mut self, key: RegionBase) {
        self.table.invalidate(key);
    }
}
