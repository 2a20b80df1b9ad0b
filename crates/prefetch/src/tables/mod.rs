//! Set-associative pattern tables.
//!
//! All three prefetcher tables store `(region base, access pattern)` pairs
//! in a fixed-capacity, set-associative, LRU-replaced structure. The table
//! primitive here is shared; the per-table semantics live in the wrappers:
//!
//! - `FilterTable`: regions touched exactly once this generation.
//! - `AccumulationTable`: regions touched in two or more distinct blocks.
//! - `PatternHistoryTable`: patterns persisted across generations.

/// Accumulation table (regions touched in two or more blocks).
pub mod accumulation;

/// Filter table (regions touched exactly once).
pub mod filter;

/// Pattern history table (patterns persisted across generations).
pub mod pattern_history;

pub use accumulation::{AccumulationTable, AccumulationUpdate};
pub use filter::{FilterTable, FilterUpdate};
pub use pattern_history::PatternHistoryTable;

use crate::common::{AccessPattern, RegionBase};

/// Outcome of a table insert, for capacity diagnostics.
///
/// When an insert displaces a valid entry, the evicted pattern is compared
/// with the inserted one; the distinction is diagnostic only, the displaced
/// pattern itself is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// An invalid way was filled; nothing was displaced.
    NoEviction,
    /// The displaced pattern equalled the inserted one.
    EvictedSame,
    /// The displaced pattern differed from the inserted one.
    EvictedDifferent,
}

/// One way of a pattern-table set.
#[derive(Clone, Default)]
struct TableEntry {
    tag: u64,
    pattern: AccessPattern,
    valid: bool,
    last_used: u64,
}

/// Set-associative table of access patterns keyed by region base.
///
/// Sets are selected from the low bits of the key above the region offset;
/// the remaining high bits form the tag. Recency is a per-entry timestamp
/// from a monotonically increasing access counter; the LRU way of a full
/// set is the victim on insert.
///
/// Inserts are blind: the caller is expected to have checked for the key
/// when uniqueness matters (the filter and accumulation protocols do), and
/// the pattern history table deliberately allows one region to occupy
/// several ways of a set, one per completed generation still resident.
pub struct PatternTable {
    entries: Vec<TableEntry>, // index = (set * ways) + way
    num_sets: usize,
    ways: usize,
    region_shift: u32,
    access_counter: u64,
}

impl PatternTable {
    /// Creates a table of `capacity` entries split into `ways`-wide sets.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total entry count; rounded up to hold one full set.
    /// * `ways` - Associativity; zero falls back to 1 (direct-mapped).
    /// * `region_bytes` - Spatial region size, used to align set indexing
    ///   with region-base keys. Non-power-of-two values fall back to 2 KiB.
    pub fn new(capacity: usize, ways: usize, region_bytes: u64) -> Self {
        let safe_ways = if ways == 0 { 1 } else { ways };
        let safe_region = if region_bytes.is_power_of_two() {
            region_bytes
        } else {
            2048
        };
        let num_sets = (capacity / safe_ways).max(1);

        Self {
            entries: vec![TableEntry::default(); num_sets * safe_ways],
            num_sets,
            ways: safe_ways,
            region_shift: safe_region.trailing_zeros(),
            access_counter: 0,
        }
    }

    fn set_index(&self, key: RegionBase) -> usize {
        ((key.0 >> self.region_shift) as usize) % self.num_sets
    }

    fn tag(&self, key: RegionBase) -> u64 {
        (key.0 >> self.region_shift) / self.num_sets as u64
    }

    /// Looks up `key`, refreshing recency on a hit.
    ///
    /// # Returns
    ///
    /// A mutable reference to the stored pattern when the key is present in
    /// a valid way, `None` otherwise.
    pub fn check(&mut self, key: RegionBase) -> Option<&mut AccessPattern> {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        self.access_counter += 1;
        let stamp = self.access_counter;

        let mut hit = None;
        for i in 0..self.ways {
            let entry = &self.entries[base_idx + i];
            if entry.valid && entry.tag == tag {
                hit = Some(base_idx + i);
                break;
            }
        }

        match hit {
            Some(idx) => {
                self.entries[idx].last_used = stamp;
                Some(&mut self.entries[idx].pattern)
            }
            None => None,
        }
    }

    /// Presence check without touching recency.
    pub fn contains(&self, key: RegionBase) -> bool {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        (0..self.ways).any(|i| {
            let entry = &self.entries[base_idx + i];
            entry.valid && entry.tag == tag
        })
    }

    /// Copy of the first matching pattern, without touching recency.
    pub fn peek(&self, key: RegionBase) -> Option<AccessPattern> {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        (0..self.ways).find_map(|i| {
            let entry = &self.entries[base_idx + i];
            (entry.valid && entry.tag == tag).then_some(entry.pattern)
        })
    }

    /// Inserts `pattern` at `key`, filling an invalid way or displacing the
    /// LRU way of a full set.
    pub fn insert(&mut self, key: RegionBase, pattern: AccessPattern) -> InsertOutcome {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        self.access_counter += 1;

        let mut victim = 0;
        let mut min_stamp = u64::MAX;
        let mut invalid = None;
        for i in 0..self.ways {
            let entry = &self.entries[base_idx + i];
            if !entry.valid {
                invalid = Some(i);
                break;
            }
            if entry.last_used < min_stamp {
                min_stamp = entry.last_used;
                victim = i;
            }
        }

        let (way, outcome) = match invalid {
            Some(i) => (i, InsertOutcome::NoEviction),
            None => {
                let displaced = self.entries[base_idx + victim].pattern;
                let outcome = if displaced == pattern {
                    InsertOutcome::EvictedSame
                } else {
                    InsertOutcome::EvictedDifferent
                };
                (victim, outcome)
            }
        };

        self.entries[base_idx + way] = TableEntry {
            tag,
            pattern,
            valid: true,
            last_used: self.access_counter,
        };

        outcome
    }

    /// Invalidates every way holding `key`. No-op when absent.
    pub fn invalidate(&mut self, key: RegionBase) {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        for i in 0..self.ways {
            let entry = &mut self.entries[base_idx + i];
            if entry.valid && entry.tag == tag {
                entry.valid = false;
            }
        }
    }

    /// Union of the patterns of every valid way holding `key`, refreshing
    /// the recency of each. Empty when the key is absent.
    pub fn lookup_merged(&mut self, key: RegionBase) -> AccessPattern {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        self.access_counter += 1;
        let stamp = self.access_counter;

        let mut merged = AccessPattern::EMPTY;
        for i in 0..self.ways {
            let entry = &mut self.entries[base_idx + i];
            if entry.valid && entry.tag == tag {
                entry.last_used = stamp;
                merged = merged.merged(entry.pattern);
            }
        }
        merged
    }

    /// Union of the patterns of every valid way holding `key`, without
    /// touching recency.
    pub fn peek_merged(&self, key: RegionBase) -> AccessPattern {
        let set = self.set_index(key);
        let tag = self.tag(key);
        let base_idx = set * self.ways;

        let mut merged = AccessPattern::EMPTY;
        for i in 0..self.ways {
            let entry = &self.entries[base_idx + i];
            if entry.valid && entry.tag == tag {
                merged = merged.merged(entry.pattern);
            }
        }
        merged
    }

    /// Number of valid entries across the whole table.
    pub fn occupancy(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }
}
