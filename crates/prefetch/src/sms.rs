//! Spatial memory streaming engine.
//!
//! The engine observes every L1 data-cache access and insert, learns which
//! blocks of a 2 KiB spatial region get touched while the region is live in
//! the cache (a *generation*), and replays the learned pattern as a burst
//! of prefetch inserts the next time the region is touched cold.
//!
//! A region's generation flows through the tables like this:
//!
//! - A *trigger access* (region in neither active table) looks the region
//!   up in the pattern history table, streams any learned pattern into the
//!   data cache, and starts tracking the region in the filter table.
//! - The first access to a second block promotes the region to the
//!   accumulation table, which keeps ORing in new block bits.
//! - When the data cache evicts any line of the region, the generation
//!   ends: an accumulated pattern is written through to the pattern history
//!   table and the active entry is dropped.
//!
//! Both entry points run synchronously on the host's thread. A prefetch
//! insert may itself evict a tracked region's line; that eviction is fed
//! straight back through the insert handler before the trigger access
//! finishes, and never emits further prefetches.

use crate::common::{AccessPattern, LineAddr, RegionBase, RegionGeometry};
use crate::config::SmsConfig;
use crate::host::DataCache;
use crate::stats::SmsStats;
use crate::tables::{
    AccumulationTable, AccumulationUpdate, FilterTable, FilterUpdate, InsertOutcome,
    PatternHistoryTable,
};

/// One spatial-memory-streaming prefetcher instance.
///
/// Serves the accesses of a single core; multi-core hosts instantiate one
/// engine per core. The engine owns its three tables and its statistics.
pub struct Sms {
    geometry: RegionGeometry,
    filter: FilterTable,
    accumulation: AccumulationTable,
    history: PatternHistoryTable,
    /// Event counters; reset by replacing with `SmsStats::default()`.
    pub stats: SmsStats,
    proc_id: usize,
    trace: bool,
}

impl Sms {
    /// Constructs an engine from `config`. Call once at host startup.
    pub fn new(config: &SmsConfig) -> Self {
        let geometry = RegionGeometry::new(config.region_bytes, config.dcache_line_bytes);

        Self {
            filter: FilterTable::new(config.filter_entries, geometry.region_bytes()),
            accumulation: AccumulationTable::new(
                config.accumulation_entries,
                geometry.region_bytes(),
            ),
            history: PatternHistoryTable::new(
                config.pht_entries,
                config.pht_ways,
                geometry.region_bytes(),
            ),
            stats: SmsStats::default(),
            proc_id: config.proc_id,
            trace: config.trace,
            geometry,
        }
    }

    /// The engine's address-decomposition parameters.
    pub fn geometry(&self) -> &RegionGeometry {
        &self.geometry
    }

    /// Handles one demand access to the L1 data cache.
    ///
    /// Routes the access to the accumulation or filter table when the
    /// region's generation is already active; otherwise treats it as a
    /// trigger access, streaming any learned pattern through `dcache` and
    /// starting a fresh generation in the filter table.
    ///
    /// `pc` is the program counter of the accessing instruction. The tables
    /// are keyed by region base, so it only feeds trace output here; it is
    /// kept in the signature for hosts experimenting with code-site keying.
    pub fn on_dcache_access(&mut self, dcache: &mut dyn DataCache, pc: u64, line_addr: LineAddr) {
        let key = self.geometry.region_base(line_addr);
        let bit = match self.geometry.pattern_bit(line_addr) {
            Some(bit) => bit,
            None => {
                self.stats.pattern_index_overflows += 1;
                return;
            }
        };

        match self.accumulation.update(key, bit) {
            AccumulationUpdate::Extended => {
                self.stats.at_updates += 1;
            }
            AccumulationUpdate::SameBlock => {
                self.stats.at_same_block_hits += 1;
            }
            AccumulationUpdate::Absent => match self.filter.update(key, bit) {
                FilterUpdate::Promote(merged) => {
                    self.stats.ft_promotions += 1;
                    self.stats.at_inserts += 1;
                    if self.accumulation.insert(key, merged) != InsertOutcome::NoEviction {
                        self.stats.at_evictions += 1;
                    }
                    if self.trace {
                        eprintln!(
                            "SMS{} AT  promote region={:#x} pattern={:#010x}",
                            self.proc_id, key.0, merged.0
                        );
                    }
                }
                FilterUpdate::SameBlock => {
                    self.stats.ft_same_block_hits += 1;
                }
                FilterUpdate::Absent => self.trigger_access(dcache, pc, key, bit),
            },
        }
    }

    /// Handles one insert into the L1 data cache.
    ///
    /// `repl_line_addr` is the line the insert displaced, or `None` when the
    /// fill used an empty way. An eviction that hits a region with an active
    /// generation ends that generation: the accumulated pattern (if the
    /// region made it past the filter table) is written through to the
    /// pattern history table, and the active entry is dropped.
    pub fn on_dcache_insert(&mut self, line_addr: LineAddr, repl_line_addr: Option<LineAddr>) {
        let evicted = match repl_line_addr {
            Some(addr) => addr,
            None => return,
        };

        let key = self.geometry.region_base(evicted);
        if !self.generation_active(key) {
            return;
        }

        if self.trace {
            eprintln!(
                "SMS{} GEN end region={:#x} (insert {:#x} evicted {:#x})",
                self.proc_id, key.0, line_addr.0, evicted.0
            );
        }
        self.end_generation(key);
    }

    /// True while the region has an active generation, i.e. is tracked in
    /// the filter or accumulation table.
    pub fn generation_active(&self, key: RegionBase) -> bool {
        self.accumulation.contains(key) || self.filter.contains(key)
    }

    /// Pattern tracked for `key` in the filter table, if any.
    pub fn filter_pattern(&self, key: RegionBase) -> Option<AccessPattern> {
        self.filter.pattern(key)
    }

    /// Pattern accumulated for `key`, if the region is past the filter.
    pub fn accumulation_pattern(&self, key: RegionBase) -> Option<AccessPattern> {
        self.accumulation.pattern(key)
    }

    /// Union of the patterns learned for `key` across resident generations.
    pub fn history_pattern(&self, key: RegionBase) -> AccessPattern {
        self.history.peek(key)
    }

    /// Starts a new generation for `key`, streaming any learned pattern
    /// into the data cache first.
    fn trigger_access(
        &mut self,
        dcache: &mut dyn DataCache,
        pc: u64,
        key: RegionBase,
        first_bit: AccessPattern,
    ) {
        self.stats.trigger_accesses += 1;
        self.stats.pht_lookups += 1;

        let learned = self.history.lookup(key);
        if !learned.is_empty() {
            self.stats.pht_hits += 1;
            if self.trace {
                eprintln!(
                    "SMS{} PHT hit region={:#x} pc={:#x} pattern={:#010x}",
                    self.proc_id, key.0, pc, learned.0
                );
            }
            self.stream_region(dcache, key, learned);
        }

        // Track the new generation whether or not the lookup hit. The
        // filter insert comes after the prefetch burst so that evictions
        // caused by the burst cannot terminate the generation being born.
        self.stats.ft_inserts += 1;
        if self.filter.insert(key, first_bit) != InsertOutcome::NoEviction {
            self.stats.ft_evictions += 1;
        }
    }

    /// Streams every block of `learned` into the data cache, in ascending
    /// block order.
    ///
    /// A prefetch insert that displaces a line of a tracked region feeds
    /// the displacement straight back through the insert handler, the same
    /// path a demand-miss eviction takes. That nested call only updates
    /// tables; it cannot recurse into another prefetch burst.
    fn stream_region(&mut self, dcache: &mut dyn DataCache, base: RegionBase, learned: AccessPattern) {
        for block in learned.blocks() {
            let target = self.geometry.block_addr(base, block);
            self.stats.prefetches_issued += 1;
            if self.trace {
                eprintln!(
                    "SMS{} PF  insert line={:#x} (region={:#x} block={})",
                    self.proc_id, target.0, base.0, block
                );
            }
            let displaced = dcache.insert_prefetch(target);
            self.on_dcache_insert(target, displaced);
        }
    }

    /// Ends the generation of `key`: writes an accumulated pattern through
    /// to the pattern history table, or drops the filter entry when the
    /// region never made it past a single block.
    fn end_generation(&mut self, key: RegionBase) {
        self.stats.generations_ended += 1;

        match self.accumulation.take(key) {
            Some(pattern) => {
                self.stats.at_transfers += 1;
                self.record_history(key, pattern);
            }
            None => {
                self.stats.at_transfer_failures += 1;
                self.filter.invalidate(key);
            }
        }
    }

    /// Writes one completed generation's pattern into the pattern history
    /// table, classifying any displacement for diagnostics.
    fn record_history(&mut self, key: RegionBase, pattern: AccessPattern) {
        self.stats.pht_inserts += 1;
        match self.history.insert(key, pattern) {
            InsertOutcome::NoEviction => self.stats.pht_evictions_none += 1,
            InsertOutcome::EvictedSame => self.stats.pht_evictions_same += 1,
            InsertOutcome::EvictedDifferent => self.stats.pht_evictions_different += 1,
        }
    }
}
