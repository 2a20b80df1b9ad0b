//! Prefetcher statistics collection and reporting.
//!
//! This module tracks diagnostic events for the prefetcher. It provides:
//! 1. **Generation tracking:** Filter/accumulation inserts, promotions,
//!    transfers, and capacity evictions.
//! 2. **Pattern history:** Lookups, hits, inserts, and eviction
//!    classification under capacity pressure.
//! 3. **Prefetching:** Trigger accesses and issued prefetches.
//! 4. **Misconfiguration:** Out-of-range pattern-bit indices.
//!
//! Every anomaly the engine swallows on the hot path surfaces here; the
//! prefetcher itself never fails an operation.

/// Event counters for one prefetcher instance.
#[derive(Clone, Debug, Default)]
pub struct SmsStats {
    /// First-touch regions inserted into the filter table.
    pub ft_inserts: u64,
    /// Filter-table accesses that re-touched the recorded block.
    pub ft_same_block_hits: u64,
    /// Filter-table entries promoted to the accumulation table.
    pub ft_promotions: u64,
    /// Tracked first-touch regions displaced by a capacity conflict.
    pub ft_evictions: u64,

    /// Entries created in the accumulation table (promotions).
    pub at_inserts: u64,
    /// Accumulation-table updates that set a new block bit.
    pub at_updates: u64,
    /// Accumulation-table accesses that re-touched a recorded block.
    pub at_same_block_hits: u64,
    /// Tracked accumulating regions displaced by a capacity conflict.
    pub at_evictions: u64,
    /// Generation ends that found an accumulation entry to transfer.
    pub at_transfers: u64,
    /// Generation ends that found no accumulation entry (filter only).
    pub at_transfer_failures: u64,

    /// Patterns written through to the pattern history table.
    pub pht_inserts: u64,
    /// Trigger-access lookups in the pattern history table.
    pub pht_lookups: u64,
    /// Trigger-access lookups that found at least one resident pattern.
    pub pht_hits: u64,
    /// Pattern-history inserts that filled an invalid way.
    pub pht_evictions_none: u64,
    /// Pattern-history inserts that displaced an identical pattern.
    pub pht_evictions_same: u64,
    /// Pattern-history inserts that displaced a different pattern.
    pub pht_evictions_different: u64,

    /// Accesses that started a new generation.
    pub trigger_accesses: u64,
    /// Prefetch inserts injected into the data cache.
    pub prefetches_issued: u64,
    /// Generations terminated by a data-cache eviction.
    pub generations_ended: u64,
    /// Accesses whose block index exceeded the pattern width
    /// (region/line-size misconfiguration); the update was dropped.
    pub pattern_index_overflows: u64,
}

impl SmsStats {
    /// Prints all counters to stdout, grouped by concern.
    pub fn print(&self) {
        println!("==========================================================");
        println!("SMS PREFETCHER STATISTICS");
        println!("==========================================================");
        println!("[Generation tracking]");
        println!("  ft.inserts             {}", self.ft_inserts);
        println!("  ft.same_block_hits     {}", self.ft_same_block_hits);
        println!("  ft.promotions          {}", self.ft_promotions);
        println!("  ft.evictions           {}", self.ft_evictions);
        println!("  at.inserts             {}", self.at_inserts);
        println!("  at.updates             {}", self.at_updates);
        println!("  at.same_block_hits     {}", self.at_same_block_hits);
        println!("  at.evictions           {}", self.at_evictions);
        println!("  at.transfers           {}", self.at_transfers);
        println!("  at.transfer_failures   {}", self.at_transfer_failures);
        println!("  generations_ended      {}", self.generations_ended);
        println!("----------------------------------------------------------");
        println!("[Pattern history]");
        println!("  pht.inserts            {}", self.pht_inserts);
        println!("  pht.lookups            {}", self.pht_lookups);
        println!("  pht.hits               {}", self.pht_hits);
        println!("  pht.evictions.none     {}", self.pht_evictions_none);
        println!("  pht.evictions.same     {}", self.pht_evictions_same);
        println!("  pht.evictions.diff     {}", self.pht_evictions_different);
        println!("----------------------------------------------------------");
        println!("[Prefetch]");
        println!("  triggers               {}", self.trigger_accesses);
        println!("  prefetches_issued      {}", self.prefetches_issued);
        let per_trigger = if self.trigger_accesses > 0 {
            self.prefetches_issued as f64 / self.trigger_accesses as f64
        } else {
            0.0
        };
        println!("  prefetches_per_trigger {:.2}", per_trigger);
        println!("  pattern_idx_overflows  {}", self.pattern_index_overflows);
        println!("==========================================================");
    }
}
