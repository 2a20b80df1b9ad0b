//! Engine Tests.
//!
//! Exercises the assembled prefetcher through its two entry points: the
//! generation lifecycle across filter, accumulation, and pattern history
//! tables, trigger-access streaming, and generation termination on
//! data-cache evictions (including evictions caused by the engine's own
//! prefetch inserts).

use sms_core::common::{AccessPattern, LineAddr, RegionBase};
use sms_core::{DcacheConfig, DcacheSim, Sms, SmsConfig};

use crate::common::block_addr;
use crate::common::mocks::RecordingDcache;

// ──────────────────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────────────────

const PC: u64 = 0x8000_1000;

fn default_engine() -> Sms {
    Sms::new(&SmsConfig::default())
}

/// Runs a region through a full generation touching the given blocks, then
/// ends it with an eviction of the region's first touched block.
fn complete_generation(sms: &mut Sms, dcache: &mut RecordingDcache, base: u64, blocks: &[u64]) {
    for &block in blocks {
        sms.on_dcache_access(dcache, PC, block_addr(base, block));
    }
    sms.on_dcache_insert(
        LineAddr::new(0xDEAD_0000),
        Some(block_addr(base, blocks[0])),
    );
}

// ══════════════════════════════════════════════════════════
// 1. First touch and repeat access
// ══════════════════════════════════════════════════════════

/// The first access to a cold region starts a generation in the filter
/// table with that block's bit; nothing is prefetched.
#[test]
fn first_touch_enters_filter() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x1000);

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));

    assert_eq!(sms.filter_pattern(key), Some(AccessPattern(0x2)));
    assert_eq!(sms.accumulation_pattern(key), None);
    assert!(sms.history_pattern(key).is_empty());
    assert!(dcache.issued.is_empty(), "Cold region must not prefetch");
    assert_eq!(sms.stats.trigger_accesses, 1);
    assert_eq!(sms.stats.ft_inserts, 1);
}

/// Repeating the same access is idempotent: after the first invocation all
/// tables are fixed.
#[test]
fn repeat_access_is_idempotent() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x1000);

    for _ in 0..3 {
        sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));
    }

    assert_eq!(sms.filter_pattern(key), Some(AccessPattern(0x2)));
    assert_eq!(sms.accumulation_pattern(key), None);
    assert_eq!(sms.stats.trigger_accesses, 1);
    assert_eq!(sms.stats.ft_same_block_hits, 2);
}

// ══════════════════════════════════════════════════════════
// 2. Promotion and accumulation
// ══════════════════════════════════════════════════════════

/// A second distinct block promotes the region to the accumulation table
/// with the merged pattern; the filter entry is gone.
#[test]
fn second_block_promotes_to_accumulation() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x1000);

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040)); // block 1
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x10C0)); // block 3

    assert_eq!(sms.filter_pattern(key), None);
    assert_eq!(sms.accumulation_pattern(key), Some(AccessPattern(0xA)));
    assert_eq!(sms.stats.ft_promotions, 1);
    assert!(sms.generation_active(key));
}

/// The accumulated pattern is the OR of every touched block, and a region
/// is never tracked by both active tables at once.
#[test]
fn accumulation_is_or_of_touched_blocks() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x4000);
    let blocks = [5u64, 0, 31, 5, 7];

    for &block in &blocks {
        sms.on_dcache_access(&mut dcache, PC, block_addr(0x4000, block));
        let in_filter = sms.filter_pattern(key).is_some();
        let in_accumulation = sms.accumulation_pattern(key).is_some();
        assert!(
            !(in_filter && in_accumulation),
            "A region must be in at most one active table"
        );
    }

    let expected = AccessPattern(1 << 5 | 1 << 0 | 1 << 31 | 1 << 7);
    assert_eq!(sms.accumulation_pattern(key), Some(expected));
    assert_eq!(sms.stats.at_same_block_hits, 1); // the repeated block 5
}

/// Region boundary blocks land on bit 0 and bit 31.
#[test]
fn boundary_blocks_set_edge_bits() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x2000);

    sms.on_dcache_access(&mut dcache, PC, block_addr(0x2000, 0));
    sms.on_dcache_access(&mut dcache, PC, block_addr(0x2000, 31));

    assert_eq!(
        sms.accumulation_pattern(key),
        Some(AccessPattern(0x8000_0001))
    );
}

// ══════════════════════════════════════════════════════════
// 3. Generation termination
// ══════════════════════════════════════════════════════════

/// Evicting any line of an accumulating region writes the pattern through
/// to the history table and drops the active entry.
#[test]
fn eviction_writes_pattern_through() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x1000);

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x10C0));

    // Some unrelated fill at 0x5000 displaces line 0x1080 of this region.
    sms.on_dcache_insert(LineAddr::new(0x5000), Some(LineAddr::new(0x1080)));

    assert!(!sms.generation_active(key));
    assert_eq!(sms.accumulation_pattern(key), None);
    assert_eq!(sms.history_pattern(key), AccessPattern(0xA));
    assert_eq!(sms.stats.at_transfers, 1);
    assert_eq!(sms.stats.pht_inserts, 1);
    assert_eq!(sms.stats.generations_ended, 1);
}

/// A region still in the filter table at generation end is dropped without
/// touching the history table.
#[test]
fn filter_only_generation_leaves_no_history() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x1000);

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));
    sms.on_dcache_insert(LineAddr::new(0x5000), Some(LineAddr::new(0x1040)));

    assert!(!sms.generation_active(key));
    assert!(sms.history_pattern(key).is_empty());
    assert_eq!(sms.stats.at_transfer_failures, 1);
    assert_eq!(sms.stats.at_transfers, 0);
}

/// An insert that displaced nothing is a no-op.
#[test]
fn insert_without_eviction_is_noop() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));
    sms.on_dcache_insert(LineAddr::new(0x5000), None);

    assert!(sms.generation_active(RegionBase::new(0x1000)));
    assert_eq!(sms.stats.generations_ended, 0);
}

/// An eviction in a region with no active generation changes nothing.
#[test]
fn eviction_of_untracked_region_is_noop() {
    let mut sms = default_engine();

    sms.on_dcache_insert(LineAddr::new(0x5000), Some(LineAddr::new(0x9040)));

    assert_eq!(sms.stats.generations_ended, 0);
    assert_eq!(sms.stats.at_transfer_failures, 0);
}

// ══════════════════════════════════════════════════════════
// 4. Trigger streaming
// ══════════════════════════════════════════════════════════

/// A trigger access to a region with history streams the learned blocks in
/// ascending order, then begins tracking the new generation in the filter.
#[test]
fn trigger_streams_learned_pattern() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let key = RegionBase::new(0x1000);

    // Learn pattern 0xA (blocks 1 and 3), then end the generation.
    complete_generation(&mut sms, &mut dcache, 0x1000, &[1, 3]);
    assert_eq!(sms.history_pattern(key), AccessPattern(0xA));

    // Re-touch block 1 cold: both learned blocks stream back.
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));

    assert_eq!(dcache.issued, vec![0x1040, 0x1100]);
    assert_eq!(sms.filter_pattern(key), Some(AccessPattern(0x2)));
    assert_eq!(sms.stats.prefetches_issued, 2);
    assert_eq!(sms.stats.pht_hits, 1);
}

/// Patterns from several resident generations of one region merge at the
/// trigger: {0,1} then {2,3} replay as blocks 0 through 3.
#[test]
fn trigger_merges_resident_generations() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();

    complete_generation(&mut sms, &mut dcache, 0x1000, &[0, 1]);
    // The second generation's trigger streams the first pattern; ignore it.
    complete_generation(&mut sms, &mut dcache, 0x1000, &[2, 3]);
    dcache.issued.clear();

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1000));

    assert_eq!(dcache.issued, vec![0x1000, 0x1040, 0x1080, 0x10C0]);
    assert_eq!(
        sms.history_pattern(RegionBase::new(0x1000)),
        AccessPattern(0xF)
    );
}

/// An eviction caused by the engine's own prefetch insert terminates the
/// displaced region's generation before the trigger finishes.
#[test]
fn prefetch_eviction_ends_other_generation() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    let learner = RegionBase::new(0x1000);
    let victim = RegionBase::new(0x2000);

    // Region 0x1000 learns blocks {1, 3}.
    complete_generation(&mut sms, &mut dcache, 0x1000, &[1, 3]);

    // Region 0x2000 is mid-generation with blocks {0, 1}.
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x2000));
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x2040));
    assert_eq!(sms.accumulation_pattern(victim), Some(AccessPattern(0x3)));

    // Trigger 0x1000 again; the first streamed insert displaces a line of
    // region 0x2000.
    let mut dcache = RecordingDcache::with_evictions(&[Some(0x2040), None]);
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x1040));

    assert_eq!(dcache.issued, vec![0x1040, 0x1100]);
    assert!(!sms.generation_active(victim));
    assert_eq!(sms.history_pattern(victim), AccessPattern(0x3));
    // The trigger's own generation still starts cleanly afterwards.
    assert_eq!(sms.filter_pattern(learner), Some(AccessPattern(0x2)));
}

// ══════════════════════════════════════════════════════════
// 5. Capacity behavior
// ══════════════════════════════════════════════════════════

/// A filter-table set conflict drops the older first-touch region; its
/// next access restarts tracking as a fresh trigger.
#[test]
fn filter_conflict_restarts_tracking() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    // With 32 filter sets over 2 KiB regions, bases 0x0 and 0x10000 collide.
    let old = RegionBase::new(0x0);

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x0));
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x10040));
    assert_eq!(sms.stats.ft_evictions, 1);
    assert!(!sms.generation_active(old));

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x0));
    assert_eq!(sms.filter_pattern(old), Some(AccessPattern(0x1)));
    assert_eq!(sms.stats.trigger_accesses, 3);
}

/// An accumulation-table set conflict silently drops the older region's
/// partial pattern; its history is never written.
#[test]
fn accumulation_conflict_drops_older_region() {
    let mut sms = default_engine();
    let mut dcache = RecordingDcache::new();
    // With 64 accumulation sets over 2 KiB regions, bases 0x0 and 0x20000
    // collide.
    let old = RegionBase::new(0x0);
    let new = RegionBase::new(0x20000);

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x0));
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x40));
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x20000));
    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(0x20040));

    assert_eq!(sms.stats.at_evictions, 1);
    assert!(!sms.generation_active(old));
    assert_eq!(sms.accumulation_pattern(new), Some(AccessPattern(0x3)));
    assert!(
        sms.history_pattern(old).is_empty(),
        "A displaced partial pattern is discarded, not written through"
    );
}

// ══════════════════════════════════════════════════════════
// 6. Misconfiguration
// ══════════════════════════════════════════════════════════

/// A block index beyond the pattern width drops the access and counts the
/// misconfiguration; no table is touched.
#[test]
fn oversized_block_index_is_counted_and_dropped() {
    // 4 KiB regions of 32 B lines: blocks 64..127 are unrepresentable.
    let config = SmsConfig {
        region_bytes: 4096,
        dcache_line_bytes: 32,
        ..SmsConfig::default()
    };
    let mut sms = Sms::new(&config);
    let mut dcache = RecordingDcache::new();

    sms.on_dcache_access(&mut dcache, PC, LineAddr::new(64 * 32));

    assert_eq!(sms.stats.pattern_index_overflows, 1);
    assert!(!sms.generation_active(RegionBase::new(0x0)));
    assert_eq!(sms.stats.trigger_accesses, 0);
}

// ══════════════════════════════════════════════════════════
// 7. End-to-end against the reference cache model
// ══════════════════════════════════════════════════════════

/// Full loop with `DcacheSim`: a region's pattern is learned through real
/// conflict evictions, and the replayed prefetch turns the next access to
/// a learned block into a marked hit.
#[test]
fn learned_pattern_yields_useful_prefetch() {
    // 1 KiB direct-mapped cache of 64 B lines: 16 sets, so addresses 2 KiB
    // apart collide (0x0/0x800, 0x40/0x840, ...).
    let dconfig = DcacheConfig {
        size_bytes: 1024,
        line_bytes: 64,
        ways: 1,
    };
    let mut dcache = DcacheSim::new(&dconfig);
    let mut sms = default_engine();

    let touch = |sms: &mut Sms, dcache: &mut DcacheSim, addr: u64| {
        let addr = LineAddr::new(addr);
        let outcome = dcache.access(addr);
        sms.on_dcache_access(dcache, PC, addr);
        if !outcome.hit {
            sms.on_dcache_insert(addr, outcome.evicted);
        }
        outcome
    };

    // Region 0x0 touches blocks 0 and 1.
    touch(&mut sms, &mut dcache, 0x0);
    touch(&mut sms, &mut dcache, 0x40);

    // Conflicting lines in region 0x800 evict both, ending the generation
    // (the first eviction) and promoting region 0x800 itself.
    touch(&mut sms, &mut dcache, 0x800);
    touch(&mut sms, &mut dcache, 0x840);
    assert_eq!(sms.history_pattern(RegionBase::new(0x0)), AccessPattern(0x3));

    // Cold re-touch of region 0x0: block 0 misses, block 1 streams in. The
    // prefetch displaces 0x840, which ends region 0x800's generation.
    let outcome = touch(&mut sms, &mut dcache, 0x0);
    assert!(!outcome.hit);
    assert_eq!(
        sms.history_pattern(RegionBase::new(0x800)),
        AccessPattern(0x3)
    );

    // The streamed block is now a marked hit.
    let outcome = touch(&mut sms, &mut dcache, 0x40);
    assert!(outcome.hit);
    assert!(outcome.prefetched_hit, "Streamed line must count as useful");
}
