//! Reference L1 data-cache model.
//!
//! A tag-only set-associative cache with LRU replacement. It models just
//! enough of a data cache to drive the prefetcher: demand accesses report
//! the line displaced by a miss fill, and lines installed by the prefetcher
//! carry a mark that the first demand hit consumes, so the host can count
//! useful prefetches.

use crate::common::LineAddr;
use crate::config::DcacheConfig;

use super::DataCache;

/// One line of the model: tag, validity, prefetch mark, recency stamp.
#[derive(Clone, Default)]
struct DcacheLine {
    tag: u64,
    valid: bool,
    prefetched: bool,
    last_used: u64,
}

/// Outcome of a demand access against the reference model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemandOutcome {
    /// The line was resident.
    pub hit: bool,
    /// Line displaced by the fill on a miss.
    pub evicted: Option<LineAddr>,
    /// The hit line had been installed by the prefetcher and is now claimed.
    pub prefetched_hit: bool,
}

/// Set-associative, LRU, tag-only data-cache model.
pub struct DcacheSim {
    lines: Vec<DcacheLine>, // index = (set * ways) + way
    num_sets: usize,
    ways: usize,
    line_bytes: u64,
    access_counter: u64,
}

impl DcacheSim {
    /// Creates a model from the cache geometry in `config`. Zero sizes fall
    /// back to a 32 KiB, 64 B-line, 8-way cache.
    pub fn new(config: &DcacheConfig) -> Self {
        let safe_ways = if config.ways == 0 { 8 } else { config.ways };
        let safe_line = if config.line_bytes == 0 {
            64
        } else {
            config.line_bytes
        };
        let safe_size = if config.size_bytes == 0 {
            32 * 1024
        } else {
            config.size_bytes
        };

        let num_lines = safe_size as u64 / safe_line;
        let num_sets = (num_lines as usize / safe_ways).max(1);

        Self {
            lines: vec![DcacheLine::default(); num_sets * safe_ways],
            num_sets,
            ways: safe_ways,
            line_bytes: safe_line,
            access_counter: 0,
        }
    }

    fn set_and_tag(&self, addr: LineAddr) -> (usize, u64) {
        let set = ((addr.0 / self.line_bytes) as usize) % self.num_sets;
        let tag = addr.0 / (self.line_bytes * self.num_sets as u64);
        (set, tag)
    }

    /// Reconstructs the aligned address of a resident line.
    fn line_addr(&self, set: usize, tag: u64) -> LineAddr {
        LineAddr((tag * self.num_sets as u64 + set as u64) * self.line_bytes)
    }

    /// True when the line holding `addr` is resident.
    pub fn contains(&self, addr: LineAddr) -> bool {
        let (set, tag) = self.set_and_tag(addr);
        let base_idx = set * self.ways;

        (0..self.ways).any(|i| {
            let line = &self.lines[base_idx + i];
            line.valid && line.tag == tag
        })
    }

    /// Performs a demand access, filling the line on a miss.
    pub fn access(&mut self, addr: LineAddr) -> DemandOutcome {
        let (set, tag) = self.set_and_tag(addr);
        let base_idx = set * self.ways;

        self.access_counter += 1;

        for i in 0..self.ways {
            let line = &mut self.lines[base_idx + i];
            if line.valid && line.tag == tag {
                line.last_used = self.access_counter;
                let was_prefetched = line.prefetched;
                line.prefetched = false;
                return DemandOutcome {
                    hit: true,
                    evicted: None,
                    prefetched_hit: was_prefetched,
                };
            }
        }

        let evicted = self.install(set, tag, false);
        DemandOutcome {
            hit: false,
            evicted,
            prefetched_hit: false,
        }
    }

    /// Installs a line in `set`, filling an invalid way or displacing the
    /// LRU way. Returns the displaced line's address.
    fn install(&mut self, set: usize, tag: u64, prefetched: bool) -> Option<LineAddr> {
        let base_idx = set * self.ways;

        let mut victim = 0;
        let mut min_stamp = u64::MAX;
        let mut invalid = None;
        for i in 0..self.ways {
            let line = &self.lines[base_idx + i];
            if !line.valid {
                invalid = Some(i);
                break;
            }
            if line.last_used < min_stamp {
                min_stamp = line.last_used;
                victim = i;
            }
        }

        let (way, evicted) = match invalid {
            Some(i) => (i, None),
            None => (victim, Some(self.line_addr(set, self.lines[base_idx + victim].tag))),
        };

        self.lines[base_idx + way] = DcacheLine {
            tag,
            valid: true,
            prefetched,
            last_used: self.access_counter,
        };

        evicted
    }
}

impl DataCache for DcacheSim {
    fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    fn insert_prefetch(&mut self, line_addr: LineAddr) -> Option<LineAddr> {
        if self.contains(line_addr) {
            return None;
        }

        let (set, tag) = self.set_and_tag(line_addr);
        self.access_counter += 1;
        self.install(set, tag, true)
    }
}
