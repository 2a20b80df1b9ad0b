//! Recording data-cache mock.
//!
//! Records every prefetch insert the engine issues, in order, and replays a
//! scripted sequence of evictions so tests can exercise the nested
//! prefetch-eviction path without a real cache model.

use std::collections::VecDeque;

use sms_core::common::LineAddr;
use sms_core::host::DataCache;

/// Data-cache mock: records prefetch inserts, replays scripted evictions.
pub struct RecordingDcache {
    /// Addresses of every prefetch insert, in issue order.
    pub issued: Vec<u64>,
    /// Evictions to report, one per insert; exhausted entries report none.
    pub evictions: VecDeque<Option<u64>>,
}

impl RecordingDcache {
    /// Mock that never reports an eviction.
    pub fn new() -> Self {
        Self {
            issued: Vec::new(),
            evictions: VecDeque::new(),
        }
    }

    /// Mock that reports `evictions` for the first inserts, in order.
    pub fn with_evictions(evictions: &[Option<u64>]) -> Self {
        Self {
            issued: Vec::new(),
            evictions: evictions.iter().copied().collect(),
        }
    }
}

impl DataCache for RecordingDcache {
    fn line_bytes(&self) -> u64 {
        64
    }

    fn insert_prefetch(&mut self, line_addr: LineAddr) -> Option<LineAddr> {
        self.issued.push(line_addr.val());
        self.evictions.pop_front().flatten().map(LineAddr::new)
    }
}
