//! Host-side data-cache interface and reference model.
//!
//! The engine never owns the L1 data cache; it observes the host's access
//! and insert events and injects prefetch inserts back through the
//! [`DataCache`] trait. [`DcacheSim`] is a reference implementation for
//! hosts that do not bring their own model, and for tests.

/// Reference set-associative data-cache model.
pub mod dcache;

pub use dcache::{DcacheSim, DemandOutcome};

use crate::common::LineAddr;

/// The prefetch engine's view of the host L1 data cache.
pub trait DataCache {
    /// Data-cache line size in bytes.
    fn line_bytes(&self) -> u64;

    /// Installs a hardware-prefetched line.
    ///
    /// A line that is already resident is left untouched and nothing is
    /// displaced. Otherwise the line is installed, marked as prefetched for
    /// host-side accounting, and the address of any line displaced to make
    /// room is returned so the caller can propagate the eviction.
    fn insert_prefetch(&mut self, line_addr: LineAddr) -> Option<LineAddr>;
}
