//! Spatial-region address decomposition.
//!
//! A spatial region is a power-of-two-sized slice of memory (2 KiB by
//! default) covering a run of data-cache lines. The geometry splits a line
//! address into the region base (the table key) and a block index inside the
//! region (the access-pattern bit).

use super::addr::{AccessPattern, LineAddr, RegionBase};

/// Address decomposition parameters at spatial-region granularity.
///
/// Holds the region size, the data-cache line size, and the derived masks.
/// Sizes that are zero or not powers of two fall back to the 2 KiB / 64 B
/// defaults rather than producing broken masks.
#[derive(Clone, Debug)]
pub struct RegionGeometry {
    region_bytes: u64,
    line_bytes: u64,
    offset_mask: u64,
    pattern_limit: u64,
}

impl RegionGeometry {
    /// Creates a geometry for `region_bytes` regions of `line_bytes` blocks.
    pub fn new(region_bytes: u64, line_bytes: u64) -> Self {
        let safe_region = if region_bytes.is_power_of_two() {
            region_bytes
        } else {
            2048
        };
        let safe_line = if line_bytes.is_power_of_two() && line_bytes <= safe_region {
            line_bytes
        } else {
            64
        };

        let blocks = safe_region / safe_line;

        Self {
            region_bytes: safe_region,
            line_bytes: safe_line,
            offset_mask: safe_region - 1,
            pattern_limit: blocks.min(AccessPattern::BITS as u64),
        }
    }

    /// Region size in bytes.
    #[inline(always)]
    pub fn region_bytes(&self) -> u64 {
        self.region_bytes
    }

    /// Data-cache line size in bytes.
    #[inline(always)]
    pub fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Number of data-cache blocks per region.
    #[inline(always)]
    pub fn blocks_per_region(&self) -> u64 {
        self.region_bytes / self.line_bytes
    }

    /// Base address of the region containing `addr`.
    #[inline(always)]
    pub fn region_base(&self, addr: LineAddr) -> RegionBase {
        RegionBase(addr.0 & !self.offset_mask)
    }

    /// Index of the block `addr` falls in, counted from the region base.
    #[inline(always)]
    pub fn block_index(&self, addr: LineAddr) -> u64 {
        (addr.0 & self.offset_mask) / self.line_bytes
    }

    /// Single-block pattern for `addr`.
    ///
    /// Returns `None` when the block index falls outside the representable
    /// pattern width, which indicates a misconfigured region/line ratio. The
    /// caller counts the event and drops the update.
    pub fn pattern_bit(&self, addr: LineAddr) -> Option<AccessPattern> {
        let index = self.block_index(addr);
        if index < self.pattern_limit {
            Some(AccessPattern::single(index))
        } else {
            None
        }
    }

    /// Address of block `block` of the region at `base`.
    #[inline(always)]
    pub fn block_addr(&self, base: RegionBase, block: u32) -> LineAddr {
        LineAddr(base.0 + block as u64 * self.line_bytes)
    }
}
