//! Configuration for the prefetcher and the reference data-cache model.
//!
//! This module defines all configuration structures used to parameterize
//! the prefetcher. It provides:
//! 1. **Defaults:** Baseline table geometry constants.
//! 2. **Structures:** Config for the engine and the reference data cache.
//!
//! Configuration is supplied as JSON (e.g. from the trace driver's
//! `--config` file) or via `Config::default()`.

use serde::Deserialize;

/// Default configuration constants for the prefetcher.
mod defaults {
    /// Spatial region size in bytes (2 KiB).
    ///
    /// The granularity at which access patterns are learned; each pattern
    /// history entry covers one region of this size.
    pub const REGION_BYTES: u64 = 2048;

    /// L1 data-cache line size in bytes (64 bytes).
    ///
    /// One access-pattern bit covers one line, so a default region holds
    /// 2048 / 64 = 32 pattern bits.
    pub const DCACHE_LINE_BYTES: u64 = 64;

    /// Filter table capacity (32 entries).
    ///
    /// Sized so that tracking first-touch regions stays cheap; a displaced
    /// region simply restarts tracking on its next access.
    pub const FILTER_ENTRIES: usize = 32;

    /// Accumulation table capacity (64 entries).
    pub const ACCUMULATION_ENTRIES: usize = 64;

    /// Pattern history table capacity (16 K entries).
    pub const PHT_ENTRIES: usize = 16384;

    /// Pattern history table associativity (4 ways, 4096 sets).
    pub const PHT_WAYS: usize = 4;

    /// Reference data-cache size in bytes (32 KiB).
    pub const DCACHE_SIZE_BYTES: usize = 32 * 1024;

    /// Reference data-cache associativity (8 ways).
    pub const DCACHE_WAYS: usize = 8;
}

/// Root configuration: engine parameters plus the reference cache geometry.
///
/// # Examples
///
/// Deserializing a partial override from JSON:
///
/// ```
/// use sms_core::config::Config;
///
/// let json = r#"{
///     "sms": { "region_bytes": 4096, "trace": true },
///     "dcache": { "size_bytes": 16384, "ways": 4 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.sms.region_bytes, 4096);
/// assert_eq!(config.sms.pht_ways, 4);
/// assert_eq!(config.dcache.size_bytes, 16384);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Prefetcher engine parameters.
    #[serde(default)]
    pub sms: SmsConfig,

    /// Reference data-cache geometry.
    #[serde(default)]
    pub dcache: DcacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sms: SmsConfig::default(),
            dcache: DcacheConfig::default(),
        }
    }
}

/// Prefetcher engine configuration.
///
/// Every table uses LRU replacement; that is a property of the design, not
/// a knob. Sizes that are zero or not powers of two fall back to defaults
/// at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Spatial region size in bytes (pattern history line size).
    #[serde(default = "SmsConfig::default_region_bytes")]
    pub region_bytes: u64,

    /// L1 data-cache line size in bytes.
    #[serde(default = "SmsConfig::default_dcache_line_bytes")]
    pub dcache_line_bytes: u64,

    /// Filter table capacity.
    #[serde(default = "SmsConfig::default_filter_entries")]
    pub filter_entries: usize,

    /// Accumulation table capacity.
    #[serde(default = "SmsConfig::default_accumulation_entries")]
    pub accumulation_entries: usize,

    /// Pattern history table capacity.
    #[serde(default = "SmsConfig::default_pht_entries")]
    pub pht_entries: usize,

    /// Pattern history table associativity.
    #[serde(default = "SmsConfig::default_pht_ways")]
    pub pht_ways: usize,

    /// Core this instance serves; a label for trace output only.
    #[serde(default)]
    pub proc_id: usize,

    /// Enable engine tracing to stderr.
    #[serde(default)]
    pub trace: bool,
}

impl SmsConfig {
    /// Returns the default spatial region size in bytes.
    fn default_region_bytes() -> u64 {
        defaults::REGION_BYTES
    }

    /// Returns the default data-cache line size in bytes.
    fn default_dcache_line_bytes() -> u64 {
        defaults::DCACHE_LINE_BYTES
    }

    /// Returns the default filter table capacity.
    fn default_filter_entries() -> usize {
        defaults::FILTER_ENTRIES
    }

    /// Returns the default accumulation table capacity.
    fn default_accumulation_entries() -> usize {
        defaults::ACCUMULATION_ENTRIES
    }

    /// Returns the default pattern history table capacity.
    fn default_pht_entries() -> usize {
        defaults::PHT_ENTRIES
    }

    /// Returns the default pattern history table associativity.
    fn default_pht_ways() -> usize {
        defaults::PHT_WAYS
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            region_bytes: defaults::REGION_BYTES,
            dcache_line_bytes: defaults::DCACHE_LINE_BYTES,
            filter_entries: defaults::FILTER_ENTRIES,
            accumulation_entries: defaults::ACCUMULATION_ENTRIES,
            pht_entries: defaults::PHT_ENTRIES,
            pht_ways: defaults::PHT_WAYS,
            proc_id: 0,
            trace: false,
        }
    }
}

/// Reference data-cache model geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct DcacheConfig {
    /// Total cache size in bytes.
    #[serde(default = "DcacheConfig::default_size")]
    pub size_bytes: usize,

    /// Cache line size in bytes; must match `SmsConfig::dcache_line_bytes`.
    #[serde(default = "DcacheConfig::default_line")]
    pub line_bytes: u64,

    /// Associativity (number of ways).
    #[serde(default = "DcacheConfig::default_ways")]
    pub ways: usize,
}

impl DcacheConfig {
    /// Returns the default cache size in bytes.
    fn default_size() -> usize {
        defaults::DCACHE_SIZE_BYTES
    }

    /// Returns the default cache line size in bytes.
    fn default_line() -> u64 {
        defaults::DCACHE_LINE_BYTES
    }

    /// Returns the default cache associativity.
    fn default_ways() -> usize {
        defaults::DCACHE_WAYS
    }
}

impl Default for DcacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::DCACHE_SIZE_BYTES,
            line_bytes: defaults::DCACHE_LINE_BYTES,
            ways: defaults::DCACHE_WAYS,
        }
    }
}
