//! Spatial memory streaming (SMS) data prefetcher.
//!
//! This crate implements the table-driven core of an SMS hardware prefetcher
//! for the L1 data cache. It provides the following:
//! 1. **Region arithmetic:** Decomposition of line addresses into spatial
//!    region bases, block indices, and access-pattern bits.
//! 2. **Generation tracking:** Filter and accumulation tables that record
//!    which blocks of a region are touched while the region is live in the
//!    data cache.
//! 3. **Pattern history:** A set-associative table persisting learned access
//!    patterns across generations, keyed by region base.
//! 4. **Prefetch streaming:** Decomposition of a learned pattern into block
//!    addresses injected into the data cache on a trigger access.
//! 5. **Host interface:** The `DataCache` trait the engine drives, plus a
//!    reference set-associative data-cache model for hosts and tests.

/// Common types (addresses, access patterns, region geometry).
pub mod common;

/// Prefetcher configuration (defaults, serde structures).
pub mod config;

/// Host-side data-cache interface and reference model.
pub mod host;

/// The streaming engine: event handlers, generation lifecycle, emitter.
pub mod sms;

/// Statistics collection and reporting.
pub mod stats;

/// Set-associative pattern tables (filter, accumulation, pattern history).
pub mod tables;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::{Config, DcacheConfig, SmsConfig};
/// Data-cache seam: the trait the engine drives and the reference model.
pub use crate::host::{DataCache, DcacheSim};
/// The prefetcher engine; construct with `Sms::new` at host startup.
pub use crate::sms::Sms;
