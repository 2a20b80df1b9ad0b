//! SMS prefetcher trace driver.
//!
//! This binary replays an L1 data-cache access trace through the reference
//! data-cache model and the prefetcher engine, then prints statistics:
//! 1. **Trace replay:** One `<pc> <address>` pair per line, hex, `#` comments.
//! 2. **Configuration:** Optional JSON file overriding built-in defaults.
//! 3. **Reporting:** Host-side hit/miss/useful-prefetch counts plus the
//!    engine's own counters.

use clap::{Parser, Subcommand};
use std::{fs, process};

use sms_core::common::LineAddr;
use sms_core::{Config, DataCache, DcacheSim, Sms};

#[derive(Parser, Debug)]
#[command(
    name = "smsim",
    author,
    version,
    about = "Spatial memory streaming prefetcher trace driver",
    long_about = "Replay an L1D access trace through a set-associative data-cache model \
with an SMS prefetcher attached.\n\nTrace format: one access per line, `<pc> <address>` \
in hex; blank lines and `#` comments are skipped.\n\nExamples:\n  \
smsim run -f traces/stream.trace\n  smsim run -f traces/stream.trace -c sms.json --trace"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay an access trace through the data cache and the prefetcher.
    Run {
        /// Trace file to replay.
        #[arg(short, long)]
        file: String,

        /// JSON configuration file (built-in defaults when omitted).
        #[arg(short, long)]
        config: Option<String>,

        /// Enable engine tracing to stderr.
        #[arg(long)]
        trace: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            file,
            config,
            trace,
        }) => cmd_run(&file, config.as_deref(), trace),
        None => {
            eprintln!("SMS trace driver — pass a subcommand");
            eprintln!();
            eprintln!("  smsim run -f <trace>             Replay with default config");
            eprintln!("  smsim run -f <trace> -c <json>   Replay with a config file");
            eprintln!();
            eprintln!("  smsim --help  for full options");
            process::exit(1);
        }
    }
}

/// Replays the trace: every access drives the cache model first, then the
/// engine; demand-miss fills are reported to the engine as insert events.
fn cmd_run(trace_path: &str, config_path: Option<&str>, trace: bool) {
    let mut config = match config_path {
        Some(path) => load_config(path),
        None => Config::default(),
    };
    if trace {
        config.sms.trace = true;
    }

    let mut dcache = DcacheSim::new(&config.dcache);
    let mut sms = Sms::new(&config.sms);

    if dcache.line_bytes() != sms.geometry().line_bytes() {
        eprintln!(
            "Warning: dcache.line_bytes ({}) differs from sms.dcache_line_bytes ({}); \
pattern bits will not line up with cache lines",
            dcache.line_bytes(),
            sms.geometry().line_bytes()
        );
    }

    println!(
        "Configuration: region {} B ({} blocks), FT {} / AT {} / PHT {}x{}",
        sms.geometry().region_bytes(),
        sms.geometry().blocks_per_region(),
        config.sms.filter_entries,
        config.sms.accumulation_entries,
        config.sms.pht_entries / config.sms.pht_ways.max(1),
        config.sms.pht_ways,
    );
    println!(
        "  L1D: {} KiB, {}-way, {} B lines",
        config.dcache.size_bytes / 1024,
        config.dcache.ways,
        config.dcache.line_bytes
    );
    println!();

    let text = fs::read_to_string(trace_path).unwrap_or_else(|e| {
        eprintln!("Error reading trace '{}': {}", trace_path, e);
        process::exit(1);
    });

    let mut accesses = 0u64;
    let mut demand_hits = 0u64;
    let mut demand_misses = 0u64;
    let mut useful_prefetches = 0u64;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (pc, addr) = match (fields.next(), fields.next()) {
            (Some(pc), Some(addr)) => (parse_hex(pc, lineno), parse_hex(addr, lineno)),
            _ => {
                eprintln!(
                    "Error: trace line {} is not `<pc> <address>`: '{}'",
                    lineno + 1,
                    line
                );
                process::exit(1);
            }
        };

        let addr = LineAddr::new(addr);
        accesses += 1;

        let outcome = dcache.access(addr);
        if outcome.hit {
            demand_hits += 1;
            if outcome.prefetched_hit {
                useful_prefetches += 1;
            }
        } else {
            demand_misses += 1;
        }

        sms.on_dcache_access(&mut dcache, pc, addr);
        if !outcome.hit {
            sms.on_dcache_insert(addr, outcome.evicted);
        }
    }

    let miss_rate = if accesses > 0 {
        100.0 * demand_misses as f64 / accesses as f64
    } else {
        0.0
    };
    println!("[L1D] accesses: {}", accesses);
    println!("[L1D] hits:     {}", demand_hits);
    println!("[L1D] misses:   {} ({:.2}%)", demand_misses, miss_rate);
    println!("[L1D] useful prefetches: {}", useful_prefetches);
    println!();

    sms.stats.print();
}

/// Parses a hex field (with or without `0x`), exiting on malformed input.
fn parse_hex(field: &str, lineno: usize) -> u64 {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).unwrap_or_else(|e| {
        eprintln!(
            "Error: trace line {}: bad hex value '{}': {}",
            lineno + 1,
            field,
            e
        );
        process::exit(1);
    })
}

/// Loads a JSON configuration file, exiting on IO or parse errors.
fn load_config(path: &str) -> Config {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config '{}': {}", path, e);
        process::exit(1);
    })
}
