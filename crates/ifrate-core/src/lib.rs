//! # ifrate-core
//!
//! **Log a network interface's throughput to CSV.**
//!
//! `ifrate-core` samples an interface's cumulative byte counters at a fixed
//! interval, turns consecutive samples into bytes per second and appends one
//! timestamped row per tick to a CSV file until cancelled.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ifrate_core::{MonitorConfig, Scheduler, SystemClock, cancellation_flag, system_source};
//!
//! let config = MonitorConfig {
//!     interface: "eth0".to_string(),
//!     ..Default::default()
//! };
//! let source = system_source();
//! let cancel = cancellation_flag();
//!
//! let scheduler = Scheduler::initialize(&config, &*source, SystemClock, cancel).unwrap();
//! let summary = scheduler.run().unwrap();
//! println!("{} rows written", summary.rows_written);
//! ```
//!
//! ## Architecture
//!
//! Counter source → Resolver → Sampler → Record writer, driven by the
//! Scheduler.
//!
//! Every platform backend implements the [`CounterSource`] trait. The
//! [`Scheduler`] owns the sampler state and the output file, and polls a
//! shared cancellation flag once per tick.

pub mod config;
pub mod counters;
pub mod error;
pub mod record;
pub mod resolver;
pub mod sampler;
pub mod scheduler;

pub use config::{FirstSample, MonitorConfig, parse_duration, parse_interval};
pub use counters::{
    ByteCounters, CounterSource, CounterWidth, InterfaceEntry, InterfaceHandle, ScriptedSource,
    UnsupportedSource, system_source,
};
pub use error::{Error, Result};
pub use record::{HEADER, RecordWriter, TIMESTAMP_FORMAT, format_row};
pub use resolver::resolve;
pub use sampler::{
    CounterSample, Delta, RateSample, SamplerState, compute_rates, counter_delta, sample,
};
pub use scheduler::{
    Clock, ManualClock, Phase, RunSummary, Scheduler, StopReason, SystemClock, cancellation_flag,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
