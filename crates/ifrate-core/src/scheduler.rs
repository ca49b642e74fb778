//! Sampling loop and run lifecycle.
//!
//! A run moves through four phases:
//!
//! ```text
//! Initializing -> Running -> Draining -> Terminated
//! ```
//!
//! `Initializing` resolves the interface, creates the output file (header
//! included) and primes the sampler with the sentinel sample. `Running`
//! repeats sample, write, check, sleep. The cancellation flag and the optional
//! duration bound are checked only after a tick's row has been written, so a
//! cancellation costs at most one more row and up to one interval of latency.
//! `Draining` flushes and closes the output.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::{FirstSample, MonitorConfig};
use crate::counters::{CounterSource, InterfaceHandle};
use crate::error::Result;
use crate::record::RecordWriter;
use crate::resolver::resolve;
use crate::sampler::{self, RateSample, SamplerState, elapsed_seconds};

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Source of wall-clock time and of the end-of-interval wait.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Block for `interval`. Not interruptible.
    fn sleep(&self, interval: Duration);
}

/// Local wall clock with a blocking `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, interval: Duration) {
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
}

/// Deterministic clock: time only moves when slept or advanced.
#[derive(Debug)]
pub struct ManualClock {
    now: std::cell::Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: std::cell::Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        if let Some(next) = self.now.get().checked_add_signed(step) {
            self.now.set(next);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }

    fn sleep(&self, interval: Duration) {
        self.advance(interval);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }

    fn sleep(&self, interval: Duration) {
        (**self).sleep(interval);
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Running,
    Draining,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Why the loop left `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation flag was set.
    Cancelled,
    /// The configured maximum duration elapsed.
    DurationElapsed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::DurationElapsed => write!(f, "duration elapsed"),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub rows_written: u64,
    pub stopped_by: StopReason,
}

/// New cancellation flag, initially clear.
pub fn cancellation_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives the sampling loop for one interface.
pub struct Scheduler<'a, W: Write, C: Clock> {
    source: &'a dyn CounterSource,
    handle: InterfaceHandle,
    writer: RecordWriter<W>,
    clock: C,
    state: SamplerState,
    interval: Duration,
    max_duration: Option<Duration>,
    first_sample: FirstSample,
    cancel: Arc<AtomicBool>,
    phase: Phase,
    ticks: u64,
}

impl<'a, C: Clock> Scheduler<'a, std::fs::File, C> {
    /// Run the `Initializing` phase for `config`.
    ///
    /// The interface is resolved before the output file is touched, so a bad
    /// interface name never creates or truncates the file.
    pub fn initialize(
        config: &MonitorConfig,
        source: &'a dyn CounterSource,
        clock: C,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self> {
        config.validate()?;
        let handle = resolve(source, &config.interface)?;
        log::info!(
            "resolved {} via {} ({} counters)",
            handle,
            source.name(),
            source.counter_width()
        );
        let writer = RecordWriter::create(&config.output)?;
        Ok(Self::new(source, handle, writer, clock, config, cancel))
    }
}

impl<'a, W: Write, C: Clock> Scheduler<'a, W, C> {
    /// Assemble a scheduler from already-initialized parts.
    pub fn new(
        source: &'a dyn CounterSource,
        handle: InterfaceHandle,
        writer: RecordWriter<W>,
        clock: C,
        config: &MonitorConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            handle,
            writer,
            clock,
            state: SamplerState::new(),
            interval: config.interval,
            max_duration: config.max_duration,
            first_sample: config.first_sample,
            cancel,
            phase: Phase::Initializing,
            ticks: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn handle(&self) -> &InterfaceHandle {
        &self.handle
    }

    fn enter(&mut self, phase: Phase) {
        log::info!("{} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Sample once, commit the new state and write the row.
    ///
    /// Returns the rates written, or `None` for a priming tick that wrote
    /// nothing.
    pub fn tick(&mut self) -> Result<Option<RateSample>> {
        let now = self.clock.now();
        let (current, rates) = sampler::sample(self.source, &self.handle, self.state.last(), now)?;
        let emit = self.state.is_primed() || self.first_sample == FirstSample::Emit;
        self.state.commit(current);
        self.ticks += 1;

        if !emit {
            log::debug!("priming tick, no row written");
            return Ok(None);
        }
        self.writer.append(&rates)?;
        Ok(Some(rates))
    }

    /// Run until cancelled or the duration bound is reached, then drain.
    pub fn run(mut self) -> Result<RunSummary> {
        self.enter(Phase::Running);
        let started = self.clock.now();

        let stopped_by = loop {
            self.tick()?;

            if self.cancel.load(Ordering::SeqCst) {
                break StopReason::Cancelled;
            }
            if let Some(max) = self.max_duration
                && elapsed_seconds(started, self.clock.now()) >= max.as_secs_f64()
            {
                break StopReason::DurationElapsed;
            }

            self.clock.sleep(self.interval);
        };

        self.enter(Phase::Draining);
        let summary = RunSummary {
            ticks: self.ticks,
            rows_written: self.writer.rows_written(),
            stopped_by,
        };
        self.writer.finish()?;
        log::info!("{} -> {}", Phase::Draining, Phase::Terminated);
        Ok(summary)
    }
}
