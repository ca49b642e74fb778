//! Rate sampling: turns two cumulative counter samples into bytes/second.
//!
//! The sampler itself holds no state. [`SamplerState`] is owned by the
//! scheduler, which passes the previous sample in and commits the new one
//! after each tick.
//!
//! # Wraparound
//!
//! A counter that goes backwards is either a wrap or a reset:
//! - on a 32-bit source, a previous value that fits in 32 bits is taken as a
//!   wrap and the delta is computed modulo 2^32;
//! - anything else (64-bit sources, or impossible 32-bit values) is taken as
//!   a counter reset and contributes a delta of 0.
//!
//! # Elapsed time
//!
//! Elapsed time has microsecond resolution. A tick where the clock did not
//! advance (or went backwards) reports a rate of 0 in both directions.

use chrono::{DateTime, Local, Utc};

use crate::counters::{ByteCounters, CounterSource, CounterWidth, InterfaceHandle};
use crate::error::Result;

/// Cumulative counters stamped with the instant they were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSample {
    pub timestamp: DateTime<Local>,
    pub inbound_bytes: u64,
    pub outbound_bytes: u64,
}

impl CounterSample {
    pub fn new(timestamp: DateTime<Local>, counters: ByteCounters) -> Self {
        Self {
            timestamp,
            inbound_bytes: counters.inbound,
            outbound_bytes: counters.outbound,
        }
    }

    /// Zero counters at the Unix epoch; the baseline before the first tick.
    pub fn sentinel() -> Self {
        Self {
            timestamp: DateTime::<Utc>::default().with_timezone(&Local),
            inbound_bytes: 0,
            outbound_bytes: 0,
        }
    }
}

/// Throughput derived from two samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub timestamp: DateTime<Local>,
    /// Bytes per second received.
    pub inbound_rate: f64,
    /// Bytes per second sent.
    pub outbound_rate: f64,
}

/// Previous sample carried between ticks. Single owner, never shared.
#[derive(Debug, Clone)]
pub struct SamplerState {
    last: CounterSample,
    primed: bool,
}

impl SamplerState {
    /// State holding the sentinel sample.
    pub fn new() -> Self {
        Self {
            last: CounterSample::sentinel(),
            primed: false,
        }
    }

    pub fn last(&self) -> &CounterSample {
        &self.last
    }

    /// Whether at least one real sample has been committed.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn commit(&mut self, sample: CounterSample) {
        self.last = sample;
        self.primed = true;
    }
}

impl Default for SamplerState {
    fn default() -> Self {
        Self::new()
    }
}

/// How a counter moved between two readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// Counter increased (or stayed put) by this many bytes.
    Advanced(u64),
    /// Counter passed its native maximum; bytes counted across the wrap.
    Wrapped(u64),
    /// Counter went backwards in a way a wrap cannot explain.
    Reset,
}

impl Delta {
    pub fn bytes(self) -> u64 {
        match self {
            Self::Advanced(n) | Self::Wrapped(n) => n,
            Self::Reset => 0,
        }
    }
}

/// Difference between two readings of a counter of the given native width.
pub fn counter_delta(previous: u64, current: u64, width: CounterWidth) -> Delta {
    if current >= previous {
        return Delta::Advanced(current - previous);
    }
    match width {
        CounterWidth::Bits32 if previous <= width.max() => {
            Delta::Wrapped(width.max() - previous + current + 1)
        }
        _ => Delta::Reset,
    }
}

/// Seconds between two instants, at microsecond resolution.
pub fn elapsed_seconds(from: DateTime<Local>, to: DateTime<Local>) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

fn per_second(bytes: u64, elapsed: f64) -> f64 {
    if elapsed > 0.0 {
        bytes as f64 / elapsed
    } else {
        0.0
    }
}

fn log_irregular(direction: &str, delta: Delta, previous: u64, current: u64) {
    match delta {
        Delta::Wrapped(n) => log::warn!(
            "{direction} counter wrapped ({previous} -> {current}), counting {n} bytes"
        ),
        Delta::Reset => log::warn!(
            "{direction} counter reset ({previous} -> {current}), counting 0 bytes"
        ),
        Delta::Advanced(_) => {}
    }
}

/// Compute the rates between `previous` and `current`. Pure.
pub fn compute_rates(
    previous: &CounterSample,
    current: &CounterSample,
    width: CounterWidth,
) -> RateSample {
    let elapsed = elapsed_seconds(previous.timestamp, current.timestamp);
    if elapsed <= 0.0 {
        log::warn!("clock did not advance between samples ({elapsed}s), reporting 0 B/s");
    }

    let delta_in = counter_delta(previous.inbound_bytes, current.inbound_bytes, width);
    let delta_out = counter_delta(previous.outbound_bytes, current.outbound_bytes, width);
    log_irregular("inbound", delta_in, previous.inbound_bytes, current.inbound_bytes);
    log_irregular("outbound", delta_out, previous.outbound_bytes, current.outbound_bytes);

    RateSample {
        timestamp: current.timestamp,
        inbound_rate: per_second(delta_in.bytes(), elapsed),
        outbound_rate: per_second(delta_out.bytes(), elapsed),
    }
}

/// Read the current counters of `handle` and derive rates against `previous`.
///
/// Returns the new sample for the caller to commit alongside the rates.
pub fn sample(
    source: &dyn CounterSource,
    handle: &InterfaceHandle,
    previous: &CounterSample,
    now: DateTime<Local>,
) -> Result<(CounterSample, RateSample)> {
    let current = CounterSample::new(now, source.read(handle)?);
    let rates = compute_rates(previous, &current, source.counter_width());
    log::debug!(
        "{}: in={} out={} -> {:.1} B/s in, {:.1} B/s out",
        handle.name(),
        current.inbound_bytes,
        current.outbound_bytes,
        rates.inbound_rate,
        rates.outbound_rate
    );
    Ok((current, rates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::ScriptedSource;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap()
    }

    fn at(offset_us: i64, inbound: u64, outbound: u64) -> CounterSample {
        CounterSample {
            timestamp: t0() + Duration::microseconds(offset_us),
            inbound_bytes: inbound,
            outbound_bytes: outbound,
        }
    }

    // -----------------------------------------------------------------------
    // counter_delta
    // -----------------------------------------------------------------------

    #[test]
    fn test_delta_advanced() {
        assert_eq!(counter_delta(100, 250, CounterWidth::Bits64), Delta::Advanced(150));
        assert_eq!(counter_delta(7, 7, CounterWidth::Bits32), Delta::Advanced(0));
    }

    #[test]
    fn test_delta_wraps_32_bit() {
        let prev = u64::from(u32::MAX) - 99;
        assert_eq!(counter_delta(prev, 50, CounterWidth::Bits32), Delta::Wrapped(150));
        assert_eq!(
            counter_delta(u64::from(u32::MAX), 0, CounterWidth::Bits32),
            Delta::Wrapped(1)
        );
    }

    #[test]
    fn test_delta_64_bit_decrease_is_reset() {
        assert_eq!(counter_delta(5_000, 10, CounterWidth::Bits64), Delta::Reset);
        assert_eq!(Delta::Reset.bytes(), 0);
    }

    #[test]
    fn test_delta_32_bit_impossible_previous_is_reset() {
        let prev = u64::from(u32::MAX) + 10;
        assert_eq!(counter_delta(prev, 3, CounterWidth::Bits32), Delta::Reset);
    }

    // -----------------------------------------------------------------------
    // elapsed_seconds
    // -----------------------------------------------------------------------

    #[test]
    fn test_elapsed_microsecond_precision() {
        let a = t0();
        let b = a + Duration::microseconds(1_250_001);
        assert!((elapsed_seconds(a, b) - 1.250_001).abs() < 1e-12);
    }

    #[test]
    fn test_elapsed_negative_when_clock_steps_back() {
        let a = t0();
        assert!(elapsed_seconds(a, a - Duration::seconds(2)) < 0.0);
    }

    // -----------------------------------------------------------------------
    // compute_rates
    // -----------------------------------------------------------------------

    #[test]
    fn test_rate_is_delta_over_elapsed() {
        let cases = [
            (1_000_000, 0, 0, 1_000, 500),
            (1_000_000, 10, 20, 1_010, 520),
            (500_000, 0, 0, 4_096, 0),
            (2_500_000, 1_000, 1_000, 11_000, 1_000),
            (1_000, 0, 0, 1, 1),
        ];
        for (us, in0, out0, in1, out1) in cases {
            let rates = compute_rates(&at(0, in0, out0), &at(us, in1, out1), CounterWidth::Bits64);
            let secs = us as f64 / 1e6;
            assert!((rates.inbound_rate - (in1 - in0) as f64 / secs).abs() < 1e-6);
            assert!((rates.outbound_rate - (out1 - out0) as f64 / secs).abs() < 1e-6);
        }
    }

    #[test]
    fn test_directions_are_independent() {
        let rates = compute_rates(&at(0, 0, 900), &at(1_000_000, 300, 900), CounterWidth::Bits64);
        assert_eq!(rates.inbound_rate, 300.0);
        assert_eq!(rates.outbound_rate, 0.0);
    }

    #[test]
    fn test_monotonic_counters_give_non_negative_rates() {
        let mut prev = at(0, 0, 0);
        for step in 1..50u64 {
            let cur = at(step as i64 * 333_333, step * step * 17, step * 3);
            let rates = compute_rates(&prev, &cur, CounterWidth::Bits64);
            assert!(rates.inbound_rate >= 0.0);
            assert!(rates.outbound_rate >= 0.0);
            prev = cur;
        }
    }

    #[test]
    fn test_zero_elapsed_reports_zero() {
        let rates = compute_rates(&at(0, 0, 0), &at(0, 1_000, 1_000), CounterWidth::Bits64);
        assert_eq!(rates.inbound_rate, 0.0);
        assert_eq!(rates.outbound_rate, 0.0);
    }

    #[test]
    fn test_wrapped_rate_32_bit() {
        let prev = at(0, u64::from(u32::MAX) - 499, 10);
        let cur = at(1_000_000, 500, 10);
        let rates = compute_rates(&prev, &cur, CounterWidth::Bits32);
        assert_eq!(rates.inbound_rate, 1_000.0);
    }

    #[test]
    fn test_reset_rate_64_bit_is_zero() {
        let rates = compute_rates(&at(0, 9_000, 9_000), &at(1_000_000, 10, 9_500), CounterWidth::Bits64);
        assert_eq!(rates.inbound_rate, 0.0);
        assert_eq!(rates.outbound_rate, 500.0);
    }

    #[test]
    fn test_sentinel_first_rate_is_finite() {
        let cur = at(0, 123_456, 654_321);
        let rates = compute_rates(&CounterSample::sentinel(), &cur, CounterWidth::Bits64);
        assert!(rates.inbound_rate.is_finite() && rates.inbound_rate > 0.0);
        assert!(rates.outbound_rate.is_finite() && rates.outbound_rate > 0.0);
    }

    // -----------------------------------------------------------------------
    // sample / SamplerState
    // -----------------------------------------------------------------------

    #[test]
    fn test_sample_reads_source() {
        let source = ScriptedSource::new(&["em0"]).with_readings(&[(2_000, 1_000)]);
        let handle = InterfaceHandle::new(1, "em0");
        let prev = at(0, 1_000, 500);
        let (cur, rates) = sample(&source, &handle, &prev, t0() + Duration::seconds(1)).unwrap();
        assert_eq!(cur.inbound_bytes, 2_000);
        assert_eq!(cur.outbound_bytes, 1_000);
        assert_eq!(rates.inbound_rate, 1_000.0);
        assert_eq!(rates.outbound_rate, 500.0);
        assert_eq!(rates.timestamp, cur.timestamp);
    }

    #[test]
    fn test_sample_propagates_read_failure() {
        let source = ScriptedSource::new(&["em0"]).with_failure();
        let handle = InterfaceHandle::new(1, "em0");
        assert!(sample(&source, &handle, &CounterSample::sentinel(), t0()).is_err());
    }

    #[test]
    fn test_state_starts_at_sentinel() {
        let mut state = SamplerState::new();
        assert!(!state.is_primed());
        assert_eq!(*state.last(), CounterSample::sentinel());
        state.commit(at(0, 1, 2));
        assert!(state.is_primed());
        assert_eq!(state.last().outbound_bytes, 2);
    }
}
