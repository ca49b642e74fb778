//! In-memory counter source replaying a fixed script of readings.
//!
//! Used to drive the sampler and scheduler without touching the OS. Once the
//! script runs out, the last reading repeats (an idle interface).

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use super::{ByteCounters, CounterSource, CounterWidth, InterfaceEntry, InterfaceHandle};
use crate::error::{Error, Result};

/// One scripted step: a reading, or a failed counter query.
#[derive(Debug, Clone, Copy)]
enum Step {
    Reading(ByteCounters),
    Failure,
}

pub struct ScriptedSource {
    interfaces: Option<Vec<String>>,
    width: CounterWidth,
    script: Mutex<VecDeque<Step>>,
    last: Mutex<ByteCounters>,
}

impl ScriptedSource {
    /// A source exposing `interfaces` with 1-based indices, in order.
    pub fn new(interfaces: &[&str]) -> Self {
        Self {
            interfaces: Some(interfaces.iter().map(|s| (*s).to_string()).collect()),
            width: CounterWidth::Bits64,
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(ByteCounters::default()),
        }
    }

    /// A source whose enumeration fails, like a platform without counters.
    pub fn broken() -> Self {
        Self {
            interfaces: None,
            ..Self::new(&[])
        }
    }

    pub fn with_width(mut self, width: CounterWidth) -> Self {
        self.width = width;
        self
    }

    /// Append readings, given as `(inbound, outbound)` pairs.
    pub fn with_readings(self, readings: &[(u64, u64)]) -> Self {
        for &(inbound, outbound) in readings {
            self.push_reading(ByteCounters::new(inbound, outbound));
        }
        self
    }

    /// Append a failing read to the script.
    pub fn with_failure(self) -> Self {
        self.lock_script().push_back(Step::Failure);
        self
    }

    pub fn push_reading(&self, counters: ByteCounters) {
        self.lock_script().push_back(Step::Reading(counters));
    }

    /// Readings not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_script().len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Step>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CounterSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn interfaces(&self) -> Result<Vec<InterfaceEntry>> {
        let Some(names) = &self.interfaces else {
            return Err(Error::unavailable(
                "enumerate interfaces",
                io::Error::new(io::ErrorKind::Unsupported, "scripted source is broken"),
            ));
        };
        Ok(names
            .iter()
            .zip(1u32..)
            .map(|(name, index)| InterfaceEntry {
                index,
                name: name.clone(),
            })
            .collect())
    }

    fn read(&self, handle: &InterfaceHandle) -> Result<ByteCounters> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match self.lock_script().pop_front() {
            Some(Step::Reading(counters)) => {
                *last = counters;
                Ok(counters)
            }
            Some(Step::Failure) => Err(Error::unavailable(
                format!("read counters of {handle}"),
                io::Error::other("scripted failure"),
            )),
            None => Ok(*last),
        }
    }

    fn counter_width(&self) -> CounterWidth {
        self.width
    }
}
