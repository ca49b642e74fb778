//! Monitor configuration and argument parsing helpers.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// What to do with the tick that runs against the sentinel sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstSample {
    /// Prime the sampler state without writing a row.
    #[default]
    Skip,
    /// Write the row computed against zero counters at the Unix epoch.
    Emit,
}

impl std::fmt::Display for FirstSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Emit => write!(f, "emit"),
        }
    }
}

/// Configuration for one monitoring run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// CSV file to create (truncated if it exists).
    pub output: PathBuf,
    /// Pause between the end of one tick and the start of the next.
    pub interval: Duration,
    /// Interface to sample, matched exactly.
    pub interface: String,
    pub first_sample: FirstSample,
    /// Stop normally once this much wall-clock time has passed.
    pub max_duration: Option<Duration>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("ifrate.csv"),
            interval: Duration::from_secs(1),
            interface: String::new(),
            first_sample: FirstSample::Skip,
            max_duration: None,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interface.is_empty() {
            return Err(Error::Usage("interface name must not be empty".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::Usage("output file must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Parse the interval argument: whole seconds, ASCII digits only.
///
/// Zero is accepted and means "sample back to back".
pub fn parse_interval(s: &str) -> Result<Duration> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Usage(format!(
            "invalid interval '{s}': expected a whole number of seconds"
        )));
    }
    let secs: u64 = s
        .parse()
        .map_err(|_| Error::Usage(format!("interval '{s}' is too large")))?;
    Ok(Duration::from_secs(secs))
}

/// Parse a duration string like "5m", "30s", "1h", "100ms". A bare number is
/// taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric
        .parse()
        .map_err(|_| Error::Usage(format!("invalid duration '{s}'")))?;
    let millis = value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::Usage(format!("duration '{s}' is too large")))?;
    Ok(Duration::from_millis(millis))
}
