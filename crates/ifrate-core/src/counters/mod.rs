//! Counter sources: where cumulative interface byte counts come from.
//!
//! Every platform backend implements the [`CounterSource`] trait, which
//! enumerates interfaces and reads the inbound/outbound byte counters of a
//! resolved [`InterfaceHandle`]. The sampler only ever talks to the trait, so
//! tests can substitute a [`ScriptedSource`].

use std::fmt;

use crate::error::Result;

#[cfg(any(target_os = "macos", target_os = "freebsd"))]
mod ifaddrs;
mod scripted;
#[cfg(target_os = "linux")]
mod sysfs;

#[cfg(any(target_os = "macos", target_os = "freebsd"))]
pub use ifaddrs::IfaddrsSource;
pub use scripted::ScriptedSource;
#[cfg(target_os = "linux")]
pub use sysfs::SysfsSource;

/// Native width of a platform's byte counters.
///
/// Counters are always widened to `u64` when read; the width tells the sampler
/// where the underlying counter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterWidth {
    /// Counter wraps at 2^32 (e.g. macOS `if_data`, 32-bit Linux kernels).
    Bits32,
    /// Counter wraps at 2^64.
    Bits64,
}

impl CounterWidth {
    /// Largest value the native counter can hold.
    pub fn max(self) -> u64 {
        match self {
            Self::Bits32 => u64::from(u32::MAX),
            Self::Bits64 => u64::MAX,
        }
    }
}

impl fmt::Display for CounterWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits32 => write!(f, "32-bit"),
            Self::Bits64 => write!(f, "64-bit"),
        }
    }
}

/// One interface as reported by a counter source's enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    /// Index understood by the source (kernel ifindex on real platforms).
    pub index: u32,
    /// Interface name, e.g. `"eth0"` or `"em0"`.
    pub name: String,
}

/// Resolved reference to an interface, valid for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceHandle {
    index: u32,
    name: String,
}

impl InterfaceHandle {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<InterfaceEntry> for InterfaceHandle {
    fn from(entry: InterfaceEntry) -> Self {
        Self::new(entry.index, entry.name)
    }
}

impl fmt::Display for InterfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (index {})", self.name, self.index)
    }
}

/// Cumulative byte counts for one interface at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounters {
    pub inbound: u64,
    pub outbound: u64,
}

impl ByteCounters {
    pub fn new(inbound: u64, outbound: u64) -> Self {
        Self { inbound, outbound }
    }
}

/// Trait that every counter backend must implement.
pub trait CounterSource {
    /// Short backend identifier used in log output (e.g. `"sysfs"`).
    fn name(&self) -> &'static str;

    /// Enumerate every interface the backend knows about.
    fn interfaces(&self) -> Result<Vec<InterfaceEntry>>;

    /// Read the current cumulative counters for `handle`.
    fn read(&self, handle: &InterfaceHandle) -> Result<ByteCounters>;

    /// Native width of the counters returned by [`CounterSource::read`].
    fn counter_width(&self) -> CounterWidth;
}

impl<T: CounterSource + ?Sized> CounterSource for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn interfaces(&self) -> Result<Vec<InterfaceEntry>> {
        (**self).interfaces()
    }

    fn read(&self, handle: &InterfaceHandle) -> Result<ByteCounters> {
        (**self).read(handle)
    }

    fn counter_width(&self) -> CounterWidth {
        (**self).counter_width()
    }
}

// ---------------------------------------------------------------------------
// Platform selection
// ---------------------------------------------------------------------------

/// Backend used on platforms without a counter implementation. Every call
/// fails with [`crate::Error::CounterSourceUnavailable`].
#[derive(Debug, Default)]
pub struct UnsupportedSource;

impl UnsupportedSource {
    fn error(operation: &str) -> crate::Error {
        crate::Error::unavailable(
            operation,
            std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!(
                    "no interface counter backend for {}",
                    std::env::consts::OS
                ),
            ),
        )
    }
}

impl CounterSource for UnsupportedSource {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn interfaces(&self) -> Result<Vec<InterfaceEntry>> {
        Err(Self::error("enumerate interfaces"))
    }

    fn read(&self, handle: &InterfaceHandle) -> Result<ByteCounters> {
        Err(Self::error(&format!("read counters of {}", handle.name())))
    }

    fn counter_width(&self) -> CounterWidth {
        CounterWidth::Bits64
    }
}

/// The counter source for the current platform.
pub fn system_source() -> Box<dyn CounterSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(SysfsSource::new())
    }
    #[cfg(any(target_os = "macos", target_os = "freebsd"))]
    {
        Box::new(IfaddrsSource::new())
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "freebsd")))]
    {
        Box::new(UnsupportedSource)
    }
}
