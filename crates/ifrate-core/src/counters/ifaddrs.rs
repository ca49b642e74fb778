//! BSD-family backend (macOS, FreeBSD): counters from `getifaddrs(3)`.
//!
//! Link-layer (`AF_LINK`) entries carry the interface index in their
//! `sockaddr_dl` and point `ifa_data` at the kernel's `struct if_data`.

use std::ffi::CStr;
use std::io;

use super::{ByteCounters, CounterSource, CounterWidth, InterfaceEntry, InterfaceHandle};
use crate::error::{Error, Result};

pub struct IfaddrsSource;

impl IfaddrsSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IfaddrsSource {
    fn default() -> Self {
        Self::new()
    }
}

/// One `AF_LINK` entry copied out of the `getifaddrs` list.
struct LinkEntry {
    name: String,
    index: u32,
    counters: Option<ByteCounters>,
}

/// Snapshot every link-layer entry. The list is freed before returning.
fn link_entries() -> Result<Vec<LinkEntry>> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: `head` is a valid out-pointer; on success the list is released
    // with `freeifaddrs` below.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(Error::unavailable(
            "getifaddrs",
            io::Error::last_os_error(),
        ));
    }

    let mut out = Vec::new();
    let mut cursor = head;
    while !cursor.is_null() {
        // SAFETY: `cursor` is a non-null node of the list returned above.
        let entry = unsafe { &*cursor };
        cursor = entry.ifa_next;

        if entry.ifa_addr.is_null() || entry.ifa_name.is_null() {
            continue;
        }
        // SAFETY: `ifa_addr` is non-null and points at a sockaddr.
        let family = i32::from(unsafe { (*entry.ifa_addr).sa_family });
        if family != libc::AF_LINK {
            continue;
        }

        // SAFETY: `ifa_name` is a NUL-terminated string owned by the list.
        let name = unsafe { CStr::from_ptr(entry.ifa_name) }
            .to_string_lossy()
            .into_owned();
        // SAFETY: AF_LINK addresses are `sockaddr_dl`.
        let link = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_dl) };
        let counters = if entry.ifa_data.is_null() {
            None
        } else {
            // SAFETY: for AF_LINK entries `ifa_data` points at `struct if_data`.
            let data = unsafe { &*(entry.ifa_data as *const libc::if_data) };
            Some(ByteCounters {
                inbound: u64::from(data.ifi_ibytes),
                outbound: u64::from(data.ifi_obytes),
            })
        };

        out.push(LinkEntry {
            name,
            index: u32::from(link.sdl_index),
            counters,
        });
    }

    // SAFETY: `head` came from a successful `getifaddrs` call and is freed once.
    unsafe { libc::freeifaddrs(head) };
    Ok(out)
}

impl CounterSource for IfaddrsSource {
    fn name(&self) -> &'static str {
        "getifaddrs"
    }

    fn interfaces(&self) -> Result<Vec<InterfaceEntry>> {
        let mut entries: Vec<InterfaceEntry> = link_entries()?
            .into_iter()
            .map(|e| InterfaceEntry {
                index: e.index,
                name: e.name,
            })
            .collect();
        entries.sort_by_key(|e| e.index);
        entries.dedup_by_key(|e| e.index);
        Ok(entries)
    }

    fn read(&self, handle: &InterfaceHandle) -> Result<ByteCounters> {
        link_entries()?
            .into_iter()
            .find(|e| e.index == handle.index() && e.name == handle.name())
            .and_then(|e| e.counters)
            .ok_or_else(|| {
                Error::unavailable(
                    format!("read counters of {handle}"),
                    io::Error::new(io::ErrorKind::NotFound, "interface has no link data"),
                )
            })
    }

    fn counter_width(&self) -> CounterWidth {
        // macOS keeps 32-bit counters in `if_data`; FreeBSD widened them.
        if cfg!(target_os = "macos") {
            CounterWidth::Bits32
        } else {
            CounterWidth::Bits64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Needs a real getifaddrs list
    fn test_enumerates_loopback() {
        let source = IfaddrsSource::new();
        let entries = source.interfaces().unwrap();
        assert!(entries.iter().any(|e| e.name.starts_with("lo")));
    }

    #[test]
    #[ignore] // Needs a real getifaddrs list
    fn test_reads_loopback_counters() {
        let source = IfaddrsSource::new();
        let lo = source
            .interfaces()
            .unwrap()
            .into_iter()
            .find(|e| e.name.starts_with("lo"))
            .unwrap();
        assert!(source.read(&InterfaceHandle::from(lo)).is_ok());
    }
}
