//! Linux backend: interface counters from `/sys/class/net`.
//!
//! Each interface is a directory holding its kernel `ifindex` and a
//! `statistics/` directory with one file per counter. Only directories are
//! considered interfaces; stray files such as `bonding_masters` are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ByteCounters, CounterSource, CounterWidth, InterfaceEntry, InterfaceHandle};
use crate::error::{Error, Result};

/// Default sysfs network class directory.
const SYSFS_NET: &str = "/sys/class/net";

pub struct SysfsSource {
    root: PathBuf,
}

impl SysfsSource {
    pub fn new() -> Self {
        Self::with_root(SYSFS_NET)
    }

    /// Use an alternative directory laid out like `/sys/class/net`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a sysfs attribute holding a single unsigned integer.
fn read_u64(path: &Path) -> Result<u64> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::unavailable(format!("read {}", path.display()), e))?;
    raw.trim().parse::<u64>().map_err(|e| {
        Error::unavailable(
            format!("parse {}", path.display()),
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })
}

impl CounterSource for SysfsSource {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn interfaces(&self) -> Result<Vec<InterfaceEntry>> {
        let dir = fs::read_dir(&self.root)
            .map_err(|e| Error::unavailable(format!("enumerate {}", self.root.display()), e))?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry
                .map_err(|e| Error::unavailable(format!("enumerate {}", self.root.display()), e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let index_path = path.join("ifindex");
            let raw = match fs::read_to_string(&index_path) {
                Ok(raw) => raw,
                // Removed between read_dir and now.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("sysfs: {} vanished during enumeration", path.display());
                    continue;
                }
                Err(e) => {
                    return Err(Error::unavailable(
                        format!("read {}", index_path.display()),
                        e,
                    ));
                }
            };
            let index = raw.trim().parse::<u32>().map_err(|e| {
                Error::unavailable(
                    format!("parse {}", index_path.display()),
                    io::Error::new(io::ErrorKind::InvalidData, e),
                )
            })?;
            entries.push(InterfaceEntry {
                index,
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }

        entries.sort_by_key(|e| e.index);
        log::debug!(
            "sysfs: {} interface(s) under {}",
            entries.len(),
            self.root.display()
        );
        Ok(entries)
    }

    fn read(&self, handle: &InterfaceHandle) -> Result<ByteCounters> {
        let stats = self.root.join(handle.name()).join("statistics");
        Ok(ByteCounters {
            inbound: read_u64(&stats.join("rx_bytes"))?,
            outbound: read_u64(&stats.join("tx_bytes"))?,
        })
    }

    fn counter_width(&self) -> CounterWidth {
        // Kernel counters are `unsigned long`.
        if cfg!(target_pointer_width = "64") {
            CounterWidth::Bits64
        } else {
            CounterWidth::Bits32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_interface(root: &Path, name: &str, index: u32, rx: u64, tx: u64) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("statistics")).unwrap();
        fs::write(dir.join("ifindex"), format!("{index}\n")).unwrap();
        fs::write(dir.join("statistics/rx_bytes"), format!("{rx}\n")).unwrap();
        fs::write(dir.join("statistics/tx_bytes"), format!("{tx}\n")).unwrap();
    }

    #[test]
    fn test_enumerates_sorted_by_ifindex() {
        let tmp = tempfile::tempdir().unwrap();
        fake_interface(tmp.path(), "wlan0", 3, 0, 0);
        fake_interface(tmp.path(), "lo", 1, 0, 0);
        fake_interface(tmp.path(), "eth0", 2, 0, 0);

        let source = SysfsSource::with_root(tmp.path());
        let names: Vec<String> = source
            .interfaces()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["lo", "eth0", "wlan0"]);
    }

    #[test]
    fn test_skips_plain_files() {
        let tmp = tempfile::tempdir().unwrap();
        fake_interface(tmp.path(), "eth0", 2, 0, 0);
        fs::write(tmp.path().join("bonding_masters"), "\n").unwrap();

        let source = SysfsSource::with_root(tmp.path());
        assert_eq!(source.interfaces().unwrap().len(), 1);
    }

    #[test]
    fn test_skips_interface_removed_mid_enumeration() {
        let tmp = tempfile::tempdir().unwrap();
        fake_interface(tmp.path(), "eth0", 2, 0, 0);
        fake_interface(tmp.path(), "veth9", 7, 0, 0);
        fs::remove_file(tmp.path().join("veth9/ifindex")).unwrap();

        let source = SysfsSource::with_root(tmp.path());
        let entries = source.interfaces().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "eth0");
    }

    #[test]
    fn test_unreadable_ifindex_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        fake_interface(tmp.path(), "eth0", 2, 0, 0);
        fs::create_dir_all(tmp.path().join("bad0/ifindex")).unwrap();

        let source = SysfsSource::with_root(tmp.path());
        assert!(matches!(
            source.interfaces(),
            Err(Error::CounterSourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_reads_counters() {
        let tmp = tempfile::tempdir().unwrap();
        fake_interface(tmp.path(), "eth0", 2, 123_456_789_012, 42);

        let source = SysfsSource::with_root(tmp.path());
        let counters = source.read(&InterfaceHandle::new(2, "eth0")).unwrap();
        assert_eq!(counters, ByteCounters::new(123_456_789_012, 42));
    }

    #[test]
    fn test_missing_root_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let source = SysfsSource::with_root(tmp.path().join("nope"));
        assert!(matches!(
            source.interfaces(),
            Err(Error::CounterSourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_garbage_counter_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        fake_interface(tmp.path(), "eth0", 2, 0, 0);
        fs::write(tmp.path().join("eth0/statistics/rx_bytes"), "n/a\n").unwrap();

        let source = SysfsSource::with_root(tmp.path());
        assert!(matches!(
            source.read(&InterfaceHandle::new(2, "eth0")),
            Err(Error::CounterSourceUnavailable { .. })
        ));
    }

    #[test]
    #[ignore] // Needs a real /sys/class/net
    fn test_system_has_loopback() {
        let source = SysfsSource::new();
        let entries = source.interfaces().unwrap();
        assert!(entries.iter().any(|e| e.name == "lo"));
    }
}
