//! Interface resolution: human-readable name to a stable [`InterfaceHandle`].

use crate::counters::{CounterSource, InterfaceHandle};
use crate::error::{Error, Result};

/// Resolve `name` against the interfaces enumerated by `source`.
///
/// The match is exact and case-sensitive. Enumeration runs once; a failure of
/// the enumeration itself is reported as
/// [`Error::CounterSourceUnavailable`] and is not retried.
pub fn resolve(source: &dyn CounterSource, name: &str) -> Result<InterfaceHandle> {
    if name.is_empty() {
        return Err(Error::Usage("interface name must not be empty".to_string()));
    }

    let entries = source.interfaces()?;
    log::debug!(
        "{}: scanning {} interface(s) for '{}'",
        source.name(),
        entries.len(),
        name
    );

    entries
        .into_iter()
        .find(|entry| entry.name == name)
        .map(InterfaceHandle::from)
        .ok_or_else(|| Error::InterfaceNotFound {
            name: name.to_string(),
        })
}
