//! Error types for ifrate.
//!
//! Every failure is terminal: nothing in the library retries. Errors bubble up
//! to the binary, which prints one diagnostic line and exits with status 1.

use std::fmt;
use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, sampling or recording.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid command-line input (bad interval, empty interface name, ...)
    Usage(String),

    /// No enumerated interface matched the requested name
    InterfaceNotFound { name: String },

    /// The operating system counter query itself failed
    CounterSourceUnavailable {
        operation: String,
        source: io::Error,
    },

    /// Output file could not be created, written or flushed
    Io {
        operation: String,
        source: io::Error,
    },
}

impl Error {
    /// Build a [`Error::CounterSourceUnavailable`] for the named operation.
    pub fn unavailable(operation: impl Into<String>, source: io::Error) -> Self {
        Self::CounterSourceUnavailable {
            operation: operation.into(),
            source,
        }
    }

    /// Build an [`Error::Io`] for the named operation.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Whether the binary should follow the message with its usage text.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{}", msg),
            Self::InterfaceNotFound { name } => {
                write!(f, "Couldn't get interface '{}': no such interface", name)
            }
            Self::CounterSourceUnavailable { operation, source } => {
                write!(f, "Counter source unavailable ({}): {}", operation, source)
            }
            Self::Io { operation, source } => {
                write!(f, "Failed to {}: {}", operation, source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CounterSourceUnavailable { source, .. } | Self::Io { source, .. } => Some(source),
            Self::Usage(_) | Self::InterfaceNotFound { .. } => None,
        }
    }
}
