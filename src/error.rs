//! Error kinds for the engine.
//!
//! The engine never panics on untrusted input and never uses exception-style
//! control flow: every fallible path returns one of the small enums below,
//! or an `Option` where "absent" is the only failure mode. No error here is
//! fatal to the runtime — these types exist to let callers log and move on,
//! not to unwind.

use core::fmt;

/// A connection attempt failed. Transient variants are retried inside the
/// owning driver's state machine and never escape to the router; only
/// `Hard` failures are surfaced so the connection can be abandoned and its
/// slot released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// Retries remain; driver should re-attempt the current step next tick.
    Transient,
    /// Retries exhausted at the current state-machine step.
    Hard,
    /// No per-instance slot was free for a new driver instance.
    NoSlotFree,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Transient => write!(f, "transient connect failure, retrying"),
            ConnectError::Hard => write!(f, "connect failed, retries exhausted"),
            ConnectError::NoSlotFree => write!(f, "no driver instance slot free"),
        }
    }
}

/// A report (input or output) could not be decoded or encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    /// Report shorter than the minimum expected for its ID.
    TooShort,
    /// Report ID not recognized by this driver.
    UnknownId(u8),
    /// Descriptor-driven decode found a usage outside the report's bounds.
    OutOfRange,
    /// HID report descriptor itself was malformed.
    MalformedDescriptor,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::TooShort => write!(f, "report shorter than expected"),
            ReportError::UnknownId(id) => write!(f, "unrecognized report id 0x{:02x}", id),
            ReportError::OutOfRange => write!(f, "usage location out of report bounds"),
            ReportError::MalformedDescriptor => write!(f, "malformed HID report descriptor"),
        }
    }
}

/// Persistence layer failure. Both variants are non-fatal: a read error
/// falls back to defaults, a write error just leaves the debounce timer
/// pending so the next settings change retries the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Magic mismatch, short read, or backing store unavailable.
    ReadFailed,
    /// Backing store rejected or could not complete the write.
    WriteFailed,
    /// Encoded blob would not fit the keyed store's slot size.
    TooLarge,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed => write!(f, "storage read failed, using defaults"),
            StorageError::WriteFailed => write!(f, "storage write failed, will retry"),
            StorageError::TooLarge => write!(f, "encoded settings blob too large"),
        }
    }
}

/// Compile-time configuration lookup failure (missing pin/rule, bad value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    MissingPin(&'static str),
    MissingRule(&'static str),
    InvalidValue(&'static str, &'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingPin(pin) => write!(f, "missing required pin: {}", pin),
            ConfigError::MissingRule(rule) => write!(f, "missing required SOCD rule: {}", rule),
            ConfigError::InvalidValue(name, value) => {
                write!(f, "invalid value for {}: {}", name, value)
            }
        }
    }
}
