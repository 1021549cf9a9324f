//! # Logging
//!
//! Plumbing that carries log output from the native media engine into the
//! SDK's logging facility.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      MEDIA ENGINE LOG FLOW                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Media engine                LogBridge                  LogSink        │
//! │  ────────────                ─────────                  ───────        │
//! │  log_verbose(..) ──┐                                                   │
//! │  log_debug(..)   ──┤                                                   │
//! │  log_info(..)    ──┼──►  LogRecord { level: pinned } ──► TracingSink   │
//! │  log_warn(..)    ──┤                                  or BufferedSink  │
//! │  log_error(..)   ──┘                                  or your own      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine logs far more than a host usually wants, and at levels that
//! do not match the host's own policy, so the bridge discards the level the
//! engine picked and stamps every record with one configurable level.

mod bridge;
mod sinks;

pub use bridge::LogBridge;
pub use sinks::{BufferedSink, TracingSink, MEDIA_ENGINE_TARGET};

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Severity of a forwarded log record, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Finest-grained output
    Verbose,
    /// Debugging output
    Debug,
    /// Informational output
    Info,
    /// Something unexpected that did not stop the engine
    Warn,
    /// A failure inside the engine
    Error,
}

impl LogLevel {
    /// Lower-case name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbose" | "trace" => Ok(LogLevel::Verbose),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::InvalidConfig(format!("unknown log level: {other}"))),
        }
    }
}

/// One line of engine output, after the bridge pinned its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// The message; the engine may hand over none at all.
    pub message: Option<String>,
    /// Source file inside the engine.
    pub file: String,
    /// Source function inside the engine.
    pub function: String,
    /// Source line inside the engine.
    pub line: u32,
    /// Level the record is delivered at.
    pub level: LogLevel,
}

/// Destination for bridged log records.
pub trait LogSink: Send + Sync {
    /// Consume one record. Sinks cannot fail.
    fn write(&self, record: LogRecord);
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn write(&self, record: LogRecord) {
        (**self).write(record)
    }
}

/// Callback interface the media engine logs through.
///
/// One entry point per engine severity. Implementations must not block.
pub trait MediaEngineLogger: Send + Sync {
    /// Engine verbose output
    fn log_verbose(&self, message: Option<&str>, file: &str, function: &str, line: u32);
    /// Engine debug output
    fn log_debug(&self, message: Option<&str>, file: &str, function: &str, line: u32);
    /// Engine info output
    fn log_info(&self, message: Option<&str>, file: &str, function: &str, line: u32);
    /// Engine warnings
    fn log_warn(&self, message: Option<&str>, file: &str, function: &str, line: u32);
    /// Engine errors
    fn log_error(&self, message: Option<&str>, file: &str, function: &str, line: u32);
}
