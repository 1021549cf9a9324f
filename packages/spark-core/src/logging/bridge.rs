//! Media engine log bridge.

use super::{LogLevel, LogRecord, LogSink, MediaEngineLogger};

/// Forwards media engine callbacks to a [`LogSink`] at one pinned level.
///
/// The level each callback name implies is dropped: `log_error` and
/// `log_verbose` both arrive at the sink as `level`. Pin the level to what
/// the host wants engine output treated as (the SDK default is `Info`).
#[derive(Debug, Clone)]
pub struct LogBridge<S> {
    sink: S,
    level: LogLevel,
}

impl<S: LogSink> LogBridge<S> {
    /// Bridge into `sink`, pinning every record to `level`.
    pub fn new(sink: S, level: LogLevel) -> Self {
        Self { sink, level }
    }

    /// Level records are delivered at.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The sink records are delivered to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn forward(&self, message: Option<&str>, file: &str, function: &str, line: u32) {
        self.sink.write(LogRecord {
            message: message.map(str::to_owned),
            file: file.to_owned(),
            function: function.to_owned(),
            line,
            level: self.level,
        });
    }
}

impl<S: LogSink> MediaEngineLogger for LogBridge<S> {
    fn log_verbose(&self, message: Option<&str>, file: &str, function: &str, line: u32) {
        self.forward(message, file, function, line);
    }

    fn log_debug(&self, message: Option<&str>, file: &str, function: &str, line: u32) {
        self.forward(message, file, function, line);
    }

    fn log_info(&self, message: Option<&str>, file: &str, function: &str, line: u32) {
        self.forward(message, file, function, line);
    }

    fn log_warn(&self, message: Option<&str>, file: &str, function: &str, line: u32) {
        self.forward(message, file, function, line);
    }

    fn log_error(&self, message: Option<&str>, file: &str, function: &str, line: u32) {
        self.forward(message, file, function, line);
    }
}
