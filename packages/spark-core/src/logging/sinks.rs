//! Built-in log sinks.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::{LogLevel, LogRecord, LogSink};

/// Target every engine event is emitted on.
pub const MEDIA_ENGINE_TARGET: &str = "spark_core::media_engine";

/// Emits records as `tracing` events on [`MEDIA_ENGINE_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! engine_event {
    ($level:expr, $record:ident) => {
        match &$record.message {
            Some(message) => tracing::event!(
                target: MEDIA_ENGINE_TARGET,
                $level,
                file = %$record.file,
                function = %$record.function,
                line = $record.line,
                "{}",
                message
            ),
            None => tracing::event!(
                target: MEDIA_ENGINE_TARGET,
                $level,
                file = %$record.file,
                function = %$record.function,
                line = $record.line,
                message_missing = true,
                ""
            ),
        }
    };
}

impl LogSink for TracingSink {
    fn write(&self, record: LogRecord) {
        match record.level {
            LogLevel::Verbose => engine_event!(tracing::Level::TRACE, record),
            LogLevel::Debug => engine_event!(tracing::Level::DEBUG, record),
            LogLevel::Info => engine_event!(tracing::Level::INFO, record),
            LogLevel::Warn => engine_event!(tracing::Level::WARN, record),
            LogLevel::Error => engine_event!(tracing::Level::ERROR, record),
        }
    }
}

/// Keeps the most recent records in memory.
///
/// Once `capacity` records are held the oldest one is evicted for each new
/// arrival.
#[derive(Debug)]
pub struct BufferedSink {
    capacity: usize,
    records: Mutex<VecDeque<LogRecord>>,
}

impl BufferedSink {
    /// Sink holding at most `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum number of records held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Remove and return every held record, oldest first.
    pub fn drain(&self) -> Vec<LogRecord> {
        self.records.lock().drain(..).collect()
    }
}

impl LogSink for BufferedSink {
    fn write(&self, record: LogRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }
}
