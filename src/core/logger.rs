//! The emitting interface shared by dispatchers and sub-loggers

use super::log_level::Level;
use super::log_record::{LogRecord, Module};
use std::sync::Arc;

/// Something records can be emitted into.
///
/// Only [`Logger::log_record`] is required. The convenience methods capture
/// the caller's file, line and column through `#[track_caller]`; use the
/// crate's macros to capture the enclosing function name as well.
///
/// Every method returns the record that was built, whether or not it was
/// dispatched.
///
/// ```
/// use logbook::prelude::*;
///
/// let dispatcher = Dispatcher::new("app");
/// let record = dispatcher.warn("disk almost full");
/// assert_eq!(record.level, Level::Warn);
/// ```
pub trait Logger: Send + Sync {
    fn log_record(&self, record: LogRecord) -> LogRecord;

    #[track_caller]
    fn log(&self, level: Level, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log_record(LogRecord::new(level, message))
    }

    /// Like [`Logger::log`] with an explicit module
    #[track_caller]
    fn log_in(&self, level: Level, module: impl Into<Module>, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log_record(LogRecord::new(level, message).with_module(module))
    }

    #[inline]
    #[track_caller]
    fn trace(&self, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log(Level::Trace, message)
    }

    #[inline]
    #[track_caller]
    fn debug(&self, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log(Level::Debug, message)
    }

    #[inline]
    #[track_caller]
    fn info(&self, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log(Level::Info, message)
    }

    #[inline]
    #[track_caller]
    fn warn(&self, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log(Level::Warn, message)
    }

    #[inline]
    #[track_caller]
    fn error(&self, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log(Level::Error, message)
    }

    #[inline]
    #[track_caller]
    fn fatal(&self, message: impl Into<String>) -> LogRecord
    where
        Self: Sized,
    {
        self.log(Level::Fatal, message)
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log_record(&self, record: LogRecord) -> LogRecord {
        (**self).log_record(record)
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log_record(&self, record: LogRecord) -> LogRecord {
        (**self).log_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture {
        records: Mutex<Vec<LogRecord>>,
    }

    impl Logger for Capture {
        fn log_record(&self, record: LogRecord) -> LogRecord {
            self.records.lock().push(record.clone());
            record
        }
    }

    #[test]
    fn test_convenience_methods_fix_level_and_capture_caller() {
        let capture = Capture::default();
        let line = line!() + 1;
        let record = capture.error("boom");

        assert_eq!(record.level, Level::Error);
        assert_eq!(record.origin.file, "logger.rs");
        assert_eq!(record.origin.line, line);
        assert!(record.module.is_default());
        assert_eq!(capture.records.lock().len(), 1);
    }

    #[test]
    fn test_log_in_sets_module_through_arc() {
        let capture: Arc<dyn Logger> = Arc::new(Capture::default());
        let record = capture.log_in(Level::Debug, "Network", "connected");
        assert_eq!(record.module.name(), "Network");
        assert_eq!(record.level, Level::Debug);
    }
}
