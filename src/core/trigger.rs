//! Event sources that push records into dispatchers from outside normal call paths

use super::diagnostics;
use super::dispatcher::Dispatcher;
use super::log_level::Level;
use super::log_record::{LogRecord, Origin};
use super::logger::Logger;
use super::worker::DEFAULT_SHUTDOWN_TIMEOUT;
use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

pub trait LogTrigger: Send + Sync {
    /// Stable identifier, unique within a dispatcher
    fn identifier(&self) -> &str;

    /// Called when the trigger is added to `dispatcher`
    fn on_attach(&self, dispatcher: &Dispatcher);

    /// Called when the trigger is removed from `dispatcher`
    fn on_detach(&self, dispatcher: &Dispatcher);
}

/// Logs a `Fatal` record to every attached dispatcher when the process panics.
///
/// The panic hook is installed on first attach and chains to the hook that
/// was registered before it. After logging, the hook waits (bounded by
/// [`DEFAULT_SHUTDOWN_TIMEOUT`]) for each dispatcher's worker to drain so the
/// record reaches disk before the previous hook runs.
///
/// Panics raised by handlers, listeners or worker tasks are caught by the
/// library and reported through [`diagnostics`]; the hook ignores them.
///
/// Attached dispatchers are kept alive until they are detached.
///
/// ```no_run
/// use logbook::prelude::*;
///
/// let dispatcher = Dispatcher::new("app");
/// dispatcher.add_trigger(PanicTrigger::shared());
/// ```
pub struct PanicTrigger {
    identifier: String,
    dispatchers: Mutex<Vec<Dispatcher>>,
    hook_installed: AtomicBool,
}

impl PanicTrigger {
    pub const IDENTIFIER: &'static str = "logbook.panic-trigger";

    /// The process-wide instance; there is only one panic hook
    pub fn shared() -> Arc<PanicTrigger> {
        static SHARED: OnceLock<Arc<PanicTrigger>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| {
            Arc::new(PanicTrigger {
                identifier: Self::IDENTIFIER.to_string(),
                dispatchers: Mutex::new(Vec::new()),
                hook_installed: AtomicBool::new(false),
            })
        }))
    }

    /// Number of dispatchers currently attached
    pub fn attached(&self) -> usize {
        self.dispatchers.lock().len()
    }

    /// Log `message` as `Fatal` to every attached dispatcher and wait for
    /// their workers to drain.
    ///
    /// Embedders that trap crash signals themselves can call this directly.
    #[track_caller]
    pub fn report(&self, message: impl Into<String>) {
        let record = LogRecord::new(Level::Fatal, message);
        self.report_record(record);
    }

    fn report_record(&self, record: LogRecord) {
        let dispatchers = self.dispatchers.lock().clone();

        for dispatcher in dispatchers.iter() {
            dispatcher.log_record(record.clone());
        }

        for dispatcher in dispatchers.iter() {
            if !dispatcher.sync_timeout(DEFAULT_SHUTDOWN_TIMEOUT) {
                eprintln!(
                    "[LOGBOOK] Dispatcher '{}' did not drain within {:?} after a panic",
                    dispatcher.identifier(),
                    DEFAULT_SHUTDOWN_TIMEOUT
                );
            }
        }
    }

    fn install_hook(&self) {
        if self.hook_installed.swap(true, Ordering::AcqRel) {
            return;
        }

        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if diagnostics::is_isolating() {
                previous(info);
                return;
            }

            let payload = diagnostics::panic_message(info.payload());
            let thread = std::thread::current();
            let message = format!(
                "Panic: {}.\nThread: {}\nBacktrace:\n{}",
                payload,
                thread.name().unwrap_or("<unnamed>"),
                Backtrace::capture()
            );

            let mut record = LogRecord::new(Level::Fatal, message);
            if let Some(location) = info.location() {
                record = record.with_origin(Origin::from_location(location));
            }
            PanicTrigger::shared().report_record(record);

            previous(info);
        }));
    }
}

impl LogTrigger for PanicTrigger {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn on_attach(&self, dispatcher: &Dispatcher) {
        {
            let mut dispatchers = self.dispatchers.lock();
            if dispatchers
                .iter()
                .any(|d| d.identifier() == dispatcher.identifier())
            {
                return;
            }
            dispatchers.push(dispatcher.clone());
        }
        self.install_hook();
    }

    fn on_detach(&self, dispatcher: &Dispatcher) {
        self.dispatchers
            .lock()
            .retain(|d| d.identifier() != dispatcher.identifier());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::worker::Worker;
    use crate::core::handler::{Handler, HandlerState};
    use crate::handlers::memory::SequenceHandler;
    use std::time::Duration;

    struct Exploding {
        state: HandlerState,
    }

    impl Handler for Exploding {
        fn identifier(&self) -> &str {
            "exploding"
        }

        fn state(&self) -> &HandlerState {
            &self.state
        }

        fn write(&self, record: &LogRecord) -> crate::core::error::Result<()> {
            panic!("exploding handler 4b2e: {}", record.message);
        }
    }

    #[test]
    fn test_panic_is_logged_as_fatal() {
        let memory = Arc::new(SequenceHandler::new("memory"));
        let dispatcher = Dispatcher::builder()
            .identifier("panic-trigger-test")
            .worker(Worker::spawn("panic-trigger-test").unwrap())
            .shared_handler(memory.clone())
            .build();
        assert!(dispatcher.add_trigger(PanicTrigger::shared()));
        assert!(!dispatcher.add_trigger(PanicTrigger::shared()));

        let result = std::panic::catch_unwind(|| panic!("trigger test 7f3a"));
        assert!(result.is_err());
        dispatcher.sync().unwrap();

        let fatal: Vec<LogRecord> = memory
            .records()
            .into_iter()
            .filter(|r| r.message.contains("trigger test 7f3a"))
            .collect();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].level, Level::Fatal);
        assert_eq!(fatal[0].origin.file, "trigger.rs");

        assert!(dispatcher.remove_trigger(PanicTrigger::IDENTIFIER).is_some());
        let _ = std::panic::catch_unwind(|| panic!("after detach 7f3a"));
        dispatcher.sync().unwrap();
        assert!(!memory
            .records()
            .iter()
            .any(|r| r.message.contains("after detach 7f3a")));
    }

    #[test]
    fn test_report_logs_to_attached_dispatchers() {
        let memory = Arc::new(SequenceHandler::new("memory"));
        let dispatcher = Dispatcher::builder()
            .identifier("panic-report-test")
            .worker(Worker::spawn("panic-report-test").unwrap())
            .shared_handler(memory.clone())
            .build();
        dispatcher.add_trigger(PanicTrigger::shared());

        PanicTrigger::shared().report("signal received 9c1e");
        assert!(memory
            .records()
            .iter()
            .any(|r| r.level == Level::Fatal && r.message == "signal received 9c1e"));

        dispatcher.remove_trigger(PanicTrigger::IDENTIFIER);
    }

    #[test]
    fn test_handler_panic_is_not_fed_back_as_fatal() {
        let memory = Arc::new(SequenceHandler::new("memory"));
        let dispatcher = Dispatcher::builder()
            .identifier("panic-isolation-test")
            .worker(Worker::spawn("panic-isolation-test").unwrap())
            .handler(Exploding {
                state: HandlerState::new(),
            })
            .shared_handler(memory.clone())
            .build();
        dispatcher.add_trigger(PanicTrigger::shared());

        dispatcher.info("one record 4b2e");
        dispatcher.sync().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        dispatcher.sync().unwrap();

        let records = memory.records();
        assert_eq!(
            records
                .iter()
                .filter(|r| r.message == "one record 4b2e")
                .count(),
            1
        );
        assert!(!records
            .iter()
            .any(|r| r.message.contains("exploding handler 4b2e")));
        assert!(dispatcher.metrics().failed() >= 1);

        dispatcher.remove_trigger(PanicTrigger::IDENTIFIER);
    }
}
