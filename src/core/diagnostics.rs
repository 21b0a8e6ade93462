//! Side channel for the library's own failures
//!
//! Asynchronous operations (store inserts, deletes, handler writes on the
//! worker) cannot return errors to whoever queued them. They are reported
//! here instead, as records in the `logbook` module, written synchronously
//! to the diagnostics handler. The default handler prints to stderr.

use super::handler::Handler;
use super::log_level::Level;
use super::log_record::LogRecord;
use crate::handlers::console::ConsoleHandler;
use parking_lot::RwLock;
use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

/// Module name attached to every diagnostic record
pub const DIAGNOSTICS_MODULE: &str = "logbook";

thread_local! {
    static REPORTING: Cell<bool> = const { Cell::new(false) };
    static ISOLATING: Cell<u32> = const { Cell::new(0) };
}

/// Clears the reporting flag even when the diagnostics handler panics
struct ReportingGuard;

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTING.with(|flag| flag.set(false));
    }
}

struct IsolationGuard;

impl IsolationGuard {
    fn enter() -> Self {
        ISOLATING.with(|depth| depth.set(depth.get() + 1));
        IsolationGuard
    }
}

impl Drop for IsolationGuard {
    fn drop(&mut self) {
        ISOLATING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f`, catching a panic it raises.
///
/// Panics caught here are reported through diagnostics by the caller, so
/// [`is_isolating`] lets the panic hook skip them.
pub(crate) fn isolate<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    let _guard = IsolationGuard::enter();
    catch_unwind(AssertUnwindSafe(f))
}

/// True while the current thread runs inside [`isolate`]
pub(crate) fn is_isolating() -> bool {
    ISOLATING.with(|depth| depth.get() > 0)
}

fn slot() -> &'static RwLock<Arc<dyn Handler>> {
    static HANDLER: OnceLock<RwLock<Arc<dyn Handler>>> = OnceLock::new();
    HANDLER.get_or_init(|| RwLock::new(default_handler()))
}

fn default_handler() -> Arc<dyn Handler> {
    Arc::new(ConsoleHandler::stderr("logbook.diagnostics"))
}

/// Route diagnostics to `handler` instead of stderr
pub fn set_handler(handler: Arc<dyn Handler>) {
    *slot().write() = handler;
}

/// Restore the stderr console handler
pub fn reset_handler() {
    *slot().write() = default_handler();
}

#[track_caller]
pub(crate) fn report(level: Level, message: impl Into<String>) {
    let record = LogRecord::new(level, message).with_module(DIAGNOSTICS_MODULE);

    // A diagnostics handler that fails while reporting must not recurse
    if REPORTING.with(|flag| flag.replace(true)) {
        eprintln!("[LOGBOOK {}] {}", record.level, record.message);
        return;
    }
    let _guard = ReportingGuard;

    let handler = Arc::clone(&slot().read());
    if handler.accepts(&record) {
        if let Err(e) = handler.write(&record) {
            eprintln!("[LOGBOOK {}] {} (diagnostics handler failed: {})", record.level, record.message, e);
        }
    }
}

#[track_caller]
pub(crate) fn report_error(message: impl Into<String>) {
    report(Level::Error, message);
}

#[track_caller]
pub(crate) fn report_panic(context: &str, panic_info: &(dyn Any + Send)) {
    report(
        Level::Error,
        format!("{} panicked: {}", context, panic_message(panic_info)),
    );
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
