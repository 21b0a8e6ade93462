//! Fan-out of records to handlers on the background worker

use super::{
    diagnostics,
    error::Result,
    handler::Handler,
    log_record::LogRecord,
    logger::Logger,
    metrics::DispatchMetrics,
    trigger::LogTrigger,
    worker::Worker,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Owns an ordered set of handlers and dispatches records to them.
///
/// `Dispatcher` is a cheap handle; clones share the same handlers, triggers
/// and worker. [`Logger::log_record`] returns immediately: the handler scan
/// runs later on the worker, in submission order.
///
/// # Example
/// ```
/// use logbook::prelude::*;
/// use std::sync::Arc;
///
/// let memory = Arc::new(SequenceHandler::new("memory"));
/// let dispatcher = Dispatcher::builder()
///     .identifier("app")
///     .shared_handler(memory.clone())
///     .build();
///
/// dispatcher.info("started");
/// dispatcher.sync().unwrap();
/// assert_eq!(memory.len(), 1);
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    identifier: String,
    enabled: AtomicBool,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    triggers: Mutex<Vec<Arc<dyn LogTrigger>>>,
    worker: Arc<Worker>,
    metrics: DispatchMetrics,
}

impl Dispatcher {
    /// A dispatcher on the process-wide shared worker
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_worker(identifier, Worker::shared())
    }

    pub fn with_worker(identifier: impl Into<String>, worker: Arc<Worker>) -> Self {
        Self {
            inner: Arc::new(Inner {
                identifier: identifier.into(),
                enabled: AtomicBool::new(true),
                handlers: RwLock::new(Vec::new()),
                triggers: Mutex::new(Vec::new()),
                worker,
                metrics: DispatchMetrics::new(),
            }),
        }
    }

    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// While disabled, records are still built and returned but never dispatched
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
    }

    /// Append a handler; no-op if one with the same identifier is present
    pub fn add_handler(&self, handler: Arc<dyn Handler>) -> bool {
        let mut handlers = self.inner.handlers.write();
        if handlers
            .iter()
            .any(|h| h.identifier() == handler.identifier())
        {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Remove the handler with `identifier`, returning it if present.
    ///
    /// Records already queued but not yet dispatched will not reach it.
    pub fn remove_handler(&self, identifier: &str) -> Option<Arc<dyn Handler>> {
        let mut handlers = self.inner.handlers.write();
        let index = handlers.iter().position(|h| h.identifier() == identifier)?;
        Some(handlers.remove(index))
    }

    pub fn handler(&self, identifier: &str) -> Option<Arc<dyn Handler>> {
        self.inner
            .handlers
            .read()
            .iter()
            .find(|h| h.identifier() == identifier)
            .cloned()
    }

    /// Handlers in insertion order
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.inner.handlers.read().clone()
    }

    /// Attach a trigger and call its `on_attach`; no-op for a known identifier
    pub fn add_trigger(&self, trigger: Arc<dyn LogTrigger>) -> bool {
        {
            let mut triggers = self.inner.triggers.lock();
            if triggers
                .iter()
                .any(|t| t.identifier() == trigger.identifier())
            {
                return false;
            }
            triggers.push(Arc::clone(&trigger));
        }
        trigger.on_attach(self);
        true
    }

    /// Detach a trigger and call its `on_detach`
    pub fn remove_trigger(&self, identifier: &str) -> Option<Arc<dyn LogTrigger>> {
        let trigger = {
            let mut triggers = self.inner.triggers.lock();
            let index = triggers.iter().position(|t| t.identifier() == identifier)?;
            triggers.remove(index)
        };
        trigger.on_detach(self);
        Some(trigger)
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.inner.worker
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.inner.metrics
    }

    /// Block until every record logged so far has been handed to the handlers
    pub fn sync(&self) -> Result<()> {
        self.inner.worker.sync()
    }

    /// [`Dispatcher::sync`] with an upper bound; `false` on timeout
    pub fn sync_timeout(&self, timeout: Duration) -> bool {
        self.inner.worker.sync_timeout(timeout)
    }

    /// Flush every handler after the records queued before this call
    pub fn flush(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.inner.worker.run_sync(move || inner.flush_handlers())?
    }

    fn submit(&self, record: LogRecord) {
        let inner = Arc::clone(&self.inner);
        let result = self.inner.worker.submit(move || inner.dispatch(&record));
        if let Err(e) = result {
            diagnostics::report_error(format!(
                "Dispatcher '{}' could not queue a record: {}",
                self.inner.identifier, e
            ));
        }
    }
}

impl Inner {
    /// Runs on the worker. Each handler is isolated from the others' panics.
    fn dispatch(&self, record: &LogRecord) {
        let handlers = self.handlers.read().clone();

        for handler in handlers.iter() {
            let outcome = diagnostics::isolate(|| {
                if !handler.accepts(record) {
                    return Ok(false);
                }
                handler.write(record).map(|()| true)
            });

            match outcome {
                Ok(Ok(true)) => {
                    self.metrics.record_delivered();
                }
                Ok(Ok(false)) => {
                    self.metrics.record_filtered();
                }
                Ok(Err(e)) => {
                    self.metrics.record_failed();
                    diagnostics::report_error(format!(
                        "Handler '{}' failed to write: {}",
                        handler.identifier(),
                        e
                    ));
                }
                Err(panic_info) => {
                    self.metrics.record_failed();
                    diagnostics::report_panic(
                        &format!("Handler '{}'", handler.identifier()),
                        panic_info.as_ref(),
                    );
                }
            }
        }
    }

    /// First error wins; the remaining handlers are still flushed
    fn flush_handlers(&self) -> Result<()> {
        let handlers = self.handlers.read().clone();
        let mut first_error = None;

        for handler in handlers.iter() {
            match diagnostics::isolate(|| handler.flush()) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    diagnostics::report_error(format!(
                        "Handler '{}' flush failed: {}",
                        handler.identifier(),
                        e
                    ));
                    first_error.get_or_insert(e);
                }
                Err(panic_info) => {
                    diagnostics::report_panic(
                        &format!("Handler '{}' flush", handler.identifier()),
                        panic_info.as_ref(),
                    );
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for Inner {
    // Every queued dispatch holds a reference, so nothing is pending here
    fn drop(&mut self) {
        let _ = self.flush_handlers();
    }
}

impl Logger for Dispatcher {
    fn log_record(&self, record: LogRecord) -> LogRecord {
        if !self.is_enabled() {
            self.inner.metrics.record_suppressed();
            return record;
        }

        self.inner.metrics.record_dispatched();
        self.submit(record.clone());
        record
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: Vec<String> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|h| h.identifier().to_string())
            .collect();
        f.debug_struct("Dispatcher")
            .field("identifier", &self.inner.identifier)
            .field("enabled", &self.is_enabled())
            .field("handlers", &handlers)
            .field("worker", &self.inner.worker)
            .finish()
    }
}

/// Builder for constructing a [`Dispatcher`] with a fluent API
///
/// # Example
/// ```
/// use logbook::prelude::*;
///
/// let dispatcher = Dispatcher::builder()
///     .identifier("app")
///     .handler(ConsoleHandler::new("console"))
///     .worker(Worker::spawn("app-log-worker").unwrap())
///     .build();
/// assert_eq!(dispatcher.handlers().len(), 1);
/// ```
pub struct DispatcherBuilder {
    identifier: String,
    enabled: bool,
    worker: Option<Arc<Worker>>,
    handlers: Vec<Arc<dyn Handler>>,
    triggers: Vec<Arc<dyn LogTrigger>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            identifier: "logbook".to_string(),
            enabled: true,
            worker: None,
            handlers: Vec::new(),
            triggers: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Use a dedicated worker instead of [`Worker::shared`]
    #[must_use = "builder methods return a new value"]
    pub fn worker(mut self, worker: Arc<Worker>) -> Self {
        self.worker = Some(worker);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Add a handler that is also referenced elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn trigger(mut self, trigger: Arc<dyn LogTrigger>) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn build(self) -> Dispatcher {
        let worker = self.worker.unwrap_or_else(Worker::shared);
        let dispatcher = Dispatcher::with_worker(self.identifier, worker);
        dispatcher.set_enabled(self.enabled);

        for handler in self.handlers {
            dispatcher.add_handler(handler);
        }
        for trigger in self.triggers {
            dispatcher.add_trigger(trigger);
        }

        dispatcher
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
