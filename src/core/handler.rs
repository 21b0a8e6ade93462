//! Handler trait for log destinations

use super::error::Result;
use super::filter::{AcceptAll, LogFilter};
use super::log_record::LogRecord;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Enabled flag and filter shared by every handler.
///
/// Handlers are held behind `Arc` by dispatchers and viewers at the same time,
/// so both settings are mutable through `&self`.
pub struct HandlerState {
    enabled: AtomicBool,
    filter: RwLock<Arc<dyn LogFilter>>,
}

impl HandlerState {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            filter: RwLock::new(Arc::new(AcceptAll)),
        }
    }
}

impl Default for HandlerState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerState")
            .field("enabled", &self.enabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

pub trait Handler: Send + Sync {
    /// Stable identifier, unique within a dispatcher
    fn identifier(&self) -> &str;

    fn state(&self) -> &HandlerState;

    /// Consume one record that passed the enabled check and the filter
    fn write(&self, record: &LogRecord) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.state().enabled.load(Ordering::Acquire)
    }

    fn set_enabled(&self, enabled: bool) {
        self.state().enabled.store(enabled, Ordering::Release);
    }

    fn filter(&self) -> Arc<dyn LogFilter> {
        Arc::clone(&self.state().filter.read())
    }

    fn set_filter(&self, filter: Arc<dyn LogFilter>) {
        *self.state().filter.write() = filter;
    }

    /// Enabled flag first, then the filter
    fn accepts(&self, record: &LogRecord) -> bool {
        // The filter may call back into this handler, so the lock is not held
        self.is_enabled() && self.filter().accepts(record)
    }
}
