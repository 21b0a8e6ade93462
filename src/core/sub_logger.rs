//! Scoped logger that rewrites records before forwarding them

use super::log_level::Level;
use super::log_record::{LogRecord, Module};
use super::logger::Logger;

/// Forwards to a parent logger after forcing a module and remapping levels.
///
/// Records whose level is not in `available_levels` are sent with
/// `default_level` instead (when one is set).
///
/// ```
/// use logbook::prelude::*;
///
/// let dispatcher = Dispatcher::new("app");
/// let network = SubLogger::new(dispatcher)
///     .with_module("Network")
///     .with_available_levels([Level::Warn, Level::Error])
///     .with_default_level(Level::Warn);
///
/// let record = network.trace("handshake");
/// assert_eq!(record.level, Level::Warn);
/// assert_eq!(record.module.name(), "Network");
/// ```
#[derive(Debug, Clone)]
pub struct SubLogger<L: Logger> {
    parent: L,
    available_levels: Vec<Level>,
    default_level: Option<Level>,
    module: Option<Module>,
}

impl<L: Logger> SubLogger<L> {
    pub fn new(parent: L) -> Self {
        Self {
            parent,
            available_levels: Vec::new(),
            default_level: None,
            module: None,
        }
    }

    #[must_use]
    pub fn with_available_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.available_levels = levels.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<Module>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn parent(&self) -> &L {
        &self.parent
    }

    fn rewrite(&self, mut record: LogRecord) -> LogRecord {
        if !self.available_levels.contains(&record.level) {
            if let Some(level) = self.default_level {
                record.level = level;
            }
        }
        if let Some(ref module) = self.module {
            record.module = module.clone();
        }
        record
    }
}

impl<L: Logger> Logger for SubLogger<L> {
    fn log_record(&self, record: LogRecord) -> LogRecord {
        self.parent.log_record(self.rewrite(record))
    }
}
