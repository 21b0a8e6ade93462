//! In-memory handler

use crate::core::error::Result;
use crate::core::handler::{Handler, HandlerState};
use crate::core::log_record::LogRecord;
use parking_lot::Mutex;

/// Keeps every accepted record in memory, in arrival order
pub struct SequenceHandler {
    identifier: String,
    state: HandlerState,
    records: Mutex<Vec<LogRecord>>,
}

impl SequenceHandler {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: HandlerState::new(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the records written so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Handler for SequenceHandler {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn state(&self) -> &HandlerState {
        &self.state
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}
