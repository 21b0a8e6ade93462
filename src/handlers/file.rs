//! Plain file handler

use crate::core::error::{LoggerError, Result};
use crate::core::formatter::{LogFormatter, TextFormatter};
use crate::core::handler::{Handler, HandlerState};
use crate::core::log_record::LogRecord;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends formatted records to a single file.
///
/// The handler starts closed; [`FileHandler::open`] creates the parent
/// directory and the file as needed. Writes while closed are dropped.
/// Every record is flushed as soon as it is written.
pub struct FileHandler {
    identifier: String,
    state: HandlerState,
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    formatter: Box<dyn LogFormatter>,
}

impl FileHandler {
    pub fn new(identifier: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            state: HandlerState::new(),
            path: path.into(),
            writer: Mutex::new(None),
            formatter: Box::new(TextFormatter::default()),
        }
    }

    /// Create and open in one step
    pub fn open_at(identifier: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let handler = Self::new(identifier, path);
        handler.open()?;
        Ok(handler)
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl LogFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }

    /// Open the file for appending; no-op when already open
    pub fn open(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        if writer.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::filesystem("creating log directory", parent.display().to_string(), e)
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::filesystem("opening log file", self.path.display().to_string(), e)
            })?;
        *writer = Some(BufWriter::new(file));
        Ok(())
    }

    /// Flush and release the file; the handler can be reopened later
    pub fn close(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Handler for FileHandler {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn state(&self) -> &HandlerState {
        &self.state
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut guard = self.writer.lock();
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };

        let mut line = self.formatter.format(record);
        line.push('\n');
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileHandler {
    fn drop(&mut self) {
        let _ = Handler::flush(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::Level;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/app.log");

        let handler = FileHandler::new("file", &path)
            .with_formatter(TextFormatter::new().with_date(false).with_file(false));
        assert!(handler.is_closed());
        handler.open().unwrap();
        assert!(!handler.is_closed());

        handler.write(&LogRecord::new(Level::Info, "first")).unwrap();
        handler.close().unwrap();

        // Dropped while closed
        handler.write(&LogRecord::new(Level::Info, "lost")).unwrap();

        handler.open().unwrap();
        handler.write(&LogRecord::new(Level::Warn, "second")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[INFO] first\n[WARN] second\n");
    }

    #[test]
    fn test_open_reports_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let handler = FileHandler::new("file", blocker.join("app.log"));
        let err = handler.open().unwrap_err();
        assert!(matches!(err, LoggerError::Filesystem { .. }));
        assert!(handler.is_closed());
    }
}
