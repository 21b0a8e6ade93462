//! Time-windowed rotating file handler
//!
//! Log files live in one directory and are named after the moment their
//! window started, formatted with [`RotationConfig::file_name_format`]. Opening
//! the handler reuses the newest file while its window is still running and
//! starts a new file otherwise. Files never get renamed or rewritten.

use crate::core::diagnostics;
use crate::core::error::{LoggerError, Result};
use crate::core::formatter::{LogFormatter, TextFormatter};
use crate::core::handler::{Handler, HandlerState};
use crate::core::log_record::LogRecord;
use crate::handlers::file::FileHandler;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Window after which a new file is started
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5 * 3600);

/// File stem format, interpreted in UTC
pub const DEFAULT_FILE_NAME_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Configuration for [`RotatingFileHandler`]
///
/// # Examples
///
/// ```
/// use logbook::handlers::RotationConfig;
/// use std::time::Duration;
///
/// let config = RotationConfig::new("/var/log/app")
///     .with_extension("txt")
///     .with_min_interval(Duration::from_secs(24 * 3600))
///     .with_max_files(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub directory: PathBuf,
    /// Extension without the leading dot
    pub extension: String,
    /// chrono format string for file stems; must round-trip to a date and time
    pub file_name_format: String,
    pub min_interval: Duration,
    /// Oldest files beyond this count are deleted when a file is started
    pub max_files: Option<usize>,
}

impl RotationConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            extension: "log".to_string(),
            file_name_format: DEFAULT_FILE_NAME_FORMAT.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            max_files: None,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_file_name_format(mut self, format: impl Into<String>) -> Self {
        self.file_name_format = format.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    /// Check that file names can be produced and parsed back
    pub fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(LoggerError::config(
                "RotationConfig",
                format!("invalid extension '{}'", self.extension),
            ));
        }
        if self.max_files == Some(0) {
            return Err(LoggerError::config("RotationConfig", "max_files must be at least 1"));
        }

        let mut stem = String::new();
        if std::fmt::write(
            &mut stem,
            format_args!("{}", Utc::now().format(&self.file_name_format)),
        )
        .is_err()
            || self.parse_stem(&stem).is_none()
        {
            return Err(LoggerError::config(
                "RotationConfig",
                format!("file name format '{}' does not round-trip", self.file_name_format),
            ));
        }
        Ok(())
    }

    fn parse_stem(&self, stem: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(stem, &self.file_name_format)
            .ok()
            .map(|naive| naive.and_utc())
    }

    fn file_for(&self, now: DateTime<Utc>) -> RotationFile {
        let stem = now.format(&self.file_name_format).to_string();
        RotationFile {
            path: self.directory.join(format!("{}.{}", stem, self.extension)),
            // Names carry only the format's precision; track what parses back
            started: self.parse_stem(&stem).unwrap_or(now),
        }
    }

    fn window_expired(&self, started: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let interval = TimeDelta::from_std(self.min_interval).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(started) >= interval
    }
}

/// One file of the rotation set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationFile {
    pub path: PathBuf,
    /// Start of the file's window, parsed from its name
    pub started: DateTime<Utc>,
}

struct ActiveFile {
    file: RotationFile,
    handler: FileHandler,
}

#[derive(Default)]
struct Rotation {
    /// Ascending by `started`
    files: Vec<RotationFile>,
    active: Option<ActiveFile>,
}

/// Handler writing to a set of time-windowed files.
///
/// Starts closed. While open, records go to the active file; a write after
/// the active window expired starts a new file first.
///
/// ```no_run
/// use logbook::prelude::*;
/// use logbook::handlers::{RotatingFileHandler, RotationConfig};
///
/// # fn main() -> logbook::Result<()> {
/// let handler = RotatingFileHandler::new("app.files", RotationConfig::new("logs"))?;
/// handler.open()?;
/// println!("writing to {:?}", handler.current_file());
/// # Ok(())
/// # }
/// ```
pub struct RotatingFileHandler {
    identifier: String,
    state: HandlerState,
    config: RotationConfig,
    formatter: Arc<dyn LogFormatter>,
    rotation: Mutex<Rotation>,
}

impl RotatingFileHandler {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` does not validate
    pub fn new(identifier: impl Into<String>, config: RotationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            identifier: identifier.into(),
            state: HandlerState::new(),
            config,
            formatter: Arc::new(TextFormatter::default()),
            rotation: Mutex::new(Rotation::default()),
        })
    }

    /// Create and open in one step
    pub fn open_with(identifier: impl Into<String>, config: RotationConfig) -> Result<Self> {
        let handler = Self::new(identifier, config)?;
        handler.open()?;
        Ok(handler)
    }

    /// Takes effect for files opened afterwards
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl LogFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.rotation.lock().active.is_none()
    }

    /// The file records are currently written to
    pub fn current_file(&self) -> Option<RotationFile> {
        self.rotation
            .lock()
            .active
            .as_ref()
            .map(|active| active.file.clone())
    }

    /// Every tracked file, oldest first
    pub fn files(&self) -> Vec<RotationFile> {
        self.rotation.lock().files.clone()
    }

    /// Scan the directory and open the active file; no-op when already open
    pub fn open(&self) -> Result<()> {
        let mut rotation = self.rotation.lock();
        if rotation.active.is_some() {
            return Ok(());
        }
        self.open_locked(&mut rotation, Utc::now())
    }

    pub fn close(&self) -> Result<()> {
        match self.rotation.lock().active.take() {
            Some(active) => active.handler.close(),
            None => Ok(()),
        }
    }

    /// Delete the active file and continue in a fresh or reused one.
    ///
    /// No-op when closed.
    pub fn delete_current_log_file(&self) -> Result<()> {
        let mut rotation = self.rotation.lock();
        let Some(path) = rotation.active.as_ref().map(|a| a.file.path.clone()) else {
            return Ok(());
        };
        self.delete_locked(&mut rotation, &path)
    }

    /// Delete one tracked file; untracked paths are left alone
    pub fn delete_log_file(&self, path: &Path) -> Result<()> {
        let mut rotation = self.rotation.lock();
        self.delete_locked(&mut rotation, path)
    }

    /// Delete every tracked file.
    ///
    /// When open, the handler ends up writing to exactly one new file.
    /// Continues past failures and returns the first one.
    pub fn delete_all_log_files(&self) -> Result<()> {
        let mut rotation = self.rotation.lock();
        let snapshot: Vec<PathBuf> = rotation.files.iter().map(|f| f.path.clone()).collect();

        let mut first_error = None;
        for path in snapshot {
            if let Err(e) = self.delete_locked(&mut rotation, &path) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn open_locked(&self, rotation: &mut Rotation, now: DateTime<Utc>) -> Result<()> {
        let directory = &self.config.directory;
        fs::create_dir_all(directory).map_err(|e| {
            LoggerError::filesystem("creating log directory", directory.display().to_string(), e)
        })?;

        let mut files = self.scan(now)?;
        let file = match files.last() {
            Some(newest) if !self.config.window_expired(newest.started, now) => newest.clone(),
            _ => {
                let file = self.config.file_for(now);
                if !files.iter().any(|f| f.path == file.path) {
                    files.push(file.clone());
                }
                file
            }
        };

        let handler = FileHandler::new(format!("{}.file", self.identifier), &file.path)
            .with_formatter(Arc::clone(&self.formatter));
        handler.open()?;

        rotation.files = files;
        rotation.active = Some(ActiveFile { file, handler });
        self.prune(rotation);
        Ok(())
    }

    /// Rotation files in the directory, oldest first; future-dated names are ignored
    fn scan(&self, now: DateTime<Utc>) -> Result<Vec<RotationFile>> {
        let directory = &self.config.directory;
        let entries = fs::read_dir(directory).map_err(|e| {
            LoggerError::filesystem("listing log directory", directory.display().to_string(), e)
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.config.extension.as_str()) {
                continue;
            }
            let Some(started) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| self.config.parse_stem(stem))
            else {
                continue;
            };
            if started <= now {
                files.push(RotationFile { path, started });
            }
        }

        files.sort_by(|a, b| a.started.cmp(&b.started).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }

    fn prune(&self, rotation: &mut Rotation) {
        let Some(max_files) = self.config.max_files else {
            return;
        };
        let active_path = rotation.active.as_ref().map(|a| a.file.path.clone());

        while rotation.files.len() > max_files {
            let Some(index) = rotation
                .files
                .iter()
                .position(|f| Some(&f.path) != active_path.as_ref())
            else {
                break;
            };
            let oldest = rotation.files.remove(index);
            if let Err(e) = remove_file(&oldest.path) {
                diagnostics::report_error(format!(
                    "Rotating handler '{}' could not prune old file: {}",
                    self.identifier, e
                ));
            }
        }
    }

    fn delete_locked(&self, rotation: &mut Rotation, path: &Path) -> Result<()> {
        let is_active = rotation
            .active
            .as_ref()
            .is_some_and(|active| active.file.path == path);

        if is_active {
            if let Some(active) = rotation.active.take() {
                active.handler.close()?;
            }
        }

        let removed = match rotation.files.iter().position(|f| f.path == path) {
            Some(index) => remove_file(path).map(|()| {
                rotation.files.remove(index);
            }),
            None => Ok(()),
        };

        if is_active {
            self.open_locked(rotation, Utc::now())?;
        }
        removed
    }

    fn roll_over_if_expired(&self, rotation: &mut Rotation, now: DateTime<Utc>) -> Result<()> {
        let expired = rotation
            .active
            .as_ref()
            .is_some_and(|active| self.config.window_expired(active.file.started, now));
        if !expired {
            return Ok(());
        }

        if let Some(active) = rotation.active.take() {
            active.handler.close()?;
        }
        self.open_locked(rotation, now)
    }
}

fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LoggerError::filesystem(
            "removing log file",
            path.display().to_string(),
            e,
        )),
    }
}

impl Handler for RotatingFileHandler {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn state(&self) -> &HandlerState {
        &self.state
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut rotation = self.rotation.lock();
        if rotation.active.is_none() {
            return Ok(());
        }
        self.roll_over_if_expired(&mut rotation, Utc::now())?;

        match rotation.active.as_ref() {
            Some(active) => active.handler.write(record),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<()> {
        match self.rotation.lock().active.as_ref() {
            Some(active) => active.handler.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for RotatingFileHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileHandler")
            .field("identifier", &self.identifier)
            .field("config", &self.config)
            .field("current_file", &self.current_file())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::Level;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> RotationConfig {
        RotationConfig::new(dir.path().join("rotation"))
    }

    fn touch(config: &RotationConfig, started: DateTime<Utc>) -> PathBuf {
        fs::create_dir_all(&config.directory).unwrap();
        let file = config.file_for(started);
        fs::write(&file.path, b"old\n").unwrap();
        file.path
    }

    fn list(config: &RotationConfig) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&config.directory)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_open_twice_within_window_reuses_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let first = RotatingFileHandler::open_with("rotating", config.clone()).unwrap();
        let path = first.current_file().unwrap().path;
        first.close().unwrap();

        let second = RotatingFileHandler::open_with("rotating", config.clone()).unwrap();
        assert_eq!(second.current_file().unwrap().path, path);
        assert_eq!(list(&config), vec![path]);
    }

    #[test]
    fn test_open_reuses_recent_file_and_replaces_expired_one() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let now = Utc::now();

        let expired = touch(&config, now - TimeDelta::hours(6));
        let handler = RotatingFileHandler::open_with("rotating", config.clone()).unwrap();
        let current = handler.current_file().unwrap();
        assert_ne!(current.path, expired);
        assert_eq!(handler.files().len(), 2);
        assert_eq!(fs::read_to_string(&expired).unwrap(), "old\n");
        handler.close().unwrap();

        let dir = TempDir::new().unwrap();
        let config = RotationConfig::new(dir.path());
        let recent = touch(&config, now - TimeDelta::hours(1));
        let handler = RotatingFileHandler::open_with("rotating", config).unwrap();
        assert_eq!(handler.current_file().unwrap().path, recent);
    }

    #[test]
    fn test_unrelated_and_future_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        fs::create_dir_all(&config.directory).unwrap();
        fs::write(config.directory.join("notes.log"), b"x").unwrap();
        fs::write(config.directory.join("2020-01-01-000000.txt"), b"x").unwrap();
        fs::create_dir(config.directory.join("2020-01-02-000000.log")).unwrap();
        let future = touch(&config, Utc::now() + TimeDelta::hours(2));

        let handler = RotatingFileHandler::open_with("rotating", config).unwrap();
        let files = handler.files();
        assert_eq!(files.len(), 1);
        assert_ne!(files[0].path, future);
    }

    #[test]
    fn test_write_goes_to_active_file() {
        let dir = TempDir::new().unwrap();
        let handler = RotatingFileHandler::new("rotating", config(&dir))
            .unwrap()
            .with_formatter(TextFormatter::new().with_date(false).with_file(false));

        // Closed: dropped
        handler.write(&LogRecord::new(Level::Info, "lost")).unwrap();

        handler.open().unwrap();
        handler.write(&LogRecord::new(Level::Error, "kept")).unwrap();
        let path = handler.current_file().unwrap().path;
        assert_eq!(fs::read_to_string(path).unwrap(), "[ERROR] kept\n");
    }

    #[test]
    fn test_delete_current_reopens_previous_file_in_window() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir).with_min_interval(Duration::from_secs(3600));
        let previous = touch(&config, Utc::now() - TimeDelta::minutes(30));
        let expired = touch(&config, Utc::now() - TimeDelta::hours(3));

        let handler = RotatingFileHandler::open_with("rotating", config.clone()).unwrap();
        assert_eq!(handler.current_file().unwrap().path, previous);

        handler.delete_current_log_file().unwrap();
        assert!(!previous.exists());
        let current = handler.current_file().unwrap();
        assert_ne!(current.path, previous);
        assert_ne!(current.path, expired);
        assert!(current.path.exists());
        assert_eq!(handler.files().len(), 2);
    }

    #[test]
    fn test_delete_untracked_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let handler = RotatingFileHandler::open_with("rotating", config(&dir)).unwrap();
        let outside = dir.path().join("outside.log");
        fs::write(&outside, b"x").unwrap();

        handler.delete_log_file(&outside).unwrap();
        assert!(outside.exists());
    }

    #[test]
    fn test_delete_tracked_file_keeps_active_one() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let old = touch(&config, Utc::now() - TimeDelta::hours(10));

        let handler = RotatingFileHandler::new("rotating", config.clone())
            .unwrap()
            .with_formatter(TextFormatter::new().with_date(false).with_file(false));
        handler.open().unwrap();
        let active = handler.current_file().unwrap();
        assert_ne!(active.path, old);
        handler.write(&LogRecord::new(Level::Info, "before")).unwrap();

        handler.delete_log_file(&old).unwrap();
        assert!(!old.exists());
        assert_eq!(handler.files(), vec![active.clone()]);
        assert_eq!(handler.current_file(), Some(active.clone()));

        handler.write(&LogRecord::new(Level::Info, "after")).unwrap();
        assert_eq!(
            fs::read_to_string(&active.path).unwrap(),
            "[INFO] before\n[INFO] after\n"
        );
        assert_eq!(list(&config), vec![active.path]);
    }

    #[test]
    fn test_delete_active_file_reopens_and_keeps_writing() {
        let dir = TempDir::new().unwrap();
        let handler = RotatingFileHandler::new("rotating", config(&dir))
            .unwrap()
            .with_formatter(TextFormatter::new().with_date(false).with_file(false));
        handler.open().unwrap();
        let active = handler.current_file().unwrap().path;
        handler.write(&LogRecord::new(Level::Info, "discarded")).unwrap();

        handler.delete_log_file(&active).unwrap();
        assert!(!handler.is_closed());
        let current = handler.current_file().unwrap();
        assert!(current.path.exists());
        assert_eq!(handler.files().len(), 1);

        handler.write(&LogRecord::new(Level::Warn, "continued")).unwrap();
        handler.flush().unwrap();
        assert_eq!(fs::read_to_string(&current.path).unwrap(), "[WARN] continued\n");
    }

    #[test]
    fn test_delete_all_leaves_one_fresh_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let old = [
            touch(&config, Utc::now() - TimeDelta::hours(30)),
            touch(&config, Utc::now() - TimeDelta::hours(20)),
            touch(&config, Utc::now() - TimeDelta::hours(10)),
        ];

        let handler = RotatingFileHandler::open_with("rotating", config.clone()).unwrap();
        assert_eq!(handler.files().len(), 4);

        handler.delete_all_log_files().unwrap();
        assert!(old.iter().all(|path| !path.exists()));
        let files = handler.files();
        assert_eq!(files.len(), 1);
        assert_eq!(list(&config), vec![files[0].path.clone()]);

        handler.close().unwrap();
        handler.delete_current_log_file().unwrap();
        assert!(files[0].path.exists());
    }

    #[test]
    fn test_max_files_prunes_oldest() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir).with_max_files(2);
        let oldest = touch(&config, Utc::now() - TimeDelta::hours(30));
        let middle = touch(&config, Utc::now() - TimeDelta::hours(20));

        let handler = RotatingFileHandler::open_with("rotating", config).unwrap();
        assert!(!oldest.exists());
        assert!(middle.exists());
        assert_eq!(handler.files().len(), 2);
    }

    #[test]
    fn test_write_rolls_over_after_window() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir).with_min_interval(Duration::from_secs(1));
        let handler = RotatingFileHandler::open_with("rotating", config).unwrap();
        let first = handler.current_file().unwrap();

        std::thread::sleep(Duration::from_millis(1100));
        handler.write(&LogRecord::new(Level::Info, "next window")).unwrap();

        let second = handler.current_file().unwrap();
        assert!(second.started > first.started);
        assert_eq!(handler.files().len(), 2);
        assert!(fs::read_to_string(&second.path).unwrap().contains("next window"));
    }

    #[test]
    fn test_invalid_config() {
        let dir = TempDir::new().unwrap();
        assert!(RotatingFileHandler::new("r", config(&dir).with_extension("")).is_err());
        assert!(RotatingFileHandler::new("r", config(&dir).with_max_files(0)).is_err());
        let err = RotatingFileHandler::new("r", config(&dir).with_file_name_format("%Y")).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
