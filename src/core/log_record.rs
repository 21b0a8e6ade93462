//! Log record structure

use super::log_level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;
use std::path::Path;

/// Timestamps closer than this compare equal.
///
/// Stored timestamps go through an `f64` of epoch seconds, which keeps
/// roughly a quarter of a microsecond of precision for present-day dates.
pub const TIMESTAMP_EPSILON_NANOS: i64 = 1_000;

/// Named grouping of records ("tag")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Module(String);

impl Module {
    pub const DEFAULT_NAME: &'static str = "Default";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT_NAME
    }
}

impl Default for Module {
    fn default() -> Self {
        Self(Self::DEFAULT_NAME.to_string())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Module {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Module {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Call site of a log statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// Last path component of the source file
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Enclosing function; empty when it could not be captured
    pub function: String,
}

impl Origin {
    pub fn new(file: &str, line: u32, column: u32, function: impl Into<String>) -> Self {
        Self {
            file: file_name(file),
            line,
            column,
            function: function.into(),
        }
    }

    /// Origin of the caller, without a function name
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line(), location.column(), String::new())
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string()
}

/// An immutable log record, created once per log call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub module: Module,
    pub origin: Origin,
}

impl LogRecord {
    /// Create a record stamped with the current time and the caller's location
    #[track_caller]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            level,
            module: Module::default(),
            origin: Origin::caller(),
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<Module>) -> Self {
        self.module = module.into();
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.origin.function = function.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Timestamp as floating seconds since the Unix epoch
    pub fn epoch_seconds(&self) -> f64 {
        to_epoch_seconds(&self.timestamp)
    }
}

impl PartialEq for LogRecord {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && timestamps_close(&self.timestamp, &other.timestamp)
            && self.level == other.level
            && self.module == other.module
            && self.origin == other.origin
    }
}

fn timestamps_close(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.signed_duration_since(*b)
        .num_nanoseconds()
        .is_some_and(|nanos| nanos.abs() < TIMESTAMP_EPSILON_NANOS)
}

pub(crate) fn to_epoch_seconds(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp() as f64 + f64::from(timestamp.timestamp_subsec_nanos()) / 1e9
}

pub(crate) fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// A record as persisted by the log store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned id, strictly increasing with insertion order
    pub id: i64,
    pub record: LogRecord,
}
