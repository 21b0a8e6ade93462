//! Formatting of records into text lines
//!
//! - [`TextFormatter`]: human-readable, configurable column set
//! - [`JsonFormatter`]: one JSON object per record

use super::log_record::LogRecord;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Pure function from a record to a single output line (without newline)
pub trait LogFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F: LogFormatter + ?Sized> LogFormatter for std::sync::Arc<F> {
    fn format(&self, record: &LogRecord) -> String {
        (**self).format(record)
    }
}

/// Human-readable formatter
///
/// Example: `2025-01-08 11:30:45.123 +0100 main.rs:42 [Network][ERROR] Connection reset`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFormatter {
    pub show_date: bool,
    pub show_level: bool,
    pub show_module: bool,
    /// Also print the module when it is the default one
    pub show_default_module: bool,
    pub show_file: bool,
    pub show_line: bool,
    pub show_column: bool,
    pub show_function: bool,
    /// Escape `\n`, `\r` and `\t` so one record stays one line
    pub escape_control: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            show_date: true,
            show_level: true,
            show_module: true,
            show_default_module: false,
            show_file: true,
            show_line: true,
            show_column: false,
            show_function: false,
            escape_control: true,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, show: bool) -> Self {
        self.show_file = show;
        self
    }

    #[must_use]
    pub fn with_date(mut self, show: bool) -> Self {
        self.show_date = show;
        self
    }

    #[must_use]
    pub fn with_function(mut self, show: bool) -> Self {
        self.show_function = show;
        self
    }

    #[must_use]
    pub fn with_column(mut self, show: bool) -> Self {
        self.show_column = show;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Prevent injection of fake records through embedded line breaks
    fn escape(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }
}

impl LogFormatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut output = String::new();

        if self.show_date {
            output.push_str(&self.timestamp_format.format(&record.timestamp));
            output.push(' ');
        }

        if self.show_file {
            output.push_str(&record.origin.file);
            if self.show_line {
                let _ = write!(output, ":{}", record.origin.line);
                if self.show_column {
                    let _ = write!(output, ":{}", record.origin.column);
                }
            }
            output.push(' ');
        }

        if self.show_function {
            let _ = write!(output, "<{}>", record.origin.function);
        }

        if self.show_module && (self.show_default_module || !record.module.is_default()) {
            let _ = write!(output, "[{}]", record.module);
        }

        if self.show_level {
            let _ = write!(output, "[{}]", record.level);
        }

        output.push(' ');
        if self.escape_control {
            output.push_str(&Self::escape(&record.message));
        } else {
            output.push_str(&record.message);
        }

        output
    }
}

/// One JSON object per record, timestamps in RFC 3339
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        serde_json::to_string(record).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::Level;
    use crate::core::log_record::Origin;
    use chrono::TimeZone;

    fn sample() -> LogRecord {
        LogRecord::new(Level::Error, "Connection reset")
            .with_module("Network")
            .with_origin(Origin::new("src/main.rs", 42, 7, "serve"))
            .with_timestamp(chrono::Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap())
    }

    #[test]
    fn test_text_format_columns() {
        let formatter = TextFormatter::new()
            .with_timestamp_format(TimestampFormat::Iso8601)
            .with_function(true)
            .with_column(true);
        assert_eq!(
            formatter.format(&sample()),
            "2025-01-08T10:30:45.000Z main.rs:42:7 <serve>[Network][ERROR] Connection reset"
        );
    }

    #[test]
    fn test_default_module_hidden() {
        let formatter = TextFormatter::new().with_date(false).with_file(false);
        let record = sample().with_module("Default");
        assert_eq!(formatter.format(&record), "[ERROR] Connection reset");
    }

    #[test]
    fn test_line_breaks_escaped() {
        let formatter = TextFormatter::new().with_date(false).with_file(false);
        let mut record = sample();
        record.message = "login\nERROR fake entry".to_string();
        let line = formatter.format(&record);
        assert!(!line.contains('\n'));
        assert!(line.ends_with("login\\nERROR fake entry"));
    }

    #[test]
    fn test_json_format_round_trips() {
        let record = sample();
        let json = JsonFormatter.format(&record);
        let parsed: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(json.contains("\"level\":\"Error\""));
    }
}
