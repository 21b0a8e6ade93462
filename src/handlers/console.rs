//! Console handler implementation

use crate::core::formatter::{LogFormatter, TextFormatter};
use crate::core::handler::{Handler, HandlerState};
use crate::core::log_level::Level;
use crate::core::log_record::LogRecord;
use crate::core::error::Result;
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

/// Where a [`ConsoleHandler`] writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    /// stdout, with `Error` and `Fatal` routed to stderr
    Split,
    /// stderr only
    Stderr,
}

pub struct ConsoleHandler {
    identifier: String,
    state: HandlerState,
    target: ConsoleTarget,
    use_colors: bool,
    formatter: Box<dyn LogFormatter>,
}

impl ConsoleHandler {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: HandlerState::new(),
            target: ConsoleTarget::Split,
            use_colors: cfg!(feature = "console"),
            formatter: Box::new(TextFormatter::default()),
        }
    }

    /// A handler that writes everything to stderr
    pub fn stderr(identifier: impl Into<String>) -> Self {
        Self {
            target: ConsoleTarget::Stderr,
            ..Self::new(identifier)
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Replace the default [`TextFormatter`]
    ///
    /// ```
    /// use logbook::handlers::ConsoleHandler;
    /// use logbook::JsonFormatter;
    ///
    /// let handler = ConsoleHandler::new("console").with_formatter(JsonFormatter);
    /// ```
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl LogFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn render(&self, record: &LogRecord) -> String {
        let line = self.formatter.format(record);
        #[cfg(feature = "console")]
        if self.use_colors {
            return line.color(record.level.color_code()).to_string();
        }
        line
    }

    fn to_stderr(&self, level: Level) -> bool {
        match self.target {
            ConsoleTarget::Stderr => true,
            ConsoleTarget::Split => matches!(level, Level::Error | Level::Fatal),
        }
    }
}

impl Handler for ConsoleHandler {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn state(&self) -> &HandlerState {
        &self.state
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let line = self.render(record);
        if self.to_stderr(record.level) {
            writeln!(std::io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing() {
        let split = ConsoleHandler::new("console");
        assert!(!split.to_stderr(Level::Warn));
        assert!(split.to_stderr(Level::Error));
        assert!(split.to_stderr(Level::Fatal));

        let stderr = ConsoleHandler::stderr("diagnostics");
        assert_eq!(stderr.target(), ConsoleTarget::Stderr);
        assert!(stderr.to_stderr(Level::Trace));
    }

    #[test]
    fn test_plain_render_uses_formatter() {
        let handler = ConsoleHandler::new("console")
            .with_colors(false)
            .with_formatter(TextFormatter::new().with_date(false).with_file(false));
        let record = LogRecord::new(Level::Info, "ready").with_module("Net");
        assert_eq!(handler.render(&record), "[Net][INFO] ready");
        assert!(handler.write(&record).is_ok());
    }
}
