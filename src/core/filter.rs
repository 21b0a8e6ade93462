//! Predicates deciding which records a handler accepts
//!
//! [`ConditionFilter`] is shared by live dispatch and by store queries, so
//! both paths must agree on every accept/reject decision.

use super::log_level::Level;
use super::log_record::{LogRecord, Module};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub trait LogFilter: Send + Sync {
    fn accepts(&self, record: &LogRecord) -> bool;
}

/// Accepts every record
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl LogFilter for AcceptAll {
    fn accepts(&self, _record: &LogRecord) -> bool {
        true
    }
}

/// Arbitrary user predicate
pub struct PredicateFilter {
    predicate: Box<dyn Fn(&LogRecord) -> bool + Send + Sync>,
}

impl PredicateFilter {
    pub fn new(predicate: impl Fn(&LogRecord) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for PredicateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateFilter").finish_non_exhaustive()
    }
}

impl LogFilter for PredicateFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        (self.predicate)(record)
    }
}

/// Accepts records at or above a minimum level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelFilter {
    pub min_level: Level,
}

impl LevelFilter {
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl LogFilter for LevelFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        record.level >= self.min_level
    }
}

/// Keyword, level set and module set, all of which must match.
///
/// An empty level set or module set rejects everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFilter {
    /// Case-sensitive substring of the message; `None` or empty matches all
    pub keyword: Option<String>,
    pub include_levels: Vec<Level>,
    pub include_modules: Vec<Module>,
}

impl Default for ConditionFilter {
    fn default() -> Self {
        Self {
            keyword: None,
            include_levels: Level::ALL.to_vec(),
            include_modules: vec![Module::default()],
        }
    }
}

impl ConditionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.include_levels = levels.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_modules<M: Into<Module>>(mut self, modules: impl IntoIterator<Item = M>) -> Self {
        self.include_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    /// The keyword, if one is set and non-empty
    pub fn effective_keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|keyword| !keyword.is_empty())
    }

    /// True when the filter can never accept anything
    pub fn is_vacuous(&self) -> bool {
        self.include_levels.is_empty() || self.include_modules.is_empty()
    }
}

impl LogFilter for ConditionFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        if !self.include_levels.contains(&record.level) {
            return false;
        }
        if !self.include_modules.contains(&record.module) {
            return false;
        }
        match self.effective_keyword() {
            Some(keyword) => record.message.contains(keyword),
            None => true,
        }
    }
}

impl<F: LogFilter + ?Sized> LogFilter for Arc<F> {
    fn accepts(&self, record: &LogRecord) -> bool {
        (**self).accepts(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Level, module: &str, message: &str) -> LogRecord {
        LogRecord::new(level, message).with_module(module)
    }

    #[test]
    fn test_condition_filter_requires_every_clause() {
        let filter = ConditionFilter::new()
            .with_keyword("test")
            .with_levels([Level::Error, Level::Warn])
            .with_modules(["Test"]);

        assert!(!filter.accepts(&record(Level::Error, "Default", "this_is_test_log.")));
        assert!(!filter.accepts(&record(Level::Info, "Test", "this_is_test_log.")));
        assert!(!filter.accepts(&record(Level::Error, "Test", "this_is_a_log.")));
        assert!(filter.accepts(&record(Level::Error, "Test", "this_is_test_log.")));
    }

    #[test]
    fn test_empty_sets_reject_everything() {
        let record = record(Level::Info, "Default", "anything");

        let no_levels = ConditionFilter::new().with_levels([]);
        assert!(no_levels.is_vacuous());
        assert!(!no_levels.accepts(&record));

        let no_modules = ConditionFilter::new().with_modules(Vec::<Module>::new());
        assert!(no_modules.is_vacuous());
        assert!(!no_modules.accepts(&record));
    }

    #[test]
    fn test_keyword_is_case_sensitive_and_empty_matches() {
        let record = record(Level::Info, "Default", "Connection Reset");
        assert!(!ConditionFilter::new().with_keyword("reset").accepts(&record));
        assert!(ConditionFilter::new().with_keyword("Reset").accepts(&record));
        assert!(ConditionFilter::new().with_keyword("").accepts(&record));
    }

    #[test]
    fn test_default_condition_only_default_module() {
        let filter = ConditionFilter::default();
        assert!(filter.accepts(&record(Level::Trace, "Default", "x")));
        assert!(!filter.accepts(&record(Level::Trace, "Network", "x")));
    }

    #[test]
    fn test_predicate_and_level_filters() {
        let numeric = PredicateFilter::new(|r| r.message.parse::<i64>().is_err());
        assert!(!numeric.accepts(&record(Level::Error, "Default", "0")));
        assert!(numeric.accepts(&record(Level::Error, "Default", "text")));

        let level = LevelFilter::new(Level::Warn);
        assert!(!level.accepts(&record(Level::Info, "Default", "x")));
        assert!(level.accepts(&record(Level::Fatal, "Default", "x")));
        assert!(AcceptAll.accepts(&record(Level::Trace, "Default", "x")));
    }
}
