//! Property-based tests for logbook using proptest

use logbook::prelude::*;
use logbook::JsonFormatter;
use proptest::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn any_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Trace),
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warn),
        Just(Level::Error),
        Just(Level::Fatal),
    ]
}

fn any_module() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Default".to_string()),
        Just("Network".to_string()),
        Just("Db".to_string()),
        Just("Ui".to_string()),
    ]
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Level string conversions roundtrip
    #[test]
    fn test_level_str_roundtrip(level in any_level()) {
        let parsed: Level = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering follows the stored ordinal
    #[test]
    fn test_level_ordering_matches_index(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, a.index() < b.index());
        prop_assert_eq!(Level::from_index(i64::from(a.index())), Some(a));
    }

    /// Parsing is case insensitive
    #[test]
    fn test_level_case_insensitive(level in any_level(), lower in any::<bool>()) {
        let text = if lower { level.to_str().to_lowercase() } else { level.to_str().to_string() };
        prop_assert_eq!(text.parse::<Level>().unwrap(), level);
    }
}

// ============================================================================
// Formatter Tests
// ============================================================================

proptest! {
    /// Escaped text output is always a single line
    #[test]
    fn test_text_format_is_single_line(message in ".*", level in any_level()) {
        let record = LogRecord::new(level, message);
        let line = TextFormatter::default().format(&record);
        prop_assert!(!line.contains('\n'));
        prop_assert!(!line.contains('\r'));
    }

    /// JSON output parses back into an equal record
    #[test]
    fn test_json_format_roundtrip(message in ".*", level in any_level(), module in any_module()) {
        let record = LogRecord::new(level, message).with_module(module);
        let json = JsonFormatter.format(&record);
        let restored: LogRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored, record);
    }
}

// ============================================================================
// Filter Tests
// ============================================================================

proptest! {
    /// A sub-logger never emits a level outside its available set when a default is set
    #[test]
    fn test_sub_logger_levels(
        level in any_level(),
        available in proptest::collection::vec(any_level(), 0..4),
        default in any_level(),
    ) {
        let memory = Arc::new(SequenceHandler::new("memory"));
        let dispatcher = Dispatcher::builder()
            .worker(Worker::shared())
            .shared_handler(memory.clone())
            .build();
        let sub = SubLogger::new(dispatcher)
            .with_available_levels(available.clone())
            .with_default_level(default);

        let record = sub.log(level, "x");
        if available.contains(&level) {
            prop_assert_eq!(record.level, level);
        } else {
            prop_assert_eq!(record.level, default);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Store queries accept exactly what the live filter accepts
    #[test]
    fn test_store_query_agrees_with_live_filter(
        rows in proptest::collection::vec((any_level(), any_module(), "[a-cA-C%_ ]{0,6}"), 0..25),
        levels in proptest::collection::vec(any_level(), 0..4),
        modules in proptest::collection::vec(any_module(), 0..3),
        keyword in proptest::option::of("[a-cA-C%_]{0,2}"),
    ) {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path().join("logs.db"))
            .with_worker(Worker::spawn("prop-store").unwrap())
            .with_auto_delete(false);
        let store = LogStore::open_with(config).unwrap();

        let records: Vec<LogRecord> = rows
            .into_iter()
            .map(|(level, module, message)| LogRecord::new(level, message).with_module(module))
            .collect();
        for record in &records {
            store.write(record).unwrap();
        }

        let mut filter = ConditionFilter::new().with_levels(levels).with_modules(modules);
        filter.keyword = keyword;

        let stored = Pending::capture(|done| store.get_logs(&filter, None, 1000, done))
            .wait()
            .unwrap()
            .unwrap();
        let mut expected: Vec<LogRecord> =
            records.into_iter().filter(|r| filter.accepts(r)).collect();
        expected.reverse();
        let actual: Vec<LogRecord> = stored.into_iter().map(|s| s.record).collect();
        prop_assert_eq!(actual, expected);
    }
}
