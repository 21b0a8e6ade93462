//! Core logger types and traits

pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod sub_logger;
pub mod timestamp;
pub mod trigger;
pub mod worker;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{LoggerError, Result};
pub use filter::{AcceptAll, ConditionFilter, LevelFilter, LogFilter, PredicateFilter};
pub use formatter::{JsonFormatter, LogFormatter, TextFormatter};
pub use handler::{Handler, HandlerState};
pub use log_level::Level;
pub use log_record::{LogRecord, Module, Origin, StoredRecord};
pub use logger::Logger;
pub use metrics::DispatchMetrics;
pub use sub_logger::SubLogger;
pub use timestamp::TimestampFormat;
pub use trigger::{LogTrigger, PanicTrigger};
pub use worker::{Completion, Pending, Worker, DEFAULT_SHUTDOWN_TIMEOUT};
