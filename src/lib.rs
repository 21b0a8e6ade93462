//! # Logbook
//!
//! Client-side logging with asynchronous fan-out dispatch and a queryable
//! SQLite log store.
//!
//! ## Features
//!
//! - **Ordered dispatch**: records are fanned out to handlers on a single
//!   background worker, in submission order
//! - **Handlers**: console, plain file, rotating file set, in-memory sequence
//!   and the persistent [`LogStore`]
//! - **Queryable store**: filtered, keyset-paginated retrieval, listeners,
//!   expiry sweep and export
//! - **Isolation**: a failing or panicking handler never affects the others
//!
//! ## Example
//!
//! ```no_run
//! use logbook::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> logbook::Result<()> {
//! let store = Arc::new(LogStore::open_with(StoreConfig::new("logs/app.db"))?);
//! let dispatcher = Dispatcher::builder()
//!     .identifier("app")
//!     .handler(ConsoleHandler::new("console"))
//!     .shared_handler(store.clone())
//!     .build();
//!
//! dispatcher.info("application started");
//! logbook::error!(dispatcher, module = "Network", "connection reset after {} ms", 120);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod handlers;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        ConditionFilter, Dispatcher, DispatcherBuilder, Handler, Level, LevelFilter, LogFilter,
        LogFormatter, LogRecord, LogTrigger, Logger, LoggerError, Module, Origin, PanicTrigger,
        Pending, Result, StoredRecord, SubLogger, TextFormatter, Worker,
    };
    pub use crate::handlers::{
        ConsoleHandler, FileHandler, LogPresentable, LogStore, RotatingFileHandler,
        RotationConfig, SequenceHandler, StoreConfig, Subscription,
    };
}

pub use crate::core::{
    diagnostics, AcceptAll, Completion, ConditionFilter, DispatchMetrics, Dispatcher,
    DispatcherBuilder, Handler, HandlerState, JsonFormatter, Level, LevelFilter, LogFilter,
    LogFormatter, LogRecord, LogTrigger, Logger, LoggerError, Module, Origin, PanicTrigger,
    Pending, PredicateFilter, Result, StoredRecord, SubLogger, TextFormatter, TimestampFormat,
    Worker, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::handlers::{
    ConsoleHandler, ConsoleTarget, FileHandler, LogListener, LogPresentable, LogStore,
    RotatingFileHandler, RotationConfig, RotationFile, SequenceHandler, StoreConfig, Subscription,
};
