//! Logging macros with `format!` arguments.
//!
//! Unlike the [`Logger`](crate::Logger) convenience methods, the macros also
//! record the name of the enclosing function. Every macro evaluates to the
//! [`LogRecord`](crate::LogRecord) that was built.
//!
//! # Examples
//!
//! ```
//! use logbook::prelude::*;
//! use logbook::{info, warn};
//!
//! let dispatcher = Dispatcher::new("app");
//!
//! info!(dispatcher, "Server started");
//!
//! let port = 8080;
//! info!(dispatcher, "Listening on port {}", port);
//!
//! // Explicit module
//! let record = warn!(dispatcher, module = "Network", "Retry {} of {}", 1, 3);
//! assert_eq!(record.module.name(), "Network");
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use logbook::prelude::*;
/// # let dispatcher = Dispatcher::new("app");
/// use logbook::log;
/// log!(dispatcher, Level::Info, "Simple message");
/// log!(dispatcher, Level::Error, module = "Http", "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, module = $module:expr, $($arg:tt)+) => {
        $crate::Logger::log_record(
            &$logger,
            $crate::LogRecord::new($level, format!($($arg)+))
                .with_module($module)
                .with_function($crate::__function_name!()),
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $crate::Logger::log_record(
            &$logger,
            $crate::LogRecord::new($level, format!($($arg)+))
                .with_function($crate::__function_name!()),
        )
    };
}

/// Name of the enclosing function, without its path
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use logbook::prelude::*;
/// # let dispatcher = Dispatcher::new("app");
/// use logbook::error;
/// error!(dispatcher, "Failed to connect to database");
/// error!(dispatcher, module = "Db", "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
