//! Error types for the logging system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Opening, closing or truncating the backing database failed
    #[error("Store resource error while {operation} '{path}': {source}")]
    Resource {
        operation: String,
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An insert, delete or query statement failed
    #[error("Store statement failed while {operation}: {message}")]
    WriteFailure { operation: String, message: String },

    /// Directory or file manipulation failed in a file based handler
    #[error("Filesystem error while {operation} '{path}': {source}")]
    Filesystem {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The store has been closed (or never opened)
    #[error("Log store '{identifier}' is closed")]
    StoreClosed { identifier: String },

    /// A file handler has no open file
    #[error("Handler '{identifier}' is closed")]
    HandlerClosed { identifier: String },

    /// The background worker is gone
    #[error("Log worker stopped")]
    WorkerStopped,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoggerError {
    /// Create a resource error for the backing database
    pub fn resource(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: rusqlite::Error,
    ) -> Self {
        LoggerError::Resource {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a write failure from a failed statement
    pub fn write_failure(operation: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::WriteFailure {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a filesystem error with context
    pub fn filesystem(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    pub fn store_closed(identifier: impl Into<String>) -> Self {
        LoggerError::StoreClosed {
            identifier: identifier.into(),
        }
    }

    pub fn handler_closed(identifier: impl Into<String>) -> Self {
        LoggerError::HandlerClosed {
            identifier: identifier.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised because a handler or store is closed
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            LoggerError::StoreClosed { .. } | LoggerError::HandlerClosed { .. }
        )
    }
}
