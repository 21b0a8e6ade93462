//! Queryable log store backed by a single SQLite file
//!
//! Every operation on the connection runs as a task on the store's worker,
//! so inserts, queries and deletes observe one total order. Queries deliver
//! their result through a completion callback; use
//! [`Pending::capture`](crate::core::worker::Pending::capture) to wait on one.
//!
//! Table layout:
//!
//! | column     | type                              |
//! |------------|-----------------------------------|
//! | `id`       | INTEGER PRIMARY KEY AUTOINCREMENT |
//! | `message`  | TEXT                              |
//! | `timestamp`| REAL, seconds since the epoch     |
//! | `level`    | INTEGER, `Trace` = 0 .. `Fatal` = 5 |
//! | `module`   | TEXT                              |
//! | `file`     | TEXT                              |
//! | `line`     | INTEGER                           |
//! | `"column"` | INTEGER                           |
//! | `function` | TEXT                              |

use crate::core::diagnostics;
use crate::core::error::{LoggerError, Result};
use crate::core::filter::ConditionFilter;
use crate::core::handler::{Handler, HandlerState};
use crate::core::log_level::Level;
use crate::core::log_record::{from_epoch_seconds, to_epoch_seconds, LogRecord, Module, Origin, StoredRecord};
use crate::core::worker::{Completion, Worker};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Records older than this are removed by the outdated sweep
pub const DEFAULT_OUTDATED_AGE: Duration = Duration::from_secs(5 * 24 * 3600);

/// Delay between `open` and the first outdated sweep
pub const DEFAULT_SWEEP_DELAY: Duration = Duration::from_secs(5);

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    message TEXT NOT NULL,
    timestamp REAL NOT NULL,
    level INTEGER NOT NULL,
    module TEXT NOT NULL,
    file TEXT NOT NULL,
    line INTEGER NOT NULL,
    "column" INTEGER NOT NULL,
    function TEXT NOT NULL
)"#;

const INSERT_SQL: &str = r#"INSERT INTO logs (message, timestamp, level, module, file, line, "column", function)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#;

const SELECT_COLUMNS: &str = r#"SELECT id, message, timestamp, level, module, file, line, "column", function FROM logs"#;

/// SQLite limits bound parameters per statement; deletes are chunked
const DELETE_CHUNK_SIZE: usize = 500;

impl ToSql for Level {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.index())))
    }
}

impl FromSql for Level {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let index = i64::column_result(value)?;
        Level::from_index(index).ok_or(FromSqlError::OutOfRange(index))
    }
}

impl ToSql for Module {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.name()))
    }
}

impl FromSql for Module {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Module::from)
    }
}

/// Receives every record right after the store persisted it.
///
/// Called on the store's worker thread.
pub trait LogListener: Send + Sync {
    fn receive(&self, record: &StoredRecord);
}

impl<F> LogListener for F
where
    F: Fn(&StoredRecord) + Send + Sync,
{
    fn receive(&self, record: &StoredRecord) {
        self(record)
    }
}

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Arc<dyn LogListener>)>>,
}

impl Listeners {
    fn add(self: &Arc<Self>, listener: Arc<dyn LogListener>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push((id, listener));
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) {
        self.entries.write().retain(|(entry_id, _)| *entry_id != id);
    }

    fn notify(&self, record: &StoredRecord) {
        let listeners: Vec<Arc<dyn LogListener>> = self
            .entries
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            if let Err(panic_info) = diagnostics::isolate(|| listener.receive(record)) {
                diagnostics::report_panic("Log listener", panic_info.as_ref());
            }
        }
    }
}

/// Keeps a listener registered; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    /// False once the store that issued it is gone
    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.entries.read().iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Read side of a store, as consumed by viewers.
///
/// All operations are asynchronous; results arrive through the completion.
pub trait LogPresentable: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn LogListener>) -> Subscription;

    fn get_log_count(&self, completion: Completion<Result<usize>>);

    /// Newest first; only records with an id below `before` when it is given
    fn get_logs(
        &self,
        filter: &ConditionFilter,
        before: Option<&StoredRecord>,
        limit: usize,
        completion: Completion<Result<Vec<StoredRecord>>>,
    );

    fn get_all_modules(&self, completion: Completion<Result<Vec<Module>>>);

    fn delete_logs(&self, ids: Vec<i64>);

    fn delete_all_logs(&self);

    fn export(&self, completion: Completion<Result<PathBuf>>);
}

/// Configuration for [`LogStore`]
///
/// # Example
///
/// ```
/// use logbook::handlers::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::new("/var/lib/app/logs.db")
///     .with_identifier("app.store")
///     .with_outdated_age(Duration::from_secs(24 * 3600))
///     .with_export_dir("/tmp/app-exports");
/// assert!(config.auto_delete_outdated);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub identifier: String,
    pub path: PathBuf,
    /// Schedule an outdated sweep every time the store is opened
    pub auto_delete_outdated: bool,
    pub outdated_age: Duration,
    pub sweep_delay: Duration,
    /// Where `export` writes; the system temp directory when unset
    pub export_dir: Option<PathBuf>,
    /// Worker running the store's tasks; [`Worker::shared`] when unset
    #[serde(skip)]
    pub worker: Option<Arc<Worker>>,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            identifier: "logbook.store".to_string(),
            path: path.into(),
            auto_delete_outdated: true,
            outdated_age: DEFAULT_OUTDATED_AGE,
            sweep_delay: DEFAULT_SWEEP_DELAY,
            export_dir: None,
            worker: None,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_auto_delete(mut self, enabled: bool) -> Self {
        self.auto_delete_outdated = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_outdated_age(mut self, age: Duration) -> Self {
        self.outdated_age = age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_sweep_delay(mut self, delay: Duration) -> Self {
        self.sweep_delay = delay;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_worker(mut self, worker: Arc<Worker>) -> Self {
        self.worker = Some(worker);
        self
    }
}

/// Append-only, queryable handler over SQLite.
///
/// ```no_run
/// use logbook::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> logbook::Result<()> {
/// let store = Arc::new(LogStore::new(StoreConfig::new("logs/app.db")));
/// store.open()?;
///
/// let dispatcher = Dispatcher::new("app");
/// dispatcher.add_handler(store.clone());
/// dispatcher.error("disk full");
///
/// let filter = ConditionFilter::new().with_levels([Level::Error, Level::Fatal]);
/// let page = Pending::capture(|done| store.get_logs(&filter, None, 50, done)).wait()??;
/// # let _ = page;
/// # Ok(())
/// # }
/// ```
pub struct LogStore {
    shared: Arc<StoreShared>,
}

struct StoreShared {
    config: StoreConfig,
    state: HandlerState,
    worker: Arc<Worker>,
    connection: Mutex<Option<Connection>>,
    open: AtomicBool,
    listeners: Arc<Listeners>,
}

impl LogStore {
    /// A closed store; call [`LogStore::open`] before use
    pub fn new(config: StoreConfig) -> Self {
        let worker = config.worker.clone().unwrap_or_else(Worker::shared);
        Self {
            shared: Arc::new(StoreShared {
                config,
                state: HandlerState::new(),
                worker,
                connection: Mutex::new(None),
                open: AtomicBool::new(false),
                listeners: Arc::new(Listeners::default()),
            }),
        }
    }

    /// Create and open in one step
    pub fn open_with(config: StoreConfig) -> Result<Self> {
        let store = Self::new(config);
        store.open()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    pub fn path(&self) -> &Path {
        &self.shared.config.path
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.shared.worker
    }

    pub fn is_closed(&self) -> bool {
        !self.shared.open.load(Ordering::Acquire)
    }

    /// Open the database, creating the directory and table as needed.
    ///
    /// No-op when already open. Schedules the outdated sweep when
    /// `auto_delete_outdated` is set.
    pub fn open(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let opened = self.shared.worker.run_sync(move || shared.open_connection())??;

        if opened && self.shared.config.auto_delete_outdated {
            self.schedule_sweep()?;
        }
        Ok(())
    }

    /// Release the database; writes are dropped and queries fail until reopened
    pub fn close(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.shared.worker.run_sync(move || shared.close_connection())?
    }

    /// Synchronously delete every row
    pub fn truncate(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.shared.worker.run_sync(move || {
            let guard = shared.connection.lock();
            match guard.as_ref() {
                Some(conn) => conn
                    .execute("DELETE FROM logs", [])
                    .map(|_| ())
                    .map_err(|e| LoggerError::resource("truncating", shared.path_string(), e)),
                None => Ok(()),
            }
        })?
    }

    /// Register `listener`; it stays registered while the subscription lives
    pub fn add_listener(&self, listener: Arc<dyn LogListener>) -> Subscription {
        self.shared.listeners.add(listener)
    }

    /// Register a closure listener
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoredRecord) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.entries.read().len()
    }

    pub fn get_log_count(&self, completion: Completion<Result<usize>>) {
        self.query("counting logs", completion, |conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        });
    }

    /// Rows matching `filter`, id descending, at most `limit`.
    ///
    /// Passing the last record of a page as `before` fetches the next page.
    pub fn get_logs(
        &self,
        filter: &ConditionFilter,
        before: Option<&StoredRecord>,
        limit: usize,
        completion: Completion<Result<Vec<StoredRecord>>>,
    ) {
        let filter = filter.clone();
        let before = before.map(|record| record.id);
        self.query("querying logs", completion, move |conn| {
            select_logs(conn, &filter, before, limit)
        });
    }

    /// Distinct modules present in the table
    pub fn get_all_modules(&self, completion: Completion<Result<Vec<Module>>>) {
        self.query("listing modules", completion, |conn| {
            let mut stmt = conn.prepare_cached("SELECT module FROM logs GROUP BY module")?;
            let modules = stmt
                .query_map([], |row| row.get::<_, Module>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(modules)
        });
    }

    pub fn delete_logs(&self, ids: Vec<i64>) {
        if ids.is_empty() {
            return;
        }
        self.command("deleting logs", move |conn| {
            let tx = conn.transaction()?;
            for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
                let placeholders = vec!["?"; chunk.len()].join(",");
                tx.execute(
                    &format!("DELETE FROM logs WHERE id IN ({})", placeholders),
                    params_from_iter(chunk.iter()),
                )?;
            }
            tx.commit()
        });
    }

    pub fn delete_all_logs(&self) {
        self.command("deleting all logs", |conn| {
            conn.execute("DELETE FROM logs", []).map(|_| ())
        });
    }

    /// Delete rows older than `outdated_age`, measured when the task runs
    pub fn delete_outdated_logs(&self) {
        let age = self.shared.config.outdated_age;
        self.command("deleting outdated logs", move |conn| {
            match outdated_cutoff(age) {
                Some(cutoff) => delete_before(conn, &cutoff),
                None => Ok(()),
            }
        });
    }

    /// Delete rows whose timestamp is strictly older than `cutoff`
    pub fn delete_logs_before(&self, cutoff: DateTime<Utc>) {
        self.command("deleting logs before cutoff", move |conn| {
            delete_before(conn, &cutoff)
        });
    }

    /// Copy the database to `Logs-<yyyyMMddHHmmss>.db` in the export directory
    pub fn export(&self, completion: Completion<Result<PathBuf>>) {
        let shared = Arc::clone(&self.shared);
        let result = self.shared.worker.execute(move || {
            let result = shared.export_copy();
            if let Err(ref e) = result {
                if !e.is_closed() {
                    diagnostics::report_error(e.to_string());
                }
            }
            completion(result);
        });
        self.report_queue_failure("exporting logs", result);
    }

    fn schedule_sweep(&self) -> Result<()> {
        let weak = Arc::downgrade(&self.shared);
        let age = self.shared.config.outdated_age;
        self.shared
            .worker
            .submit_after(self.shared.config.sweep_delay, move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if let Some(cutoff) = outdated_cutoff(age) {
                    let _ = shared.with_connection("deleting outdated logs", |conn| {
                        delete_before(conn, &cutoff)
                    });
                }
            })
    }

    fn query<T, F>(&self, operation: &'static str, completion: Completion<Result<T>>, f: F)
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let result = self.shared.worker.execute(move || {
            let result = shared.with_connection(operation, f);
            completion(result);
        });
        self.report_queue_failure(operation, result);
    }

    fn command<F>(&self, operation: &'static str, f: F)
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<()> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let result = self.shared.worker.execute(move || {
            let _ = shared.with_connection(operation, f);
        });
        self.report_queue_failure(operation, result);
    }

    fn report_queue_failure(&self, operation: &str, result: Result<()>) {
        if let Err(e) = result {
            diagnostics::report_error(format!(
                "Log store '{}' could not queue {}: {}",
                self.shared.config.identifier, operation, e
            ));
        }
    }
}

impl StoreShared {
    fn path_string(&self) -> String {
        self.config.path.display().to_string()
    }

    /// Returns whether a connection was actually opened
    fn open_connection(&self) -> Result<bool> {
        let mut guard = self.connection.lock();
        if guard.is_some() {
            return Ok(false);
        }

        let path = &self.config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::filesystem("creating store directory", parent.display().to_string(), e)
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| LoggerError::resource("opening", self.path_string(), e))?;
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(|e| LoggerError::resource("configuring", self.path_string(), e))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| LoggerError::resource("creating table in", self.path_string(), e))?;

        *guard = Some(conn);
        self.open.store(true, Ordering::Release);
        Ok(true)
    }

    fn close_connection(&self) -> Result<()> {
        let mut guard = self.connection.lock();
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                self.open.store(false, Ordering::Release);
                Ok(())
            }
            Err((conn, e)) => {
                *guard = Some(conn);
                Err(LoggerError::resource("closing", self.path_string(), e))
            }
        }
    }

    /// Run `f` against the open connection.
    ///
    /// The lock is released before returning, so callers may hand the
    /// result to user code that calls back into the store.
    fn with_connection<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut guard = self.connection.lock();
        let Some(conn) = guard.as_mut() else {
            return Err(LoggerError::store_closed(&self.config.identifier));
        };

        f(conn).map_err(|e| {
            let error = LoggerError::write_failure(operation, e.to_string());
            diagnostics::report_error(format!(
                "Log store '{}': {}",
                self.config.identifier, error
            ));
            error
        })
    }

    fn insert(&self, record: &LogRecord) {
        let inserted = self.with_connection("inserting log", |conn| {
            let mut stmt = conn.prepare_cached(INSERT_SQL)?;
            stmt.insert(params![
                record.message,
                record.epoch_seconds(),
                record.level,
                record.module,
                record.origin.file,
                i64::from(record.origin.line),
                i64::from(record.origin.column),
                record.origin.function,
            ])
        });

        // Closed stores drop writes silently; statement failures were reported
        if let Ok(id) = inserted {
            self.listeners.notify(&StoredRecord {
                id,
                record: record.clone(),
            });
        }
    }

    fn export_copy(&self) -> Result<PathBuf> {
        let guard = self.connection.lock();
        let Some(conn) = guard.as_ref() else {
            return Err(LoggerError::store_closed(&self.config.identifier));
        };

        let dir = self
            .config
            .export_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&dir).map_err(|e| {
            LoggerError::filesystem("creating export directory", dir.display().to_string(), e)
        })?;

        let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let mut target = dir.join(format!("Logs-{}.db", stamp));
        let mut suffix = 1;
        while target.exists() {
            target = dir.join(format!("Logs-{}-{}.db", stamp, suffix));
            suffix += 1;
        }

        let target_name = target.to_string_lossy().into_owned();
        conn.execute("VACUUM INTO ?1", [&target_name])
            .map_err(|e| LoggerError::write_failure("exporting logs", e.to_string()))?;
        Ok(target)
    }
}

fn outdated_cutoff(age: Duration) -> Option<DateTime<Utc>> {
    let age = TimeDelta::from_std(age).ok()?;
    Utc::now().checked_sub_signed(age)
}

fn delete_before(conn: &Connection, cutoff: &DateTime<Utc>) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM logs WHERE timestamp < ?1",
        [to_epoch_seconds(cutoff)],
    )
    .map(|_| ())
}

fn select_logs(
    conn: &Connection,
    filter: &ConditionFilter,
    before: Option<i64>,
    limit: usize,
) -> rusqlite::Result<Vec<StoredRecord>> {
    if filter.is_vacuous() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(SELECT_COLUMNS);
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    sql.push_str(" WHERE level IN (");
    sql.push_str(&vec!["?"; filter.include_levels.len()].join(","));
    sql.push(')');
    for level in &filter.include_levels {
        params.push(Box::new(*level));
    }

    sql.push_str(" AND module IN (");
    sql.push_str(&vec!["?"; filter.include_modules.len()].join(","));
    sql.push(')');
    for module in &filter.include_modules {
        params.push(Box::new(module.clone()));
    }

    // instr() is case-sensitive, like ConditionFilter::accepts; LIKE is not
    if let Some(keyword) = filter.effective_keyword() {
        sql.push_str(" AND instr(message, ?) > 0");
        params.push(Box::new(keyword.to_string()));
    }

    if let Some(before) = before {
        sql.push_str(" AND id < ?");
        params.push(Box::new(before));
    }

    sql.push_str(" ORDER BY id DESC LIMIT ?");
    params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));

    let param_refs: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(param_refs.as_slice(), row_to_stored)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let seconds: f64 = row.get(2)?;
    let timestamp = from_epoch_seconds(seconds).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Real, "timestamp out of range".into())
    })?;

    let origin = Origin {
        file: row.get(5)?,
        line: row.get(6)?,
        column: row.get(7)?,
        function: row.get(8)?,
    };

    Ok(StoredRecord {
        id: row.get(0)?,
        record: LogRecord {
            message: row.get(1)?,
            timestamp,
            level: row.get(3)?,
            module: row.get(4)?,
            origin,
        },
    })
}

impl Handler for LogStore {
    fn identifier(&self) -> &str {
        &self.shared.config.identifier
    }

    fn state(&self) -> &HandlerState {
        &self.shared.state
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let record = record.clone();
        self.shared.worker.execute(move || shared.insert(&record))
    }

    /// Waits for queued inserts; each insert is already durable on completion
    fn flush(&self) -> Result<()> {
        self.shared.worker.sync()
    }
}

impl LogPresentable for LogStore {
    fn add_listener(&self, listener: Arc<dyn LogListener>) -> Subscription {
        LogStore::add_listener(self, listener)
    }

    fn get_log_count(&self, completion: Completion<Result<usize>>) {
        LogStore::get_log_count(self, completion);
    }

    fn get_logs(
        &self,
        filter: &ConditionFilter,
        before: Option<&StoredRecord>,
        limit: usize,
        completion: Completion<Result<Vec<StoredRecord>>>,
    ) {
        LogStore::get_logs(self, filter, before, limit, completion);
    }

    fn get_all_modules(&self, completion: Completion<Result<Vec<Module>>>) {
        LogStore::get_all_modules(self, completion);
    }

    fn delete_logs(&self, ids: Vec<i64>) {
        LogStore::delete_logs(self, ids);
    }

    fn delete_all_logs(&self) {
        LogStore::delete_all_logs(self);
    }

    fn export(&self, completion: Completion<Result<PathBuf>>) {
        LogStore::export(self, completion);
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("identifier", &self.shared.config.identifier)
            .field("path", &self.shared.config.path)
            .field("open", &!self.is_closed())
            .finish()
    }
}
