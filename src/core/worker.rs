//! Serialized background worker
//!
//! One consumer thread drains a FIFO channel of tasks. Dispatch to handlers
//! and every operation on a log store run here, which gives all of them a
//! single total order. Tasks submitted from the worker thread itself run
//! inline, so a dispatch that writes into a store cannot be overtaken by a
//! query queued behind the dispatch.

use super::diagnostics;
use super::error::{LoggerError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Default shutdown timeout for draining a worker that is being dropped
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Task),
    RunAt(Instant, Task),
}

struct Delayed {
    due: Instant,
    seq: u64,
    task: Task,
}

// Min-heap on (due, seq)
impl Ord for Delayed {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Delayed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Delayed {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Delayed {}

pub struct Worker {
    name: String,
    sender: Option<Sender<Message>>,
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl Worker {
    /// Spawn a dedicated worker thread
    pub fn spawn(name: impl Into<String>) -> Result<Arc<Self>> {
        let name = name.into();
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::run(receiver))?;
        let thread_id = handle.thread().id();

        Ok(Arc::new(Self {
            name,
            sender: Some(sender),
            handle: Some(handle),
            thread_id,
        }))
    }

    /// The process-wide worker used by default by dispatchers and stores
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<Worker>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| {
            Worker::spawn("logbook-worker").expect("failed to spawn the shared log worker")
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the current thread is this worker's thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queue a task at the back of the FIFO
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        self.send(Message::Run(Box::new(task)))
    }

    /// Queue a task that becomes runnable once `delay` has passed
    pub fn submit_after(&self, delay: Duration, task: impl FnOnce() + Send + 'static) -> Result<()> {
        self.send(Message::RunAt(Instant::now() + delay, Box::new(task)))
    }

    /// Run inline when already on the worker thread, otherwise queue
    pub fn execute(&self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        if self.is_current() {
            Self::run_task(Box::new(task));
            Ok(())
        } else {
            self.submit(task)
        }
    }

    /// Run `f` on the worker and wait for its result
    pub fn run_sync<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_current() {
            return Ok(f());
        }
        let (tx, rx) = bounded(1);
        self.submit(move || {
            let _ = tx.send(f());
        })?;
        rx.recv().map_err(|_| LoggerError::WorkerStopped)
    }

    /// Block until every task queued before this call has run
    pub fn sync(&self) -> Result<()> {
        self.run_sync(|| ())
    }

    /// Like [`Worker::sync`] with an upper bound; returns `false` on timeout
    pub fn sync_timeout(&self, timeout: Duration) -> bool {
        if self.is_current() {
            return true;
        }
        let (tx, rx) = bounded(1);
        if self
            .submit(move || {
                let _ = tx.send(());
            })
            .is_err()
        {
            return false;
        }
        rx.recv_timeout(timeout).is_ok()
    }

    fn send(&self, message: Message) -> Result<()> {
        match self.sender {
            Some(ref sender) => sender.send(message).map_err(|_| LoggerError::WorkerStopped),
            None => Err(LoggerError::WorkerStopped),
        }
    }

    fn run(receiver: Receiver<Message>) {
        let mut delayed: BinaryHeap<Delayed> = BinaryHeap::new();
        let mut seq: u64 = 0;

        loop {
            let now = Instant::now();
            while delayed.peek().is_some_and(|next| next.due <= now) {
                if let Some(next) = delayed.pop() {
                    Self::run_task(next.task);
                }
            }

            let message = match delayed.peek() {
                Some(next) => {
                    match receiver.recv_timeout(next.due.saturating_duration_since(Instant::now())) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match receiver.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };

            match message {
                Message::Run(task) => Self::run_task(task),
                Message::RunAt(due, task) => {
                    seq += 1;
                    delayed.push(Delayed { due, seq, task });
                }
            }
        }
        // Delayed tasks still pending at shutdown are dropped unrun
    }

    /// Panics in one task must not take the worker down
    fn run_task(task: Task) {
        if let Err(panic_info) = diagnostics::isolate(task) {
            diagnostics::report_panic("log worker task", panic_info.as_ref());
        }
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.sender.is_some())
            .finish()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued and exit
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        diagnostics::report_error(format!(
                            "Log worker '{}' panicked during shutdown",
                            self.name
                        ));
                    }
                    break;
                }

                if start.elapsed() >= DEFAULT_SHUTDOWN_TIMEOUT {
                    diagnostics::report_error(format!(
                        "Log worker '{}' did not finish within {:?}; queued work may be lost",
                        self.name, DEFAULT_SHUTDOWN_TIMEOUT
                    ));
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

/// Result of an asynchronous operation, delivered by the worker
pub struct Pending<T> {
    receiver: Receiver<T>,
}

/// Completion callback used by the asynchronous store API
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

impl<T: Send + 'static> Pending<T> {
    /// Hand a completion callback to `register` and capture what it receives.
    ///
    /// ```no_run
    /// # use logbook::prelude::*;
    /// # fn demo(store: &LogStore) -> logbook::Result<()> {
    /// let count = Pending::capture(|done| store.get_log_count(done)).wait()??;
    /// # let _ = count;
    /// # Ok(())
    /// # }
    /// ```
    pub fn capture(register: impl FnOnce(Completion<T>)) -> Self {
        let (tx, rx) = bounded(1);
        register(Box::new(move |value| {
            let _ = tx.send(value);
        }));
        Self { receiver: rx }
    }

    /// Block until the value arrives
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| LoggerError::WorkerStopped)
    }

    /// Block for at most `timeout`; `None` if nothing arrived in time
    pub fn wait_timeout(self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Take the value if it already arrived
    pub fn try_take(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_tasks_run_in_fifo_order() {
        let worker = Worker::spawn("fifo-test").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let seen = Arc::clone(&seen);
            worker.submit(move || seen.lock().push(i)).unwrap();
        }
        worker.sync().unwrap();

        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_execute_runs_inline_on_worker_thread() {
        let worker = Worker::spawn("inline-test").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_worker = Arc::clone(&worker);
        let inner_seen = Arc::clone(&seen);
        worker
            .submit(move || {
                let nested = Arc::clone(&inner_seen);
                inner_worker.execute(move || nested.lock().push("nested")).unwrap();
                inner_seen.lock().push("outer");
            })
            .unwrap();
        let tail = Arc::clone(&seen);
        worker.submit(move || tail.lock().push("queued")).unwrap();
        worker.sync().unwrap();

        assert_eq!(*seen.lock(), vec!["nested", "outer", "queued"]);
    }

    #[test]
    fn test_delayed_task_runs_after_delay() {
        let worker = Worker::spawn("delay-test").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let late = Arc::clone(&seen);
        worker
            .submit_after(Duration::from_millis(100), move || late.lock().push("late"))
            .unwrap();
        let early = Arc::clone(&seen);
        worker.submit(move || early.lock().push("early")).unwrap();
        worker.sync().unwrap();
        assert_eq!(*seen.lock(), vec!["early"]);

        thread::sleep(Duration::from_millis(250));
        worker.sync().unwrap();
        assert_eq!(*seen.lock(), vec!["early", "late"]);
    }

    #[test]
    fn test_panicking_task_does_not_stop_worker() {
        let worker = Worker::spawn("panic-test").unwrap();
        worker.submit(|| panic!("task failure")).unwrap();
        let value = worker.run_sync(|| 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_pending_capture() {
        let worker = Worker::spawn("pending-test").unwrap();
        let pending = Pending::capture(|done: Completion<u32>| {
            worker.submit(move || done(7)).unwrap();
        });
        assert_eq!(pending.wait().unwrap(), 7);
        assert!(worker.sync_timeout(Duration::from_secs(1)));
    }
}
