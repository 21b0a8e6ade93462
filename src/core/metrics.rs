//! Dispatch counters
//!
//! Counts what happened to records once they reached the worker: how many
//! handler deliveries succeeded, failed or were filtered out.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`Dispatcher`](super::dispatcher::Dispatcher)
///
/// # Example
///
/// ```
/// use logbook::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
/// metrics.record_delivered();
/// metrics.record_failed();
///
/// assert_eq!(metrics.delivered(), 1);
/// assert_eq!(metrics.failed(), 1);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Records accepted by `log` while the dispatcher was enabled
    dispatched: AtomicU64,

    /// Records dropped because the dispatcher was disabled
    suppressed: AtomicU64,

    /// Successful `Handler::write` calls
    delivered: AtomicU64,

    /// `Handler::write` calls that returned an error or panicked
    failed: AtomicU64,

    /// Handler deliveries skipped by the enabled flag or the filter
    filtered: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_suppressed(&self) -> u64 {
        self.suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage (0.0 - 100.0) of attempted ones
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.suppressed.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            dispatched: AtomicU64::new(self.dispatched()),
            suppressed: AtomicU64::new(self.suppressed()),
            delivered: AtomicU64::new(self.delivered()),
            failed: AtomicU64::new(self.failed()),
            filtered: AtomicU64::new(self.filtered()),
        }
    }
}
