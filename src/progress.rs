//! Progress of a transfer.
//!
//! A [`Progress`] is shared between the caller and the transfer loop. The loop
//! is the only writer of the unit counters and the caller the only writer of
//! the cancellation flag, so relaxed atomics are enough; readers may observe
//! slightly stale values.
//!
//! Cancellation is cooperative: the loop checks the flag every time it reports
//! a chunk, so it takes effect within one chunk (see
//! [`Config::read_chunk_size`](crate::Config::read_chunk_size)).

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicI64, Ordering},
};

#[derive(Debug)]
pub struct Progress {
    completed: AtomicI64,
    total: AtomicI64,
    cancellable: bool,
    cancelled: AtomicBool,
    destination: PathBuf,
}

impl Progress {
    pub(crate) fn new(destination: PathBuf, cancellable: bool) -> Self {
        Self {
            completed: AtomicI64::new(0),
            total: AtomicI64::new(0),
            cancellable,
            cancelled: AtomicBool::new(false),
            destination,
        }
    }

    #[must_use]
    pub fn completed_units(&self) -> i64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_units(&self) -> i64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed share in `0.0..=1.0`, `0.0` while the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction_completed(&self) -> f64 {
        let total = self.total_units();
        if total <= 0 {
            return 0.0;
        }
        (self.completed_units() as f64 / total as f64).min(1.0)
    }

    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Requests cancellation. Ignored if the progress is not cancellable.
    pub fn cancel(&self) {
        if self.cancellable {
            self.cancelled.store(true, Ordering::Relaxed);
        } else {
            debug!("ignoring cancel of {}", self.destination.display());
        }
    }

    /// Local file the transfer writes to.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Records `(done, total)` and returns whether the transfer should continue.
    pub(crate) fn update(&self, done: u64, total: u64) -> bool {
        self.completed
            .store(i64::try_from(done).unwrap_or(i64::MAX), Ordering::Relaxed);
        self.total
            .store(i64::try_from(total).unwrap_or(i64::MAX), Ordering::Relaxed);
        !self.is_cancelled()
    }
}
