//! Join and cancellation primitives for Plait.
//!
//! Every parallel comprehension fans work out to a pool and then blocks on a
//! [`WaitGroup`] until the fan-out has drained. Early-exiting operations share
//! a [`CancellationToken`] so workers stop claiming new indices.

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::{Condvar, Mutex};

/// A wait group for synchronizing multiple threads.
///
/// The counter lives under the mutex so a `done` racing with `wait` can
/// never lose its wakeup.
pub struct WaitGroup {
    counter: Mutex<usize>,
    condvar: Condvar,
}

impl WaitGroup {
    /// Create a new wait group.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: parking_lot::const_mutex(0),
            condvar: Condvar::new(),
        }
    }

    /// Add to the wait group counter.
    pub fn add(&self, delta: usize) {
        *self.counter.lock() += delta;
    }

    /// Mark one task as done.
    ///
    /// Calling `done` more often than `add` saturates at zero.
    pub fn done(&self) {
        let mut counter = self.counter.lock();
        *counter = counter.saturating_sub(1);
        if *counter == 0 {
            self.condvar.notify_all();
        }
    }

    /// Wait for all tasks to complete.
    pub fn wait(&self) {
        let mut counter = self.counter.lock();
        while *counter > 0 {
            self.condvar.wait(&mut counter);
        }
    }

    /// Get the current counter value.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.counter.lock()
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// A cooperative cancellation flag shared between a caller and its workers.
///
/// Cancelling never interrupts running work: it only tells workers to stop
/// picking up new work. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
