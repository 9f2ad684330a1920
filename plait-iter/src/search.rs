//! Find-first searches with cooperative early exit.
//!
//! Indices are claimed in increasing order, so when a match at index `m` is
//! recorded every index below `m` has already been claimed. Workers stop
//! claiming as soon as the next index lies past the lowest match seen so far;
//! calls already running finish, but their results can only lower the match.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use plait_core::{panic_message, BoxError, Error, ExecutorError, Result};
use plait_executor::ThreadPool;
use plait_sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::{lowest_failure, ParallelEngine};

const NOT_FOUND: usize = usize::MAX;

impl<'p> ParallelEngine<'p> {
    /// The element at the lowest index for which `predicate` holds.
    ///
    /// Elements past a recorded match are never started. Predicate calls that
    /// were already running when the match was recorded finish before this
    /// returns, since they borrow `items`; their results are ignored unless
    /// they are at a lower index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Panicked`] if the predicate panics below the match,
    /// or an executor error.
    pub fn find_first<'a, T, F>(&self, items: &'a [T], predicate: F) -> Result<Option<&'a T>>
    where
        T: Sync,
        F: Fn(&T, usize) -> bool + Sync,
    {
        Ok(self.position(items, predicate)?.map(|index| &items[index]))
    }

    /// Fallible [`find_first`](Self::find_first).
    ///
    /// # Errors
    ///
    /// Returns the lowest-index failure observed unless a match at a lower index
    /// supersedes it.
    pub fn try_find_first<'a, T, E, F>(
        &self,
        items: &'a [T],
        predicate: F,
    ) -> Result<Option<&'a T>>
    where
        T: Sync,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync,
    {
        Ok(self.try_position(items, predicate)?.map(|index| &items[index]))
    }

    /// Index of the first element for which `predicate` holds.
    ///
    /// # Errors
    ///
    /// Same as [`find_first`](Self::find_first).
    pub fn position<T, F>(&self, items: &[T], predicate: F) -> Result<Option<usize>>
    where
        T: Sync,
        F: Fn(&T, usize) -> bool + Sync,
    {
        self.try_position(items, |item, index| Ok::<bool, Infallible>(predicate(item, index)))
    }

    /// Fallible [`position`](Self::position).
    ///
    /// # Errors
    ///
    /// Same as [`try_find_first`](Self::try_find_first).
    pub fn try_position<T, E, F>(&self, items: &[T], predicate: F) -> Result<Option<usize>>
    where
        T: Sync,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync,
    {
        let best = AtomicUsize::new(NOT_FOUND);

        let outcome = self.fan_out("find_first", items.len(), |index| {
            if index > best.load(Ordering::Acquire) {
                return Ok(ControlFlow::Break(()));
            }
            if predicate(&items[index], index).map_err(Into::<BoxError>::into)? {
                let previous = best.fetch_min(index, Ordering::AcqRel);
                if previous == NOT_FOUND {
                    debug!(index, "match found; skipping higher indices");
                }
                // Every later claim lies past this match.
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        });

        let best = best.into_inner();
        let found = (best != NOT_FOUND).then_some(best);
        match outcome {
            Ok(()) => Ok(found),
            Err(err) => match (found, err.index()) {
                (Some(found), Some(failed)) if found < failed => Ok(Some(found)),
                _ => Err(err),
            },
        }
    }

    /// Find-first over shared, owned data.
    ///
    /// Unlike [`find_first`](Self::find_first) this returns as soon as the
    /// lowest match is confirmed, that is once every index below it has been
    /// evaluated, without waiting for predicate calls at higher indices that
    /// are still running. Those calls keep their own handle on `items` and
    /// finish in the background; their results are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Panicked`] if the predicate panics below the match,
    /// or an executor error.
    pub fn find_first_shared<T, F>(&self, items: Arc<[T]>, predicate: F) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&T, usize) -> bool + Send + Sync + 'static,
    {
        self.try_find_first_shared(items, move |item: &T, index| {
            Ok::<bool, Infallible>(predicate(item, index))
        })
    }

    /// Fallible [`find_first_shared`](Self::find_first_shared).
    ///
    /// # Errors
    ///
    /// Returns the lowest-index failure observed unless a match at a lower index
    /// supersedes it.
    pub fn try_find_first_shared<T, E, F>(&self, items: Arc<[T]>, predicate: F) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Send + Sync + 'static,
    {
        let len = items.len();
        if len == 0 {
            return Ok(None);
        }

        let pool = self.pool()?;
        // A worker waiting on any pool could starve it; search inline instead.
        let inline = ThreadPool::on_any_worker_thread();
        let width = if inline { 1 } else { pool.num_threads().min(len) };
        let search = Arc::new(SharedSearch::new(len, width));
        let predicate = Arc::new(predicate);

        debug!(op = "find_first_shared", len, width, "dispatching comprehension");

        let worker = {
            let items = Arc::clone(&items);
            let search = Arc::clone(&search);
            move || search.run(&items, &*predicate)
        };

        if inline {
            worker();
        } else {
            let worker = Arc::new(worker);
            let mut submitted = 0;
            for _ in 0..width {
                let worker = Arc::clone(&worker);
                if pool.execute(move || (*worker)()).is_err() {
                    break;
                }
                submitted += 1;
            }
            if submitted < width {
                search.abandon_workers(width - submitted);
            }
            if submitted == 0 {
                return Err(ExecutorError::ShuttingDown.into());
            }
        }

        Ok(search.wait()?.map(|index| items[index].clone()))
    }
}

#[derive(Default)]
struct Progress {
    resolved: Vec<bool>,
    // Every index below `frontier` has been evaluated.
    frontier: usize,
    running: usize,
    failure: Option<Error>,
}

struct SharedSearch {
    next: AtomicUsize,
    best: AtomicUsize,
    cancel: CancellationToken,
    progress: Mutex<Progress>,
    changed: Condvar,
}

impl SharedSearch {
    fn new(len: usize, workers: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            best: AtomicUsize::new(NOT_FOUND),
            cancel: CancellationToken::new(),
            progress: Mutex::new(Progress {
                resolved: vec![false; len],
                running: workers,
                ..Progress::default()
            }),
            changed: Condvar::new(),
        }
    }

    fn run<T, E, F>(&self, items: &[T], predicate: &F)
    where
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E>,
    {
        while !self.cancel.is_cancelled() {
            let index = self.next.fetch_add(1, Ordering::Relaxed);
            if index >= items.len() || index > self.best.load(Ordering::Acquire) {
                break;
            }
            match catch_unwind(AssertUnwindSafe(|| predicate(&items[index], index))) {
                Ok(Ok(true)) => {
                    self.best.fetch_min(index, Ordering::AcqRel);
                    self.resolve(index);
                    break;
                }
                Ok(Ok(false)) => self.resolve(index),
                Ok(Err(err)) => {
                    let source = err.into();
                    self.fail(index, Error::UserFunction { index, source });
                    break;
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    self.fail(index, Error::Panicked { index, message });
                    break;
                }
            }
        }
        self.abandon_workers(1);
    }

    fn resolve(&self, index: usize) {
        let mut progress = self.progress.lock();
        progress.resolved[index] = true;
        while progress.frontier < progress.resolved.len() && progress.resolved[progress.frontier] {
            progress.frontier += 1;
        }
        self.changed.notify_all();
    }

    fn fail(&self, index: usize, err: Error) {
        warn!(op = "find_first_shared", index, error = %err, "user function failed; cancelling remaining work");
        let mut progress = self.progress.lock();
        if lowest_failure(progress.failure.as_ref(), index) {
            progress.failure = Some(err);
        }
        self.cancel.cancel();
        self.changed.notify_all();
    }

    fn abandon_workers(&self, count: usize) {
        let mut progress = self.progress.lock();
        progress.running = progress.running.saturating_sub(count);
        self.changed.notify_all();
    }

    /// Block until the outcome is known.
    fn wait(&self) -> Result<Option<usize>> {
        let mut progress = self.progress.lock();
        loop {
            let best = self.best.load(Ordering::Acquire);
            if best != NOT_FOUND && progress.frontier >= best {
                if progress.running > 0 {
                    debug!(index = best, "match confirmed; not waiting for higher indices");
                }
                self.cancel.cancel();
                return Ok(Some(best));
            }
            if progress.failure.is_none() && progress.frontier == progress.resolved.len() {
                return Ok(None);
            }
            if progress.running == 0 {
                return match progress.failure.take() {
                    Some(err) => Err(err),
                    None if best != NOT_FOUND => Ok(Some(best)),
                    None => Ok(None),
                };
            }
            self.changed.wait(&mut progress);
        }
    }
}
