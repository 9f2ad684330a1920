//! The parallel transform engine.
//!
//! Every operation follows the same shape: pre-size one result slot per
//! input index, let up to `pool.num_threads()` workers claim indices from a
//! shared counter, run the user function, write the slot, and once the
//! fan-out has drained read the slots back in index order.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use plait_core::{panic_message, BoxError, Error, Result};
use plait_executor::ThreadPool;
use plait_sync::CancellationToken;
use tracing::{debug, warn};

use crate::slots::ResultSlots;

/// Outcome of processing one index inside a fan-out.
pub(crate) type Step = std::result::Result<ControlFlow<()>, BoxError>;

/// Tuning knobs for a [`ParallelEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Indices a worker claims per scheduling step
    pub chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { chunk_size: 1 }
    }
}

/// Runs parallel, order-preserving comprehensions over slices.
///
/// An engine is a cheap handle: a pool selection plus an [`EngineConfig`].
/// It holds no state between calls, so one engine (or many engines on one
/// pool) can serve concurrent callers.
///
/// # Examples
///
/// ```
/// use plait_iter::ParallelEngine;
///
/// let engine = ParallelEngine::new();
/// let items = [3usize, 1, 4, 1, 5, 9, 2, 6];
///
/// let mapped = engine.map(&items, |x, i| x * 10 + i).unwrap();
/// assert_eq!(mapped, vec![30, 11, 42, 13, 54, 95, 26, 67]);
///
/// let big = engine.filter(&items, |x, _| *x > 4).unwrap();
/// assert_eq!(big, vec![5, 9, 6]);
///
/// assert_eq!(engine.find_first(&items, |x, _| *x > 4).unwrap(), Some(&5));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParallelEngine<'p> {
    pool: Option<&'p ThreadPool>,
    config: EngineConfig,
}

impl ParallelEngine<'static> {
    /// An engine running on the process-wide default pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: None,
            config: EngineConfig::default(),
        }
    }
}

impl Default for ParallelEngine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> ParallelEngine<'p> {
    /// An engine running on a caller-supplied pool.
    #[must_use]
    pub fn on(pool: &'p ThreadPool) -> Self {
        Self {
            pool: Some(pool),
            config: EngineConfig::default(),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how many indices a worker claims at a time. Zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub(crate) fn pool(&self) -> Result<&'p ThreadPool> {
        match self.pool {
            Some(pool) => Ok(pool),
            None => Ok(plait_executor::global()?),
        }
    }

    pub(crate) fn chunk_size(&self) -> usize {
        self.config.chunk_size.max(1)
    }

    /// Apply `func` to every element; `output[i] == func(&items[i], i)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Panicked`] if `func` panics, or an executor error if
    /// the pool cannot run the work.
    pub fn map<T, R, F>(&self, items: &[T], func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
    {
        self.try_map(items, |item, index| Ok::<R, Infallible>(func(item, index)))
    }

    /// Fallible [`map`](Self::map).
    ///
    /// The first failure observed cancels the indices nobody has started yet;
    /// results already computed are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UserFunction`] or [`Error::Panicked`], or an executor
    /// error. When several workers fail before they observe the cancellation,
    /// the failure at the lowest index among those observed is reported. With
    /// one worker this is exactly the first failure in index order.
    pub fn try_map<T, R, E, F>(&self, items: &[T], func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<R, E> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let slots = ResultSlots::new(items.len());
        self.fan_out("map", items.len(), |index| {
            let value = func(&items[index], index).map_err(Into::<BoxError>::into)?;
            // SAFETY: `fan_out` hands every index to exactly one step.
            unsafe { slots.write(index, value) };
            Ok(ControlFlow::Continue(()))
        })?;

        slots.into_vec().map_err(|index| Error::MissingResult { index })
    }

    /// Apply `func` to every element and concatenate the produced sequences
    /// in input order. Order inside each produced sequence is kept.
    ///
    /// # Errors
    ///
    /// Same as [`map`](Self::map).
    pub fn map_and_join<T, R, I, F>(&self, items: &[T], func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        I: IntoIterator<Item = R>,
        F: Fn(&T, usize) -> I + Sync,
    {
        self.try_map_and_join(items, |item, index| Ok::<I, Infallible>(func(item, index)))
    }

    /// Fallible [`map_and_join`](Self::map_and_join).
    ///
    /// # Errors
    ///
    /// Same as [`try_map`](Self::try_map).
    pub fn try_map_and_join<T, R, I, E, F>(&self, items: &[T], func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        I: IntoIterator<Item = R>,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<I, E> + Sync,
    {
        let parts = self.try_map(items, |item, index| {
            func(item, index).map(|part| part.into_iter().collect::<Vec<R>>())
        })?;

        let total = parts.iter().map(Vec::len).sum();
        let mut joined = Vec::with_capacity(total);
        for part in parts {
            joined.extend(part);
        }
        Ok(joined)
    }

    /// Keep the elements for which `predicate` holds, in input order.
    ///
    /// # Errors
    ///
    /// Same as [`map`](Self::map).
    pub fn filter<T, F>(&self, items: &[T], predicate: F) -> Result<Vec<T>>
    where
        T: Sync + Clone,
        F: Fn(&T, usize) -> bool + Sync,
    {
        self.try_filter(items, |item, index| Ok::<bool, Infallible>(predicate(item, index)))
    }

    /// Fallible [`filter`](Self::filter).
    ///
    /// # Errors
    ///
    /// Same as [`try_map`](Self::try_map).
    pub fn try_filter<T, E, F>(&self, items: &[T], predicate: F) -> Result<Vec<T>>
    where
        T: Sync + Clone,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync,
    {
        let keep = self.try_map(items, predicate)?;
        Ok(items
            .iter()
            .zip(keep)
            .filter_map(|(item, keep)| keep.then(|| item.clone()))
            .collect())
    }

    /// Fan `step` out over `0..len` and wait for the fan-out to drain.
    ///
    /// Workers claim `chunk_size` indices at a time from a shared counter, so
    /// every index reaches exactly one `step` call and claims happen in
    /// increasing index order. A step returning `Break` stops the calling
    /// worker only. An error or panic cancels the indices nobody has claimed
    /// yet and is returned once the in-flight steps have finished.
    pub(crate) fn fan_out<S>(&self, op: &'static str, len: usize, step: S) -> Result<()>
    where
        S: Fn(usize) -> Step + Sync,
    {
        if len == 0 {
            return Ok(());
        }

        let pool = self.pool()?;
        let chunk = self.chunk_size();
        let width = pool.num_threads().min(len.div_ceil(chunk));
        let fanout = Fanout::default();

        debug!(op, len, width, chunk, "dispatching comprehension");

        let job = || {
            while !fanout.cancel.is_cancelled() {
                let start = fanout.next.fetch_add(chunk, Ordering::Relaxed);
                if start >= len {
                    return;
                }
                // A claimed index always runs, so every index below a
                // recorded match is evaluated even after a cancellation.
                for index in start..(start + chunk).min(len) {
                    match catch_unwind(AssertUnwindSafe(|| step(index))) {
                        Ok(Ok(ControlFlow::Continue(()))) => {}
                        Ok(Ok(ControlFlow::Break(()))) => return,
                        Ok(Err(source)) => {
                            fanout.fail(op, index, Error::UserFunction { index, source });
                            return;
                        }
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            fanout.fail(op, index, Error::Panicked { index, message });
                            return;
                        }
                    }
                }
            }
        };

        pool.run_scoped(width, &job)?;

        match fanout.failure.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Shared state of one fan-out.
#[derive(Default)]
struct Fanout {
    next: AtomicUsize,
    cancel: CancellationToken,
    failure: Mutex<Option<Error>>,
}

impl Fanout {
    /// Record a failure and stop further claims.
    ///
    /// Several workers can fail before they observe the cancellation; the
    /// failure at the lowest index is kept.
    fn fail(&self, op: &'static str, index: usize, err: Error) {
        warn!(op, index, error = %err, "user function failed; cancelling remaining work");
        let mut failure = self.failure.lock();
        if lowest_failure(failure.as_ref(), index) {
            *failure = Some(err);
        }
        self.cancel.cancel();
    }
}

/// Whether a failure at `index` should replace `current`.
pub(crate) fn lowest_failure(current: Option<&Error>, index: usize) -> bool {
    current
        .and_then(Error::index)
        .map_or(true, |recorded| index < recorded)
}
