//! # Plait - Weaving Results Back Into Order
//!
//! Plait adds functional comprehensions to collections. Ordered sequences get
//! parallel `map`, `map_and_join`, `filter`, and `find_first` that run the
//! user function across a worker pool yet return results in input order;
//! maps and sets get sequential `map` and `filter` passes built on the
//! [`Tuple`] key/value pair.
//!
//! ## Features
//!
//! - **Order preserving**: output position `i` always corresponds to input `i`
//! - **Early exit**: `find_first` stops starting work past the lowest match
//! - **Injectable pools**: every operation can run on a pool you own
//! - **No partial results**: a call returns everything or one [`Error`]
//! - **Collections** (default feature): map and set comprehensions
//!
//! ## Quick start
//!
//! ```
//! use plait::prelude::*;
//!
//! let items = [3usize, 1, 4, 1, 5, 9, 2, 6];
//!
//! let tagged = items.par_map(|x, i| x * 10 + i).unwrap();
//! assert_eq!(tagged, vec![30, 11, 42, 13, 54, 95, 26, 67]);
//!
//! let plait = Plait::builder().worker_threads(2).build().unwrap();
//! assert_eq!(plait.filter(&items, |x, _| *x > 4).unwrap(), vec![5, 9, 6]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use plait_core::{panic_message, BoxError, Error, ExecutorError, ExecutorResult, Result, Tuple};
pub use plait_executor::{PoolConfig, ThreadCount, ThreadPool, ThreadPoolBuilder};
pub use plait_iter::{EngineConfig, ParallelEngine, ParallelSliceExt};
pub use plait_sync::{CancellationToken, WaitGroup};

#[cfg(feature = "collections")]
pub use plait_collections::{map_from_tuples, MapComprehensionExt, SetComprehensionExt, TupleInsertExt};

use std::sync::Arc;

use tracing::info;

/// A worker pool bundled with the engine settings used on it.
///
/// Most programs can use the slice methods from [`ParallelSliceExt`], which
/// run on the shared process-wide pool. A `Plait` is for callers that want
/// their own pool: a dedicated thread count, thread names, or chunking.
///
/// # Examples
///
/// ```
/// use plait::Plait;
///
/// let plait = Plait::builder()
///     .worker_threads(4)
///     .thread_name_prefix("indexer")
///     .chunk_size(16)
///     .build()
///     .unwrap();
///
/// let words = ["plait", "braid", "weave"];
/// let shouted = plait.map(&words, |w, _| w.to_uppercase()).unwrap();
/// assert_eq!(shouted, ["PLAIT", "BRAID", "WEAVE"]);
/// ```
#[derive(Debug, Clone)]
pub struct Plait {
    pool: Arc<ThreadPool>,
    config: EngineConfig,
}

impl Plait {
    /// Create a runtime with one worker per available core.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker threads cannot be started.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the runtime.
    #[must_use]
    pub fn builder() -> PlaitBuilder {
        PlaitBuilder::new()
    }

    /// An engine bound to this runtime's pool and settings.
    #[must_use]
    pub fn engine(&self) -> ParallelEngine<'_> {
        ParallelEngine::on(&self.pool).with_config(self.config)
    }

    /// The underlying worker pool.
    #[must_use]
    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.num_threads()
    }

    /// See [`ParallelEngine::map`].
    ///
    /// # Errors
    ///
    /// Fails if `func` panics.
    pub fn map<T, R, F>(&self, items: &[T], func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
    {
        self.engine().map(items, func)
    }

    /// See [`ParallelEngine::map_and_join`].
    ///
    /// # Errors
    ///
    /// Fails if `func` panics.
    pub fn map_and_join<T, R, I, F>(&self, items: &[T], func: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        I: IntoIterator<Item = R>,
        F: Fn(&T, usize) -> I + Sync,
    {
        self.engine().map_and_join(items, func)
    }

    /// See [`ParallelEngine::filter`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics.
    pub fn filter<T, F>(&self, items: &[T], predicate: F) -> Result<Vec<T>>
    where
        T: Sync + Clone,
        F: Fn(&T, usize) -> bool + Sync,
    {
        self.engine().filter(items, predicate)
    }

    /// See [`ParallelEngine::find_first`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics below the match.
    pub fn find_first<'a, T, F>(&self, items: &'a [T], predicate: F) -> Result<Option<&'a T>>
    where
        T: Sync,
        F: Fn(&T, usize) -> bool + Sync,
    {
        self.engine().find_first(items, predicate)
    }

    /// See [`ParallelEngine::find_first_shared`].
    ///
    /// Returns once the lowest match is confirmed, leaving predicate calls at
    /// higher indices to finish in the background.
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics below the match.
    pub fn find_first_shared<T, F>(&self, items: Arc<[T]>, predicate: F) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&T, usize) -> bool + Send + Sync + 'static,
    {
        self.engine().find_first_shared(items, predicate)
    }
}

/// Builder for [`Plait`].
#[derive(Debug, Clone, Default)]
pub struct PlaitBuilder {
    pool: ThreadPoolBuilder,
    config: EngineConfig,
}

impl PlaitBuilder {
    /// Start from the defaults: one worker per core, chunk size one.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads. Zero is rejected by [`build`](Self::build).
    #[must_use]
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.pool = self.pool.num_threads(count);
        self
    }

    /// Set the prefix of worker thread names.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.pool = self.pool.thread_name_prefix(prefix);
        self
    }

    /// Set the stack size of worker threads, in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.pool = self.pool.stack_size(bytes);
        self
    }

    /// Set how many indices a worker claims at a time.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Start the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::InvalidConfiguration`] for a zero thread
    /// count, or [`ExecutorError::ThreadSpawnFailed`] if a worker cannot be
    /// started.
    pub fn build(self) -> Result<Plait> {
        let pool = self.pool.build()?;
        info!(
            workers = pool.num_threads(),
            chunk_size = self.config.chunk_size,
            "plait runtime started"
        );
        Ok(Plait {
            pool: Arc::new(pool),
            config: self.config,
        })
    }
}

/// Get the process-wide pool used by the plain slice methods.
///
/// The pool is created on first use with one worker per available core.
///
/// # Errors
///
/// Returns an error if the pool's threads could not be started.
pub fn global() -> ExecutorResult<&'static ThreadPool> {
    plait_executor::global()
}

/// Common imports for Plait users.
pub mod prelude {
    pub use crate::{Error, ParallelEngine, ParallelSliceExt, Plait, PlaitBuilder, Result, ThreadPool, Tuple};

    #[cfg(feature = "collections")]
    pub use crate::{map_from_tuples, MapComprehensionExt, SetComprehensionExt, TupleInsertExt};
}
