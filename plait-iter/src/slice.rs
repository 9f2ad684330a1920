//! Comprehension methods on slices.

use plait_core::{BoxError, Result};
use plait_executor::ThreadPool;

use crate::engine::ParallelEngine;

/// Parallel comprehensions callable directly on a slice.
///
/// The plain methods run on the process-wide pool; the `_on` methods take the
/// pool to run on. Both forms keep input order in their output and pass each
/// element's index alongside the element.
pub trait ParallelSliceExt<T: Sync> {
    /// See [`ParallelEngine::map`].
    ///
    /// # Errors
    ///
    /// Fails if `func` panics or the pool cannot run the work.
    fn par_map<R, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&T, usize) -> R + Sync;

    /// [`par_map`](Self::par_map) on a caller-supplied pool.
    ///
    /// # Errors
    ///
    /// Fails if `func` panics or the pool cannot run the work.
    fn par_map_on<R, F>(&self, pool: &ThreadPool, func: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&T, usize) -> R + Sync;

    /// See [`ParallelEngine::try_map`].
    ///
    /// # Errors
    ///
    /// Fails if `func` returns an error or panics.
    fn try_par_map<R, E, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<R, E> + Sync;

    /// See [`ParallelEngine::map_and_join`].
    ///
    /// # Errors
    ///
    /// Fails if `func` panics or the pool cannot run the work.
    fn par_map_and_join<R, I, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        I: IntoIterator<Item = R>,
        F: Fn(&T, usize) -> I + Sync;

    /// [`par_map_and_join`](Self::par_map_and_join) on a caller-supplied pool.
    ///
    /// # Errors
    ///
    /// Fails if `func` panics or the pool cannot run the work.
    fn par_map_and_join_on<R, I, F>(&self, pool: &ThreadPool, func: F) -> Result<Vec<R>>
    where
        R: Send,
        I: IntoIterator<Item = R>,
        F: Fn(&T, usize) -> I + Sync;

    /// See [`ParallelEngine::try_map_and_join`].
    ///
    /// # Errors
    ///
    /// Fails if `func` returns an error or panics.
    fn try_par_map_and_join<R, I, E, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        I: IntoIterator<Item = R>,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<I, E> + Sync;

    /// See [`ParallelEngine::filter`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics or the pool cannot run the work.
    fn par_filter<F>(&self, predicate: F) -> Result<Vec<T>>
    where
        T: Clone,
        F: Fn(&T, usize) -> bool + Sync;

    /// [`par_filter`](Self::par_filter) on a caller-supplied pool.
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics or the pool cannot run the work.
    fn par_filter_on<F>(&self, pool: &ThreadPool, predicate: F) -> Result<Vec<T>>
    where
        T: Clone,
        F: Fn(&T, usize) -> bool + Sync;

    /// See [`ParallelEngine::try_filter`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` returns an error or panics.
    fn try_par_filter<E, F>(&self, predicate: F) -> Result<Vec<T>>
    where
        T: Clone,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync;

    /// See [`ParallelEngine::find_first`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics below the match.
    fn par_find_first<F>(&self, predicate: F) -> Result<Option<&T>>
    where
        F: Fn(&T, usize) -> bool + Sync;

    /// [`par_find_first`](Self::par_find_first) on a caller-supplied pool.
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics below the match.
    fn par_find_first_on<F>(&self, pool: &ThreadPool, predicate: F) -> Result<Option<&T>>
    where
        F: Fn(&T, usize) -> bool + Sync;

    /// See [`ParallelEngine::try_find_first`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` returns an error or panics below the match.
    fn try_par_find_first<E, F>(&self, predicate: F) -> Result<Option<&T>>
    where
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync;

    /// See [`ParallelEngine::position`].
    ///
    /// # Errors
    ///
    /// Fails if `predicate` panics below the match.
    fn par_position<F>(&self, predicate: F) -> Result<Option<usize>>
    where
        F: Fn(&T, usize) -> bool + Sync;
}

impl<T: Sync> ParallelSliceExt<T> for [T] {
    fn par_map<R, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
    {
        ParallelEngine::new().map(self, func)
    }

    fn par_map_on<R, F>(&self, pool: &ThreadPool, func: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
    {
        ParallelEngine::on(pool).map(self, func)
    }

    fn try_par_map<R, E, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<R, E> + Sync,
    {
        ParallelEngine::new().try_map(self, func)
    }

    fn par_map_and_join<R, I, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        I: IntoIterator<Item = R>,
        F: Fn(&T, usize) -> I + Sync,
    {
        ParallelEngine::new().map_and_join(self, func)
    }

    fn par_map_and_join_on<R, I, F>(&self, pool: &ThreadPool, func: F) -> Result<Vec<R>>
    where
        R: Send,
        I: IntoIterator<Item = R>,
        F: Fn(&T, usize) -> I + Sync,
    {
        ParallelEngine::on(pool).map_and_join(self, func)
    }

    fn try_par_map_and_join<R, I, E, F>(&self, func: F) -> Result<Vec<R>>
    where
        R: Send,
        I: IntoIterator<Item = R>,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<I, E> + Sync,
    {
        ParallelEngine::new().try_map_and_join(self, func)
    }

    fn par_filter<F>(&self, predicate: F) -> Result<Vec<T>>
    where
        T: Clone,
        F: Fn(&T, usize) -> bool + Sync,
    {
        ParallelEngine::new().filter(self, predicate)
    }

    fn par_filter_on<F>(&self, pool: &ThreadPool, predicate: F) -> Result<Vec<T>>
    where
        T: Clone,
        F: Fn(&T, usize) -> bool + Sync,
    {
        ParallelEngine::on(pool).filter(self, predicate)
    }

    fn try_par_filter<E, F>(&self, predicate: F) -> Result<Vec<T>>
    where
        T: Clone,
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync,
    {
        ParallelEngine::new().try_filter(self, predicate)
    }

    fn par_find_first<F>(&self, predicate: F) -> Result<Option<&T>>
    where
        F: Fn(&T, usize) -> bool + Sync,
    {
        ParallelEngine::new().find_first(self, predicate)
    }

    fn par_find_first_on<F>(&self, pool: &ThreadPool, predicate: F) -> Result<Option<&T>>
    where
        F: Fn(&T, usize) -> bool + Sync,
    {
        ParallelEngine::on(pool).find_first(self, predicate)
    }

    fn try_par_find_first<E, F>(&self, predicate: F) -> Result<Option<&T>>
    where
        E: Into<BoxError>,
        F: Fn(&T, usize) -> std::result::Result<bool, E> + Sync,
    {
        ParallelEngine::new().try_find_first(self, predicate)
    }

    fn par_position<F>(&self, predicate: F) -> Result<Option<usize>>
    where
        F: Fn(&T, usize) -> bool + Sync,
    {
        ParallelEngine::new().position(self, predicate)
    }
}
