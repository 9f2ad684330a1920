//! Pool configuration and builder.

use std::num::NonZeroUsize;

use plait_core::{ExecutorError, ExecutorResult};

use crate::ThreadPool;

/// Worker count used when the platform cannot report its parallelism.
pub const FALLBACK_THREADS: usize = 4;

/// How many worker threads a pool should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadCount {
    /// One worker per hardware thread
    #[default]
    AvailableParallelism,
    /// Exactly this many workers
    Exact(NonZeroUsize),
}

impl ThreadCount {
    /// Resolve to a concrete worker count.
    #[must_use]
    pub fn resolve(self) -> usize {
        match self {
            Self::AvailableParallelism => std::thread::available_parallelism()
                .map_or(FALLBACK_THREADS, NonZeroUsize::get),
            Self::Exact(count) => count.get(),
        }
    }
}

/// Configuration for a [`ThreadPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads
    pub num_threads: ThreadCount,
    /// Thread name prefix for worker threads
    pub thread_name_prefix: String,
    /// Stack size for worker threads, platform default when `None`
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: ThreadCount::default(),
            thread_name_prefix: "plait-worker".into(),
            stack_size: None,
        }
    }
}

/// Builder for configuring a [`ThreadPool`].
///
/// # Examples
///
/// ```
/// use plait_executor::ThreadPoolBuilder;
///
/// let pool = ThreadPoolBuilder::new()
///     .num_threads(2)
///     .thread_name_prefix("resize")
///     .build()
///     .unwrap();
/// assert_eq!(pool.num_threads(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThreadPoolBuilder {
    config: PoolConfig,
    requested_threads: Option<usize>,
}

impl ThreadPoolBuilder {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub fn from_config(config: PoolConfig) -> Self {
        Self {
            config,
            requested_threads: None,
        }
    }

    /// Set the number of worker threads.
    ///
    /// Zero is rejected when the pool is built.
    #[must_use]
    pub fn num_threads(mut self, count: usize) -> Self {
        self.requested_threads = Some(count);
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    /// Validate the settings into a [`PoolConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::InvalidConfiguration`] if zero threads were
    /// requested.
    pub fn into_config(self) -> ExecutorResult<PoolConfig> {
        let mut config = self.config;
        if let Some(requested) = self.requested_threads {
            let count = NonZeroUsize::new(requested).ok_or_else(|| {
                ExecutorError::InvalidConfiguration("num_threads must be at least 1".into())
            })?;
            config.num_threads = ThreadCount::Exact(count);
        }
        Ok(config)
    }

    /// Build the pool and start its workers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a worker thread
    /// cannot be spawned.
    pub fn build(self) -> ExecutorResult<ThreadPool> {
        ThreadPool::from_config(self.into_config()?)
    }
}
