//! Worker pool for the Plait collection comprehension library.
//!
//! A [`ThreadPool`] owns a fixed set of named worker threads that pull boxed
//! jobs from one shared queue. The pool size bounds how many jobs run at once;
//! the queue itself is unbounded.
//!
//! Besides fire-and-forget [`ThreadPool::execute`], the pool offers
//! [`ThreadPool::run_scoped`], which runs a *borrowed* job on several workers
//! and blocks until every copy has returned. That is what lets parallel
//! comprehensions read the caller's slice and closure without copying them.

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;

pub use config::{PoolConfig, ThreadCount, ThreadPoolBuilder, FALLBACK_THREADS};
pub use plait_core::{ExecutorError, ExecutorResult};

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use plait_core::panic_message;
use plait_sync::WaitGroup;
use tracing::{debug, trace, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    // Id of the pool whose worker is running on this thread, 0 elsewhere.
    static WORKER_OF: Cell<usize> = const { Cell::new(0) };
}

/// A fixed-size pool of worker threads.
///
/// Dropping the pool closes its queue, lets the workers drain every job
/// already queued, and joins them.
///
/// # Examples
///
/// ```
/// use plait_executor::ThreadPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let pool = ThreadPool::new(4).unwrap();
/// let hits = AtomicUsize::new(0);
///
/// pool.run_scoped(4, &|| {
///     hits.fetch_add(1, Ordering::Relaxed);
/// })
/// .unwrap();
///
/// assert_eq!(hits.load(Ordering::Relaxed), 4);
/// ```
pub struct ThreadPool {
    id: usize,
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    config: PoolConfig,
}

impl ThreadPool {
    /// Create a pool with `num_threads` workers and default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_threads` is zero or a worker cannot be spawned.
    pub fn new(num_threads: usize) -> ExecutorResult<Self> {
        Self::builder().num_threads(num_threads).build()
    }

    /// Create a builder for configuring a pool.
    #[must_use]
    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::new()
    }

    /// Start a pool from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ThreadSpawnFailed`] if a worker cannot be
    /// spawned; workers started before the failure are shut down again.
    pub fn from_config(config: PoolConfig) -> ExecutorResult<Self> {
        let size = config.num_threads.resolve();
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

        let mut pool = Self {
            id,
            sender: Some(sender),
            workers: Vec::with_capacity(size),
            config,
        };

        for index in 0..size {
            let receiver = receiver.clone();
            let mut builder = std::thread::Builder::new()
                .name(format!("{}-{index}", pool.config.thread_name_prefix));
            if let Some(bytes) = pool.config.stack_size {
                builder = builder.stack_size(bytes);
            }
            // On failure the partially built pool drops here and joins the
            // workers already running.
            let handle = builder
                .spawn(move || worker_loop(id, &receiver))
                .map_err(|err| ExecutorError::ThreadSpawnFailed(err.to_string()))?;
            pool.workers.push(handle);
        }

        debug!(
            pool = id,
            threads = size,
            prefix = %pool.config.thread_name_prefix,
            "started thread pool"
        );
        Ok(pool)
    }

    /// Number of worker threads.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Configuration the pool was built from.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Whether the calling thread is one of this pool's workers.
    #[must_use]
    pub fn is_worker_thread(&self) -> bool {
        WORKER_OF.with(|owner| owner.get() == self.id)
    }

    /// Whether the calling thread is a worker of any plait pool.
    ///
    /// A worker that blocks on another pool can end up waiting on workers
    /// that are themselves waiting on it, so nested fan-outs run inline
    /// whenever this holds.
    #[must_use]
    pub fn on_any_worker_thread() -> bool {
        WORKER_OF.with(|owner| owner.get() != 0)
    }

    /// Queue a job for execution on some worker.
    ///
    /// A panic inside the job is caught and logged; the worker survives it.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ShuttingDown`] if the queue is closed.
    pub fn execute<F>(&self, job: F) -> ExecutorResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(ExecutorError::ShuttingDown)?;
        sender
            .send(Box::new(job))
            .map_err(|_| ExecutorError::ShuttingDown)
    }

    /// Run a borrowed job on up to `width` workers and wait for all of them.
    ///
    /// Copies of `job` run concurrently and are expected to cooperate on some
    /// shared piece of work; any single copy must be able to finish that work
    /// alone. When called from a worker of any plait pool, this one or
    /// another, the job runs once, inline. A nested call therefore never
    /// waits on workers that may be blocked waiting on it.
    ///
    /// The call returns only after every submitted copy has finished, also
    /// when submission fails part way.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::WorkerPanicked`] if a copy panicked and
    /// [`ExecutorError::ShuttingDown`] if the queue is closed.
    pub fn run_scoped(&self, width: usize, job: &(dyn Fn() + Sync)) -> ExecutorResult<()> {
        if width == 0 {
            return Ok(());
        }
        if Self::on_any_worker_thread() {
            trace!(pool = self.id, "nested scoped run executes inline");
            return catch_unwind(AssertUnwindSafe(job)).map_err(|payload| {
                warn!(pool = self.id, panic = %panic_message(payload.as_ref()), "inline job panicked");
                ExecutorError::WorkerPanicked
            });
        }

        // SAFETY: the reference is only reachable from jobs counted in
        // `scope.pending`, and this function does not return before that
        // count drops to zero. Each job signals completion as its last use
        // of the reference, so `job` outlives every dereference.
        let job: &'static (dyn Fn() + Sync) = unsafe {
            std::mem::transmute::<&(dyn Fn() + Sync), &'static (dyn Fn() + Sync)>(job)
        };

        let scope = Arc::new(ScopeState::default());
        let mut submitted = Ok(());
        for _ in 0..width {
            scope.pending.add(1);
            let task_scope = Arc::clone(&scope);
            let result = self.execute(move || {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                    warn!(panic = %panic_message(payload.as_ref()), "scoped job panicked");
                    task_scope.panicked.store(true, Ordering::Release);
                }
                task_scope.pending.done();
            });
            if let Err(err) = result {
                scope.pending.done();
                submitted = Err(err);
                break;
            }
        }

        scope.pending.wait();
        submitted?;
        if scope.panicked.load(Ordering::Acquire) {
            return Err(ExecutorError::WorkerPanicked);
        }
        Ok(())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Closing the queue ends each worker loop once the queue is empty.
        drop(self.sender.take());

        if self.is_worker_thread() {
            // A worker cannot join itself; the remaining workers exit on
            // their own once the queue drains.
            debug!(pool = self.id, "thread pool dropped from its own worker");
            return;
        }

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!(pool = self.id, "worker thread terminated abnormally");
            }
        }
        debug!(pool = self.id, "thread pool shut down");
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("id", &self.id)
            .field("num_threads", &self.workers.len())
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Default)]
struct ScopeState {
    pending: WaitGroup,
    panicked: AtomicBool,
}

fn worker_loop(pool_id: usize, receiver: &Receiver<Job>) {
    WORKER_OF.with(|owner| owner.set(pool_id));
    while let Ok(job) = receiver.recv() {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
            warn!(pool = pool_id, panic = %panic_message(payload.as_ref()), "job panicked");
        }
    }
    trace!(pool = pool_id, "worker exiting");
}

static GLOBAL_POOL: OnceLock<ExecutorResult<ThreadPool>> = OnceLock::new();

/// Get or initialize the process-wide default pool.
///
/// The pool has one worker per hardware thread and lives for the rest of the
/// process.
///
/// # Errors
///
/// Returns the error the first initialization attempt failed with.
pub fn global() -> ExecutorResult<&'static ThreadPool> {
    GLOBAL_POOL
        .get_or_init(|| {
            ThreadPoolBuilder::new()
                .thread_name_prefix("plait-global")
                .build()
        })
        .as_ref()
        .map_err(Clone::clone)
}
