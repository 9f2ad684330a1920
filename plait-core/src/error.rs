//! Error types and handling for Plait comprehensions.

use std::any::Any;

use thiserror::Error;

/// Boxed error produced by a fallible user function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by a blocking comprehension call.
///
/// A call either returns a complete result or exactly one of these; partial
/// results are never exposed.
#[derive(Debug, Error)]
pub enum Error {
    /// The user function returned an error for the element at `index`.
    #[error("user function failed at index {index}: {source}")]
    UserFunction {
        /// Input index the failing call was made for
        index: usize,
        /// Error returned by the user function
        #[source]
        source: BoxError,
    },
    /// The user function panicked while processing the element at `index`.
    #[error("user function panicked at index {index}: {message}")]
    Panicked {
        /// Input index the panicking call was made for
        index: usize,
        /// Panic payload rendered as text
        message: String,
    },
    /// A result slot was still empty when the result was assembled.
    #[error("no result was produced for index {index}")]
    MissingResult {
        /// Index of the empty slot
        index: usize,
    },
    /// The worker pool could not run the operation.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl Error {
    /// Input index the failure is attributed to, if any.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::UserFunction { index, .. }
            | Self::Panicked { index, .. }
            | Self::MissingResult { index } => Some(*index),
            Self::Executor(_) => None,
        }
    }

    /// Whether the failure came from a panic rather than a returned error.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    /// Take back the error the user function returned.
    ///
    /// Returns `None` for panics and executor failures.
    #[must_use]
    pub fn into_user_error(self) -> Option<BoxError> {
        match self {
            Self::UserFunction { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors that can occur while building or driving a worker pool.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Pool configuration is invalid
    #[error("invalid pool configuration: {0}")]
    InvalidConfiguration(String),
    /// A worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawnFailed(String),
    /// The job queue is closed
    #[error("thread pool is shutting down")]
    ShuttingDown,
    /// A job unwound past its own panic handling
    #[error("a job panicked on a worker thread")]
    WorkerPanicked,
}

/// A result type for comprehension calls.
pub type Result<T> = std::result::Result<T, Error>;

/// A result type for executor operations.
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;

/// Render a panic payload as text.
///
/// `panic!` payloads are either `&'static str` or `String`; anything else is
/// reported generically.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
