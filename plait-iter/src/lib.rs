//! Parallel, order-preserving comprehensions over slices.
//!
//! [`ParallelEngine`] applies a user function to every element of a slice on
//! a worker pool and assembles the results in input order, whatever order the
//! workers finish in. Four operations are provided, each with a fallible
//! `try_` twin:
//!
//! - `map`: one output per input
//! - `map_and_join`: zero or more outputs per input, concatenated
//! - `filter`: the inputs for which a predicate holds
//! - `find_first`: the lowest-index match, with early exit
//!
//! [`ParallelSliceExt`] exposes the same operations as methods on `[T]`.
//!
//! ```
//! use plait_iter::ParallelSliceExt;
//!
//! let words = ["plait", "weave", "braid"];
//! let lengths = words.par_map(|w, _| w.len()).unwrap();
//! assert_eq!(lengths, vec![5, 5, 5]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
mod search;
pub mod slice;
mod slots;

pub use engine::{EngineConfig, ParallelEngine};
pub use plait_core::{BoxError, Error, Result};
pub use slice::ParallelSliceExt;
