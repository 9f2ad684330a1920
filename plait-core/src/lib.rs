//! # Plait Core
//!
//! Shared vocabulary for the Plait collection comprehension library.
//!
//! Plait runs user functions over the elements of a collection, in parallel
//! for ordered sequences and sequentially for maps and sets, and weaves the
//! results back together in input order. This crate holds the pieces every
//! layer agrees on:
//!
//! - [`Tuple`]: the key/value pair used to walk map entries uniformly
//! - [`Error`] and [`ExecutorError`]: everything a comprehension can fail with
//! - [`BoxError`]: how fallible user functions report their own errors

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod tuple;

pub use error::{panic_message, BoxError, Error, ExecutorError, ExecutorResult, Result};
pub use tuple::Tuple;
