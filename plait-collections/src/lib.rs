//! Sequential comprehensions over maps and sets.
//!
//! Maps and sets have no element order to preserve, so these operations make
//! a single pass on the calling thread. Map entries reach the user function
//! as a borrowed [`Tuple<&K, &V>`](Tuple); nothing is cloned until a result
//! needs owning.
//!
//! ```
//! use std::collections::HashMap;
//! use plait_collections::{map_from_tuples, MapComprehensionExt};
//! use plait_core::Tuple;
//!
//! let prices = map_from_tuples([Tuple::new("tea", 3), Tuple::new("cake", 5)]);
//! let doubled: HashMap<String, i32> =
//!     prices.map_entries(|t| Tuple::new(t.key().to_string(), *t.value() * 2));
//! assert_eq!(doubled["cake"], 10);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod map;
pub mod set;

pub use map::{map_from_tuples, MapComprehensionExt, TupleInsertExt};
pub use plait_core::Tuple;
pub use set::SetComprehensionExt;
