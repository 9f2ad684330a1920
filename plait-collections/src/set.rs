//! Set comprehensions.

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

/// Map and filter the elements of a set.
pub trait SetComprehensionExt<T> {
    /// The set of values `transform` produces. Equal results collapse.
    fn map_elements<U, F>(&self, transform: F) -> HashSet<U>
    where
        U: Eq + Hash,
        F: FnMut(&T) -> U;

    /// The elements for which `keep` holds.
    #[must_use]
    fn filter_elements<F>(&self, keep: F) -> Self
    where
        T: Clone,
        F: FnMut(&T) -> bool;
}

impl<T, S> SetComprehensionExt<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Clone,
{
    fn map_elements<U, F>(&self, transform: F) -> HashSet<U>
    where
        U: Eq + Hash,
        F: FnMut(&T) -> U,
    {
        self.iter().map(transform).collect()
    }

    fn filter_elements<F>(&self, mut keep: F) -> Self
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        let mut kept = HashSet::with_hasher(self.hasher().clone());
        kept.extend(self.iter().filter(|element| keep(element)).cloned());
        kept
    }
}
