//! Map comprehensions and tuple construction.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use plait_core::Tuple;

/// Map, project, and filter the entries of a map.
pub trait MapComprehensionExt<K, V> {
    /// Build a new map from the tuple `transform` returns for each entry.
    ///
    /// When two entries produce equal keys only one survives, and which one
    /// depends on iteration order.
    fn map_entries<K2, V2, F>(&self, transform: F) -> HashMap<K2, V2>
    where
        K2: Eq + Hash,
        F: FnMut(Tuple<&K, &V>) -> Tuple<K2, V2>;

    /// Collect one value per entry, in iteration order.
    fn map_to_vec<R, F>(&self, transform: F) -> Vec<R>
    where
        F: FnMut(Tuple<&K, &V>) -> R;

    /// The entries for which `keep` holds.
    #[must_use]
    fn filter_entries<F>(&self, keep: F) -> Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(Tuple<&K, &V>) -> bool;
}

impl<K, V, S> MapComprehensionExt<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    fn map_entries<K2, V2, F>(&self, mut transform: F) -> HashMap<K2, V2>
    where
        K2: Eq + Hash,
        F: FnMut(Tuple<&K, &V>) -> Tuple<K2, V2>,
    {
        self.iter()
            .map(|(key, value)| transform(Tuple::new(key, value)))
            .collect()
    }

    fn map_to_vec<R, F>(&self, mut transform: F) -> Vec<R>
    where
        F: FnMut(Tuple<&K, &V>) -> R,
    {
        self.iter()
            .map(|(key, value)| transform(Tuple::new(key, value)))
            .collect()
    }

    fn filter_entries<F>(&self, mut keep: F) -> Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(Tuple<&K, &V>) -> bool,
    {
        let mut kept = HashMap::with_hasher(self.hasher().clone());
        for (key, value) in self {
            if keep(Tuple::new(key, value)) {
                kept.insert(key.clone(), value.clone());
            }
        }
        kept
    }
}

/// Build a map from tuples; a later tuple replaces an earlier one with the
/// same key.
pub fn map_from_tuples<K, V, I>(tuples: I) -> HashMap<K, V>
where
    K: Eq + Hash,
    I: IntoIterator<Item = Tuple<K, V>>,
{
    tuples.into_iter().collect()
}

/// Insert a [`Tuple`] as a map entry.
pub trait TupleInsertExt<K, V> {
    /// Insert the tuple's value under its key, returning the value it
    /// replaced.
    fn insert_tuple(&mut self, tuple: Tuple<K, V>) -> Option<V>;
}

impl<K, V, S> TupleInsertExt<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn insert_tuple(&mut self, tuple: Tuple<K, V>) -> Option<V> {
        let (key, value) = tuple.into_parts();
        self.insert(key, value)
    }
}
