//! Key/value pairs used to walk mapping entries uniformly.

use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::HashMap;

/// An immutable key/value pair.
///
/// Sequential comprehensions over maps hand each entry to the user function as
/// a `Tuple<&K, &V>` and build new maps from the `Tuple<K, V>` values it
/// returns. Building a map additionally requires `K: Eq + Hash`; the pair
/// itself places no bound on its parts.
///
/// # Examples
///
/// ```
/// use plait_core::Tuple;
///
/// let tuple = Tuple::new("answer", 42);
/// assert_eq!(*tuple.key(), "answer");
/// assert_eq!(*tuple.value(), 42);
///
/// let (key, value) = tuple.into_parts();
/// assert_eq!((key, value), ("answer", 42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tuple<K, V> {
    key: K,
    value: V,
}

impl<K, V> Tuple<K, V> {
    /// Create a tuple holding `value` under `key`.
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// The key half of the pair.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// The value half of the pair.
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Split the tuple into its key and value.
    #[must_use]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Borrow both halves.
    #[must_use]
    pub const fn as_ref(&self) -> Tuple<&K, &V> {
        Tuple {
            key: &self.key,
            value: &self.value,
        }
    }

    /// Replace the value, keeping the key.
    #[must_use]
    pub fn map_value<U, F>(self, func: F) -> Tuple<K, U>
    where
        F: FnOnce(V) -> U,
    {
        Tuple {
            key: self.key,
            value: func(self.value),
        }
    }
}

impl<K: Clone, V: Clone> Tuple<&K, &V> {
    /// Clone a borrowed entry into an owned tuple.
    #[must_use]
    pub fn cloned(self) -> Tuple<K, V> {
        Tuple {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl<K, V> From<(K, V)> for Tuple<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

impl<K, V> From<Tuple<K, V>> for (K, V) {
    fn from(tuple: Tuple<K, V>) -> Self {
        tuple.into_parts()
    }
}

/// Later tuples overwrite earlier ones with an equal key.
impl<K, V, S> FromIterator<Tuple<K, V>> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = Tuple<K, V>>>(tuples: I) -> Self {
        let mut map = HashMap::with_hasher(S::default());
        map.extend(tuples);
        map
    }
}

impl<K, V, S> Extend<Tuple<K, V>> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = Tuple<K, V>>>(&mut self, tuples: I) {
        self.extend(tuples.into_iter().map(Tuple::into_parts));
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Tuple<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.key, self.value)
    }
}
