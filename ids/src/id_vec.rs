//! Dense storage keyed by ids.
use core::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use crate::{Id, IdRange};

/// Values stored at the position of their key.
///
/// The keys of an `IdVec` are always the ids `0..len`, new entries get the next free id.
pub struct IdVec<K, V> {
    values: Vec<V>,
    _keys: PhantomData<K>,
}

impl<K: Id, V> IdVec<K, V> {
    fn wrap(values: Vec<V>) -> Self {
        assert!(
            values.len() <= K::CAPACITY,
            "{} entries exceed the id capacity",
            values.len()
        );
        IdVec {
            values,
            _keys: PhantomData,
        }
    }

    /// `len` entries, each a clone of `value`.
    pub fn repeat(value: V, len: usize) -> Self
    where
        V: Clone,
    {
        Self::wrap(vec![value; len])
    }

    /// Number of entries.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All keys in use.
    #[inline(always)]
    pub fn keys(&self) -> IdRange<K> {
        IdRange::from_index_range(0..self.len())
    }

    /// Values in key order.
    #[inline(always)]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Values in key order, mutably.
    #[inline(always)]
    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// Key value pairs in key order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, &V)> + ExactSizeIterator + '_ {
        self.keys().into_iter().zip(&self.values)
    }

    /// Key value pairs in key order with mutable values.
    pub fn iter_mut(
        &mut self,
    ) -> impl DoubleEndedIterator<Item = (K, &mut V)> + ExactSizeIterator + '_ {
        self.keys().into_iter().zip(&mut self.values)
    }

    /// The key [`push`][Self::push] hands out next.
    #[inline]
    pub fn next_unused_key(&self) -> K {
        K::from_id_index(self.len())
    }

    /// Stores `value` under a fresh key and returns that key.
    #[inline]
    pub fn push(&mut self, value: V) -> K {
        let key = self.next_unused_key();
        self.values.push(value);
        key
    }

    /// The value of `key`, `None` for keys not in use.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.values.get(key.id_index())
    }

    /// Sets every entry to `value`.
    pub fn fill(&mut self, value: V)
    where
        V: Clone,
    {
        self.values.fill(value);
    }
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        IdVec {
            values: vec![],
            _keys: PhantomData,
        }
    }
}

impl<K, V: Clone> Clone for IdVec<K, V> {
    fn clone(&self) -> Self {
        IdVec {
            values: self.values.clone(),
            _keys: PhantomData,
        }
    }
}

impl<K, V: PartialEq> PartialEq for IdVec<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<K, V: Eq> Eq for IdVec<K, V> {}

impl<K: Id, V: fmt::Debug> fmt::Debug for IdVec<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Id, V> Index<K> for IdVec<K, V> {
    type Output = V;

    #[inline(always)]
    #[track_caller]
    fn index(&self, key: K) -> &V {
        &self.values[key.id_index()]
    }
}

impl<K: Id, V> IndexMut<K> for IdVec<K, V> {
    #[inline(always)]
    #[track_caller]
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.values[key.id_index()]
    }
}

impl<K: Id, V> FromIterator<V> for IdVec<K, V> {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Self::wrap(iter.into_iter().collect())
    }
}
