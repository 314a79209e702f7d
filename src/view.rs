//! Uncached key/value/entry views and the read iterators they share.
//!
//! Every view is a fresh, transient projection over the owning map;
//! nothing is cached on the map itself. All three are thin typed
//! wrappers over the same slot walker; which wrapper you hold is the
//! projection discriminant. Key and entry membership probe the table
//! directly; value membership has to scan.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use crate::map::{CompactHashMap, Slot};

/// Iterator over `(&K, &V)` entries in slot order, skipping empty
/// slots. The shared walker behind every projection.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(slots: &'a [Slot<K, V>]) -> Self {
        Self { slots: slots.iter() }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| slot.as_ref().map(|(k, v)| (k, v)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

/// Iterator over `(&K, &mut V)`: values may be rewritten in place,
/// keys and table structure stay fixed.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut [Slot<K, V>]) -> Self {
        Self {
            slots: slots.iter_mut(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots
            .find_map(|slot| slot.as_mut().map(|(k, v)| (&*k, v)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

/// Key projection of [`Iter`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Value projection of [`Iter`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Owning iterator over `(K, V)` entries in slot order.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Slot<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

impl<K, V, S> IntoIterator for CompactHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a CompactHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut CompactHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Read view over the map's keys.
pub struct KeysView<'a, K, V, S> {
    map: &'a CompactHashMap<K, V, S>,
}

impl<'a, K, V, S> KeysView<'a, K, V, S> {
    pub(crate) fn new(map: &'a CompactHashMap<K, V, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> Keys<'a, K, V> {
        Keys {
            inner: self.map.iter(),
        }
    }

    /// Direct probe, O(1) on average.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: ?Sized + Hash + Eq,
        S: BuildHasher,
    {
        self.map.contains_key(key)
    }
}

impl<'a, K, V, S> IntoIterator for KeysView<'a, K, V, S> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read view over the map's values.
pub struct ValuesView<'a, K, V, S> {
    map: &'a CompactHashMap<K, V, S>,
}

impl<'a, K, V, S> ValuesView<'a, K, V, S> {
    pub(crate) fn new(map: &'a CompactHashMap<K, V, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> Values<'a, K, V> {
        Values {
            inner: self.map.iter(),
        }
    }

    /// Linear scan over occupied slots, O(capacity); values are not
    /// indexed.
    pub fn contains(&self, value: &V) -> bool
    where
        K: Eq + Hash,
        V: PartialEq,
        S: BuildHasher,
    {
        self.map.contains_value(value)
    }
}

impl<'a, K, V, S> IntoIterator for ValuesView<'a, K, V, S> {
    type Item = &'a V;
    type IntoIter = Values<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read view over the map's `(key, value)` entries.
pub struct EntriesView<'a, K, V, S> {
    map: &'a CompactHashMap<K, V, S>,
}

impl<'a, K, V, S> EntriesView<'a, K, V, S> {
    pub(crate) fn new(map: &'a CompactHashMap<K, V, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> Iter<'a, K, V> {
        self.map.iter()
    }

    /// Whether the map holds exactly this pair: a key probe plus one
    /// value comparison.
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
        S: BuildHasher,
    {
        self.map.get(key) == Some(value)
    }
}

impl<'a, K, V, S> IntoIterator for EntriesView<'a, K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
