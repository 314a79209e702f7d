//! Removal cursors: iteration that can delete the element it last
//! yielded, while the live table keeps compacting underneath.
//!
//! A cursor walks the map's live slot array until the first `remove`.
//! At that point it clones the array it is walking (copy-on-write
//! fork) and finishes the traversal over that private, frozen
//! snapshot, while the removal itself (and every later one) runs
//! against the live table and triggers normal chain repair there. The
//! snapshot keeps the traversal order consistent no matter how repair
//! relocates surviving entries.
//!
//! Cursors borrow the map mutably, so no other access can interleave
//! with them; the borrow checker enforces what the contract elsewhere
//! could only document.

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::map::{CompactHashMap, Slot};

/// Shared walking/removal state behind every cursor projection.
struct RawCursor<'a, K, V, S> {
    map: &'a mut CompactHashMap<K, V, S>,
    /// Private frozen copy of the slot array, once the first removal
    /// has forked the traversal off the live table.
    snapshot: Option<Box<[Slot<K, V>]>>,
    /// Next slot index to examine.
    pos: usize,
    /// Slot index of the last yielded element, while it is removable.
    last: Option<usize>,
}

impl<'a, K, V, S> RawCursor<'a, K, V, S> {
    fn new(map: &'a mut CompactHashMap<K, V, S>) -> Self {
        Self {
            map,
            snapshot: None,
            pos: 0,
            last: None,
        }
    }

    /// Advances to the next occupied slot of the walked array and
    /// marks it removable. `None` once exhausted.
    fn advance(&mut self) -> Option<usize> {
        loop {
            let i = self.pos;
            let occupied = {
                let slots: &[Slot<K, V>] = match &self.snapshot {
                    Some(snap) => snap,
                    None => &self.map.slots,
                };
                if i >= slots.len() {
                    self.last = None;
                    return None;
                }
                slots[i].is_some()
            };
            self.pos = i + 1;
            if occupied {
                self.last = Some(i);
                return Some(i);
            }
        }
    }

    fn slot(&self, i: usize) -> &Slot<K, V> {
        match &self.snapshot {
            Some(snap) => &snap[i],
            None => &self.map.slots[i],
        }
    }

    /// Removes the last yielded element from the live map, forking the
    /// traversal onto a private snapshot first if that has not
    /// happened yet.
    ///
    /// Panics unless a `next` immediately precedes it: before the
    /// first `next`, twice per element, or after exhaustion is a
    /// caller bug.
    fn remove_last(&mut self)
    where
        K: Eq + Hash + Clone,
        V: Clone,
        S: BuildHasher,
    {
        let i = self
            .last
            .take()
            .expect("cursor remove: no just-yielded element to remove");
        if self.snapshot.is_none() {
            self.snapshot = Some(self.map.slots.clone());
        }
        let RawCursor { map, snapshot, .. } = self;
        if let Some(snap) = snapshot {
            if let Some((key, _)) = &snap[i] {
                map.remove(key);
            }
        }
    }
}

/// Entry cursor: yields `(&K, &V)` pairs and removes on demand.
///
/// Obtained from [`CompactHashMap::cursor`]. `next` is lending (each
/// item borrows from the cursor), so it is driven with `while let`
/// rather than a `for` loop.
pub struct Cursor<'a, K, V, S = RandomState> {
    raw: RawCursor<'a, K, V, S>,
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    pub(crate) fn new(map: &'a mut CompactHashMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(map),
        }
    }

    pub fn next(&mut self) -> Option<(&K, &V)> {
        let i = self.raw.advance()?;
        self.raw.slot(i).as_ref().map(|(k, v)| (k, v))
    }

    /// Removes the entry the last `next` yielded from the live map.
    ///
    /// # Panics
    ///
    /// Panics when no just-yielded element is pending: before the
    /// first `next`, twice without an intervening `next`, or after the
    /// cursor is exhausted.
    pub fn remove(&mut self)
    where
        K: Eq + Hash + Clone,
        V: Clone,
        S: BuildHasher,
    {
        self.raw.remove_last();
    }
}

/// Key projection of [`Cursor`], from [`CompactHashMap::keys_cursor`].
pub struct KeysCursor<'a, K, V, S = RandomState> {
    raw: RawCursor<'a, K, V, S>,
}

impl<'a, K, V, S> KeysCursor<'a, K, V, S> {
    pub(crate) fn new(map: &'a mut CompactHashMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(map),
        }
    }

    pub fn next(&mut self) -> Option<&K> {
        let i = self.raw.advance()?;
        self.raw.slot(i).as_ref().map(|(k, _)| k)
    }

    /// Removes the entry whose key the last `next` yielded.
    ///
    /// # Panics
    ///
    /// Same misuse conditions as [`Cursor::remove`].
    pub fn remove(&mut self)
    where
        K: Eq + Hash + Clone,
        V: Clone,
        S: BuildHasher,
    {
        self.raw.remove_last();
    }
}

/// Value projection of [`Cursor`], from
/// [`CompactHashMap::values_cursor`].
pub struct ValuesCursor<'a, K, V, S = RandomState> {
    raw: RawCursor<'a, K, V, S>,
}

impl<'a, K, V, S> ValuesCursor<'a, K, V, S> {
    pub(crate) fn new(map: &'a mut CompactHashMap<K, V, S>) -> Self {
        Self {
            raw: RawCursor::new(map),
        }
    }

    pub fn next(&mut self) -> Option<&V> {
        let i = self.raw.advance()?;
        self.raw.slot(i).as_ref().map(|(_, v)| v)
    }

    /// Removes the entry whose value the last `next` yielded.
    ///
    /// # Panics
    ///
    /// Same misuse conditions as [`Cursor::remove`].
    pub fn remove(&mut self)
    where
        K: Eq + Hash + Clone,
        V: Clone,
        S: BuildHasher,
    {
        self.raw.remove_last();
    }
}

#[cfg(test)]
mod tests {
    use crate::CompactHashMap;

    fn sample(n: u32) -> CompactHashMap<u32, String> {
        let mut m = CompactHashMap::new();
        for k in 0..n {
            m.insert(k, format!("v{k}"));
        }
        m
    }

    /// Invariant: the first removal forks the traversal; the remaining
    /// walk matches the pre-removal slot order exactly, even though
    /// chain repair is free to relocate entries in the live table.
    #[test]
    fn fork_freezes_traversal_order() {
        let mut m = sample(12);
        let before: Vec<(u32, String)> =
            m.iter().map(|(k, v)| (*k, v.clone())).collect();

        let mut cur = m.cursor();
        let first = cur.next().map(|(k, v)| (*k, v.clone())).unwrap();
        assert_eq!(first, before[0]);
        cur.remove();

        let mut rest = Vec::new();
        while let Some((k, v)) = cur.next() {
            rest.push((*k, v.clone()));
        }
        assert_eq!(rest, before[1..].to_vec());

        assert_eq!(m.len(), 11);
        assert!(!m.contains_key(&first.0));
    }

    /// Invariant: draining every entry through a cursor empties the
    /// map, and the number of removals equals the starting size.
    #[test]
    fn drain_empties_map() {
        let mut m = sample(100);
        let mut removed = 0;
        {
            let mut cur = m.cursor();
            while cur.next().is_some() {
                cur.remove();
                removed += 1;
            }
        }
        assert_eq!(removed, 100);
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
    }

    /// Invariant: selective removal through a cursor keeps untouched
    /// entries intact in the live map.
    #[test]
    fn selective_removal() {
        let mut m = sample(20);
        {
            let mut cur = m.cursor();
            while let Some((k, _)) = cur.next() {
                if k % 2 == 0 {
                    cur.remove();
                }
            }
        }
        assert_eq!(m.len(), 10);
        for k in 0..20 {
            assert_eq!(m.contains_key(&k), k % 2 == 1);
        }
    }

    /// Invariant: key and value cursors project the same traversal and
    /// both support removal.
    #[test]
    fn key_and_value_cursors() {
        let mut m = sample(6);
        {
            let mut cur = m.keys_cursor();
            while let Some(k) = cur.next() {
                if *k == 3 {
                    cur.remove();
                }
            }
        }
        assert!(!m.contains_key(&3));

        let mut seen = 0;
        {
            let mut cur = m.values_cursor();
            while let Some(v) = cur.next() {
                assert!(v.starts_with('v'));
                seen += 1;
            }
        }
        assert_eq!(seen, 5);
    }

    /// Invariant: a cursor over an empty map is immediately exhausted.
    #[test]
    fn empty_map_cursor() {
        let mut m: CompactHashMap<u32, String> = CompactHashMap::new();
        assert!(m.cursor().next().is_none());
    }

    #[test]
    #[should_panic(expected = "no just-yielded element")]
    fn remove_before_next_panics() {
        let mut m = sample(3);
        let mut cur = m.cursor();
        cur.remove();
    }

    #[test]
    #[should_panic(expected = "no just-yielded element")]
    fn double_remove_panics() {
        let mut m = sample(3);
        let mut cur = m.cursor();
        cur.next();
        cur.remove();
        cur.remove();
    }

    #[test]
    #[should_panic(expected = "no just-yielded element")]
    fn remove_after_exhaustion_panics() {
        let mut m = sample(2);
        let mut cur = m.cursor();
        while cur.next().is_some() {}
        cur.remove();
    }
}
