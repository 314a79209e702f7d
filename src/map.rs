//! Core table: flat slot storage, probing, deletion repair, growth.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash, Hasher};
use core::mem;
use std::collections::hash_map::{DefaultHasher, RandomState};
use std::fmt;

use log::trace;

use crate::cursor::{Cursor, KeysCursor, ValuesCursor};
use crate::view::{EntriesView, Iter, IterMut, KeysView, ValuesView};

/// One slot of the backing array: either empty or an owned entry.
/// The tagged option replaces a privileged in-band sentinel, so any
/// key/value the caller can construct is storable.
pub(crate) type Slot<K, V> = Option<(K, V)>;

/// Hard ceiling on the slot count (≈2^29 entries). Needing to grow past
/// this is fatal.
pub(crate) const MAX_SLOTS: usize = 1 << 29;

// MurmurHash3 x64 mixing constants.
const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// Multiply-rotate-multiply avalanche mix. Spreads low-entropy hasher
/// output across bits before masking down to a slot index. Bijective on
/// `u64`, so distinct hashes stay distinct.
#[inline]
pub(crate) fn smear(hash: u64) -> u64 {
    C2.wrapping_mul(hash.wrapping_mul(C1).rotate_left(15))
}

/// Tiered load-factor check: may the table hold `size` entries in
/// `slots` slots without growing? Tiny tables run dense (up to every
/// slot occupied), large tables keep probe chains short.
#[inline]
pub(crate) fn need_grow(slots: usize, size: usize) -> bool {
    if slots <= 16 {
        return slots < size;
    }
    if slots <= 64 {
        return 2 * slots < 3 * size;
    }
    2 * slots < 2 * size + (size >> 1)
}

/// A memory-compact hash map.
///
/// All entries live inline in one flat array of `Option<(K, V)>` slots;
/// collisions resolve by linear probing and deletions repair the probe
/// chain in place (Knuth 6.4 Algorithm R), so there are no per-entry
/// nodes, no stored hash codes, and no tombstones. Single-threaded by
/// contract: nothing is synchronized internally.
///
/// Growth replaces the array wholesale and rehashes every entry; the
/// slot count is always a power of two and never shrinks except through
/// [`clear`](CompactHashMap::clear).
#[derive(Clone)]
pub struct CompactHashMap<K, V, S = RandomState> {
    hasher: S,
    pub(crate) slots: Box<[Slot<K, V>]>,
    pub(crate) len: usize,
}

impl<K, V> CompactHashMap<K, V> {
    /// Creates an empty map. No allocation happens until the first
    /// insertion.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, S: Default> Default for CompactHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> CompactHashMap<K, V, S> {
    /// Creates an empty map that will use `hasher` to hash keys.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            slots: Box::default(),
            len: 0,
        }
    }

    /// Number of entries in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the backing array counted in key/value cells: two per
    /// slot, so always an even power-of-two multiple of 2 (or 0 before
    /// the first insertion). `2 * len() <= capacity()` always holds.
    pub fn capacity(&self) -> usize {
        2 * self.slots.len()
    }

    /// Drops every entry and releases the backing array. This is the
    /// only operation that shrinks capacity.
    pub fn clear(&mut self) {
        if !self.slots.is_empty() {
            trace!("clearing table ({} entries, {} slots)", self.len, self.slots.len());
        }
        self.slots = Box::default();
        self.len = 0;
    }

    /// Iterator over `(&K, &V)` entries in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.slots)
    }

    /// Iterator over `(&K, &mut V)` entries in slot order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.slots)
    }

    /// A fresh key view. Views are never cached on the map.
    pub fn keys(&self) -> KeysView<'_, K, V, S> {
        KeysView::new(self)
    }

    /// A fresh value view.
    pub fn values(&self) -> ValuesView<'_, K, V, S> {
        ValuesView::new(self)
    }

    /// A fresh entry view.
    pub fn entries(&self) -> EntriesView<'_, K, V, S> {
        EntriesView::new(self)
    }

    /// An entry cursor supporting removal of the element it last
    /// yielded. See [`Cursor`].
    pub fn cursor(&mut self) -> Cursor<'_, K, V, S> {
        Cursor::new(self)
    }

    /// A key cursor supporting removal. See [`Cursor`].
    pub fn keys_cursor(&mut self) -> KeysCursor<'_, K, V, S> {
        KeysCursor::new(self)
    }

    /// A value cursor supporting removal. See [`Cursor`].
    pub fn values_cursor(&mut self) -> ValuesCursor<'_, K, V, S> {
        ValuesCursor::new(self)
    }
}

impl<K, V, S> CompactHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Slot index a key naturally starts probing from, for a table of
    /// `slots` slots. Pure in (key hash, slot count).
    #[inline]
    pub(crate) fn slot_index<Q>(&self, key: &Q, slots: usize) -> usize
    where
        Q: ?Sized + Hash,
    {
        debug_assert!(slots.is_power_of_two());
        (smear(self.hasher.hash_one(key)) as usize) & (slots - 1)
    }

    /// Linear probe for `key`: index of its slot, or `None` once an
    /// empty slot proves absence. The return-to-start stop terminates
    /// absent-key probes on a completely full small-tier table.
    fn probe<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let n = self.slots.len();
        if n == 0 {
            return None;
        }
        let start = self.slot_index(key, n);
        let mut i = start;
        loop {
            match &self.slots[i] {
                Some((k, _)) if k.borrow() == key => return Some(i),
                None => return None,
                Some(_) => {
                    i = (i + 1) & (n - 1);
                    if i == start {
                        return None;
                    }
                }
            }
        }
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.probe(key)?;
        self.slots[i].as_ref().map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value stored for `key`.
    /// Values may be rewritten in place through it; the key and the
    /// table structure stay fixed for the borrow's duration.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.probe(key)?;
        self.slots[i].as_mut().map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.probe(key).is_some()
    }

    /// Whether any entry stores `value`. Linear scan over occupied
    /// slots, O(capacity).
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Inserts the pair, returning the previous value if the key was
    /// already present.
    ///
    /// The first insertion into an empty map allocates a minimal
    /// single-slot array directly. Otherwise the probe runs first: an
    /// existing key is overwritten in place with no growth check; a new
    /// key consults the growth policy before the write, and any growth
    /// restarts the whole probe against the new array.
    ///
    /// # Panics
    ///
    /// Panics if the table cannot grow past its slot ceiling
    /// (≈2^29 entries) while growth is still required.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.slots.is_empty() {
            self.slots = Box::new([Some((key, value))]);
            self.len = 1;
            return None;
        }
        loop {
            let n = self.slots.len();
            let start = self.slot_index(&key, n);
            let mut i = start;
            let free = loop {
                match &mut self.slots[i] {
                    Some((k, v)) if *k == key => return Some(mem::replace(v, value)),
                    None => break i,
                    Some(_) => {
                        i = (i + 1) & (n - 1);
                        if i == start {
                            // table completely full; growth below fires
                            break i;
                        }
                    }
                }
            };
            let grown = self.len + 1;
            if need_grow(n, grown) {
                self.grow_for(grown);
                continue;
            }
            debug_assert!(self.slots[free].is_none());
            self.slots[free] = Some((key, value));
            self.len = grown;
            return None;
        }
    }

    /// Removes `key`, returning its value. Probes like a lookup, then
    /// repairs the probe chain in place so no tombstone is left behind.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.probe(key)?;
        let removed = self.slots[i].take().map(|(_, v)| v);
        self.len -= 1;
        self.close_gap(i);
        removed
    }

    /// Knuth 6.4 Algorithm R: walk forward from the vacated slot and
    /// slide back every entry whose own chain passes through the gap,
    /// until the first empty slot ends the chain. Keeps every surviving
    /// key reachable from its natural start without tombstones.
    fn close_gap(&mut self, mut gap: usize) {
        let n = self.slots.len();
        let mut i = (gap + 1) & (n - 1);
        loop {
            let home = match &self.slots[i] {
                Some((k, _)) => self.slot_index(k, n),
                None => return,
            };
            // Does the chain from `home` reach `i` only via `gap`?
            let displaced = if i < home {
                home <= gap || gap <= i
            } else {
                home <= gap && gap <= i
            };
            if displaced {
                self.slots[gap] = self.slots[i].take();
                gap = i;
            }
            i = (i + 1) & (n - 1);
        }
    }

    /// Doubles the slot count until `size` entries clear the growth
    /// bound, then rehashes every entry into the new array.
    fn grow_for(&mut self, size: usize) {
        let mut target = self.slots.len();
        while need_grow(target, size) {
            assert!(
                target < MAX_SLOTS,
                "capacity exhausted: cannot grow past {MAX_SLOTS} slots"
            );
            target <<= 1;
        }
        self.rehash_into(target);
    }

    /// Pre-sizes for `count` entries ahead of a bulk insert, matching
    /// what incremental growth would settle on.
    pub(crate) fn presize_for(&mut self, count: usize) {
        self.rehash_into(count.next_power_of_two().min(MAX_SLOTS));
    }

    /// Replaces the backing array with one of `new_slots` slots and
    /// re-places every entry. No-op if the table is already that large.
    fn rehash_into(&mut self, new_slots: usize) {
        if new_slots <= self.slots.len() {
            return;
        }
        trace!(
            "growing table from {} to {} slots ({} entries)",
            self.slots.len(),
            new_slots,
            self.len
        );
        let old = mem::take(&mut self.slots);
        let mut slots: Box<[Slot<K, V>]> =
            std::iter::repeat_with(|| None).take(new_slots).collect();
        for slot in old.into_vec() {
            if let Some((k, v)) = slot {
                let mut i = self.slot_index(&k, new_slots);
                while slots[i].is_some() {
                    i = (i + 1) & (new_slots - 1);
                }
                slots[i] = Some((k, v));
            }
        }
        self.slots = slots;
    }

    /// Merges every entry of `source` into `self`, overwriting values
    /// for keys already present.
    ///
    /// When `self` is empty and `source` is more than half full, the
    /// source's slot array (and hasher, which its layout depends on) is
    /// cloned wholesale, inheriting its capacity; the end state is
    /// identical to the per-entry loop. An empty destination is
    /// otherwise pre-sized from `source.len()` before the loop.
    pub fn merge_from(&mut self, source: &Self)
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        if self.slots.is_empty() && source.len > 2 {
            if source.slots.len() < 2 * source.len {
                trace!(
                    "bulk copy: cloning source array ({} entries, {} slots)",
                    source.len,
                    source.slots.len()
                );
                self.slots = source.slots.clone();
                self.hasher = source.hasher.clone();
                self.len = source.len;
                return;
            }
            self.presize_for(source.len);
        }
        for (k, v) in source.iter() {
            self.insert(k.clone(), v.clone());
        }
    }

    /// Order-independent hash of the whole structure: the wrapping sum
    /// over occupied slots of `hash(key) ^ hash(value)`, computed with
    /// a fixed-key hasher so the result does not depend on this map's
    /// seeded hasher, its capacity, or its deletion history. Equal maps
    /// always agree.
    pub fn structural_hash(&self) -> u64
    where
        K: Hash,
        V: Hash,
    {
        fn fixed_hash<T: ?Sized + Hash>(t: &T) -> u64 {
            let mut h = DefaultHasher::new();
            t.hash(&mut h);
            h.finish()
        }
        let mut acc: u64 = 0;
        for (k, v) in self.iter() {
            acc = acc.wrapping_add(fixed_hash(k) ^ fixed_hash(v));
        }
        acc
    }

    /// Index of the first slot where the two (equal-length) arrays
    /// disagree on an occupied entry, or the slot count if none does.
    /// Lets `==` skip the prefix two same-layout maps share.
    fn first_mismatch(&self, other: &Self) -> usize
    where
        V: PartialEq,
    {
        debug_assert_eq!(self.slots.len(), other.slots.len());
        for (i, (a, b)) in self.slots.iter().zip(other.slots.iter()).enumerate() {
            match (a, b) {
                (None, _) => {}
                (Some((k, v)), Some((ok, ov))) if k == ok && v == ov => {}
                _ => return i,
            }
        }
        self.slots.len()
    }
}

impl<K, V, S> PartialEq for CompactHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Structural, order-independent equality: same entry count and,
    /// for every key in one map, an equal value in the other. Two maps
    /// with identical slot layout short-circuit on the shared prefix.
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        let start = if self.slots.len() == other.slots.len() {
            self.first_mismatch(other)
        } else {
            0
        };
        for slot in &self.slots[start..] {
            if let Some((k, v)) = slot {
                if other.get(k) != Some(v) {
                    return false;
                }
            }
        }
        true
    }
}

impl<K, V, S> Eq for CompactHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Hash for CompactHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Hash,
    S: BuildHasher,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl<K, V, S> fmt::Debug for CompactHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for CompactHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let (hint, _) = iter.size_hint();
        if self.slots.is_empty() && hint > 2 {
            self.presize_for(hint);
        }
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for CompactHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}
