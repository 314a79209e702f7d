//! compact-hashmap: a single-threaded hash map that stores every entry
//! inline in one flat slot array, for cache-friendly lookups and
//! minimal per-entry overhead.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: the contract of a general-purpose map (insert, lookup,
//!   delete, iteration, bulk copy, structural equality, persistence)
//!   with no allocation beyond the slot array itself.
//! - Storage: one `Box<[Option<(K, V)>]>` whose length is always a
//!   power of two. No per-entry nodes, no stored hash codes, no
//!   tombstones.
//! - Placement: the configured `BuildHasher`'s output is passed
//!   through a multiply-rotate-multiply avalanche mix and masked down
//!   to a slot index; collisions resolve by linear probing.
//! - Deletion: chain repair in place (Knuth 6.4 Algorithm R) slides
//!   displaced entries back over the gap, so probe lengths track the
//!   live load factor, never the deletion history.
//! - Growth: tiered load bounds (tiny tables may fill every slot,
//!   larger tables cap at 2/3 then 4/5 slot occupancy) with doubling
//!   and a full rehash; the array is replaced wholesale, never resized
//!   in place.
//! - Views: `keys()` / `values()` / `entries()` are fresh, uncached
//!   projections over the live table. Removal during iteration goes
//!   through cursors that fork a private copy of the slot array on
//!   first removal (copy-on-write), keeping their traversal stable
//!   while the live table compacts.
//! - Persistence: explicit `Encode`/`Decode` traits writing a count
//!   prefix plus entries in slot order; decoding pre-sizes and replays.
//!
//! Constraints
//! - Single-threaded / externally synchronized: no locks, no atomics;
//!   all operations are synchronous.
//! - Absence is expressed by `Option`, never by a reserved key or
//!   value, so any constructible key/value is storable.
//! - Capacity never shrinks except through `clear`; growing past the
//!   ≈2^29-slot ceiling is fatal.
//! - Mutating the map while iterating it is ruled out by the borrow
//!   checker rather than detected at runtime.

mod coding;
mod cursor;
mod map;
mod map_proptest;
mod view;

// Public surface
pub use coding::{Decode, DecodeError, Encode, EncodeError};
pub use cursor::{Cursor, KeysCursor, ValuesCursor};
pub use map::CompactHashMap;
pub use view::{EntriesView, IntoIter, Iter, IterMut, Keys, KeysView, Values, ValuesView};
