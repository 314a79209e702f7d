#![cfg(test)]

// Property tests for the core table kept inside the crate so they can
// check structural invariants that the public API does not expose:
// probe-chain continuity, slot-count shape, and the load bound.

use core::hash::{BuildHasher, Hash, Hasher};
use std::collections::HashMap;
use std::fmt::Debug;

use proptest::prelude::*;

use crate::map::{need_grow, CompactHashMap};

/// Structural invariants that must hold after every mutation:
/// - the slot count is zero or a power of two;
/// - the size counter equals the number of occupied slots;
/// - the growth-policy bound holds for the current size;
/// - every occupied slot is reachable from its key's natural start by
///   walking occupied slots only (no gap interrupts a live chain).
fn check_invariants<K, V, S>(m: &CompactHashMap<K, V, S>)
where
    K: Eq + Hash + Debug,
    S: BuildHasher,
{
    let n = m.slots.len();
    assert!(n == 0 || n.is_power_of_two());
    let occupied = m.slots.iter().filter(|s| s.is_some()).count();
    assert_eq!(occupied, m.len());
    if n == 0 {
        return;
    }
    assert!(
        !need_grow(n, m.len()),
        "load bound violated: {} entries in {} slots",
        m.len(),
        n
    );
    for (i, slot) in m.slots.iter().enumerate() {
        if let Some((k, _)) = slot {
            let mut j = m.slot_index(k, n);
            let mut steps = 0;
            loop {
                assert!(
                    m.slots[j].is_some(),
                    "probe chain for {k:?} broken at slot {j} before reaching {i}"
                );
                if j == i {
                    break;
                }
                j = (j + 1) & (n - 1);
                steps += 1;
                assert!(steps <= n, "probe chain for {k:?} never reached slot {i}");
            }
        }
    }
}

proptest! {
    /// Replays a random op sequence against `std::collections::HashMap`
    /// and revalidates every structural invariant after each step.
    #[test]
    fn random_ops_preserve_structure(
        ops in proptest::collection::vec((0u8..=4u8, 0u8..24u8, any::<u16>()), 1..200)
    ) {
        let mut m: CompactHashMap<u32, u16> = CompactHashMap::new();
        let mut model: HashMap<u32, u16> = HashMap::new();

        for (op, raw_k, v) in ops {
            let k = raw_k as u32;
            match op {
                // bias toward inserts so tables actually grow
                0 | 1 => prop_assert_eq!(m.insert(k, v), model.insert(k, v)),
                2 => prop_assert_eq!(m.remove(&k), model.remove(&k)),
                3 => prop_assert_eq!(m.get(&k), model.get(&k)),
                4 => prop_assert_eq!(m.contains_key(&k), model.contains_key(&k)),
                _ => unreachable!(),
            }
            check_invariants(&m);
            prop_assert_eq!(m.len(), model.len());
        }

        for (k, v) in &model {
            prop_assert_eq!(m.get(k), Some(v));
        }
        for (k, v) in m.iter() {
            prop_assert_eq!(model.get(k), Some(v));
        }
    }
}

// A hasher that sends every key to the same probe start: the whole map
// degenerates into one chain, the worst case for deletion repair.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    /// Insert/remove churn where every key collides. Chain repair must
    /// keep the single chain contiguous through arbitrary deletions.
    #[test]
    fn degenerate_hasher_single_chain(
        ops in proptest::collection::vec((0u8..=1u8, 0u8..12u8), 1..100)
    ) {
        let mut m: CompactHashMap<u32, u32, ConstBuildHasher> =
            CompactHashMap::with_hasher(ConstBuildHasher);
        let mut model: HashMap<u32, u32> = HashMap::new();

        for (op, raw_k) in ops {
            let k = raw_k as u32;
            match op {
                0 => prop_assert_eq!(m.insert(k, k), model.insert(k, k)),
                1 => prop_assert_eq!(m.remove(&k), model.remove(&k)),
                _ => unreachable!(),
            }
            check_invariants(&m);
        }

        prop_assert_eq!(m.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(m.get(k), Some(v));
        }
    }
}

proptest! {
    /// Draining any map through a cursor removes exactly `len` entries
    /// and leaves a structurally sound empty table.
    #[test]
    fn cursor_drain_empties(
        keys in proptest::collection::btree_set(0u32..1000, 0..64usize)
    ) {
        let mut m: CompactHashMap<u32, u32> = keys.iter().map(|&k| (k, k)).collect();
        let before = m.len();
        let mut removed = 0;
        {
            let mut cur = m.cursor();
            while cur.next().is_some() {
                cur.remove();
                removed += 1;
            }
        }
        prop_assert_eq!(removed, before);
        prop_assert_eq!(m.len(), 0);
        check_invariants(&m);
    }
}
