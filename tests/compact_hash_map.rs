// CompactHashMap unit test suite (consolidated).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Contract: after insert(k, v), get(k) == v until k is removed or
//   overwritten; insert/remove return the previous value.
// - Shape: capacity is an even power-of-two multiple of 2, bounds
//   2 * len, and never decreases except through clear().
// - Deletion: chain repair keeps every surviving key reachable; no
//   tombstones means probe cost tracks live load only.
// - Cursors: removal-through-iteration forks a frozen snapshot and
//   delegates removal to the live table.
// - Bulk copy and persistence reproduce structural equality.
use compact_hashmap::{CompactHashMap, Decode, Encode};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

// Forces every key onto a single probe chain.
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

// Test: basic contract of insert/get/remove.
// Assumes: absence is Option::None; present values returned by ref.
// Verifies: values stay retrievable until overwritten or removed.
#[test]
fn insert_get_remove_contract() {
    let mut m: CompactHashMap<String, u64> = CompactHashMap::new();
    assert!(m.is_empty());
    assert_eq!(m.get("a"), None);

    assert_eq!(m.insert("a".to_string(), 1), None);
    assert_eq!(m.insert("b".to_string(), 2), None);
    assert_eq!(m.get("a"), Some(&1));
    assert_eq!(m.get("b"), Some(&2));
    assert_eq!(m.len(), 2);

    assert_eq!(m.insert("a".to_string(), 10), Some(1));
    assert_eq!(m.get("a"), Some(&10));
    assert_eq!(m.len(), 2);

    assert_eq!(m.remove("a"), Some(10));
    assert_eq!(m.get("a"), None);
    assert_eq!(m.remove("a"), None);
    assert_eq!(m.len(), 1);
}

// Test: size accounting over N distinct inserts.
// Verifies: size() == N with no intervening removals.
#[test]
fn n_distinct_inserts_give_size_n() {
    let mut m: CompactHashMap<u64, u64> = CompactHashMap::new();
    for i in 0..1000 {
        m.insert(i * 7, i);
    }
    assert_eq!(m.len(), 1000);
}

// Test: the 997-squares scenario.
// Verifies: inserting (i*i, str(i)) for i in [0, 997) keeps every key
// retrievable, the max key present, and removing all 997 returns each
// value and empties the map.
#[test]
fn squares_997_scenario() {
    let mut m: CompactHashMap<u64, String> = CompactHashMap::new();
    for i in 0..997u64 {
        m.insert(i * i, i.to_string());
    }
    assert_eq!(m.len(), 997);
    assert_eq!(m.get(&(996 * 996)), Some(&"996".to_string()));

    for i in 0..997u64 {
        assert_eq!(m.remove(&(i * i)), Some(i.to_string()), "key {}", i * i);
    }
    assert_eq!(m.len(), 0);
}

// Test: three colliding keys, middle one removed.
// Assumes: the constant hasher puts all keys on one probe chain.
// Verifies: chain repair keeps the outer two reachable via get.
#[test]
fn colliding_trio_survives_middle_removal() {
    let mut m: CompactHashMap<u32, &str, ConstBuildHasher> =
        CompactHashMap::with_hasher(ConstBuildHasher);
    m.insert(1, "first");
    m.insert(2, "second");
    m.insert(3, "third");

    assert_eq!(m.remove(&2), Some("second"));
    assert_eq!(m.get(&1), Some(&"first"));
    assert_eq!(m.get(&3), Some(&"third"));
    assert_eq!(m.len(), 2);
}

// Test: structural shape invariants across growth.
// Verifies: capacity is even, a power-of-two multiple of 2, bounds
// 2 * len, and only clear() ever shrinks it.
#[test]
fn capacity_shape_and_monotonicity() {
    let mut m: CompactHashMap<u64, u64> = CompactHashMap::new();
    assert_eq!(m.capacity(), 0);
    let mut max_cap = 0;
    for i in 0..2000u64 {
        m.insert(i, i);
        let cap = m.capacity();
        assert_eq!(cap % 2, 0);
        assert!((cap / 2).is_power_of_two());
        assert!(2 * m.len() <= cap);
        assert!(cap >= max_cap);
        max_cap = cap;
    }
    for i in 0..2000u64 {
        m.remove(&i);
    }
    assert_eq!(m.capacity(), max_cap, "removal must not shrink");
    m.clear();
    assert_eq!(m.capacity(), 0);
    assert_eq!(m.len(), 0);
}

// Test: merge_from a populated same-kind source into an empty map.
// Verifies: destination equals source both via == and independent
// per-key lookups.
#[test]
fn merge_from_empty_destination() {
    let mut src: CompactHashMap<u32, String> = CompactHashMap::new();
    for k in 0..40 {
        src.insert(k, format!("v{k}"));
    }
    let mut dst: CompactHashMap<u32, String> = CompactHashMap::new();
    dst.merge_from(&src);

    assert_eq!(dst, src);
    assert_eq!(dst.len(), 40);
    for k in 0..40 {
        assert_eq!(dst.get(&k), src.get(&k));
    }
}

// Test: merge_from with overlap favors the source's values.
#[test]
fn merge_from_overwrites_overlap() {
    let mut dst: CompactHashMap<u32, u32> = CompactHashMap::new();
    for k in 0..10 {
        dst.insert(k, 0);
    }
    let mut src: CompactHashMap<u32, u32> = CompactHashMap::new();
    for k in 5..15 {
        src.insert(k, 1);
    }
    dst.merge_from(&src);
    assert_eq!(dst.len(), 15);
    for k in 0..5 {
        assert_eq!(dst.get(&k), Some(&0));
    }
    for k in 5..15 {
        assert_eq!(dst.get(&k), Some(&1));
    }
}

// Test: structural equality and hash are order- and layout-independent.
// Assumes: two maps can reach the same content along different
// insert/remove histories and capacities.
#[test]
fn structural_equality_ignores_history() {
    let mut a: CompactHashMap<u32, u32> = CompactHashMap::new();
    for k in 0..50 {
        a.insert(k, k);
    }

    let mut b: CompactHashMap<u32, u32> = CompactHashMap::new();
    for k in (0..200).rev() {
        b.insert(k, k);
    }
    for k in 50..200 {
        b.remove(&k);
    }

    assert_eq!(a, b);
    assert_eq!(a.structural_hash(), b.structural_hash());

    b.remove(&49);
    assert_ne!(a, b);
    b.insert(49, 999);
    assert_ne!(a, b);
}

// Test: equality across differently-seeded hashers.
// Assumes: RandomState seeds differ per instance, so slot layouts
// almost surely differ.
#[test]
fn equality_across_hasher_seeds() {
    let mut a: CompactHashMap<String, u32, RandomState> =
        CompactHashMap::with_hasher(RandomState::new());
    let mut b: CompactHashMap<String, u32, RandomState> =
        CompactHashMap::with_hasher(RandomState::new());
    for k in 0..64 {
        a.insert(format!("key-{k}"), k);
        b.insert(format!("key-{k}"), k);
    }
    assert_eq!(a, b);
    assert_eq!(a.structural_hash(), b.structural_hash());
}

// Test: views expose size, membership, and iteration; value lookup is
// by scan.
#[test]
fn views_cover_projections() {
    let mut m: CompactHashMap<u32, String> = CompactHashMap::new();
    for k in 0..6 {
        m.insert(k, format!("v{k}"));
    }
    assert_eq!(m.keys().len(), 6);
    assert!(m.keys().contains(&3));
    assert!(!m.keys().contains(&9));
    assert!(m.values().contains(&"v4".to_string()));
    assert!(!m.values().contains(&"nope".to_string()));
    assert!(m.entries().contains(&5, &"v5".to_string()));
    assert!(!m.entries().contains(&5, &"v0".to_string()));

    let mut keys: Vec<u32> = m.keys().into_iter().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, (0..6).collect::<Vec<_>>());
}

// Test: draining every entry through a cursor empties the map.
// Verifies: removal count equals the pre-drain size; a second cursor
// sees nothing.
#[test]
fn cursor_drain() {
    let mut m: CompactHashMap<u64, u64> = CompactHashMap::new();
    for i in 0..257u64 {
        m.insert(i, i);
    }
    let before = m.len();
    let mut removals = 0;
    {
        let mut cur = m.cursor();
        while cur.next().is_some() {
            cur.remove();
            removals += 1;
        }
    }
    assert_eq!(removals, before);
    assert!(m.is_empty());
    assert!(m.cursor().next().is_none());
}

// Test: a forked cursor keeps yielding the pre-removal traversal while
// the live map compacts under it.
#[test]
fn cursor_fork_is_stable() {
    let mut m: CompactHashMap<u32, u32, ConstBuildHasher> =
        CompactHashMap::with_hasher(ConstBuildHasher);
    for k in 0..8 {
        m.insert(k, k);
    }
    let order: Vec<u32> = m.iter().map(|(k, _)| *k).collect();

    let mut seen = Vec::new();
    {
        let mut cur = m.cursor();
        let (k, _) = cur.next().unwrap();
        seen.push(*k);
        // removing the chain head relocates every later entry in the
        // live table, but must not disturb this traversal
        cur.remove();
        while let Some((k, _)) = cur.next() {
            seen.push(*k);
        }
    }
    assert_eq!(seen, order);
    assert_eq!(m.len(), 7);
    assert!(!m.contains_key(&order[0]));
    for k in &order[1..] {
        assert!(m.contains_key(k));
    }
}

// Test: persistence round trip after a messy history.
// Verifies: decode(encode(m)) is structurally equal even though the
// layout may differ; the count prefix matches len().
#[test]
fn persistence_round_trip() {
    let mut m: CompactHashMap<u64, String> = CompactHashMap::new();
    for i in 0..300u64 {
        m.insert(i, format!("payload-{i}"));
    }
    for i in (0..300u64).step_by(7) {
        m.remove(&i);
    }

    let bytes = m.encode_into_vec();
    assert_eq!(&bytes[..8], &(m.len() as u64).to_be_bytes());

    let back: CompactHashMap<u64, String> =
        CompactHashMap::decode_from(&mut std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(back, m);
    for (k, v) in m.iter() {
        assert_eq!(back.get(k), Some(v));
    }
}

// Test: whole-map clone is independent of the original.
#[test]
fn clone_independence() {
    let mut m: CompactHashMap<u32, u32> = CompactHashMap::new();
    for k in 0..20 {
        m.insert(k, k);
    }
    let snap = m.clone();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(snap.len(), 20);
    assert_eq!(snap.get(&19), Some(&19));
}

// Test: iteration yields exactly the live entries, in some order,
// each once.
#[test]
fn iteration_yields_each_entry_once() {
    let mut m: CompactHashMap<u32, u32> = CompactHashMap::new();
    for k in 0..100 {
        m.insert(k, k + 1000);
    }
    for k in (0..100).step_by(2) {
        m.remove(&k);
    }
    let mut seen: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    seen.sort_unstable();
    let expected: Vec<u32> = (0..100).filter(|k| k % 2 == 1).collect();
    assert_eq!(seen, expected);
    for (k, v) in &m {
        assert_eq!(*v, k + 1000);
    }
}
