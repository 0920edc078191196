//! HashTable: string-keyed separate chaining with an insertion-order log.

use crate::entry_log::{self, EntryLog};
use crate::error::TableError;
use crate::link::{self, Chain, Link, Slot};
use core::fmt;
use core::mem;
use log::{debug, trace};
use std::rc::Rc;

/// Bucket count of a new or cleared table.
pub const DEFAULT_CAPACITY: usize = 16;

/// Fraction of the capacity that may be occupied before the table doubles.
pub const LOAD_FACTOR: f64 = 0.75;

const HASH_MULTIPLIER: u64 = 31;

/// Polynomial rolling hash over the UTF-16 code units of `key`, reduced
/// modulo `capacity` at every step. Always lands in `[0, capacity)`.
pub(crate) fn hash_key(key: &str, capacity: usize) -> usize {
    let modulus = capacity as u64;
    key.encode_utf16().fold(0u64, |code, unit| {
        (HASH_MULTIPLIER * code + u64::from(unit)) % modulus
    }) as usize
}

fn empty_buckets<V>(capacity: usize) -> Vec<Slot<V>> {
    core::iter::repeat_with(|| None).take(capacity).collect()
}

/// Outcome of walking one bucket's chain for a key.
enum Probe<'a, V> {
    /// The bucket holds no chain.
    Empty,
    /// The chain has `len` links and none matches; the tail is link `len - 1`.
    NotFound { len: usize },
    /// `link` matches at position `depth`; its parent is link `depth - 1`, or
    /// the bucket slot when `depth == 0`.
    Found { depth: usize, link: &'a Link<V> },
}

/// A hash table from string keys to `V`.
///
/// Each bucket owns a singly linked chain of links. The table starts with
/// [`DEFAULT_CAPACITY`] buckets and doubles once the number of entries
/// reaches `capacity * LOAD_FACTOR`; it never shrinks except through
/// [`clear`](HashTable::clear). Enumeration follows first-insertion order,
/// independent of bucket layout.
///
/// Keyed operations return `Err(TableError::IndexOutOfRange)` only if the
/// hash ever escapes the bucket array, which a consistent table never does.
pub struct HashTable<V> {
    capacity: usize,
    len: usize,
    buckets: Vec<Slot<V>>,
    log: EntryLog,
}

impl<V> HashTable<V> {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            len: 0,
            buckets: empty_buckets(DEFAULT_CAPACITY),
            log: EntryLog::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn threshold(&self) -> usize {
        (self.capacity as f64 * LOAD_FACTOR) as usize
    }

    fn hash(&self, key: &str) -> usize {
        hash_key(key, self.capacity)
    }

    fn bucket_index(&self, key: &str) -> Result<usize, TableError> {
        let index = self.hash(key);
        if index >= self.buckets.len() {
            return Err(TableError::IndexOutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        Ok(index)
    }

    fn probe(&self, index: usize, key: &str) -> Probe<'_, V> {
        let Some(slot @ Some(_)) = self.buckets.get(index) else {
            return Probe::Empty;
        };
        let mut len = 0;
        for (depth, link) in Chain::new(slot).enumerate() {
            if &*link.key == key {
                return Probe::Found { depth, link };
            }
            len = depth + 1;
        }
        Probe::NotFound { len }
    }

    // Infallible lookup for enumeration; an out-of-range index reads as absent.
    fn find(&self, key: &str) -> Option<&Link<V>> {
        let index = self.bucket_index(key).ok()?;
        match self.probe(index, key) {
            Probe::Found { link, .. } => Some(link),
            Probe::Empty | Probe::NotFound { .. } => None,
        }
    }

    /// Insert `value` under `key`, or overwrite the value already stored
    /// there. Returns the displaced value on overwrite. An overwritten key
    /// keeps its position in the enumeration order.
    pub fn insert(&mut self, key: &str, value: V) -> Result<Option<V>, TableError> {
        if self.len >= self.threshold() {
            self.grow()?;
        }

        let index = self.bucket_index(key)?;
        let depth = match self.probe(index, key) {
            Probe::Found { depth, .. } => {
                trace!("overwrite {:?} in bucket {} at depth {}", key, index, depth);
                let link = link::slot_at(&mut self.buckets[index], depth).as_deref_mut();
                return Ok(link.map(|link| mem::replace(&mut link.value, value)));
            }
            Probe::Empty => 0,
            Probe::NotFound { len } => len,
        };

        let key: Rc<str> = Rc::from(key);
        let entry = self.log.push_back(key.clone());
        trace!("insert {:?} into bucket {} at depth {}", key, index, depth);
        *link::slot_at(&mut self.buckets[index], depth) = Some(Link::new(key, value, entry));
        self.len += 1;
        Ok(None)
    }

    // Double the bucket array and relink every chain node under the new
    // capacity. Nodes are moved, not reallocated, and the entry log is left
    // alone so enumeration order survives.
    fn grow(&mut self) -> Result<(), TableError> {
        let old_capacity = self.capacity;
        self.capacity *= 2;
        let old = mem::replace(&mut self.buckets, empty_buckets(self.capacity));

        for mut chain in old {
            while let Some(mut link) = chain {
                chain = link.next.take();
                let index = self.bucket_index(&link.key)?;
                *link::tail_slot(&mut self.buckets[index]) = Some(link);
            }
        }

        debug!(
            "grew table from {} to {} buckets with {} entries",
            old_capacity, self.capacity, self.len
        );
        Ok(())
    }

    /// The value stored under `key`, or `None` when the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<&V>, TableError> {
        let index = self.bucket_index(key)?;
        Ok(match self.probe(index, key) {
            Probe::Found { link, .. } => Some(&link.value),
            Probe::Empty | Probe::NotFound { .. } => None,
        })
    }

    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut V>, TableError> {
        let index = self.bucket_index(key)?;
        let depth = match self.probe(index, key) {
            Probe::Found { depth, .. } => depth,
            Probe::Empty | Probe::NotFound { .. } => return Ok(None),
        };
        Ok(link::slot_at(&mut self.buckets[index], depth)
            .as_deref_mut()
            .map(|link| &mut link.value))
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, TableError> {
        let index = self.bucket_index(key)?;
        Ok(matches!(self.probe(index, key), Probe::Found { .. }))
    }

    /// Remove `key` and return its value. `Ok(None)` means the key was
    /// absent and nothing changed.
    pub fn remove(&mut self, key: &str) -> Result<Option<V>, TableError> {
        let index = self.bucket_index(key)?;
        let depth = match self.probe(index, key) {
            Probe::Found { depth, .. } => depth,
            Probe::Empty | Probe::NotFound { .. } => {
                trace!("remove {:?}: absent", key);
                return Ok(None);
            }
        };

        let Some(link) = link::unlink(link::slot_at(&mut self.buckets[index], depth)) else {
            return Ok(None);
        };
        let Link { value, entry, .. } = *link;
        self.log.remove(entry);
        self.len -= 1;
        trace!("remove {:?} from bucket {} at depth {}", key, index, depth);
        Ok(Some(value))
    }

    /// Drop every entry and return to the initial capacity.
    pub fn clear(&mut self) {
        let entries = self.len;
        for slot in &mut self.buckets {
            link::release(slot);
        }
        self.capacity = DEFAULT_CAPACITY;
        self.buckets = empty_buckets(DEFAULT_CAPACITY);
        self.log.clear();
        self.len = 0;
        debug!("cleared table of {} entries", entries);
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            it: self.log.iter(),
        }
    }

    /// Values in first-insertion order of their keys.
    pub fn values(&self) -> Values<'_, V> {
        Values {
            it: self.entries(),
        }
    }

    /// `(key, value)` pairs in first-insertion order.
    pub fn entries(&self) -> Entries<'_, V> {
        Entries {
            table: self,
            keys: self.log.iter(),
        }
    }

    /// Chain length of every bucket, in bucket order.
    #[cfg(feature = "bench_internal")]
    pub fn bucket_lengths(&self) -> Vec<usize> {
        self.buckets.iter().map(|slot| Chain::new(slot).count()).collect()
    }
}

#[cfg(test)]
impl<V> HashTable<V> {
    /// Panics unless buckets, links, entry log and `len` agree.
    pub(crate) fn assert_consistent(&self) {
        assert!(self.capacity.is_power_of_two());
        assert_eq!(self.buckets.len(), self.capacity);
        let mut links = 0;
        for (index, slot) in self.buckets.iter().enumerate() {
            for link in Chain::new(slot) {
                assert_eq!(hash_key(&link.key, self.capacity), index, "link in wrong bucket");
                links += 1;
            }
        }
        assert_eq!(links, self.len, "link count != len");
        assert_eq!(self.log.len(), self.len, "entry log length != len");
        assert_eq!(self.entries().count(), self.len, "log key without a link");
        assert!(self.len <= self.threshold(), "load above threshold");
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Drop for HashTable<V> {
    fn drop(&mut self) {
        for slot in &mut self.buckets {
            link::release(slot);
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for HashTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Entries<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

/// Iterator over keys in insertion order.
pub struct Keys<'a> {
    it: entry_log::Iter<'a>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a str;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|key| &**key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl ExactSizeIterator for Keys<'_> {}

/// Iterator over `(key, value)` pairs in insertion order.
pub struct Entries<'a, V> {
    table: &'a HashTable<V>,
    keys: entry_log::Iter<'a>,
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        self.keys
            .by_ref()
            .find_map(|key| table.find(key))
            .map(|link| (&*link.key, &link.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.keys.size_hint().1)
    }
}

/// Iterator over values in insertion order of their keys.
pub struct Values<'a, V> {
    it: Entries<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn pairs<V: Clone>(t: &HashTable<V>) -> Vec<(String, V)> {
        t.entries().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    /// Invariant: the hash is the mod-capacity polynomial fold with multiplier 31.
    #[test]
    fn hash_matches_polynomial_fold() {
        assert_eq!(hash_key("", 16), 0);
        assert_eq!(hash_key("a", 16), 97 % 16);
        assert_eq!(hash_key("ab", 16), (31 * (97 % 16) + 98) % 16);
        assert_eq!(hash_key("ab", 32), (31 * 97 + 98) % 32);
        // Non-ASCII keys fold UTF-16 code units.
        assert_eq!(hash_key("é", 256), 0xE9);
        assert_eq!(hash_key("😀", 1 << 20), (31 * 0xD83D + 0xDE00) % (1 << 20));
    }

    /// Invariant: every hash lies in `[0, capacity)` for every capacity the
    /// table can reach.
    #[test]
    fn hash_stays_below_capacity() {
        for shift in 4..12 {
            let capacity = 1usize << shift;
            for i in 0..500 {
                let key = format!("key-{i}-{}", "z".repeat(i % 7));
                assert!(hash_key(&key, capacity) < capacity);
            }
        }
    }

    /// Invariant: a new table has the default capacity and no entries.
    #[test]
    fn new_table_is_empty_with_default_capacity() {
        let t: HashTable<i32> = HashTable::new();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), DEFAULT_CAPACITY);
        assert_eq!(t.buckets.len(), DEFAULT_CAPACITY);
        assert_eq!(t.keys().count(), 0);
    }

    /// Invariant: traversal distinguishes an empty bucket, a chain without the
    /// key (reporting its length) and a match (reporting its depth).
    #[test]
    fn probe_classifies_empty_not_found_and_found() {
        let mut t: HashTable<i32> = HashTable::new();
        // "a" and "q" share bucket 1 at capacity 16 (97 % 16 == 113 % 16).
        assert_eq!(hash_key("a", 16), hash_key("q", 16));
        let index = hash_key("a", 16);

        assert!(matches!(t.probe(index, "a"), Probe::Empty));

        t.insert("a", 1).unwrap();
        assert!(matches!(t.probe(index, "q"), Probe::NotFound { len: 1 }));

        t.insert("q", 2).unwrap();
        match t.probe(index, "q") {
            Probe::Found { depth, link } => {
                assert_eq!(depth, 1);
                assert_eq!(link.value, 2);
            }
            _ => panic!("expected q at depth 1"),
        }
        assert!(matches!(t.probe(index, "a"), Probe::Found { depth: 0, .. }));
    }

    /// Invariant: set then get round-trips; absent keys read as `None`.
    #[test]
    fn insert_get_roundtrip() {
        let mut t = HashTable::new();
        assert_eq!(t.insert("alpha", 1).unwrap(), None);
        assert_eq!(t.insert("beta", 2).unwrap(), None);
        assert_eq!(t.get("alpha").unwrap(), Some(&1));
        assert_eq!(t.get("beta").unwrap(), Some(&2));
        assert_eq!(t.get("gamma").unwrap(), None);
        assert!(t.contains_key("alpha").unwrap());
        assert!(!t.contains_key("gamma").unwrap());
    }

    /// Invariant: overwriting keeps `len`, returns the old value, and keeps the
    /// key's position in the enumeration order.
    #[test]
    fn overwrite_keeps_len_and_position() {
        let mut t = HashTable::new();
        t.insert("a", 1).unwrap();
        t.insert("b", 2).unwrap();
        t.insert("c", 3).unwrap();
        assert_eq!(t.insert("a", 10).unwrap(), Some(1));
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("a").unwrap(), Some(&10));
        assert_eq!(
            pairs(&t),
            [("a".to_string(), 10), ("b".to_string(), 2), ("c".to_string(), 3)]
        );
    }

    /// Invariant: overwriting a key deep in a collision chain updates that
    /// link only.
    #[test]
    fn overwrite_inside_collision_chain() {
        let mut t = HashTable::new();
        for k in ["a", "q", "A"] {
            // 'A' = 65, 65 % 16 == 1: all three collide.
            assert_eq!(hash_key(k, 16), 1);
            t.insert(k, 0).unwrap();
        }
        assert_eq!(t.insert("q", 5).unwrap(), Some(0));
        assert_eq!(t.get("a").unwrap(), Some(&0));
        assert_eq!(t.get("q").unwrap(), Some(&5));
        assert_eq!(t.get("A").unwrap(), Some(&0));
        assert_eq!(t.len(), 3);
    }

    /// Invariant: `get_mut` edits the stored value in place.
    #[test]
    fn get_mut_updates_value() {
        let mut t = HashTable::new();
        t.insert("k", 1).unwrap();
        *t.get_mut("k").unwrap().expect("present") += 41;
        assert_eq!(t.get("k").unwrap(), Some(&42));
        assert!(t.get_mut("missing").unwrap().is_none());
    }

    /// Invariant: removing the chain head promotes its successor.
    #[test]
    fn remove_chain_head() {
        let mut t = HashTable::new();
        t.insert("a", 1).unwrap();
        t.insert("q", 2).unwrap();
        t.insert("A", 3).unwrap();

        assert_eq!(t.remove("a").unwrap(), Some(1));
        assert!(!t.contains_key("a").unwrap());
        assert_eq!(t.get("q").unwrap(), Some(&2));
        assert_eq!(t.get("A").unwrap(), Some(&3));
        assert!(matches!(t.probe(1, "q"), Probe::Found { depth: 0, .. }));
        assert_eq!(t.len(), 2);
    }

    /// Invariant: removing a mid-chain link splices its parent to its child.
    #[test]
    fn remove_chain_middle_and_tail() {
        let mut t = HashTable::new();
        t.insert("a", 1).unwrap();
        t.insert("q", 2).unwrap();
        t.insert("A", 3).unwrap();

        assert_eq!(t.remove("q").unwrap(), Some(2));
        assert!(matches!(t.probe(1, "A"), Probe::Found { depth: 1, .. }));
        assert_eq!(t.remove("A").unwrap(), Some(3));
        assert!(matches!(t.probe(1, "q"), Probe::NotFound { len: 1 }));
        assert_eq!(pairs(&t), [("a".to_string(), 1)]);
        assert_eq!(t.len(), 1);
    }

    /// Invariant: removing an absent key (empty bucket or missing from a
    /// chain) changes nothing.
    #[test]
    fn remove_absent_is_noop() {
        let mut t = HashTable::new();
        t.insert("a", 1).unwrap();
        assert_eq!(t.remove("zz").unwrap(), None);
        assert_eq!(t.remove("q").unwrap(), None);
        assert_eq!(t.len(), 1);
        assert_eq!(pairs(&t), [("a".to_string(), 1)]);
    }

    /// Invariant: growth happens on the insert that finds the table at its
    /// threshold, doubles capacity, and keeps every mapping and the order.
    #[test]
    fn growth_at_threshold_preserves_entries_and_order() {
        let mut t = HashTable::new();
        let keys: Vec<String> = (0..13).map(|i| format!("key{i}")).collect();
        for (i, k) in keys.iter().take(12).enumerate() {
            t.insert(k, i).unwrap();
        }
        assert_eq!(t.capacity(), 16);

        t.insert(&keys[12], 12).unwrap();
        assert_eq!(t.capacity(), 32);
        assert_eq!(t.buckets.len(), 32);
        assert_eq!(t.len(), 13);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(t.get(k).unwrap(), Some(&i));
        }
        let order: Vec<&str> = t.keys().collect();
        let expected: Vec<&str> = keys.iter().map(String::as_str).collect();
        assert_eq!(order, expected);
    }

    /// Invariant: after growth every link sits in the bucket its key hashes to
    /// under the new capacity, and link count equals `len`.
    #[test]
    fn growth_relinks_into_new_buckets() {
        let mut t = HashTable::new();
        for i in 0..200 {
            t.insert(&format!("k{i}"), i).unwrap();
        }
        assert_eq!(t.capacity(), 512);
        let mut links = 0;
        for (index, slot) in t.buckets.iter().enumerate() {
            for link in Chain::new(slot) {
                assert_eq!(hash_key(&link.key, t.capacity()), index);
                links += 1;
            }
        }
        assert_eq!(links, t.len());
        assert_eq!(t.log.len(), t.len());
    }

    /// Invariant: capacity never shrinks on removal.
    #[test]
    fn remove_does_not_shrink() {
        let mut t = HashTable::new();
        for i in 0..20 {
            t.insert(&i.to_string(), i).unwrap();
        }
        let grown = t.capacity();
        for i in 0..20 {
            t.remove(&i.to_string()).unwrap();
        }
        assert!(t.is_empty());
        assert_eq!(t.capacity(), grown);
    }

    /// Invariant: `clear` restores capacity 16 and drops every entry, and the
    /// table is reusable afterwards.
    #[test]
    fn clear_resets_to_initial_state() {
        let mut t = HashTable::new();
        for i in 0..40 {
            t.insert(&format!("k{i}"), i).unwrap();
        }
        assert!(t.capacity() > DEFAULT_CAPACITY);
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), DEFAULT_CAPACITY);
        assert_eq!(t.buckets.len(), DEFAULT_CAPACITY);
        assert_eq!(t.log.len(), 0);
        for i in 0..40 {
            assert!(!t.contains_key(&format!("k{i}")).unwrap());
        }
        t.insert("fresh", 1).unwrap();
        assert_eq!(pairs(&t), [("fresh".to_string(), 1)]);
    }

    /// Invariant: values are dropped exactly once on remove, clear and drop.
    #[test]
    fn values_dropped_once() {
        struct Counted<'a>(&'a Cell<usize>);
        impl Drop for Counted<'_> {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Cell::new(0);
        let mut t = HashTable::new();
        for i in 0..30 {
            t.insert(&format!("k{i}"), Counted(&drops)).unwrap();
        }
        drop(t.remove("k0").unwrap());
        assert_eq!(drops.get(), 1);
        drop(t.insert("k1", Counted(&drops)).unwrap());
        assert_eq!(drops.get(), 2);
        t.clear();
        assert_eq!(drops.get(), 31);
        for i in 0..5 {
            t.insert(&format!("k{i}"), Counted(&drops)).unwrap();
        }
        drop(t);
        assert_eq!(drops.get(), 36);
    }

    /// Invariant: an index outside the bucket array is reported, not followed,
    /// and nothing is mutated.
    #[test]
    fn index_guard_rejects_out_of_range() {
        let mut t: HashTable<i32> = HashTable::new();
        t.insert("a", 1).unwrap();
        // Corrupt the hash/bucket relationship: keep only buckets 0 and 1.
        t.buckets.truncate(2);

        let expected = TableError::IndexOutOfRange {
            index: 2,
            capacity: 16,
        };
        assert_eq!(hash_key("b", 16), 2);
        assert_eq!(t.get("b"), Err(expected.clone()));
        assert_eq!(t.contains_key("b"), Err(expected.clone()));
        assert_eq!(t.remove("b"), Err(expected.clone()));
        assert_eq!(t.insert("b", 2), Err(expected));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("a").unwrap(), Some(&1));
        // Enumeration skips nothing that is still reachable.
        assert_eq!(pairs(&t), [("a".to_string(), 1)]);

        t.clear();
        assert_eq!(t.insert("b", 2).unwrap(), None);
    }

    #[test]
    fn debug_lists_entries_in_insertion_order() {
        let mut t = HashTable::new();
        t.insert("z", 1).unwrap();
        t.insert("a", 2).unwrap();
        assert_eq!(format!("{:?}", t), r#"{"z": 1, "a": 2}"#);
    }

    #[test]
    fn borrowed_iteration_via_into_iterator() {
        let mut t = HashTable::new();
        t.insert("x", 1).unwrap();
        t.insert("y", 2).unwrap();
        let mut sum = 0;
        for (_k, v) in &t {
            sum += v;
        }
        assert_eq!(sum, 3);
        assert_eq!(t.values().copied().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(t.keys().len(), 2);
    }

    #[cfg(feature = "bench_internal")]
    #[test]
    fn bucket_lengths_sum_to_len() {
        let mut t = HashTable::new();
        for i in 0..50 {
            t.insert(&format!("k{i}"), i).unwrap();
        }
        let lengths = t.bucket_lengths();
        assert_eq!(lengths.len(), t.capacity());
        assert_eq!(lengths.iter().sum::<usize>(), 50);
    }
}
