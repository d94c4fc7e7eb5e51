// ============================================================================
// spark-map-state - Snapshot
// An immutable, insertion-ordered map with shared identity
// ============================================================================
//
// A snapshot is never mutated after construction. Every derivation copies the
// entries into a fresh allocation, so a reader holding an older snapshot keeps
// seeing exactly what it saw. Identity is the allocation itself: clones of a
// snapshot are the same instance, derivations never are.
// ============================================================================

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use indexmap::map::{Iter, Keys, Values};

/// An immutable, insertion-ordered key-value map.
///
/// # Example
///
/// ```
/// use spark_map_state::Snapshot;
///
/// let snapshot: Snapshot<u32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
///
/// assert_eq!(snapshot.get(&1), Some(&"a"));
/// assert!(snapshot.has(&2));
/// assert_eq!(snapshot.keys().copied().collect::<Vec<_>>(), vec![2, 1]);
///
/// let same = snapshot.clone();
/// assert!(Snapshot::ptr_eq(&snapshot, &same));
/// ```
pub struct Snapshot<K, V> {
    entries: Rc<IndexMap<K, V>>,
}

impl<K, V> Clone for Snapshot<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> Snapshot<K, V> {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self {
            entries: Rc::new(IndexMap::new()),
        }
    }

    /// True if both handles point at the same snapshot instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.entries, &b.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn values(&self) -> Values<'_, K, V> {
        self.entries.values()
    }

    /// Entry at iteration position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get_index(index)
    }

    /// Borrow the underlying ordered map.
    pub fn as_map(&self) -> &IndexMap<K, V> {
        &self.entries
    }
}

impl<K, V> Snapshot<K, V>
where
    K: Hash + Eq,
{
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Alias for [`contains_key`](Self::contains_key).
    pub fn has(&self, key: &K) -> bool {
        self.contains_key(key)
    }

    /// Iteration position of `key`.
    pub fn position(&self, key: &K) -> Option<usize> {
        self.entries.get_index_of(key)
    }
}

impl<K, V> Snapshot<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Copy the entries into an owned `Vec`, in order.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// A new instance with the same entries.
    pub(crate) fn duplicate(&self) -> Self {
        Self::from_map(IndexMap::clone(&self.entries))
    }

    /// A new instance with `key` bound to `value`. An existing key keeps
    /// its position; a new key goes last.
    pub(crate) fn with_entry(&self, key: K, value: V) -> Self {
        let mut next = IndexMap::clone(&self.entries);
        next.insert(key, value);
        Self::from_map(next)
    }

    /// A new instance without `key`; the remaining order is unchanged.
    pub(crate) fn without(&self, key: &K) -> Self {
        let mut next = IndexMap::clone(&self.entries);
        next.shift_remove(key);
        Self::from_map(next)
    }
}

impl<K, V> Snapshot<K, V> {
    pub(crate) fn from_map(map: IndexMap<K, V>) -> Self {
        Self {
            entries: Rc::new(map),
        }
    }
}

impl<K, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for Snapshot<K, V> {
    /// Later duplicates overwrite the value but keep the first position.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl<K, V> From<IndexMap<K, V>> for Snapshot<K, V> {
    fn from(map: IndexMap<K, V>) -> Self {
        Self::from_map(map)
    }
}

impl<'a, K, V> IntoIterator for &'a Snapshot<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Content equality, order included. Use [`Snapshot::ptr_eq`] for identity.
impl<K: PartialEq, V: PartialEq> PartialEq for Snapshot<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for Snapshot<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Snapshot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Serialized as a sequence of `[key, value]` pairs so order survives.
#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for Snapshot<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot<u32, &'static str> {
        [(1, "a"), (2, "b"), (3, "c")].into_iter().collect()
    }

    #[test]
    fn reads() {
        let s = sample();
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
        assert_eq!(s.get(&2), Some(&"b"));
        assert_eq!(s.get(&9), None);
        assert!(s.has(&3));
        assert_eq!(s.position(&3), Some(2));
        assert_eq!(s.get_index(0), Some((&1, &"a")));
    }

    #[test]
    fn with_entry_overwrites_in_place() {
        let s = sample();
        let next = s.with_entry(2, "B");

        assert_eq!(next.to_vec(), vec![(1, "a"), (2, "B"), (3, "c")]);
        assert_eq!(s.get(&2), Some(&"b"));
        assert!(!Snapshot::ptr_eq(&s, &next));
    }

    #[test]
    fn with_entry_appends_new_key() {
        let next = sample().with_entry(0, "z");
        assert_eq!(next.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 0]);
    }

    #[test]
    fn without_keeps_remaining_order() {
        let s = sample();
        let next = s.without(&1);

        assert_eq!(next.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn without_absent_key_is_a_new_instance() {
        let s = sample();
        let next = s.without(&42);
        assert_eq!(next, s);
        assert!(!Snapshot::ptr_eq(&s, &next));
    }

    #[test]
    fn duplicate_keys_keep_first_position() {
        let s: Snapshot<u32, &str> = [(1, "a"), (2, "b"), (1, "c")].into_iter().collect();
        assert_eq!(s.to_vec(), vec![(1, "c"), (2, "b")]);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a: Snapshot<u32, u32> = [(1, 1), (2, 2)].into_iter().collect();
        let b: Snapshot<u32, u32> = [(2, 2), (1, 1)].into_iter().collect();
        assert_ne!(a, b);
        assert_eq!(a, a.duplicate());
    }

    #[test]
    fn debug_renders_as_map() {
        let s: Snapshot<u32, &str> = [(1, "a")].into_iter().collect();
        assert_eq!(format!("{:?}", s), r#"{1: "a"}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_ordered_pairs() {
        let s: Snapshot<u32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"[[2,"b"],[1,"a"]]"#);
    }
}
