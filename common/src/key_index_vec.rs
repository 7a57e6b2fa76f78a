use std::hash::Hash;
use std::ops::Index;

use hashbrown::HashMap;

use crate::is_debug;

pub trait KeyIndexKey<K> {
    fn key(&self) -> &K;
}

/// Insertion-ordered vector with O(1) lookup by key.
///
/// Keys are unique: [`KeyIndexVec::push`] refuses a value whose key is
/// already present and hands it back.
#[derive(Debug, Clone)]
pub struct KeyIndexVec<K: Copy + Eq + Hash, V: KeyIndexKey<K>> {
    items: Vec<V>,
    idx_by_key: HashMap<K, usize>,
}

impl<K, V> Default for KeyIndexVec<K, V>
where
    K: Copy + Eq + Hash,
    V: KeyIndexKey<K>,
{
    fn default() -> Self {
        Self {
            items: Vec::new(),
            idx_by_key: HashMap::new(),
        }
    }
}

impl<K, V> KeyIndexVec<K, V>
where
    K: Copy + Eq + Hash,
    V: KeyIndexKey<K>,
{
    pub fn push(&mut self, v: V) -> Result<(), V> {
        if self.idx_by_key.contains_key(v.key()) {
            return Err(v);
        }
        self.idx_by_key.insert(*v.key(), self.items.len());
        self.items.push(v);
        Ok(())
    }

    pub fn remove_by_key(&mut self, key: &K) -> Option<V> {
        let idx = self.idx_by_key.remove(key)?;
        let removed = self.items.remove(idx);
        debug_assert!(*removed.key() == *key);

        for (pos, item) in self.items.iter().enumerate().skip(idx) {
            self.idx_by_key.insert(*item.key(), pos);
        }

        Some(removed)
    }

    /// Keeps only the values for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&V) -> bool) {
        self.items.retain(|v| keep(v));
        self.reindex();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.idx_by_key.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.items
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.items.len(), self.idx_by_key.len());
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.idx_by_key.contains_key(key)
    }

    pub fn index_of_key(&self, key: &K) -> Option<usize> {
        self.idx_by_key.get(key).copied()
    }

    pub fn by_key(&self, key: &K) -> Option<&V> {
        self.index_of_key(key).map(|idx| &self.items[idx])
    }

    /// Mutable access to a value. The closure must not change the key.
    pub fn update<R>(&mut self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let idx = self.index_of_key(key)?;
        let result = f(&mut self.items[idx]);
        assert!(
            *self.items[idx].key() == *key,
            "KeyIndexVec::update must not change the key"
        );
        Some(result)
    }

    fn reindex(&mut self) {
        self.idx_by_key.clear();
        for (idx, v) in self.items.iter().enumerate() {
            self.idx_by_key.insert(*v.key(), idx);
        }

        if is_debug() {
            assert_eq!(self.items.len(), self.idx_by_key.len());
        }
    }
}

impl<K, V> Index<usize> for KeyIndexVec<K, V>
where
    K: Copy + Eq + Hash,
    V: KeyIndexKey<K>,
{
    type Output = V;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.items[idx]
    }
}
