//! Max-priority queue with key lookup and in-place priority changes.

use std::{collections::HashMap, hash::Hash};

struct Entry<K, T> {
    key: K,
    item: T,
    priority: f64,
    seq: u64,
}

/// Binary max-heap whose entries are also indexed by key.
///
/// Each key appears at most once. Equal priorities pop in insertion order.
pub struct HashIndexedHeap<K, T> {
    entries: Vec<Entry<K, T>>,
    index: HashMap<K, usize>,
    next_seq: u64,
}

impl<K: Hash + Eq + Clone, T> HashIndexedHeap<K, T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Item and priority stored under `key`.
    pub fn get(&self, key: &K) -> Option<(&T, f64)> {
        self.index.get(key).map(|&i| {
            let entry = &self.entries[i];
            (&entry.item, entry.priority)
        })
    }

    /// Insert a new key, or replace the item and priority of an existing one.
    pub fn push(&mut self, key: K, item: T, priority: f64) {
        if let Some(&i) = self.index.get(&key) {
            let old = self.entries[i].priority;
            self.entries[i].item = item;
            self.entries[i].priority = priority;
            if priority > old {
                self.sift_up(i);
            } else {
                self.sift_down(i);
            }
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let i = self.entries.len();
        self.index.insert(key.clone(), i);
        self.entries.push(Entry {
            key,
            item,
            priority,
            seq,
        });
        self.sift_up(i);
    }

    /// Remove and return the highest-priority entry.
    pub fn pop(&mut self) -> Option<(K, T, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let entry = self.entries.pop()?;
        self.index.remove(&entry.key);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((entry.key, entry.item, entry.priority))
    }

    fn before(&self, a: usize, b: usize) -> bool {
        let (ea, eb) = (&self.entries[a], &self.entries[b]);
        ea.priority > eb.priority || (ea.priority == eb.priority && ea.seq < eb.seq)
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        if let Some(slot) = self.index.get_mut(&self.entries[a].key) {
            *slot = a;
        }
        if let Some(slot) = self.index.get_mut(&self.entries[b].key) {
            *slot = b;
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.before(i, parent) {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.entries.len();
        loop {
            let (left, right) = (2 * i + 1, 2 * i + 2);
            let mut best = i;
            if left < n && self.before(left, best) {
                best = left;
            }
            if right < n && self.before(right, best) {
                best = right;
            }
            if best == i {
                break;
            }
            self.swap(i, best);
            i = best;
        }
    }
}

impl<K: Hash + Eq + Clone, T> Default for HashIndexedHeap<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_priority_order() {
        let mut heap = HashIndexedHeap::new();
        for (k, p) in [("a", 1.0), ("b", 5.0), ("c", 3.0), ("d", -2.0)] {
            heap.push(k, (), p);
        }
        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|(k, _, _)| k)).collect();
        assert_eq!(order, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut heap = HashIndexedHeap::new();
        for k in ["x", "y", "z"] {
            heap.push(k, (), 0.0);
        }
        assert_eq!(heap.pop().map(|e| e.0), Some("x"));
        assert_eq!(heap.pop().map(|e| e.0), Some("y"));
    }

    #[test]
    fn push_existing_key_changes_priority() {
        let mut heap = HashIndexedHeap::new();
        heap.push("a", 1, 1.0);
        heap.push("b", 2, 2.0);
        heap.push("a", 10, 3.0);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.get(&"a"), Some((&10, 3.0)));
        assert_eq!(heap.pop(), Some(("a", 10, 3.0)));
        heap.push("b", 2, -1.0);
        assert_eq!(heap.pop(), Some(("b", 2, -1.0)));
        assert!(heap.is_empty());
    }
}
