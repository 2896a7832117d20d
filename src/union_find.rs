//! Disjoint-set (Union-Find) structure used for proximity clustering.
//!
//! The representative of every set is its smallest element, so group keys
//! and member order do not depend on insertion or hashing order.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Union-Find over arbitrary ordered keys with path compression.
#[derive(Debug, Clone)]
pub struct UnionFind<T> {
    parent: HashMap<T, T>,
}

impl<T> Default for UnionFind<T>
where
    T: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UnionFind<T>
where
    T: Clone + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
        }
    }

    /// Add `item` as its own singleton set. No-op if already present.
    pub fn make_set(&mut self, item: T) {
        self.parent.entry(item.clone()).or_insert(item);
    }

    /// Number of tracked elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Find the representative of `item`, compressing the path on the way.
    ///
    /// Unknown items are their own representative.
    pub fn find(&mut self, item: &T) -> T {
        let mut root = item.clone();
        while let Some(parent) = self.parent.get(&root) {
            if *parent == root {
                break;
            }
            root = parent.clone();
        }

        // Path compression
        let mut current = item.clone();
        while current != root {
            match self.parent.insert(current.clone(), root.clone()) {
                Some(next) => current = next,
                None => break,
            }
        }

        root
    }

    /// Merge the sets containing `a` and `b`. The smaller root wins.
    pub fn union(&mut self, a: &T, b: &T) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        if root_a < root_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_a, root_b);
        }
    }

    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// All sets keyed by representative, members sorted ascending.
    pub fn groups(&mut self) -> BTreeMap<T, Vec<T>> {
        let items: Vec<T> = self.parent.keys().cloned().collect();
        let mut groups: BTreeMap<T, Vec<T>> = BTreeMap::new();
        for item in items {
            let root = self.find(&item);
            groups.entry(root).or_default().push(item);
        }
        for members in groups.values_mut() {
            members.sort();
        }
        groups
    }
}
