//! Order-5 B-tree map used to keep archive name sets sorted while they
//! are being collected.
//!
//! Order 5 here means at most 5 keys (6 children) per node. A node that
//! overflows to 6 keys splits around its median, promoting it to the
//! parent. Inserting an existing key replaces its value.

/// Maximum number of keys per node.
pub const ORDER: usize = 5;

const MAX_KEYS: usize = ORDER;

#[derive(Debug)]
struct BNode<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    children: Vec<Box<BNode<K, V>>>,
}

/// Median entry and right half promoted out of an overflowing node.
type Promotion<K, V> = (K, V, Box<BNode<K, V>>);

impl<K: Ord, V> BNode<K, V> {
    fn leaf() -> Self {
        Self {
            keys: Vec::with_capacity(MAX_KEYS + 1),
            values: Vec::with_capacity(MAX_KEYS + 1),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Insert into this subtree. Returns the replaced value on a key hit,
    /// plus a promotion when this node overflowed and split.
    fn insert(&mut self, key: K, value: V) -> (Option<V>, Option<Promotion<K, V>>) {
        let pos = match self.keys.binary_search(&key) {
            Ok(pos) => {
                return (Some(std::mem::replace(&mut self.values[pos], value)), None);
            }
            Err(pos) => pos,
        };

        if self.is_leaf() {
            self.keys.insert(pos, key);
            self.values.insert(pos, value);
        } else {
            let (replaced, promoted) = self.children[pos].insert(key, value);
            if let Some((mid_key, mid_value, right)) = promoted {
                self.keys.insert(pos, mid_key);
                self.values.insert(pos, mid_value);
                self.children.insert(pos + 1, right);
            }
            if replaced.is_some() {
                return (replaced, None);
            }
        }
        (None, self.split_if_overflowing())
    }

    fn split_if_overflowing(&mut self) -> Option<Promotion<K, V>> {
        if self.keys.len() <= MAX_KEYS {
            return None;
        }
        let median = self.keys.len() / 2;

        let mut right = BNode::leaf();
        right.keys = self.keys.split_off(median + 1);
        right.values = self.values.split_off(median + 1);
        let mid_key = self.keys.pop()?;
        let mid_value = self.values.pop()?;
        if !self.is_leaf() {
            right.children = self.children.split_off(median + 1);
        }
        Some((mid_key, mid_value, Box::new(right)))
    }

    fn get(&self, key: &K) -> Option<&V> {
        match self.keys.binary_search(key) {
            Ok(pos) => Some(&self.values[pos]),
            Err(pos) if !self.is_leaf() => self.children[pos].get(key),
            Err(_) => None,
        }
    }

    fn in_order<'a>(&'a self, out: &mut Vec<(&'a K, &'a V)>) {
        if self.is_leaf() {
            out.extend(self.keys.iter().zip(&self.values));
            return;
        }
        for (i, entry) in self.keys.iter().zip(&self.values).enumerate() {
            self.children[i].in_order(out);
            out.push(entry);
        }
        if let Some(last) = self.children.last() {
            last.in_order(out);
        }
    }
}

/// An order-5 B-tree map over any ordered key type.
#[derive(Debug, Default)]
pub struct BTree<K, V> {
    root: Option<Box<BNode<K, V>>>,
    len: usize,
}

impl<K: Ord, V> BTree<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a key-value pair, returning the previous value if the key
    /// was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let root = self.root.get_or_insert_with(|| Box::new(BNode::leaf()));
        let (replaced, promoted) = root.insert(key, value);
        if let Some((mid_key, mid_value, right)) = promoted {
            let mut new_root = Box::new(BNode::leaf());
            std::mem::swap(root, &mut new_root);
            root.keys.push(mid_key);
            root.values.push(mid_value);
            root.children.push(new_root);
            root.children.push(right);
        }
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    /// Look up a key; a miss is `None`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.as_ref().and_then(|root| root.get(key))
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// All entries in ascending key order.
    #[must_use]
    pub fn in_order(&self) -> Vec<(&K, &V)> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(root) = &self.root {
            root.in_order(&mut out);
        }
        out
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = BTree::new();
        for (key, value) in iter {
            tree.insert(key, value);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_inserts_split_the_root_and_misses_stay_misses() {
        let mut tree = BTree::new();
        for k in 1..=6 {
            assert!(tree.insert(k, k).is_none());
        }
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.get(&3), Some(&3));
        assert_eq!(tree.get(&7), None);
        let keys: Vec<i32> = tree.in_order().into_iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn reinserting_replaces_the_value() {
        let mut tree = BTree::new();
        assert!(tree.insert("name", 1).is_none());
        assert_eq!(tree.insert("name", 2), Some(1));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&"name"), Some(&2));
    }

    #[test]
    fn string_keys_come_out_ascending() {
        let names = [
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        ];
        let tree: BTree<&str, usize> =
            names.iter().enumerate().map(|(i, s)| (*s, i)).collect();

        let keys: Vec<&str> = tree.in_order().into_iter().map(|(k, _)| *k).collect();
        let mut expected = names;
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn large_shuffled_set_stays_sorted() {
        let mut tree = BTree::new();
        // Deterministic pseudo-shuffle over 0..500.
        let mut x: u32 = 7;
        for _ in 0..500 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345) % 500;
            tree.insert(x, x * 2);
        }
        let keys: Vec<u32> = tree.in_order().into_iter().map(|(k, _)| *k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
