//! The tree store.
//!
//! [`Values`] owns one root [`Node`] behind a reader/writer lock. Lookups,
//! comparisons, clones and traversals share the read lock; puts, merges and
//! removals take the write lock, so readers see a tree either before or after
//! a mutation and never in between.

use std::fmt;

use parking_lot::RwLock;
use serde::ser::{Serialize, Serializer};
use tracing::trace;

use super::key::Key;
use super::node::Node;
use super::value::Value;


/// A key/value pair used for bulk insertion and flat export.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: Key,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}


/// A thread-safe tree of values addressed by [`Key`]s.
pub struct Values {
    // Boxed: a `Node` leaf can hold a `Value::Values`.
    root: Box<RwLock<Node>>,
}

impl Values {
    /// An empty tree.
    pub fn new() -> Self {
        Values::from_node(Node::empty())
    }

    pub(crate) fn from_node(root: Node) -> Self {
        Values {
            root: Box::new(RwLock::new(root)),
        }
    }

    /// Build a tree by putting every pair in order.
    pub fn from_key_values<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        let values = Values::new();
        for KeyValue { key, value } in pairs {
            values.put(&key, value);
        }
        values
    }

    /// Look up `key`.
    ///
    /// A leaf yields its value. A branch yields a standalone copy of the
    /// sub-tree as [`Value::Values`], which does not track later changes.
    pub fn get(&self, key: &Key) -> Option<Value> {
        let root = self.root.read();
        root.get(key.segments()).map(Node::to_value)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.root.read().get(key.segments()).is_some()
    }

    /// Associate `value` with `key`. Returns true iff the mapping changed.
    ///
    /// Putting a [`Value::Values`] merges that tree in at `key` rather than
    /// storing it as a leaf; see [`Values::merge`].
    pub fn put(&self, key: &Key, value: impl Into<Value>) -> bool {
        match value.into() {
            Value::Values(other) => self.merge(key, &other),
            value => self.root.write().put(key.segments(), value),
        }
    }

    /// Put every leaf of `other` below `key`.
    ///
    /// An empty `other` clears everything at `key` instead, which counts as a
    /// change only if something was there. `other` is read under its own lock
    /// before the write lock on `self` is taken, so merging a tree into itself
    /// is allowed.
    pub fn merge(&self, key: &Key, other: &Values) -> bool {
        let pairs = other.key_values();
        let mut root = self.root.write();
        if pairs.is_empty() {
            let changed = root.clear(key.segments());
            trace!(key = %key, changed, "cleared sub-tree for empty merge");
            return changed;
        }
        let mut changed = false;
        for KeyValue { key: sub_key, value } in pairs {
            let full = key.append(&[&sub_key]);
            changed |= root.put(full.segments(), value);
        }
        trace!(key = %key, changed, "merged sub-tree");
        changed
    }

    /// Remove whatever is at `key`.
    ///
    /// Removing a leaf yields its value; removing a branch yields it as a
    /// standalone [`Value::Values`]. Removing the empty key resets the whole
    /// tree and yields a value only if the root was a leaf.
    pub fn remove(&self, key: &Key) -> Option<Value> {
        let mut root = self.root.write();
        if key.is_empty() {
            return match std::mem::replace(&mut *root, Node::empty()) {
                Node::Leaf(value) => Some(value),
                Node::Branch(_) => None,
            };
        }
        root.remove(key.segments()).map(Node::into_value)
    }

    /// Deep structural equality.
    pub fn equal(&self, other: &Values) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let lhs = self.root.read();
        let rhs = other.root.read();
        *lhs == *rhs
    }

    /// True if the tree holds no values at all.
    pub fn is_empty(&self) -> bool {
        self.root.read().is_empty()
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.root.read().leaf_count()
    }

    /// Call `visit` once per leaf with its full key.
    ///
    /// The read lock is held for the whole traversal; `visit` must not
    /// mutate this same tree.
    pub fn each_key_value<F>(&self, mut visit: F)
    where
        F: FnMut(&Key, &Value),
    {
        let root = self.root.read();
        root.each_leaf(&mut Vec::new(), &mut |path: &[String], value: &Value| {
            visit(&Key::from(path.to_vec()), value)
        });
    }

    /// Snapshot of every leaf as a flat list.
    pub fn key_values(&self) -> Vec<KeyValue> {
        let mut pairs = Vec::new();
        self.each_key_value(|key, value| {
            pairs.push(KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
        });
        pairs
    }

    /// Every leaf key, in traversal order.
    pub fn keys(&self) -> Vec<Key> {
        let mut keys = Vec::new();
        self.each_key_value(|key, _| keys.push(key.clone()));
        keys
    }

    #[cfg(test)]
    pub(crate) fn well_formed(&self) -> bool {
        self.root.read().well_formed(true)
    }
}

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy: the clone shares no nodes and has its own lock.
impl Clone for Values {
    fn clone(&self) -> Self {
        Values::from_node(self.root.read().clone())
    }
}

impl PartialEq for Values {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.each_key_value(|key, value| {
            map.entry(&key.to_string(), value);
        });
        map.finish()
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.read().serialize(serializer)
    }
}

impl FromIterator<KeyValue> for Values {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        Values::from_key_values(iter)
    }
}
