//! Tree nodes.
//!
//! A node is a leaf holding one value or a branch holding named children,
//! never both. The only empty branch reachable from a root is the root itself.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::value::Value;
use super::values::Values;


#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Leaf(Value),
    Branch(BTreeMap<String, Node>),
}

impl Node {
    /// A branch with no children.
    pub fn empty() -> Self {
        Node::Branch(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Branch(children) if children.is_empty())
    }

    /// Walk `key` from this node. Leaves only match the end of the key.
    pub fn get(&self, key: &[String]) -> Option<&Node> {
        let mut node = self;
        for segment in key {
            match node {
                Node::Leaf(_) => return None,
                Node::Branch(children) => node = children.get(segment)?,
            }
        }
        Some(node)
    }

    /// Store a scalar at `key`, creating branches along the way and
    /// replacing any leaf found on the path. Returns whether anything changed.
    pub fn put(&mut self, key: &[String], value: Value) -> bool {
        let Some((first, rest)) = key.split_first() else {
            return self.set_value(value);
        };
        let (children, mut changed) = self.branch_mut();
        let child = match children.entry(first.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                changed = true;
                entry.insert(Node::empty())
            }
        };
        child.put(rest, value) || changed
    }

    /// Turn this node into a leaf holding `value`.
    ///
    /// Replacing a branch (even an empty one) is a change; replacing a leaf
    /// is a change only if the values differ.
    pub fn set_value(&mut self, value: Value) -> bool {
        let changed = match self {
            Node::Leaf(old) => *old != value,
            Node::Branch(_) => true,
        };
        *self = Node::Leaf(value);
        changed
    }

    /// Detach the node at a non-empty `key`, pruning branches left empty
    /// below this node. Never mutates anything when the key does not resolve.
    pub fn remove(&mut self, key: &[String]) -> Option<Node> {
        let (first, rest) = key.split_first()?;
        let Node::Branch(children) = self else {
            return None;
        };
        if rest.is_empty() {
            return children.remove(first);
        }
        let child = children.get_mut(first)?;
        let removed = child.remove(rest)?;
        if child.is_empty() {
            children.remove(first);
        }
        Some(removed)
    }

    /// Drop everything at `key`. Returns true iff something was there.
    pub fn clear(&mut self, key: &[String]) -> bool {
        if key.is_empty() {
            let changed = !self.is_empty();
            *self = Node::empty();
            return changed;
        }
        self.remove(key).is_some_and(|removed| !removed.is_empty())
    }

    /// Visit every leaf below this node with its full path.
    pub fn each_leaf<F>(&self, path: &mut Vec<String>, visit: &mut F)
    where
        F: FnMut(&[String], &Value),
    {
        match self {
            Node::Leaf(value) => visit(path, value),
            Node::Branch(children) => {
                for (segment, child) in children {
                    path.push(segment.clone());
                    child.each_leaf(path, visit);
                    path.pop();
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(children) => children.values().map(Node::leaf_count).sum(),
        }
    }

    /// The value a lookup resolving here reports: the scalar of a leaf, or
    /// a standalone copy of a branch.
    pub fn to_value(&self) -> Value {
        match self {
            Node::Leaf(value) => value.clone(),
            Node::Branch(_) => Value::Values(Values::from_node(self.clone())),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Node::Leaf(value) => value,
            branch => Value::Values(Values::from_node(branch)),
        }
    }

    fn branch_mut(&mut self) -> (&mut BTreeMap<String, Node>, bool) {
        let converted = matches!(self, Node::Leaf(_));
        if converted {
            *self = Node::empty();
        }
        match self {
            Node::Branch(children) => (children, converted),
            Node::Leaf(_) => unreachable!("leaf replaced by a branch above"),
        }
    }

    /// Every non-root position is a leaf or a non-empty branch.
    #[cfg(test)]
    pub fn well_formed(&self, is_root: bool) -> bool {
        match self {
            Node::Leaf(_) => true,
            Node::Branch(children) => {
                (is_root || !children.is_empty())
                    && children.values().all(|child| child.well_formed(false))
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Leaf(value) => value.serialize(serializer),
            Node::Branch(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (segment, child) in children {
                    map.serialize_entry(segment, child)?;
                }
                map.end()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn k(raw: &str) -> Vec<String> {
        if raw.is_empty() {
            return Vec::new();
        }
        raw.split('.').map(String::from).collect()
    }

    #[test]
    fn set_value_on_fresh_branch_is_change() {
        let mut node = Node::empty();
        assert!(node.set_value(Value::Null));
        assert!(!node.set_value(Value::Null));
        assert!(node.set_value(Value::from(1i64)));
    }

    #[test]
    fn put_creates_intermediate_branches() {
        let mut root = Node::empty();
        assert!(root.put(&k("a.b.c"), Value::from("x")));
        assert!(matches!(root.get(&k("a.b")), Some(Node::Branch(_))));
        assert_eq!(root.get(&k("a.b.c")), Some(&Node::Leaf(Value::from("x"))));
        assert!(root.well_formed(true));
    }

    #[test]
    fn put_through_leaf_converts_it() {
        let mut root = Node::empty();
        root.put(&k("a"), Value::from("x"));
        assert!(root.put(&k("a.b"), Value::from("x")));
        assert!(matches!(root.get(&k("a")), Some(Node::Branch(_))));
        assert!(root.well_formed(true));
    }

    #[test]
    fn get_through_leaf_is_none() {
        let mut root = Node::empty();
        root.put(&k("a"), Value::from(1i64));
        assert!(root.get(&k("a.b")).is_none());
        assert!(root.get(&k("z")).is_none());
    }

    #[test]
    fn remove_prunes_empty_branches() {
        let mut root = Node::empty();
        root.put(&k("a.b.c"), Value::from(1i64));
        root.put(&k("x"), Value::from(2i64));
        let removed = root.remove(&k("a.b.c"));
        assert_eq!(removed, Some(Node::Leaf(Value::from(1i64))));
        assert!(root.get(&k("a")).is_none());
        assert!(root.get(&k("x")).is_some());
        assert!(root.well_formed(true));
    }

    #[test]
    fn remove_missing_does_not_mutate() {
        let mut root = Node::empty();
        root.put(&k("a"), Value::from(1i64));
        let before = root.clone();
        assert!(root.remove(&k("a.b")).is_none());
        assert!(root.remove(&k("q.r")).is_none());
        assert!(root.remove(&[]).is_none());
        assert_eq!(root, before);
    }

    #[test]
    fn clear_reports_prior_content() {
        let mut root = Node::empty();
        assert!(!root.clear(&[]));
        assert!(!root.clear(&k("a")));
        root.put(&k("a.b"), Value::from(1i64));
        assert!(root.clear(&k("a")));
        assert!(root.is_empty());
        root.put(&k("a"), Value::Null);
        assert!(root.clear(&[]));
        assert!(root.is_empty());
    }

    #[test]
    fn each_leaf_visits_full_paths() {
        let mut root = Node::empty();
        root.put(&k("a.b"), Value::from(0i64));
        root.put(&k("a.c"), Value::from(1i64));
        root.put(&k("d"), Value::from(2i64));
        let mut seen = Vec::new();
        root.each_leaf(&mut Vec::new(), &mut |path: &[String], v: &Value| {
            seen.push((path.join("."), v.clone()));
        });
        assert_eq!(
            seen,
            vec![
                ("a.b".to_string(), Value::from(0i64)),
                ("a.c".to_string(), Value::from(1i64)),
                ("d".to_string(), Value::from(2i64)),
            ]
        );
        assert_eq!(root.leaf_count(), 3);
    }

    #[test]
    fn leaf_never_equals_branch() {
        let mut branch = Node::empty();
        branch.put(&k("b"), Value::from("b"));
        assert_ne!(branch, Node::Leaf(Value::from("b")));
        assert_ne!(Node::empty(), Node::Leaf(Value::Null));
    }
}
