//! An insertion-ordered key store with dotted-path navigation.

use indexmap::IndexMap;

const SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq)]
enum Node<V> {
  Leaf(V),
  Branch(IndexMap<String, Node<V>>),
}

/// An ordered mapping from string keys to values.
///
/// Keys can be addressed two ways. The exact API (`get`, `insert`, `remove`,
/// ...) treats a key as an opaque string, dots included. The path API
/// (`get_path`, `set_path`, ...) splits a key on `.` and walks nested
/// branches, reading a missing segment as absent rather than failing.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStore<V> {
  root: IndexMap<String, Node<V>>,
}

impl<V> Default for KeyStore<V> {
  fn default() -> Self {
    Self {
      root: IndexMap::new(),
    }
  }
}

impl<V> KeyStore<V> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.root.len()
  }

  pub fn is_empty(&self) -> bool {
    self.root.is_empty()
  }

  pub fn clear(&mut self) {
    self.root.clear();
  }

  // --- Exact keys ---

  pub fn contains(&self, key: &str) -> bool {
    self.root.contains_key(key)
  }

  /// Returns the leaf stored directly under `key`.
  pub fn get(&self, key: &str) -> Option<&V> {
    match self.root.get(key)? {
      Node::Leaf(value) => Some(value),
      Node::Branch(_) => None,
    }
  }

  pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
    match self.root.get_mut(key)? {
      Node::Leaf(value) => Some(value),
      Node::Branch(_) => None,
    }
  }

  /// Stores `value` under `key`, keeping the key's position if it existed.
  /// Returns the previous leaf, if any.
  pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
    match self.root.insert(key.into(), Node::Leaf(value))? {
      Node::Leaf(previous) => Some(previous),
      Node::Branch(_) => None,
    }
  }

  /// Removes `key`, preserving the order of the remaining keys.
  pub fn remove(&mut self, key: &str) -> Option<V> {
    match self.root.shift_remove(key)? {
      Node::Leaf(value) => Some(value),
      Node::Branch(_) => None,
    }
  }

  /// Top-level keys in storage order.
  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.root.keys().map(String::as_str)
  }

  /// Top-level leaves in storage order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
    self.root.iter().filter_map(|(k, node)| match node {
      Node::Leaf(v) => Some((k.as_str(), v)),
      Node::Branch(_) => None,
    })
  }

  // --- Dotted paths ---

  pub fn get_path(&self, path: &str) -> Option<&V> {
    match self.node_at(path)? {
      Node::Leaf(value) => Some(value),
      Node::Branch(_) => None,
    }
  }

  /// True if `path` leads to a leaf or a branch.
  pub fn has_path(&self, path: &str) -> bool {
    self.node_at(path).is_some()
  }

  /// Stores `value` at `path`, creating intermediate branches. A leaf found
  /// where a branch is needed is replaced.
  pub fn set_path(&mut self, path: &str, value: V) {
    let mut segments: Vec<&str> = path.split(SEPARATOR).collect();
    let last = segments.pop().unwrap_or_default();

    let mut map = &mut self.root;
    for segment in segments {
      let node = map
        .entry(segment.to_owned())
        .or_insert_with(|| Node::Branch(IndexMap::new()));
      map = match node {
        Node::Branch(children) => children,
        leaf => {
          *leaf = Node::Branch(IndexMap::new());
          match leaf {
            Node::Branch(children) => children,
            Node::Leaf(_) => return,
          }
        }
      };
    }
    map.insert(last.to_owned(), Node::Leaf(value));
  }

  /// Removes whatever sits at `path`. Missing intermediate segments make this
  /// a no-op.
  pub fn remove_path(&mut self, path: &str) {
    let mut segments: Vec<&str> = path.split(SEPARATOR).collect();
    let last = segments.pop().unwrap_or_default();

    let mut map = &mut self.root;
    for segment in segments {
      map = match map.get_mut(segment) {
        Some(Node::Branch(children)) => children,
        _ => return,
      };
    }
    map.shift_remove(last);
  }

  /// All leaves flattened to `(dotted.path, value)` pairs, depth first in
  /// storage order.
  pub fn leaves(&self) -> Vec<(String, &V)> {
    let mut out = Vec::new();
    collect_leaves(&self.root, String::new(), &mut out);
    out
  }

  fn node_at(&self, path: &str) -> Option<&Node<V>> {
    let mut segments = path.split(SEPARATOR);
    let first = segments.next()?;
    let mut node = self.root.get(first)?;
    for segment in segments {
      node = match node {
        Node::Branch(children) => children.get(segment)?,
        Node::Leaf(_) => return None,
      };
    }
    Some(node)
  }
}

fn collect_leaves<'a, V>(
  map: &'a IndexMap<String, Node<V>>,
  prefix: String,
  out: &mut Vec<(String, &'a V)>,
) {
  for (key, node) in map {
    let path = if prefix.is_empty() {
      key.clone()
    } else {
      format!("{}{}{}", prefix, SEPARATOR, key)
    };
    match node {
      Node::Leaf(value) => out.push((path, value)),
      Node::Branch(children) => collect_leaves(children, path, out),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn exact_keys_keep_insertion_order() {
    let mut store = KeyStore::new();
    store.insert("b", 2);
    store.insert("a", 1);
    store.insert("c.d", 3);
    store.insert("b", 20);

    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["b", "a", "c.d"]);
    assert_eq!(store.get("b"), Some(&20));
    assert_eq!(store.get("c.d"), Some(&3));
    assert_eq!(store.get_path("c.d"), None);

    assert_eq!(store.remove("b"), Some(20));
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "c.d"]);
    assert_eq!(store.remove("missing"), None);
  }

  #[test]
  fn dotted_paths_create_and_read_branches() {
    let mut store = KeyStore::new();
    store.set_path("db.primary.host", "localhost");
    store.set_path("db.primary.port", "5432");
    store.set_path("name", "app");

    assert_eq!(store.get_path("db.primary.host"), Some(&"localhost"));
    assert!(store.has_path("db.primary"));
    assert!(store.has_path("db"));
    assert_eq!(store.get_path("db.primary"), None);
    assert_eq!(store.get_path("db.replica.host"), None);
    assert!(!store.has_path("db.replica.host"));
    assert!(!store.has_path("name.first"));
    assert_eq!(store.get("db"), None);
  }

  #[test]
  fn set_path_replaces_a_leaf_in_the_way() {
    let mut store = KeyStore::new();
    store.set_path("a", 1);
    store.set_path("a.b", 2);
    assert_eq!(store.get_path("a.b"), Some(&2));
    assert_eq!(store.get("a"), None);
  }

  #[test]
  fn remove_path_ignores_missing_segments() {
    let mut store = KeyStore::new();
    store.set_path("a.b.c", 1);
    store.set_path("a.b.d", 2);

    store.remove_path("a.x.c");
    store.remove_path("a.b.c");
    assert!(!store.has_path("a.b.c"));
    assert_eq!(store.get_path("a.b.d"), Some(&2));

    store.remove_path("a");
    assert!(store.is_empty());
  }

  #[test]
  fn leaves_are_flattened_in_order() {
    let mut store = KeyStore::new();
    store.set_path("z", 0);
    store.set_path("db.host", 1);
    store.set_path("db.port", 2);
    store.set_path("cache.ttl", 3);

    let leaves: Vec<(String, i32)> = store.leaves().into_iter().map(|(k, v)| (k, *v)).collect();
    assert_eq!(
      leaves,
      vec![
        ("z".to_owned(), 0),
        ("db.host".to_owned(), 1),
        ("db.port".to_owned(), 2),
        ("cache.ttl".to_owned(), 3),
      ]
    );
  }
}
