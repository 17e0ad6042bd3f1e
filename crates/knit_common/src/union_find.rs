use std::{fmt::Debug, hash::Hash};

use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnaKey(u32);

/// The key a class resolves to, when one of its members was linked as the canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonical(Option<EnaKey>);

impl UnifyValue for Canonical {
  type Error = NoError;

  fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
    Ok(Canonical(a.0.or(b.0)))
  }
}

impl UnifyKey for EnaKey {
  type Value = Canonical;

  fn index(&self) -> u32 {
    self.0
  }

  fn from_index(u: u32) -> Self {
    EnaKey(u)
  }

  fn tag() -> &'static str {
    "EnaKey"
  }
}

/// Groups keys that denote the same binding. Built single-threaded while linking, then frozen.
#[derive(Debug)]
pub struct UnionFind<Key: Eq + Hash + Clone + Debug> {
  store: InPlaceUnificationTable<EnaKey>,
  store_key_to_key: Vec<Key>,
  key_to_store_key: FxHashMap<Key, EnaKey>,
}

impl<Key: Eq + Hash + Clone + Debug> Default for UnionFind<Key> {
  fn default() -> Self {
    Self {
      store: InPlaceUnificationTable::new(),
      store_key_to_key: Vec::new(),
      key_to_store_key: FxHashMap::default(),
    }
  }
}

impl<Key: Eq + Hash + Clone + Debug> UnionFind<Key> {
  fn intern_key(&mut self, key: &Key) -> EnaKey {
    if let Some(ena_key) = self.key_to_store_key.get(key) {
      return *ena_key;
    }
    let ena_key = self.store.new_key(Canonical(None));
    self.store_key_to_key.push(key.clone());
    self.key_to_store_key.insert(key.clone(), ena_key);
    ena_key
  }

  pub fn union(&mut self, key1: &Key, key2: &Key) -> &mut Self {
    let k1 = self.intern_key(key1);
    let k2 = self.intern_key(key2);
    self.store.union(k1, k2);
    self
  }

  /// Links `alias` to `canonical`. Unless another member of the class was linked as canonical
  /// first, the class resolves to `canonical`.
  pub fn link(&mut self, alias: &Key, canonical: &Key) -> &mut Self {
    let k2 = self.intern_key(canonical);
    self.store.union_value(k2, Canonical(Some(k2)));
    let k1 = self.intern_key(alias);
    self.store.union(k1, k2);
    self
  }

  pub fn unioned(&mut self, key1: &Key, key2: &Key) -> bool {
    let k1 = self.intern_key(key1);
    let k2 = self.intern_key(key2);
    self.store.unioned(k1, k2)
  }

  pub fn find_root(&mut self, key: &Key) -> Key {
    let Some(ena_key) = self.key_to_store_key.get(key).copied() else {
      return key.clone();
    };
    let root = match self.store.probe_value(ena_key) {
      Canonical(Some(canonical)) => canonical,
      Canonical(None) => self.store.find(ena_key),
    };
    self.store_key_to_key[root.0 as usize].clone()
  }

  /// Resolves every known key once. The result can be shared across threads.
  pub fn freeze(mut self) -> FrozenUnionFind<Key> {
    let keys = self.store_key_to_key.clone();
    let root_of = keys
      .into_iter()
      .filter_map(|key| {
        let root = self.find_root(&key);
        (root != key).then_some((key, root))
      })
      .collect();
    FrozenUnionFind { root_of }
  }
}

#[derive(Debug)]
pub struct FrozenUnionFind<Key: Eq + Hash + Clone + Debug> {
  root_of: FxHashMap<Key, Key>,
}

impl<Key: Eq + Hash + Clone + Debug> Default for FrozenUnionFind<Key> {
  fn default() -> Self {
    Self {
      root_of: FxHashMap::default(),
    }
  }
}

impl<Key: Eq + Hash + Clone + Debug> FrozenUnionFind<Key> {
  pub fn find_root<'a>(&'a self, key: &'a Key) -> &'a Key {
    self.root_of.get(key).unwrap_or(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_key_wins_regardless_of_rank() {
    let mut uf = UnionFind::<&str>::default();
    uf.union(&"a", &"b");
    uf.union(&"c", &"b");
    uf.link(&"b", &"decl");
    assert_eq!(uf.find_root(&"a"), "decl");
    assert_eq!(uf.find_root(&"c"), "decl");
    assert!(uf.unioned(&"a", &"c"));
    assert_eq!(uf.find_root(&"unknown"), "unknown");

    let frozen = uf.freeze();
    assert_eq!(*frozen.find_root(&"a"), "decl");
    assert_eq!(*frozen.find_root(&"decl"), "decl");
  }
}
