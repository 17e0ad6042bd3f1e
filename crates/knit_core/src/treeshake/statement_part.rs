use hashlink::LinkedHashMap;
use knit_ast::{Atom, ImportRecordIdx, SymbolId};
use knit_common::EntryBits;
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

oxc_index::define_index_type! {
  pub struct PartIdx = u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
  /// The top-level statement at this index of the module body
  Stmt(usize),
  /// `var foo_exports = {}; __export(foo_exports, {...})`
  Namespace,
  /// `var require_foo = __commonJS(...)` or `var init_foo = __esm(...)`
  Wrapper,
}

#[derive(Debug, Clone)]
pub struct StatementPart {
  pub kind: PartKind,
  pub declared: Vec<SymbolId>,
  /// Top-level symbols this part reads, writes or calls, with their use counts, in first-use order.
  pub referenced: LinkedHashMap<SymbolId, u32>,
  /// Top-level bindings this part assigns to.
  pub written: Vec<SymbolId>,
  /// Globals this part refers to.
  pub unbound: Vec<Atom>,
  pub import_records: Vec<ImportRecordIdx>,
  pub side_effects: bool,
  /// Entries that include this part. Empty for parts that were shaken away.
  pub entry_bits: EntryBits,
}

impl StatementPart {
  pub fn new(kind: PartKind) -> Self {
    Self {
      kind,
      declared: vec![],
      referenced: LinkedHashMap::default(),
      written: vec![],
      unbound: vec![],
      import_records: vec![],
      side_effects: false,
      entry_bits: EntryBits::default(),
    }
  }

  pub fn add_reference(&mut self, symbol: SymbolId) {
    *self.referenced.entry(symbol).or_insert(0) += 1;
  }

  pub fn is_included(&self) -> bool {
    !self.entry_bits.is_empty()
  }
}

#[derive(Debug, Default, Clone)]
pub struct StatementParts {
  pub parts: IndexVec<PartIdx, StatementPart>,
  /// A symbol could be declared by several statements.
  /// ```js
  /// var baz = '1';
  /// var baz = '2';
  /// ```
  pub declared_in: FxHashMap<SymbolId, Vec<PartIdx>>,
}

impl StatementParts {
  pub fn add(&mut self, part: StatementPart) -> PartIdx {
    let idx = self.parts.next_idx();
    part.declared.iter().for_each(|symbol| {
      self.declared_in.entry(*symbol).or_default().push(idx);
    });
    self.parts.push(part);
    idx
  }

  /// Makes `part` the declaration of a symbol the linker introduced.
  pub fn declare_symbol(&mut self, part: PartIdx, symbol: SymbolId) {
    self.parts[part].declared.push(symbol);
    self.declared_in.entry(symbol).or_default().push(part);
  }

  pub fn find_parts_where_symbol_declared(&self, symbol: SymbolId) -> &[PartIdx] {
    self
      .declared_in
      .get(&symbol)
      .map_or(&[], |parts| parts.as_slice())
  }

  pub fn iter_enumerated(&self) -> impl Iterator<Item = (PartIdx, &StatementPart)> {
    self.parts.iter_enumerated()
  }
}

impl std::ops::Index<PartIdx> for StatementParts {
  type Output = StatementPart;

  fn index(&self, index: PartIdx) -> &Self::Output {
    &self.parts[index]
  }
}

impl std::ops::IndexMut<PartIdx> for StatementParts {
  fn index_mut(&mut self, index: PartIdx) -> &mut Self::Output {
    &mut self.parts[index]
  }
}
