use derivative::Derivative;
use hashlink::LinkedHashMap;
use knit_ast::{
  ast::{Comment, Directive, Stmt},
  Atom, ImportRecordIdx, Span, SymbolId, SymbolKind, SymbolTable,
};
use knit_common::{EntryBits, ImportKind, ModuleId, ModuleIdx, SymbolRef};
use oxc_index::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
  classifier::{EsmReason, ExportsKind, WrapKind},
  make_legal,
  treeshake::{PartIdx, PartKind, StatementParts},
};

#[derive(Debug, Clone)]
pub struct ImportRecord {
  pub specifier: Atom,
  pub kind: ImportKind,
  pub span: Span,
  /// `None` when the specifier could not be resolved.
  pub resolved: Option<ModuleIdx>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Imported {
  Name(Atom),
  /// `import * as ns` and `export * as ns from`
  Star,
}

impl Imported {
  pub fn name(&self) -> &str {
    match self {
      Imported::Name(name) => name,
      Imported::Star => "*",
    }
  }
}

/// A local binding whose value comes from another module.
#[derive(Debug, Clone)]
pub struct NamedImport {
  pub record: ImportRecordIdx,
  pub imported: Imported,
  pub span: Span,
  /// Created for a `ns.name` read on `import * as ns`.
  pub is_ns_member: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct LocalExport {
  pub symbol: SymbolId,
  pub span: Span,
}

/// An exported name after `export *` has been walked.
#[derive(Debug, Clone)]
pub struct ResolvedExport {
  pub symbol: SymbolRef,
  /// Other symbols the same name was reached through via `export *`.
  pub potentially_ambiguous: Vec<SymbolRef>,
}

/// How an import that does not link to a declaration is read at run-time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
  /// `namespace.name`, where `namespace` is a CommonJS interop object or a namespace object that
  /// merged CommonJS or external sources.
  Property { namespace: SymbolRef, name: Atom },
  /// `void 0`
  Undefined,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteSite {
  pub symbol: SymbolId,
  pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct NamespaceCall {
  pub symbol: SymbolId,
  pub span: Span,
  pub is_construct: bool,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct NormalModule {
  pub idx: ModuleIdx,
  pub id: ModuleId,
  /// execution order
  pub exec_order: usize,
  pub is_user_entry: bool,
  /// is imported dynamically while code splitting is on
  pub is_dynamic_entry: bool,
  pub is_injected: bool,
  /// `false` when the package declares `"sideEffects": false`
  pub module_side_effects: bool,

  pub hashbang: Option<Atom>,
  pub directives: Vec<Directive>,
  pub legal_comments: Vec<Comment>,
  #[derivative(Debug = "ignore")]
  pub body: Vec<Stmt>,
  #[derivative(Debug = "ignore")]
  pub symbols: SymbolTable,
  pub import_records: IndexVec<ImportRecordIdx, ImportRecord>,

  // -- Classification
  pub exports_kind: ExportsKind,
  pub esm_reason: Option<EsmReason>,
  pub wrap_kind: WrapKind,
  pub top_level_returns: Vec<Span>,
  pub top_level_this: Vec<Span>,
  /// Import records of `export * from` statements, in source order.
  pub star_export_records: Vec<ImportRecordIdx>,

  // -- Scanning
  pub named_imports: LinkedHashMap<SymbolId, NamedImport>,
  /// Only local exports like `export const a = 1` and `export { a } from './a'`. `export *` is
  /// resolved by the linker.
  pub local_exports: LinkedHashMap<Atom, LocalExport>,
  pub parts: StatementParts,
  pub namespace_symbol: SymbolId,
  pub namespace_part: PartIdx,
  pub wrapper_symbol: Option<SymbolId>,
  pub wrapper_part: Option<PartIdx>,
  /// Spans of `await` and `for await` that survive dead-branch elimination.
  pub live_top_level_awaits: Vec<Span>,
  pub no_side_effects_fns: FxHashSet<SymbolId>,
  pub write_sites: Vec<WriteSite>,
  pub namespace_calls: Vec<NamespaceCall>,
  /// Names assigned through `exports.a =` or `module.exports.a =` when that is the only way the
  /// file touches `exports` and `module`.
  pub cjs_static_exports: Option<FxHashSet<Atom>>,

  // -- Linking
  pub resolved_exports: LinkedHashMap<Atom, ResolvedExport>,
  pub import_bindings: FxHashMap<SymbolId, ImportBinding>,
  /// `import_foo` for every import record whose target is CommonJS.
  pub interop_symbols: FxHashMap<ImportRecordIdx, SymbolId>,
  /// The lazy initializer of this module awaits a top-level await.
  pub is_async_init: bool,

  // -- Tree shaking
  pub entry_bits: EntryBits,
}

impl NormalModule {
  pub fn new(idx: ModuleIdx, id: ModuleId, symbols: SymbolTable) -> Self {
    Self {
      idx,
      id,
      exec_order: usize::MAX,
      is_user_entry: false,
      is_dynamic_entry: false,
      is_injected: false,
      module_side_effects: true,
      hashbang: None,
      directives: vec![],
      legal_comments: vec![],
      body: vec![],
      symbols,
      import_records: IndexVec::new(),
      exports_kind: ExportsKind::None,
      esm_reason: None,
      wrap_kind: WrapKind::None,
      top_level_returns: vec![],
      top_level_this: vec![],
      star_export_records: vec![],
      named_imports: LinkedHashMap::default(),
      local_exports: LinkedHashMap::default(),
      parts: StatementParts::default(),
      namespace_symbol: SymbolId::from_usize(0),
      namespace_part: PartIdx::from_usize(0),
      wrapper_symbol: None,
      wrapper_part: None,
      live_top_level_awaits: vec![],
      no_side_effects_fns: FxHashSet::default(),
      write_sites: vec![],
      namespace_calls: vec![],
      cjs_static_exports: None,
      resolved_exports: LinkedHashMap::default(),
      import_bindings: FxHashMap::default(),
      interop_symbols: FxHashMap::default(),
      is_async_init: false,
      entry_bits: EntryBits::default(),
    }
  }

  pub fn is_entry(&self) -> bool {
    self.is_user_entry || self.is_dynamic_entry
  }

  /// `foo` for `/src/foo.js`, escaped into a legal identifier.
  pub fn legal_stem(&self) -> String {
    make_legal(self.id.stem())
  }

  /// Declares a top-level symbol the linker introduces. Its name is only a hint; the renamer
  /// deconflicts it like every other top-level name.
  pub fn create_top_level_symbol(&mut self, name: impl Into<Atom>, kind: SymbolKind) -> SymbolId {
    let scope = self.symbols.root_scope();
    self.symbols.declare(name, kind, scope, knit_ast::Span::DUMMY)
  }

  pub fn symbol_ref(&self, symbol: SymbolId) -> SymbolRef {
    SymbolRef::new(self.idx, symbol)
  }

  /// The module targeted by `record`, if it was resolved.
  pub fn importee_of(&self, record: ImportRecordIdx) -> Option<ModuleIdx> {
    self.import_records[record].resolved
  }

  /// Every module this one imports statically or requires, in source order.
  pub fn dependencies(&self) -> impl Iterator<Item = ModuleIdx> + '_ {
    self
      .import_records
      .iter()
      .filter(|record| !matches!(record.kind, ImportKind::DynamicImport))
      .filter_map(|record| record.resolved)
  }

  pub fn dynamic_dependencies(&self) -> impl Iterator<Item = ModuleIdx> + '_ {
    self
      .import_records
      .iter()
      .filter(|record| matches!(record.kind, ImportKind::DynamicImport))
      .filter_map(|record| record.resolved)
  }

  /// The statements behind `parts`, in source order.
  pub fn stmts_of_parts<'a>(&'a self, parts: &'a [PartIdx]) -> impl Iterator<Item = &'a Stmt> + 'a {
    parts.iter().filter_map(|part| match self.parts[*part].kind {
      PartKind::Stmt(stmt) => Some(&self.body[stmt]),
      PartKind::Namespace | PartKind::Wrapper => None,
    })
  }

  /// Whether any part of this module ended up in an output chunk.
  pub fn is_included(&self) -> bool {
    !self.entry_bits.is_empty()
  }
}
