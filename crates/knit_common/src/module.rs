use std::path::Path;

use knit_ast::{ast::Program, Atom, ImportRecordIdx, Span, SymbolTable};
use oxc_index::IndexVec;

use crate::ModuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
  /// `import ... from`, `export ... from` and `export * from`
  Static,
  /// `require("...")`
  Require,
  /// `import("...")`
  DynamicImport,
}

impl ImportKind {
  pub fn is_static(&self) -> bool {
    matches!(self, ImportKind::Static)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
  pub id: ModuleId,
  pub external: bool,
}

/// One import site as the parser saw it.
#[derive(Debug, Clone)]
pub struct RawImportRecord {
  pub specifier: Atom,
  pub kind: ImportKind,
  pub span: Span,
  /// `None` when the resolver could not find the specifier.
  pub resolved: Option<ResolvedId>,
}

/// Everything the parser hands over for one file.
#[derive(Debug, Clone)]
pub struct ParsedModule {
  pub id: ModuleId,
  pub program: Program,
  pub symbols: SymbolTable,
  pub import_records: IndexVec<ImportRecordIdx, RawImportRecord>,
  /// `false` when the file's package declares `"sideEffects": false`.
  pub module_side_effects: bool,
}

/// Source of parsed modules for a build: the parser, the resolver and the file system sit behind
/// this trait.
pub trait ModuleProvider: Send + Sync {
  /// Resolves an entry or injected specifier.
  fn resolve_entry(&self, specifier: &str) -> Option<ResolvedId>;

  fn load(&self, id: &ModuleId) -> knit_error::Result<ParsedModule>;

  /// Used to suggest fixes for unresolved imports.
  fn file_exists(&self, _path: &Path) -> bool {
    false
  }
}
