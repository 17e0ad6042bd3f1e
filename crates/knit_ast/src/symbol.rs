use oxc_index::IndexVec;

use crate::{Atom, Span};

oxc_index::define_index_type! {
  pub struct SymbolId = u32;
}

oxc_index::define_index_type! {
  pub struct ScopeId = u32;
}

oxc_index::define_index_type! {
  pub struct ImportRecordIdx = u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
  /// `var` declarations and function parameters
  Hoisted,
  HoistedFunction,
  /// `let` and catch parameters
  BlockScoped,
  Const,
  Class,
  /// Local name of a default or named import, or of a re-export specifier
  Import,
  /// `import * as ns` and `export * as ns from`
  Namespace,
  /// `exports` and `module` of a file wrapped in a CommonJS closure
  CjsExportShim,
  /// `require_foo` and `init_foo`
  Wrapper,
  /// Any other name the linker introduces, like `foo_exports` or `import_foo`
  Generated,
}

impl SymbolKind {
  pub fn is_import(self) -> bool {
    matches!(self, SymbolKind::Import | SymbolKind::Namespace)
  }

  pub fn is_const(self) -> bool {
    matches!(self, SymbolKind::Const)
  }
}

#[derive(Debug, Clone)]
pub struct SymbolDecl {
  pub name: Atom,
  pub kind: SymbolKind,
  pub scope: ScopeId,
  /// Location of the declaring identifier
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
  Module,
  Function,
  Block,
  Class,
  Catch,
}

#[derive(Debug, Clone)]
pub struct Scope {
  pub parent: Option<ScopeId>,
  pub kind: ScopeKind,
  pub children: Vec<ScopeId>,
  pub symbols: Vec<SymbolId>,
  /// A direct `eval(...)` call appears in this scope.
  pub has_direct_eval: bool,
}

/// Symbols and scopes of one file. Scope `0` is always the module scope.
#[derive(Debug, Clone)]
pub struct SymbolTable {
  pub symbols: IndexVec<SymbolId, SymbolDecl>,
  pub scopes: IndexVec<ScopeId, Scope>,
}

impl Default for SymbolTable {
  fn default() -> Self {
    Self::new()
  }
}

impl SymbolTable {
  pub fn new() -> Self {
    let mut scopes = IndexVec::new();
    scopes.push(Scope {
      parent: None,
      kind: ScopeKind::Module,
      children: vec![],
      symbols: vec![],
      has_direct_eval: false,
    });
    Self {
      symbols: IndexVec::new(),
      scopes,
    }
  }

  pub fn root_scope(&self) -> ScopeId {
    ScopeId::from_usize(0)
  }

  pub fn add_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
    let id = self.scopes.push(Scope {
      parent: Some(parent),
      kind,
      children: vec![],
      symbols: vec![],
      has_direct_eval: false,
    });
    self.scopes[parent].children.push(id);
    id
  }

  pub fn declare(
    &mut self,
    name: impl Into<Atom>,
    kind: SymbolKind,
    scope: ScopeId,
    span: Span,
  ) -> SymbolId {
    let id = self.symbols.push(SymbolDecl {
      name: name.into(),
      kind,
      scope,
      span,
    });
    self.scopes[scope].symbols.push(id);
    id
  }

  pub fn is_top_level(&self, symbol: SymbolId) -> bool {
    self.symbols[symbol].scope == self.root_scope()
  }

  pub fn name(&self, symbol: SymbolId) -> &Atom {
    &self.symbols[symbol].name
  }

  /// Finds a symbol named `name` declared in `scope` or any of its ancestors.
  pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
    self.ancestors(scope).find_map(|scope| {
      self.scopes[scope]
        .symbols
        .iter()
        .rev()
        .copied()
        .find(|id| self.symbols[*id].name.as_str() == name)
    })
  }

  /// `scope` itself first, then its parents up to the module scope.
  pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
    std::iter::successors(Some(scope), |scope| self.scopes[*scope].parent)
  }
}
