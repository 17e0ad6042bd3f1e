use knit_ast::{
  ast::*,
  visit_mut::{walk_mut_class, walk_mut_expr, walk_mut_stmt, VisitMut},
  ScopeId, SymbolId, SymbolTable,
};
use rustc_hash::FxHashSet;

/// Binds references to the declarations the parser recorded. Declarations are known up front, so
/// a reference can resolve to a function declared further down, or to a `var` in an outer
/// function.
pub(super) struct Resolver<'a> {
  symbols: &'a mut SymbolTable,
  hidden: &'a FxHashSet<SymbolId>,
  scope: ScopeId,
}

impl<'a> Resolver<'a> {
  pub(super) fn new(symbols: &'a mut SymbolTable, hidden: &'a FxHashSet<SymbolId>) -> Self {
    Self {
      scope: symbols.root_scope(),
      symbols,
      hidden,
    }
  }

  fn with_scope(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self)) {
    let parent = std::mem::replace(&mut self.scope, scope);
    f(self);
    self.scope = parent;
  }

  fn lookup(&self, name: &str) -> Option<SymbolId> {
    self.symbols.ancestors(self.scope).find_map(|scope| {
      self.symbols.scopes[scope].symbols.iter().copied().find(|symbol| {
        !self.hidden.contains(symbol) && self.symbols.symbols[*symbol].name.as_str() == name
      })
    })
  }

  fn resolve(&self, ident: &mut Ident) {
    if ident.symbol.is_none() {
      ident.symbol = self.lookup(&ident.name);
    }
  }
}

impl<'a> VisitMut for Resolver<'a> {
  fn visit_mut_stmt(&mut self, stmt: &mut Stmt) {
    let scope = match stmt {
      Stmt::For(s) => Some(s.scope),
      Stmt::ForInOf(s) => Some(s.scope),
      Stmt::Switch(s) => Some(s.scope),
      _ => None,
    };
    match scope {
      Some(scope) => self.with_scope(scope, |v| walk_mut_stmt(v, stmt)),
      None => walk_mut_stmt(self, stmt),
    }
  }

  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    if let Expr::Call(call) = expr {
      if let Expr::Ident(callee) = &*call.callee {
        if callee.name.as_str() == "eval" && self.lookup("eval").is_none() {
          self.symbols.scopes[self.scope].has_direct_eval = true;
        }
      }
    }
    walk_mut_expr(self, expr)
  }

  fn visit_mut_ident(&mut self, ident: &mut Ident) {
    self.resolve(ident)
  }

  // Identifiers inside destructuring assignments are references too.
  fn visit_mut_binding_ident(&mut self, ident: &mut Ident) {
    self.resolve(ident)
  }

  fn visit_mut_function(&mut self, function: &mut Function) {
    // Parameter defaults see the other parameters.
    self.with_scope(function.scope, |v| {
      function.params.iter_mut().for_each(|param| v.visit_mut_pat(param));
      v.visit_mut_stmts(&mut function.body);
    });
  }

  fn visit_mut_arrow(&mut self, arrow: &mut ArrowExpr) {
    self.with_scope(arrow.scope, |v| {
      arrow.params.iter_mut().for_each(|param| v.visit_mut_pat(param));
      match &mut arrow.body {
        ArrowBody::Block(stmts) => v.visit_mut_stmts(stmts),
        ArrowBody::Expr(expr) => v.visit_mut_expr(expr),
      }
    });
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    self.with_scope(class.scope, |v| walk_mut_class(v, class));
  }

  fn visit_mut_block(&mut self, stmts: &mut Vec<Stmt>, scope: ScopeId) {
    self.with_scope(scope, |v| v.visit_mut_stmts(stmts));
  }
}
