use knit_ast::{
  ast::*,
  visit_mut::{walk_mut_expr, walk_mut_stmts, VisitMut},
  Atom, ImportRecordIdx, SymbolId, SymbolKind, SymbolTable,
};
use rustc_hash::FxHashMap;

use crate::{
  make_legal,
  normal_module::{Imported, NamedImport},
};

/// Rewrites reads of `ns.name` on `import * as ns` into references to a generated import of
/// `name`, so the linker binds them like named imports and unused members stay shakeable.
pub(crate) struct NamespaceMemberRewriter<'a> {
  /// namespace symbol -> its import record
  pub(crate) namespaces: FxHashMap<SymbolId, ImportRecordIdx>,
  pub(crate) symbols: &'a mut SymbolTable,
  created: FxHashMap<(SymbolId, Atom), SymbolId>,
  pub(crate) new_imports: Vec<(SymbolId, NamedImport)>,
}

impl<'a> NamespaceMemberRewriter<'a> {
  pub(crate) fn new(
    namespaces: FxHashMap<SymbolId, ImportRecordIdx>,
    symbols: &'a mut SymbolTable,
  ) -> Self {
    Self {
      namespaces,
      symbols,
      created: FxHashMap::default(),
      new_imports: vec![],
    }
  }

  pub(crate) fn rewrite(mut self, body: &mut Vec<Stmt>) -> Vec<(SymbolId, NamedImport)> {
    if !self.namespaces.is_empty() {
      walk_mut_stmts(&mut self, body);
    }
    self.new_imports
  }

  fn namespace_member<'e>(&self, expr: &'e Expr) -> Option<(SymbolId, &'e Atom)> {
    let Expr::Member(member) = expr else {
      return None;
    };
    let Expr::Ident(Ident {
      symbol: Some(ns), ..
    }) = &*member.object
    else {
      return None;
    };
    if !self.namespaces.contains_key(ns) {
      return None;
    }
    member.static_prop().map(|name| (*ns, name))
  }

  fn member_symbol(&mut self, ns: SymbolId, name: &Atom, expr: &Expr) -> SymbolId {
    if let Some(symbol) = self.created.get(&(ns, name.clone())) {
      return *symbol;
    }
    let root = self.symbols.root_scope();
    let symbol = self
      .symbols
      .declare(make_legal(name), SymbolKind::Import, root, expr.span());
    self.created.insert((ns, name.clone()), symbol);
    self.new_imports.push((
      symbol,
      NamedImport {
        record: self.namespaces[&ns],
        imported: Imported::Name(name.clone()),
        span: expr.span(),
        is_ns_member: true,
      },
    ));
    symbol
  }

  /// Destructuring targets are written, not read.
  fn visit_mut_write_pat(&mut self, pat: &mut Pat) {
    match pat {
      Pat::Ident(_) => {}
      Pat::Array(arr) => {
        arr
          .elems
          .iter_mut()
          .flatten()
          .for_each(|p| self.visit_mut_write_pat(p));
        if let Some(rest) = &mut arr.rest {
          self.visit_mut_write_pat(rest);
        }
      }
      Pat::Object(obj) => {
        for prop in &mut obj.props {
          self.visit_mut_prop_key(&mut prop.key);
          self.visit_mut_write_pat(&mut prop.value);
        }
        if let Some(rest) = &mut obj.rest {
          self.visit_mut_write_pat(rest);
        }
      }
      Pat::Assign(assign) => {
        self.visit_mut_write_pat(&mut assign.left);
        self.visit_mut_expr(&mut assign.right);
      }
      Pat::Expr(expr) => {
        if self.namespace_member(expr).is_none() {
          self.visit_mut_expr(expr);
        }
      }
    }
  }
}

impl<'a> VisitMut for NamespaceMemberRewriter<'a> {
  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    match expr {
      Expr::Update(UpdateExpr { arg, .. })
      | Expr::Unary(UnaryExpr {
        op: UnaryOp::Delete,
        arg,
        ..
      }) if self.namespace_member(arg).is_some() => {}
      _ => {
        if let Some((ns, name)) = self.namespace_member(expr) {
          let name = name.clone();
          let symbol = self.member_symbol(ns, &name, expr);
          let span = expr.span();
          *expr = Expr::Ident(Ident::new(make_legal(&name), Some(symbol), span));
        } else {
          walk_mut_expr(self, expr);
        }
      }
    }
  }

  fn visit_mut_assign_target(&mut self, target: &mut AssignTarget) {
    match target {
      AssignTarget::Ident(_) => {}
      AssignTarget::Member(member) => {
        self.visit_mut_expr(&mut member.object);
        self.visit_mut_member_prop(&mut member.prop);
      }
      AssignTarget::Pat(pat) => self.visit_mut_write_pat(pat),
    }
  }
}
