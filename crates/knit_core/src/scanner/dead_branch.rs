use knit_ast::{
  ast::*,
  visit::Visit,
  visit_mut::{walk_mut_expr, walk_mut_stmt, walk_mut_stmts, VisitMut},
  Span,
};

/// Drops the statically dead side of `if` statements and `?:` expressions. `var` declarations of a
/// dropped branch survive as bare `var` declarations.
#[derive(Default)]
pub(crate) struct DeadBranchEliminator;

impl DeadBranchEliminator {
  /// Returns the live branch followed by the hoisted `var`s of the dead one.
  fn eliminate(stmt: Stmt) -> Vec<Stmt> {
    let Stmt::If(if_stmt) = stmt else {
      return vec![stmt];
    };
    let Some(truthy) = if_stmt.test.known_truthiness() else {
      return vec![Stmt::If(if_stmt)];
    };
    let IfStmt { cons, alt, .. } = if_stmt;
    let (live, dead) = if truthy { (Some(cons), alt) } else { (alt, Some(cons)) };
    let mut out = vec![];
    if let Some(live) = live {
      out.push(*live);
    }
    if let Some(hoisted) = dead.and_then(|dead| hoisted_vars(&dead)) {
      out.push(hoisted);
    }
    out
  }
}

impl VisitMut for DeadBranchEliminator {
  fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
    walk_mut_stmts(self, stmts);
    let has_known_branch = stmts
      .iter()
      .any(|stmt| matches!(stmt, Stmt::If(s) if s.test.known_truthiness().is_some()));
    if !has_known_branch {
      return;
    }
    *stmts = std::mem::take(stmts)
      .into_iter()
      .flat_map(Self::eliminate)
      .collect();
  }

  fn visit_mut_stmt(&mut self, stmt: &mut Stmt) {
    walk_mut_stmt(self, stmt);
    // Statement lists are handled by `visit_mut_stmts`. This covers `if (a) if (true) ...`.
    let replacement = match stmt {
      Stmt::If(if_stmt) => {
        let Some(truthy) = if_stmt.test.known_truthiness() else {
          return;
        };
        let dead = if truthy { if_stmt.alt.as_deref() } else { Some(&*if_stmt.cons) };
        if dead.and_then(hoisted_vars).is_some() {
          return;
        }
        let span = if_stmt.span;
        let live = if truthy {
          Some(std::mem::replace(&mut *if_stmt.cons, Stmt::Empty(Span::DUMMY)))
        } else {
          if_stmt.alt.take().map(|alt| *alt)
        };
        live.unwrap_or(Stmt::Empty(span))
      }
      _ => return,
    };
    *stmt = replacement;
  }

  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    walk_mut_expr(self, expr);
    let live = match expr {
      Expr::Cond(cond) => match cond.test.known_truthiness() {
        Some(true) => std::mem::replace(&mut *cond.cons, Expr::void_0()),
        Some(false) => std::mem::replace(&mut *cond.alt, Expr::void_0()),
        None => return,
      },
      _ => return,
    };
    *expr = live;
  }
}

#[derive(Default)]
struct VarCollector {
  idents: Vec<Ident>,
}

impl Visit for VarCollector {
  fn visit_var_decl(&mut self, decl: &VarDecl) {
    if decl.kind == VarKind::Var {
      for declarator in &decl.decls {
        declarator
          .name
          .for_each_ident(&mut |ident| self.idents.push(ident.clone()));
      }
    }
  }

  fn visit_function(&mut self, _function: &Function) {}

  fn visit_arrow(&mut self, _arrow: &ArrowExpr) {}

  fn visit_class(&mut self, _class: &Class) {}

  fn visit_expr(&mut self, _expr: &Expr) {}
}

fn hoisted_vars(dead: &Stmt) -> Option<Stmt> {
  let mut collector = VarCollector::default();
  collector.visit_stmt(dead);
  if collector.idents.is_empty() {
    return None;
  }
  Some(Stmt::Var(VarDecl {
    kind: VarKind::Var,
    decls: collector
      .idents
      .into_iter()
      .map(|ident| VarDeclarator {
        name: Pat::Ident(ident),
        init: None,
        span: Span::DUMMY,
      })
      .collect(),
    span: dead.span(),
  }))
}

#[cfg(test)]
mod tests {
  use knit_ast::SymbolId;

  use super::*;

  fn call(name: &str) -> Stmt {
    Stmt::expr(Expr::call(Expr::Ident(Ident::unbound(name)), vec![]))
  }

  #[test]
  fn keeps_vars_of_dead_branch() {
    let x = Ident::new("x", Some(SymbolId::from_usize(0)), Span::DUMMY);
    let mut body = vec![Stmt::If(IfStmt {
      test: Expr::Lit(Lit::bool(false)),
      cons: Box::new(Stmt::Var(VarDecl::single(
        VarKind::Var,
        x.clone(),
        Some(Expr::Lit(Lit::num(1.0))),
      ))),
      alt: Some(Box::new(call("live"))),
      span: Span::DUMMY,
    })];
    DeadBranchEliminator.visit_mut_stmts(&mut body);
    assert_eq!(body.len(), 2);
    assert_eq!(body[0], call("live"));
    let Stmt::Var(hoisted) = &body[1] else {
      panic!("expected a var declaration");
    };
    assert_eq!(hoisted.decls[0].name, Pat::Ident(x));
    assert!(hoisted.decls[0].init.is_none());
  }

  #[test]
  fn conditional_keeps_live_side() {
    let mut expr = Expr::Cond(CondExpr {
      test: Box::new(Expr::Lit(Lit::str("yes"))),
      cons: Box::new(Expr::Lit(Lit::num(1.0))),
      alt: Box::new(Expr::Lit(Lit::num(2.0))),
      span: Span::DUMMY,
    });
    DeadBranchEliminator.visit_mut_expr(&mut expr);
    assert_eq!(expr, Expr::Lit(Lit::num(1.0)));
  }
}
