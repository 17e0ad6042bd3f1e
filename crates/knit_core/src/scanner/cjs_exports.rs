use knit_ast::{
  ast::*,
  visit::{walk_expr, Visit},
  Atom,
};
use rustc_hash::FxHashSet;

/// Collects `exports.a = ...` and `module.exports.a = ...`. Any other use of the free `exports` or
/// `module` makes the export shape dynamic.
#[derive(Default)]
struct StaticExportsCollector {
  names: FxHashSet<Atom>,
  is_dynamic: bool,
}

fn is_free(expr: &Expr, name: &str) -> bool {
  matches!(expr, Expr::Ident(Ident { name: n, symbol: None, .. }) if n.as_str() == name)
}

/// `exports` or `module.exports`
fn is_exports_object(expr: &Expr) -> bool {
  match expr {
    Expr::Member(member) => {
      is_free(&member.object, "module")
        && member.static_prop().is_some_and(|p| p.as_str() == "exports")
    }
    _ => is_free(expr, "exports"),
  }
}

impl Visit for StaticExportsCollector {
  fn visit_expr(&mut self, expr: &Expr) {
    if let Expr::Assign(AssignExpr {
      op: AssignOp::Assign,
      target: AssignTarget::Member(member),
      value,
      ..
    }) = expr
    {
      if let Some(name) = member.static_prop().filter(|_| is_exports_object(&member.object)) {
        self.names.insert(name.clone());
        self.visit_expr(value);
        return;
      }
    }
    walk_expr(self, expr);
  }

  fn visit_ident(&mut self, ident: &Ident) {
    if ident.symbol.is_none() && matches!(ident.name.as_str(), "exports" | "module") {
      self.is_dynamic = true;
    }
  }
}

/// The names a CommonJS file exports, when they can be known without running it.
pub(crate) fn static_cjs_exports(body: &[Stmt]) -> Option<FxHashSet<Atom>> {
  let mut collector = StaticExportsCollector::default();
  collector.visit_stmts(body);
  (!collector.is_dynamic).then_some(collector.names)
}

#[cfg(test)]
mod tests {
  use knit_ast::Span;

  use super::*;

  fn assign(target: Expr, value: Expr) -> Stmt {
    let Expr::Member(member) = target else {
      unreachable!()
    };
    Stmt::expr(Expr::Assign(AssignExpr {
      op: AssignOp::Assign,
      target: AssignTarget::Member(member),
      value: Box::new(value),
      span: Span::DUMMY,
    }))
  }

  fn free(name: &str) -> Expr {
    Expr::Ident(Ident::unbound(name))
  }

  #[test]
  fn property_assignments_are_static() {
    let body = vec![
      assign(Expr::member(free("exports"), "a"), Expr::Lit(Lit::num(1.0))),
      assign(
        Expr::member(Expr::member(free("module"), "exports"), "b"),
        Expr::Lit(Lit::num(2.0)),
      ),
    ];
    let names = static_cjs_exports(&body).unwrap();
    assert!(names.contains("a"));
    assert!(names.contains("b"));
    assert_eq!(names.len(), 2);
  }

  #[test]
  fn replacing_module_exports_is_dynamic() {
    let body = vec![assign(
      Expr::member(free("module"), "exports"),
      Expr::Lit(Lit::num(1.0)),
    )];
    assert!(static_cjs_exports(&body).is_none());
  }
}
