use knit_ast::{
  ast::*,
  visit::{walk_expr, Visit},
};
use knit_common::ModuleId;
use phf::{phf_set, Set};

use crate::BuildError;

static TYPEOF_RESULTS: Set<&'static str> = phf_set! {
  "undefined", "object", "boolean", "number", "bigint", "string", "symbol", "function", "unknown",
};

/// Warns about comparisons whose result is known ahead of time and reports `require` calls that
/// stay as run-time calls.
pub(crate) struct SuspiciousCodeFinder<'a> {
  id: &'a ModuleId,
  pub(crate) errors: Vec<BuildError>,
}

impl<'a> SuspiciousCodeFinder<'a> {
  pub(crate) fn new(id: &'a ModuleId) -> Self {
    Self { id, errors: vec![] }
  }

  fn check_comparison(&mut self, binary: &BinaryExpr) {
    let op = binary.op;
    if !op.is_comparison() {
      return;
    }
    let sides = [&*binary.left, &*binary.right];
    if sides.iter().any(|side| is_nan(side)) {
      self.push(BuildError::equals_nan(op.as_str()), binary.span);
    } else if sides.iter().any(|side| is_negative_zero(side)) {
      self.push(BuildError::equals_negative_zero(op.as_str()), binary.span);
    } else if op.is_equality() && sides.iter().any(|side| is_new_object(side)) {
      self.push(BuildError::equals_new_object(op.as_str()), binary.span);
    } else if op.is_equality() {
      let typeof_value = match (&*binary.left, &*binary.right) {
        (Expr::Unary(unary), Expr::Lit(lit)) | (Expr::Lit(lit), Expr::Unary(unary))
          if unary.op == UnaryOp::TypeOf =>
        {
          match &lit.value {
            LitValue::Str(value) => Some(value),
            _ => None,
          }
        }
        _ => None,
      };
      if let Some(value) = typeof_value {
        if !TYPEOF_RESULTS.contains(value.as_str()) {
          self.push(BuildError::suspicious_typeof(value.as_str()), binary.span);
        }
      }
    }
  }

  fn push(&mut self, error: BuildError, span: knit_ast::Span) {
    self.errors.push(error.at(self.id, span));
  }
}

fn is_nan(expr: &Expr) -> bool {
  match expr {
    Expr::Ident(ident) => ident.symbol.is_none() && ident.name.as_str() == "NaN",
    Expr::Lit(Lit {
      value: LitValue::Num(n),
      ..
    }) => n.is_nan(),
    _ => false,
  }
}

fn is_negative_zero(expr: &Expr) -> bool {
  matches!(
    expr,
    Expr::Unary(UnaryExpr { op: UnaryOp::Minus, arg, .. })
      if matches!(&**arg, Expr::Lit(Lit { value: LitValue::Num(n), .. }) if *n == 0.0)
  )
}

fn is_new_object(expr: &Expr) -> bool {
  matches!(
    expr,
    Expr::Object(_) | Expr::Array(_) | Expr::Fn(_) | Expr::Arrow(_) | Expr::Class(_)
  )
}

impl<'a> Visit for SuspiciousCodeFinder<'a> {
  fn visit_expr(&mut self, expr: &Expr) {
    match expr {
      Expr::Binary(binary) => self.check_comparison(binary),
      Expr::Call(call) => {
        if let Expr::Ident(Ident {
          name, symbol: None, ..
        }) = &*call.callee
        {
          if name.as_str() == "require" {
            self.push(BuildError::unsupported_require(), call.span);
          }
        }
      }
      _ => {}
    }
    walk_expr(self, expr);
  }
}

#[cfg(test)]
mod tests {
  use knit_ast::Span;

  use super::*;

  fn compare(op: BinaryOp, left: Expr, right: Expr) -> Stmt {
    Stmt::expr(Expr::Binary(BinaryExpr {
      op,
      left: Box::new(left),
      right: Box::new(right),
      span: Span::new(0, 10),
    }))
  }

  fn codes(stmts: &[Stmt]) -> Vec<&'static str> {
    let id = ModuleId::new("/project/a.js");
    let mut finder = SuspiciousCodeFinder::new(&id);
    finder.visit_stmts(stmts);
    finder.errors.iter().map(|e| e.code()).collect()
  }

  #[test]
  fn comparisons() {
    let x = || Expr::Ident(Ident::unbound("x"));
    let typeof_x = || {
      Expr::Unary(UnaryExpr {
        op: UnaryOp::TypeOf,
        arg: Box::new(x()),
        span: Span::DUMMY,
      })
    };
    let stmts = vec![
      compare(BinaryOp::EqEqEq, x(), Expr::Ident(Ident::unbound("NaN"))),
      compare(
        BinaryOp::Lt,
        x(),
        Expr::Unary(UnaryExpr {
          op: UnaryOp::Minus,
          arg: Box::new(Expr::Lit(Lit::num(0.0))),
          span: Span::DUMMY,
        }),
      ),
      compare(
        BinaryOp::NotEqEq,
        x(),
        Expr::Array(ArrayExpr {
          elems: vec![],
          span: Span::DUMMY,
        }),
      ),
      compare(BinaryOp::EqEqEq, typeof_x(), Expr::str("strng")),
      compare(BinaryOp::EqEqEq, typeof_x(), Expr::str("string")),
    ];
    assert_eq!(
      codes(&stmts),
      vec![
        "EQUALS_NAN",
        "EQUALS_NEGATIVE_ZERO",
        "EQUALS_NEW_OBJECT",
        "SUSPICIOUS_TYPEOF"
      ]
    );
  }
}
