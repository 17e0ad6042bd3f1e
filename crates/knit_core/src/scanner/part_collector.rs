use knit_ast::{
  ast::*,
  visit::{walk_assign_target, walk_expr, Visit},
  SymbolKind, SymbolTable,
};

use crate::{
  normal_module::{NamespaceCall, WriteSite},
  treeshake::StatementPart,
};

/// Fills a part with what one top-level statement declares, references and imports.
pub(crate) struct PartCollector<'a> {
  symbols: &'a SymbolTable,
  part: &'a mut StatementPart,
  write_sites: &'a mut Vec<WriteSite>,
  namespace_calls: &'a mut Vec<NamespaceCall>,
}

impl<'a> PartCollector<'a> {
  pub(crate) fn new(
    symbols: &'a SymbolTable,
    part: &'a mut StatementPart,
    write_sites: &'a mut Vec<WriteSite>,
    namespace_calls: &'a mut Vec<NamespaceCall>,
  ) -> Self {
    Self {
      symbols,
      part,
      write_sites,
      namespace_calls,
    }
  }

  fn add_write(&mut self, ident: &Ident) {
    let Some(symbol) = ident.symbol else {
      return;
    };
    if self.symbols.is_top_level(symbol) && !self.part.written.contains(&symbol) {
      self.part.written.push(symbol);
    }
    let kind = self.symbols.symbols[symbol].kind;
    if kind.is_import() || kind.is_const() {
      self.write_sites.push(WriteSite {
        symbol,
        span: ident.span,
      });
    }
  }
}

impl<'a> Visit for PartCollector<'a> {
  fn visit_binding_ident(&mut self, ident: &Ident) {
    if let Some(symbol) = ident.symbol {
      if self.symbols.is_top_level(symbol) && !self.part.declared.contains(&symbol) {
        self.part.declared.push(symbol);
      }
    }
  }

  fn visit_ident(&mut self, ident: &Ident) {
    match ident.symbol {
      Some(symbol) => {
        if self.symbols.is_top_level(symbol) {
          self.part.add_reference(symbol);
        }
      }
      None => {
        if !self.part.unbound.contains(&ident.name) {
          self.part.unbound.push(ident.name.clone());
        }
      }
    }
  }

  fn visit_assign_target(&mut self, target: &AssignTarget) {
    match target {
      AssignTarget::Ident(ident) => self.add_write(ident),
      AssignTarget::Pat(pat) => {
        let mut written = vec![];
        pat.for_each_ident(&mut |ident| written.push(ident));
        written.into_iter().for_each(|ident| self.add_write(ident));
      }
      AssignTarget::Member(_) => {}
    }
    walk_assign_target(self, target);
  }

  fn visit_expr(&mut self, expr: &Expr) {
    match expr {
      Expr::Require(require) => self.part.import_records.push(require.record),
      Expr::Import(ImportExpr {
        record: Some(record),
        ..
      }) => self.part.import_records.push(*record),
      Expr::Update(UpdateExpr { arg, .. })
      | Expr::Unary(UnaryExpr {
        op: UnaryOp::Delete,
        arg,
        ..
      }) => {
        if let Expr::Ident(ident) = &**arg {
          self.add_write(ident);
        }
      }
      Expr::Call(call) | Expr::New(call) => {
        if let Expr::Ident(Ident {
          symbol: Some(symbol),
          span,
          ..
        }) = &*call.callee
        {
          if self.symbols.symbols[*symbol].kind == SymbolKind::Namespace {
            self.namespace_calls.push(NamespaceCall {
              symbol: *symbol,
              span: *span,
              is_construct: matches!(expr, Expr::New(_)),
            });
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
  use knit_ast::{Span, SymbolKind};

  use super::*;
  use crate::treeshake::PartKind;

  #[test]
  fn writes_to_imports_are_recorded() {
    let mut symbols = SymbolTable::new();
    let root = symbols.root_scope();
    let x = symbols.declare("x", SymbolKind::Import, root, Span::new(9, 10));
    let y = symbols.declare("y", SymbolKind::Hoisted, root, Span::DUMMY);
    // x++, y = x, console
    let stmt = Stmt::expr(Expr::seq(vec![
      Expr::Update(UpdateExpr {
        op: UpdateOp::Increment,
        prefix: false,
        arg: Box::new(Expr::Ident(Ident::new("x", Some(x), Span::new(20, 21)))),
        span: Span::new(20, 23),
      }),
      Expr::Assign(AssignExpr {
        op: AssignOp::Assign,
        target: AssignTarget::Ident(Ident::new("y", Some(y), Span::DUMMY)),
        value: Box::new(Expr::Ident(Ident::new("x", Some(x), Span::DUMMY))),
        span: Span::DUMMY,
      }),
      Expr::Ident(Ident::unbound("console")),
    ]));

    let mut part = StatementPart::new(PartKind::Stmt(0));
    let mut write_sites = vec![];
    let mut namespace_calls = vec![];
    PartCollector::new(&symbols, &mut part, &mut write_sites, &mut namespace_calls)
      .visit_stmt(&stmt);

    assert_eq!(write_sites.len(), 1);
    assert_eq!(write_sites[0].symbol, x);
    assert_eq!(part.written, vec![x, y]);
    assert_eq!(part.referenced.get(&x), Some(&2));
    assert_eq!(part.referenced.get(&y), Some(&1));
    assert_eq!(part.unbound, vec![knit_ast::Atom::new("console")]);
  }
}
