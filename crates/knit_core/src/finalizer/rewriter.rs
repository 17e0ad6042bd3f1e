use knit_ast::{
  ast::*,
  visit_mut::{walk_mut_class, walk_mut_expr, walk_mut_function, VisitMut},
  Span,
};

use crate::{classifier::WrapKind, interop::Interop, NormalModule};

/// Rewrites what the renamer can't express as a name: reads of imports bound to properties,
/// top-level `this`, `require()` and `import()` of bundled modules.
pub(crate) struct Rewriter<'a> {
  interop: &'a Interop<'a>,
  module: &'a NormalModule,
  /// Functions and classes around the visited node. Arrows keep the `this` of their parent.
  this_depth: usize,
}

impl<'a> Rewriter<'a> {
  pub(crate) fn new(interop: &'a Interop<'a>, module: &'a NormalModule) -> Self {
    Self {
      interop,
      module,
      this_depth: 0,
    }
  }

  fn replacement_of(&self, ident: &Ident) -> Option<Expr> {
    let symbol = ident.symbol?;
    if !self.module.symbols.is_top_level(symbol) {
      return None;
    }
    let canonical = self
      .interop
      .graph
      .canonical_ref(self.module.symbol_ref(symbol));
    self
      .interop
      .needs_rewrite(canonical)
      .then(|| self.interop.reference(canonical))
  }

  fn top_level_this(&self, span: Span) -> Expr {
    if self.module.wrap_kind == WrapKind::Cjs {
      Expr::Ident(Ident::new("exports", None, span))
    } else if self.module.exports_kind.is_esm() {
      Expr::void_0()
    } else {
      Expr::This(span)
    }
  }
}

impl<'a> VisitMut for Rewriter<'a> {
  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    match expr {
      Expr::Ident(ident) => {
        if let Some(replacement) = self.replacement_of(ident) {
          *expr = replacement;
        }
      }
      Expr::This(span) if self.this_depth == 0 => {
        *expr = self.top_level_this(*span);
      }
      Expr::Call(call) => {
        // `(0, ns.fn)()` keeps `ns` from becoming the `this` of the call.
        let replaced_callee = call
          .callee
          .as_ident()
          .and_then(|ident| self.replacement_of(ident));
        match replaced_callee {
          Some(callee @ Expr::Member(_)) => {
            *call.callee = Expr::seq(vec![Expr::Lit(Lit::num(0.0)), callee]);
          }
          Some(callee) => *call.callee = callee,
          None => self.visit_mut_expr(&mut call.callee),
        }
        call.args.iter_mut().for_each(|arg| self.visit_mut_expr(arg));
      }
      Expr::Require(require) => {
        let target = self.module.import_records[require.record]
          .resolved
          .and_then(|target| self.interop.graph.normal(target));
        if let Some(target) = target {
          *expr = self.interop.require(target);
        }
      }
      Expr::Import(import) => {
        let target = import
          .record
          .and_then(|record| self.module.import_records[record].resolved)
          .and_then(|target| self.interop.graph.normal(target));
        match target {
          Some(target) => *expr = self.interop.dynamic_import(target),
          None => walk_mut_expr(self, expr),
        }
      }
      _ => walk_mut_expr(self, expr),
    }
  }

  fn visit_mut_function(&mut self, function: &mut Function) {
    self.this_depth += 1;
    walk_mut_function(self, function);
    self.this_depth -= 1;
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    // `extends` is evaluated outside the class body.
    if let Some(super_class) = &mut class.super_class {
      self.visit_mut_expr(super_class);
    }
    let super_class = class.super_class.take();
    self.this_depth += 1;
    walk_mut_class(self, class);
    self.this_depth -= 1;
    class.super_class = super_class;
  }
}
