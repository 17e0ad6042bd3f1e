use knit_ast::ast::*;

use crate::{treeshake::PartKind, Graph, NormOrExt, NormalModule};

/// Decides whether evaluating a top-level statement could be observed. Anything it can't prove
/// pure counts as a side effect.
struct SideEffectDetector<'a> {
  graph: &'a Graph,
  module: &'a NormalModule,
}

impl<'a> SideEffectDetector<'a> {
  fn stmt(&self, stmt: &Stmt) -> bool {
    match stmt {
      Stmt::Fn(_) | Stmt::Empty(_) => false,
      Stmt::Class(decl) => self.class(&decl.class),
      Stmt::Var(var) => self.var_decl(var),
      Stmt::Block(block) => block.stmts.iter().any(|stmt| self.stmt(stmt)),
      Stmt::Expr(expr) => self.expr(&expr.expr),
      Stmt::ExportDecl(decl) => match &decl.decl {
        Decl::Var(var) => self.var_decl(var),
        Decl::Fn(_) => false,
        Decl::Class(decl) => self.class(&decl.class),
      },
      Stmt::ExportDefault(decl) => match &decl.value {
        DefaultValue::Expr(expr) => self.expr(expr),
        DefaultValue::Fn(_) => false,
        DefaultValue::Class(class) => self.class(&class.class),
      },
      // `export { a }` only names a binding.
      Stmt::ExportNamed(decl) => decl.record.is_some(),
      _ => true,
    }
  }

  fn var_decl(&self, var: &VarDecl) -> bool {
    var.decls.iter().any(|declarator| {
      !matches!(declarator.name, Pat::Ident(_))
        || declarator.init.as_ref().is_some_and(|init| self.expr(init))
    })
  }

  fn class(&self, class: &Class) -> bool {
    if class.super_class.as_ref().is_some_and(|s| self.expr(s)) {
      return true;
    }
    class.members.iter().any(|member| match member {
      ClassMember::Method(method) => self.prop_key(&method.key),
      ClassMember::Property(prop) => {
        self.prop_key(&prop.key)
          || (prop.is_static && prop.value.as_ref().is_some_and(|v| self.expr(v)))
      }
      ClassMember::StaticBlock(block) => !block.body.is_empty(),
    })
  }

  fn prop_key(&self, key: &PropKey) -> bool {
    match key {
      PropKey::Computed(expr) => !matches!(&**expr, Expr::Lit(_)),
      _ => false,
    }
  }

  fn expr(&self, expr: &Expr) -> bool {
    match expr {
      Expr::Lit(_) | Expr::This(_) | Expr::ImportMeta(_) | Expr::Fn(_) | Expr::Arrow(_) => false,
      Expr::Ident(ident) => match ident.symbol {
        Some(_) => false,
        // Reading an undeclared global throws.
        None => !matches!(ident.name.as_str(), "undefined" | "NaN" | "Infinity"),
      },
      Expr::Class(class) => self.class(&class.class),
      Expr::Array(array) => array.elems.iter().flatten().any(|elem| {
        matches!(elem, Expr::Spread(_)) || self.expr(elem)
      }),
      Expr::Object(object) => object.props.iter().any(|prop| match prop {
        Prop::KeyValue(kv) => self.prop_key(&kv.key) || self.expr(&kv.value),
        Prop::Method(method) => self.prop_key(&method.key),
        Prop::Spread(_) => true,
      }),
      Expr::Unary(unary) => match unary.op {
        UnaryOp::Delete => true,
        // `typeof missingGlobal` doesn't throw.
        UnaryOp::TypeOf if matches!(&*unary.arg, Expr::Ident(_)) => false,
        _ => self.expr(&unary.arg),
      },
      Expr::Binary(binary) => self.expr(&binary.left) || self.expr(&binary.right),
      Expr::Cond(cond) => self.expr(&cond.test) || self.expr(&cond.cons) || self.expr(&cond.alt),
      Expr::Seq(seq) => seq.exprs.iter().any(|expr| self.expr(expr)),
      Expr::Call(call) | Expr::New(call) => {
        !(call.is_pure || self.calls_pure_function(&call.callee))
          || call.args.iter().any(|arg| self.expr(arg))
      }
      _ => true,
    }
  }

  /// The callee is a function annotated `/* @__NO_SIDE_EFFECTS__ */`, possibly in another module.
  fn calls_pure_function(&self, callee: &Expr) -> bool {
    let Expr::Ident(Ident {
      symbol: Some(symbol),
      ..
    }) = callee
    else {
      return false;
    };
    let declared = self.graph.canonical_ref(self.module.symbol_ref(*symbol));
    matches!(
      &self.graph.modules[declared.owner],
      NormOrExt::Normal(owner) if owner.no_side_effects_fns.contains(&declared.symbol)
    )
  }
}

impl Graph {
  /// Settles the side-effect flag of every statement part. Runs after linking, since calls of
  /// annotated functions are resolved across modules.
  #[tracing::instrument(skip_all)]
  pub(crate) fn compute_side_effects(&mut self) {
    let flags = self
      .modules
      .iter()
      .filter_map(NormOrExt::as_norm)
      .flat_map(|module| {
        let detector = SideEffectDetector {
          graph: self,
          module,
        };
        module
          .parts
          .iter_enumerated()
          .filter_map(move |(idx, part)| match part.kind {
            PartKind::Stmt(stmt) if !part.side_effects => {
              Some((module.idx, idx, detector.stmt(&module.body[stmt])))
            }
            _ => None,
          })
          .collect::<Vec<_>>()
      })
      .collect::<Vec<_>>();

    for (module, part, side_effects) in flags {
      if let Some(module) = self.modules[module].as_norm_mut() {
        module.parts[part].side_effects = side_effects;
      }
    }
  }
}
