use itertools::Itertools;
use knit_ast::{ast::*, visit_mut::VisitMut, Atom, ImportRecordIdx, Span};
use knit_ast_template as template;

use super::rewriter::Rewriter;
use crate::{
  classifier::WrapKind,
  interop::Interop,
  renamer::{MangledProps, SymbolRenamer},
  treeshake::PartIdx,
  NormOrExt, NormalModule,
};

/// Turns the included parts of one module into the statements its chunk prints.
pub(crate) struct ModuleFinalizer<'a> {
  pub interop: &'a Interop<'a>,
  pub module: &'a NormalModule,
  pub parts: &'a [PartIdx],
  pub props: &'a MangledProps,
  pub keep_names: bool,
}

impl<'a> ModuleFinalizer<'a> {
  pub(crate) fn finalize(self) -> Vec<Stmt> {
    let module = self.module;
    let mut code = module.stmts_of_parts(self.parts).cloned().collect_vec();
    SymbolRenamer::new(
      self.interop.graph,
      module,
      self.interop.ctx,
      self.props,
      self.keep_names,
      self.interop.helpers,
    )
    .visit_mut_stmts(&mut code);
    Rewriter::new(self.interop, module).visit_mut_stmts(&mut code);

    let mut body = vec![];
    for stmt in code {
      self.strip_module_syntax(stmt, &mut body);
    }

    let mut out = self.namespace_stmts();
    let wrapper = module
      .wrapper_part
      .filter(|part| self.parts.contains(part))
      .and_then(|_| self.interop.wrapper_name(module));
    match (module.wrap_kind, wrapper) {
      (WrapKind::Cjs, Some(wrapper)) => {
        self.interop.helpers.commonjs();
        let mut wrapped = module
          .directives
          .iter()
          .map(|directive| Stmt::expr(Expr::str(directive.value.clone())))
          .collect_vec();
        wrapped.extend(body);
        out.push(template::build_cjs_wrapper_stmt(
          &wrapper,
          &self.interop.graph.display_path(module.idx),
          wrapped,
        ));
      }
      (WrapKind::Esm, Some(wrapper)) => {
        self.interop.helpers.esm();
        let hoisted = hoist_lazy_init_bindings(body);
        out.extend(template::hoisted_vars(hoisted.vars));
        out.extend(hoisted.functions);
        out.push(template::build_esm_wrapper_stmt(
          &wrapper,
          &self.interop.graph.display_path(module.idx),
          hoisted.body,
          module.is_async_init,
        ));
      }
      _ => out.extend(body),
    }
    out
  }

  /// `var foo_exports = {}; __export(foo_exports, { ... });` when the namespace object is used.
  fn namespace_stmts(&self) -> Vec<Stmt> {
    let module = self.module;
    if !self.parts.contains(&module.namespace_part) {
      return vec![];
    }
    let graph = self.interop.graph;
    let getters = graph
      .unambiguous_exports(module.idx)
      .map(|(name, export)| {
        (
          name.clone(),
          self.interop.reference(graph.canonical_ref(export.symbol)),
        )
      })
      .collect_vec();
    if !getters.is_empty() {
      self.interop.helpers.export();
    }
    template::build_namespace_export_stmts(&self.interop.namespace_name(module), getters)
  }

  /// Replaces import and export statements with what they do at run-time.
  fn strip_module_syntax(&self, stmt: Stmt, out: &mut Vec<Stmt>) {
    match stmt {
      Stmt::Import(ImportDecl {
        record: Some(record),
        ..
      })
      | Stmt::ExportNamed(ExportNamed {
        record: Some(record),
        ..
      }) => self.load_dependency(record, out),
      Stmt::Import(_) | Stmt::ExportNamed(_) => {}
      Stmt::ExportAll(ExportAll {
        record: Some(record),
        ..
      }) => self.re_export_all(record, out),
      Stmt::ExportAll(_) => {}
      Stmt::ExportDecl(export) => out.push(export.decl.into_stmt()),
      Stmt::ExportDefault(ExportDefault { local, value, span }) => out.push(match value {
        DefaultValue::Expr(expr) => Stmt::Var(VarDecl {
          span,
          ..VarDecl::single(VarKind::Var, local, Some(expr))
        }),
        DefaultValue::Fn(FnExpr { function, .. }) => Stmt::Fn(FnDecl {
          ident: local,
          function,
        }),
        DefaultValue::Class(ClassExpr { class, .. }) => Stmt::Class(ClassDecl {
          ident: local,
          class,
        }),
      }),
      stmt => out.push(stmt),
    }
  }

  /// What an import statement leaves behind: the CommonJS interop object, a call to the lazy
  /// initializer, or nothing.
  fn load_dependency(&self, record: ImportRecordIdx, out: &mut Vec<Stmt>) {
    let Some(target) = self
      .module
      .importee_of(record)
      .and_then(|target| self.interop.graph.normal(target))
    else {
      return;
    };
    if let Some(require) = self.interop.require_wrapper_call(target) {
      match self.module.interop_symbols.get(&record) {
        Some(symbol) => {
          self.interop.helpers.to_esm();
          let name = self.interop.name(self.module.symbol_ref(*symbol));
          out.push(template::var(&name, Some(template::to_esm(require, false))));
        }
        None => out.push(Stmt::expr(require)),
      }
    } else if let Some(init) = self.interop.init_call(target) {
      out.push(Stmt::expr(init));
    }
  }

  /// `export * from` a module whose exports are only known at run-time copies them onto the
  /// namespace object.
  fn re_export_all(&self, record: ImportRecordIdx, out: &mut Vec<Stmt>) {
    let Some(target) = self.module.importee_of(record) else {
      return;
    };
    let namespace = self.interop.namespace_name(self.module);
    match &self.interop.graph.modules[target] {
      NormOrExt::External(ext) => {
        self.interop.helpers.re_export();
        let source = Expr::Ident(Ident::unbound(self.interop.name(ext.namespace_ref())));
        out.push(template::re_export(&namespace, source));
      }
      NormOrExt::Normal(target) => {
        if let Some(require) = self.interop.require_wrapper_call(target) {
          self.interop.helpers.re_export();
          out.push(template::re_export(&namespace, require));
        } else if let Some(init) = self.interop.init_call(target) {
          out.push(Stmt::expr(init));
        }
      }
    }
  }
}

#[derive(Default)]
struct HoistedBindings {
  vars: Vec<Atom>,
  functions: Vec<Stmt>,
  body: Vec<Stmt>,
}

/// Moves the top-level bindings of a lazily initialized module out of its initializer so that the
/// rest of the chunk can see them. Functions move as a whole. Variables and classes are declared
/// outside and assigned inside.
fn hoist_lazy_init_bindings(stmts: Vec<Stmt>) -> HoistedBindings {
  let mut hoisted = HoistedBindings::default();
  for stmt in stmts {
    match stmt {
      Stmt::Fn(_) => hoisted.functions.push(stmt),
      Stmt::Class(ClassDecl { ident, class }) => {
        hoisted.vars.push(ident.name.clone());
        let value = Expr::Class(ClassExpr {
          ident: Some(ident.clone()),
          class,
        });
        hoisted.body.push(Stmt::expr(assign(Pat::Ident(ident), value)));
      }
      Stmt::Var(decl) => {
        if let Some(assignments) = hoist_var_decl(decl, &mut hoisted.vars) {
          hoisted.body.push(Stmt::expr(assignments));
        }
      }
      Stmt::For(mut for_stmt) => {
        for_stmt.init = match for_stmt.init.take() {
          Some(ForInit::Var(decl)) if decl.kind == VarKind::Var => {
            hoist_var_decl(decl, &mut hoisted.vars).map(ForInit::Expr)
          }
          init => init,
        };
        hoisted.body.push(Stmt::For(for_stmt));
      }
      Stmt::ForInOf(mut for_stmt) => {
        if let ForHead::Var(decl) = &mut for_stmt.left {
          let declarator = (decl.kind == VarKind::Var && decl.decls.len() == 1)
            .then(|| decl.decls.pop())
            .flatten();
          if let Some(declarator) = declarator {
            declarator
              .name
              .for_each_ident(&mut |ident| hoisted.vars.push(ident.name.clone()));
            for_stmt.left = ForHead::Target(assign_target(declarator.name));
          }
        }
        hoisted.body.push(Stmt::ForInOf(for_stmt));
      }
      stmt => hoisted.body.push(stmt),
    }
  }
  hoisted
}

/// Records the names `decl` binds and returns its initializers as assignments.
fn hoist_var_decl(decl: VarDecl, vars: &mut Vec<Atom>) -> Option<Expr> {
  let mut assignments = vec![];
  for declarator in decl.decls {
    declarator
      .name
      .for_each_ident(&mut |ident| vars.push(ident.name.clone()));
    if let Some(init) = declarator.init {
      assignments.push(assign(declarator.name, init));
    }
  }
  match assignments.len() {
    0 => None,
    1 => assignments.pop(),
    _ => Some(Expr::seq(assignments)),
  }
}

fn assign_target(pat: Pat) -> AssignTarget {
  match pat {
    Pat::Ident(ident) => AssignTarget::Ident(ident),
    pat => AssignTarget::Pat(pat),
  }
}

fn assign(target: Pat, value: Expr) -> Expr {
  Expr::Assign(AssignExpr {
    op: AssignOp::Assign,
    target: assign_target(target),
    value: Box::new(value),
    span: Span::DUMMY,
  })
}

#[cfg(test)]
mod tests {
  use knit_ast::codegen::{print_program, CodegenOptions};
  use pretty_assertions::assert_eq;

  use super::*;

  fn ident(name: &str) -> Ident {
    Ident::new(name, None, Span::DUMMY)
  }

  fn print(body: Vec<Stmt>) -> String {
    print_program(
      &Program {
        body,
        ..Default::default()
      },
      CodegenOptions::default(),
    )
  }

  #[test]
  fn lazy_init_bindings_are_hoisted() {
    let stmts = vec![
      Stmt::Var(VarDecl::single(
        VarKind::Const,
        ident("a"),
        Some(Expr::Lit(Lit::num(1.0))),
      )),
      Stmt::Var(VarDecl::single(VarKind::Let, ident("b"), None)),
      Stmt::Fn(FnDecl {
        ident: ident("f"),
        function: Function {
          params: vec![],
          body: vec![],
          is_async: false,
          is_generator: false,
          no_side_effects: false,
          scope: knit_ast::ScopeId::from_usize(0),
          span: Span::DUMMY,
        },
      }),
      Stmt::Class(ClassDecl {
        ident: ident("C"),
        class: Class {
          super_class: None,
          members: vec![],
          scope: knit_ast::ScopeId::from_usize(0),
          span: Span::DUMMY,
        },
      }),
    ];
    let hoisted = hoist_lazy_init_bindings(stmts);
    assert_eq!(hoisted.vars, vec![Atom::new("a"), Atom::new("b"), Atom::new("C")]);
    assert_eq!(print(hoisted.functions), "function f() {}\n");
    assert_eq!(print(hoisted.body), "a = 1;\nC = class C {};\n");
  }
}
