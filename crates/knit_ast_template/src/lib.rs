//! Builders for the statements the linker synthesizes. Every name passed in is already final.

use knit_ast::{ast::*, Atom, ScopeId, Span};

fn ident(name: &Atom) -> Ident {
  Ident::new(name.clone(), None, Span::DUMMY)
}

fn ident_expr(name: &Atom) -> Expr {
  Expr::Ident(ident(name))
}

fn synthesized_scope() -> ScopeId {
  ScopeId::from_usize(0)
}

fn key_of(name: &Atom) -> PropKey {
  if knit_ast::is_identifier_name(name) {
    PropKey::Ident(IdentName::new(name.clone()))
  } else {
    PropKey::Str(name.clone(), Span::DUMMY)
  }
}

fn method(key: &str, params: Vec<Pat>, body: Vec<Stmt>, is_async: bool) -> Prop {
  Prop::Method(MethodProp {
    key: PropKey::Str(Atom::new(key), Span::DUMMY),
    kind: MethodKind::Method,
    function: Function {
      params,
      body,
      is_async,
      is_generator: false,
      no_side_effects: false,
      scope: synthesized_scope(),
      span: Span::DUMMY,
    },
  })
}

pub fn var(name: &Atom, init: Option<Expr>) -> Stmt {
  Stmt::Var(VarDecl::single(VarKind::Var, ident(name), init))
}

/// `var a, b, c;`
pub fn hoisted_vars(names: impl IntoIterator<Item = Atom>) -> Option<Stmt> {
  let decls = names
    .into_iter()
    .map(|name| VarDeclarator {
      name: Pat::Ident(ident(&name)),
      init: None,
      span: Span::DUMMY,
    })
    .collect::<Vec<_>>();
  (!decls.is_empty()).then(|| {
    Stmt::Var(VarDecl {
      kind: VarKind::Var,
      decls,
      span: Span::DUMMY,
    })
  })
}

/// `helper(args)` where `helper` is a runtime helper or another global.
pub fn call_global(helper: &str, args: Vec<Expr>) -> Expr {
  Expr::call(Expr::Ident(Ident::unbound(helper)), args)
}

/// `name()`
pub fn call_name(name: &Atom) -> Expr {
  Expr::call(ident_expr(name), vec![])
}

pub fn to_esm(expr: Expr, is_node_mode: bool) -> Expr {
  let mut args = vec![expr];
  if is_node_mode {
    args.push(Expr::Lit(Lit::num(1.0)));
  }
  call_global("__toESM", args)
}

pub fn to_common_js(namespace: &Atom) -> Expr {
  call_global("__toCommonJS", vec![ident_expr(namespace)])
}

/// `__reExport(target, source);`
pub fn re_export(target: &Atom, source: Expr) -> Stmt {
  Stmt::expr(call_global("__reExport", vec![ident_expr(target), source]))
}

/// `__name(local, "original");`
pub fn keep_name(local: &Atom, original: &Atom) -> Stmt {
  Stmt::expr(call_global(
    "__name",
    vec![ident_expr(local), Expr::str(original.clone())],
  ))
}

/// `module.exports = value;`
pub fn module_exports_assign(value: Expr) -> Stmt {
  Stmt::expr(Expr::Assign(AssignExpr {
    op: AssignOp::Assign,
    target: AssignTarget::Member(MemberExpr {
      object: Box::new(Expr::Ident(Ident::unbound("module"))),
      prop: MemberProp::Ident(IdentName::new("exports")),
      span: Span::DUMMY,
    }),
    value: Box::new(value),
    span: Span::DUMMY,
  }))
}

/// `export { local as exported, ... };` with the specifiers sorted by exported name.
pub fn build_exports_stmt(mut exports: Vec<(Atom, Atom)>) -> Stmt {
  exports.sort_by(|a, b| a.0.cmp(&b.0));
  Stmt::ExportNamed(ExportNamed {
    specifiers: exports
      .into_iter()
      .map(|(exported, local)| ExportSpecifier::Named {
        local: ident(&local),
        exported,
      })
      .collect(),
    record: None,
    source: None,
    span: Span::DUMMY,
  })
}

/// `import { imported as local, ... } from "source";`, or a bare `import "source";`.
pub fn build_import_stmt(source: &str, mut imports: Vec<(Atom, Atom)>) -> Stmt {
  imports.sort_by(|a, b| a.0.cmp(&b.0));
  Stmt::Import(ImportDecl {
    specifiers: imports
      .into_iter()
      .map(|(imported, local)| {
        if imported.as_str() == "default" {
          ImportSpecifier::Default(ident(&local))
        } else {
          ImportSpecifier::Named {
            imported,
            local: ident(&local),
          }
        }
      })
      .collect(),
    record: None,
    source: Atom::new(source),
    span: Span::DUMMY,
  })
}

/// `import * as local from "source";`
pub fn build_import_star_stmt(source: &str, local: &Atom) -> Stmt {
  Stmt::Import(ImportDecl {
    specifiers: vec![ImportSpecifier::Namespace(ident(local))],
    record: None,
    source: Atom::new(source),
    span: Span::DUMMY,
  })
}

/// `export * from "source";`
pub fn build_export_all_stmt(source: &str) -> Stmt {
  Stmt::ExportAll(ExportAll {
    record: None,
    source: Atom::new(source),
    span: Span::DUMMY,
  })
}

/// `export default value;`
pub fn build_export_default_stmt(value: Expr) -> Stmt {
  Stmt::ExportDefault(ExportDefault {
    local: Ident::unbound("default"),
    value: DefaultValue::Expr(value),
    span: Span::DUMMY,
  })
}

/// ```js
/// var foo_exports = {};
/// __export(foo_exports, { a: () => a, b: () => b });
/// ```
///
/// Getters are sorted by exported name. The `__export` call is omitted when nothing is exported.
pub fn build_namespace_export_stmts(namespace: &Atom, mut exports: Vec<(Atom, Expr)>) -> Vec<Stmt> {
  exports.sort_by(|a, b| a.0.cmp(&b.0));
  let mut stmts = vec![var(
    namespace,
    Some(Expr::Object(ObjectExpr {
      props: vec![],
      span: Span::DUMMY,
    })),
  )];
  if !exports.is_empty() {
    let getters = exports
      .into_iter()
      .map(|(name, value)| {
        Prop::KeyValue(KeyValueProp {
          key: key_of(&name),
          value: Expr::arrow_returning(value, synthesized_scope()),
        })
      })
      .collect();
    stmts.push(Stmt::expr(call_global(
      "__export",
      vec![
        ident_expr(namespace),
        Expr::Object(ObjectExpr {
          props: getters,
          span: Span::DUMMY,
        }),
      ],
    )));
  }
  stmts
}

/// `var require_foo = __commonJS({ "foo.js"(exports, module) { ... } });`
pub fn build_cjs_wrapper_stmt(wrapper: &Atom, key: &str, body: Vec<Stmt>) -> Stmt {
  let params = ["exports", "module"]
    .into_iter()
    .map(|name| Pat::Ident(Ident::unbound(name)))
    .collect();
  var(
    wrapper,
    Some(call_global(
      "__commonJS",
      vec![Expr::Object(ObjectExpr {
        props: vec![method(key, params, body, false)],
        span: Span::DUMMY,
      })],
    )),
  )
}

/// `var init_foo = __esm({ "foo.js"() { ... } });`
pub fn build_esm_wrapper_stmt(wrapper: &Atom, key: &str, body: Vec<Stmt>, is_async: bool) -> Stmt {
  var(
    wrapper,
    Some(call_global(
      "__esm",
      vec![Expr::Object(ObjectExpr {
        props: vec![method(key, vec![], body, is_async)],
        span: Span::DUMMY,
      })],
    )),
  )
}

/// `Promise.resolve().then(() => value)`
pub fn promise_resolve_then(value: Expr) -> Expr {
  let resolved = Expr::call(
    Expr::member(Expr::Ident(Ident::unbound("Promise")), "resolve"),
    vec![],
  );
  then_returning(resolved, value)
}

/// `promise.then(() => value)`
pub fn then_returning(promise: Expr, value: Expr) -> Expr {
  Expr::call(
    Expr::member(promise, "then"),
    vec![Expr::arrow_returning(value, synthesized_scope())],
  )
}

/// `import("./chunk.js")`, optionally followed by `.then((m) => __toESM(m.default))` when the
/// target chunk wraps a CommonJS entry.
pub fn dynamic_import_chunk(path: &str, unwrap_cjs_default: bool) -> Expr {
  let import = Expr::Import(ImportExpr {
    arg: Box::new(Expr::str(path)),
    record: None,
    span: Span::DUMMY,
  });
  if !unwrap_cjs_default {
    return import;
  }
  let module = Atom::new("m");
  let unwrap = Expr::Arrow(ArrowExpr {
    params: vec![Pat::Ident(ident(&module))],
    body: ArrowBody::Expr(Box::new(to_esm(
      Expr::member(ident_expr(&module), "default"),
      false,
    ))),
    is_async: false,
    no_side_effects: false,
    scope: synthesized_scope(),
    span: Span::DUMMY,
  });
  Expr::call(Expr::member(import, "then"), vec![unwrap])
}

#[cfg(test)]
mod tests {
  use knit_ast::codegen::{print_program, CodegenOptions};
  use pretty_assertions::assert_eq;

  use super::*;

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
  fn exports_are_sorted() {
    let stmt = build_exports_stmt(vec![
      (Atom::new("b"), Atom::new("b$1")),
      (Atom::new("a"), Atom::new("a")),
    ]);
    assert_eq!(print(vec![stmt]), "export { a, b$1 as b };\n");
  }

  #[test]
  fn namespace_object() {
    let stmts = build_namespace_export_stmts(
      &Atom::new("foo_exports"),
      vec![
        (Atom::new("y"), Expr::member(Expr::Ident(Ident::unbound("import_bar")), "y")),
        (Atom::new("x"), Expr::Ident(Ident::unbound("x"))),
      ],
    );
    assert_eq!(
      print(stmts),
      "var foo_exports = {};\n__export(foo_exports, {\n  x: () => x,\n  y: () => import_bar.y\n});\n"
    );
    assert_eq!(
      print(build_namespace_export_stmts(&Atom::new("empty_exports"), vec![])),
      "var empty_exports = {};\n"
    );
  }

  #[test]
  fn commonjs_wrapper() {
    let body = vec![module_exports_assign(Expr::Lit(Lit::num(1.0)))];
    let stmt = build_cjs_wrapper_stmt(&Atom::new("require_foo"), "foo.js", body);
    assert_eq!(
      print(vec![stmt]),
      "var require_foo = __commonJS({\n  \"foo.js\"(exports, module) {\n    module.exports = 1;\n  }\n});\n"
    );
  }
}
