use knit_ast::{
  ast::*,
  codegen::{print_expr, CodegenOptions},
  visit::Visit,
  Atom, SymbolId, SymbolKind,
};
use knit_common::{ImportKind, ModuleId, ParsedModule};
use pretty_assertions::assert_eq;

use super::parse;

fn parse_ok(source: &str) -> ParsedModule {
  parse(&ModuleId::new("/project/entry.js"), source).unwrap()
}

fn parse_err(source: &str) -> String {
  parse(&ModuleId::new("/project/entry.js"), source)
    .unwrap_err()
    .message("/project")
}

#[derive(Default)]
struct References(Vec<(Atom, Option<SymbolId>)>);

impl Visit for References {
  fn visit_ident(&mut self, ident: &Ident) {
    self.0.push((ident.name.clone(), ident.symbol));
  }
}

fn references(module: &ParsedModule) -> Vec<(Atom, Option<SymbolId>)> {
  let mut refs = References::default();
  refs.visit_program(&module.program);
  refs.0
}

fn declared(module: &ParsedModule, name: &str) -> Vec<(SymbolId, SymbolKind)> {
  module
    .symbols
    .symbols
    .iter_enumerated()
    .filter(|(_, decl)| decl.name.as_str() == name)
    .map(|(id, decl)| (id, decl.kind))
    .collect()
}

fn first_expr(module: &ParsedModule) -> &Expr {
  match &module.program.body[0] {
    Stmt::Expr(stmt) => &stmt.expr,
    other => panic!("expected an expression statement, got {other:?}"),
  }
}

#[test]
fn references_bind_to_the_nearest_declaration() {
  let module = parse_ok(
    "
    let a = 1;
    function f(a) { return a + g(); }
    function g() { return a; }
    ",
  );
  let decls = declared(&module, "a");
  assert_eq!(decls.len(), 2);
  let (outer, param) = (decls[0].0, decls[1].0);
  assert_eq!(decls[1].1, SymbolKind::Hoisted);

  let refs = references(&module);
  let a_refs = refs
    .iter()
    .filter(|(name, _)| name.as_str() == "a")
    .map(|(_, symbol)| *symbol)
    .collect::<Vec<_>>();
  assert_eq!(a_refs, vec![Some(param), Some(outer)]);
  // `g` is called before its declaration.
  let g = declared(&module, "g")[0].0;
  assert!(refs.contains(&(Atom::from("g"), Some(g))));
}

#[test]
fn globals_stay_unbound() {
  let module = parse_ok("console.log(window.x, exports);");
  let refs = references(&module);
  assert!(refs.iter().all(|(_, symbol)| symbol.is_none()));
  assert_eq!(
    refs.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
    vec!["console", "window", "exports"]
  );
}

#[test]
fn var_hoists_out_of_blocks_and_let_does_not() {
  let module = parse_ok(
    "
    { var a = 1; let b = 2; }
    a; b;
    ",
  );
  let a = declared(&module, "a")[0].0;
  assert!(module.symbols.is_top_level(a));
  let b = declared(&module, "b")[0].0;
  assert!(!module.symbols.is_top_level(b));

  let refs = references(&module);
  assert_eq!(refs, vec![(Atom::from("a"), Some(a)), (Atom::from("b"), None)]);
}

#[test]
fn import_records_in_source_order() {
  let module = parse_ok(
    "
    import def, { x as y } from './a';
    export * from './b';
    const c = require('./c');
    import('./d');
    import(dynamic);
    ",
  );
  let records = module
    .import_records
    .iter()
    .map(|record| (record.specifier.as_str(), record.kind))
    .collect::<Vec<_>>();
  assert_eq!(
    records,
    vec![
      ("./a", ImportKind::Static),
      ("./b", ImportKind::Static),
      ("./c", ImportKind::Require),
      ("./d", ImportKind::DynamicImport),
    ]
  );
  assert_eq!(declared(&module, "def")[0].1, SymbolKind::Import);
  assert_eq!(declared(&module, "y")[0].1, SymbolKind::Import);
}

#[test]
fn local_require_is_a_plain_call() {
  let module = parse_ok(
    "
    function load(require) { return require('./x'); }
    ",
  );
  assert!(module.import_records.is_empty());
}

#[test]
fn reexported_names_are_hidden_from_references() {
  let module = parse_ok(
    "
    export { x } from './a';
    export * as ns from './b';
    x; ns;
    ",
  );
  let refs = references(&module);
  assert_eq!(refs, vec![(Atom::from("x"), None), (Atom::from("ns"), None)]);
}

#[test]
fn default_export_names() {
  let module = parse_ok("export default 1 + 2;");
  let Stmt::ExportDefault(decl) = &module.program.body[0] else {
    panic!("expected a default export");
  };
  assert_eq!(decl.local.name.as_str(), "entry_default");
  assert!(decl.local.symbol.is_some());

  let module = parse_ok("export default function main() {}");
  let Stmt::ExportDefault(decl) = &module.program.body[0] else {
    panic!("expected a default export");
  };
  assert_eq!(decl.local.name.as_str(), "main");
}

#[test]
fn direct_eval_marks_its_scope() {
  let module = parse_ok(
    "
    function f() { eval('x'); }
    function g() { const eval = h; eval('x'); }
    ",
  );
  let flagged = module
    .symbols
    .scopes
    .iter()
    .filter(|scope| scope.has_direct_eval)
    .count();
  assert_eq!(flagged, 1);
}

#[test]
fn operator_precedence() {
  let print = |source: &str| print_expr(first_expr(&parse_ok(source)), CodegenOptions::default());
  assert_eq!(print("a + b * c;"), "a + b * c");
  assert_eq!(print("(a + b) * c;"), "(a + b) * c");
  assert_eq!(print("a ? b : c ? d : e;"), "a ? b : c ? d : e");
  assert_eq!(print("x = y = z;"), "x = y = z");
}

#[test]
fn arrows_and_annotations() {
  let module = parse_ok(
    "
    const f = /* @__NO_SIDE_EFFECTS__ */ (a, b) => a + b;
    const g = async x => { await x; };
    /* @__PURE__ */ make();
    ",
  );
  let init = |idx: usize| match &module.program.body[idx] {
    Stmt::Var(decl) => decl.decls[0].init.clone(),
    _ => None,
  };
  let Some(Expr::Arrow(f)) = init(0) else {
    panic!("expected an arrow");
  };
  assert!(f.no_side_effects);
  assert_eq!(f.params.len(), 2);
  let Some(Expr::Arrow(g)) = init(1) else {
    panic!("expected an arrow");
  };
  assert!(g.is_async);
  let Stmt::Expr(stmt) = &module.program.body[2] else {
    panic!("expected a call");
  };
  assert!(matches!(&stmt.expr, Expr::Call(call) if call.is_pure));
}

#[test]
fn destructuring_assignment_targets() {
  let module = parse_ok("let a, b; [a, { b = 1 }] = pair;");
  let Stmt::Expr(stmt) = &module.program.body[1] else {
    panic!("expected an assignment");
  };
  let Expr::Assign(assign) = &stmt.expr else {
    panic!("expected an assignment");
  };
  let AssignTarget::Pat(pat) = &assign.target else {
    panic!("expected a pattern target");
  };
  let mut bound = vec![];
  pat.for_each_ident(&mut |ident| bound.push((ident.name.clone(), ident.symbol)));
  assert_eq!(
    bound,
    vec![
      (Atom::from("a"), Some(declared(&module, "a")[0].0)),
      (Atom::from("b"), Some(declared(&module, "b")[0].0)),
    ]
  );
}

#[test]
fn syntax_errors() {
  assert_eq!(
    parse_err("const = 1;"),
    "Expected identifier but found \"=\""
  );
  assert_eq!(
    parse_err("a?.b"),
    "Optional chaining is not supported"
  );
  assert_eq!(
    parse_err("const s = `x`;"),
    "Template literals are not supported"
  );
}
