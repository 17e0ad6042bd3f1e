//! Decides how each module behaves at run-time.
//!
//! The per-file pass looks at syntax only. [classify_graph] then folds in what the import sites
//! tell: who requires whom, which `export *` targets can't be resolved statically, and which
//! modules have to be wrapped.

use std::path::Path;

use knit_ast::{
  ast::*,
  visit::{walk_expr, walk_stmt, Visit},
  ImportRecordIdx, Span,
};
use knit_common::{ImportKind, ModuleIdx};
use knit_error::Note;
use oxc_index::IndexVec;

use crate::{BuildError, NormOrExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportsKind {
  None,
  Esm,
  Cjs,
  /// An ES module with an `export *` from a CommonJS or external module. Names its static exports
  /// don't cover are read from its namespace object at run-time.
  EsmWithDynamicFallback,
}

impl ExportsKind {
  pub fn is_esm(self) -> bool {
    matches!(self, ExportsKind::Esm | ExportsKind::EsmWithDynamicFallback)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapKind {
  /// Scope-hoisted into the chunk.
  None,
  /// `var require_foo = __commonJS(...)`
  Cjs,
  /// `var init_foo = __esm(...)`
  Esm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsmReasonKind {
  Import,
  Export,
  ImportMeta,
  TopLevelAwait,
  TopLevelForAwait,
}

/// The first piece of syntax that made a file an ES module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsmReason {
  pub kind: EsmReasonKind,
  pub span: Span,
}

impl EsmReason {
  pub fn note(&self, path: &Path) -> Note {
    let what = match self.kind {
      EsmReasonKind::Import => r#"the "import" keyword"#,
      EsmReasonKind::Export => r#"the "export" keyword"#,
      EsmReasonKind::ImportMeta => r#"the use of "import.meta""#,
      EsmReasonKind::TopLevelAwait => r#"the top-level "await" keyword"#,
      EsmReasonKind::TopLevelForAwait => r#"the top-level "for await" loop"#,
    };
    Note::at(
      format!("This file is considered to be an ECMAScript module because of {what} here:"),
      path,
      self.span,
    )
  }
}

#[derive(Debug, Default)]
pub struct Classification {
  pub esm_reason: Option<EsmReason>,
  pub has_cjs_evidence: bool,
  pub top_level_returns: Vec<Span>,
  pub top_level_this: Vec<Span>,
  pub star_export_records: Vec<ImportRecordIdx>,
}

impl Classification {
  pub fn exports_kind(&self) -> ExportsKind {
    if self.esm_reason.is_some() {
      ExportsKind::Esm
    } else if self.has_cjs_evidence {
      ExportsKind::Cjs
    } else {
      ExportsKind::None
    }
  }
}

#[derive(Default)]
struct Classifier {
  result: Classification,
  /// Functions and arrows entered. `await` and `return` are top-level at depth zero.
  function_depth: u32,
  /// Non-arrow functions and class bodies entered. `this` is top-level at depth zero.
  this_depth: u32,
}

impl Classifier {
  fn esm_evidence(&mut self, kind: EsmReasonKind, span: Span) {
    if self.result.esm_reason.is_none() {
      self.result.esm_reason = Some(EsmReason { kind, span });
    }
  }
}

fn keyword_span(start: u32, keyword: &str) -> Span {
  Span::new(start, start + keyword.len() as u32)
}

impl Visit for Classifier {
  fn visit_stmt(&mut self, stmt: &Stmt) {
    match stmt {
      Stmt::Import(decl) => {
        self.esm_evidence(EsmReasonKind::Import, keyword_span(decl.span.start, "import"))
      }
      Stmt::ExportAll(decl) => {
        self.esm_evidence(EsmReasonKind::Export, keyword_span(decl.span.start, "export"));
        if let Some(record) = decl.record {
          self.result.star_export_records.push(record);
        }
      }
      Stmt::ExportNamed(_) | Stmt::ExportDecl(_) | Stmt::ExportDefault(_) => {
        self.esm_evidence(EsmReasonKind::Export, keyword_span(stmt.span().start, "export"))
      }
      Stmt::Return(ret) if self.function_depth == 0 => {
        self.result.has_cjs_evidence = true;
        self.result.top_level_returns.push(keyword_span(ret.span.start, "return"));
      }
      Stmt::ForInOf(for_stmt) if for_stmt.is_await && self.function_depth == 0 => {
        self.esm_evidence(EsmReasonKind::TopLevelForAwait, for_stmt.span)
      }
      _ => {}
    }
    walk_stmt(self, stmt)
  }

  fn visit_expr(&mut self, expr: &Expr) {
    match expr {
      Expr::ImportMeta(span) => self.esm_evidence(EsmReasonKind::ImportMeta, *span),
      Expr::Await(_, span) if self.function_depth == 0 => {
        self.esm_evidence(EsmReasonKind::TopLevelAwait, keyword_span(span.start, "await"))
      }
      Expr::This(span) if self.this_depth == 0 => self.result.top_level_this.push(*span),
      Expr::Require(_) => self.result.has_cjs_evidence = true,
      Expr::Call(call) => {
        if matches!(
          &*call.callee,
          Expr::Ident(Ident { name, symbol: None, .. }) if name == "require"
        )
        {
          self.result.has_cjs_evidence = true;
        }
      }
      _ => {}
    }
    walk_expr(self, expr)
  }

  fn visit_ident(&mut self, ident: &Ident) {
    if ident.symbol.is_none() && (ident.name == "exports" || ident.name == "module") {
      self.result.has_cjs_evidence = true;
    }
  }

  fn visit_function(&mut self, function: &Function) {
    self.function_depth += 1;
    self.this_depth += 1;
    knit_ast::visit::walk_function(self, function);
    self.function_depth -= 1;
    self.this_depth -= 1;
  }

  fn visit_arrow(&mut self, arrow: &ArrowExpr) {
    self.function_depth += 1;
    knit_ast::visit::walk_arrow(self, arrow);
    self.function_depth -= 1;
  }

  fn visit_class(&mut self, class: &Class) {
    if let Some(super_class) = &class.super_class {
      self.visit_expr(super_class);
    }
    self.this_depth += 1;
    for member in &class.members {
      match member {
        ClassMember::Method(m) => {
          self.visit_prop_key(&m.key);
          self.visit_function(&m.function);
        }
        ClassMember::Property(p) => {
          self.visit_prop_key(&p.key);
          if let Some(value) = &p.value {
            self.visit_expr(value);
          }
        }
        ClassMember::StaticBlock(b) => {
          self.function_depth += 1;
          self.visit_block(&b.body, b.scope);
          self.function_depth -= 1;
        }
      }
    }
    self.this_depth -= 1;
  }
}

/// Classifies one file from its syntax. Evidence inside dead branches counts.
pub fn classify_module(body: &[Stmt]) -> Classification {
  let mut classifier = Classifier::default();
  classifier.visit_stmts(body);
  classifier.result
}

/// Folds import-site evidence into the per-file classification and decides wrap kinds. Runs once,
/// before linking.
#[tracing::instrument(skip_all)]
pub fn classify_graph(
  modules: &mut IndexVec<ModuleIdx, NormOrExt>,
  code_splitting: bool,
) -> Vec<BuildError> {
  // A file without module syntax that someone requires is CommonJS.
  let required = modules
    .iter()
    .filter_map(NormOrExt::as_norm)
    .flat_map(|module| {
      module
        .import_records
        .iter()
        .filter(|record| matches!(record.kind, ImportKind::Require))
        .filter_map(|record| record.resolved)
    })
    .collect::<Vec<_>>();
  for idx in &required {
    if let Some(module) = modules[*idx].as_norm_mut() {
      if module.exports_kind == ExportsKind::None {
        module.exports_kind = ExportsKind::Cjs;
      }
    }
  }

  mark_dynamic_fallback(modules);
  decide_wrap_kinds(modules, &required, code_splitting);

  let mut diagnostics = vec![];
  for module in modules.iter().filter_map(NormOrExt::as_norm) {
    if !module.exports_kind.is_esm() {
      continue;
    }
    let reason_note = module.esm_reason.map(|reason| reason.note(module.id.as_path()));
    for span in &module.top_level_returns {
      let mut error = BuildError::top_level_return().at(module.id.as_path(), *span);
      if let Some(note) = &reason_note {
        error = error.with_note(note.clone());
      }
      diagnostics.push(error);
    }
    for span in &module.top_level_this {
      let mut info = BuildError::this_is_undefined().at(module.id.as_path(), *span);
      if let Some(note) = &reason_note {
        info = info.with_note(note.clone());
      }
      diagnostics.push(info);
    }
  }

  tracing::debug!(
    "classified modules {:#?}",
    modules
      .iter()
      .filter_map(NormOrExt::as_norm)
      .map(|m| (m.id.to_string(), m.exports_kind, m.wrap_kind))
      .collect::<Vec<_>>()
  );
  diagnostics
}

/// An ES module that star-exports a CommonJS module, an external module, or another such module
/// can't know all of its exports statically.
fn mark_dynamic_fallback(modules: &mut IndexVec<ModuleIdx, NormOrExt>) {
  // (importer, importee) for every `export *`
  let star_edges = modules
    .iter()
    .filter_map(NormOrExt::as_norm)
    .flat_map(|module| {
      module
        .star_export_records
        .iter()
        .filter_map(|record| module.import_records[*record].resolved)
        .map(move |importee| (module.idx, importee))
    })
    .collect::<Vec<_>>();

  let is_dynamic = |module: &NormOrExt| match module {
    NormOrExt::External(_) => true,
    NormOrExt::Normal(m) => matches!(
      m.exports_kind,
      ExportsKind::Cjs | ExportsKind::EsmWithDynamicFallback
    ),
  };

  let mut worklist = star_edges
    .iter()
    .filter(|(_, importee)| is_dynamic(&modules[*importee]))
    .map(|(importer, _)| *importer)
    .collect::<Vec<_>>();

  while let Some(idx) = worklist.pop() {
    let Some(module) = modules[idx].as_norm_mut() else {
      continue;
    };
    if module.exports_kind != ExportsKind::Esm {
      continue;
    }
    module.exports_kind = ExportsKind::EsmWithDynamicFallback;
    worklist.extend(
      star_edges
        .iter()
        .filter(|(_, importee)| *importee == idx)
        .map(|(importer, _)| *importer),
    );
  }
}

fn decide_wrap_kinds(
  modules: &mut IndexVec<ModuleIdx, NormOrExt>,
  required: &[ModuleIdx],
  code_splitting: bool,
) {
  let mut lazy = required.to_vec();
  if !code_splitting {
    lazy.extend(
      modules
        .iter()
        .filter_map(NormOrExt::as_norm)
        .flat_map(|module| module.dynamic_dependencies().collect::<Vec<_>>()),
    );
  }

  for module in modules.iter_mut().filter_map(NormOrExt::as_norm_mut) {
    if module.exports_kind == ExportsKind::Cjs {
      module.wrap_kind = WrapKind::Cjs;
    }
  }

  // The lazy initializer propagates to static dependencies, so they run when it runs.
  while let Some(idx) = lazy.pop() {
    let Some(module) = modules[idx].as_norm_mut() else {
      continue;
    };
    if module.wrap_kind != WrapKind::None {
      continue;
    }
    module.wrap_kind = WrapKind::Esm;
    lazy.extend(
      module
        .import_records
        .iter()
        .filter(|record| record.kind.is_static())
        .filter_map(|record| record.resolved),
    );
  }
}

#[cfg(test)]
mod tests {
  use knit_ast::{SymbolId, SymbolTable};

  use super::*;

  fn ident(name: &str, symbol: Option<SymbolId>) -> Expr {
    Expr::Ident(Ident::new(name, symbol, Span::DUMMY))
  }

  #[test]
  fn await_inside_function_is_not_top_level() {
    let mut symbols = SymbolTable::new();
    let scope = symbols.add_scope(symbols.root_scope(), knit_ast::ScopeKind::Function);
    let body = vec![Stmt::expr(Expr::Arrow(ArrowExpr {
      params: vec![],
      body: ArrowBody::Expr(Box::new(Expr::Await(
        Box::new(ident("x", None)),
        Span::new(6, 13),
      ))),
      is_async: true,
      no_side_effects: false,
      scope,
      span: Span::new(0, 13),
    }))];
    let classification = classify_module(&body);
    assert_eq!(classification.exports_kind(), ExportsKind::None);

    let body = vec![Stmt::expr(Expr::Await(
      Box::new(ident("x", None)),
      Span::new(0, 7),
    ))];
    let classification = classify_module(&body);
    assert_eq!(classification.exports_kind(), ExportsKind::Esm);
    assert_eq!(
      classification.esm_reason,
      Some(EsmReason {
        kind: EsmReasonKind::TopLevelAwait,
        span: Span::new(0, 5)
      })
    );
  }

  #[test]
  fn unbound_exports_is_commonjs() {
    let body = vec![Stmt::expr(Expr::member(ident("exports", None), "a"))];
    assert_eq!(classify_module(&body).exports_kind(), ExportsKind::Cjs);

    // A local named `module` is not evidence.
    let body = vec![Stmt::expr(ident("module", Some(SymbolId::from_usize(0))))];
    assert_eq!(classify_module(&body).exports_kind(), ExportsKind::None);
  }

  #[test]
  fn top_level_this_skips_functions_but_not_arrows() {
    let mut symbols = SymbolTable::new();
    let scope = symbols.add_scope(symbols.root_scope(), knit_ast::ScopeKind::Function);
    let body = vec![
      Stmt::expr(Expr::Arrow(ArrowExpr {
        params: vec![],
        body: ArrowBody::Expr(Box::new(Expr::This(Span::new(6, 10)))),
        is_async: false,
        no_side_effects: false,
        scope,
        span: Span::new(0, 10),
      })),
      Stmt::expr(Expr::Fn(FnExpr {
        ident: None,
        function: Function {
          params: vec![],
          body: vec![Stmt::expr(Expr::This(Span::new(30, 34)))],
          is_async: false,
          is_generator: false,
          no_side_effects: false,
          scope,
          span: Span::new(12, 40),
        },
      })),
    ];
    assert_eq!(classify_module(&body).top_level_this, vec![Span::new(6, 10)]);
  }
}
