//! Per-file analysis that runs before linking: dead-branch elimination, import and export tables,
//! statement parts and the diagnostics that only need one file.

use knit_ast::{
  ast::*,
  visit::{walk_arrow, walk_function, Visit},
  visit_mut::VisitMut,
  Span, SymbolId, SymbolKind,
};
use knit_common::ModuleIdx;
use oxc_index::IndexVec;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::{
  classifier::{ExportsKind, WrapKind},
  normal_module::{Imported, LocalExport, NamedImport},
  treeshake::{PartKind, StatementPart},
  BuildError, NormOrExt, NormalModule,
};

mod cjs_exports;
mod dead_branch;
mod namespace_member;
mod part_collector;
mod suspicious;

use cjs_exports::static_cjs_exports;
use dead_branch::DeadBranchEliminator;
use namespace_member::NamespaceMemberRewriter;
use part_collector::PartCollector;
use suspicious::SuspiciousCodeFinder;

#[tracing::instrument(skip_all)]
pub(crate) fn scan_modules(modules: &mut IndexVec<ModuleIdx, NormOrExt>) -> Vec<BuildError> {
  let errors = modules
    .raw
    .par_iter_mut()
    .filter_map(NormOrExt::as_norm_mut)
    .flat_map_iter(scan_module)
    .collect::<Vec<_>>();
  tracing::debug!("scanned modules with {} diagnostics", errors.len());
  errors
}

pub(crate) fn scan_module(module: &mut NormalModule) -> Vec<BuildError> {
  DeadBranchEliminator.visit_mut_stmts(&mut module.body);

  collect_imports_and_exports(module);

  let namespaces = module
    .named_imports
    .iter()
    .filter(|(symbol, import)| {
      import.imported == Imported::Star
        && module.symbols.symbols[**symbol].kind == SymbolKind::Namespace
    })
    .map(|(symbol, import)| (*symbol, import.record))
    .collect::<FxHashMap<_, _>>();
  let member_imports =
    NamespaceMemberRewriter::new(namespaces, &mut module.symbols).rewrite(&mut module.body);
  module.named_imports.extend(member_imports);

  create_parts(module);
  module.no_side_effects_fns = collect_no_side_effects_fns(&module.body);
  module.live_top_level_awaits = find_live_top_level_awaits(&module.body);
  if module.exports_kind == ExportsKind::Cjs {
    module.cjs_static_exports = static_cjs_exports(&module.body);
  }

  let mut finder = SuspiciousCodeFinder::new(&module.id);
  finder.visit_stmts(&module.body);
  tracing::trace!(
    "scanned {}: {} parts, {} imports, {} local exports",
    module.id,
    module.parts.parts.len(),
    module.named_imports.len(),
    module.local_exports.len()
  );
  finder.errors
}

fn collect_imports_and_exports(module: &mut NormalModule) {
  let mut declared = vec![];
  for stmt in &module.body {
    match stmt {
      Stmt::Import(decl) => {
        let Some(record) = decl.record else {
          continue;
        };
        for specifier in &decl.specifiers {
          let (local, imported) = match specifier {
            ImportSpecifier::Named { imported, local } => (local, Imported::Name(imported.clone())),
            ImportSpecifier::Default(local) => (local, Imported::Name("default".into())),
            ImportSpecifier::Namespace(local) => (local, Imported::Star),
          };
          if let Some(symbol) = local.symbol {
            module.named_imports.insert(
              symbol,
              NamedImport {
                record,
                imported,
                span: local.span,
                is_ns_member: false,
              },
            );
          }
        }
      }
      Stmt::ExportNamed(decl) => {
        for specifier in &decl.specifiers {
          let (local, exported, imported) = match specifier {
            ExportSpecifier::Named { local, exported } => {
              (local, exported, Imported::Name(local.name.clone()))
            }
            ExportSpecifier::Namespace { local, exported } => (local, exported, Imported::Star),
          };
          let Some(symbol) = local.symbol else {
            continue;
          };
          if let Some(record) = decl.record {
            module.named_imports.insert(
              symbol,
              NamedImport {
                record,
                imported,
                span: local.span,
                is_ns_member: false,
              },
            );
          }
          module.local_exports.insert(
            exported.clone(),
            LocalExport {
              symbol,
              span: local.span,
            },
          );
        }
      }
      Stmt::ExportDecl(decl) => match &decl.decl {
        Decl::Var(var) => var.decls.iter().for_each(|declarator| {
          declarator.name.for_each_ident(&mut |ident| declared.push(ident.clone()))
        }),
        Decl::Fn(f) => declared.push(f.ident.clone()),
        Decl::Class(c) => declared.push(c.ident.clone()),
      },
      Stmt::ExportDefault(decl) => {
        if let Some(symbol) = decl.local.symbol {
          module.local_exports.insert(
            "default".into(),
            LocalExport {
              symbol,
              span: decl.span,
            },
          );
        }
      }
      _ => {}
    }
  }
  for ident in declared {
    if let Some(symbol) = ident.symbol {
      module.local_exports.insert(
        ident.name,
        LocalExport {
          symbol,
          span: ident.span,
        },
      );
    }
  }
}

fn create_parts(module: &mut NormalModule) {
  let NormalModule {
    body,
    symbols,
    parts,
    write_sites,
    namespace_calls,
    ..
  } = module;

  for (idx, stmt) in body.iter().enumerate() {
    let mut part = StatementPart::new(PartKind::Stmt(idx));
    match stmt {
      Stmt::Import(ImportDecl { record, .. })
      | Stmt::ExportNamed(ExportNamed { record, .. })
      | Stmt::ExportAll(ExportAll { record, .. }) => {
        let Some(record) = record else {
          continue;
        };
        part.import_records.push(*record);
        part.side_effects = true;
      }
      _ => {
        PartCollector::new(symbols, &mut part, write_sites, namespace_calls).visit_stmt(stmt);
      }
    }
    parts.add(part);
  }

  let stem = module.legal_stem();
  module.namespace_symbol =
    module.create_top_level_symbol(format!("{stem}_exports"), SymbolKind::Generated);
  let mut namespace_part = StatementPart::new(PartKind::Namespace);
  namespace_part.declared.push(module.namespace_symbol);
  module.namespace_part = module.parts.add(namespace_part);

  let wrapper_name = match module.wrap_kind {
    WrapKind::None => None,
    WrapKind::Cjs => Some(format!("require_{stem}")),
    WrapKind::Esm => Some(format!("init_{stem}")),
  };
  if let Some(name) = wrapper_name {
    let symbol = module.create_top_level_symbol(name, SymbolKind::Wrapper);
    let mut wrapper_part = StatementPart::new(PartKind::Wrapper);
    wrapper_part.declared.push(symbol);
    module.wrapper_symbol = Some(symbol);
    module.wrapper_part = Some(module.parts.add(wrapper_part));
  }
}

/// Top-level functions annotated `/* @__NO_SIDE_EFFECTS__ */`, including
/// `const f = /* ... */ () => {}`.
fn collect_no_side_effects_fns(body: &[Stmt]) -> rustc_hash::FxHashSet<SymbolId> {
  let mut fns = rustc_hash::FxHashSet::default();
  let mut from_var = |var: &VarDecl| {
    for declarator in &var.decls {
      let annotated = match &declarator.init {
        Some(Expr::Fn(f)) => f.function.no_side_effects,
        Some(Expr::Arrow(arrow)) => arrow.no_side_effects,
        _ => false,
      };
      if let (true, Pat::Ident(Ident {
        symbol: Some(symbol),
        ..
      })) = (annotated, &declarator.name)
      {
        fns.insert(*symbol);
      }
    }
  };
  let mut annotated_fns = vec![];
  for stmt in body {
    match stmt {
      Stmt::Fn(decl)
      | Stmt::ExportDecl(ExportDecl {
        decl: Decl::Fn(decl),
        ..
      }) => annotated_fns.push((&decl.ident, decl.function.no_side_effects)),
      Stmt::ExportDefault(ExportDefault {
        local,
        value: DefaultValue::Fn(f),
        ..
      }) => annotated_fns.push((local, f.function.no_side_effects)),
      Stmt::Var(var)
      | Stmt::ExportDecl(ExportDecl {
        decl: Decl::Var(var),
        ..
      }) => from_var(var),
      _ => {}
    }
  }
  fns.extend(
    annotated_fns
      .into_iter()
      .filter(|(_, annotated)| *annotated)
      .filter_map(|(ident, _)| ident.symbol),
  );
  fns
}

#[derive(Default)]
struct TopLevelAwaitFinder {
  function_depth: u32,
  spans: Vec<Span>,
}

impl Visit for TopLevelAwaitFinder {
  fn visit_stmt(&mut self, stmt: &Stmt) {
    if let Stmt::ForInOf(for_stmt) = stmt {
      if for_stmt.is_await && self.function_depth == 0 {
        self.spans.push(for_stmt.span);
      }
    }
    knit_ast::visit::walk_stmt(self, stmt);
  }

  fn visit_expr(&mut self, expr: &Expr) {
    if let Expr::Await(_, span) = expr {
      if self.function_depth == 0 {
        self.spans.push(Span::new(span.start, span.start + "await".len() as u32));
      }
    }
    knit_ast::visit::walk_expr(self, expr);
  }

  fn visit_function(&mut self, function: &Function) {
    self.function_depth += 1;
    walk_function(self, function);
    self.function_depth -= 1;
  }

  fn visit_arrow(&mut self, arrow: &ArrowExpr) {
    self.function_depth += 1;
    walk_arrow(self, arrow);
    self.function_depth -= 1;
  }
}

/// `await` and `for await` outside any function, after dead branches are gone.
fn find_live_top_level_awaits(body: &[Stmt]) -> Vec<Span> {
  let mut finder = TopLevelAwaitFinder::default();
  finder.visit_stmts(body);
  finder.spans
}
