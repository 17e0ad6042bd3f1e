//! Turns a chunk and its naming context into code: module bodies with module syntax removed,
//! cross-chunk and external imports, runtime helpers and the chunk's exports.

use hashlink::{LinkedHashMap, LinkedHashSet};
use itertools::Itertools;
use knit_ast::{
  ast::*,
  codegen::{Codegen, CodegenOptions},
  Atom,
};
use knit_ast_template as template;
use knit_common::{ImportKind, ModuleIdx, SymbolRef};
use knit_runtime_helpers::RuntimeHelpers;
use rustc_hash::FxHashMap;

use crate::{
  chunk::{Chunk, ChunkGraph, ChunkIdx},
  classifier::WrapKind,
  interop::Interop,
  make_legal,
  renamer::{MangledProps, NamingContext},
  Graph, LegalComments, ModuleFormat, OutputChunk, OutputOptions,
};

mod module_finalizer;
mod rewriter;

use module_finalizer::ModuleFinalizer;

/// What a chunk pulls from one external module.
#[derive(Debug, Default)]
struct ExternalImport {
  /// Imported names with the symbols standing for them.
  named: LinkedHashMap<Atom, SymbolRef>,
  namespace: bool,
}

pub(crate) struct ChunkFinalizer<'a> {
  pub graph: &'a Graph,
  pub chunk_graph: &'a ChunkGraph,
  pub chunk_idx: ChunkIdx,
  pub props: &'a MangledProps,
  pub output_options: &'a OutputOptions,
}

impl<'a> ChunkFinalizer<'a> {
  fn chunk(&self) -> &'a Chunk {
    &self.chunk_graph.chunks[self.chunk_idx]
  }

  fn entry(&self) -> Option<&'a crate::NormalModule> {
    self.chunk().entry_module().and_then(|idx| self.graph.normal(idx))
  }

  #[tracing::instrument(skip_all)]
  pub(crate) fn finalize(self, ctx: &mut NamingContext) -> OutputChunk {
    let format = self.output_options.format;
    let chunk = self.chunk();
    let export_locals = self.reserve_export_locals(ctx);

    let helpers = RuntimeHelpers::new();
    let interop = Interop {
      graph: self.graph,
      chunk_graph: self.chunk_graph,
      ctx,
      helpers: &helpers,
      output_options: self.output_options,
    };

    let modules = chunk
      .modules
      .iter()
      .filter_map(|(idx, parts)| self.graph.normal(*idx).map(|module| (module, parts)))
      .map(|(module, parts)| {
        let mut stmts = ModuleFinalizer {
          interop: &interop,
          module,
          parts,
          props: self.props,
          keep_names: self.output_options.keep_names,
        }
        .finalize();
        if self.output_options.minify.syntax {
          merge_adjacent_vars(&mut stmts);
        }
        (module, stmts)
      })
      .collect_vec();

    let (imports, prologue) = self.prologue(&interop);
    let (exports, epilogue) = self.epilogue(&interop, &export_locals);

    let mut legal_comments = LinkedHashSet::new();
    let mut codegen = Codegen::new(CodegenOptions {
      minify_whitespace: self.output_options.minify.whitespace,
    });
    let entry = self.entry();
    if let Some(hashbang) = entry.and_then(|entry| entry.hashbang.as_ref()) {
      codegen.raw_line(hashbang);
    }
    let directives = entry
      .filter(|entry| entry.wrap_kind != WrapKind::Cjs)
      .map(|entry| {
        entry
          .directives
          .iter()
          .map(|directive| directive.value.clone())
          .filter(|value| !(format.is_es() && value.as_str() == "use strict"))
          .collect_vec()
      })
      .unwrap_or_default();

    let mut render_body = |codegen: &mut Codegen| {
      for helper in helpers.generate_helpers() {
        codegen.raw_line(helper.trim_end());
      }
      codegen.print_stmts(&prologue);
      for (module, stmts) in &modules {
        if stmts.is_empty() {
          continue;
        }
        codegen.blank_line();
        codegen.comment_line(&self.graph.display_path(module.idx));
        for comment in &module.legal_comments {
          match self.output_options.legal_comments {
            LegalComments::None => {}
            LegalComments::Inline => codegen.raw_line(&comment.text),
            LegalComments::Eof | LegalComments::Linked | LegalComments::External => {
              legal_comments.insert(comment.text.clone());
            }
          }
        }
        codegen.print_stmts(stmts);
      }
    };

    match format {
      ModuleFormat::Iife => {
        codegen.iife(self.output_options.global_name.as_deref(), false, |codegen| {
          directives.iter().for_each(|value| codegen.directive(value));
          render_body(codegen);
          codegen.print_stmts(&epilogue);
        });
      }
      ModuleFormat::Esm | ModuleFormat::Cjs | ModuleFormat::Preserve => {
        directives.iter().for_each(|value| codegen.directive(value));
        render_body(&mut codegen);
        codegen.print_stmts(&epilogue);
      }
    }

    let legal_comments = legal_comments.into_iter().collect_vec();
    match self.output_options.legal_comments {
      LegalComments::Eof => legal_comments
        .iter()
        .for_each(|comment| codegen.raw_line(comment)),
      LegalComments::Linked if !legal_comments.is_empty() => codegen.raw_line(&format!(
        "/*! For license information please see {}.LEGAL.txt */",
        chunk.filename
      )),
      _ => {}
    }

    let mut used_helpers = helpers.used_names().into_iter().collect_vec();
    used_helpers.sort_unstable();
    tracing::debug!(
      "finalized {} with {} modules and helpers {:?}",
      chunk.filename,
      modules.len(),
      used_helpers
    );

    OutputChunk {
      name: chunk.name.clone(),
      filename: chunk.filename.clone(),
      is_entry: chunk.is_user_defined_entry(),
      is_dynamic_entry: chunk.is_dynamic_entry(),
      modules: modules
        .iter()
        .map(|(module, _)| module.id.clone())
        .collect(),
      code: codegen.into_string(),
      exports,
      imports,
      helpers: used_helpers,
      legal_comments: match self.output_options.legal_comments {
        LegalComments::Linked | LegalComments::External => {
          legal_comments.iter().map(|c| c.to_string()).collect()
        }
        _ => vec![],
      },
    }
  }

  /// ES output can only export names, so an entry export read through an object gets a local
  /// variable of its own.
  fn reserve_export_locals(&self, ctx: &mut NamingContext) -> FxHashMap<Atom, Atom> {
    let mut locals = FxHashMap::default();
    if !self.output_options.format.is_es() {
      return locals;
    }
    let Some(entry) = self.entry() else {
      return locals;
    };
    for (name, export) in self.graph.unambiguous_exports(entry.idx) {
      let canonical = self.graph.canonical_ref(export.symbol);
      if self.graph.binding_of(canonical).is_some() {
        let local = ctx.create_conflictless_name(&format!("export_{}", make_legal(name)));
        locals.insert(name.clone(), local);
      }
    }
    locals
  }

  /// Imports from other chunks and from external modules, with the sources they name.
  fn prologue(&self, interop: &Interop) -> (Vec<String>, Vec<Stmt>) {
    let chunk = self.chunk();
    let mut sources = vec![];
    let mut stmts = vec![];

    if self.output_options.format.is_es() {
      for other in &chunk.side_effect_imports {
        let source = format!("./{}", self.chunk_graph.chunks[*other].filename);
        stmts.push(template::build_import_stmt(&source, vec![]));
        sources.push(source);
      }
      for (other, symbols) in &chunk.imports_from_chunks {
        let other = &self.chunk_graph.chunks[*other];
        let source = format!("./{}", other.filename);
        let specifiers = symbols
          .iter()
          .map(|symbol| {
            let alias = other
              .exports_to_chunks
              .get(symbol)
              .cloned()
              .unwrap_or_else(|| interop.name(*symbol));
            (alias, interop.name(*symbol))
          })
          .collect_vec();
        stmts.push(template::build_import_stmt(&source, specifiers));
        sources.push(source);
      }
    }

    for (idx, import) in self.external_imports() {
      let Some(ext) = self.graph.modules[idx].as_ext() else {
        continue;
      };
      let source = ext.id.to_string();
      let namespace = interop.name(ext.namespace_ref());
      if self.output_options.format.is_es() {
        if import.namespace {
          stmts.push(template::build_import_star_stmt(&source, &namespace));
        }
        if !import.named.is_empty() || !import.namespace {
          let specifiers = import
            .named
            .iter()
            .map(|(imported, symbol)| (imported.clone(), interop.name(*symbol)))
            .collect_vec();
          stmts.push(template::build_import_stmt(&source, specifiers));
        }
      } else {
        let require = template::call_global("require", vec![Expr::str(source.as_str())]);
        if import.namespace || !import.named.is_empty() {
          interop.helpers.to_esm();
          stmts.push(template::var(&namespace, Some(template::to_esm(require, false))));
        } else {
          stmts.push(Stmt::expr(require));
        }
      }
      sources.push(source);
    }

    (sources, stmts)
  }

  /// External modules the chunk imports statically, in first-use order.
  fn external_imports(&self) -> LinkedHashMap<ModuleIdx, ExternalImport> {
    let is_es = self.output_options.format.is_es();
    let mut imports: LinkedHashMap<ModuleIdx, ExternalImport> = LinkedHashMap::default();
    let add_symbol = |symbol: SymbolRef, imports: &mut LinkedHashMap<ModuleIdx, ExternalImport>| {
      let Some(ext) = self.graph.modules[symbol.owner].as_ext() else {
        return;
      };
      let import = imports.entry(ext.idx).or_insert_with(Default::default);
      if symbol.symbol == ext.namespace_symbol || !is_es {
        import.namespace = true;
        return;
      }
      if let Some((name, _)) = ext.exports.iter().find(|(_, s)| **s == symbol.symbol) {
        import.named.entry(name.clone()).or_insert(symbol);
      }
    };

    for (idx, parts) in &self.chunk().modules {
      let Some(module) = self.graph.normal(*idx) else {
        continue;
      };
      for part_idx in parts {
        let part = &module.parts[*part_idx];
        for record_idx in &part.import_records {
          let record = &module.import_records[*record_idx];
          if record.kind != ImportKind::Static {
            continue;
          }
          let Some(ext) = record
            .resolved
            .and_then(|target| self.graph.modules[target].as_ext())
          else {
            continue;
          };
          let import = imports.entry(ext.idx).or_insert_with(Default::default);
          if module.star_export_records.contains(record_idx) {
            import.namespace = true;
          }
        }
        for symbol in self.graph.symbols_used_by_part(module, part) {
          add_symbol(symbol, &mut imports);
        }
      }
    }
    if let Some(entry) = self.entry() {
      for symbol in self.graph.export_surface_symbols(entry.idx) {
        add_symbol(symbol, &mut imports);
      }
    }
    imports
  }

  /// Sources of external modules the entry re-exports with `export *`, directly or through other
  /// ES modules.
  fn external_star_exports(&self, entry: ModuleIdx) -> LinkedHashSet<String> {
    let mut sources = LinkedHashSet::new();
    let mut visited = vec![entry];
    let mut stack = vec![entry];
    while let Some(idx) = stack.pop() {
      let Some(module) = self.graph.normal(idx) else {
        continue;
      };
      for record in &module.star_export_records {
        let Some(target) = module.importee_of(*record) else {
          continue;
        };
        match &self.graph.modules[target] {
          crate::NormOrExt::External(ext) => {
            sources.insert(ext.id.to_string());
          }
          crate::NormOrExt::Normal(target) => {
            if target.exports_kind.is_esm() && !visited.contains(&target.idx) {
              visited.push(target.idx);
              stack.push(target.idx);
            }
          }
        }
      }
    }
    sources
  }

  /// The chunk's exports: an `export` statement for ES output, `module.exports` for CommonJS and
  /// the return value of an `iife`.
  fn epilogue(
    &self,
    interop: &Interop,
    export_locals: &FxHashMap<Atom, Atom>,
  ) -> (Vec<Atom>, Vec<Stmt>) {
    let format = self.output_options.format;
    let mut stmts = vec![];
    let mut exports = vec![];
    let entry = self.entry();

    if let Some(init) = entry.and_then(|entry| interop.init_call(entry)) {
      stmts.push(Stmt::expr(init));
    }

    let entry_exports = entry.map(|entry| {
      if let Some(require) = interop.require_wrapper_call(entry) {
        return EntryExports::CommonJs(require);
      }
      if !entry.exports_kind.is_esm() {
        return EntryExports::None;
      }
      EntryExports::Esm(entry)
    });

    match format {
      ModuleFormat::Esm | ModuleFormat::Preserve => {
        let mut specifiers = vec![];
        match entry_exports {
          Some(EntryExports::CommonJs(require)) => {
            stmts.push(template::build_export_default_stmt(require));
            exports.push(Atom::new("default"));
          }
          Some(EntryExports::Esm(entry)) => {
            for (name, export) in self.graph.unambiguous_exports(entry.idx) {
              let canonical = self.graph.canonical_ref(export.symbol);
              let local = match export_locals.get(name) {
                Some(local) => {
                  stmts.push(template::var(local, Some(interop.reference(canonical))));
                  local.clone()
                }
                None => interop.name(canonical),
              };
              specifiers.push((name.clone(), local));
            }
            for source in self.external_star_exports(entry.idx) {
              stmts.push(template::build_export_all_stmt(&source));
            }
          }
          Some(EntryExports::None) | None => {}
        }
        for (symbol, alias) in &self.chunk().exports_to_chunks {
          specifiers.push((alias.clone(), interop.name(*symbol)));
        }
        exports.extend(specifiers.iter().map(|(name, _)| name.clone()));
        if !specifiers.is_empty() {
          stmts.push(template::build_exports_stmt(specifiers));
        }
      }
      ModuleFormat::Cjs | ModuleFormat::Iife => {
        let value = match entry_exports {
          Some(EntryExports::CommonJs(require)) => Some(require),
          Some(EntryExports::Esm(entry)) => {
            interop.helpers.to_common_js();
            exports.extend(
              self
                .graph
                .unambiguous_exports(entry.idx)
                .map(|(name, _)| name.clone()),
            );
            Some(template::to_common_js(&interop.namespace_name(entry)))
          }
          Some(EntryExports::None) | None => None,
        };
        match (format, value) {
          (ModuleFormat::Cjs, Some(value)) => stmts.push(template::module_exports_assign(value)),
          (ModuleFormat::Iife, Some(value)) if self.output_options.global_name.is_some() => {
            stmts.push(Stmt::Return(ReturnStmt {
              arg: Some(value),
              span: knit_ast::Span::DUMMY,
            }));
          }
          _ => {}
        }
      }
    }
    exports.sort();
    (exports, stmts)
  }
}

enum EntryExports<'a> {
  CommonJs(Expr),
  Esm(&'a crate::NormalModule),
  None,
}

/// Joins runs of `var` declarations into one statement.
fn merge_adjacent_vars(stmts: &mut Vec<Stmt>) {
  let mut merged: Vec<Stmt> = Vec::with_capacity(stmts.len());
  for stmt in std::mem::take(stmts) {
    let follows_var = matches!(merged.last(), Some(Stmt::Var(prev)) if prev.kind == VarKind::Var);
    match stmt {
      Stmt::Var(next) if follows_var && next.kind == VarKind::Var => {
        if let Some(Stmt::Var(prev)) = merged.last_mut() {
          prev.decls.extend(next.decls);
        }
      }
      stmt => merged.push(stmt),
    }
  }
  *stmts = merged;
}
