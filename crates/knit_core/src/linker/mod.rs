//! Binds every import to the symbol it refers to and checks what can only be checked once the
//! whole graph is known.

use knit_ast::{Atom, ImportRecordIdx, SymbolKind};
use knit_common::{ModuleIdx, SymbolRef};
use knit_error::{utils::PathExt, Note, UndefinedImportReason};
use rustc_hash::FxHashSet;

use crate::{
  classifier::{ExportsKind, WrapKind},
  normal_module::{ImportBinding, Imported},
  treeshake::PartKind,
  BuildError, Graph, NormOrExt,
};

mod inject;
mod match_import;
mod mutation;
mod resolve_exports;
mod top_level_await;

pub(crate) use match_import::MatchImportKind;

impl Graph {
  #[tracing::instrument(skip_all)]
  pub(crate) fn link(&mut self) {
    self.resolve_exports();
    self.determine_ambiguous_exports();
    self.bind_imports();
    self.reference_dynamic_namespaces();
    self.bind_injected_globals();
    self.check_mutations();
    self.check_required_top_level_awaits();
    self.mark_async_initializers();
    self.symbol_links = std::mem::take(&mut self.uf).freeze();
  }

  pub(crate) fn display_path(&self, idx: ModuleIdx) -> String {
    self.modules[idx].id().as_path().may_display_relative().into_owned()
  }

  fn declaration_span(&self, symbol: SymbolRef) -> knit_ast::Span {
    self.modules[symbol.owner].symbols().symbols[symbol.symbol].span
  }

  #[tracing::instrument(skip_all)]
  fn bind_imports(&mut self) {
    let imports = self
      .sorted_modules
      .iter()
      .filter_map(|idx| self.normal(*idx))
      .flat_map(|module| {
        module
          .named_imports
          .keys()
          .map(|symbol| module.symbol_ref(*symbol))
      })
      .collect::<Vec<_>>();

    let matched = imports
      .into_iter()
      .map(|start| {
        let (hop, kind) = self.match_import(start, true);
        (start, hop, kind)
      })
      .collect::<Vec<_>>();

    let mut reported = FxHashSet::default();
    for (start, hop, kind) in matched {
      tracing::trace!("matched import {:?} through {:?}: {:?}", start, hop, kind);
      let binding = match kind {
        MatchImportKind::Found(found) => {
          if found != start {
            self.uf.link(&start, &found);
          }
          None
        }
        MatchImportKind::Cjs {
          importer,
          record,
          name,
          known_missing,
        } => {
          let Some(namespace) = self.interop_symbol(importer, record) else {
            let error = BuildError::panic(format!(
              "{} has no namespace to read imports from",
              self.display_path(importer)
            ))
            .context(format!("binding the imports of {}", self.display_path(start.owner)));
            self.diagnostics.push(error);
            continue;
          };
          if known_missing && reported.insert(hop) {
            if let (Some(name), Some(importee)) = (&name, self.importee(importer, record)) {
              let error = BuildError::import_is_undefined(
                name.as_str(),
                self.modules[importee].id().as_path(),
                UndefinedImportReason::NoMatchingExport,
              );
              self.report_at_import(error, hop);
            }
          }
          match name {
            None => {
              self.uf.link(&start, &namespace);
              None
            }
            Some(name) => Some(ImportBinding::Property { namespace, name }),
          }
        }
        MatchImportKind::DynamicFallback { namespace, name } => {
          Some(ImportBinding::Property { namespace, name })
        }
        MatchImportKind::External { module, imported } => {
          let symbol = self.modules[module].as_ext_mut().map(|ext| match &imported {
            Imported::Star => ext.namespace_ref(),
            Imported::Name(name) => ext.find_exported_symbol(name),
          });
          if let Some(symbol) = symbol {
            self.uf.link(&start, &symbol);
          }
          None
        }
        MatchImportKind::NoMatch { importee } => {
          if reported.insert(hop) {
            let name = self.imported_name(hop);
            let is_ns_member = self
              .normal(hop.owner)
              .and_then(|m| m.named_imports.get(&hop.symbol))
              .is_some_and(|import| import.is_ns_member);
            let error = if is_ns_member {
              BuildError::import_is_undefined(
                name.as_str(),
                self.modules[importee].id().as_path(),
                UndefinedImportReason::NoMatchingExport,
              )
            } else {
              BuildError::missing_export(name.as_str(), self.modules[importee].id().as_path())
            };
            self.report_at_import(error, hop);
          }
          Some(ImportBinding::Undefined)
        }
        MatchImportKind::ProbablyUndefined { importee, reason } => {
          if reported.insert(hop) {
            let name = self.imported_name(hop);
            let error = BuildError::import_is_undefined(
              name.as_str(),
              self.modules[importee].id().as_path(),
              reason,
            );
            self.report_at_import(error, hop);
          }
          Some(ImportBinding::Undefined)
        }
        MatchImportKind::Ambiguous(origins) => {
          if reported.insert(hop) {
            let name = self.imported_name(hop);
            let notes = self.ambiguity_notes(&name, &origins);
            let error = BuildError::ambiguous_import(name.as_str()).with_notes(notes);
            self.report_at_import(error, hop);
          }
          Some(ImportBinding::Undefined)
        }
        MatchImportKind::Cycle => {
          if reported.insert(start) {
            let name = self.imported_name(start);
            self.report_at_import(BuildError::circular_reexport(name.as_str()), start);
          }
          Some(ImportBinding::Undefined)
        }
        MatchImportKind::Unresolved => Some(ImportBinding::Undefined),
      };

      if let Some(binding) = binding {
        if let Some(module) = self.modules[start.owner].as_norm_mut() {
          module.import_bindings.insert(start.symbol, binding);
        }
      }
    }
  }

  fn importee(&self, importer: ModuleIdx, record: ImportRecordIdx) -> Option<ModuleIdx> {
    self.normal(importer)?.importee_of(record)
  }

  fn imported_name(&self, import: SymbolRef) -> Atom {
    self
      .normal(import.owner)
      .and_then(|m| m.named_imports.get(&import.symbol))
      .map_or_else(|| Atom::new("*"), |import| Atom::new(import.imported.name()))
  }

  fn report_at_import(&mut self, error: BuildError, import: SymbolRef) {
    let error = match self.normal(import.owner) {
      Some(module) => {
        let span = module
          .named_imports
          .get(&import.symbol)
          .map_or_else(|| self.declaration_span(import), |import| import.span);
        error.at(module.id.as_path(), span)
      }
      None => error,
    };
    self.diagnostics.push(error);
  }

  pub(crate) fn ambiguity_notes(&self, name: &str, origins: &[SymbolRef]) -> Vec<Note> {
    origins
      .iter()
      .map(|origin| {
        Note::at(
          format!(
            r#"One definition of "{name}" comes from "{}" here:"#,
            self.display_path(origin.owner)
          ),
          self.modules[origin.owner].id().as_path(),
          self.declaration_span(*origin),
        )
      })
      .collect()
  }

  /// `import_foo`, holding `__toESM(require_foo())` for the CommonJS module `record` points to.
  /// Declared by the statement that carries the record, once per record.
  fn interop_symbol(
    &mut self,
    importer: ModuleIdx,
    record: ImportRecordIdx,
  ) -> Option<SymbolRef> {
    let importee = self.importee(importer, record);
    let hint = importee.map_or_else(
      || "import_module".to_string(),
      |idx| format!("import_{}", crate::make_legal(self.modules[idx].id().stem())),
    );
    let module = self.modules[importer].as_norm_mut()?;
    if let Some(symbol) = module.interop_symbols.get(&record) {
      return Some(module.symbol_ref(*symbol));
    }
    let symbol = module.create_top_level_symbol(hint, SymbolKind::Generated);
    module.interop_symbols.insert(record, symbol);
    let carrier = module
      .parts
      .iter_enumerated()
      .find(|(_, part)| {
        matches!(part.kind, PartKind::Stmt(_)) && part.import_records.contains(&record)
      })
      .map(|(idx, _)| idx);
    if let Some(part) = carrier {
      module.parts.declare_symbol(part, symbol);
    }
    Some(module.symbol_ref(symbol))
  }

  /// `export * from` a CommonJS or external module is served by the namespace object, so the
  /// statement needs it.
  fn reference_dynamic_namespaces(&mut self) {
    let dynamic_targets = self
      .modules
      .iter()
      .map(|module| match module {
        NormOrExt::External(_) => true,
        NormOrExt::Normal(m) => m.exports_kind == ExportsKind::Cjs,
      })
      .collect::<Vec<_>>();
    for module in self.modules.iter_mut().filter_map(NormOrExt::as_norm_mut) {
      let namespace = module.namespace_symbol;
      let star_records = module
        .star_export_records
        .iter()
        .copied()
        .filter(|record| {
          module
            .importee_of(*record)
            .is_some_and(|target| dynamic_targets[target.index()])
        })
        .collect::<Vec<_>>();
      for part in module.parts.parts.iter_mut() {
        if part.import_records.iter().any(|r| star_records.contains(r)) {
          part.add_reference(namespace);
        }
      }
    }
  }

  /// An ES module that is lazily initialized runs its initializer asynchronously when it, or a
  /// module it imports, has a top-level await.
  fn mark_async_initializers(&mut self) {
    for idx in self.sorted_modules.clone() {
      let Some(module) = self.normal(idx) else {
        continue;
      };
      if module.wrap_kind != WrapKind::Esm {
        continue;
      }
      let is_async = !module.live_top_level_awaits.is_empty()
        || module
          .import_records
          .iter()
          .filter(|record| record.kind.is_static())
          .filter_map(|record| record.resolved)
          .any(|dep| self.normal(dep).is_some_and(|dep| dep.is_async_init));
      if let Some(module) = self.modules[idx].as_norm_mut() {
        module.is_async_init = is_async;
      }
    }
  }
}
