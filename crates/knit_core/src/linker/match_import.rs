use knit_ast::{Atom, ImportRecordIdx};
use knit_common::{ModuleIdx, SymbolRef};
use knit_error::UndefinedImportReason;

use crate::{
  classifier::ExportsKind,
  normal_module::{Imported, NamedImport},
  Graph, NormOrExt,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MatchImportKind {
  /// Bound to a declaration or to a namespace object.
  Found(SymbolRef),
  /// The importee is CommonJS. `name` is `None` for `import * as ns`.
  Cjs {
    importer: ModuleIdx,
    record: ImportRecordIdx,
    name: Option<Atom>,
    /// The importee's exports are statically known and don't include `name`.
    known_missing: bool,
  },
  /// Read from the namespace object of an ES module that star-exports CommonJS or external
  /// modules.
  DynamicFallback { namespace: SymbolRef, name: Atom },
  External { module: ModuleIdx, imported: Imported },
  NoMatch { importee: ModuleIdx },
  ProbablyUndefined {
    importee: ModuleIdx,
    reason: UndefinedImportReason,
  },
  Ambiguous(Vec<SymbolRef>),
  Cycle,
  /// The import record didn't resolve. The loader already reported it.
  Unresolved,
}

impl Graph {
  fn named_import(&self, tracker: SymbolRef) -> Option<&NamedImport> {
    self.normal(tracker.owner)?.named_imports.get(&tracker.symbol)
  }

  /// Follows re-export hops from the import `start` until it reaches a declaration or a dead end.
  /// Returns the last import on the way together with the outcome.
  pub(crate) fn match_import(
    &self,
    start: SymbolRef,
    check_ambiguity: bool,
  ) -> (SymbolRef, MatchImportKind) {
    let mut seen = vec![];
    let mut tracker = start;
    loop {
      if seen.contains(&tracker) {
        return (tracker, MatchImportKind::Cycle);
      }
      seen.push(tracker);

      let Some(import) = self.named_import(tracker) else {
        return (tracker, MatchImportKind::Found(tracker));
      };
      let Some(importer) = self.normal(tracker.owner) else {
        return (tracker, MatchImportKind::Unresolved);
      };
      let Some(target_idx) = importer.importee_of(import.record) else {
        return (tracker, MatchImportKind::Unresolved);
      };
      let target = match &self.modules[target_idx] {
        NormOrExt::External(_) => {
          return (
            tracker,
            MatchImportKind::External {
              module: target_idx,
              imported: import.imported.clone(),
            },
          )
        }
        NormOrExt::Normal(target) => target,
      };

      if target.exports_kind == ExportsKind::Cjs {
        let name = match &import.imported {
          Imported::Star => None,
          Imported::Name(name) => Some(name.clone()),
        };
        let known_missing = match (&name, &target.cjs_static_exports) {
          (Some(name), Some(exports)) => name != "default" && !exports.contains(name),
          _ => false,
        };
        return (
          tracker,
          MatchImportKind::Cjs {
            importer: tracker.owner,
            record: import.record,
            name,
            known_missing,
          },
        );
      }

      let name = match &import.imported {
        Imported::Star => {
          return (
            tracker,
            MatchImportKind::Found(target.symbol_ref(target.namespace_symbol)),
          )
        }
        Imported::Name(name) => name,
      };

      let Some(export) = target.resolved_exports.get(name) else {
        let kind = match target.exports_kind {
          ExportsKind::EsmWithDynamicFallback => MatchImportKind::DynamicFallback {
            namespace: target.symbol_ref(target.namespace_symbol),
            name: name.clone(),
          },
          ExportsKind::None => MatchImportKind::ProbablyUndefined {
            importee: target_idx,
            reason: UndefinedImportReason::NoExports,
          },
          ExportsKind::Esm | ExportsKind::Cjs => MatchImportKind::NoMatch {
            importee: target_idx,
          },
        };
        return (tracker, kind);
      };

      if check_ambiguity && !export.potentially_ambiguous.is_empty() {
        let origins = std::iter::once(export.symbol)
          .chain(export.potentially_ambiguous.iter().copied())
          .collect();
        return (tracker, MatchImportKind::Ambiguous(origins));
      }

      if self.named_import(export.symbol).is_some() {
        // `export { a } from './b'` or an import that is exported again
        tracker = export.symbol;
        continue;
      }
      return (tracker, MatchImportKind::Found(export.symbol));
    }
  }

  /// The declaration `symbol` stands for, ignoring ambiguity. Symbols that are not imports, and
  /// imports that don't resolve to a declaration, stand for themselves.
  pub(super) fn final_symbol_of(&self, symbol: SymbolRef) -> SymbolRef {
    if self.named_import(symbol).is_none() {
      return symbol;
    }
    match self.match_import(symbol, false) {
      (_, MatchImportKind::Found(found)) => found,
      _ => symbol,
    }
  }
}
