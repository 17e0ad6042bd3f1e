use hashlink::LinkedHashMap;
use knit_ast::Atom;
use knit_common::{ModuleIdx, SymbolRef};

use crate::{classifier::ExportsKind, normal_module::ResolvedExport, Graph};

struct StarFrame {
  module: ModuleIdx,
  next_star: usize,
}

impl Graph {
  /// Fills `resolved_exports` of every module: the local exports first, then whatever `export *`
  /// brings in.
  #[tracing::instrument(skip_all)]
  pub(super) fn resolve_exports(&mut self) {
    let resolved = self
      .sorted_modules
      .iter()
      .filter_map(|idx| self.normal(*idx))
      .map(|module| (module.idx, self.resolve_exports_of(module.idx)))
      .collect::<Vec<_>>();
    for (idx, exports) in resolved {
      if let Some(module) = self.modules[idx].as_norm_mut() {
        module.resolved_exports = exports;
      }
    }
  }

  fn resolve_exports_of(&self, idx: ModuleIdx) -> LinkedHashMap<Atom, ResolvedExport> {
    let Some(module) = self.normal(idx) else {
      return LinkedHashMap::default();
    };
    let mut resolved = module
      .local_exports
      .iter()
      .map(|(name, export)| {
        (
          name.clone(),
          ResolvedExport {
            symbol: module.symbol_ref(export.symbol),
            potentially_ambiguous: vec![],
          },
        )
      })
      .collect::<LinkedHashMap<_, _>>();

    // The stack holds the path of `export *` hops from `idx` to the module being walked.
    let mut stack = vec![StarFrame {
      module: idx,
      next_star: 0,
    }];
    while let Some(frame) = stack.last_mut() {
      let Some(source) = self.normal(frame.module) else {
        stack.pop();
        continue;
      };
      let Some(record) = source.star_export_records.get(frame.next_star) else {
        stack.pop();
        continue;
      };
      frame.next_star += 1;

      let Some(target) = source.importee_of(*record).and_then(|t| self.normal(t)) else {
        // External targets are read at run-time through the namespace object.
        continue;
      };
      if target.exports_kind == ExportsKind::Cjs
        || stack.iter().any(|frame| frame.module == target.idx)
      {
        continue;
      }

      for (name, export) in &target.local_exports {
        if name == "default" {
          continue;
        }
        let shadowed = stack.iter().any(|frame| {
          self
            .normal(frame.module)
            .is_some_and(|m| m.local_exports.contains_key(name))
        });
        if shadowed {
          continue;
        }
        let symbol = SymbolRef::new(target.idx, export.symbol);
        match resolved.get_mut(name) {
          None => {
            resolved.insert(
              name.clone(),
              ResolvedExport {
                symbol,
                potentially_ambiguous: vec![],
              },
            );
          }
          Some(existing) => {
            if existing.symbol != symbol && !existing.potentially_ambiguous.contains(&symbol) {
              existing.potentially_ambiguous.push(symbol);
            }
          }
        }
      }

      stack.push(StarFrame {
        module: target.idx,
        next_star: 0,
      });
    }

    tracing::trace!(
      "resolved exports of {}: {:?}",
      module.id,
      resolved.keys().collect::<Vec<_>>()
    );
    resolved
  }

  /// A name reached through `export *` from several origins is only ambiguous when the origins
  /// are different bindings.
  #[tracing::instrument(skip_all)]
  pub(super) fn determine_ambiguous_exports(&mut self) {
    let mut settled = vec![];
    for idx in &self.sorted_modules {
      let Some(module) = self.normal(*idx) else {
        continue;
      };
      for (name, export) in &module.resolved_exports {
        if export.potentially_ambiguous.is_empty() {
          continue;
        }
        let main = self.final_symbol_of(export.symbol);
        let all_same = export
          .potentially_ambiguous
          .iter()
          .all(|origin| self.final_symbol_of(*origin) == main);
        if all_same {
          settled.push((*idx, name.clone()));
        }
      }
    }
    for (idx, name) in settled {
      if let Some(export) = self.modules[idx]
        .as_norm_mut()
        .and_then(|m| m.resolved_exports.get_mut(&name))
      {
        export.potentially_ambiguous.clear();
      }
    }
  }

  /// The names exported by `idx`, without the ambiguous ones.
  pub(crate) fn unambiguous_exports(
    &self,
    idx: ModuleIdx,
  ) -> impl Iterator<Item = (&Atom, &ResolvedExport)> {
    self
      .normal(idx)
      .into_iter()
      .flat_map(|module| module.resolved_exports.iter())
      .filter(|(_, export)| export.potentially_ambiguous.is_empty())
  }
}
