use knit_ast::{ast::Ident, visit_mut::VisitMut, Atom, SymbolId, SymbolKind};
use knit_common::SymbolRef;
use rustc_hash::FxHashMap;

use crate::Graph;

/// Points unbound references to the symbols that replace them.
struct UnboundRebinder<'a> {
  replacements: &'a FxHashMap<Atom, SymbolId>,
}

impl<'a> VisitMut for UnboundRebinder<'a> {
  fn visit_mut_ident(&mut self, ident: &mut Ident) {
    if ident.symbol.is_none() {
      if let Some(symbol) = self.replacements.get(&ident.name) {
        ident.symbol = Some(*symbol);
      }
    }
  }
}

impl Graph {
  /// Exports of injected files replace the globals of the same name in every other module.
  #[tracing::instrument(skip_all)]
  pub(super) fn bind_injected_globals(&mut self) {
    if self.injected.is_empty() {
      return;
    }
    // Later files win.
    let mut provided: FxHashMap<Atom, SymbolRef> = FxHashMap::default();
    for idx in &self.injected {
      for (name, export) in self.unambiguous_exports(*idx) {
        provided.insert(name.clone(), export.symbol);
      }
    }
    let provided = provided
      .into_iter()
      .map(|(name, symbol)| (name, self.uf.find_root(&symbol)))
      .collect::<FxHashMap<_, _>>();

    let targets = self
      .sorted_modules
      .iter()
      .copied()
      .filter(|idx| self.normal(*idx).is_some_and(|m| !m.is_injected))
      .collect::<Vec<_>>();

    for idx in targets {
      let Some(module) = self.modules[idx].as_norm_mut() else {
        continue;
      };
      let mut used = module
        .parts
        .parts
        .iter()
        .flat_map(|part| part.unbound.iter())
        .filter(|name| provided.contains_key(*name))
        .cloned()
        .collect::<Vec<_>>();
      used.sort();
      used.dedup();
      if used.is_empty() {
        continue;
      }

      let mut replacements = FxHashMap::default();
      let mut links = vec![];
      for name in used {
        let symbol = module.create_top_level_symbol(name.clone(), SymbolKind::Import);
        links.push((module.symbol_ref(symbol), provided[&name]));
        replacements.insert(name, symbol);
      }

      UnboundRebinder {
        replacements: &replacements,
      }
      .visit_mut_stmts(&mut module.body);
      for part in module.parts.parts.iter_mut() {
        let mut rebound = vec![];
        part.unbound.retain(|name| match replacements.get(name) {
          Some(symbol) => {
            rebound.push(*symbol);
            false
          }
          None => true,
        });
        rebound.into_iter().for_each(|symbol| part.add_reference(symbol));
      }

      tracing::trace!("injected {:?} into {}", replacements.keys(), module.id);
      for (alias, canonical) in links {
        self.uf.link(&alias, &canonical);
      }
    }
  }
}
