//! Statement-level tree shaking. Every entry walks the graph of files and statement parts from its
//! roots; whatever it reaches carries that entry's bit.

use knit_common::{EntryBits, ImportKind, ModuleIdx, SymbolRef};
use rustc_hash::FxHashSet;

use crate::{
  classifier::{ExportsKind, WrapKind},
  normal_module::ImportBinding,
  BuildError, Graph, NormOrExt, NormalModule, OutputOptions,
};

mod side_effects;
mod statement_part;
pub use statement_part::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
  /// The file is part of the output. Includes its wrapper and, unless the package opted out, its
  /// side effects.
  File(ModuleIdx),
  SideEffects(ModuleIdx),
  Part(ModuleIdx, PartIdx),
}

impl Graph {
  /// Top-level symbols a part needs at run-time, resolved through the linker. Includes the
  /// wrappers and namespace objects behind its import records.
  pub(crate) fn symbols_used_by_part(
    &self,
    module: &NormalModule,
    part: &StatementPart,
  ) -> Vec<SymbolRef> {
    let mut used = vec![];
    let push_symbol = |graph: &Graph, symbol: SymbolRef, used: &mut Vec<SymbolRef>| {
      let canonical = graph.canonical_ref(symbol);
      used.push(canonical);
      if let Some(ImportBinding::Property { namespace, .. }) = graph.binding_of(canonical) {
        used.push(graph.canonical_ref(*namespace));
      }
    };

    for symbol in part.referenced.keys() {
      push_symbol(self, module.symbol_ref(*symbol), &mut used);
    }

    for record_idx in &part.import_records {
      let record = &module.import_records[*record_idx];
      let Some(target) = record.resolved.and_then(|t| self.normal(t)) else {
        continue;
      };
      let wrapper = target.wrapper_symbol.map(|s| target.symbol_ref(s));
      let namespace = target.symbol_ref(target.namespace_symbol);
      match record.kind {
        ImportKind::Static => used.extend(wrapper),
        ImportKind::Require => {
          used.extend(wrapper);
          if target.exports_kind != ExportsKind::Cjs {
            used.push(namespace);
          }
        }
        ImportKind::DynamicImport => {
          if target.is_dynamic_entry {
            continue;
          }
          used.extend(wrapper);
          if target.exports_kind != ExportsKind::Cjs {
            used.push(namespace);
          }
        }
      }
    }

    match part.kind {
      PartKind::Namespace => {
        for (_, export) in self.unambiguous_exports(module.idx) {
          push_symbol(self, export.symbol, &mut used);
        }
        for record in &module.star_export_records {
          if let Some(target) = module.importee_of(*record).and_then(|t| self.normal(t)) {
            if target.exports_kind == ExportsKind::Cjs {
              used.extend(target.wrapper_symbol.map(|s| target.symbol_ref(s)));
            }
          }
        }
      }
      PartKind::Wrapper | PartKind::Stmt(_) => {}
    }

    let mut seen = FxHashSet::default();
    used.retain(|symbol| seen.insert(*symbol));
    used
  }

  /// Symbols the export statement of `entry` reads.
  pub(crate) fn export_surface_symbols(&self, entry: ModuleIdx) -> Vec<SymbolRef> {
    let mut symbols = vec![];
    for (_, export) in self.unambiguous_exports(entry) {
      let canonical = self.canonical_ref(export.symbol);
      symbols.push(canonical);
      if let Some(ImportBinding::Property { namespace, .. }) = self.binding_of(canonical) {
        symbols.push(self.canonical_ref(*namespace));
      }
    }
    symbols
  }

  /// Marks every module and part with the entries that reach it.
  #[tracing::instrument(skip_all)]
  pub(crate) fn include_statements(&mut self, output_options: &OutputOptions) {
    let entries = self.chunk_entries().collect::<Vec<_>>();
    let bit_count = entries.len();

    let reached = entries
      .iter()
      .map(|entry| self.reachable_from(self.roots_of(*entry, output_options)))
      .collect::<Vec<_>>();

    for module in self.modules.iter_mut().filter_map(NormOrExt::as_norm_mut) {
      module.entry_bits = EntryBits::new(bit_count);
      for part in module.parts.parts.iter_mut() {
        part.entry_bits = EntryBits::new(bit_count);
      }
    }
    for (bit, nodes) in reached.into_iter().enumerate() {
      for node in nodes {
        match node {
          Node::File(idx) => {
            if let Some(module) = self.modules[idx].as_norm_mut() {
              module.entry_bits.set(bit);
            }
          }
          Node::Part(idx, part) => {
            if let Some(module) = self.modules[idx].as_norm_mut() {
              module.parts[part].entry_bits.set(bit);
            }
          }
          Node::SideEffects(_) => {}
        }
      }
    }

    self.warn_ambiguous_reexports();

    tracing::debug!(
      "included modules {:?}",
      self
        .sorted_modules
        .iter()
        .filter_map(|idx| self.normal(*idx))
        .filter(|m| m.is_included())
        .map(|m| m.id.to_string())
        .collect::<Vec<_>>()
    );
  }

  fn roots_of(&self, entry: ModuleIdx, output_options: &OutputOptions) -> Vec<Node> {
    let mut roots = vec![Node::File(entry), Node::SideEffects(entry)];
    for idx in &self.injected {
      roots.push(Node::File(*idx));
      roots.push(Node::SideEffects(*idx));
    }
    let Some(module) = self.normal(entry) else {
      return roots;
    };
    for symbol in self.export_surface_symbols(entry) {
      self.push_symbol_nodes(entry, symbol, &mut roots);
    }
    if module.exports_kind.is_esm()
      && (output_options.format.needs_exports_object() || module.wrap_kind != WrapKind::None)
    {
      roots.push(Node::Part(entry, module.namespace_part));
    }
    roots
  }

  /// The parts declaring `symbol`, and its file when it lives outside `user`.
  fn push_symbol_nodes(&self, user: ModuleIdx, symbol: SymbolRef, nodes: &mut Vec<Node>) {
    let Some(owner) = self.normal(symbol.owner) else {
      return;
    };
    nodes.extend(
      owner
        .parts
        .find_parts_where_symbol_declared(symbol.symbol)
        .iter()
        .map(|part| Node::Part(owner.idx, *part)),
    );
    if owner.idx != user {
      nodes.push(Node::File(owner.idx));
      nodes.push(Node::SideEffects(owner.idx));
    }
  }

  fn reachable_from(&self, roots: Vec<Node>) -> Vec<Node> {
    let mut visited = FxHashSet::default();
    let mut reached = vec![];
    let mut worklist = roots;
    worklist.reverse();

    while let Some(node) = worklist.pop() {
      if !visited.insert(node) {
        continue;
      }
      reached.push(node);
      let mut next = vec![];
      match node {
        Node::File(idx) => {
          let Some(module) = self.normal(idx) else {
            continue;
          };
          if let Some(wrapper) = module.wrapper_part {
            next.push(Node::Part(idx, wrapper));
          }
          if module.module_side_effects || !self.treeshake {
            next.push(Node::SideEffects(idx));
          }
        }
        Node::SideEffects(idx) => {
          let Some(module) = self.normal(idx) else {
            continue;
          };
          let keep_all = !self.treeshake || module.wrap_kind == WrapKind::Cjs;
          next.extend(
            module
              .parts
              .iter_enumerated()
              .filter(|(_, part)| {
                matches!(part.kind, PartKind::Stmt(_)) && (keep_all || part.side_effects)
              })
              .map(|(part_idx, _)| Node::Part(idx, part_idx)),
          );
        }
        Node::Part(idx, part_idx) => {
          let Some(module) = self.normal(idx) else {
            continue;
          };
          let part = &module.parts[part_idx];
          for symbol in self.symbols_used_by_part(module, part) {
            self.push_symbol_nodes(idx, symbol, &mut next);
          }
          for record_idx in &part.import_records {
            let record = &module.import_records[*record_idx];
            let Some(target) = record.resolved.and_then(|t| self.normal(t)) else {
              continue;
            };
            match record.kind {
              ImportKind::Static => next.push(Node::File(target.idx)),
              ImportKind::DynamicImport if target.is_dynamic_entry => {}
              ImportKind::Require | ImportKind::DynamicImport => {
                next.push(Node::File(target.idx));
                next.push(Node::SideEffects(target.idx));
              }
            }
          }
          if part.kind == PartKind::Wrapper {
            next.push(Node::SideEffects(idx));
          }
        }
      }
      next.reverse();
      worklist.extend(next);
    }
    reached
  }

  /// Ambiguous names are left out of every namespace object and export surface that would have
  /// carried them.
  fn warn_ambiguous_reexports(&mut self) {
    let mut warnings = vec![];
    for idx in &self.sorted_modules {
      let Some(module) = self.normal(*idx) else {
        continue;
      };
      let surfaces_exports =
        module.is_user_entry || module.parts[module.namespace_part].is_included();
      if !surfaces_exports {
        continue;
      }
      let span = module
        .star_export_records
        .first()
        .map(|record| module.import_records[*record].span)
        .unwrap_or_default();
      for (name, export) in &module.resolved_exports {
        if export.potentially_ambiguous.is_empty() {
          continue;
        }
        let origins = std::iter::once(export.symbol)
          .chain(export.potentially_ambiguous.iter().copied())
          .collect::<Vec<_>>();
        warnings.push(
          BuildError::ambiguous_reexport(name.as_str())
            .at(module.id.as_path(), span)
            .with_notes(self.ambiguity_notes(name, &origins)),
        );
      }
    }
    self.diagnostics.extend(warnings);
  }
}
