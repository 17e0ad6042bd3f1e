//! Final names for what a chunk declares and imports. Every chunk gets its own [NamingContext];
//! property names are mangled once for the whole bundle.

use hashlink::LinkedHashMap;
use itertools::Itertools;
use knit_ast::{visit::Visit, Atom, ScopeId, SymbolId, SymbolTable};
use knit_common::{ImportKind, SymbolRef};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
  chunk::Chunk,
  normal_module::ImportBinding,
  treeshake::PartIdx,
  utils::{is_keyword, preset_of_used_names},
  Graph, InputOptions, NormalModule, OutputOptions,
};

mod char_freq;
mod mangle_props;
mod name_minifier;
mod symbol_renamer;

pub use char_freq::CharFreq;
pub(crate) use mangle_props::{mangle_props, MangledProps};
pub use name_minifier::NameMinifier;
pub(crate) use symbol_renamer::SymbolRenamer;

use char_freq::CharFreqCollector;

#[derive(Debug)]
pub struct NamingContext {
  /// Names of canonical top-level symbols.
  top_level: FxHashMap<SymbolRef, Atom>,
  nested: FxHashMap<SymbolRef, Atom>,
  /// Top-level names taken in this chunk, plus every name that may not be taken.
  used: FxHashSet<Atom>,
  reserve_props: Option<Regex>,
  minifier: Option<NameMinifier>,
  next_minified: usize,
}

impl NamingContext {
  fn new(
    reserved: FxHashSet<Atom>,
    reserve_props: Option<Regex>,
    minifier: Option<NameMinifier>,
  ) -> Self {
    Self {
      top_level: FxHashMap::default(),
      nested: FxHashMap::default(),
      used: reserved,
      reserve_props,
      minifier,
      next_minified: 0,
    }
  }

  pub fn name_of(&self, canonical: SymbolRef) -> Option<&Atom> {
    self.top_level.get(&canonical)
  }

  pub fn nested_name_of(&self, symbol: SymbolRef) -> Option<&Atom> {
    self.nested.get(&symbol)
  }

  pub fn minifier(&self) -> Option<&NameMinifier> {
    self.minifier.as_ref()
  }

  fn is_available(&self, name: &str) -> bool {
    !self.used.contains(name)
      && !is_keyword(name)
      && !self.reserve_props.as_ref().is_some_and(|re| re.is_match(name))
  }

  /// A fresh top-level name. Readable names are `hint`, `hint$1`, `hint$2` and so on.
  pub fn create_conflictless_name(&mut self, hint: &str) -> Atom {
    let name = match &self.minifier {
      Some(minifier) => loop {
        let candidate = minifier.number_to_name(self.next_minified);
        self.next_minified += 1;
        if self.is_available(&candidate) {
          break candidate;
        }
      },
      None => {
        let mut name = hint.to_string();
        let mut count = 1;
        while !self.is_available(&name) {
          name = format!("{hint}${count}");
          count += 1;
        }
        name
      }
    };
    let name = Atom::from(name);
    self.used.insert(name.clone());
    name
  }

  fn set_top_level(&mut self, canonical: SymbolRef, name: Atom) {
    self.used.insert(name.clone());
    self.top_level.insert(canonical, name);
  }
}

/// Counts how often each symbol of a module is written down.
#[derive(Default)]
struct UseCounter {
  counts: FxHashMap<SymbolId, u32>,
}

impl Visit for UseCounter {
  fn visit_ident(&mut self, ident: &knit_ast::ast::Ident) {
    if let Some(symbol) = ident.symbol {
      *self.counts.entry(symbol).or_default() += 1;
    }
  }

  fn visit_binding_ident(&mut self, ident: &knit_ast::ast::Ident) {
    self.visit_ident(ident)
  }
}

/// Symbols visible from a scope with a direct `eval` can be read by name at run-time.
fn pinned_by_eval(module: &NormalModule) -> Vec<SymbolId> {
  let symbols: &SymbolTable = &module.symbols;
  symbols
    .scopes
    .iter_enumerated()
    .filter(|(_, scope)| scope.has_direct_eval)
    .flat_map(|(scope, _)| symbols.ancestors(scope))
    .unique()
    .flat_map(|scope| symbols.scopes[scope].symbols.iter().copied())
    .collect()
}

pub(crate) struct Renamer<'a> {
  graph: &'a Graph,
  chunk: &'a Chunk,
  input_options: &'a InputOptions,
  output_options: &'a OutputOptions,
}

impl<'a> Renamer<'a> {
  pub(crate) fn new(
    graph: &'a Graph,
    chunk: &'a Chunk,
    input_options: &'a InputOptions,
    output_options: &'a OutputOptions,
  ) -> Self {
    Self {
      graph,
      chunk,
      input_options,
      output_options,
    }
  }

  fn included_modules(&self) -> impl Iterator<Item = (&'a NormalModule, &'a [PartIdx])> {
    let graph = self.graph;
    self
      .chunk
      .modules
      .iter()
      .filter_map(move |(idx, parts)| graph.normal(*idx).map(|module| (module, parts.as_slice())))
  }

  fn original_name(&self, symbol: SymbolRef) -> &'a Atom {
    self.graph.modules[symbol.owner].symbols().name(symbol.symbol)
  }

  /// Whether the symbol is read through a run-time object instead of a local binding.
  fn needs_local_name(&self, canonical: SymbolRef) -> bool {
    if let Some(ext) = self.graph.modules[canonical.owner].as_ext() {
      return self.output_options.format.is_es() || canonical.symbol == ext.namespace_symbol;
    }
    !matches!(
      self.graph.binding_of(canonical),
      Some(ImportBinding::Property { .. } | ImportBinding::Undefined)
    )
  }

  #[tracing::instrument(skip_all)]
  pub(crate) fn rename(self) -> NamingContext {
    let minify = self.output_options.minify.identifiers;

    let mut reserved = preset_of_used_names(self.input_options, self.output_options.format)
      .into_iter()
      .collect::<FxHashSet<_>>();
    let mut uses: FxHashMap<SymbolRef, u32> = FxHashMap::default();
    let mut freq = CharFreq::default();
    let mut pinned = FxHashSet::default();

    for (module, parts) in self.included_modules() {
      let mut counter = UseCounter::default();
      let mut collector = CharFreqCollector { freq: &mut freq };
      for stmt in module.stmts_of_parts(parts) {
        counter.visit_stmt(stmt);
        if minify {
          collector.visit_stmt(stmt);
        }
      }
      if minify {
        module
          .legal_comments
          .iter()
          .for_each(|comment| freq.scan(&comment.text, 1));
      }
      uses.extend(
        counter
          .counts
          .into_iter()
          .map(|(symbol, count)| (module.symbol_ref(symbol), count)),
      );
      for part in parts {
        reserved.extend(module.parts[*part].unbound.iter().cloned());
      }
      for symbol in pinned_by_eval(module) {
        reserved.insert(module.symbols.name(symbol).clone());
        pinned.insert(module.symbol_ref(symbol));
      }
    }

    let minifier = minify.then(|| NameMinifier::from_char_freq(&freq));
    let mut ctx = NamingContext::new(
      reserved,
      self.output_options.reserve_props.clone(),
      minifier,
    );

    let candidates = self.top_level_candidates(&uses);
    tracing::trace!("{} top-level symbols to name", candidates.len());

    for (symbol, _) in candidates.iter().filter(|(symbol, _)| pinned.contains(*symbol)) {
      ctx.set_top_level(*symbol, self.original_name(*symbol).clone());
    }
    let mut to_name = candidates
      .into_iter()
      .filter(|(symbol, _)| !pinned.contains(symbol))
      .collect_vec();
    if minify {
      to_name.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    }
    for (symbol, _) in to_name {
      let name = ctx.create_conflictless_name(self.original_name(symbol));
      ctx.set_top_level(symbol, name);
    }

    if minify {
      self.minify_nested_names(&mut ctx, &uses, &pinned);
    } else {
      self.deconflict_nested_names(&mut ctx, &uses, &pinned);
    }
    ctx
  }

  /// Canonical top-level symbols the chunk needs a local binding for, with their use counts. The
  /// entry module comes first so that its names stay as written.
  fn top_level_candidates(
    &self,
    uses: &FxHashMap<SymbolRef, u32>,
  ) -> LinkedHashMap<SymbolRef, u32> {
    let mut declared = LinkedHashMap::<SymbolRef, u32>::default();
    let mut foreign = LinkedHashMap::<SymbolRef, u32>::default();
    let modules = self.included_modules().collect_vec();

    for (module, parts) in modules.iter().rev() {
      for part_idx in *parts {
        let part = &module.parts[*part_idx];
        for symbol in &part.declared {
          let canonical = self.graph.canonical_ref(module.symbol_ref(*symbol));
          if canonical.owner == module.idx && self.needs_local_name(canonical) {
            declared.entry(canonical).or_insert(0);
          }
        }
        for symbol in part.referenced.keys() {
          let canonical = self.graph.canonical_ref(module.symbol_ref(*symbol));
          self.add_foreign(canonical, &mut foreign);
        }
        for record in &part.import_records {
          let record = &module.import_records[*record];
          let Some(target) = record.resolved else {
            continue;
          };
          if let Some(ext) = self.graph.modules[target].as_ext() {
            if record.kind != ImportKind::DynamicImport {
              foreign.entry(ext.namespace_ref()).or_insert(0);
            }
          }
        }
      }
    }
    if let Some(entry) = self.chunk.entry_module() {
      for canonical in self.graph.export_surface_symbols(entry) {
        self.add_foreign(canonical, &mut foreign);
      }
    }
    for symbols in self.chunk.imports_from_chunks.values() {
      for symbol in symbols {
        if self.needs_local_name(*symbol) {
          foreign.entry(*symbol).or_insert(0);
        }
      }
    }

    let mut candidates = declared;
    for (symbol, _) in foreign {
      candidates.entry(symbol).or_insert(0);
    }
    for (symbol, count) in uses {
      let is_top_level = self
        .graph
        .normal(symbol.owner)
        .is_some_and(|m| m.symbols.is_top_level(symbol.symbol));
      if is_top_level {
        let canonical = self.graph.canonical_ref(*symbol);
        if let Some(total) = candidates.get_mut(&canonical) {
          *total += count;
        }
      }
    }
    candidates
  }

  /// Records a symbol the chunk reads but doesn't declare. Outside ES output an external binding
  /// is read through the external's namespace object.
  fn add_foreign(&self, canonical: SymbolRef, foreign: &mut LinkedHashMap<SymbolRef, u32>) {
    if let Some(ext) = self.graph.modules[canonical.owner].as_ext() {
      let symbol = if self.output_options.format.is_es() {
        canonical
      } else {
        ext.namespace_ref()
      };
      foreign.entry(symbol).or_insert(0);
      return;
    }
    if !self.chunk.modules.contains_key(&canonical.owner) && self.needs_local_name(canonical) {
      foreign.entry(canonical).or_insert(0);
    }
  }

  /// Nested symbols keep their names unless one of the chunk's top-level or reserved names takes
  /// it. Renamed ones avoid every name of their module.
  fn deconflict_nested_names(
    &self,
    ctx: &mut NamingContext,
    uses: &FxHashMap<SymbolRef, u32>,
    pinned: &FxHashSet<SymbolRef>,
  ) {
    for (module, _) in self.included_modules() {
      let mut taken = module
        .symbols
        .symbols
        .iter()
        .map(|decl| decl.name.clone())
        .collect::<FxHashSet<_>>();
      for (symbol, decl) in module.symbols.symbols.iter_enumerated() {
        let symbol_ref = module.symbol_ref(symbol);
        if module.symbols.is_top_level(symbol)
          || pinned.contains(&symbol_ref)
          || !uses.contains_key(&symbol_ref)
          || ctx.is_available(&decl.name)
        {
          continue;
        }
        let mut count = 1;
        let name = loop {
          let candidate = Atom::from(format!("{}${count}", decl.name));
          if ctx.is_available(&candidate) && !taken.contains(&candidate) {
            break candidate;
          }
          count += 1;
        };
        taken.insert(name.clone());
        ctx.nested.insert(symbol_ref, name);
      }
    }
  }

  /// Nested symbols go into slots by scope depth. Sibling scopes share slots, so their symbols
  /// share names. Busier slots get shorter names.
  fn minify_nested_names(
    &self,
    ctx: &mut NamingContext,
    uses: &FxHashMap<SymbolRef, u32>,
    pinned: &FxHashSet<SymbolRef>,
  ) {
    let mut slot_counts: Vec<u32> = vec![];
    let mut slot_of: Vec<(SymbolRef, usize)> = vec![];

    for (module, _) in self.included_modules() {
      let symbols = &module.symbols;
      let mut stack: Vec<(ScopeId, usize)> = symbols.scopes[symbols.root_scope()]
        .children
        .iter()
        .rev()
        .map(|child| (*child, 0))
        .collect();
      while let Some((scope, first_slot)) = stack.pop() {
        let mut slot = first_slot;
        for symbol in &symbols.scopes[scope].symbols {
          let symbol_ref = module.symbol_ref(*symbol);
          let Some(count) = uses.get(&symbol_ref) else {
            continue;
          };
          if pinned.contains(&symbol_ref) {
            continue;
          }
          if slot_counts.len() <= slot {
            slot_counts.resize(slot + 1, 0);
          }
          slot_counts[slot] += count;
          slot_of.push((symbol_ref, slot));
          slot += 1;
        }
        stack.extend(
          symbols.scopes[scope]
            .children
            .iter()
            .rev()
            .map(|child| (*child, slot)),
        );
      }
    }

    let mut by_count = (0..slot_counts.len()).collect_vec();
    by_count.sort_by_key(|slot| std::cmp::Reverse(slot_counts[*slot]));
    let Some(minifier) = ctx.minifier.clone() else {
      return;
    };
    let mut names = minifier
      .names_from(0)
      .map(|(_, name)| name)
      .filter(|name| ctx.is_available(name));
    let mut slot_names = vec![Atom::default(); slot_counts.len()];
    for slot in by_count {
      if let Some(name) = names.next() {
        slot_names[slot] = Atom::from(name);
      }
    }
    for (symbol, slot) in slot_of {
      ctx.nested.insert(symbol, slot_names[slot].clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn conflictless_names() {
    let reserved = ["console", "a"].into_iter().map(Atom::from).collect();
    let mut ctx = NamingContext::new(reserved, None, None);
    assert_eq!(ctx.create_conflictless_name("foo"), "foo");
    assert_eq!(ctx.create_conflictless_name("foo"), "foo$1");
    assert_eq!(ctx.create_conflictless_name("foo"), "foo$2");
    assert_eq!(ctx.create_conflictless_name("console"), "console$1");
    assert_eq!(ctx.create_conflictless_name("default"), "default$1");
  }

  #[test]
  fn minified_names_skip_reserved_ones() {
    let reserved = ["b"].into_iter().map(Atom::from).collect();
    let reserve_props = Regex::new("^c$").ok();
    let mut ctx = NamingContext::new(reserved, reserve_props, Some(NameMinifier::default()));
    assert_eq!(ctx.create_conflictless_name("foo"), "a");
    assert_eq!(ctx.create_conflictless_name("bar"), "d");
  }
}
