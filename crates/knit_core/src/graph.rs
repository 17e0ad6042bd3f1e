use derivative::Derivative;
use itertools::Itertools;
use knit_common::{FrozenUnionFind, ModuleIdx, ModuleProvider, SymbolRef, UnionFind};
use knit_error::CWD;
use oxc_index::IndexVec;
use rustc_hash::FxHashSet;

use crate::{
  classifier::classify_graph, module_loader::ModuleLoader, normal_module::ImportBinding,
  scanner::scan_modules, BuildError, BuildResult, InputOptions, NormOrExt, NormalModule,
  OutputOptions,
};

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Graph {
  pub modules: IndexVec<ModuleIdx, NormOrExt>,
  /// User entries in input order, with the name given to each.
  pub entries: Vec<(String, ModuleIdx)>,
  /// Targets of `import()` that get a chunk of their own. Only filled when code splitting.
  pub dynamic_entries: Vec<ModuleIdx>,
  pub injected: Vec<ModuleIdx>,
  /// Modules by execution order.
  pub sorted_modules: Vec<ModuleIdx>,
  #[derivative(Debug = "ignore")]
  pub(crate) uf: UnionFind<SymbolRef>,
  /// Every import symbol resolved to the symbol it is bound to.
  #[derivative(Debug = "ignore")]
  pub(crate) symbol_links: FrozenUnionFind<SymbolRef>,
  pub(crate) treeshake: bool,
  pub(crate) code_splitting: bool,
  pub(crate) diagnostics: Vec<BuildError>,
}

impl Graph {
  fn new(code_splitting: bool, treeshake: bool) -> Self {
    Self {
      modules: IndexVec::new(),
      entries: vec![],
      dynamic_entries: vec![],
      injected: vec![],
      sorted_modules: vec![],
      uf: UnionFind::default(),
      symbol_links: FrozenUnionFind::default(),
      treeshake,
      code_splitting,
      diagnostics: vec![],
    }
  }

  /// Loads, links and tree-shakes the module graph. Errors block the build; warnings and infos are
  /// returned alongside the graph.
  #[tracing::instrument(skip_all)]
  pub(crate) fn build(
    input_options: &InputOptions,
    output_options: &OutputOptions,
    provider: &dyn ModuleProvider,
  ) -> BuildResult<(Self, Vec<BuildError>)> {
    CWD.set(&input_options.cwd, || {
      let mut graph = Graph::new(output_options.code_splitting, input_options.treeshake);
      if output_options.code_splitting && !output_options.format.is_es() {
        graph.diagnostics.push(BuildError::invalid_option(
          r#"Splitting currently only works with the "esm" format"#,
        ));
      }

      let loaded = ModuleLoader::new(input_options, provider).fetch_all_modules();
      graph.modules = loaded.modules;
      graph.entries = loaded.entries;
      graph.injected = loaded.injected;
      graph.diagnostics.extend(loaded.errors);

      let diagnostics = classify_graph(&mut graph.modules, graph.code_splitting);
      graph.diagnostics.extend(diagnostics);
      let diagnostics = scan_modules(&mut graph.modules);
      graph.diagnostics.extend(diagnostics);

      graph.sort_modules();
      graph.link();
      graph.check_top_level_await_format(output_options);
      graph.compute_side_effects();
      graph.include_statements(output_options);

      graph.into_result()
    })
  }

  fn into_result(mut self) -> BuildResult<(Self, Vec<BuildError>)> {
    let (errors, mut warnings): (Vec<_>, Vec<_>) = std::mem::take(&mut self.diagnostics)
      .into_iter()
      .partition(BuildError::is_error);
    if let Some(mut errors) = knit_error::Errors::from_vec(errors) {
      errors.extend(warnings);
      errors.sort();
      return Err(errors);
    }
    warnings.sort();
    Ok((self, warnings))
  }

  /// Execution order is a post-order walk over static imports and `require()` calls, starting
  /// from the injected files, then the entries in input order, then the dynamically imported
  /// modules.
  #[tracing::instrument(skip_all)]
  pub(crate) fn sort_modules(&mut self) {
    enum Action {
      Enter,
      Exit,
    }
    let mut queue = self
      .injected
      .iter()
      .chain(self.entries.iter().map(|(_, idx)| idx))
      .rev()
      .map(|idx| (Action::Enter, *idx))
      .collect::<Vec<_>>();

    let mut entered = FxHashSet::default();
    let mut next_exec_order = 0;
    let mut dynamic_queue = vec![];
    let mut dynamic_targets = vec![];

    loop {
      while let Some((action, idx)) = queue.pop() {
        match action {
          Action::Enter => {
            if !entered.insert(idx) {
              continue;
            }
            queue.push((Action::Exit, idx));
            if let NormOrExt::Normal(module) = &self.modules[idx] {
              module
                .dependencies()
                .collect_vec()
                .into_iter()
                .rev()
                .filter(|dep| !entered.contains(dep))
                .for_each(|dep| queue.push((Action::Enter, dep)));
              for dep in module.dynamic_dependencies() {
                if !dynamic_targets.contains(&dep) {
                  dynamic_targets.push(dep);
                  dynamic_queue.push(dep);
                }
              }
            }
          }
          Action::Exit => {
            self.modules[idx].set_exec_order(next_exec_order);
            self.sorted_modules.push(idx);
            next_exec_order += 1;
          }
        }
      }
      if dynamic_queue.is_empty() {
        break;
      }
      queue = std::mem::take(&mut dynamic_queue)
        .into_iter()
        .rev()
        .map(|idx| (Action::Enter, idx))
        .collect();
    }

    if self.code_splitting {
      for idx in dynamic_targets {
        if let Some(module) = self.modules[idx].as_norm_mut() {
          if !module.is_user_entry {
            module.is_dynamic_entry = true;
            self.dynamic_entries.push(idx);
          }
        }
      }
    }

    tracing::debug!(
      "sorted modules {:#?}",
      self
        .sorted_modules
        .iter()
        .map(|idx| self.modules[*idx].id())
        .collect_vec()
    );
  }

  /// `cjs` and `iife` output can't express a top-level await. Awaits in dead branches are gone by
  /// now and don't count.
  fn check_top_level_await_format(&mut self, output_options: &OutputOptions) {
    if output_options.format.supports_top_level_await() {
      return;
    }
    for module in self.modules.iter().filter_map(NormOrExt::as_norm) {
      for span in &module.live_top_level_awaits {
        self.diagnostics.push(
          BuildError::top_level_await(output_options.format.as_str()).at(&module.id, *span),
        );
      }
    }
  }

  pub(crate) fn normal(&self, idx: ModuleIdx) -> Option<&NormalModule> {
    self.modules[idx].as_norm()
  }

  /// The symbol `symbol` is bound to after linking.
  pub(crate) fn canonical_ref(&self, symbol: SymbolRef) -> SymbolRef {
    *self.symbol_links.find_root(&symbol)
  }

  /// How a canonical import symbol is read when it doesn't link to a declaration.
  pub(crate) fn binding_of(&self, canonical: SymbolRef) -> Option<&ImportBinding> {
    self
      .normal(canonical.owner)?
      .import_bindings
      .get(&canonical.symbol)
  }

  /// Entry modules that get a chunk: user entries first, then dynamic entries.
  pub(crate) fn chunk_entries(&self) -> impl Iterator<Item = ModuleIdx> + '_ {
    self
      .entries
      .iter()
      .map(|(_, idx)| *idx)
      .chain(self.dynamic_entries.iter().copied())
  }
}
