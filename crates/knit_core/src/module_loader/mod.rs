use knit_common::{ModuleId, ModuleIdx, ModuleProvider};
use oxc_index::IndexVec;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

pub(crate) mod module_task;

use module_task::{ModuleTask, Resolution, TaskResult};

use crate::{
  normal_module::ImportRecord, BuildError, ExternalMatcher, ExternalModule, InputOptions,
  NormOrExt, NormalModule,
};

pub(crate) struct ModuleLoader<'a> {
  input_options: &'a InputOptions,
  provider: &'a dyn ModuleProvider,
  external: ExternalMatcher,
  errors: Vec<BuildError>,
}

/// Modules in discovery order: depth-first from the entries, then the injected files, following
/// import records in source order.
#[derive(Debug, Default)]
pub(crate) struct LoadedModules {
  pub(crate) modules: IndexVec<ModuleIdx, NormOrExt>,
  pub(crate) entries: Vec<(String, ModuleIdx)>,
  pub(crate) injected: Vec<ModuleIdx>,
  pub(crate) errors: Vec<BuildError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
  Normal(ModuleId),
  External(ModuleId),
}

impl<'a> ModuleLoader<'a> {
  pub(crate) fn new(input_options: &'a InputOptions, provider: &'a dyn ModuleProvider) -> Self {
    Self {
      input_options,
      provider,
      external: ExternalMatcher::new(&input_options.external),
      errors: vec![],
    }
  }

  fn resolve_entry(&mut self, specifier: &str) -> Option<ModuleId> {
    let Some(resolved) = self.provider.resolve_entry(specifier) else {
      self.errors.push(BuildError::unresolved_entry(specifier));
      return None;
    };
    if resolved.external
      || self.external.matches(specifier)
      || self.external.matches(resolved.id.as_ref())
    {
      self
        .errors
        .push(BuildError::entry_cannot_be_external(resolved.id.as_path()));
      return None;
    }
    Some(resolved.id)
  }

  #[tracing::instrument(skip_all)]
  pub(crate) fn fetch_all_modules(mut self) -> LoadedModules {
    if self.input_options.input.is_empty() {
      self
        .errors
        .push(BuildError::invalid_option("You must supply options.input"));
    }

    let entries = self
      .input_options
      .input
      .iter()
      .filter_map(|item| {
        self
          .resolve_entry(&item.import)
          .map(|id| (item.name.clone(), id))
      })
      .collect::<Vec<_>>();

    let mut injected: Vec<ModuleId> = vec![];
    for specifier in &self.input_options.inject {
      if let Some(id) = self.resolve_entry(specifier) {
        if !injected.contains(&id) {
          injected.push(id);
        }
      }
    }

    let roots = entries
      .iter()
      .map(|(_, id)| id.clone())
      .chain(injected.iter().cloned())
      .collect::<Vec<_>>();

    let loaded = self.load_all(&roots);
    let order = Self::discovery_order(&roots, &loaded);

    let idx_of = order
      .iter()
      .enumerate()
      .map(|(i, node)| (node.clone(), ModuleIdx::from_usize(i)))
      .collect::<FxHashMap<_, _>>();
    let normal_idx = |id: &ModuleId| idx_of.get(&Node::Normal(id.clone())).copied();

    let mut loaded = loaded;
    let mut modules = IndexVec::with_capacity(order.len());
    for (i, node) in order.iter().enumerate() {
      let idx = ModuleIdx::from_usize(i);
      let module = match node {
        Node::External(id) => NormOrExt::External(ExternalModule::new(idx, id.clone())),
        Node::Normal(id) => {
          let Some(task) = loaded.remove(id) else {
            continue;
          };
          NormOrExt::Normal(Self::into_normal_module(idx, task, &idx_of))
        }
      };
      modules.push(module);
    }

    let entries = entries
      .into_iter()
      .filter_map(|(name, id)| normal_idx(&id).map(|idx| (name, idx)))
      .collect::<Vec<_>>();
    let injected = injected
      .iter()
      .filter_map(|id| normal_idx(id))
      .collect::<Vec<_>>();

    for (_, idx) in &entries {
      if let Some(module) = modules[*idx].as_norm_mut() {
        module.is_user_entry = true;
      }
    }
    for idx in &injected {
      if let Some(module) = modules[*idx].as_norm_mut() {
        module.is_injected = true;
      }
    }

    tracing::debug!(
      "loaded {} modules, {} errors",
      modules.len(),
      self.errors.len()
    );

    LoadedModules {
      modules,
      entries,
      injected,
      errors: self.errors,
    }
  }

  /// Loads modules in waves. Each wave loads every newly discovered module in parallel.
  fn load_all(&mut self, roots: &[ModuleId]) -> FxHashMap<ModuleId, TaskResult> {
    let mut seen = roots.iter().cloned().collect::<FxHashSet<_>>();
    let mut pending = seen.iter().cloned().collect::<Vec<_>>();
    pending.sort();
    let mut loaded = FxHashMap::default();

    while !pending.is_empty() {
      let wave = pending
        .par_iter()
        .map(|id| {
          ModuleTask {
            input_options: self.input_options,
            provider: self.provider,
            external: &self.external,
            id: id.clone(),
          }
          .run()
        })
        .collect::<Vec<_>>();

      pending = vec![];
      for result in wave {
        match result {
          Ok(mut task) => {
            for resolution in &task.resolutions {
              if let Resolution::Normal(id) = resolution {
                if seen.insert(id.clone()) {
                  pending.push(id.clone());
                }
              }
            }
            self.errors.append(&mut task.errors);
            loaded.insert(task.module.id.clone(), task);
          }
          Err(err) => self.errors.push(err),
        }
      }
      tracing::trace!("next wave: {} modules", pending.len());
    }
    loaded
  }

  fn discovery_order(roots: &[ModuleId], loaded: &FxHashMap<ModuleId, TaskResult>) -> Vec<Node> {
    let mut visited = FxHashSet::default();
    let mut order = vec![];
    let mut stack = roots
      .iter()
      .rev()
      .map(|id| Node::Normal(id.clone()))
      .collect::<Vec<_>>();
    while let Some(node) = stack.pop() {
      if !visited.insert(node.clone()) {
        continue;
      }
      if let Node::Normal(id) = &node {
        let Some(task) = loaded.get(id) else {
          continue;
        };
        task
          .resolutions
          .iter()
          .rev()
          .filter_map(|resolution| match resolution {
            Resolution::Normal(id) => Some(Node::Normal(id.clone())),
            Resolution::External(id) => Some(Node::External(id.clone())),
            Resolution::Unresolved => None,
          })
          .filter(|node| !visited.contains(node))
          .for_each(|node| stack.push(node));
      }
      order.push(node);
    }
    order
  }

  fn into_normal_module(
    idx: ModuleIdx,
    task: TaskResult,
    idx_of: &FxHashMap<Node, ModuleIdx>,
  ) -> NormalModule {
    let TaskResult {
      module: parsed,
      resolutions,
      classification,
      ..
    } = task;
    let mut module = NormalModule::new(idx, parsed.id, parsed.symbols);
    module.module_side_effects = parsed.module_side_effects;
    module.hashbang = parsed.program.hashbang;
    module.directives = parsed.program.directives;
    module.legal_comments = parsed.program.legal_comments;
    module.body = parsed.program.body;
    module.import_records = parsed
      .import_records
      .into_iter()
      .zip(resolutions)
      .map(|(raw, resolution)| {
        let resolved = match resolution {
          Resolution::Normal(id) => idx_of.get(&Node::Normal(id)).copied(),
          Resolution::External(id) => idx_of.get(&Node::External(id)).copied(),
          Resolution::Unresolved => None,
        };
        ImportRecord {
          specifier: raw.specifier,
          kind: raw.kind,
          span: raw.span,
          resolved,
        }
      })
      .collect();
    module.exports_kind = classification.exports_kind();
    module.esm_reason = classification.esm_reason;
    module.top_level_returns = classification.top_level_returns;
    module.top_level_this = classification.top_level_this;
    module.star_export_records = classification.star_export_records;
    module
  }
}
