use hashlink::LinkedHashMap;
use knit_ast::{
  ast::*,
  visit::{walk_member_prop, walk_prop_key, Visit},
  Atom,
};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::NameMinifier;
use crate::{chunk::ChunkGraph, Graph, OutputOptions};

/// Property names renamed across the whole bundle.
#[derive(Debug, Default)]
pub struct MangledProps {
  names: FxHashMap<Atom, Atom>,
}

impl MangledProps {
  pub fn get(&self, name: &str) -> Option<&Atom> {
    self.names.get(name)
  }
}

struct PropNameCollector<'a> {
  mangle: &'a Regex,
  reserve: Option<&'a Regex>,
  /// Names to mangle with their use counts, in first-use order.
  candidates: LinkedHashMap<Atom, u32>,
  /// Names that stay, so no mangled name may take them.
  kept: FxHashSet<Atom>,
}

impl<'a> PropNameCollector<'a> {
  fn add(&mut self, name: &Atom) {
    let mangled = self.mangle.is_match(name) && !self.reserve.is_some_and(|re| re.is_match(name));
    if mangled {
      *self.candidates.entry(name.clone()).or_insert(0) += 1;
    } else {
      self.kept.insert(name.clone());
    }
  }
}

impl<'a> Visit for PropNameCollector<'a> {
  fn visit_prop_key(&mut self, key: &PropKey) {
    match key {
      PropKey::Ident(ident) => self.add(&ident.name),
      PropKey::Str(value, _) => {
        self.kept.insert(value.clone());
      }
      _ => {}
    }
    walk_prop_key(self, key);
  }

  fn visit_member_prop(&mut self, prop: &MemberProp) {
    match prop {
      MemberProp::Ident(ident) => self.add(&ident.name),
      MemberProp::Computed(expr) => {
        if let Expr::Lit(Lit {
          value: LitValue::Str(value),
          ..
        }) = &**expr
        {
          self.kept.insert(value.clone());
        }
      }
      MemberProp::Private(_) => {}
    }
    walk_member_prop(self, prop);
  }
}

/// Names the properties matching `mangle_props` and not `reserve_props`. The most used ones get the
/// shortest names.
#[tracing::instrument(skip_all)]
pub(crate) fn mangle_props(
  graph: &Graph,
  chunk_graph: &ChunkGraph,
  output_options: &OutputOptions,
) -> MangledProps {
  let Some(mangle) = &output_options.mangle_props else {
    return MangledProps::default();
  };
  let mut collector = PropNameCollector {
    mangle,
    reserve: output_options.reserve_props.as_ref(),
    candidates: LinkedHashMap::default(),
    kept: FxHashSet::default(),
  };
  let mut seen = FxHashSet::default();
  for chunk in chunk_graph.chunks.iter() {
    for (idx, parts) in &chunk.modules {
      let Some(module) = graph.normal(*idx) else {
        continue;
      };
      for part in parts {
        if seen.insert((*idx, *part)) {
          module
            .stmts_of_parts(std::slice::from_ref(part))
            .for_each(|stmt| collector.visit_stmt(stmt));
        }
      }
    }
  }

  let mut candidates = collector.candidates.into_iter().collect::<Vec<_>>();
  candidates.sort_by_key(|(_, count)| std::cmp::Reverse(*count));

  let minifier = NameMinifier::default();
  let mut generated = minifier.names_from(0).map(|(_, name)| Atom::from(name)).filter(|name| {
    !collector.kept.contains(name)
      && !mangle.is_match(name)
      && !collector.reserve.is_some_and(|re| re.is_match(name))
  });
  let names = candidates
    .into_iter()
    .filter_map(|(name, _)| generated.next().map(|mangled| (name, mangled)))
    .collect::<FxHashMap<_, _>>();
  tracing::debug!("mangled {} property names", names.len());
  MangledProps { names }
}
