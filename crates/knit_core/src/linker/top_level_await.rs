use std::collections::VecDeque;

use knit_ast::Span;
use knit_common::{ImportKind, ModuleIdx};
use knit_error::Note;
use rustc_hash::FxHashMap;

use crate::{BuildError, Graph};

impl Graph {
  /// `require()` is synchronous, so it can't load an ES module whose evaluation awaits.
  #[tracing::instrument(skip_all)]
  pub(super) fn check_required_top_level_awaits(&mut self) {
    let mut diagnostics = vec![];
    for idx in &self.sorted_modules {
      let Some(module) = self.normal(*idx) else {
        continue;
      };
      for record in module.import_records.iter() {
        if record.kind != ImportKind::Require {
          continue;
        }
        let Some(importee) = record.resolved.filter(|t| {
          self
            .normal(*t)
            .is_some_and(|t| t.exports_kind.is_esm())
        }) else {
          continue;
        };
        let Some((chain, await_span)) = self.find_top_level_await(importee) else {
          continue;
        };
        let Some(&awaiting) = chain.last().map(|(module, _)| module) else {
          continue;
        };
        let importee_id = self.modules[importee].id().as_path();
        let transitive =
          (awaiting != importee).then(|| self.modules[awaiting].id().as_path().to_path_buf());

        let mut notes = chain
          .windows(2)
          .map(|hop| {
            let (from, _) = hop[0];
            let (to, span) = hop[1];
            Note::at(
              format!(
                r#"The file "{}" imports the file "{}" here:"#,
                self.display_path(from),
                self.display_path(to)
              ),
              self.modules[from].id().as_path(),
              span,
            )
          })
          .collect::<Vec<_>>();
        notes.push(Note::at(
          format!(
            r#"The top-level await in "{}" is here:"#,
            self.display_path(awaiting)
          ),
          self.modules[awaiting].id().as_path(),
          await_span,
        ));

        diagnostics.push(
          BuildError::require_top_level_await(importee_id, transitive)
            .at(module.id.as_path(), record.span)
            .with_notes(notes),
        );
      }
    }
    self.diagnostics.extend(diagnostics);
  }

  /// Breadth-first over static imports from `from`. Returns the import chain to the closest module
  /// with a live top-level await, each module paired with the span of the import that reached it,
  /// and the span of that await.
  fn find_top_level_await(&self, from: ModuleIdx) -> Option<(Vec<(ModuleIdx, Span)>, Span)> {
    let mut parent: FxHashMap<ModuleIdx, (ModuleIdx, Span)> = FxHashMap::default();
    let mut queue = VecDeque::from([from]);
    let mut visited = vec![from];
    while let Some(idx) = queue.pop_front() {
      let Some(module) = self.normal(idx) else {
        continue;
      };
      if let Some(span) = module.live_top_level_awaits.first() {
        let mut chain = vec![];
        let mut current = idx;
        while let Some((prev, import_span)) = parent.get(&current) {
          chain.push((current, *import_span));
          current = *prev;
        }
        chain.push((from, Span::DUMMY));
        chain.reverse();
        return Some((chain, *span));
      }
      for record in module.import_records.iter().filter(|r| r.kind.is_static()) {
        let Some(dep) = record.resolved else {
          continue;
        };
        if visited.contains(&dep) {
          continue;
        }
        visited.push(dep);
        parent.insert(dep, (idx, record.span));
        queue.push_back(dep);
      }
    }
    None
  }
}
