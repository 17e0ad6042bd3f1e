use knit_error::Note;

use crate::{classifier::WrapKind, BuildError, Graph};

impl Graph {
  /// Writes to imports and constants, and calls of namespace objects.
  #[tracing::instrument(skip_all)]
  pub(super) fn check_mutations(&mut self) {
    let mut diagnostics = vec![];
    for idx in &self.sorted_modules {
      let Some(module) = self.normal(*idx) else {
        continue;
      };
      let path = module.id.as_path();

      for site in &module.write_sites {
        let decl = &module.symbols.symbols[site.symbol];
        let error = if decl.kind.is_import() {
          BuildError::assign_to_import(decl.name.as_str()).with_note(Note::at(
            format!(r#"The symbol "{}" was declared here:"#, decl.name),
            path,
            decl.span,
          ))
        } else {
          // Top-level consts of lazily initialized modules are hoisted out as `var`.
          let will_throw_at_runtime =
            module.wrap_kind == WrapKind::Esm && module.symbols.is_top_level(site.symbol);
          BuildError::assign_to_constant(decl.name.as_str(), will_throw_at_runtime).with_note(
            Note::at(
              format!(r#"The symbol "{}" was declared a constant here:"#, decl.name),
              path,
              decl.span,
            ),
          )
        };
        diagnostics.push(error.at(path, site.span));
      }

      for call in &module.namespace_calls {
        let decl = &module.symbols.symbols[call.symbol];
        diagnostics.push(
          BuildError::call_import_namespace(decl.name.as_str(), call.is_construct)
            .at(path, call.span)
            .with_note(Note::at(
              format!(
                r#"Consider changing "{}" to a default import instead:"#,
                decl.name
              ),
              path,
              decl.span,
            )),
        );
      }
    }
    tracing::debug!("mutation checks found {} problems", diagnostics.len());
    self.diagnostics.extend(diagnostics);
  }
}
