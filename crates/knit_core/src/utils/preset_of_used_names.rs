use knit_ast::Atom;

use crate::{InputOptions, ModuleFormat};

/// Names that no symbol of a chunk may take, regardless of what the chunk's code references.
pub(crate) fn preset_of_used_names(input: &InputOptions, format: ModuleFormat) -> Vec<Atom> {
  let mut preset = ["require", "exports", "module", "Object", "Promise"]
    .into_iter()
    .map(Atom::from)
    .collect::<Vec<_>>();

  if format.is_cjs() {
    preset.push("__filename".into());
    preset.push("__dirname".into());
  }

  preset.extend(input.jsx.reserved_roots().map(Atom::from));
  preset.extend(
    knit_runtime_helpers::RuntimeHelpers::all_names()
      .iter()
      .map(|name| Atom::from(*name)),
  );

  preset
}
