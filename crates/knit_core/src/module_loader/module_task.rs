use knit_common::{ModuleId, ModuleProvider, ParsedModule, RawImportRecord};
use knit_error::{utils::PathExt, Note};
use knit_ast::ImportRecordIdx;
use oxc_index::IndexVec;

use crate::{
  classifier::{classify_module, Classification},
  is_node_builtin, BuildError, ExternalMatcher, InputOptions, Platform,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
  Normal(ModuleId),
  External(ModuleId),
  /// An error was reported for it.
  Unresolved,
}

#[derive(Debug)]
pub(crate) struct TaskResult {
  pub(crate) module: ParsedModule,
  pub(crate) resolutions: IndexVec<ImportRecordIdx, Resolution>,
  pub(crate) classification: Classification,
  pub(crate) errors: Vec<BuildError>,
}

/// Loads one module, classifies it and decides where each of its import records points.
pub(crate) struct ModuleTask<'a> {
  pub(crate) input_options: &'a InputOptions,
  pub(crate) provider: &'a dyn ModuleProvider,
  pub(crate) external: &'a ExternalMatcher,
  pub(crate) id: ModuleId,
}

impl<'a> ModuleTask<'a> {
  #[tracing::instrument(skip_all, fields(id = %self.id))]
  pub(crate) fn run(self) -> Result<TaskResult, BuildError> {
    let module = self.provider.load(&self.id)?;
    let mut errors = vec![];
    let resolutions = module
      .import_records
      .iter()
      .map(|record| self.resolve_record(&module.id, record, &mut errors))
      .collect();
    let classification = classify_module(&module.program.body);
    tracing::trace!("loaded {} as {:?}", module.id, classification.exports_kind());
    Ok(TaskResult {
      module,
      resolutions,
      classification,
      errors,
    })
  }

  fn resolve_record(
    &self,
    importer: &ModuleId,
    record: &RawImportRecord,
    errors: &mut Vec<BuildError>,
  ) -> Resolution {
    let specifier = record.specifier.as_str();
    if self.input_options.platform == Platform::Node && is_node_builtin(specifier) {
      return Resolution::External(ModuleId::new(specifier));
    }
    if self.external.matches(specifier) {
      return Resolution::External(ModuleId::new(specifier));
    }
    match &record.resolved {
      Some(resolved) if resolved.external || self.external.matches(resolved.id.as_ref()) => {
        Resolution::External(resolved.id.clone())
      }
      Some(resolved) => Resolution::Normal(resolved.id.clone()),
      None => {
        let error = BuildError::unresolved_import(specifier)
          .at(importer.as_path(), record.span)
          .with_notes(self.suggestions_for_unresolved(importer, specifier));
        errors.push(error);
        Resolution::Unresolved
      }
    }
  }

  fn suggestions_for_unresolved(&self, importer: &ModuleId, specifier: &str) -> Option<Note> {
    if self.input_options.platform == Platform::Browser && is_node_builtin(specifier) {
      return Some(Note::new(format!(
        "The package \"{specifier}\" wasn't found on the file system but is built into node. Are you trying to bundle for node? You can use \"platform: 'node'\" to do that, which will remove this error."
      )));
    }
    let is_bare = !specifier.starts_with('.') && !specifier.starts_with('/');
    if !is_bare {
      return None;
    }
    let dir = importer.as_path().parent()?;
    let candidate = [specifier.to_string(), format!("{specifier}.js")]
      .into_iter()
      .map(|name| dir.join(name))
      .find(|path| self.provider.file_exists(path))?;
    Some(Note::new(format!(
      "Use the relative path \"./{specifier}\" to reference the file \"{}\". Without the leading \"./\", the path \"{specifier}\" is being interpreted as a package path instead.",
      candidate.as_path().may_display_relative()
    )))
  }
}
