use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use knit_common::{ModuleId, ModuleProvider, ParsedModule, ResolvedId};
use knit_core::{BuildError, BuildResult, BundleOutput, Bundler, InputOptions, OutputOptions};
use knit_error::Errors;
use rustc_hash::{FxHashMap, FxHashSet};
use sugar_path::SugarPath;

use crate::{parse, TestConfig};

/// A project that lives in memory under `/project`. Relative specifiers are resolved like node
/// does for plain `.js` files. Bare specifiers are looked up in `/project/node_modules`.
pub struct TestProject {
  cwd: PathBuf,
  files: FxHashMap<PathBuf, String>,
  side_effect_free: FxHashSet<PathBuf>,
}

impl Default for TestProject {
  fn default() -> Self {
    Self::new()
  }
}

impl TestProject {
  pub fn new() -> Self {
    Self {
      cwd: PathBuf::from("/project"),
      files: Default::default(),
      side_effect_free: Default::default(),
    }
  }

  pub fn cwd(&self) -> &Path {
    &self.cwd
  }

  /// Adds a file at `path`, relative to the project root.
  pub fn file(mut self, path: &str, source: impl Into<String>) -> Self {
    self.files.insert(self.absolute(path), source.into());
    self
  }

  /// Marks a file the way `"sideEffects": false` in its package would.
  pub fn side_effect_free(mut self, path: &str) -> Self {
    self.side_effect_free.insert(self.absolute(path));
    self
  }

  fn absolute(&self, path: &str) -> PathBuf {
    self.cwd.join(path).normalize().to_path_buf()
  }

  fn resolve(&self, importer_dir: &Path, specifier: &str) -> Option<PathBuf> {
    let is_relative = specifier == "."
      || specifier == ".."
      || specifier.starts_with("./")
      || specifier.starts_with("../");
    let base = if is_relative {
      importer_dir.join(specifier)
    } else if specifier.starts_with('/') {
      PathBuf::from(specifier)
    } else {
      self.cwd.join("node_modules").join(specifier)
    }
    .normalize()
    .to_path_buf();
    let with_extension = PathBuf::from(format!("{}.js", base.display()));
    let index = base.join("index.js");
    [base, with_extension, index]
      .into_iter()
      .find(|path| self.files.contains_key(path))
  }

  /// Builds the project with the options `config` describes.
  pub fn build(&self, config: &TestConfig) -> BuildResult<BundleOutput> {
    let invalid = |message: String| Errors::new(BuildError::invalid_option(message));
    let input_options = config
      .input_options(&self.cwd, Arc::new(|_| {}))
      .map_err(invalid)?;
    let output_options = config.output_options().map_err(invalid)?;
    self.build_with(input_options, &output_options)
  }

  pub fn build_with(
    &self,
    input_options: InputOptions,
    output_options: &OutputOptions,
  ) -> BuildResult<BundleOutput> {
    Bundler::new(input_options).build(self, output_options)
  }

  /// Every chunk and asset under a header, followed by the warnings.
  pub fn render(&self, output: &BundleOutput) -> String {
    let mut files = output
      .chunks
      .iter()
      .map(|chunk| (&chunk.filename, &chunk.code))
      .chain(
        output
          .assets
          .iter()
          .map(|asset| (&asset.filename, &asset.content)),
      )
      .collect::<Vec<_>>();
    files.sort_by_key(|(filename, _)| *filename);
    let mut lines = files
      .into_iter()
      .flat_map(|(filename, content)| {
        [
          format!("---------- {filename} ----------"),
          content.trim().to_string(),
        ]
      })
      .collect::<Vec<_>>();
    if !output.warnings.is_empty() {
      lines.push("---------- WARNINGS ----------".to_string());
      lines.extend(output.warnings.iter().map(|w| self.render_diagnostic(w)));
    }
    lines.join("\n")
  }

  /// `CODE: message` for each error, with paths relative to the project root.
  pub fn render_errors(&self, errors: &Errors) -> String {
    errors
      .iter()
      .map(|error| self.render_diagnostic(error))
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn render_diagnostic(&self, diagnostic: &BuildError) -> String {
    format!("{}: {}", diagnostic.code(), diagnostic.message(&self.cwd))
  }
}

impl ModuleProvider for TestProject {
  fn resolve_entry(&self, specifier: &str) -> Option<ResolvedId> {
    self.resolve(&self.cwd, specifier).map(|path| ResolvedId {
      id: ModuleId::new(path.to_string_lossy().as_ref()),
      external: false,
    })
  }

  fn load(&self, id: &ModuleId) -> knit_error::Result<ParsedModule> {
    let source = self
      .files
      .get(id.as_path())
      .ok_or_else(|| BuildError::parse_error(format!("Could not read \"{id}\"")))?;
    let mut module = parse(id, source)?;
    let dir = id.as_path().parent().unwrap_or(&self.cwd);
    for record in module.import_records.iter_mut() {
      record.resolved = self
        .resolve(dir, &record.specifier)
        .map(|path| ResolvedId {
          id: ModuleId::new(path.to_string_lossy().as_ref()),
          external: false,
        });
    }
    module.module_side_effects = !self.side_effect_free.contains(id.as_path());
    Ok(module)
  }

  fn file_exists(&self, path: &Path) -> bool {
    self.files.contains_key(&path.normalize().to_path_buf())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_like_node() {
    let project = TestProject::new()
      .file("main.js", "")
      .file("lib/index.js", "")
      .file("node_modules/pkg/index.js", "");
    let resolve = |specifier: &str| {
      project
        .resolve(Path::new("/project"), specifier)
        .map(|path| path.to_string_lossy().to_string())
    };
    assert_eq!(resolve("./main").as_deref(), Some("/project/main.js"));
    assert_eq!(resolve("./main.js").as_deref(), Some("/project/main.js"));
    assert_eq!(resolve("./lib").as_deref(), Some("/project/lib/index.js"));
    assert_eq!(
      resolve("pkg").as_deref(),
      Some("/project/node_modules/pkg/index.js")
    );
    assert_eq!(resolve("./missing"), None);
  }

  #[test]
  fn load_resolves_import_records() {
    let project = TestProject::new()
      .file("main.js", "import { a } from './lib/a'; import 'missing';")
      .file("lib/a.js", "export const a = 1;")
      .side_effect_free("lib/a.js");
    let main = project.load(&ModuleId::new("/project/main.js")).unwrap();
    let resolved = main
      .import_records
      .iter()
      .map(|record| record.resolved.as_ref().map(|r| r.id.to_string()))
      .collect::<Vec<_>>();
    assert_eq!(
      resolved,
      vec![Some("/project/lib/a.js".to_string()), None]
    );
    assert!(main.module_side_effects);
    let a = project.load(&ModuleId::new("/project/lib/a.js")).unwrap();
    assert!(!a.module_side_effects);
  }
}
