use std::str::FromStr;

use derivative::Derivative;
use regex::Regex;

pub mod file_name;
use file_name::FileNameTemplate;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ModuleFormat {
  #[default]
  Esm,
  Cjs,
  Iife,
  /// Keeps the module syntax of the input. Behaves like `esm` for the linker.
  Preserve,
}

impl ModuleFormat {
  pub fn is_es(self) -> bool {
    matches!(self, ModuleFormat::Esm | ModuleFormat::Preserve)
  }

  pub fn is_cjs(self) -> bool {
    self == ModuleFormat::Cjs
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ModuleFormat::Esm => "esm",
      ModuleFormat::Cjs => "cjs",
      ModuleFormat::Iife => "iife",
      ModuleFormat::Preserve => "preserve",
    }
  }

  /// `esm` and pass-through output keep top-level await.
  pub fn supports_top_level_await(self) -> bool {
    self.is_es()
  }

  /// The entry's exports have to be materialized as an object.
  pub fn needs_exports_object(self) -> bool {
    matches!(self, ModuleFormat::Cjs | ModuleFormat::Iife)
  }
}

impl FromStr for ModuleFormat {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "esm" => Ok(ModuleFormat::Esm),
      "cjs" => Ok(ModuleFormat::Cjs),
      "iife" => Ok(ModuleFormat::Iife),
      "preserve" => Ok(ModuleFormat::Preserve),
      _ => Err(format!("Invalid module format: {value}")),
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LegalComments {
  None,
  #[default]
  Inline,
  Eof,
  Linked,
  External,
}

impl FromStr for LegalComments {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "none" => Ok(LegalComments::None),
      "inline" => Ok(LegalComments::Inline),
      "eof" => Ok(LegalComments::Eof),
      "linked" => Ok(LegalComments::Linked),
      "external" => Ok(LegalComments::External),
      _ => Err(format!("Invalid legal comments mode: {value}")),
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MinifyOptions {
  pub identifiers: bool,
  pub syntax: bool,
  pub whitespace: bool,
}

impl MinifyOptions {
  pub fn all() -> Self {
    Self {
      identifiers: true,
      syntax: true,
      whitespace: true,
    }
  }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct OutputOptions {
  pub format: ModuleFormat,
  pub code_splitting: bool,
  pub minify: MinifyOptions,
  pub mangle_props: Option<Regex>,
  pub reserve_props: Option<Regex>,
  pub keep_names: bool,
  pub legal_comments: LegalComments,
  /// Name of the global an `iife` bundle assigns its exports to.
  pub global_name: Option<String>,
  pub entry_file_names: FileNameTemplate,
  pub chunk_file_names: FileNameTemplate,
}

impl Default for OutputOptions {
  fn default() -> Self {
    Self {
      format: ModuleFormat::Esm,
      code_splitting: false,
      minify: MinifyOptions::default(),
      mangle_props: None,
      reserve_props: None,
      keep_names: false,
      legal_comments: LegalComments::default(),
      global_name: None,
      entry_file_names: FileNameTemplate::from("[name].js".to_string()),
      chunk_file_names: FileNameTemplate::from("[name]-[hash].js".to_string()),
    }
  }
}
