use std::{path::Path, str::FromStr};

use knit_core::{
  InputItem as CoreInputItem, InputOptions, LegalComments, MinifyOptions, ModuleFormat,
  OutputOptions, Platform, WarningHandler,
};
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::impl_serde_default;

fn input_default() -> Vec<InputItem> {
  vec![InputItem {
    name: "main".to_string(),
    import: "./main".to_string(),
  }]
}

fn true_by_default() -> bool {
  true
}

fn esm_by_default() -> String {
  "esm".to_string()
}

fn browser_by_default() -> String {
  "browser".to_string()
}

fn inline_by_default() -> String {
  "inline".to_string()
}

/// Options of one test case, written as JSON.
#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestConfig {
  #[serde(default = "input_default")]
  pub input: Vec<InputItem>,

  #[serde(default)]
  pub external: Vec<String>,

  #[serde(default = "true_by_default")]
  pub treeshake: bool,

  #[serde(default = "browser_by_default")]
  pub platform: String,

  #[serde(default)]
  pub inject: Vec<String>,

  #[serde(default = "esm_by_default")]
  pub format: String,

  #[serde(default)]
  pub code_splitting: bool,

  #[serde(default)]
  pub minify: Minify,

  #[serde(default)]
  pub keep_names: bool,

  #[serde(default = "inline_by_default")]
  pub legal_comments: String,

  #[serde(default)]
  pub global_name: Option<String>,

  /// A regular expression. Matching property names are renamed.
  #[serde(default)]
  pub mangle_props: Option<String>,

  #[serde(default)]
  pub reserve_props: Option<String>,

  #[serde(default)]
  pub entry_file_names: Option<String>,

  #[serde(default)]
  pub chunk_file_names: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InputItem {
  pub name: String,
  pub import: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Minify {
  #[serde(default)]
  pub identifiers: bool,
  #[serde(default)]
  pub syntax: bool,
  #[serde(default)]
  pub whitespace: bool,
}

impl_serde_default!(TestConfig);
impl_serde_default!(Minify);

impl TestConfig {
  pub fn from_json(json: &str) -> serde_json::Result<Self> {
    serde_json::from_str(json)
  }

  pub fn json_schema() -> String {
    let schema = schemars::schema_for!(TestConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
  }

  pub fn input_options(
    &self,
    cwd: &Path,
    on_warn: WarningHandler,
  ) -> Result<InputOptions, String> {
    Ok(InputOptions {
      input: self
        .input
        .iter()
        .map(|item| CoreInputItem::new(&item.name, &item.import))
        .collect(),
      cwd: cwd.to_path_buf(),
      treeshake: self.treeshake,
      external: self.external.clone(),
      platform: Platform::from_str(&self.platform)?,
      inject: self.inject.clone(),
      on_warn,
      ..Default::default()
    })
  }

  pub fn output_options(&self) -> Result<OutputOptions, String> {
    let regex = |pattern: &Option<String>| {
      pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|err| err.to_string())
    };
    let defaults = OutputOptions::default();
    Ok(OutputOptions {
      format: ModuleFormat::from_str(&self.format)?,
      code_splitting: self.code_splitting,
      minify: MinifyOptions {
        identifiers: self.minify.identifiers,
        syntax: self.minify.syntax,
        whitespace: self.minify.whitespace,
      },
      mangle_props: regex(&self.mangle_props)?,
      reserve_props: regex(&self.reserve_props)?,
      keep_names: self.keep_names,
      legal_comments: LegalComments::from_str(&self.legal_comments)?,
      global_name: self.global_name.clone(),
      entry_file_names: self
        .entry_file_names
        .as_deref()
        .map_or(defaults.entry_file_names, Into::into),
      chunk_file_names: self
        .chunk_file_names
        .as_deref()
        .map_or(defaults.chunk_file_names, Into::into),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = TestConfig::default();
    assert_eq!(config.input.len(), 1);
    assert_eq!(config.input[0].import, "./main");
    assert!(config.treeshake);
    let output = config.output_options().unwrap();
    assert_eq!(output.format, ModuleFormat::Esm);
    assert_eq!(output.legal_comments, LegalComments::Inline);
  }

  #[test]
  fn rejects_unknown_fields_and_values() {
    assert!(TestConfig::from_json(r#"{ "formatt": "cjs" }"#).is_err());
    let config = TestConfig::from_json(r#"{ "format": "umd" }"#).unwrap();
    assert_eq!(
      config.output_options().err().as_deref(),
      Some("Invalid module format: umd")
    );
  }

  #[test]
  fn schema_lists_options() {
    let schema = TestConfig::json_schema();
    assert!(schema.contains("codeSplitting"));
    assert!(schema.contains("legalComments"));
  }
}
