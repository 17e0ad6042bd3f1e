use std::{path::PathBuf, str::FromStr, sync::Arc};

use derivative::Derivative;

use crate::BuildError;

mod external;
pub use external::*;

pub type WarningHandler = Arc<dyn Fn(&BuildError) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct InputItem {
  pub name: String,
  pub import: String,
}

impl InputItem {
  pub fn new(name: impl Into<String>, import: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      import: import.into(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
  #[default]
  Browser,
  Node,
  Neutral,
}

impl FromStr for Platform {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "browser" => Ok(Platform::Browser),
      "node" => Ok(Platform::Node),
      "neutral" => Ok(Platform::Neutral),
      _ => Err(format!("Invalid platform: {value}")),
    }
  }
}

#[derive(Debug, Clone)]
pub struct JsxOptions {
  pub factory: String,
  pub fragment: String,
}

impl Default for JsxOptions {
  fn default() -> Self {
    Self {
      factory: "React.createElement".to_string(),
      fragment: "React.Fragment".to_string(),
    }
  }
}

impl JsxOptions {
  /// `React` for `React.createElement`. These names must stay visible to generated JSX calls.
  pub fn reserved_roots(&self) -> impl Iterator<Item = &str> {
    [&self.factory, &self.fragment]
      .into_iter()
      .filter_map(|expr| expr.split('.').next())
      .filter(|root| !root.is_empty())
  }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct InputOptions {
  pub input: Vec<InputItem>,
  pub cwd: PathBuf,
  pub treeshake: bool,
  /// Exact specifiers or patterns with a single `*`.
  pub external: Vec<String>,
  pub platform: Platform,
  /// Files evaluated before every entry. Their exports replace matching unbound globals.
  pub inject: Vec<String>,
  pub jsx: JsxOptions,
  #[derivative(Debug = "ignore")]
  pub on_warn: WarningHandler,
}

impl Default for InputOptions {
  fn default() -> Self {
    Self {
      input: Default::default(),
      cwd: std::env::current_dir().unwrap_or_default(),
      treeshake: true,
      external: Default::default(),
      platform: Default::default(),
      inject: Default::default(),
      jsx: Default::default(),
      on_warn: Arc::new(|err| {
        eprintln!("{}", err);
      }),
    }
  }
}
