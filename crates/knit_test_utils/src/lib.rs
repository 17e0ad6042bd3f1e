//! Helpers for testing the bundler without touching the file system: a JavaScript parser that
//! produces [knit_common::ParsedModule]s, an in-memory project and JSON test configs.

mod parser;
pub use parser::parse;
mod test_config;
pub use test_config::TestConfig;
mod test_project;
pub use test_project::TestProject;

#[macro_export]
macro_rules! impl_serde_default {
  ($name:ident) => {
    impl Default for $name {
      fn default() -> Self {
        serde_json::from_str("{}").expect("Failed to parse default config")
      }
    }
  };
}
