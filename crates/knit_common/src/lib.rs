use std::{fmt::Display, path::Path};

use knit_ast::Atom;

mod bits;
pub use bits::*;
mod union_find;
pub use union_find::*;
mod symbol;
pub use symbol::*;
mod module;
pub use module::*;

oxc_index::define_index_type! {
  pub struct ModuleIdx = u32;
}

/// Resolved path of a module, used as its identity.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct ModuleId(Atom);

impl Display for ModuleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl ModuleId {
  pub fn new(value: impl Into<Atom>) -> Self {
    Self(value.into())
  }

  pub fn id(&self) -> &Atom {
    &self.0
  }

  pub fn as_path(&self) -> &Path {
    Path::new(self.0.as_str())
  }

  /// `/src/foo/index.js` gives `foo`, `/src/bar.js` gives `bar`.
  pub fn stem(&self) -> &str {
    let path = self.as_path();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    if stem == "index" {
      path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or(stem)
    } else {
      stem
    }
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl AsRef<Path> for ModuleId {
  fn as_ref(&self) -> &Path {
    self.as_path()
  }
}

impl From<&str> for ModuleId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stem_of_index_file_uses_directory() {
    assert_eq!(ModuleId::new("/src/foo/index.js").stem(), "foo");
    assert_eq!(ModuleId::new("/src/bar.js").stem(), "bar");
    assert_eq!(ModuleId::new("lodash").stem(), "lodash");
  }
}
