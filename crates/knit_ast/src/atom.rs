use std::{
  borrow::{Borrow, Cow},
  fmt::{Debug, Display},
  ops::Deref,
  sync::Arc,
};

/// An immutable, cheaply clonable string used for identifier names, specifiers and literals.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(Arc<str>);

impl Atom {
  pub fn new(value: &str) -> Self {
    Self(Arc::from(value))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Default for Atom {
  fn default() -> Self {
    Self::new("")
  }
}

impl Deref for Atom {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl Borrow<str> for Atom {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for Atom {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl From<&str> for Atom {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for Atom {
  fn from(value: String) -> Self {
    Self(Arc::from(value))
  }
}

impl From<&String> for Atom {
  fn from(value: &String) -> Self {
    Self::new(value)
  }
}

impl From<Cow<'_, str>> for Atom {
  fn from(value: Cow<'_, str>) -> Self {
    Self::new(&value)
  }
}

impl PartialEq<str> for Atom {
  fn eq(&self, other: &str) -> bool {
    self.as_str() == other
  }
}

impl PartialEq<&str> for Atom {
  fn eq(&self, other: &&str) -> bool {
    self.as_str() == *other
  }
}

impl Display for Atom {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl Debug for Atom {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    Debug::fmt(&*self.0, f)
  }
}
