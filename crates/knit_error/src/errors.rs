use crate::Error;

/// A collection of knit [Error].
///
/// [Errors] is never empty. You could only construct a `Errors` from a `Error` or a non-empty
/// `Vec<Error>`.
#[derive(Debug)]
pub struct Errors(Vec<Error>);

impl Errors {
  pub fn new(err: Error) -> Self {
    Self(vec![err])
  }

  pub fn push(&mut self, error: Error) {
    self.0.push(error);
  }

  pub fn into_vec(self) -> Vec<Error> {
    self.0
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Error> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    false
  }

  /// Returns `None` for an empty list.
  pub fn from_vec(vec: Vec<Error>) -> Option<Self> {
    (!vec.is_empty()).then_some(Self(vec))
  }

  /// Diagnostic order: file path, then span start, then message.
  pub fn sort(&mut self) {
    self.0.sort();
  }
}

impl Extend<Error> for Errors {
  fn extend<T: IntoIterator<Item = Error>>(&mut self, iter: T) {
    self.0.extend(iter)
  }
}

impl From<Error> for Errors {
  fn from(error: Error) -> Self {
    Self(vec![error])
  }
}

impl IntoIterator for Errors {
  type Item = Error;
  type IntoIter = std::vec::IntoIter<Error>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}
