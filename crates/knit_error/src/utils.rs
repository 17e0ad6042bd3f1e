use std::{borrow::Cow, path::Path};

use sugar_path::SugarPath;

use crate::CWD;

/// `"a"`, `"a" and "b"`, `"a", "b" and "c"`
pub fn format_quoted_strings(list: &[impl AsRef<str>]) -> String {
  let mut quoted = list
    .iter()
    .map(|item| format!("\"{}\"", item.as_ref()))
    .collect::<Vec<_>>();
  match quoted.pop() {
    None => String::new(),
    Some(last) if quoted.is_empty() => last,
    Some(last) => format!("{} and {}", quoted.join(", "), last),
  }
}

pub trait PathExt {
  fn may_display_relative(&self) -> Cow<str>;
}

impl PathExt for Path {
  fn may_display_relative(&self) -> Cow<str> {
    let path = if CWD.is_set() && self.is_absolute() {
      CWD.with(|cwd| self.relative(cwd))
    } else {
      return self.to_string_lossy();
    };
    Cow::Owned(path.to_slash_lossy().into_owned())
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn quoted_lists() {
    assert_eq!(format_quoted_strings(&["a"]), "\"a\"");
    assert_eq!(format_quoted_strings(&["a", "b", "c"]), "\"a\", \"b\" and \"c\"");
  }

  #[test]
  fn relative_to_cwd() {
    let cwd = PathBuf::from("/project");
    let path = PathBuf::from("/project/src/a.js");
    assert_eq!(path.may_display_relative(), "/project/src/a.js");
    CWD.set(&cwd, || {
      assert_eq!(path.may_display_relative(), "src/a.js");
    });
  }
}
