use once_cell::sync::Lazy;
use phf::{phf_set, Set};

/// Keywords and names that can never be used as a binding, plus the globals whose meaning would
/// change if they were shadowed.
pub static RESERVED_NAMES: Set<&'static str> = phf_set! {
    "Infinity",
    "NaN",
    "arguments",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "with",
    "yield",
};

/// Words that may never name a label or a minified binding.
pub fn is_keyword(name: &str) -> bool {
  RESERVED_NAMES.contains(name)
}

fn starts_with_digit(s: &str) -> bool {
  s.chars().next().map_or(false, |c| c.is_ascii_digit())
}

fn need_escape(s: &str) -> bool {
  s.is_empty() || starts_with_digit(s) || RESERVED_NAMES.contains(s)
}

static ILLEGAL_CHARACTERS: Lazy<regex::Regex> =
  Lazy::new(|| regex::Regex::new(r"[^\w$]").expect("valid regex"));

/// Turns a file stem like `lodash-es` into an identifier like `lodash_es`.
pub fn make_legal(value: &str) -> String {
  let value = ILLEGAL_CHARACTERS.replace_all(value, "_");

  let ret = if need_escape(&value) {
    format!("_{}", value)
  } else {
    value.to_string()
  };

  if ret != value {
    tracing::trace!("illegal identifier: {}, replaced with {}", value, ret);
  }

  ret
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legal_names() {
    assert_eq!(make_legal("lodash-es"), "lodash_es");
    assert_eq!(make_legal("@scope/pkg"), "_scope_pkg");
    assert_eq!(make_legal("2d"), "_2d");
    assert_eq!(make_legal("default"), "_default");
    assert_eq!(make_legal("foo"), "foo");
  }
}
