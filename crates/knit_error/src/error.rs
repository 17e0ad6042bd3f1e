use std::{
  cmp::Ordering,
  fmt::Display,
  path::{Path, PathBuf},
};

use knit_ast::Span;

use crate::{utils::PathExt, ErrorKind, Severity, UndefinedImportReason, CWD};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
  pub path: PathBuf,
  pub span: Span,
}

impl Location {
  pub fn new(path: impl AsRef<Path>, span: Span) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
      span,
    }
  }
}

impl Display for Location {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}:{}..{}",
      self.path.may_display_relative(),
      self.span.start,
      self.span.end
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
  pub text: String,
  pub location: Option<Location>,
}

impl Note {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      location: None,
    }
  }

  pub fn at(text: impl Into<String>, path: impl AsRef<Path>, span: Span) -> Self {
    Self {
      text: text.into(),
      location: Some(Location::new(path, span)),
    }
  }
}

#[derive(Debug)]
pub struct Error {
  contexts: Vec<String>,
  pub kind: ErrorKind,
  pub location: Option<Location>,
  pub notes: Vec<Note>,
}

impl Error {
  fn with_kind(kind: ErrorKind) -> Self {
    Self {
      contexts: vec![],
      kind,
      location: None,
      notes: vec![],
    }
  }

  pub fn context(mut self, context: String) -> Self {
    self.contexts.push(context);
    self
  }

  pub fn at(mut self, path: impl AsRef<Path>, span: Span) -> Self {
    self.location = Some(Location::new(path, span));
    self
  }

  pub fn with_note(mut self, note: Note) -> Self {
    self.notes.push(note);
    self
  }

  pub fn with_notes(mut self, notes: impl IntoIterator<Item = Note>) -> Self {
    self.notes.extend(notes);
    self
  }

  pub fn code(&self) -> &'static str {
    self.kind.code()
  }

  pub fn severity(&self) -> Severity {
    self.kind.severity()
  }

  pub fn is_error(&self) -> bool {
    self.severity() == Severity::Error
  }

  /// The message alone, with paths relative to `cwd`.
  pub fn message(&self, cwd: impl AsRef<Path>) -> String {
    self.kind.to_readable_string(cwd)
  }

  /// The full diagnostic, with paths relative to `cwd`.
  pub fn to_readable_string(&self, cwd: impl AsRef<Path>) -> String {
    let cwd = cwd.as_ref().to_path_buf();
    CWD.set(&cwd, || self.to_string())
  }

  fn sort_key(&self) -> (Option<&Path>, u32, String) {
    (
      self.location.as_ref().map(|loc| loc.path.as_path()),
      self.location.as_ref().map_or(0, |loc| loc.span.start),
      self.kind.to_string(),
    )
  }

  // --- Resolution

  pub fn unresolved_entry(unresolved_id: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedEntry {
      unresolved_id: unresolved_id.as_ref().to_path_buf(),
    })
  }

  pub fn entry_cannot_be_external(unresolved_id: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::ExternalEntry {
      id: unresolved_id.as_ref().to_path_buf(),
    })
  }

  pub fn unresolved_import(specifier: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedImport {
      specifier: specifier.into(),
    })
  }

  pub fn parse_error(message: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::ParseError {
      message: message.into(),
    })
  }

  // --- Linking

  pub fn missing_export(name: impl Into<String>, importee: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::MissingExport {
      name: name.into(),
      importee: importee.as_ref().to_path_buf(),
    })
  }

  pub fn import_is_undefined(
    name: impl Into<String>,
    importee: impl AsRef<Path>,
    reason: UndefinedImportReason,
  ) -> Self {
    Self::with_kind(ErrorKind::ImportIsUndefined {
      name: name.into(),
      importee: importee.as_ref().to_path_buf(),
      reason,
    })
  }

  pub fn ambiguous_import(name: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::AmbiguousImport { name: name.into() })
  }

  pub fn ambiguous_reexport(name: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::AmbiguousReexport { name: name.into() })
  }

  pub fn circular_reexport(name: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::CircularReexport { name: name.into() })
  }

  pub fn assign_to_import(name: impl Into<String>) -> Self {
    let name = name.into();
    let setter = {
      let mut chars = name.chars();
      chars.next().map_or_else(String::new, |first| {
        format!("set{}{}", first.to_uppercase(), chars.as_str())
      })
    };
    Self::with_kind(ErrorKind::AssignToImport { name }).with_note(Note::new(format!(
      "Imports are immutable in JavaScript. To modify the value of this import, you must export a setter function in the imported file (e.g. \"{setter}\") and then import and call that function here instead."
    )))
  }

  pub fn assign_to_constant(name: impl Into<String>, will_throw_at_runtime: bool) -> Self {
    Self::with_kind(ErrorKind::AssignToConstant {
      name: name.into(),
      will_throw_at_runtime,
    })
  }

  pub fn call_import_namespace(name: impl Into<String>, is_construct: bool) -> Self {
    Self::with_kind(ErrorKind::CallImportNamespace {
      name: name.into(),
      is_construct,
    })
  }

  // --- Module format

  pub fn top_level_return() -> Self {
    Self::with_kind(ErrorKind::TopLevelReturn)
  }

  pub fn top_level_await(format: &'static str) -> Self {
    Self::with_kind(ErrorKind::TopLevelAwait { format })
  }

  pub fn require_top_level_await(importee: impl AsRef<Path>, transitive: Option<PathBuf>) -> Self {
    Self::with_kind(ErrorKind::RequireTopLevelAwait {
      importee: importee.as_ref().to_path_buf(),
      transitive,
    })
  }

  pub fn this_is_undefined() -> Self {
    Self::with_kind(ErrorKind::ThisIsUndefined)
  }

  pub fn unsupported_require() -> Self {
    Self::with_kind(ErrorKind::UnsupportedRequire)
  }

  // --- Suspicious code

  pub fn equals_nan(op: &'static str) -> Self {
    Self::with_kind(ErrorKind::EqualsNan { op })
  }

  pub fn equals_negative_zero(op: &'static str) -> Self {
    Self::with_kind(ErrorKind::EqualsNegativeZero { op })
  }

  pub fn equals_new_object(op: &'static str) -> Self {
    Self::with_kind(ErrorKind::EqualsNewObject { op })
  }

  pub fn suspicious_typeof(value: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::SuspiciousTypeof {
      value: value.into(),
    })
  }

  pub fn invalid_option(message: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::InvalidOption {
      message: message.into(),
    })
  }

  pub fn panic(msg: String) -> Self {
    anyhow::format_err!(msg).into()
  }
}

impl PartialEq for Error {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Error {}

impl PartialOrd for Error {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Error {
  fn cmp(&self, other: &Self) -> Ordering {
    self.sort_key().cmp(&other.sort_key())
  }
}

impl std::convert::From<anyhow::Error> for Error {
  fn from(value: anyhow::Error) -> Self {
    Self::with_kind(ErrorKind::Panic { source: value })
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.kind {
      ErrorKind::Panic { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for ctx in self.contexts.iter().rev() {
      writeln!(f, "{}: {}", ansi_term::Color::Yellow.paint("context"), ctx)?;
    }
    write!(f, "{}[{}]: {}", self.severity(), self.code(), self.kind)?;
    if let Some(location) = &self.location {
      write!(f, "\n  --> {location}")?;
    }
    for note in &self.notes {
      write!(f, "\n  note: {}", note.text)?;
      if let Some(location) = &note.location {
        write!(f, "\n    --> {location}")?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn display_with_location_and_notes() {
    let error = Error::assign_to_import("count")
      .at("/project/a.js", Span::new(20, 25))
      .with_note(Note::at(
        "The symbol \"count\" was declared here:",
        "/project/a.js",
        Span::new(9, 14),
      ));
    assert_eq!(
      error.to_readable_string("/project"),
      "error[ASSIGN_TO_IMPORT]: Cannot assign to import \"count\"
  --> a.js:20..25
  note: Imports are immutable in JavaScript. To modify the value of this import, you must export a setter function in the imported file (e.g. \"setCount\") and then import and call that function here instead.
  note: The symbol \"count\" was declared here:
    --> a.js:9..14"
    );
  }

  #[test]
  fn severity_follows_kind() {
    assert_eq!(Error::missing_export("x", "/b.js").severity(), Severity::Error);
    assert_eq!(
      Error::import_is_undefined("x", "/b.js", UndefinedImportReason::NoExports).severity(),
      Severity::Warning
    );
    assert_eq!(Error::this_is_undefined().severity(), Severity::Info);
    assert_eq!(Error::assign_to_constant("x", true).severity(), Severity::Warning);
    assert_eq!(Error::assign_to_constant("x", false).severity(), Severity::Error);
  }

  #[test]
  fn sorted_by_path_then_span_then_message() {
    let mut errors = vec![
      Error::circular_reexport("b").at("/b.js", Span::new(0, 1)),
      Error::circular_reexport("z").at("/a.js", Span::new(10, 11)),
      Error::circular_reexport("y").at("/a.js", Span::new(3, 4)),
      Error::circular_reexport("a").at("/a.js", Span::new(3, 4)),
    ];
    errors.sort();
    let messages = errors.iter().map(|e| e.kind.to_string()).collect::<Vec<_>>();
    assert_eq!(
      messages,
      vec![
        "Detected cycle while resolving import \"a\"",
        "Detected cycle while resolving import \"y\"",
        "Detected cycle while resolving import \"z\"",
        "Detected cycle while resolving import \"b\"",
      ]
    );
  }

  #[test]
  fn internal_failures_carry_their_context() {
    let error = Error::panic("lib.js has no namespace".to_string()).context("linking".to_string());
    assert_eq!(error.code(), "PANIC");
    assert!(error.is_error());
    let rendered = error.to_string();
    assert!(rendered.contains("linking"), "{rendered}");
    assert!(rendered.ends_with("error[PANIC]: lib.js has no namespace"), "{rendered}");
  }

  #[test]
  fn suspicious_comparisons() {
    assert_eq!(
      Error::equals_nan("!==").kind.to_string(),
      "Comparison with NaN using the \"!==\" operator here is always true"
    );
    assert_eq!(
      Error::call_import_namespace("ns", true).kind.to_string(),
      "Constructing \"ns\" will crash at run-time because it's an import namespace object, not a constructor"
    );
  }
}
