use std::{
  fmt::Display,
  path::{Path, PathBuf},
};

use crate::utils::PathExt;
use crate::CWD;

pub mod error_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
  Error,
  Warning,
  Info,
}

impl Display for Severity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Severity::Error => "error",
      Severity::Warning => "warning",
      Severity::Info => "info",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedImportReason {
  /// The imported file has no exports at all.
  NoExports,
  /// The imported file's exports are known and don't include the name.
  NoMatchingExport,
}

#[derive(Debug)]
pub enum ErrorKind {
  // --- Resolution
  UnresolvedEntry {
    unresolved_id: PathBuf,
  },
  ExternalEntry {
    id: PathBuf,
  },
  UnresolvedImport {
    specifier: String,
  },
  ParseError {
    message: String,
  },

  // --- Linking
  MissingExport {
    name: String,
    importee: PathBuf,
  },
  ImportIsUndefined {
    name: String,
    importee: PathBuf,
    reason: UndefinedImportReason,
  },
  AmbiguousImport {
    name: String,
  },
  AmbiguousReexport {
    name: String,
  },
  CircularReexport {
    name: String,
  },
  AssignToImport {
    name: String,
  },
  AssignToConstant {
    name: String,
    /// The constant is emitted as `var`, so the write only throws at run-time.
    will_throw_at_runtime: bool,
  },
  CallImportNamespace {
    name: String,
    is_construct: bool,
  },

  // --- Module format
  TopLevelReturn,
  TopLevelAwait {
    format: &'static str,
  },
  RequireTopLevelAwait {
    importee: PathBuf,
    /// Set when the await lives in a dependency of `importee` rather than in `importee` itself.
    transitive: Option<PathBuf>,
  },
  ThisIsUndefined,
  UnsupportedRequire,

  // --- Suspicious code
  EqualsNan {
    op: &'static str,
  },
  EqualsNegativeZero {
    op: &'static str,
  },
  EqualsNewObject {
    op: &'static str,
  },
  SuspiciousTypeof {
    value: String,
  },

  InvalidOption {
    message: String,
  },

  /// An invariant of the linker was broken. Raised instead of `panic!()` so the build can shut
  /// down gracefully.
  Panic {
    source: anyhow::Error,
  },
}

fn always(op: &str) -> &'static str {
  if op.starts_with('!') {
    "true"
  } else {
    "false"
  }
}

impl Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::UnresolvedEntry { unresolved_id } => write!(f, "Could not resolve entry module \"{}\"", unresolved_id.may_display_relative()),
      ErrorKind::ExternalEntry { id } => write!(f, "Entry module \"{}\" cannot be external.", id.may_display_relative()),
      ErrorKind::UnresolvedImport { specifier } => write!(f, "Could not resolve \"{specifier}\""),
      ErrorKind::ParseError { message } => f.write_str(message),
      ErrorKind::MissingExport { name, importee } => write!(
        f,
        r#"No matching export in "{}" for import "{name}""#,
        importee.may_display_relative()
      ),
      ErrorKind::ImportIsUndefined { name, importee, reason } => match reason {
        UndefinedImportReason::NoExports => write!(
          f,
          r#"Import "{name}" will always be undefined because the file "{}" has no exports"#,
          importee.may_display_relative()
        ),
        UndefinedImportReason::NoMatchingExport => write!(
          f,
          r#"Import "{name}" will always be undefined because there is no matching export in "{}""#,
          importee.may_display_relative()
        ),
      },
      ErrorKind::AmbiguousImport { name } => write!(f, r#"Ambiguous import "{name}" has multiple matching exports"#),
      ErrorKind::AmbiguousReexport { name } => write!(f, r#"Re-export of "{name}" is ambiguous and has been removed"#),
      ErrorKind::CircularReexport { name } => write!(f, r#"Detected cycle while resolving import "{name}""#),
      ErrorKind::AssignToImport { name } => write!(f, r#"Cannot assign to import "{name}""#),
      ErrorKind::AssignToConstant { name, will_throw_at_runtime: false } => write!(f, r#"Cannot assign to "{name}" because it is a constant"#),
      ErrorKind::AssignToConstant { name, will_throw_at_runtime: true } => write!(f, r#"This assignment will throw because "{name}" is a constant"#),
      ErrorKind::CallImportNamespace { name, is_construct } => write!(
        f,
        r#"{} "{name}" will crash at run-time because it's an import namespace object, not a {}"#,
        if *is_construct { "Constructing" } else { "Calling" },
        if *is_construct { "constructor" } else { "function" },
      ),
      ErrorKind::TopLevelReturn => f.write_str("Top-level return cannot be used inside an ECMAScript module"),
      ErrorKind::TopLevelAwait { format } => write!(f, r#"Top-level await is currently not supported with the "{format}" output format"#),
      ErrorKind::RequireTopLevelAwait { importee, transitive } => match transitive {
        None => write!(
          f,
          r#"This require call is not allowed because the imported file "{}" contains a top-level await"#,
          importee.may_display_relative()
        ),
        Some(transitive) => write!(
          f,
          r#"This require call is not allowed because the transitive dependency "{}" contains a top-level await"#,
          transitive.may_display_relative()
        ),
      },
      ErrorKind::ThisIsUndefined => f.write_str(r#"Top-level "this" will be replaced with undefined since this file is an ECMAScript module"#),
      ErrorKind::UnsupportedRequire => f.write_str(r#"This call to "require" will not be bundled because the argument is not a string literal"#),
      ErrorKind::EqualsNan { op } => write!(f, r#"Comparison with NaN using the "{op}" operator here is always {}"#, always(op)),
      ErrorKind::EqualsNegativeZero { op } => write!(f, r#"Comparison with -0 using the "{op}" operator will also match 0"#),
      ErrorKind::EqualsNewObject { op } => write!(f, r#"Comparison using the "{op}" operator here is always {}"#, always(op)),
      ErrorKind::SuspiciousTypeof { value } => write!(f, r#"The "typeof" operator will never evaluate to "{value}""#),
      ErrorKind::InvalidOption { message } => f.write_str(message),
      ErrorKind::Panic { source } => source.fmt(f),
    }
  }
}

impl ErrorKind {
  /// Shorten the file paths in messages by make them relative to CWD.
  pub fn to_readable_string(&self, cwd: impl AsRef<Path>) -> String {
    let cwd = cwd.as_ref().to_path_buf();
    CWD.set(&cwd, || self.to_string())
  }

  pub fn code(&self) -> &'static str {
    match self {
      ErrorKind::UnresolvedEntry { .. } => error_code::UNRESOLVED_ENTRY,
      ErrorKind::ExternalEntry { .. } => error_code::EXTERNAL_ENTRY,
      ErrorKind::UnresolvedImport { .. } => error_code::UNRESOLVED_IMPORT,
      ErrorKind::ParseError { .. } => error_code::PARSE_ERROR,
      ErrorKind::MissingExport { .. } => error_code::MISSING_EXPORT,
      ErrorKind::ImportIsUndefined { .. } => error_code::IMPORT_IS_UNDEFINED,
      ErrorKind::AmbiguousImport { .. } => error_code::AMBIGUOUS_IMPORT,
      ErrorKind::AmbiguousReexport { .. } => error_code::AMBIGUOUS_REEXPORT,
      ErrorKind::CircularReexport { .. } => error_code::CIRCULAR_REEXPORT,
      ErrorKind::AssignToImport { .. } => error_code::ASSIGN_TO_IMPORT,
      ErrorKind::AssignToConstant { .. } => error_code::ASSIGN_TO_CONSTANT,
      ErrorKind::CallImportNamespace { .. } => error_code::CALL_IMPORT_NAMESPACE,
      ErrorKind::TopLevelReturn => error_code::TOP_LEVEL_RETURN,
      ErrorKind::TopLevelAwait { .. } => error_code::TOP_LEVEL_AWAIT,
      ErrorKind::RequireTopLevelAwait { .. } => error_code::REQUIRE_TOP_LEVEL_AWAIT,
      ErrorKind::ThisIsUndefined => error_code::THIS_IS_UNDEFINED,
      ErrorKind::UnsupportedRequire => error_code::UNSUPPORTED_REQUIRE,
      ErrorKind::EqualsNan { .. } => error_code::EQUALS_NAN,
      ErrorKind::EqualsNegativeZero { .. } => error_code::EQUALS_NEGATIVE_ZERO,
      ErrorKind::EqualsNewObject { .. } => error_code::EQUALS_NEW_OBJECT,
      ErrorKind::SuspiciousTypeof { .. } => error_code::SUSPICIOUS_TYPEOF,
      ErrorKind::InvalidOption { .. } => error_code::INVALID_OPTION,
      ErrorKind::Panic { .. } => error_code::PANIC,
    }
  }

  pub fn severity(&self) -> Severity {
    match self {
      ErrorKind::ImportIsUndefined { .. }
      | ErrorKind::AmbiguousImport { .. }
      | ErrorKind::AmbiguousReexport { .. }
      | ErrorKind::AssignToConstant {
        will_throw_at_runtime: true,
        ..
      }
      | ErrorKind::CallImportNamespace { .. }
      | ErrorKind::EqualsNan { .. }
      | ErrorKind::EqualsNegativeZero { .. }
      | ErrorKind::EqualsNewObject { .. }
      | ErrorKind::SuspiciousTypeof { .. } => Severity::Warning,
      ErrorKind::ThisIsUndefined | ErrorKind::UnsupportedRequire => Severity::Info,
      ErrorKind::UnresolvedEntry { .. }
      | ErrorKind::ExternalEntry { .. }
      | ErrorKind::UnresolvedImport { .. }
      | ErrorKind::ParseError { .. }
      | ErrorKind::MissingExport { .. }
      | ErrorKind::CircularReexport { .. }
      | ErrorKind::AssignToImport { .. }
      | ErrorKind::AssignToConstant { .. }
      | ErrorKind::TopLevelReturn
      | ErrorKind::TopLevelAwait { .. }
      | ErrorKind::RequireTopLevelAwait { .. }
      | ErrorKind::InvalidOption { .. }
      | ErrorKind::Panic { .. } => Severity::Error,
    }
  }
}
