use phf::{phf_set, Set};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExternalPattern {
  Exact(String),
  /// `prefix*`, `*suffix` and `pre*post`
  Wildcard { prefix: String, suffix: String },
}

impl ExternalPattern {
  fn parse(raw: &str) -> Self {
    match raw.split_once('*') {
      Some((prefix, suffix)) => ExternalPattern::Wildcard {
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
      },
      None => ExternalPattern::Exact(raw.to_string()),
    }
  }

  fn matches(&self, id: &str) -> bool {
    match self {
      ExternalPattern::Exact(exact) => exact == id,
      ExternalPattern::Wildcard { prefix, suffix } => {
        id.len() >= prefix.len() + suffix.len() && id.starts_with(prefix) && id.ends_with(suffix)
      }
    }
  }
}

/// Decides which specifiers and resolved ids stay outside the bundle.
#[derive(Debug, Clone, Default)]
pub struct ExternalMatcher {
  patterns: Vec<ExternalPattern>,
}

impl ExternalMatcher {
  pub fn new(patterns: &[String]) -> Self {
    Self {
      patterns: patterns.iter().map(|p| ExternalPattern::parse(p)).collect(),
    }
  }

  pub fn matches(&self, id: &str) -> bool {
    self.patterns.iter().any(|p| p.matches(id))
  }
}

static NODE_BUILTINS: Set<&'static str> = phf_set! {
  "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants", "crypto",
  "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2", "https",
  "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode", "querystring",
  "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls", "trace_events", "tty",
  "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
};

/// `fs`, `fs/promises` and anything starting with `node:`.
pub fn is_node_builtin(specifier: &str) -> bool {
  if specifier.starts_with("node:") {
    return true;
  }
  let root = specifier.split('/').next().unwrap_or(specifier);
  NODE_BUILTINS.contains(root)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn patterns() {
    let matcher = ExternalMatcher::new(&[
      "react".to_string(),
      "@scope/*".to_string(),
      "*.css".to_string(),
      "lib/*/index".to_string(),
    ]);
    assert!(matcher.matches("react"));
    assert!(!matcher.matches("react-dom"));
    assert!(matcher.matches("@scope/pkg"));
    assert!(matcher.matches("./style.css"));
    assert!(matcher.matches("lib/a/index"));
    assert!(!matcher.matches("lib/index"));
  }

  #[test]
  fn builtins() {
    assert!(is_node_builtin("fs"));
    assert!(is_node_builtin("fs/promises"));
    assert!(is_node_builtin("node:anything"));
    assert!(!is_node_builtin("lodash"));
  }
}
