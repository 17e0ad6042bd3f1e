//! Runs bundles under node, when it is installed.

mod common;

use std::{fs, process::Command};

use common::build;
use knit_core::BundleOutput;
use knit_test_utils::TestProject;
use pretty_assertions::assert_eq;

fn node_available() -> bool {
  Command::new("node")
    .arg("--version")
    .output()
    .map(|out| out.status.success())
    .unwrap_or(false)
}

/// Writes every chunk of an ES bundle to a temporary directory and runs `entry` with node.
/// `None` when node is not available.
fn run(output: &BundleOutput, entry: &str) -> Option<String> {
  if !node_available() {
    eprintln!("skipping run of {entry}: node not available");
    return None;
  }
  let dir = tempfile::tempdir().expect("create temp dir");
  fs::write(dir.path().join("package.json"), r#"{ "type": "module" }"#)
    .expect("write package.json");
  for chunk in &output.chunks {
    fs::write(dir.path().join(&chunk.filename), &chunk.code).expect("write chunk");
  }
  let out = Command::new("node")
    .arg(entry)
    .current_dir(dir.path())
    .output()
    .expect("run node");
  assert!(
    out.status.success(),
    "{entry} failed:\n{}",
    String::from_utf8_lossy(&out.stderr)
  );
  Some(String::from_utf8_lossy(&out.stdout).into_owned())
}

#[test]
fn commonjs_default_import_runs() {
  let project = TestProject::new()
    .file("main.js", "import foo from './foo'; console.log(foo());")
    .file("foo.js", "module.exports = function () { return 'from cjs'; };");
  let Some(stdout) = run(&build(&project, "{}"), "main.js") else {
    return;
  };
  assert_eq!(stdout, "from cjs\n");
}

#[test]
fn dynamic_import_waits_for_top_level_await() {
  let project = TestProject::new()
    .file("main.js", "import('./t').then((m) => console.log('value', m.v));")
    .file("t.js", "await 1; export const v = 2;");
  let Some(stdout) = run(&build(&project, "{}"), "main.js") else {
    return;
  };
  assert_eq!(stdout, "value 2\n");
}

#[test]
fn split_entries_share_mutable_bindings() {
  let project = TestProject::new()
    .file(
      "a.js",
      "import { count, inc } from './shared'; inc(); console.log('a', count);",
    )
    .file("b.js", "import { count } from './shared'; console.log('b', count);")
    .file(
      "shared.js",
      "export let count = 0; export function inc() { count++; }",
    );
  let output = build(
    &project,
    r#"{
      "input": [{ "name": "a", "import": "./a" }, { "name": "b", "import": "./b" }],
      "codeSplitting": true
    }"#,
  );
  let Some(a) = run(&output, "a.js") else {
    return;
  };
  assert_eq!(a, "a 1\n");
  assert_eq!(run(&output, "b.js").as_deref(), Some("b 0\n"));
}
