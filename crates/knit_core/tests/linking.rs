mod common;

use common::{build, build_errors, main_code, warning_codes};
use knit_error::error_code;
use knit_test_utils::TestProject;
use pretty_assertions::assert_eq;

#[test]
fn renamed_reexport_cycle_reports_every_name() {
  let project = TestProject::new()
    .file("main.js", "import './foo';")
    .file("foo.js", "export { b as a } from './bar';")
    .file("bar.js", "export { c as b } from './baz';")
    .file("baz.js", "export { d as c } from './qux';")
    .file("qux.js", "export { a as d } from './foo';");
  // One error per file of the cycle, sorted by path.
  insta::assert_snapshot!(build_errors(&project, "{}").join("\n"), @r###"
  CIRCULAR_REEXPORT: Detected cycle while resolving import "c"
  CIRCULAR_REEXPORT: Detected cycle while resolving import "d"
  CIRCULAR_REEXPORT: Detected cycle while resolving import "b"
  CIRCULAR_REEXPORT: Detected cycle while resolving import "a"
  "###);
}

#[test]
fn imports_bind_through_reexport_chains() {
  let project = TestProject::new()
    .file(
      "main.js",
      "import { value } from './index'; console.log(value);",
    )
    .file("index.js", "export { inner as value } from './mid';")
    .file("mid.js", "export * from './leaf';")
    .file("leaf.js", "export const inner = 'leaf';");
  let output = build(&project, "{}");
  let code = main_code(&output);
  assert!(code.contains(r#"const inner = "leaf";"#), "{code}");
  assert!(code.contains("console.log(inner);"), "{code}");
  assert!(output.warnings.is_empty());
}

#[test]
fn missing_export_of_esm_file_is_an_error() {
  let project = TestProject::new()
    .file("main.js", "import { x } from './a'; console.log(x);")
    .file("a.js", "export const y = 1;");
  assert_eq!(
    build_errors(&project, "{}"),
    vec![r#"MISSING_EXPORT: No matching export in "a.js" for import "x""#]
  );
}

#[test]
fn missing_export_of_file_without_exports_is_a_warning() {
  let project = TestProject::new()
    .file("main.js", "import { x } from './a'; console.log(x);")
    .file("a.js", "console.log('side effect');");
  let output = build(&project, "{}");
  assert_eq!(warning_codes(&output), vec![error_code::IMPORT_IS_UNDEFINED]);
  assert_eq!(
    output.warnings[0].message(project.cwd()),
    r#"Import "x" will always be undefined because the file "a.js" has no exports"#
  );
  assert!(main_code(&output).contains("console.log(void 0);"));
}

#[test]
fn ambiguous_star_exports_warn_with_both_origins() {
  let project = TestProject::new()
    .file("main.js", "import { x } from './ab'; console.log(x);")
    .file("ab.js", "export * from './a'; export * from './b';")
    .file("a.js", "export const x = 1;")
    .file("b.js", "export const x = 2;");
  let output = build(&project, "{}");
  assert_eq!(warning_codes(&output), vec![error_code::AMBIGUOUS_IMPORT]);
  assert_eq!(output.warnings[0].notes.len(), 2);
}

#[test]
fn local_export_shadows_star_exports() {
  let project = TestProject::new()
    .file("main.js", "import { x } from './ab'; console.log(x);")
    .file(
      "ab.js",
      "export * from './a'; export * from './b'; export const x = 'local';",
    )
    .file("a.js", "export const x = 1;")
    .file("b.js", "export const x = 2;");
  let output = build(&project, "{}");
  assert!(output.warnings.is_empty());
  assert!(main_code(&output).contains(r#"const x = "local";"#));
}

#[test]
fn assignments_to_imports() {
  let project = TestProject::new()
    .file("main.js", "import { x } from './a'; x = 2;")
    .file("a.js", "export let x = 1;");
  assert_eq!(
    build_errors(&project, "{}"),
    vec![r#"ASSIGN_TO_IMPORT: Cannot assign to import "x""#]
  );
}

#[test]
fn updates_destructuring_and_delete_of_imports() {
  let project = TestProject::new()
    .file("main.js", "import { x } from './a';\nx++;\n[x] = [1];\ndelete x;")
    .file("a.js", "export let x = 1;");
  let errors = project.build(&common::config("{}")).unwrap_err().into_vec();
  assert_eq!(
    errors.iter().map(|e| e.code()).collect::<Vec<_>>(),
    vec![error_code::ASSIGN_TO_IMPORT; 3]
  );
  for error in &errors {
    assert_eq!(error.message(project.cwd()), r#"Cannot assign to import "x""#);
    assert_eq!(
      error.notes.last().unwrap().text,
      r#"The symbol "x" was declared here:"#
    );
  }
}

#[test]
fn assignments_to_constants() {
  let project = TestProject::new().file("main.js", "const k = 1;\nk = 2;\nconsole.log(k);");
  assert_eq!(
    build_errors(&project, "{}"),
    vec![r#"ASSIGN_TO_CONSTANT: Cannot assign to "k" because it is a constant"#]
  );

  // A lazily initialized module declares its constants with `var`, so only the run-time throws.
  let project = TestProject::new()
    .file("main.js", "console.log(require('./c'));")
    .file("c.js", "export const k = 1;\nk = 2;");
  let output = build(&project, "{}");
  assert_eq!(warning_codes(&output), vec![error_code::ASSIGN_TO_CONSTANT]);
  assert_eq!(
    output.warnings[0].message(project.cwd()),
    r#"This assignment will throw because "k" is a constant"#
  );
}

#[test]
fn top_level_return_in_an_es_module() {
  let project = TestProject::new()
    .file("main.js", "import './dep';\nif (done) return;\nconsole.log(1);")
    .file("dep.js", "console.log('dep');");
  let errors = project.build(&common::config("{}")).unwrap_err().into_vec();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].code(), error_code::TOP_LEVEL_RETURN);
  assert_eq!(
    errors[0].notes[0].text,
    r#"This file is considered to be an ECMAScript module because of the "import" keyword here:"#
  );

  let script = TestProject::new().file("main.js", "if (done) return;\nconsole.log(1);");
  assert!(build(&script, "{}").warnings.is_empty());
}

#[test]
fn top_level_this_in_an_es_module() {
  let project = TestProject::new().file("main.js", "export const self = this;");
  let output = build(&project, "{}");
  assert_eq!(warning_codes(&output), vec![error_code::THIS_IS_UNDEFINED]);
  assert!(!output.warnings[0].is_error());
  assert_eq!(
    output.warnings[0].notes[0].text,
    r#"This file is considered to be an ECMAScript module because of the "export" keyword here:"#
  );
}

#[test]
fn ambiguous_names_are_dropped_from_namespaces() {
  let project = TestProject::new()
    .file("main.js", "import * as ns from './ab'; console.log(ns);")
    .file("ab.js", "export * from './a'; export * from './b';")
    .file("a.js", "export const x = 1; export const onlyA = 1;")
    .file("b.js", "export const x = 2;");
  let output = build(&project, "{}");
  assert_eq!(warning_codes(&output), vec![error_code::AMBIGUOUS_REEXPORT]);
  assert_eq!(
    output.warnings[0].message(project.cwd()),
    r#"Re-export of "x" is ambiguous and has been removed"#
  );
  let code = main_code(&output);
  assert!(code.contains("onlyA: () => onlyA"), "{code}");
  assert!(!code.contains("x: () =>"), "{code}");
}

#[test]
fn missing_export_of_commonjs_file_is_a_warning() {
  let project = TestProject::new()
    .file("main.js", "import { missing } from './c'; console.log(missing);")
    .file("c.js", "exports.present = 1;");
  let output = build(&project, "{}");
  assert_eq!(warning_codes(&output), vec![error_code::IMPORT_IS_UNDEFINED]);
  assert_eq!(
    output.warnings[0].message(project.cwd()),
    r#"Import "missing" will always be undefined because there is no matching export in "c.js""#
  );
}

#[test]
fn calling_a_namespace_object() {
  let project = TestProject::new()
    .file("main.js", "import * as ns from './a';\nns();\nnew ns();")
    .file("a.js", "export const a = 1;");
  let output = build(&project, "{}");
  assert_eq!(
    warning_codes(&output),
    vec![error_code::CALL_IMPORT_NAMESPACE; 2]
  );
  insta::assert_snapshot!(
    output
      .warnings
      .iter()
      .map(|w| w.message(project.cwd()))
      .collect::<Vec<_>>()
      .join("\n"),
    @r###"
  Calling "ns" will crash at run-time because it's an import namespace object, not a function
  Constructing "ns" will crash at run-time because it's an import namespace object, not a constructor
  "###
  );
  assert_eq!(
    output.warnings[0].notes[0].text,
    r#"Consider changing "ns" to a default import instead:"#
  );
}

#[test]
fn member_writes_through_namespaces_are_allowed() {
  let project = TestProject::new()
    .file("main.js", "import * as ns from './a'; ns.x = 2; console.log(ns);")
    .file("a.js", "export let x = 1;");
  let output = build(&project, "{}");
  assert!(!output.warnings.iter().any(|w| w.is_error()));
}

#[test]
fn unresolved_imports_suggest_a_relative_path() {
  let project = TestProject::new()
    .file("main.js", "import x from 'util2'; console.log(x);")
    .file("util2.js", "export default 1;");
  let errors = project.build(&common::config("{}")).unwrap_err().into_vec();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].code(), error_code::UNRESOLVED_IMPORT);
  assert_eq!(errors[0].message(project.cwd()), r#"Could not resolve "util2""#);
  assert!(errors[0].notes[0]
    .text
    .starts_with(r#"Use the relative path "./util2" to reference the file "util2.js"."#));
}

#[test]
fn node_builtins_are_external_on_node() {
  let project = TestProject::new().file(
    "main.js",
    "import { readFileSync } from 'fs'; console.log(readFileSync);",
  );
  let output = build(&project, r#"{ "platform": "node" }"#);
  assert!(main_code(&output).contains(r#"import { readFileSync } from "fs";"#));

  let errors = project.build(&common::config("{}")).unwrap_err().into_vec();
  assert_eq!(errors[0].code(), error_code::UNRESOLVED_IMPORT);
  assert!(errors[0].notes[0].text.contains("is built into node"));
}

#[test]
fn external_patterns() {
  let project = TestProject::new().file(
    "main.js",
    "import React from 'react'; import { h } from 'preact/hooks'; console.log(React, h);",
  );
  let output = build(&project, r#"{ "external": ["react", "preact/*"] }"#);
  let code = main_code(&output);
  assert!(code.contains(r#"from "react";"#), "{code}");
  assert!(code.contains(r#"from "preact/hooks";"#), "{code}");
  assert_eq!(output.chunk("main.js").unwrap().imports.len(), 2);
}
