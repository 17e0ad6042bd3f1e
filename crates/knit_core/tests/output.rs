mod common;

use common::{build, chunk_names, main_code};
use knit_test_utils::TestProject;
use pretty_assertions::assert_eq;

fn library() -> TestProject {
  TestProject::new()
    .file(
      "main.js",
      "import { used } from './lib'; import * as util from './util'; console.log(used(), util);",
    )
    .file(
      "lib.js",
      "export function used() { return helper(); }
       export function unused() { return 2; }
       function helper() { return 1; }",
    )
    .file("util.js", "export const a = 1; export let b = () => a;")
}

#[test]
fn tree_shaking_drops_unreferenced_declarations() {
  let output = build(&library(), "{}");
  let code = main_code(&output);
  assert!(code.contains("function used()"), "{code}");
  assert!(code.contains("function helper()"), "{code}");
  assert!(!code.contains("unused"), "{code}");

  let output = build(&library(), r#"{ "treeshake": false }"#);
  assert!(main_code(&output).contains("function unused()"));
}

#[test]
fn side_effect_free_files_are_dropped_when_unused() {
  let project = TestProject::new()
    .file("main.js", "import './pure'; import './impure';")
    .file("pure.js", "console.log('pure');")
    .file("impure.js", "console.log('impure');")
    .side_effect_free("pure.js");
  let output = build(&project, "{}");
  assert_eq!(
    output.chunk("main.js").unwrap().modules,
    vec![
      knit_common::ModuleId::new("/project/impure.js"),
      knit_common::ModuleId::new("/project/main.js"),
    ]
  );
}

#[test]
fn pure_calls_are_dropped_when_unused() {
  let project = TestProject::new().file(
    "main.js",
    "const kept = make(); const dropped = /* @__PURE__ */ make(); console.log(kept);",
  );
  let code = build(&project, "{}").chunks.remove(0).code;
  assert!(code.contains("const kept = make();"), "{code}");
  assert!(!code.contains("dropped"), "{code}");
}

#[test]
fn output_is_deterministic() {
  let project = library()
    .file("other.js", "import { a } from './util'; export const other = a;")
    .file("cjs.js", "exports.value = require('./util');");
  let config = r#"{
    "input": [
      { "name": "main", "import": "./main" },
      { "name": "other", "import": "./other" },
      { "name": "cjs", "import": "./cjs" }
    ],
    "codeSplitting": true
  }"#;
  let first = project.render(&build(&project, config));
  for _ in 0..5 {
    assert_eq!(project.render(&build(&project, config)), first);
  }
}

#[test]
fn colliding_top_level_names_are_renamed() {
  let project = TestProject::new()
    .file(
      "main.js",
      "import { value as other } from './a'; const value = 1; console.log(value, other);",
    )
    .file("a.js", "const value = 2; export { value };");
  let code = main_code(&build(&project, "{}")).to_string();
  // The entry keeps the names it was written with.
  assert!(code.contains("const value$1 = 2;"), "{code}");
  assert!(code.contains("const value = 1;"), "{code}");
  assert!(code.contains("console.log(value, value$1);"), "{code}");
}

#[test]
fn code_splitting_moves_shared_modules_into_a_chunk() {
  let project = TestProject::new()
    .file("a.js", "import { shared } from './shared'; console.log('a', shared);")
    .file("b.js", "import { shared } from './shared'; console.log('b', shared);")
    .file("shared.js", "export const shared = 'shared';");
  let output = build(
    &project,
    r#"{
      "input": [{ "name": "a", "import": "./a" }, { "name": "b", "import": "./b" }],
      "codeSplitting": true
    }"#,
  );
  let names = chunk_names(&output);
  assert_eq!(names.len(), 3);
  assert_eq!(&names[..2], &["a.js", "b.js"]);
  let common = names[2];
  assert!(common.starts_with("chunk-") && common.ends_with(".js"), "{common}");
  for entry in ["a.js", "b.js"] {
    let chunk = output.chunk(entry).unwrap();
    assert_eq!(chunk.imports, vec![format!("./{common}")]);
    assert!(chunk.code.contains(&format!(r#"from "./{common}";"#)));
    assert!(!chunk.code.contains("const shared"));
  }
  assert_eq!(output.chunk(common).unwrap().exports, vec!["shared"]);
}

#[test]
fn writers_of_shared_bindings_stay_with_the_declaration() {
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
  let names = chunk_names(&output);
  assert_eq!(names.len(), 3, "{names:?}");
  let common = output.chunk(names[2]).unwrap();
  assert!(common.code.contains("let count = 0;"), "{}", common.code);
  assert!(common.code.contains("function inc()"), "{}", common.code);
  assert!(common.exports.iter().any(|name| name.as_str() == "inc"));
  let a = &output.chunk("a.js").unwrap().code;
  assert!(!a.contains("function inc()"), "{a}");
}

#[test]
fn dynamic_imports_become_chunks() {
  let project = TestProject::new()
    .file("main.js", "import('./lazy').then((m) => console.log(m.value));")
    .file("lazy.js", "export const value = 1;");
  let output = build(&project, r#"{ "codeSplitting": true }"#);
  let lazy = output
    .chunks
    .iter()
    .find(|chunk| chunk.is_dynamic_entry)
    .unwrap();
  assert_eq!(lazy.filename, "lazy.js");
  assert!(main_code(&output).contains(r#"import("./lazy.js")"#));

  let output = build(&project, "{}");
  assert_eq!(output.chunks.len(), 1);
  assert!(main_code(&output).contains("Promise.resolve().then(() => "));
}

#[test]
fn minified_labels_avoid_keywords() {
  let project = TestProject::new().file(
    "main.js",
    "outer: for (;;) { inner: for (;;) { if (x) break outer; continue inner; } }",
  );
  let output = build(&project, r#"{ "minify": { "identifiers": true } }"#);
  let code = main_code(&output);
  assert!(!code.contains("outer") && !code.contains("inner"), "{code}");
  for keyword in ["do:", "if:", "in:"] {
    assert!(!code.contains(keyword), "{code}");
  }
}

#[test]
fn minified_whitespace() {
  let project = TestProject::new().file("main.js", "var a = 1;\nvar b = 2;\nconsole.log(a + b);");
  let code = main_code(&build(
    &project,
    r#"{ "minify": { "whitespace": true, "syntax": true } }"#,
  ))
  .to_string();
  assert!(code.contains("var a=1,b=2;"), "{code}");
  assert!(code.contains("console.log(a+b);"), "{code}");
}

#[test]
fn mangled_properties() {
  let project = TestProject::new().file(
    "main.js",
    "const o = { foo_: 1, bar_: 2, keep: 3 }; console.log(o.foo_, o.bar_, o.keep);",
  );
  let output = build(
    &project,
    r#"{ "mangleProps": "_$", "reserveProps": "^bar" }"#,
  );
  let code = main_code(&output);
  assert!(!code.contains("foo_"), "{code}");
  assert!(code.contains("o.bar_"), "{code}");
  assert!(code.contains("o.keep"), "{code}");
}

#[test]
fn keep_names_restores_renamed_functions() {
  let project = TestProject::new()
    .file(
      "main.js",
      "import { foo as other } from './a'; function foo() {} console.log(foo, other);",
    )
    .file("a.js", "export function foo() {}");
  let output = build(&project, r#"{ "keepNames": true }"#);
  let code = main_code(&output);
  assert!(code.contains(r#"__name(foo$1, "foo");"#), "{code}");
  assert!(output.chunk("main.js").unwrap().helpers.contains(&"__name"));

  let output = build(&project, "{}");
  assert!(!main_code(&output).contains("__name"));
}

fn licensed() -> TestProject {
  TestProject::new()
    .file("main.js", "import './lib';\nconsole.log('main');")
    .file("lib.js", "/*! lib v1 | MIT */\nconsole.log('lib');")
}

#[test]
fn legal_comments_modes() {
  let comment = "/*! lib v1 | MIT */";

  let code = main_code(&build(&licensed(), "{}")).to_string();
  let inline_at = code.find(comment).unwrap();
  assert!(inline_at < code.find("console.log(\"lib\")").unwrap());

  let code = main_code(&build(&licensed(), r#"{ "legalComments": "eof" }"#)).to_string();
  assert!(code.trim_end().ends_with(comment), "{code}");

  let output = build(&licensed(), r#"{ "legalComments": "linked" }"#);
  assert!(main_code(&output)
    .trim_end()
    .ends_with("/*! For license information please see main.js.LEGAL.txt */"));
  assert_eq!(output.assets.len(), 1);
  assert_eq!(output.assets[0].filename, "main.js.LEGAL.txt");
  assert_eq!(output.assets[0].content, format!("{comment}\n"));

  let output = build(&licensed(), r#"{ "legalComments": "external" }"#);
  assert!(!main_code(&output).contains("/*!"));
  assert_eq!(output.assets.len(), 1);

  let output = build(&licensed(), r#"{ "legalComments": "none" }"#);
  assert!(!main_code(&output).contains("/*!"));
  assert!(output.assets.is_empty());
}

#[test]
fn module_comments_and_file_names() {
  let output = build(
    &licensed(),
    r#"{ "entryFileNames": "[name].bundle.js", "legalComments": "none" }"#,
  );
  assert_eq!(chunk_names(&output), vec!["main.bundle.js"]);
  let code = &output.chunks[0].code;
  assert!(code.contains("// lib.js\nconsole.log(\"lib\");"), "{code}");
  assert!(code.contains("// main.js\nconsole.log(\"main\");"), "{code}");
}

#[test]
fn injected_exports_replace_globals() {
  let project = TestProject::new()
    .file("main.js", "console.log(process.env);")
    .file("shim.js", "export const process = { env: {} };");
  let output = build(&project, r#"{ "inject": ["./shim"] }"#);
  let code = main_code(&output);
  assert!(code.contains("const process = { env: {} };"), "{code}");
  assert!(code.find("// shim.js").unwrap() < code.find("// main.js").unwrap());
}
