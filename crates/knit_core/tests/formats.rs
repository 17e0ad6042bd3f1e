mod common;

use common::{build, build_errors, main_code};
use knit_test_utils::TestProject;
use pretty_assertions::assert_eq;

#[test]
fn commonjs_default_import() {
  let project = TestProject::new()
    .file("main.js", "import foo from './foo'; foo();")
    .file("foo.js", "module.exports = function () { return 1; };");
  let output = build(&project, "{}");
  let code = main_code(&output);
  assert!(code.contains("var require_foo = __commonJS({"), "{code}");
  assert!(code.contains("__toESM(require_foo())"), "{code}");
  let helpers = &output.chunk("main.js").unwrap().helpers;
  assert!(helpers.contains(&"__commonJS"));
  assert!(helpers.contains(&"__toESM"));
  assert!(!helpers.contains(&"__esm"));
}

#[test]
fn required_esm_is_wrapped_lazily() {
  let project = TestProject::new()
    .file("main.js", "const lib = require('./lib'); console.log(lib.value);")
    .file("lib.js", "export const value = 1;");
  let output = build(&project, r#"{ "format": "cjs" }"#);
  let code = main_code(&output);
  assert!(code.contains("var init_lib = __esm({"), "{code}");
  assert!(code.contains("(init_lib(), __toCommonJS(lib_exports))"), "{code}");
}

#[test]
fn esm_entry_as_commonjs() {
  let project = TestProject::new().file("main.js", "export const a = 1; export default a;");
  let output = build(&project, r#"{ "format": "cjs" }"#);
  let chunk = output.chunk("main.js").unwrap();
  assert!(chunk
    .code
    .contains("module.exports = __toCommonJS(main_exports);"));
  assert_eq!(chunk.exports, vec!["a", "default"]);
}

#[test]
fn iife_returns_exports_to_the_global_name() {
  let project = TestProject::new().file("main.js", "export const answer = 42;");
  let output = build(&project, r#"{ "format": "iife", "globalName": "lib" }"#);
  let code = main_code(&output);
  assert!(code.starts_with("var lib = (() => {"), "{code}");
  assert!(code.contains("return __toCommonJS(main_exports);"), "{code}");
  assert!(code.trim_end().ends_with("})();"), "{code}");
}

#[test]
fn top_level_await_per_format() {
  let project = TestProject::new().file("main.js", "await Promise.resolve(1);");
  assert!(main_code(&build(&project, "{}")).contains("await Promise.resolve(1);"));
  for format in ["cjs", "iife"] {
    assert_eq!(
      build_errors(&project, &format!(r#"{{ "format": "{format}" }}"#)),
      vec![format!(
        r#"TOP_LEVEL_AWAIT: Top-level await is currently not supported with the "{format}" output format"#
      )]
    );
  }

  let dead = TestProject::new().file("main.js", "if (false) { await x; } console.log(1);");
  let output = build(&dead, r#"{ "format": "cjs" }"#);
  assert!(!main_code(&output).contains("await"));
}

#[test]
fn dynamic_import_of_module_with_top_level_await() {
  let project = TestProject::new()
    .file("main.js", "import('./t').then((m) => console.log('value', m.v));")
    .file("t.js", "await 1; export const v = 2;");
  let code = main_code(&build(&project, "{}")).to_string();
  assert!(code.contains("var init_t = __esm({"), "{code}");
  // The initializer is declared after the importer, so the call waits for a tick.
  assert!(
    code.contains("Promise.resolve().then(() => init_t()).then(() => t_exports)"),
    "{code}"
  );
}

#[test]
fn require_of_module_with_top_level_await() {
  let project = TestProject::new()
    .file("main.js", "require('./mid');")
    .file("mid.js", "import './tla';")
    .file("tla.js", "await 1;");
  insta::assert_snapshot!(build_errors(&project, "{}").join("\n"), @r###"REQUIRE_TOP_LEVEL_AWAIT: This require call is not allowed because the transitive dependency "tla.js" contains a top-level await"###);
}

#[test]
fn invalid_options() {
  let project = TestProject::new()
    .file("main.js", "export const a = 1;")
    .file("other.js", "export const b = 2;");
  assert_eq!(
    build_errors(
      &project,
      r#"{ "format": "cjs", "codeSplitting": true }"#
    ),
    vec![r#"INVALID_OPTION: Splitting currently only works with the "esm" format"#]
  );
  assert_eq!(
    build_errors(&project, r#"{ "platform": "deno" }"#),
    vec!["INVALID_OPTION: Invalid platform: deno"]
  );
}
