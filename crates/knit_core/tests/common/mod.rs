use knit_core::BundleOutput;
use knit_test_utils::{TestConfig, TestProject};

pub fn config(json: &str) -> TestConfig {
  TestConfig::from_json(json).unwrap_or_else(|err| panic!("invalid test config {json}: {err}"))
}

/// Builds `project` and panics with the rendered errors if the build fails.
pub fn build(project: &TestProject, json: &str) -> BundleOutput {
  match project.build(&config(json)) {
    Ok(output) => output,
    Err(errors) => panic!(
      "expected the build to succeed:\n{}",
      project.render_errors(&errors)
    ),
  }
}

/// The errors of a failing build as `CODE: message` lines. Warnings reported with them are left
/// out.
pub fn build_errors(project: &TestProject, json: &str) -> Vec<String> {
  let errors = match project.build(&config(json)) {
    Ok(output) => panic!(
      "expected the build to fail:\n{}",
      project.render(&output)
    ),
    Err(errors) => errors,
  };
  errors
    .iter()
    .filter(|error| error.is_error())
    .map(|error| format!("{}: {}", error.code(), error.message(project.cwd())))
    .collect()
}

pub fn warning_codes(output: &BundleOutput) -> Vec<&'static str> {
  output.warnings.iter().map(|warning| warning.code()).collect()
}

/// Code of the chunk emitted for the `main` entry.
pub fn main_code(output: &BundleOutput) -> &str {
  &output
    .chunk("main.js")
    .unwrap_or_else(|| panic!("no main.js in {:?}", chunk_names(output)))
    .code
}

pub fn chunk_names(output: &BundleOutput) -> Vec<&str> {
  output.chunks.iter().map(|chunk| chunk.filename.as_str()).collect()
}
