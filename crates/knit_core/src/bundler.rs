use knit_common::ModuleProvider;
use knit_error::CWD;
use tracing::instrument;

use crate::{Bundle, BundleOutput, BuildResult, Graph, InputOptions, OutputOptions};

pub struct Bundler {
  input_options: InputOptions,
}

impl Bundler {
  pub fn new(input_options: InputOptions) -> Self {
    knit_tracing::enable_tracing_on_demand();
    Self { input_options }
  }

  pub fn input_options(&self) -> &InputOptions {
    &self.input_options
  }

  /// Links the modules `provider` supplies and renders them in the given output format. Warnings
  /// are reported to `on_warn` and returned with the output.
  #[instrument(skip_all)]
  pub fn build(
    &self,
    provider: &dyn ModuleProvider,
    output_options: &OutputOptions,
  ) -> BuildResult<BundleOutput> {
    tracing::debug!("{:#?}", self.input_options);
    tracing::debug!("{:#?}", output_options);
    let (graph, warnings) = Graph::build(&self.input_options, output_options, provider)?;
    warnings
      .iter()
      .for_each(|warning| (self.input_options.on_warn)(warning));

    let (chunks, assets) = CWD.set(&self.input_options.cwd, || {
      Bundle::new(&self.input_options, output_options, &graph).generate()
    });
    Ok(BundleOutput {
      chunks,
      assets,
      warnings,
    })
  }
}
