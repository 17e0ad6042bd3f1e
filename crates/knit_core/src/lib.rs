mod bundle;
pub use bundle::*;
mod bundler;
pub use bundler::*;
mod chunk;
mod classifier;
pub use classifier::{ExportsKind, WrapKind};
mod code_splitter;
pub use code_splitter::uri_to_chunk_name;
mod external_module;
pub use external_module::*;
mod finalizer;
mod graph;
pub use graph::*;
mod interop;
mod linker;
mod module_loader;
mod norm_or_ext;
pub use norm_or_ext::*;
mod normal_module;
pub use normal_module::NormalModule;
mod options;
pub use options::*;
mod renamer;
pub use renamer::{CharFreq, NameMinifier};
mod scanner;
mod treeshake;
mod utils;
pub use utils::*;

// public exports

pub type BuildError = knit_error::Error;
pub type BuildResult<T> = Result<T, knit_error::Errors>;
